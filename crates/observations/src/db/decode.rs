//! Column decoding for dynamically shaped rows.

use crate::error::{ObservationError, ObservationResult};
use crate::types::FieldValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

/// How a column is read, keyed by the type name the server reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Bool,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    /// Anything else: read as text if the driver allows it, else null.
    Other,
}

impl ColumnKind {
    pub fn from_type_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" | "CITEXT" => ColumnKind::Text,
            "INT2" | "SMALLINT" => ColumnKind::Int2,
            "INT4" | "INT" | "INTEGER" => ColumnKind::Int4,
            "INT8" | "BIGINT" => ColumnKind::Int8,
            "FLOAT4" | "REAL" => ColumnKind::Float4,
            "FLOAT8" | "DOUBLE PRECISION" => ColumnKind::Float8,
            "NUMERIC" => ColumnKind::Numeric,
            "BOOL" | "BOOLEAN" => ColumnKind::Bool,
            "TIMESTAMP" => ColumnKind::Timestamp,
            "TIMESTAMPTZ" => ColumnKind::TimestampTz,
            "DATE" => ColumnKind::Date,
            "TIME" => ColumnKind::Time,
            _ => ColumnKind::Other,
        }
    }
}

/// Column names of a result row, in select order.
pub fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

/// Decode every column of a row.
pub fn decode_row(row: &PgRow) -> ObservationResult<Vec<FieldValue>> {
    (0..row.len()).map(|i| decode_column(row, i)).collect()
}

fn decode_column(row: &PgRow, index: usize) -> ObservationResult<FieldValue> {
    let kind = {
        let raw = row.try_get_raw(index).map_err(decode_error)?;
        if raw.is_null() {
            return Ok(FieldValue::Null);
        }
        ColumnKind::from_type_name(raw.type_info().name())
    };

    let value = match kind {
        ColumnKind::Text => FieldValue::Text(row.try_get::<String, _>(index).map_err(decode_error)?),
        ColumnKind::Int2 => FieldValue::Int(row.try_get::<i16, _>(index).map_err(decode_error)? as i64),
        ColumnKind::Int4 => FieldValue::Int(row.try_get::<i32, _>(index).map_err(decode_error)? as i64),
        ColumnKind::Int8 => FieldValue::Int(row.try_get::<i64, _>(index).map_err(decode_error)?),
        ColumnKind::Float4 => {
            FieldValue::Float(row.try_get::<f32, _>(index).map_err(decode_error)? as f64)
        }
        ColumnKind::Float8 => FieldValue::Float(row.try_get::<f64, _>(index).map_err(decode_error)?),
        ColumnKind::Numeric => {
            let bd = row
                .try_get::<sqlx::types::BigDecimal, _>(index)
                .map_err(decode_error)?;
            bigdecimal_to_f64(&bd).map(FieldValue::Float).unwrap_or(FieldValue::Null)
        }
        ColumnKind::Bool => FieldValue::Bool(row.try_get::<bool, _>(index).map_err(decode_error)?),
        ColumnKind::Timestamp => {
            FieldValue::Timestamp(row.try_get::<NaiveDateTime, _>(index).map_err(decode_error)?)
        }
        ColumnKind::TimestampTz => {
            FieldValue::TimestampTz(row.try_get::<DateTime<Utc>, _>(index).map_err(decode_error)?)
        }
        ColumnKind::Date => FieldValue::Date(row.try_get::<NaiveDate, _>(index).map_err(decode_error)?),
        ColumnKind::Time => FieldValue::Time(row.try_get::<NaiveTime, _>(index).map_err(decode_error)?),
        ColumnKind::Other => row
            .try_get::<String, _>(index)
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Null),
    };
    Ok(value)
}

fn decode_error(e: sqlx::Error) -> ObservationError {
    ObservationError::StorageError(format!("Failed to decode column: {}", e))
}

fn bigdecimal_to_f64(bd: &sqlx::types::BigDecimal) -> Option<f64> {
    bd.to_string().parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_column_kind_from_type_name() {
        assert_eq!(ColumnKind::from_type_name("VARCHAR"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_type_name("BPCHAR"), ColumnKind::Text);
        assert_eq!(ColumnKind::from_type_name("INT4"), ColumnKind::Int4);
        assert_eq!(ColumnKind::from_type_name("FLOAT8"), ColumnKind::Float8);
        assert_eq!(ColumnKind::from_type_name("NUMERIC"), ColumnKind::Numeric);
        assert_eq!(ColumnKind::from_type_name("TIMESTAMP"), ColumnKind::Timestamp);
        assert_eq!(ColumnKind::from_type_name("TIMESTAMPTZ"), ColumnKind::TimestampTz);
        assert_eq!(ColumnKind::from_type_name("date"), ColumnKind::Date);
        assert_eq!(ColumnKind::from_type_name("JSONB"), ColumnKind::Other);
        assert_eq!(ColumnKind::from_type_name("UUID"), ColumnKind::Other);
    }

    #[test]
    fn test_numeric_to_float() {
        let bd = sqlx::types::BigDecimal::from_str("40.712345").unwrap();
        assert_eq!(bigdecimal_to_f64(&bd), Some(40.712345));
    }
}
