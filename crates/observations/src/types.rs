//! Core observation types.
//!
//! An observation is one vehicle position report. Rows come back from the store
//! as ordered field-name→value mappings ([`ObservationRow`]); the typed
//! [`Observation`] record is parsed from a row when the identifying fields are
//! needed. Extra columns only ever travel in the row, never in the record.

use crate::error::{ObservationError, ObservationResult};
use crate::filter::parse_timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Well-known column names of the observations table.
pub mod columns {
    pub const ROUTE: &str = "route_short";
    pub const TRIP_ID: &str = "trip_id";
    pub const SERVICE_DATE: &str = "service_date";
    pub const TIMESTAMP: &str = "timestamp";
    pub const LAT: &str = "lat";
    pub const LON: &str = "lon";
}

/// A single column value of an observation row.
///
/// Timestamp, date and time values serialize as ISO-8601 strings; every
/// other variant serializes as its JSON scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Timestamp without time zone.
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone, normalized to UTC.
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
}

impl FieldValue {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String view of a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Timestamp view of the value. Zoned timestamps are converted to naive UTC,
    /// text is parsed with the same rules as request parameters.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            FieldValue::TimestampTz(ts) => Some(ts.naive_utc()),
            FieldValue::Date(d) => d.and_hms_opt(0, 0, 0),
            FieldValue::Text(s) => parse_timestamp(s).ok(),
            _ => None,
        }
    }

    /// Date view of the value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            FieldValue::Timestamp(ts) => Some(ts.date()),
            FieldValue::TimestampTz(ts) => Some(ts.date_naive()),
            FieldValue::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// The value's text form as PostgreSQL renders it for `column::text`.
    ///
    /// Equality filters compare against this form, so the in-memory store and the
    /// database agree on what `service_date = 2020-08-11` matches.
    pub fn filter_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Bool(v) => Some(v.to_string()),
            FieldValue::Int(v) => Some(v.to_string()),
            FieldValue::Float(v) => Some(v.to_string()),
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Timestamp(ts) => Some(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            FieldValue::TimestampTz(ts) => {
                Some(ts.format("%Y-%m-%d %H:%M:%S%.f+00").to_string())
            }
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Some(t.format("%H:%M:%S%.f").to_string()),
        }
    }

    /// ISO-8601 rendering of temporal values.
    fn iso_string(&self) -> Option<String> {
        match self {
            FieldValue::Timestamp(ts) => Some(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            FieldValue::TimestampTz(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            FieldValue::Time(t) => Some(t.format("%H:%M:%S%.f").to_string()),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(v) => serializer.serialize_bool(*v),
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            // Non-finite floats have no JSON form.
            FieldValue::Float(v) if !v.is_finite() => serializer.serialize_unit(),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Text(s) => serializer.serialize_str(s),
            temporal => match temporal.iso_string() {
                Some(iso) => serializer.serialize_str(&iso),
                None => serializer.serialize_unit(),
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.iso_string().or_else(|| self.filter_text()) {
            Some(s) => write!(f, "{}", s),
            None => write!(f, "null"),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::TimestampTz(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// One unpacked row: field names mapped to values, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationRow {
    fields: Vec<(String, FieldValue)>,
}

impl ObservationRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated name replaces the earlier value in place.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for ObservationRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Zip column names with row tuples.
///
/// Column order is preserved within each row and row order across rows. A tuple
/// whose length differs from `columns` is rejected rather than truncated.
pub fn unpack_rows<I>(columns: &[String], rows: I) -> ObservationResult<Vec<ObservationRow>>
where
    I: IntoIterator<Item = Vec<FieldValue>>,
{
    rows.into_iter()
        .map(|values| {
            if values.len() != columns.len() {
                return Err(ObservationError::RowShape {
                    expected: columns.len(),
                    found: values.len(),
                });
            }
            Ok(ObservationRow {
                fields: columns.iter().cloned().zip(values).collect(),
            })
        })
        .collect()
}

/// Typed view of the identifying fields of an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub route_short: Option<String>,
    pub trip_id: Option<String>,
    pub service_date: Option<NaiveDate>,
    pub timestamp: Option<NaiveDateTime>,
    pub lat: f64,
    pub lon: f64,
}

impl Observation {
    /// Parse the record out of a row.
    ///
    /// `lat` and `lon` are mandatory and must be numeric; the remaining fields
    /// are optional and read leniently.
    pub fn from_row(row: &ObservationRow) -> ObservationResult<Self> {
        Ok(Self {
            route_short: text_field(row, columns::ROUTE),
            trip_id: text_field(row, columns::TRIP_ID),
            service_date: row.get(columns::SERVICE_DATE).and_then(FieldValue::as_date),
            timestamp: row.get(columns::TIMESTAMP).and_then(FieldValue::as_timestamp),
            lat: coordinate(row, columns::LAT)?,
            lon: coordinate(row, columns::LON)?,
        })
    }

    /// GeoJSON position, longitude first.
    pub fn coordinates(&self) -> [f64; 2] {
        [self.lon, self.lat]
    }
}

fn text_field(row: &ObservationRow, name: &str) -> Option<String> {
    match row.get(name)? {
        FieldValue::Null => None,
        other => other.filter_text(),
    }
}

fn coordinate(row: &ObservationRow, name: &str) -> ObservationResult<f64> {
    let value = row
        .get(name)
        .ok_or_else(|| ObservationError::MissingField(name.to_string()))?;
    if value.is_null() {
        return Err(ObservationError::MissingField(name.to_string()));
    }
    value.as_f64().ok_or_else(|| ObservationError::TypeMismatch {
        field: name.to_string(),
        expected: "numeric".to_string(),
    })
}
