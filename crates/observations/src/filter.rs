//! Request-parameter filters.
//!
//! Query parameters map onto predicates over the observations table:
//!
//! | parameter | predicate                 |
//! |-----------|---------------------------|
//! | `output`  | ignored (response format) |
//! | `start`   | `timestamp >= value`      |
//! | `end`     | `timestamp < value`       |
//! | any other | `name = value`            |
//!
//! A [`Filter`] is a plain list of [`Predicate`]s. Its `Display` form is the
//! human-readable fragment used in logs; [`Filter::to_sql`] produces the
//! executable form with `$n` placeholders. Values never appear in the SQL text.

use crate::error::{ObservationError, ObservationResult};
use crate::types::{columns, ObservationRow};
use chrono::{DateTime, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;

/// Parameter that selects the response format.
pub const OUTPUT_PARAM: &str = "output";
/// Inclusive lower bound on the observation timestamp.
pub const START_PARAM: &str = "start";
/// Exclusive upper bound on the observation timestamp.
pub const END_PARAM: &str = "end";

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gte,
    Lt,
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Lt => "<",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A single `field op value` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: String,
    pub op: Operator,
    pub value: String,
}

impl Predicate {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Evaluate the predicate against an unpacked row.
    ///
    /// Equality compares the column's text form; range operators compare
    /// timestamps. A missing column or an unparsable bound never matches.
    pub fn matches(&self, row: &ObservationRow) -> bool {
        let Some(value) = row.get(&self.field) else {
            return false;
        };
        match self.op {
            Operator::Eq => value.filter_text().as_deref() == Some(self.value.as_str()),
            Operator::Gte | Operator::Lt => {
                let (Some(actual), Ok(bound)) = (value.as_timestamp(), parse_timestamp(&self.value))
                else {
                    return false;
                };
                if self.op == Operator::Gte {
                    actual >= bound
                } else {
                    actual < bound
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} \"{}\"", self.field, self.op, self.value)
    }
}

/// Conjunction of predicates derived from request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

/// Executable form of a filter: a WHERE-clause body and its bind values in
/// placeholder order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFilter {
    pub clause: String,
    pub binds: Vec<String>,
}

impl Filter {
    /// Build a filter from parameters in request order.
    ///
    /// `output` is skipped. When a name repeats, the first occurrence wins.
    /// Field names must be plain identifiers.
    pub fn from_params<I, K, V>(params: I) -> ObservationResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut predicates = Vec::new();

        for (name, value) in params {
            let name = name.as_ref();
            if name == OUTPUT_PARAM || !seen.insert(name.to_string()) {
                continue;
            }
            let predicate = match name {
                START_PARAM => Predicate::new(columns::TIMESTAMP, Operator::Gte, value.as_ref()),
                END_PARAM => Predicate::new(columns::TIMESTAMP, Operator::Lt, value.as_ref()),
                field => {
                    if !is_identifier(field) {
                        return Err(ObservationError::InvalidFilterField(field.to_string()));
                    }
                    Predicate::new(field, Operator::Eq, value.as_ref())
                }
            };
            predicates.push(predicate);
        }

        Ok(Self { predicates })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether every predicate holds for the row. An empty filter matches everything.
    pub fn matches(&self, row: &ObservationRow) -> bool {
        self.predicates.iter().all(|p| p.matches(row))
    }

    /// Translate to a parameterized WHERE clause body.
    ///
    /// Placeholders are numbered from `first_placeholder`. Equality compares the
    /// column's text form so any column type can be filtered by its string
    /// value; range bounds are cast to `TIMESTAMP`.
    pub fn to_sql(&self, first_placeholder: usize) -> SqlFilter {
        let mut clauses = Vec::with_capacity(self.predicates.len());
        let mut binds = Vec::with_capacity(self.predicates.len());

        for (i, predicate) in self.predicates.iter().enumerate() {
            let placeholder = first_placeholder + i;
            let column = quote_identifier(&predicate.field);
            let clause = match predicate.op {
                Operator::Eq => format!("{}::text = ${}", column, placeholder),
                op => format!("{} {} CAST(${} AS TIMESTAMP)", column, op, placeholder),
            };
            clauses.push(clause);
            binds.push(predicate.value.clone());
        }

        SqlFilter {
            clause: clauses.join(" AND "),
            binds,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Double-quote an identifier that already passed [`is_identifier`].
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Parse a request timestamp.
///
/// Accepts RFC 3339 and ISO-8601 date-times with a `T` or space separator,
/// optional seconds, optional fraction and optional UTC offset. Zoned values are
/// normalized to naive UTC. A bare date is rejected.
pub fn parse_timestamp(input: &str) -> ObservationResult<NaiveDateTime> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }

    let normalized = input.replacen(' ', "T", 1);
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt);
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Ok(dt.naive_utc());
        }
    }

    Err(ObservationError::InvalidParameter {
        field: "timestamp".to_string(),
        message: format!("Not a valid datetime: {}", input),
    })
}
