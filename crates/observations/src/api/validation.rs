//! Query-parameter schemas.
//!
//! Each query endpoint accepts a fixed set of parameters. Validation collects
//! every problem before failing so the client sees all of them at once, and a
//! request that fails validation never reaches the store.

use crate::filter::{parse_timestamp, Filter, OUTPUT_PARAM};
use crate::format::OutputFormat;
use std::collections::{BTreeMap, HashSet};

const MISSING: &str = "Missing data for required field.";
const UNKNOWN: &str = "Unknown field.";
const INVALID_DATETIME: &str = "Not a valid datetime.";
const INVALID_OUTPUT: &str = "Must be one of: geojson, kepler.";

/// Accepted parameters of one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct QuerySchema {
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    /// Parameters that must parse as datetimes.
    pub datetimes: &'static [&'static str],
}

/// `GET /trips`
pub const TRIP_QUERY: QuerySchema = QuerySchema {
    required: &["service_date", "trip_id", OUTPUT_PARAM],
    optional: &[],
    datetimes: &[],
};

/// `GET /buses`
pub const SYSTEM_QUERY: QuerySchema = QuerySchema {
    required: &[OUTPUT_PARAM],
    optional: &["start", "end"],
    datetimes: &["start", "end"],
};

/// A query that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub output: OutputFormat,
    pub filter: Filter,
}

impl QuerySchema {
    fn accepts(&self, name: &str) -> bool {
        self.required.iter().chain(self.optional).any(|n| *n == name)
    }

    /// Validate request parameters, returning per-field messages on failure.
    ///
    /// Repeated parameters keep their first value. Datetime values are
    /// normalized to naive UTC before they enter the filter.
    pub fn validate(
        &self,
        params: &[(String, String)],
    ) -> Result<ValidatedQuery, BTreeMap<String, String>> {
        let mut errors = BTreeMap::new();
        let mut seen = HashSet::new();
        let mut accepted: Vec<(String, String)> = Vec::new();
        let mut output = None;

        for (name, value) in params {
            if !seen.insert(name.as_str()) {
                continue;
            }
            if !self.accepts(name) {
                errors.insert(name.clone(), UNKNOWN.to_string());
                continue;
            }

            if name == OUTPUT_PARAM {
                match value.parse::<OutputFormat>() {
                    Ok(format) => output = Some(format),
                    Err(_) => {
                        errors.insert(name.clone(), INVALID_OUTPUT.to_string());
                    }
                }
                continue;
            }

            if self.datetimes.iter().any(|n| *n == name.as_str()) {
                match parse_timestamp(value) {
                    Ok(ts) => accepted.push((
                        name.clone(),
                        ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                    )),
                    Err(_) => {
                        errors.insert(name.clone(), INVALID_DATETIME.to_string());
                    }
                }
                continue;
            }

            accepted.push((name.clone(), value.clone()));
        }

        for name in self.required {
            if !seen.contains(*name) {
                errors.insert(name.to_string(), MISSING.to_string());
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let filter = Filter::from_params(accepted).map_err(|e| {
            let mut errors = BTreeMap::new();
            errors.insert("filter".to_string(), e.to_string());
            errors
        })?;

        match output {
            Some(output) => Ok(ValidatedQuery { output, filter }),
            None => {
                let mut errors = BTreeMap::new();
                errors.insert(OUTPUT_PARAM.to_string(), MISSING.to_string());
                Err(errors)
            }
        }
    }
}
