//! Response format selection.

use crate::error::{ObservationError, ObservationResult};
use crate::geojson::{to_feature_collection, FeatureCollection};
use crate::kepler::KeplerTable;
use crate::types::ObservationRow;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Value of the `output` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoJson,
    Kepler,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::GeoJson => "geojson",
            OutputFormat::Kepler => "kepler",
        }
    }

    /// Serialize rows in this format.
    pub fn render(&self, rows: Vec<ObservationRow>) -> ObservationResult<Rendered> {
        Ok(match self {
            OutputFormat::GeoJson => Rendered::GeoJson(to_feature_collection(rows)?),
            OutputFormat::Kepler => Rendered::Kepler(KeplerTable::from_rows(rows)),
        })
    }
}

impl FromStr for OutputFormat {
    type Err = ObservationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geojson" => Ok(OutputFormat::GeoJson),
            "kepler" => Ok(OutputFormat::Kepler),
            other => Err(ObservationError::InvalidParameter {
                field: "output".to_string(),
                message: format!("Must be one of: geojson, kepler (got '{}')", other),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serialized query result in either format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rendered {
    GeoJson(FeatureCollection),
    Kepler(KeplerTable),
}
