//! Tabular bundle for kepler.gl.
//!
//! Plain passthrough: one `{name}` entry per column of the first row plus the
//! rows themselves. No type or format metadata is emitted.

use crate::types::ObservationRow;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeplerField {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeplerTable {
    pub fields: Vec<KeplerField>,
    pub rows: Vec<ObservationRow>,
}

impl KeplerTable {
    /// Field descriptors come from the first row; an empty input yields an
    /// empty table.
    pub fn from_rows(rows: Vec<ObservationRow>) -> Self {
        let fields = rows
            .first()
            .map(|row| {
                row.columns()
                    .map(|name| KeplerField {
                        name: name.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { fields, rows }
    }
}
