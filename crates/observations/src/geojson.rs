//! GeoJSON rendering of observation rows.

use crate::error::ObservationResult;
use crate::types::{Observation, ObservationRow};
use serde::Serialize;

/// A GeoJSON `FeatureCollection` of point features.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

/// One point feature; `properties` carries every column of the source row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: Geometry,
    pub properties: ObservationRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[lon, lat]`
    pub coordinates: [f64; 2],
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Feature {
    /// Build a point feature from a row. Fails if `lat` or `lon` is absent or
    /// not numeric.
    pub fn from_row(row: ObservationRow) -> ObservationResult<Self> {
        let observation = Observation::from_row(&row)?;
        Ok(Self {
            kind: "Feature",
            geometry: Geometry {
                kind: "Point",
                coordinates: observation.coordinates(),
            },
            properties: row,
        })
    }
}

/// Convert rows into a `FeatureCollection`, one feature per row in input order.
pub fn to_feature_collection<I>(rows: I) -> ObservationResult<FeatureCollection>
where
    I: IntoIterator<Item = ObservationRow>,
{
    let features = rows
        .into_iter()
        .map(Feature::from_row)
        .collect::<ObservationResult<Vec<_>>>()?;
    Ok(FeatureCollection::new(features))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ObservationError;
    use crate::types::{unpack_rows, FieldValue};
    use assert_matches::assert_matches;
    use chrono::NaiveDateTime;
    use serde_json::json;

    #[test]
    fn test_single_row_feature() {
        let row = ObservationRow::new()
            .with("lon", -73.9)
            .with("lat", 40.7)
            .with("route_short", "B41");

        let collection = to_feature_collection(vec![row]).unwrap();

        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-73.9, 40.7]},
                    "properties": {"lon": -73.9, "lat": 40.7, "route_short": "B41"}
                }]
            })
        );
    }

    #[test]
    fn test_empty_rows() {
        let collection = to_feature_collection(Vec::new()).unwrap();
        assert!(collection.is_empty());
        assert_eq!(
            serde_json::to_value(&collection).unwrap(),
            json!({"type": "FeatureCollection", "features": []})
        );
    }

    #[test]
    fn test_properties_keep_column_order_and_iso_timestamps() {
        let ts = NaiveDateTime::parse_from_str("2020-08-11 14:42:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let row = ObservationRow::new()
            .with("timestamp", ts)
            .with("trip_id", "T1")
            .with("lat", 40.0)
            .with("lon", -74.0);

        let collection = to_feature_collection(vec![row]).unwrap();
        let json = serde_json::to_string(&collection.features[0].properties).unwrap();
        assert_eq!(
            json,
            r#"{"timestamp":"2020-08-11T14:42:00","trip_id":"T1","lat":40.0,"lon":-74.0}"#
        );
    }

    #[test]
    fn test_feature_order_follows_rows() {
        let rows = (0..3)
            .map(|i| {
                ObservationRow::new()
                    .with("id", i as i64)
                    .with("lat", 40.0 + i as f64)
                    .with("lon", -74.0)
            })
            .collect::<Vec<_>>();

        let collection = to_feature_collection(rows).unwrap();
        let ids: Vec<_> = collection
            .features
            .iter()
            .map(|f| f.properties.get("id").cloned())
            .collect();
        assert_eq!(
            ids,
            vec![
                Some(FieldValue::Int(0)),
                Some(FieldValue::Int(1)),
                Some(FieldValue::Int(2))
            ]
        );
    }

    #[test]
    fn test_missing_longitude_fails() {
        let rows = vec![ObservationRow::new().with("lat", 40.7)];
        assert_matches!(
            to_feature_collection(rows),
            Err(ObservationError::MissingField(ref f)) if f == "lon"
        );
    }

    #[test]
    fn test_null_latitude_is_not_coerced() {
        let rows = vec![ObservationRow::new()
            .with("lat", FieldValue::Null)
            .with("lon", -73.9)];
        assert_matches!(
            to_feature_collection(rows),
            Err(ObservationError::MissingField(_))
        );
    }

    #[test]
    fn test_unpacked_rows_all_become_features() {
        let columns: Vec<String> = ["trip_id", "lat", "lon"].iter().map(|c| c.to_string()).collect();
        let tuples: Vec<Vec<FieldValue>> = (0..5)
            .map(|i| {
                vec![
                    FieldValue::from(format!("T{}", i)),
                    FieldValue::from(40.0 + i as f64 / 10.0),
                    FieldValue::from(-73.0 - i as f64 / 10.0),
                ]
            })
            .collect();

        let rows = unpack_rows(&columns, tuples).unwrap();
        let collection = to_feature_collection(rows.clone()).unwrap();

        assert_eq!(collection.features.len(), 5);
        for (i, (feature, row)) in collection.features.iter().zip(&rows).enumerate() {
            assert_eq!(feature.properties, *row);
            assert_eq!(
                feature.properties.get("trip_id"),
                Some(&FieldValue::from(format!("T{}", i)))
            );
            assert_eq!(
                feature.geometry.coordinates,
                [-73.0 - i as f64 / 10.0, 40.0 + i as f64 / 10.0]
            );
        }
    }
}
