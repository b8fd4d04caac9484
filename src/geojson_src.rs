//! Reads the converted GeoJSON and extracts ZIP boundary records.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use geojson::{FeatureCollection, GeoJson};
use serde_json::Value;
use tracing::warn;

/// Property carrying the ZCTA5 code in TIGER/Line 2020+ releases.
pub const ZIP_CODE_PROPERTY: &str = "ZCTA5CE20";

/// One ZIP boundary ready for upload: the code plus its geometry re-encoded
/// as a GeoJSON geometry string (what `ST_GeomFromGeoJSON` consumes).
#[derive(Debug, Clone)]
pub struct ZipBoundary {
    pub zip_code: String,
    pub geom_json: String,
}

/// Parse the GeoJSON file into upload records.
///
/// Fatal when the file is unreadable, is not a FeatureCollection, or none of
/// its features carry the ZCTA5 property (the error lists the properties that
/// are present so a wrong-vintage TIGER file is easy to spot). A feature with
/// a missing or unserializable geometry is skipped with a warning; the run
/// continues.
pub fn load_boundaries(path: &Path) -> Result<Vec<ZipBoundary>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read GeoJSON: {}", path.display()))?;
    let gj: GeoJson = raw
        .parse()
        .with_context(|| format!("failed to parse GeoJSON: {}", path.display()))?;
    let fc = FeatureCollection::try_from(gj)
        .map_err(|e| anyhow::anyhow!("expected a FeatureCollection in {}: {e}", path.display()))?;
    parse_features(fc)
}

/// Extract `(zip_code, geometry-json)` pairs from a FeatureCollection.
pub fn parse_features(fc: FeatureCollection) -> Result<Vec<ZipBoundary>> {
    if !fc.features.is_empty()
        && !fc
            .features
            .iter()
            .any(|f| f.property(ZIP_CODE_PROPERTY).is_some())
    {
        let available: Vec<String> = fc
            .features
            .first()
            .and_then(|f| f.properties.as_ref())
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        bail!(
            "GeoJSON missing '{ZIP_CODE_PROPERTY}' property; available properties: {:?}",
            available
        );
    }

    let mut records = Vec::with_capacity(fc.features.len());
    for feature in fc.features {
        let Some(zip_code) = feature.property(ZIP_CODE_PROPERTY).map(property_as_string)
        else {
            warn!("skipping feature without {ZIP_CODE_PROPERTY} property");
            continue;
        };
        let zip_code = zip_code.trim().to_string();

        let Some(geometry) = feature.geometry.as_ref() else {
            warn!(zip = %zip_code, "skipping ZIP with missing geometry");
            continue;
        };
        match serde_json::to_string(geometry) {
            Ok(geom_json) => records.push(ZipBoundary { zip_code, geom_json }),
            Err(e) => {
                warn!(zip = %zip_code, error = %e, "skipping ZIP with unserializable geometry");
                continue;
            }
        }
    }
    Ok(records)
}

// ZCTA codes are strings in TIGER files, but tolerate numeric properties from
// other converters.
fn property_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(features: Value) -> FeatureCollection {
        let gj: GeoJson = json!({
            "type": "FeatureCollection",
            "features": features,
        })
        .to_string()
        .parse()
        .expect("fixture should parse");
        match gj {
            GeoJson::FeatureCollection(fc) => fc,
            _ => unreachable!(),
        }
    }

    fn square(zip: &str) -> Value {
        json!({
            "type": "Feature",
            "properties": { "ZCTA5CE20": zip },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-87.7, 41.8], [-87.6, 41.8], [-87.6, 41.9], [-87.7, 41.9], [-87.7, 41.8]]]
            }
        })
    }

    #[test]
    fn parses_codes_and_geometry_json() {
        let fc = collection(json!([square("60601"), square("60602")]));
        let records = parse_features(fc).expect("parse should succeed");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].zip_code, "60601");
        assert!(records[0].geom_json.contains("\"Polygon\""));
    }

    #[test]
    fn missing_property_everywhere_is_fatal_and_lists_available_columns() {
        let fc = collection(json!([{
            "type": "Feature",
            "properties": { "GEOID20": "60601", "ALAND20": 1 },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]] }
        }]));
        let err = parse_features(fc).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ZCTA5CE20"));
        assert!(msg.contains("GEOID20"));
    }

    #[test]
    fn feature_without_geometry_is_skipped_not_fatal() {
        let broken = json!({
            "type": "Feature",
            "properties": { "ZCTA5CE20": "60654" },
            "geometry": null
        });
        let fc = collection(json!([square("60601"), broken, square("60602")]));
        let records = parse_features(fc).expect("parse should succeed");
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.zip_code != "60654"));
    }

    #[test]
    fn numeric_codes_are_stringified_and_whitespace_trimmed() {
        let numeric = json!({
            "type": "Feature",
            "properties": { "ZCTA5CE20": 60601 },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]] }
        });
        let padded = json!({
            "type": "Feature",
            "properties": { "ZCTA5CE20": " 60602 " },
            "geometry": { "type": "Polygon", "coordinates": [[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,0.0]]] }
        });
        let fc = collection(json!([numeric, padded]));
        let records = parse_features(fc).expect("parse should succeed");
        assert_eq!(records[0].zip_code, "60601");
        assert_eq!(records[1].zip_code, "60602");
    }

    #[test]
    fn empty_collection_yields_no_records() {
        let fc = collection(json!([]));
        let records = parse_features(fc).expect("parse should succeed");
        assert!(records.is_empty());
    }
}
