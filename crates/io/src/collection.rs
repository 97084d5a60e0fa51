// GeoJSON FeatureCollection import

use std::path::Path;

use geojson::{GeoJson, JsonObject, JsonValue};
use tracing::warn;

use titres_recon::model::RawFeature;

use crate::csv::read_file_as_utf8;
use crate::error::IoError;

/// Read a FeatureCollection into raw features.
///
/// A bare Feature is accepted as a one-feature collection. Geometries that do
/// not convert to geo-types are dropped with a warning; admission rejects the
/// feature later.
pub fn import(path: &Path) -> Result<Vec<RawFeature>, IoError> {
    let content = read_file_as_utf8(path)?;
    import_from_str(path, &content)
}

pub(crate) fn import_from_str(path: &Path, content: &str) -> Result<Vec<RawFeature>, IoError> {
    let document: GeoJson = content.parse().map_err(|e| IoError::parse(path, e))?;

    let features = match document {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(IoError::parse(path, "expected a FeatureCollection, found a bare geometry"))
        }
    };

    Ok(features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let geometry = feature.geometry.and_then(|g| {
                geo_types::Geometry::<f64>::try_from(g.value)
                    .map_err(|e| warn!(feature = i, error = %e, "geometry not convertible, dropped"))
                    .ok()
            });
            RawFeature {
                geometry,
                attributes: feature.properties.map(stringify_properties).unwrap_or_default(),
            }
        })
        .collect())
}

/// Flatten JSON properties to strings. Nulls are omitted; integral numbers
/// lose their fractional part so `12.0` and `12` read the same.
pub(crate) fn stringify_properties(properties: JsonObject) -> std::collections::BTreeMap<String, String> {
    properties
        .into_iter()
        .filter_map(|(key, value)| stringify(value).map(|v| (key, v)))
        .collect()
}

fn stringify(value: JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}
