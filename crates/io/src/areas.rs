// Reference area import

use std::path::Path;

use geojson::GeoJson;
use tracing::info;

use titres_recon::geometry::Boundary;
use titres_recon::model::{AreaId, ReferenceArea};

use crate::collection::stringify_properties;
use crate::csv::read_file_as_utf8;
use crate::error::IoError;

/// Load the reference polygons from a GeoJSON FeatureCollection.
///
/// Unlike snapshots, the reference dataset must be clean: any feature without
/// a polygonal geometry or an `id_property` value fails the whole load.
pub fn load_reference_areas(path: &Path, id_property: &str) -> Result<Vec<ReferenceArea>, IoError> {
    let content = read_file_as_utf8(path)?;
    let areas = parse_reference_areas(path, &content, id_property)?;
    info!(path = %path.display(), areas = areas.len(), "reference areas loaded");
    Ok(areas)
}

fn parse_reference_areas(
    path: &Path,
    content: &str,
    id_property: &str,
) -> Result<Vec<ReferenceArea>, IoError> {
    let document: GeoJson = content.parse().map_err(|e| IoError::parse(path, e))?;
    let GeoJson::FeatureCollection(fc) = document else {
        return Err(IoError::parse(path, "expected a FeatureCollection"));
    };

    let area_err = |index: usize, message: String| IoError::ReferenceArea {
        path: path.to_path_buf(),
        index,
        message,
    };

    fc.features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let attributes = feature.properties.map(stringify_properties).unwrap_or_default();
            let id = attributes
                .get(id_property)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| area_err(index, format!("missing '{id_property}'")))?;

            let geometry = feature
                .geometry
                .ok_or_else(|| area_err(index, "no geometry".into()))?;
            let geometry = geo_types::Geometry::<f64>::try_from(geometry.value)
                .map_err(|e| area_err(index, e.to_string()))?;
            let geometry =
                Boundary::from_geometry(geometry).map_err(|e| area_err(index, e.to_string()))?;

            Ok(ReferenceArea {
                id: AreaId::new(id),
                geometry,
            })
        })
        .collect()
}
