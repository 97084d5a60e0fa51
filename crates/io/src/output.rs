// History export: one GeoJSON FeatureCollection, written atomically

use std::io::Write;
use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use titres_recon::model::{RunResult, TitleRecord};

use crate::error::IoError;

/// What was written: size and content fingerprint of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputReceipt {
    pub bytes: u64,
    pub blake3: String,
}

/// Serialize every record of `result` and replace `path` with the document.
///
/// The document goes to a temporary file in the target directory first, so
/// readers of `path` never see a partial file.
pub fn write_history(path: &Path, result: &RunResult) -> Result<OutputReceipt, IoError> {
    let bytes = render(result)?;

    let write_err = |source| IoError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    let receipt = OutputReceipt {
        bytes: bytes.len() as u64,
        blake3: format!("blake3:{}", blake3::hash(&bytes).to_hex()),
    };
    info!(path = %path.display(), bytes = receipt.bytes, fingerprint = %receipt.blake3, "history written");
    Ok(receipt)
}

/// Render the output document without touching the filesystem.
pub fn render(result: &RunResult) -> Result<Vec<u8>, IoError> {
    let mut foreign = JsonObject::new();
    foreign.insert("name".into(), JsonValue::String(result.meta.config_name.clone()));
    foreign.insert(
        "engine_version".into(),
        JsonValue::String(result.meta.engine_version.clone()),
    );

    let collection = FeatureCollection {
        bbox: None,
        features: result.records().map(record_feature).collect(),
        foreign_members: Some(foreign),
    };
    Ok(serde_json::to_vec(&collection)?)
}

fn record_feature(record: &TitleRecord) -> Feature {
    let c = &record.classification;
    let properties = json!({
        "key": record.key,
        "domain": record.domain,
        "name": record.name,
        "type": c.title_type,
        "type_label": c.type_label,
        "stage": c.stage,
        "procedure": c.procedure,
        "indicative_label": record.indicative_label,
        "areas": record.areas,
        "start": record.validity.start,
        "end": record.validity.end,
        "open": record.validity.is_open(),
    });
    let properties = match properties {
        JsonValue::Object(map) => Some(map),
        _ => None,
    };

    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(
            &record.geometry.to_geometry(),
        ))),
        id: None,
        properties,
        foreign_members: None,
    }
}
