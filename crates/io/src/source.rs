use std::path::Path;

use tracing::debug;

use titres_recon::model::RawFeature;

use crate::error::IoError;
use crate::{collection, csv};

/// Extract the raw features of one snapshot file, dispatching on its extension.
pub fn load_snapshot(path: &Path) -> Result<Vec<RawFeature>, IoError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let features = match ext.as_str() {
        "geojson" | "json" => collection::import(path)?,
        "csv" | "txt" => csv::import(path)?,
        "tsv" => csv::import_tsv(path)?,
        _ => {
            return Err(IoError::UnsupportedFormat {
                path: path.to_path_buf(),
            })
        }
    };

    debug!(path = %path.display(), features = features.len(), "snapshot extracted");
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn dispatch_on_extension() {
        let dir = tempdir().unwrap();
        let tsv = dir.path().join("s.TSV");
        fs::write(&tsv, "NUMERO\tWKT\n12\tPOLYGON((0 0,1 0,1 1,0 0))\n").unwrap();
        let geojson = dir.path().join("s.geojson");
        fs::write(&geojson, r#"{"type":"FeatureCollection","features":[]}"#).unwrap();

        assert_eq!(load_snapshot(&tsv).unwrap().len(), 1);
        assert!(load_snapshot(&geojson).unwrap().is_empty());
    }

    #[test]
    fn unknown_extension_is_fatal() {
        let dir = tempdir().unwrap();
        let shp = dir.path().join("s.shp");
        fs::write(&shp, b"\0\0\x27\x0a").unwrap();
        assert!(matches!(load_snapshot(&shp), Err(IoError::UnsupportedFormat { .. })));
    }
}
