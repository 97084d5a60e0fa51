// CSV/TSV snapshot import

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use geo_types::Geometry;
use tracing::warn;

use titres_recon::model::RawFeature;

use crate::error::IoError;

/// Header names accepted for the geometry column, compared case-insensitively.
const GEOMETRY_COLUMNS: [&str; 3] = ["wkt", "geometry", "the_geom"];

pub fn import(path: &Path) -> Result<Vec<RawFeature>, IoError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_str(path, &content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Vec<RawFeature>, IoError> {
    let content = read_file_as_utf8(path)?;
    import_from_str(path, &content, b'\t')
}

/// Pick the delimiter that splits the header into a recognised geometry
/// column and keeps the header's width across the first data rows.
///
/// WKT cells are quoted and full of commas, so the header alone decides
/// which candidates are viable. Falls back to comma.
fn sniff_delimiter(content: &str) -> u8 {
    const CANDIDATES: [u8; 4] = [b';', b'\t', b',', b'|'];

    let mut lines = content.lines();
    let Some(header) = lines.next() else {
        return b',';
    };
    let rows: Vec<&str> = lines.take(9).collect();

    let split = |line: &str, delim: u8| -> Option<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .and_then(Result::ok)
    };

    CANDIDATES
        .iter()
        .filter_map(|&delim| {
            let columns = split(header, delim)?;
            let has_geometry = columns
                .iter()
                .any(|h| GEOMETRY_COLUMNS.iter().any(|g| h.trim().eq_ignore_ascii_case(g)));
            if columns.len() <= 1 || !has_geometry {
                return None;
            }
            let matching = rows
                .iter()
                .filter(|&&row| split(row, delim).map(|r| r.len()) == Some(columns.len()))
                .count();
            Some((matching, columns.len(), delim))
        })
        .max_by_key(|&(matching, columns, _)| (matching, columns))
        .map(|(_, _, delim)| delim)
        .unwrap_or(b',')
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let read_err = |source| IoError::Read {
        path: path.to_path_buf(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(read_err)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Shapefile exports from desktop GIS are commonly Windows-1252
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

pub(crate) fn import_from_str(
    path: &Path,
    content: &str,
    delimiter: u8,
) -> Result<Vec<RawFeature>, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IoError::parse(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let geometry_col = headers
        .iter()
        .position(|h| GEOMETRY_COLUMNS.iter().any(|g| h.eq_ignore_ascii_case(g)))
        .ok_or_else(|| IoError::parse(path, "no WKT geometry column"))?;

    let mut features = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result.map_err(|e| IoError::parse(path, e))?;

        let mut attributes = BTreeMap::new();
        let mut geometry = None;
        for (col, field) in record.iter().enumerate() {
            if col == geometry_col {
                geometry = parse_wkt_cell(field, row);
            } else if let Some(name) = headers.get(col) {
                if !field.is_empty() {
                    attributes.insert(name.clone(), field.to_string());
                }
            }
        }
        features.push(RawFeature {
            geometry,
            attributes,
        });
    }

    Ok(features)
}

/// An empty cell is an absent geometry. Unparseable WKT is logged and
/// treated the same way.
fn parse_wkt_cell(cell: &str, row: usize) -> Option<Geometry<f64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    let parsed = wkt::Wkt::<f64>::from_str(cell)
        .map_err(|e| e.to_string())
        .and_then(|w| {
            Geometry::<f64>::try_from(w).map_err(|e: wkt::conversion::Error| format!("{:?}", e))
        });
    match parsed {
        Ok(g) => Some(g),
        Err(error) => {
            warn!(row, %error, "unparseable WKT, geometry dropped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SEMICOLON: &str = "NUMERO;TYPE;NOM;WKT\n\
        12;1;Lacq;POLYGON((0 0,1 0,1 1,0 1,0 0))\n\
        C7;4;;\n";

    #[test]
    fn sniff_semicolon_despite_wkt_commas() {
        assert_eq!(sniff_delimiter(SEMICOLON), b';');
    }

    #[test]
    fn sniff_requires_geometry_column_in_header() {
        let comma = "NUMERO,geometry\n12,\"POLYGON((0 0,1 0,1 1,0 0))\"\n";
        assert_eq!(sniff_delimiter(comma), b',');
        let tab = "NUMERO\tNOM;COURT\tWKT\n12\tA;B\tPOLYGON((0 0,1 0,1 1,0 0))\n";
        assert_eq!(sniff_delimiter(tab), b'\t');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn import_rows() {
        let features = import_from_str(Path::new("t.csv"), SEMICOLON, b';').unwrap();
        assert_eq!(features.len(), 2);
        assert!(matches!(features[0].geometry, Some(Geometry::Polygon(_))));
        assert_eq!(features[0].attribute("NOM"), Some("Lacq"));
        assert!(!features[0].attributes.contains_key("WKT"));
        assert!(features[1].geometry.is_none());
        assert_eq!(features[1].attribute("NOM"), None);
    }

    #[test]
    fn quoted_wkt_with_comma_delimiter() {
        let content = "NUMERO,geometry\n12,\"MULTIPOLYGON(((0 0,1 0,1 1,0 0)))\"\n";
        let features = import_from_str(Path::new("t.csv"), content, b',').unwrap();
        assert!(matches!(features[0].geometry, Some(Geometry::MultiPolygon(_))));
    }

    #[test]
    fn bad_wkt_becomes_absent_geometry() {
        let content = "NUMERO,WKT\n12,POLYGON((oops))\n";
        let features = import_from_str(Path::new("t.csv"), content, b',').unwrap();
        assert!(features[0].geometry.is_none());
        assert_eq!(features[0].attribute("NUMERO"), Some("12"));
    }

    #[test]
    fn missing_geometry_column_is_fatal() {
        let err = import_from_str(Path::new("t.csv"), "NUMERO,TYPE\n12,1\n", b',').unwrap_err();
        assert!(err.to_string().contains("WKT"));
    }

    #[test]
    fn windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "Pézenas" with é encoded as 0xE9
        fs::write(&path, b"NUMERO;NOM;WKT\n12;P\xE9zenas;\n").unwrap();
        let features = import(&path).unwrap();
        assert_eq!(features[0].attribute("NOM"), Some("Pézenas"));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = import(Path::new("/nonexistent/snapshot.csv")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }
}
