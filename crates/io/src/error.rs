use std::path::PathBuf;

use thiserror::Error;

/// Boundary failures. All of them are fatal to a run.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported snapshot format: {} (expected .geojson, .json, .csv, .tsv or .txt)", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("{}: reference area #{index}: {message}", path.display())]
    ReferenceArea {
        path: PathBuf,
        index: usize,
        message: String,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl IoError {
    pub(crate) fn parse(path: &std::path::Path, message: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }
}
