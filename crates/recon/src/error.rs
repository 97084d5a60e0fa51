use chrono::NaiveDate;
use thiserror::Error;

/// Fatal errors: any of these aborts the run before output is written.
#[derive(Error, Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Config validation error (no domains, bad prefix set, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),

    /// A snapshot was folded out of ascending date order.
    #[error("domain '{domain}': snapshot {date} folded after {previous}")]
    SnapshotOrder {
        domain: String,
        date: NaiveDate,
        previous: NaiveDate,
    },
}

/// Structural problems with a polygonal geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("ring {ring} has {positions} positions (at least 4 required)")]
    DegenerateRing { ring: usize, positions: usize },

    #[error("non-finite coordinate in ring {ring}")]
    NonFinite { ring: usize },

    #[error("geometry has no polygons")]
    Empty,

    #[error("unsupported geometry type: {0}")]
    NotPolygonal(&'static str),
}

/// Reasons a raw identifier cannot be turned into an entity key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("title without identifier")]
    Missing,

    #[error("invalid title identifier: {0:?}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ReconError>;
