//! `titres-recon`: lifecycle reconciliation of dated title snapshots.
//!
//! Pure engine crate: receives pre-loaded features and reference areas,
//! returns interval-stamped title records. No CLI or IO dependencies.

pub mod admit;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod identifier;
pub mod model;
pub mod spatial;
pub mod summary;

pub use admit::{Admission, Rejection, RejectionReason};
pub use classify::{ClassificationTable, Classify};
pub use config::{DomainConfig, RunConfig, SourceConfig};
pub use engine::{reconcile, reconcile_domain, Reconciler};
pub use error::{GeometryError, IdentifierError, ReconError};
pub use geometry::{diff_area, shares_area, AreaMeasure, Boundary};
pub use identifier::IdentifierRules;
pub use model::{
    AreaId, DomainHistory, EntityKey, RawFeature, ReferenceArea, RunResult, Snapshot, TitleRecord,
    Validity,
};
pub use spatial::AreaIndex;
pub use summary::{DomainSummary, SnapshotStats};
