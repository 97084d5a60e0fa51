use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use geo_types::Geometry;
use serde::Serialize;

use crate::geometry::Boundary;
use crate::summary::DomainSummary;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Canonical title identifier, unique across the history of one domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityKey(String);

impl EntityKey {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a reference administrative area (e.g. a commune INSEE code).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AreaId(String);

impl AreaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A feature as extracted from a snapshot file, before any filtering.
#[derive(Debug, Clone, Default)]
pub struct RawFeature {
    pub geometry: Option<Geometry<f64>>,
    pub attributes: BTreeMap<String, String>,
}

impl RawFeature {
    /// Attribute value, treating blank strings as absent.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(|v| v.as_str())
            .filter(|v| !v.trim().is_empty())
    }
}

/// One dated extraction of every title of a domain.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub features: Vec<RawFeature>,
}

/// A polygon of the fixed reference partition.
#[derive(Debug, Clone)]
pub struct ReferenceArea {
    pub id: AreaId,
    pub geometry: Boundary,
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    #[serde(rename = "type")]
    pub title_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_label: Option<String>,
    pub stage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedure: Option<String>,
}

/// A feature that passed geometry, identifier and classification checks.
#[derive(Debug, Clone)]
pub struct AdmittedFeature {
    pub key: EntityKey,
    pub name: Option<String>,
    pub indicative_label: Option<String>,
    pub classification: Classification,
    pub geometry: Boundary,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Half-open validity span `[start, end)`; `end == None` means still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Validity {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl Validity {
    pub fn open(start: NaiveDate) -> Self {
        Self { start, end: None }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// One version of a title: a geometry and classification valid over an interval.
#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub key: EntityKey,
    pub domain: String,
    pub name: Option<String>,
    pub indicative_label: Option<String>,
    pub classification: Classification,
    pub geometry: Boundary,
    pub areas: BTreeSet<AreaId>,
    pub validity: Validity,
}

/// Every record a domain produced, in creation order.
#[derive(Debug, Clone)]
pub struct DomainHistory {
    pub domain: String,
    pub records: Vec<TitleRecord>,
    pub summary: DomainSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
}

/// Result of a complete run, handed to the writer only once every domain succeeded.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub meta: RunMeta,
    pub domains: Vec<DomainHistory>,
}

impl RunResult {
    pub fn records(&self) -> impl Iterator<Item = &TitleRecord> {
        self.domains.iter().flat_map(|d| d.records.iter())
    }
}
