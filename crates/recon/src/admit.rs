//! Per-feature admission: geometry, identifier, classification.
//!
//! Every failure here is recoverable: the feature is skipped with a
//! diagnostic and the snapshot carries on.

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::classify::Classify;
use crate::error::{GeometryError, IdentifierError};
use crate::geometry::Boundary;
use crate::identifier::IdentifierRules;
use crate::model::{AdmittedFeature, EntityKey, RawFeature};

const NAME_FIELDS: [&str; 2] = ["NOM", "NOM_MIN"];
const INDICATIVE_LABEL_FIELDS: [&str; 2] = ["TYPE_FR", "LEGENDE"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("title without geometry")]
    MissingGeometry,

    #[error("unusable geometry: {0}")]
    InvalidGeometry(#[from] GeometryError),

    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("title {0} has no known type or stage")]
    Unclassifiable(EntityKey),
}

/// Rejection category, used as a counter key in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    MissingGeometry,
    InvalidGeometry,
    MissingIdentifier,
    InvalidIdentifier,
    Unclassifiable,
}

impl Rejection {
    pub fn reason(&self) -> RejectionReason {
        match self {
            Self::MissingGeometry => RejectionReason::MissingGeometry,
            Self::InvalidGeometry(_) => RejectionReason::InvalidGeometry,
            Self::Identifier(IdentifierError::Missing) => RejectionReason::MissingIdentifier,
            Self::Identifier(IdentifierError::Invalid(_)) => RejectionReason::InvalidIdentifier,
            Self::Unclassifiable(_) => RejectionReason::Unclassifiable,
        }
    }
}

/// Admission rules of one domain.
#[derive(Debug, Clone)]
pub struct Admission<C> {
    identifier_field: String,
    rules: IdentifierRules,
    classifier: C,
}

impl<C: Classify> Admission<C> {
    pub fn new(identifier_field: impl Into<String>, rules: IdentifierRules, classifier: C) -> Self {
        Self {
            identifier_field: identifier_field.into(),
            rules,
            classifier,
        }
    }

    pub fn identifier_field(&self) -> &str {
        &self.identifier_field
    }

    pub fn admit(&self, mut feature: RawFeature) -> Result<AdmittedFeature, Rejection> {
        let geometry = feature.geometry.take().ok_or(Rejection::MissingGeometry)?;
        let geometry = Boundary::from_geometry(geometry)?;
        geometry.validate()?;

        let raw_id = feature.attribute(&self.identifier_field);
        let key = self.rules.normalize(raw_id)?;
        let prefix = raw_id.and_then(|raw| self.rules.prefix_of(raw));

        let classification = self
            .classifier
            .classify(&feature, prefix)
            .ok_or_else(|| Rejection::Unclassifiable(key.clone()))?;

        let name = first_of(&feature, &NAME_FIELDS);
        if name.is_none() {
            warn!(key = %key, "title without name");
        }

        Ok(AdmittedFeature {
            indicative_label: first_of(&feature, &INDICATIVE_LABEL_FIELDS),
            key,
            name,
            classification,
            geometry,
        })
    }
}

fn first_of(feature: &RawFeature, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .find_map(|f| feature.attribute(f))
        .map(|v| v.trim().to_string())
}
