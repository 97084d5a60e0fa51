//! Raw attribute codes → title type / stage / procedure.
//!
//! The mapping is static data: a `ClassificationTable` is deserialized from
//! the run file (or taken from the built-in hydrocarbon table) once, then
//! shared read-only by the whole run.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::model::{Classification, RawFeature};

/// Domain-specific classification function.
pub trait Classify {
    /// `prefix` is the accepted prefix letter of the raw identifier, if any.
    /// `None` means the feature is unclassifiable and must be dropped.
    fn classify(&self, feature: &RawFeature, prefix: Option<char>) -> Option<Classification>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeEntry {
    #[serde(rename = "type")]
    pub title_type: String,
    #[serde(default)]
    pub stage: Option<String>,
}

/// The (type, stage) pair for which the identifier prefix encodes a procedure.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProcedureScope {
    #[serde(rename = "type")]
    pub title_type: String,
    pub stage: String,
}

/// Fields missing from a configured table fall back to the built-in
/// hydrocarbon table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassificationTable {
    pub type_field: String,
    pub stage_field: String,
    pub types: BTreeMap<String, TypeEntry>,
    pub stages: BTreeMap<String, String>,
    pub procedures: BTreeMap<String, String>,
    pub procedure_scope: Option<ProcedureScope>,
    pub labels: BTreeMap<String, String>,
}

static HYDROCARBON_TABLE: Lazy<ClassificationTable> = Lazy::new(|| {
    let entry = |title_type: &str, stage: Option<&str>| TypeEntry {
        title_type: title_type.into(),
        stage: stage.map(Into::into),
    };
    let pairs = |items: &[(&str, &str)]| -> BTreeMap<String, String> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    };

    ClassificationTable {
        type_field: "TYPE".into(),
        stage_field: "TITRE_DEM".into(),
        types: BTreeMap::from([
            ("1".into(), entry("cxx", Some("dex"))),
            ("2".into(), entry("cxx", Some("mfr"))),
            ("3".into(), entry("cxx", Some("mfr"))),
            ("4".into(), entry("prh", Some("dex"))),
            ("5".into(), entry("prh", Some("mfr"))),
            ("6".into(), entry("apx", Some("dex"))),
            ("APP".into(), entry("apx", None)),
            ("PER".into(), entry("prh", None)),
            ("C".into(), entry("cxx", None)),
            ("E".into(), entry("pxh", None)),
        ]),
        stages: pairs(&[("T", "dex"), ("D", "mfr")]),
        procedures: pairs(&[("M", "oct"), ("N", "pr1"), ("P", "pr2")]),
        procedure_scope: Some(ProcedureScope {
            title_type: "prh".into(),
            stage: "dex".into(),
        }),
        labels: pairs(&[
            ("cxx", "concession"),
            ("prh", "permis exclusif de recherches"),
            ("apx", "autorisation de prospections préalables"),
            ("pxh", "permis d’exploitation"),
        ]),
    }
});

impl Default for ClassificationTable {
    fn default() -> Self {
        HYDROCARBON_TABLE.clone()
    }
}

impl Classify for ClassificationTable {
    fn classify(&self, feature: &RawFeature, prefix: Option<char>) -> Option<Classification> {
        let mut title_type = None;
        let mut stage = None;

        if let Some(entry) = feature
            .attribute(&self.type_field)
            .and_then(|code| self.types.get(code.trim()))
        {
            title_type = Some(entry.title_type.clone());
            if entry.stage.is_some() {
                stage = entry.stage.clone();
            }
        }

        // The explicit stage column wins over the stage implied by the type code.
        if let Some(s) = feature
            .attribute(&self.stage_field)
            .and_then(|code| self.stages.get(code.trim()))
        {
            stage = Some(s.clone());
        }

        let title_type = title_type?;
        let stage = stage?;

        let procedure = match (&self.procedure_scope, prefix) {
            (Some(scope), Some(letter))
                if scope.title_type == title_type && scope.stage == stage =>
            {
                self.procedures.get(&letter.to_string()).cloned()
            }
            _ => None,
        };

        Some(Classification {
            type_label: self.labels.get(&title_type).cloned(),
            title_type,
            stage,
            procedure,
        })
    }
}
