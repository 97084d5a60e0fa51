use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::admit::Admission;
use crate::classify::ClassificationTable;
use crate::error::ReconError;
use crate::geometry::AreaMeasure;
use crate::identifier::{IdentifierRules, DEFAULT_PREFIX_ALPHABET, DEFAULT_SIGNIFICANT_PREFIXES};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A run file: the reference areas, the output and every domain's manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub name: String,
    #[serde(default)]
    pub areas: Option<AreasConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    pub domains: Vec<DomainConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AreasConfig {
    pub file: String,
    #[serde(default = "default_area_id_property")]
    pub id_property: String,
}

fn default_area_id_property() -> String {
    "insee".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_file")]
    pub file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: default_output_file(),
        }
    }
}

fn default_output_file() -> String {
    "titres.geojson".into()
}

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

/// One category of titles, reconciled independently of every other domain.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    pub name: String,
    /// Symmetric-difference area above which a boundary change is material.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default)]
    pub measure: AreaMeasure,
    #[serde(default = "default_identifier_field")]
    pub identifier_field: String,
    #[serde(default = "default_prefix_alphabet")]
    pub identifier_prefixes: String,
    #[serde(default = "default_significant_prefixes")]
    pub significant_prefixes: Vec<String>,
    #[serde(default)]
    pub classification: ClassificationTable,
    pub sources: Vec<SourceConfig>,
}

/// One manifest entry: a snapshot file and its effective date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub date: NaiveDate,
    pub path: String,
}

fn default_tolerance() -> f64 {
    1000.0
}

fn default_identifier_field() -> String {
    "NUMERO".into()
}

fn default_prefix_alphabet() -> String {
    DEFAULT_PREFIX_ALPHABET.into()
}

fn default_significant_prefixes() -> Vec<String> {
    DEFAULT_SIGNIFICANT_PREFIXES.iter().map(|s| s.to_string()).collect()
}

impl DomainConfig {
    /// Sources in ascending date order. The sort is stable: sources sharing a
    /// date keep their manifest order.
    pub fn sorted_sources(&self) -> Vec<&SourceConfig> {
        let mut sources: Vec<&SourceConfig> = self.sources.iter().collect();
        sources.sort_by_key(|s| s.date);
        sources
    }

    pub fn identifier_rules(&self) -> Result<IdentifierRules, ReconError> {
        IdentifierRules::new(&self.identifier_prefixes, &self.significant_prefixes)
            .map_err(|e| match e {
                ReconError::ConfigValidation(msg) => {
                    ReconError::ConfigValidation(format!("domain '{}': {msg}", self.name))
                }
                other => other,
            })
    }

    pub fn admission(&self) -> Result<Admission<ClassificationTable>, ReconError> {
        Ok(Admission::new(
            self.identifier_field.clone(),
            self.identifier_rules()?,
            self.classification.clone(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.domains.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one domain is required".into(),
            ));
        }

        let mut names = HashSet::new();
        for domain in &self.domains {
            if domain.name.trim().is_empty() {
                return Err(ReconError::ConfigValidation("domain name is empty".into()));
            }
            if !names.insert(domain.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate domain '{}'",
                    domain.name
                )));
            }
            if domain.sources.is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "domain '{}': at least one source is required",
                    domain.name
                )));
            }
            if !domain.tolerance.is_finite() || domain.tolerance < 0.0 {
                return Err(ReconError::ConfigValidation(format!(
                    "domain '{}': tolerance must be a finite, non-negative number, got {}",
                    domain.name, domain.tolerance
                )));
            }
            domain.identifier_rules()?;
        }

        if let Some(ref areas) = self.areas {
            if areas.id_property.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "areas.id_property is empty".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn domain(&self, name: &str) -> Option<&DomainConfig> {
        self.domains.iter().find(|d| d.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Titres miniers"

[areas]
file = "communes.geojson"

[output]
file = "out/titres.geojson"

[[domains]]
name = "h"
tolerance = 1000.0

[[domains.sources]]
date = "2003-01-01"
path = "h/2003.geojson"

[[domains.sources]]
date = "2001-01-01"
path = "h/2001.geojson"

[[domains.sources]]
date = "2003-01-01"
path = "h/2003-bis.geojson"
"#;

    #[test]
    fn parse_valid() {
        let config = RunConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Titres miniers");
        assert_eq!(config.output.file, "out/titres.geojson");
        let areas = config.areas.as_ref().unwrap();
        assert_eq!(areas.id_property, "insee");

        let h = config.domain("h").unwrap();
        assert_eq!(h.tolerance, 1000.0);
        assert_eq!(h.measure, AreaMeasure::Geodesic);
        assert_eq!(h.identifier_field, "NUMERO");
        assert_eq!(h.identifier_prefixes, "AMNPCDE");
        assert_eq!(h.significant_prefixes, vec!["C", "D", "E"]);
        assert_eq!(h.classification, ClassificationTable::default());
    }

    #[test]
    fn sources_sorted_stably() {
        let config = RunConfig::from_toml(VALID).unwrap();
        let paths: Vec<&str> = config.domains[0]
            .sorted_sources()
            .iter()
            .map(|s| s.path.as_str())
            .collect();
        assert_eq!(paths, vec!["h/2001.geojson", "h/2003.geojson", "h/2003-bis.geojson"]);
    }

    #[test]
    fn defaults_when_sections_absent() {
        let config = RunConfig::from_toml(
            r#"
name = "Minimal"
[[domains]]
name = "m"
measure = "planar"
[[domains.sources]]
date = "2010-06-30"
path = "m.csv"
"#,
        )
        .unwrap();
        assert!(config.areas.is_none());
        assert_eq!(config.output.file, "titres.geojson");
        assert_eq!(config.domains[0].measure, AreaMeasure::Planar);
        assert_eq!(config.domains[0].tolerance, 1000.0);
    }

    #[test]
    fn reject_bad_date() {
        let err = RunConfig::from_toml(
            r#"
name = "Bad"
[[domains]]
name = "h"
[[domains.sources]]
date = "2001-13-01"
path = "h.geojson"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_no_domains() {
        let err = RunConfig::from_toml("name = \"Empty\"\ndomains = []\n").unwrap_err();
        assert!(err.to_string().contains("at least one domain"));
    }

    #[test]
    fn reject_duplicate_domain() {
        let err = RunConfig::from_toml(
            r#"
name = "Dup"
[[domains]]
name = "h"
[[domains.sources]]
date = "2001-01-01"
path = "a.geojson"
[[domains]]
name = "h"
[[domains.sources]]
date = "2001-01-01"
path = "b.geojson"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate domain 'h'"));
    }

    #[test]
    fn reject_domain_without_sources() {
        let err = RunConfig::from_toml(
            r#"
name = "Bad"
[[domains]]
name = "h"
sources = []
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least one source"));
    }

    #[test]
    fn reject_negative_tolerance() {
        let err = RunConfig::from_toml(
            r#"
name = "Bad"
[[domains]]
name = "h"
tolerance = -1.0
[[domains.sources]]
date = "2001-01-01"
path = "a.geojson"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("tolerance"));
    }

    #[test]
    fn reject_significant_prefix_outside_alphabet() {
        let err = RunConfig::from_toml(
            r#"
name = "Bad"
[[domains]]
name = "h"
identifier_prefixes = "MN"
significant_prefixes = ["C"]
[[domains.sources]]
date = "2001-01-01"
path = "a.geojson"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("domain 'h'"));
    }

    #[test]
    fn reject_unknown_measure() {
        let err = RunConfig::from_toml(
            r#"
name = "Bad"
[[domains]]
name = "h"
measure = "ellipsoidal"
[[domains.sources]]
date = "2001-01-01"
path = "a.geojson"
"#,
        );
        assert!(err.is_err(), "typo in measure should fail deserialization");
    }
}
