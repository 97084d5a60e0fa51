//! Raw title codes → canonical entity keys.
//!
//! Source vintages write the same title with or without a leading letter
//! depending on the workflow stage. Only the letters listed as significant
//! mark a permanently distinct category and stay part of the key; any other
//! accepted letter is dropped.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IdentifierError, ReconError};
use crate::model::EntityKey;

pub const DEFAULT_PREFIX_ALPHABET: &str = "AMNPCDE";
pub const DEFAULT_SIGNIFICANT_PREFIXES: [&str; 3] = ["C", "D", "E"];

#[derive(Debug, Clone)]
pub struct IdentifierRules {
    pattern: Regex,
    significant: BTreeSet<char>,
}

impl IdentifierRules {
    pub fn new(alphabet: &str, significant: &[String]) -> Result<Self, ReconError> {
        if alphabet.chars().any(|c| !c.is_ascii_alphabetic()) {
            return Err(ReconError::ConfigValidation(format!(
                "identifier prefixes must be ASCII letters, got {alphabet:?}"
            )));
        }

        let mut letters = BTreeSet::new();
        for prefix in significant {
            let mut chars = prefix.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if alphabet.contains(c) => {
                    letters.insert(c);
                }
                _ => {
                    return Err(ReconError::ConfigValidation(format!(
                        "significant prefix {prefix:?} is not a single letter of {alphabet:?}"
                    )))
                }
            }
        }

        let pattern = if alphabet.is_empty() {
            "^()([0-9]+)$".to_string()
        } else {
            format!("^([{}])?([0-9]+)$", regex::escape(alphabet))
        };
        let pattern = Regex::new(&pattern).map_err(|e| ReconError::ConfigValidation(e.to_string()))?;

        Ok(Self {
            pattern,
            significant: letters,
        })
    }

    /// Strip whitespace and map the code to its canonical key.
    pub fn normalize(&self, raw: Option<&str>) -> Result<EntityKey, IdentifierError> {
        let cleaned = clean(raw.ok_or(IdentifierError::Missing)?);
        if cleaned.is_empty() {
            return Err(IdentifierError::Missing);
        }

        let caps = self
            .pattern
            .captures(&cleaned)
            .ok_or_else(|| IdentifierError::Invalid(raw.unwrap_or_default().to_string()))?;
        let prefix = caps.get(1).and_then(|m| m.as_str().chars().next());
        let digits = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

        match prefix {
            Some(letter) if self.significant.contains(&letter) => {
                Ok(EntityKey::new(format!("{letter}{digits}")))
            }
            _ => Ok(EntityKey::new(digits)),
        }
    }

    /// Accepted prefix letter of a well-formed code, significant or not.
    pub fn prefix_of(&self, raw: &str) -> Option<char> {
        let cleaned = clean(raw);
        let caps = self.pattern.captures(&cleaned)?;
        caps.get(1).and_then(|m| m.as_str().chars().next())
    }
}

static DEFAULT_RULES: Lazy<IdentifierRules> = Lazy::new(|| {
    let significant: Vec<String> = DEFAULT_SIGNIFICANT_PREFIXES
        .iter()
        .map(|s| s.to_string())
        .collect();
    IdentifierRules::new(DEFAULT_PREFIX_ALPHABET, &significant).expect("valid default identifier rules")
});

impl Default for IdentifierRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

fn clean(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}
