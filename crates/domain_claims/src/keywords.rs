//! Versioned keyword dictionary for diagnosis-conditioned clauses
//!
//! The dictionary is configuration data, not code: a JSON document with an
//! ordered list of entries. Entries are ordered by specificity so that a
//! clause mentioning cancer resolves to the malignancy entry before the
//! generic disease entry gets a chance.
//!
//! ```json
//! {
//!   "version": "2024.1",
//!   "surgery_terms": ["surgery", "수술"],
//!   "entries": [
//!     { "tag": "malignancy", "clause_terms": ["암"], "diagnosis_terms": ["암"],
//!       "icd_prefixes": ["C"], "matches_any_diagnosis": false },
//!     { "tag": "indemnity", "clause_terms": ["실손"], "matches_any_diagnosis": true,
//!       "strategy": "indemnity" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::facts::DiagnosisFacts;
use crate::matching::Strategy;

const BUILTIN_DICTIONARY: &str = include_str!("../config/keywords.json");

/// Errors raised while loading a dictionary
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Failed to read keyword dictionary {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse keyword dictionary: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid keyword dictionary: {0}")]
    Invalid(String),
}

/// One keyword family, e.g. malignancy or fracture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub tag: String,
    /// Terms that tie a clause to this entry
    pub clause_terms: Vec<String>,
    /// Terms searched for in the diagnosis name
    #[serde(default)]
    pub diagnosis_terms: Vec<String>,
    /// ICD code prefixes that count as a hit
    #[serde(default)]
    pub icd_prefixes: Vec<String>,
    /// The entry applies to every diagnosis
    #[serde(default)]
    pub matches_any_diagnosis: bool,
    /// How clauses resolved to this entry are paid, instead of the rule's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
}

impl KeywordEntry {
    /// Returns true if any clause term occurs in `clause_text`
    pub fn covers_clause(&self, clause_text: &str) -> bool {
        let text = clause_text.to_lowercase();
        self.clause_terms
            .iter()
            .any(|term| text.contains(&term.to_lowercase()))
    }

    /// Returns true if the diagnosis triggers this entry
    pub fn hits(&self, diagnosis: &DiagnosisFacts) -> bool {
        if self.matches_any_diagnosis {
            return true;
        }

        let name = diagnosis.diagnosis_name.to_lowercase();
        if self
            .diagnosis_terms
            .iter()
            .any(|term| name.contains(&term.to_lowercase()))
        {
            return true;
        }

        match diagnosis.icd_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let code = code.to_uppercase();
                self.icd_prefixes
                    .iter()
                    .any(|prefix| code.starts_with(&prefix.to_uppercase()))
            }
            _ => false,
        }
    }
}

/// Ordered keyword configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordDictionary {
    pub version: String,
    #[serde(default)]
    pub surgery_terms: Vec<String>,
    pub entries: Vec<KeywordEntry>,
}

impl KeywordDictionary {
    /// The dictionary shipped with the crate
    pub fn builtin() -> Result<Self, DictionaryError> {
        Self::from_json(BUILTIN_DICTIONARY)
    }

    /// Parses and validates a JSON document
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        let dictionary: KeywordDictionary = serde_json::from_str(json)?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Loads a dictionary from a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DictionaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), DictionaryError> {
        if self.version.trim().is_empty() {
            return Err(DictionaryError::Invalid("version must not be empty".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.entries {
            if entry.tag.trim().is_empty() {
                return Err(DictionaryError::Invalid("entry tag must not be empty".to_string()));
            }
            if !seen.insert(entry.tag.as_str()) {
                return Err(DictionaryError::Invalid(format!("duplicate tag '{}'", entry.tag)));
            }
        }
        Ok(())
    }

    /// The first entry, in specificity order, that covers the clause text
    pub fn resolve(&self, clause_text: &str) -> Option<&KeywordEntry> {
        self.entries.iter().find(|entry| entry.covers_clause(clause_text))
    }

    /// Returns true if the diagnosis text mentions a surgery
    pub fn mentions_surgery(&self, diagnosis: &DiagnosisFacts) -> bool {
        let text = diagnosis.diagnosis_text.to_lowercase();
        self.surgery_terms
            .iter()
            .any(|term| text.contains(&term.to_lowercase()))
    }
}
