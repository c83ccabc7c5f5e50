//! Gold phone schema and symbol canonicalization.
//!
//! A schema file is a JSON object mapping each canonical phone to the
//! variants that should fold into it:
//!
//! ```json
//! { "p": ["p", "pʰ"], "a": ["a", "ɑ"] }
//! ```
//!
//! The schema is turned into a variant → canonical index once at load time.
//! A variant claimed by two canonical phones, or a canonical phone listed as
//! a variant of another, is rejected so lookups never depend on key order.

use crate::error::{PhonesError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Validated many-to-one mapping from phone variants to canonical phones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct PhoneSchema {
    groups: BTreeMap<String, Vec<String>>,
    index: HashMap<String, String>,
}

impl PhoneSchema {
    /// Build a schema from canonical → variants groups.
    pub fn from_groups(groups: BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut index: HashMap<String, String> = groups
            .keys()
            .map(|canonical| (canonical.clone(), canonical.clone()))
            .collect();

        for (canonical, variants) in &groups {
            for variant in variants {
                if variant == canonical {
                    continue;
                }
                if groups.contains_key(variant) {
                    return Err(PhonesError::ConflictingCanonical {
                        canonical: variant.clone(),
                        other: canonical.clone(),
                    });
                }
                match index.get(variant) {
                    Some(existing) if existing != canonical => {
                        return Err(PhonesError::AmbiguousVariant {
                            variant: variant.clone(),
                            first: existing.clone(),
                            second: canonical.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        index.insert(variant.clone(), canonical.clone());
                    }
                }
            }
        }

        Ok(Self { groups, index })
    }

    /// Parse a schema from its JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let groups: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Self::from_groups(groups)
    }

    /// Load a schema from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PhonesError::MissingResource(path.to_path_buf()));
        }
        let schema = Self::from_json_str(&fs::read_to_string(path)?)?;
        debug!(
            "Loaded phone schema from {}: {} canonical phones, {} symbols",
            path.display(),
            schema.groups.len(),
            schema.index.len()
        );
        Ok(schema)
    }

    /// Map a phone to its canonical form. Unknown phones pass through.
    pub fn canonicalize<'a>(&'a self, phone: &'a str) -> &'a str {
        self.index.get(phone).map(String::as_str).unwrap_or(phone)
    }

    pub fn is_known(&self, phone: &str) -> bool {
        self.index.contains_key(phone)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl TryFrom<BTreeMap<String, Vec<String>>> for PhoneSchema {
    type Error = PhonesError;

    fn try_from(groups: BTreeMap<String, Vec<String>>) -> Result<Self> {
        Self::from_groups(groups)
    }
}

impl From<PhoneSchema> for BTreeMap<String, Vec<String>> {
    fn from(schema: PhoneSchema) -> Self {
        schema.groups
    }
}
