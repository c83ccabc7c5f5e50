//! Phone inventory and coverage differences against a gold phone set.

use crate::error::{PhonesError, Result};
use crate::types::Record;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Flat set of accepted canonical phones for a language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoldPhoneSet {
    phones: BTreeSet<String>,
}

impl GoldPhoneSet {
    /// Parse one phone per line. Trailing whitespace is trimmed and blank
    /// lines are ignored.
    pub fn parse(text: &str) -> Self {
        let phones = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { phones }
    }

    /// `<phones_dir>/<lang>.txt`
    pub fn path_for(phones_dir: &Path, language: &str) -> PathBuf {
        phones_dir.join(format!("{}.txt", language))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PhonesError::MissingResource(path.to_path_buf()));
        }
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn contains(&self, phone: &str) -> bool {
        self.phones.contains(phone)
    }

    pub fn phones(&self) -> &BTreeSet<String> {
        &self.phones
    }

    pub fn len(&self) -> usize {
        self.phones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phones.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GoldPhoneSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            phones: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// All distinct phones appearing in the target transcriptions.
pub fn phone_inventory(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(Record::phones)
        .map(str::to_string)
        .collect()
}

/// Phones observed in `records` that are missing from `gold`.
pub fn unseen_phones(gold: &GoldPhoneSet, records: &[Record]) -> BTreeSet<String> {
    phone_inventory(records)
        .into_iter()
        .filter(|phone| !gold.contains(phone))
        .collect()
}
