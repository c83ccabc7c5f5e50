//! Transcription normalization against a gold phone schema.
//!
//! Every phone of a transcription is canonicalized independently, then a
//! language-specific cleanup pass strips superscript sequences that the gold
//! inventory does not model (currently only Russian palatalization and
//! length marks scraped from Wiktionary).

use crate::schema::PhoneSchema;
use crate::types::{ChangeLogEntry, Normalized, Record};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

const RUSSIAN_FILTERS: &[&str] = &["⁽ʲ", "⁾ː", "⁾"];

/// Superscript sequences truncated from phones, keyed by language code.
static SUPERSCRIPT_FILTERS: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| HashMap::from([("rus", RUSSIAN_FILTERS)]));

/// Default superscript filters for a language (empty for most languages).
pub fn default_filters(language: &str) -> Vec<String> {
    SUPERSCRIPT_FILTERS
        .get(language)
        .map(|filters| filters.iter().map(|s| s.to_string()).collect())
        .unwrap_or_default()
}

/// Applies a [`PhoneSchema`] and cleanup filters to transcriptions.
#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    schema: PhoneSchema,
    filters: Vec<String>,
}

impl PhoneNormalizer {
    /// Normalizer using the built-in cleanup filters for `language`.
    pub fn for_language(schema: PhoneSchema, language: &str) -> Self {
        Self::with_filters(schema, default_filters(language))
    }

    pub fn with_filters(schema: PhoneSchema, filters: Vec<String>) -> Self {
        Self {
            schema,
            filters: filters.into_iter().filter(|f| !f.is_empty()).collect(),
        }
    }

    pub fn schema(&self) -> &PhoneSchema {
        &self.schema
    }

    /// Canonicalize a single phone and apply the cleanup filters.
    ///
    /// Each filter, in order, truncates the phone before its first occurrence.
    pub fn normalize_phone(&self, phone: &str) -> String {
        let mut clean = self.schema.canonicalize(phone).to_string();
        for filter in &self.filters {
            if let Some(pos) = clean.find(filter.as_str()) {
                clean.truncate(pos);
            }
        }
        clean
    }

    /// Normalize a space-delimited transcription.
    ///
    /// Phones emptied by a cleanup filter are dropped so that the output
    /// keeps single-space separators. If that would drop every phone, the
    /// canonicalized phones are kept unfiltered: a transcription never
    /// normalizes to an empty string.
    pub fn normalize(&self, transcription: &str) -> Normalized {
        let phones: Vec<String> = transcription
            .split(' ')
            .filter_map(|phone| {
                let clean = self.normalize_phone(phone);
                if clean.is_empty() && !phone.is_empty() {
                    None
                } else {
                    Some(clean)
                }
            })
            .collect();

        let text = if phones.iter().all(|p| p.is_empty()) && !transcription.is_empty() {
            transcription
                .split(' ')
                .map(|phone| self.schema.canonicalize(phone))
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            phones.join(" ")
        };
        let changed = text != transcription;
        Normalized { text, changed }
    }

    /// Normalize the target column in place, returning one entry per change.
    pub fn normalize_records(&self, records: &mut [Record]) -> Vec<ChangeLogEntry> {
        let mut changes = Vec::new();
        for record in records.iter_mut() {
            let normalized = self.normalize(&record.target);
            if normalized.changed {
                let entry = ChangeLogEntry {
                    original: std::mem::replace(&mut record.target, normalized.text),
                    normalized: record.target.clone(),
                };
                debug!("{}", entry);
                changes.push(entry);
            }
        }
        changes
    }
}
