//! Two-layer synonym lookup
//!
//! A [`SynonymMap`] is built fresh for every call from the configured base
//! layer with the instruction's override on top. Keys are normalized
//! (trimmed, lower-cased); targets keep their spelling.

use indexmap::IndexMap;

/// Normalize a free-form term or column name for comparison
#[must_use]
pub fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Term → column-name lookup, case-insensitive on the term side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymMap {
    entries: IndexMap<String, String>,
}

impl SynonymMap {
    /// Merge `overrides` on top of `base`; the override wins on key collision
    #[must_use]
    pub fn build(base: &IndexMap<String, String>, overrides: &IndexMap<String, String>) -> Self {
        let mut entries = IndexMap::with_capacity(base.len() + overrides.len());
        for (term, column) in base.iter().chain(overrides.iter()) {
            let key = normalize(term);
            if key.is_empty() {
                continue;
            }
            entries.insert(key, column.trim().to_string());
        }
        Self { entries }
    }

    /// Look up a term (normalized before lookup)
    #[must_use]
    pub fn get(&self, term: &str) -> Option<&str> {
        self.entries.get(&normalize(term)).map(String::as_str)
    }

    /// Normalized keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
