//! Column resolution
//!
//! Maps a loosely specified reference to one real column of a table:
//!
//! 1. synonym lookup, re-validated against the real names (the synonym's
//!    literal target is used when no real column matches it)
//! 2. exact case-insensitive match
//! 3. substring match, first column in declaration order
//! 4. case-insensitive equality against the trimmed real names
//!
//! Resolution never looks at cell values and never changes the table.

use polars::prelude::*;

use crate::instruction::ColumnRef;
use crate::synonyms::{normalize, SynonymMap};

/// Resolves column references against one table and one synonym map
#[derive(Debug, Clone)]
pub struct ColumnResolver<'a> {
    /// Real names with their lower-cased form, in declaration order
    columns: Vec<(String, String)>,
    synonyms: &'a SynonymMap,
}

impl<'a> ColumnResolver<'a> {
    /// Create a resolver over the columns of `df`
    #[must_use]
    pub fn new(df: &DataFrame, synonyms: &'a SynonymMap) -> Self {
        let columns = df
            .get_column_names()
            .into_iter()
            .map(|name| {
                let name = name.to_string();
                let lower = name.to_lowercase();
                (name, lower)
            })
            .collect();
        Self { columns, synonyms }
    }

    /// Resolve a reference; lists use their first element
    #[must_use]
    pub fn resolve(&self, reference: &ColumnRef) -> Option<String> {
        reference.primary().and_then(|name| self.resolve_name(name))
    }

    /// Resolve a single free-form name
    #[must_use]
    pub fn resolve_name(&self, reference: &str) -> Option<String> {
        let key = normalize(reference);
        if key.is_empty() {
            return None;
        }

        if let Some(target) = self.synonyms.get(&key) {
            let target_key = normalize(target);
            let real = self
                .columns
                .iter()
                .find(|(_, lower)| *lower == target_key)
                .map_or_else(|| target.to_string(), |(name, _)| name.clone());
            log::debug!("Resolved '{reference}' to '{real}' through synonym");
            return Some(real);
        }

        if let Some((name, _)) = self.columns.iter().find(|(_, lower)| *lower == key) {
            return Some(name.clone());
        }

        if let Some((name, _)) = self.columns.iter().find(|(_, lower)| lower.contains(&key)) {
            log::debug!("Resolved '{reference}' to '{name}' by substring");
            return Some(name.clone());
        }

        let found = self
            .columns
            .iter()
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(reference.trim()))
            .map(|(name, _)| name.clone());
        if found.is_none() {
            log::debug!("Could not resolve column reference '{reference}'");
        }
        found
    }

    /// Resolve a token only when it is a column name or synonym key as a
    /// whole, never by substring; the result is always a real column
    #[must_use]
    pub fn resolve_exact(&self, token: &str) -> Option<String> {
        let key = normalize(token);
        let known = self.synonyms.get(&key).is_some()
            || self.columns.iter().any(|(_, lower)| *lower == key);
        if !known {
            return None;
        }
        self.resolve_name(token).filter(|name| self.has_column(name))
    }

    /// Resolve a list of references, dropping failures and repeats
    #[must_use]
    pub fn resolve_all(&self, references: &[ColumnRef]) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::with_capacity(references.len());
        for reference in references {
            match self.resolve(reference) {
                Some(name) if !resolved.contains(&name) => resolved.push(name),
                Some(_) => {}
                None => log::warn!("Skipping unresolved column {:?}", reference.primary()),
            }
        }
        resolved
    }

    /// Whether `name` is one of the table's real columns
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|(real, _)| real == name)
    }

    /// Real column names in declaration order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// The synonym map this resolver consults
    #[must_use]
    pub fn synonyms(&self) -> &SynonymMap {
        self.synonyms
    }
}
