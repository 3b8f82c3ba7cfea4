//! Engine configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default number of rows returned by `top`
pub const DEFAULT_LIMIT: usize = 5;

/// Default upper bound on the length of a free-form expression
pub const DEFAULT_MAX_EXPRESSION_LENGTH: usize = sheetq_parser::DEFAULT_MAX_LENGTH;

/// Settings shared by every invocation of an [`crate::Engine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Built-in synonym layer; per-call overrides are merged on top
    pub base_synonyms: IndexMap<String, String>,
    /// Rows kept by `top` when the instruction gives no limit
    pub default_limit: usize,
    /// Free-form expressions longer than this are skipped
    pub max_expression_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_synonyms: default_synonyms(),
            default_limit: DEFAULT_LIMIT,
            max_expression_length: DEFAULT_MAX_EXPRESSION_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Extend the base synonym layer; later entries replace earlier ones
    #[must_use]
    pub fn with_synonyms<I, K, V>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (term, column) in synonyms {
            self.base_synonyms.insert(term.into(), column.into());
        }
        self
    }

    /// Set the default `top` limit
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Set the maximum free-form expression length
    #[must_use]
    pub fn with_max_expression_length(mut self, max: usize) -> Self {
        self.max_expression_length = max;
        self
    }
}

/// The built-in dictionary. It only holds placeholders; real deployments
/// extend it through configuration or per-call overrides.
#[must_use]
pub fn default_synonyms() -> IndexMap<String, String> {
    IndexMap::from([
        ("termo".to_string(), "Nome Coluna".to_string()),
        ("outro termo".to_string(), "Outra Coluna".to_string()),
    ])
}
