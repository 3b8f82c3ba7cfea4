//! Token substitution for free-form conditions
//!
//! Before a free-form condition is parsed, every mention of a column name or
//! synonym key is replaced with a backtick reference to the column it
//! resolves to, so `idade > 30 and home port == 'S'` becomes
//! `` `Age` > 30 and `Home Port` == 'S' ``. Longer candidates win over
//! shorter ones they contain; quoted text is left alone.

use regex::{Captures, Regex, RegexBuilder};
use sheetq_parser::is_keyword;

use crate::resolver::ColumnResolver;

/// Rewrites condition text against one resolver
pub(crate) struct TokenRewriter<'r, 'a> {
    resolver: &'r ColumnResolver<'a>,
    pattern: Option<Regex>,
}

impl<'r, 'a> TokenRewriter<'r, 'a> {
    pub(crate) fn new(resolver: &'r ColumnResolver<'a>) -> Self {
        let mut candidates: Vec<String> = Vec::new();
        let names = resolver
            .column_names()
            .map(str::to_string)
            .chain(resolver.synonyms().keys().map(str::to_string));
        for name in names {
            let trimmed = name.trim();
            if trimmed.is_empty()
                || is_keyword(trimmed)
                || trimmed.parse::<f64>().is_ok()
                || candidates.iter().any(|c| c.eq_ignore_ascii_case(trimmed))
            {
                continue;
            }
            candidates.push(trimmed.to_string());
        }
        candidates.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

        let alternation = candidates
            .iter()
            .map(|c| bounded(c))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = if alternation.is_empty() {
            None
        } else {
            match RegexBuilder::new(&alternation).case_insensitive(true).build() {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Could not build column token pattern: {e}");
                    None
                }
            }
        };

        Self { resolver, pattern }
    }

    /// Replace resolvable tokens outside quotes; unresolved tokens stay verbatim
    pub(crate) fn rewrite(&self, text: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return text.to_string();
        };

        let mut out = String::with_capacity(text.len() + 16);
        for (segment, quoted) in split_quoted(text) {
            if quoted {
                out.push_str(segment);
                continue;
            }
            let replaced = pattern.replace_all(segment, |caps: &Captures<'_>| {
                let token = &caps[0];
                match self.resolver.resolve_name(token) {
                    Some(column) if !column.contains('`') => format!("`{column}`"),
                    _ => token.to_string(),
                }
            });
            out.push_str(&replaced);
        }
        out
    }
}

/// Escape a candidate, adding word boundaries on the sides that start or
/// end with a word character
fn bounded(candidate: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let start = if is_word(candidate.chars().next()) {
        r"\b"
    } else {
        ""
    };
    let end = if is_word(candidate.chars().last()) {
        r"\b"
    } else {
        ""
    };
    format!("{start}{}{end}", regex::escape(candidate))
}

/// Split text into alternating unquoted and quoted segments. Quotes are
/// `'`, `"` and backticks; an unterminated quote runs to the end.
fn split_quoted(text: &str) -> Vec<(&str, bool)> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quote: Option<(char, usize)> = None;

    for (i, c) in text.char_indices() {
        match quote {
            Some((q, open)) if c == q => {
                segments.push((&text[open..i + c.len_utf8()], true));
                start = i + c.len_utf8();
                quote = None;
            }
            Some(_) => {}
            None if matches!(c, '\'' | '"' | '`') => {
                if start < i {
                    segments.push((&text[start..i], false));
                }
                quote = Some((c, i));
            }
            None => {}
        }
    }

    match quote {
        Some((_, open)) => segments.push((&text[open..], true)),
        None if start < text.len() => segments.push((&text[start..], false)),
        None => {}
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonyms::SynonymMap;
    use indexmap::IndexMap;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        df! {
            "Age" => [22.0, 38.0],
            "Home Port" => ["S", "C"],
            "Fare" => [7.25, 71.28],
            "Fare Class" => [3, 1],
        }
        .unwrap()
    }

    fn rewrite_with(text: &str, pairs: &[(&str, &str)]) -> String {
        let df = frame();
        let overrides: IndexMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let synonyms = SynonymMap::build(&IndexMap::new(), &overrides);
        let resolver = ColumnResolver::new(&df, &synonyms);
        TokenRewriter::new(&resolver).rewrite(text)
    }

    #[test]
    fn test_columns_and_synonyms() {
        assert_eq!(
            rewrite_with("idade > 30 and home port == 'S'", &[("idade", "Age")]),
            "`Age` > 30 and `Home Port` == 'S'"
        );
    }

    #[test]
    fn test_longest_candidate_wins() {
        assert_eq!(
            rewrite_with("fare class == 1 and fare > 10", &[]),
            "`Fare Class` == 1 and `Fare` > 10"
        );
    }

    #[test]
    fn test_quoted_text_untouched() {
        assert_eq!(
            rewrite_with("Name == 'Age Fare' or `Fare` > 1", &[]),
            "Name == 'Age Fare' or `Fare` > 1"
        );
    }

    #[test]
    fn test_word_boundaries() {
        assert_eq!(rewrite_with("Agent > 1", &[]), "Agent > 1");
    }

    #[test]
    fn test_synonym_without_real_column() {
        // evaluation of `Ticket Price` fails later and the condition is skipped
        assert_eq!(
            rewrite_with("tarifa > 1", &[("tarifa", "Ticket Price")]),
            "`Ticket Price` > 1"
        );
    }

    #[test]
    fn test_split_quoted() {
        assert_eq!(
            split_quoted("a == 'x y' and \"z"),
            vec![("a == ", false), ("'x y'", true), (" and ", false), ("\"z", true)]
        );
    }
}
