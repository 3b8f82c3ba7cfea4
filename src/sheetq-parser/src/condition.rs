//! Pattern-based recognition of filter values
//!
//! Filter values arrive as loose text: `">= 5"`, `"maior que 10"`,
//! `"at least 3"`, `"Age > 30"` or plain search words. The functions here
//! classify such text without any knowledge of the table it will be applied to.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::CompareOp;

const NUMBER: &str = r"([-+]?\d+(?:\.\d+)?)";

static OPERATOR_PREFIXED: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(>=|<=|==|!=|>|<|=)\s*{NUMBER}$")).expect("valid regex"));

static OPERATOR_PREFIXED_STRICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^(==|!=|>=|<=|>|<)\s*{NUMBER}$")).expect("valid regex"));

/// Natural-language patterns, tried in order after the operator form
static WORD_PATTERNS: Lazy<Vec<(CompareOp, Regex)>> = Lazy::new(|| {
    [
        (
            CompareOp::Gt,
            r"(?:maior(?:es)? que|(?:greater|more|higher|bigger) than|above|acima de)",
        ),
        (
            CompareOp::Lt,
            r"(?:menor(?:es)? que|(?:less|fewer|lower|smaller) than|below|abaixo de)",
        ),
        (
            CompareOp::Ge,
            r"(?:maior ou igual a|greater than or equal to|at least|no m[ií]nimo)",
        ),
        (
            CompareOp::Le,
            r"(?:menor ou igual a|less than or equal to|at most|no m[aá]ximo)",
        ),
    ]
    .into_iter()
    .map(|(op, words)| {
        let re = Regex::new(&format!(r"{words}\s*{NUMBER}")).expect("valid regex");
        (op, re)
    })
    .collect()
});

static SEARCH_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s,;]+").expect("valid regex"));

static INLINE_COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z_][A-Za-z0-9_]*)\s*(==|!=|>=|<=|=|>|<)\s*['"]?([^'"]+?)['"]?$"#)
        .expect("valid regex")
});

static EXPRESSION_MARKERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[<>=!]| and | or ").expect("valid regex"));

static CONNECTIVES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:and|or|not|in)\b|[&|()]").expect("valid regex"));

/// A comparison against a numeric literal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericCondition {
    /// Comparison operator
    pub op: CompareOp,
    /// Right-hand literal
    pub value: f64,
}

impl NumericCondition {
    /// Test a cell value against the condition
    #[must_use]
    pub fn matches(&self, cell: f64) -> bool {
        self.op.compare(cell, self.value)
    }
}

/// A single `<identifier> <op> <literal>` comparison found inside a value
#[derive(Debug, Clone, PartialEq)]
pub struct InlineComparison {
    /// Column identifier as written
    pub identifier: String,
    /// Comparison operator
    pub op: CompareOp,
    /// Literal text, unquoted
    pub literal: String,
    /// The literal was written in quotes
    pub quoted: bool,
}

impl InlineComparison {
    /// The literal as a number, when it is one
    #[must_use]
    pub fn numeric_literal(&self) -> Option<f64> {
        let literal = self.literal.trim();
        literal.parse::<f64>().ok().filter(|n| n.is_finite())
    }

    /// The literal is a bare word that could name a column (`Parch` in
    /// `SibSp == Parch`)
    #[must_use]
    pub fn bare_identifier(&self) -> Option<&str> {
        let literal = self.literal.trim();
        let mut chars = literal.chars();
        let starts_word = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        (!self.quoted && starts_word && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'))
            .then_some(literal)
    }
}

/// Recognize a numeric comparison such as `>= 5`, `=3` or `menor que 2.5`.
///
/// The operator-prefixed form must span the whole (trimmed, lower-cased)
/// text; the natural-language forms may appear anywhere in it. The first
/// pattern that matches wins.
#[must_use]
pub fn parse_numeric_condition(text: &str) -> Option<NumericCondition> {
    let text = text.trim().to_lowercase();

    if let Some(caps) = OPERATOR_PREFIXED.captures(&text) {
        let op = CompareOp::from_symbol(&caps[1])?;
        let value = caps[2].parse::<f64>().ok()?;
        return Some(NumericCondition { op, value });
    }

    WORD_PATTERNS.iter().find_map(|(op, re)| {
        let caps = re.captures(&text)?;
        let value = caps[1].parse::<f64>().ok()?;
        Some(NumericCondition { op: *op, value })
    })
}

/// Recognize an operator attached to a number (`">=5"`). Unlike
/// [`parse_numeric_condition`] a bare `=` is not accepted here.
#[must_use]
pub fn parse_operator_literal(text: &str) -> Option<NumericCondition> {
    let caps = OPERATOR_PREFIXED_STRICT.captures(text.trim())?;
    let op = CompareOp::from_symbol(&caps[1])?;
    let value = caps[2].parse::<f64>().ok()?;
    Some(NumericCondition { op, value })
}

/// Extract the literal of an explicit equality marker (`"==female"`),
/// lower-cased and stripped of quotes
#[must_use]
pub fn parse_equality_literal(text: &str) -> Option<String> {
    let (_, literal) = text.split_once("==")?;
    Some(
        literal
            .trim()
            .trim_matches(|c| c == '\'' || c == '"')
            .to_lowercase(),
    )
}

/// Split a value into search terms on runs of whitespace, commas and semicolons
#[must_use]
pub fn parse_search_terms(text: &str) -> Vec<String> {
    SEARCH_SEPARATORS
        .split(text.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Find a single `"<identifier> <op> <literal>"` comparison spanning the
/// whole value. Compound text (connectives, parentheses) is left for the
/// expression evaluator.
#[must_use]
pub fn parse_inline_comparison(text: &str) -> Option<InlineComparison> {
    let text = text.trim();
    let caps = INLINE_COMPARISON.captures(text)?;
    let literal = caps[3].trim();
    if literal.is_empty() || CONNECTIVES.is_match(literal) {
        return None;
    }
    let quoted = caps
        .get(2)
        .is_some_and(|op| text[op.end()..].trim_start().starts_with(['\'', '"']));
    Some(InlineComparison {
        identifier: caps[1].to_string(),
        op: CompareOp::from_symbol(&caps[2])?,
        literal: literal.to_string(),
        quoted,
    })
}

/// Whether the text carries comparison operators or boolean connectives
#[must_use]
pub fn looks_like_expression(text: &str) -> bool {
    EXPRESSION_MARKERS.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cond(op: CompareOp, value: f64) -> Option<NumericCondition> {
        Some(NumericCondition { op, value })
    }

    #[test]
    fn test_operator_prefixed() {
        assert_eq!(parse_numeric_condition(">= 5"), cond(CompareOp::Ge, 5.0));
        assert_eq!(parse_numeric_condition("<2.5"), cond(CompareOp::Lt, 2.5));
        assert_eq!(parse_numeric_condition("!= -3"), cond(CompareOp::Ne, -3.0));
        assert_eq!(parse_numeric_condition("  == +7 "), cond(CompareOp::Eq, 7.0));
    }

    #[test]
    fn test_bare_equals_is_equality() {
        assert_eq!(parse_numeric_condition("=1"), cond(CompareOp::Eq, 1.0));
    }

    #[test]
    fn test_natural_language() {
        assert_eq!(
            parse_numeric_condition("maior que 50"),
            cond(CompareOp::Gt, 50.0)
        );
        assert_eq!(
            parse_numeric_condition("Menores que 18"),
            cond(CompareOp::Lt, 18.0)
        );
        assert_eq!(
            parse_numeric_condition("maior ou igual a 3"),
            cond(CompareOp::Ge, 3.0)
        );
        assert_eq!(
            parse_numeric_condition("menor ou igual a 0.5"),
            cond(CompareOp::Le, 0.5)
        );
        assert_eq!(
            parse_numeric_condition("passengers greater than 10"),
            cond(CompareOp::Gt, 10.0)
        );
        assert_eq!(parse_numeric_condition("at least 2"), cond(CompareOp::Ge, 2.0));
        assert_eq!(
            parse_numeric_condition("less than or equal to 4"),
            cond(CompareOp::Le, 4.0)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(parse_numeric_condition("female"), None);
        assert_eq!(parse_numeric_condition(">= five"), None);
        assert_eq!(parse_numeric_condition("5 >="), None);
        assert_eq!(parse_numeric_condition(""), None);
    }

    #[test]
    fn test_operator_literal_rejects_bare_equals() {
        assert_eq!(parse_operator_literal(">=5"), cond(CompareOp::Ge, 5.0));
        assert_eq!(parse_operator_literal("=5"), None);
    }

    #[test]
    fn test_equality_literal() {
        assert_eq!(parse_equality_literal("==Female"), Some("female".to_string()));
        assert_eq!(parse_equality_literal("== 'S'"), Some("s".to_string()));
        assert_eq!(parse_equality_literal("female"), None);
    }

    #[test]
    fn test_search_terms() {
        assert_eq!(
            parse_search_terms(" john, mary;  smith "),
            vec!["john", "mary", "smith"]
        );
        assert!(parse_search_terms("  ,; ").is_empty());
    }

    #[test]
    fn test_inline_comparison() {
        let found = parse_inline_comparison("Age > 30").unwrap();
        assert_eq!(found.identifier, "Age");
        assert_eq!(found.op, CompareOp::Gt);
        assert_eq!(found.numeric_literal(), Some(30.0));

        let found = parse_inline_comparison("Sex == 'female'").unwrap();
        assert_eq!(found.op, CompareOp::Eq);
        assert_eq!(found.literal, "female");
        assert_eq!(found.numeric_literal(), None);
        assert_eq!(found.bare_identifier(), None);
    }

    #[test]
    fn test_inline_comparison_between_columns() {
        let found = parse_inline_comparison("SibSp == Parch").unwrap();
        assert!(!found.quoted);
        assert_eq!(found.bare_identifier(), Some("Parch"));

        let found = parse_inline_comparison("Fare > 7.25").unwrap();
        assert_eq!(found.bare_identifier(), None);

        let found = parse_inline_comparison("Cabin == \"C85\"").unwrap();
        assert!(found.quoted);
        assert_eq!(found.bare_identifier(), None);
    }

    #[test]
    fn test_inline_comparison_leaves_compound_text() {
        assert_eq!(parse_inline_comparison("Age > 30 and Fare > 10"), None);
        assert_eq!(parse_inline_comparison("female"), None);
    }

    #[test]
    fn test_looks_like_expression() {
        assert!(looks_like_expression("Pclass == 1"));
        assert!(looks_like_expression("a AND b"));
        assert!(!looks_like_expression("southampton"));
    }
}
