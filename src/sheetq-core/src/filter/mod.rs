//! Filter construction
//!
//! Each [`FilterSpec`] of an instruction is planned into at most one
//! [`Predicate`]; the predicates are evaluated against the table and ANDed
//! into a [`RowMask`]. Planning follows a fixed order:
//!
//! 1. resolve the column reference
//! 2. numeric condition on a resolved column (`">= 50"`, `"maior que 3"`)
//! 3. without a column, a single inline comparison naming its own column
//!    against a literal (`"Age > 30"`)
//! 4. without a column, a free-form boolean expression over column names
//!    and synonyms
//! 5. with a column: attached operator (`">=5"`), explicit equality
//!    (`"==female"`), or containment of any search term
//!
//! Building the mask never fails. A filter that cannot be planned or whose
//! predicate fails to evaluate is skipped with a warning and leaves the mask
//! unchanged.

mod eval;
mod mask;
mod rewrite;

pub use mask::RowMask;

use polars::prelude::*;
use sheetq_parser::{
    looks_like_expression, parse_equality_literal, parse_inline_comparison,
    parse_numeric_condition, parse_operator_literal, parse_search_terms, CompareOp,
    ExpressionParser, InlineComparison, NumericCondition,
};

use crate::cells::{lowercase_text, numeric_column};
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::instruction::{FilterSpec, Instruction};
use crate::resolver::ColumnResolver;

use rewrite::TokenRewriter;

/// A planned row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Numeric comparison; the column is coerced to numbers first
    Numeric {
        /// Column name
        column: String,
        /// Comparison to apply
        condition: NumericCondition,
    },
    /// Case-insensitive equality of the column's text form
    TextEquals {
        /// Column name
        column: String,
        /// Lower-cased literal
        literal: String,
        /// Keep rows that differ instead
        negated: bool,
    },
    /// The column's lower-cased text contains any of the terms
    ContainsAny {
        /// Column name
        column: String,
        /// Lower-cased search terms
        terms: Vec<String>,
    },
    /// Free-form boolean expression
    Expression {
        /// Condition text after column substitution
        source: String,
        /// Parsed expression
        expr: sheetq_parser::Expr,
    },
}

impl Predicate {
    /// Evaluate the predicate against every row of `df`
    pub fn evaluate(&self, df: &DataFrame) -> Result<Vec<bool>> {
        match self {
            Predicate::Numeric { column, condition } => {
                let values = numeric_column(df, column)?;
                Ok(values
                    .into_iter()
                    .map(|v| match v {
                        Some(n) if !n.is_nan() => condition.matches(n),
                        _ => condition.op == CompareOp::Ne,
                    })
                    .collect())
            }
            Predicate::TextEquals {
                column,
                literal,
                negated,
            } => Ok(lowercase_text(df, column)?
                .iter()
                .map(|text| (text == literal) != *negated)
                .collect()),
            Predicate::ContainsAny { column, terms } => Ok(lowercase_text(df, column)?
                .iter()
                .map(|text| terms.iter().any(|term| text.contains(term.as_str())))
                .collect()),
            Predicate::Expression { expr, .. } => eval::evaluate_mask(expr, df),
        }
    }
}

/// Plans filter specs against one table and evaluates them into a mask
pub struct FilterBuilder<'r, 'a> {
    df: &'a DataFrame,
    resolver: &'r ColumnResolver<'a>,
    rewriter: TokenRewriter<'r, 'a>,
    parser: ExpressionParser,
}

impl<'r, 'a> FilterBuilder<'r, 'a> {
    /// Create a builder for `df`; `resolver` must have been built over the same table
    #[must_use]
    pub fn new(df: &'a DataFrame, resolver: &'r ColumnResolver<'a>, config: &EngineConfig) -> Self {
        Self {
            df,
            resolver,
            rewriter: TokenRewriter::new(resolver),
            parser: ExpressionParser::with_max_length(config.max_expression_length),
        }
    }

    /// Build the mask for every filter and special condition of `instruction`
    #[must_use]
    pub fn build_mask(&self, instruction: &Instruction) -> RowMask {
        self.build_mask_from(&instruction.filter_specs())
    }

    /// Build the mask for a list of filter specs
    #[must_use]
    pub fn build_mask_from(&self, specs: &[FilterSpec]) -> RowMask {
        let mut mask = RowMask::all(self.df.height());
        for spec in specs {
            let Some(predicate) = self.plan(spec) else {
                continue;
            };
            match predicate.evaluate(self.df).and_then(|bits| mask.and(&bits)) {
                Ok(()) => log::debug!("Applied {predicate:?}, {} rows remain", mask.count()),
                Err(e) => log::warn!("Skipping filter {:?}: {e}", spec.value),
            }
        }
        mask
    }

    /// Plan one spec; `None` means the spec contributes no restriction
    #[must_use]
    pub fn plan(&self, spec: &FilterSpec) -> Option<Predicate> {
        let value = spec.value.trim();
        let column = spec.column.as_ref().and_then(|c| self.resolver.resolve(c));

        if spec.column.is_some() && column.is_none() {
            log::warn!(
                "Column {:?} not found",
                spec.column.as_ref().and_then(|c| c.primary())
            );
        }

        let Some(column) = column else {
            return self.plan_without_column(value);
        };

        if let Some(condition) = parse_numeric_condition(value) {
            return Some(Predicate::Numeric { column, condition });
        }

        if !self.resolver.has_column(&column) {
            log::warn!("Column '{column}' is not part of the table; filter skipped");
            return None;
        }

        if let Some(condition) = parse_operator_literal(value) {
            return Some(Predicate::Numeric { column, condition });
        }

        if let Some(literal) = parse_equality_literal(value) {
            return Some(Predicate::TextEquals {
                column,
                literal,
                negated: false,
            });
        }

        let terms: Vec<String> = parse_search_terms(value)
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() {
            log::debug!("Empty filter value for '{column}'; no restriction");
            return None;
        }
        Some(Predicate::ContainsAny { column, terms })
    }

    fn plan_without_column(&self, value: &str) -> Option<Predicate> {
        if let Some(inline) = parse_inline_comparison(value) {
            // a bare column name on the right compares two columns
            let between_columns = inline
                .bare_identifier()
                .and_then(|name| self.resolver.resolve_exact(name))
                .is_some();
            if !between_columns {
                if let Some(column) = self.resolver.resolve_name(&inline.identifier) {
                    return self.plan_inline(column, &inline);
                }
            }
        }

        if looks_like_expression(value) {
            return match self.plan_expression(value) {
                Ok(predicate) => Some(predicate),
                Err(e) => {
                    log::warn!("Skipping condition {value:?}: {e}");
                    None
                }
            };
        }

        log::warn!("Filter {value:?} names no usable column; skipped");
        None
    }

    fn plan_inline(&self, column: String, inline: &InlineComparison) -> Option<Predicate> {
        if let Some(value) = inline.numeric_literal() {
            return Some(Predicate::Numeric {
                column,
                condition: NumericCondition {
                    op: inline.op,
                    value,
                },
            });
        }
        match inline.op {
            CompareOp::Eq | CompareOp::Ne => Some(Predicate::TextEquals {
                column,
                literal: inline.literal.to_lowercase(),
                negated: inline.op == CompareOp::Ne,
            }),
            op => {
                log::warn!(
                    "Cannot apply '{op}' to text literal {:?}; filter skipped",
                    inline.literal
                );
                None
            }
        }
    }

    fn plan_expression(&self, value: &str) -> Result<Predicate> {
        let source = self.rewriter.rewrite(value);
        log::debug!("Rewrote condition {value:?} as {source:?}");
        let expr = self.parser.parse(&source)?;
        if let Some(missing) = expr
            .referenced_columns()
            .into_iter()
            .find(|name| !self.resolver.has_column(name))
        {
            return Err(Error::column(missing));
        }
        Ok(Predicate::Expression { source, expr })
    }
}

/// Build the row mask for `instruction` over `df`
#[must_use]
pub fn build_mask(
    df: &DataFrame,
    resolver: &ColumnResolver<'_>,
    instruction: &Instruction,
    config: &EngineConfig,
) -> RowMask {
    FilterBuilder::new(df, resolver, config).build_mask(instruction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonyms::SynonymMap;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn titanic() -> DataFrame {
        df! {
            "Name" => ["Braund, Mr. Owen", "Cumings, Mrs. John", "Heikkinen, Miss. Laina", "Futrelle, Mrs. Jacques", "Allen, Mr. William"],
            "Sex" => ["male", "female", "female", "female", "male"],
            "Age" => [Some(22.0), Some(38.0), None, Some(35.0), Some(35.0)],
            "Fare" => [7.25, 71.2833, 7.925, 53.1, 8.05],
            "Survived" => [0, 1, 1, 1, 0],
            "Ticket" => ["A/5 21171", "PC 17599", "STON/O2. 3101282", "113803", "373450"],
        }
        .unwrap()
    }

    fn mask_for(specs: &[FilterSpec], synonyms: &[(&str, &str)]) -> Vec<bool> {
        let df = titanic();
        let overrides: IndexMap<String, String> = synonyms
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let synonyms = SynonymMap::build(&IndexMap::new(), &overrides);
        let resolver = ColumnResolver::new(&df, &synonyms);
        let builder = FilterBuilder::new(&df, &resolver, &EngineConfig::default());
        builder.build_mask_from(specs).as_slice().to_vec()
    }

    fn plan(spec: FilterSpec) -> Option<Predicate> {
        let df = titanic();
        let synonyms = SynonymMap::default();
        let resolver = ColumnResolver::new(&df, &synonyms);
        FilterBuilder::new(&df, &resolver, &EngineConfig::default()).plan(&spec)
    }

    #[test]
    fn test_numeric_condition() {
        assert_eq!(
            mask_for(&[FilterSpec::new("Fare", ">=50")], &[]),
            vec![false, true, false, true, false]
        );
        assert_eq!(
            mask_for(&[FilterSpec::new("age", "menor que 30")], &[]),
            vec![true, false, false, false, false]
        );
    }

    #[test]
    fn test_numeric_not_equal_keeps_missing() {
        assert_eq!(
            mask_for(&[FilterSpec::new("Age", "!= 35")], &[]),
            vec![true, true, true, false, false]
        );
    }

    #[test]
    fn test_numeric_on_text_column_coerces() {
        assert_eq!(
            mask_for(&[FilterSpec::new("Ticket", "> 200000")], &[]),
            vec![false, false, false, false, true]
        );
    }

    #[test]
    fn test_text_equality_marker() {
        assert_eq!(
            mask_for(&[FilterSpec::new("Sex", "==Female")], &[]),
            vec![false, true, true, true, false]
        );
    }

    #[test]
    fn test_contains_any_term() {
        assert_eq!(
            mask_for(&[FilterSpec::new("Name", "miss, allen")], &[]),
            vec![false, false, true, false, true]
        );
    }

    #[test]
    fn test_specs_are_anded() {
        assert_eq!(
            mask_for(
                &[FilterSpec::new("Sex", "female"), FilterSpec::new("Fare", "> 50")],
                &[]
            ),
            vec![false, true, false, true, false]
        );
    }

    #[test]
    fn test_unresolved_column_skipped() {
        assert_eq!(
            mask_for(
                &[FilterSpec::new("Sobriviventes", "1"), FilterSpec::new("Sex", "male")],
                &[]
            ),
            // "male" is contained in "female" too
            vec![true; 5]
        );
        assert_eq!(
            mask_for(&[FilterSpec::new("Sobriviventes", ">= 1")], &[]),
            vec![true; 5]
        );
    }

    #[test]
    fn test_inline_comparison() {
        assert_eq!(
            mask_for(&[FilterSpec::condition("Age > 30")], &[]),
            vec![false, true, false, true, true]
        );
        assert_eq!(
            mask_for(&[FilterSpec::condition("sex = 'male'")], &[]),
            vec![true, false, false, false, true]
        );
        assert_eq!(
            plan(FilterSpec::condition("Sex != male")),
            Some(Predicate::TextEquals {
                column: "Sex".into(),
                literal: "male".into(),
                negated: true
            })
        );
        assert_eq!(plan(FilterSpec::condition("Sex > male")), None);
    }

    #[test]
    fn test_comparison_between_columns() {
        assert_eq!(
            mask_for(&[FilterSpec::condition("Fare > Age")], &[]),
            vec![false, true, false, true, false]
        );
        assert!(matches!(
            plan(FilterSpec::condition("Survived == survived")),
            Some(Predicate::Expression { .. })
        ));
        assert_eq!(
            mask_for(
                &[FilterSpec::condition("idade < tarifa")],
                &[("idade", "Age"), ("tarifa", "Fare")]
            ),
            vec![false, true, false, true, false]
        );
        // quoted, the same word is a literal
        assert_eq!(
            mask_for(&[FilterSpec::condition("Sex == 'Fare'")], &[]),
            vec![false; 5]
        );
    }

    #[test]
    fn test_expression_with_synonyms() {
        assert_eq!(
            mask_for(
                &[FilterSpec::condition("sobreviventes == 1 and tarifa < 60")],
                &[("sobreviventes", "Survived"), ("tarifa", "Fare")]
            ),
            vec![false, false, true, true, false]
        );
    }

    #[test]
    fn test_failed_expression_contributes_nothing() {
        assert_eq!(
            mask_for(
                &[
                    FilterSpec::condition("Cabin == 'C85' or Deck > 2"),
                    FilterSpec::condition("__import__('os') == 1"),
                    FilterSpec::new("Survived", "1"),
                ],
                &[]
            ),
            vec![false, true, true, true, false]
        );
    }

    #[test]
    fn test_plain_text_without_column_skipped() {
        assert_eq!(plan(FilterSpec::condition("southampton")), None);
    }

    #[test]
    fn test_empty_value_no_restriction() {
        assert_eq!(plan(FilterSpec::new("Name", "  ")), None);
    }

    #[test]
    fn test_long_expression_skipped() {
        let df = titanic();
        let synonyms = SynonymMap::default();
        let resolver = ColumnResolver::new(&df, &synonyms);
        let config = EngineConfig::default().with_max_expression_length(10);
        let builder = FilterBuilder::new(&df, &resolver, &config);
        let mask = builder.build_mask_from(&[FilterSpec::condition("Fare > 10 and Age > 30")]);
        assert!(mask.keeps_all());
    }
}
