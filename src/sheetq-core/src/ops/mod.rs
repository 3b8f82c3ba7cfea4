//! Operation dispatch
//!
//! Operations run on the filtered table after the mask has been applied.
//! Names are matched case-insensitively and accept English and Portuguese
//! spellings. [`dispatch`] never fails: a computation error yields an empty
//! table, and an unrecognized name returns the filtered table unchanged.
//!
//! - [`aggregate`] - counts, percentages and numeric reductions
//! - [`stats`] - describe and correlation
//! - [`select`] - projection and ranking

pub mod aggregate;
pub mod select;
pub mod stats;

use std::fmt;

use polars::prelude::*;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::instruction::{ColumnRef, Instruction};
use crate::resolver::ColumnResolver;

use aggregate::Reduction;

/// Operations the dispatcher knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// No operation: the filtered table, optionally projected
    Select,
    /// Row count, optionally per group
    Count,
    /// Share of rows kept by the filter, optionally per group
    Percent,
    /// Numeric reduction over the operand column
    Reduce(Reduction),
    /// Descriptive statistics of the operand column
    Describe,
    /// Rows sorted by the operand column, limited
    Top,
    /// Projection of the filtered table
    List,
    /// Pearson correlation of a column pair
    Correlation,
    /// Mean of a value column per group
    CompareMean,
    /// Anything else; the filtered table is returned unchanged
    Unrecognized(String),
}

impl Operation {
    /// Parse an operation name; absent or blank means [`Operation::Select`]
    #[must_use]
    pub fn from_name(name: Option<&str>) -> Self {
        let Some(name) = name.map(|n| n.trim().to_lowercase()).filter(|n| !n.is_empty()) else {
            return Operation::Select;
        };
        match name.as_str() {
            "count" | "contagem" => Operation::Count,
            "percent" | "porcentagem" | "percentage" | "percentual" => Operation::Percent,
            "mean" | "media" | "média" => Operation::Reduce(Reduction::Mean),
            "sum" | "soma" => Operation::Reduce(Reduction::Sum),
            "max" | "maximo" | "máximo" => Operation::Reduce(Reduction::Max),
            "min" | "minimo" | "mínimo" => Operation::Reduce(Reduction::Min),
            "std" | "desvio" => Operation::Reduce(Reduction::Std),
            "describe" => Operation::Describe,
            "top" | "ranking" => Operation::Top,
            "list" | "listar" => Operation::List,
            "correlation" | "correlacao" | "correlação" => Operation::Correlation,
            "compare_mean" | "comparar_media" => Operation::CompareMean,
            _ => Operation::Unrecognized(name),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Select => write!(f, "select"),
            Operation::Count => write!(f, "count"),
            Operation::Percent => write!(f, "percent"),
            Operation::Reduce(reduction) => write!(f, "{}", reduction.name()),
            Operation::Describe => write!(f, "describe"),
            Operation::Top => write!(f, "top"),
            Operation::List => write!(f, "list"),
            Operation::Correlation => write!(f, "correlation"),
            Operation::CompareMean => write!(f, "compare_mean"),
            Operation::Unrecognized(name) => write!(f, "{name}"),
        }
    }
}

/// Everything an operation may look at
#[derive(Debug, Clone, Copy)]
pub struct OperationContext<'a> {
    /// Table after filtering; must not be empty
    pub filtered: &'a DataFrame,
    /// Table before filtering, used for `percent` totals
    pub original: &'a DataFrame,
    /// Resolver built over the original table
    pub resolver: &'a ColumnResolver<'a>,
    /// The instruction being executed
    pub instruction: &'a Instruction,
    /// Engine settings
    pub config: &'a EngineConfig,
}

/// Run the instruction's operation; failures give an empty table
#[must_use]
pub fn dispatch(ctx: &OperationContext<'_>) -> DataFrame {
    let operation = Operation::from_name(ctx.instruction.operation.as_deref());
    match execute(&operation, ctx) {
        Ok(result) => result,
        Err(e) => {
            log::warn!("Operation '{operation}' failed: {e}");
            DataFrame::empty()
        }
    }
}

/// Run one operation, propagating errors
pub fn execute(operation: &Operation, ctx: &OperationContext<'_>) -> Result<DataFrame> {
    let instruction = ctx.instruction;
    let filtered = ctx.filtered;
    let group_by = existing_columns(ctx, &instruction.group_by);
    let projection = existing_columns(ctx, &instruction.columns_to_show);
    let operand = instruction
        .operand_column
        .as_ref()
        .and_then(|reference| resolve_existing(ctx, reference));

    log::debug!("Running '{operation}' over {} rows", filtered.height());

    match operation {
        Operation::Select | Operation::List => select::project(filtered, &projection),
        Operation::Unrecognized(name) => {
            log::warn!("Unrecognized operation '{name}'; returning the filtered table");
            Ok(filtered.clone())
        }
        Operation::Count if group_by.is_empty() => aggregate::count(filtered),
        Operation::Count => aggregate::count_grouped(filtered, &group_by),
        Operation::Percent if group_by.is_empty() => {
            aggregate::percent(filtered.height(), ctx.original.height())
        }
        Operation::Percent => aggregate::percent_grouped(filtered, ctx.original, &group_by),
        Operation::Reduce(reduction) => {
            let Some(column) = operand else {
                return Ok(missing_operand(operation));
            };
            if *reduction == Reduction::Mean && !group_by.is_empty() {
                aggregate::reduce_grouped(filtered, &group_by, &column, *reduction)
            } else {
                aggregate::reduce(filtered, &column, *reduction)
            }
        }
        Operation::Describe => match operand {
            Some(column) => stats::describe(filtered, &column),
            None => Ok(missing_operand(operation)),
        },
        Operation::Top => {
            let Some(column) = operand else {
                log::warn!("No operand column for 'top'; returning the filtered table");
                return Ok(filtered.clone());
            };
            let limit = instruction.result_limit.unwrap_or(ctx.config.default_limit);
            let descending = !is_ascending(instruction.ranking_direction.as_deref());
            select::top(filtered, &column, descending, limit, &projection)
        }
        Operation::Correlation => {
            let pair = if instruction.correlation_pair.is_empty() {
                &instruction.comparison_pair
            } else {
                &instruction.correlation_pair
            };
            match resolve_pair(ctx, pair) {
                Some((a, b)) => stats::correlation(filtered, &a, &b),
                None => Ok(DataFrame::empty()),
            }
        }
        Operation::CompareMean => match resolve_pair(ctx, &instruction.comparison_pair) {
            Some((value, group)) => {
                aggregate::reduce_grouped(filtered, &[group], &value, Reduction::Mean)
            }
            None => Ok(DataFrame::empty()),
        },
    }
}

/// `asc`, `ascending`, `cresc` and `crescente` sort ascending; anything else descending
#[must_use]
pub fn is_ascending(direction: Option<&str>) -> bool {
    direction.is_some_and(|d| {
        matches!(
            d.trim().to_lowercase().as_str(),
            "asc" | "ascending" | "cresc" | "crescente"
        )
    })
}

fn missing_operand(operation: &Operation) -> DataFrame {
    log::warn!("Operation '{operation}' needs an operand column that is missing");
    DataFrame::empty()
}

fn resolve_existing(ctx: &OperationContext<'_>, reference: &ColumnRef) -> Option<String> {
    let column = ctx.resolver.resolve(reference)?;
    if ctx.resolver.has_column(&column) {
        Some(column)
    } else {
        log::warn!("Column '{column}' is not part of the table");
        None
    }
}

fn existing_columns(ctx: &OperationContext<'_>, references: &[ColumnRef]) -> Vec<String> {
    ctx.resolver
        .resolve_all(references)
        .into_iter()
        .filter(|column| {
            let present = ctx.resolver.has_column(column);
            if !present {
                log::warn!("Column '{column}' is not part of the table");
            }
            present
        })
        .collect()
}

fn resolve_pair(ctx: &OperationContext<'_>, pair: &[ColumnRef]) -> Option<(String, String)> {
    if pair.len() < 2 {
        log::warn!("A pair of columns is required, got {}", pair.len());
        return None;
    }
    let first = resolve_existing(ctx, &pair[0])?;
    let second = resolve_existing(ctx, &pair[1])?;
    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synonyms::SynonymMap;
    use pretty_assertions::assert_eq;

    fn passengers() -> DataFrame {
        df! {
            "Name" => ["a", "b", "c", "d"],
            "Fare" => [10.0, 80.0, 30.0, 55.0],
            "Age" => [Some(20.0), None, Some(40.0), Some(30.0)],
            "Survived" => [0, 1, 0, 1],
        }
        .unwrap()
    }

    fn run(instruction: &Instruction) -> DataFrame {
        let df = passengers();
        let synonyms = SynonymMap::default();
        let resolver = ColumnResolver::new(&df, &synonyms);
        let config = EngineConfig::default();
        dispatch(&OperationContext {
            filtered: &df,
            original: &df,
            resolver: &resolver,
            instruction,
            config: &config,
        })
    }

    #[test]
    fn test_operation_names() {
        assert_eq!(Operation::from_name(None), Operation::Select);
        assert_eq!(Operation::from_name(Some(" ")), Operation::Select);
        assert_eq!(Operation::from_name(Some("CONTAGEM")), Operation::Count);
        assert_eq!(
            Operation::from_name(Some("Média")),
            Operation::Reduce(Reduction::Mean)
        );
        assert_eq!(Operation::from_name(Some("ranking")), Operation::Top);
        assert_eq!(
            Operation::from_name(Some("pivot")),
            Operation::Unrecognized("pivot".to_string())
        );
    }

    #[test]
    fn test_ranking_direction() {
        assert!(is_ascending(Some("Crescente")));
        assert!(is_ascending(Some("asc")));
        assert!(!is_ascending(Some("desc")));
        assert!(!is_ascending(None));
    }

    #[test]
    fn test_unrecognized_returns_filtered() {
        let result = run(&Instruction::new().with_operation("pivot"));
        assert!(result.equals_missing(&passengers()));
    }

    #[test]
    fn test_missing_operand_is_empty() {
        let result = run(&Instruction::new().with_operation("sum").with_operand("Weight"));
        assert_eq!(result.shape(), (0, 0));
        let result = run(&Instruction::new().with_operation("describe"));
        assert_eq!(result.shape(), (0, 0));
    }

    #[test]
    fn test_top_without_operand_returns_filtered() {
        let result = run(&Instruction::new().with_operation("top"));
        assert_eq!(result.height(), 4);
    }

    #[test]
    fn test_select_projection_skips_unknown() {
        let mut instruction = Instruction::new();
        instruction.columns_to_show = vec![ColumnRef::from("fare"), ColumnRef::from("Weight")];
        let result = run(&instruction);
        assert_eq!(result.get_column_names_str(), vec!["Fare"]);
    }

    #[test]
    fn test_correlation_pair_fallback() {
        let mut instruction = Instruction::new().with_operation("correlation");
        instruction.comparison_pair = vec![ColumnRef::from("Fare"), ColumnRef::from("Survived")];
        let result = run(&instruction);
        assert_eq!(result.height(), 1);
        assert_eq!(
            result.column("columns").unwrap().get(0).unwrap(),
            AnyValue::String("Fare vs Survived")
        );
    }

    #[test]
    fn test_compare_mean() {
        let mut instruction = Instruction::new().with_operation("comparar_media");
        instruction.comparison_pair = vec![ColumnRef::from("Fare"), ColumnRef::from("Survived")];
        let result = run(&instruction);
        assert_eq!(result.get_column_names_str(), vec!["Survived", "mean_Fare"]);
        let means: Vec<Option<f64>> = result
            .column("mean_Fare")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(means, vec![Some(20.0), Some(67.5)]);
    }

    #[test]
    fn test_compare_mean_needs_pair() {
        let mut instruction = Instruction::new().with_operation("compare_mean");
        instruction.comparison_pair = vec![ColumnRef::from("Fare")];
        assert_eq!(run(&instruction).shape(), (0, 0));
    }
}
