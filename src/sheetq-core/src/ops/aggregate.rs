//! Counting and numeric reductions
//!
//! Ungrouped results are single-row tables. Grouped results keep the group
//! columns first, one row per group in order of first appearance.

use polars::prelude::*;

use crate::cells::numeric_values;
use crate::error::Result;

use super::stats::round_to;

/// Numeric reductions over one column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Arithmetic mean
    Mean,
    /// Sum
    Sum,
    /// Maximum
    Max,
    /// Minimum
    Min,
    /// Sample standard deviation
    Std,
}

impl Reduction {
    /// Short name, also the output column prefix
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Reduction::Mean => "mean",
            Reduction::Sum => "sum",
            Reduction::Max => "max",
            Reduction::Min => "min",
            Reduction::Std => "std",
        }
    }

    /// Output column name for `column`, e.g. `mean_Fare`
    #[must_use]
    pub fn output_name(self, column: &str) -> String {
        format!("{}_{column}", self.name())
    }

    /// Reduce the non-missing values
    #[must_use]
    pub fn apply(self, values: &Float64Chunked) -> Option<f64> {
        match self {
            Reduction::Mean => values.mean(),
            Reduction::Sum => values.sum(),
            Reduction::Max => values.max(),
            Reduction::Min => values.min(),
            Reduction::Std => values.std(1),
        }
    }

    /// Same reduction as a lazy expression over a numeric cast of `column`
    #[must_use]
    pub fn to_polars_expr(self, column: &str) -> Expr {
        let values = col(column).cast(DataType::Float64).fill_nan(lit(NULL));
        let reduced = match self {
            Reduction::Mean => values.mean(),
            Reduction::Sum => values.sum(),
            Reduction::Max => values.max(),
            Reduction::Min => values.min(),
            Reduction::Std => values.std(1),
        };
        reduced.alias(self.output_name(column))
    }
}

/// `{count}` for the whole table
pub fn count(df: &DataFrame) -> Result<DataFrame> {
    let height = df.height() as u64;
    Ok(DataFrame::new(vec![Column::new("count".into(), [height])])?)
}

/// Group columns plus `count`
pub fn count_grouped(df: &DataFrame, group_by: &[String]) -> Result<DataFrame> {
    let counted = df
        .clone()
        .lazy()
        .group_by_stable(group_keys(group_by))
        .agg([len().alias("count")])
        .collect()?;
    with_u64_column(counted, "count")
}

/// `{percent, filtered_total, overall_total}`; the percentage is 0 when the
/// original table is empty
pub fn percent(filtered_total: usize, overall_total: usize) -> Result<DataFrame> {
    let percent = share(filtered_total as u64, overall_total as u64);
    Ok(DataFrame::new(vec![
        Column::new("percent".into(), [percent]),
        Column::new("filtered_total".into(), [filtered_total as u64]),
        Column::new("overall_total".into(), [overall_total as u64]),
    ])?)
}

/// Per group of the original table: group columns, `group_total`,
/// `filtered_in_group` and `percent_in_group`. Groups with no filtered rows
/// report zero.
pub fn percent_grouped(
    filtered: &DataFrame,
    original: &DataFrame,
    group_by: &[String],
) -> Result<DataFrame> {
    let totals = original
        .clone()
        .lazy()
        .group_by_stable(group_keys(group_by))
        .agg([len().alias("group_total")]);
    let kept = filtered
        .clone()
        .lazy()
        .group_by_stable(group_keys(group_by))
        .agg([len().alias("filtered_in_group")]);

    let join_args = JoinArgs {
        how: JoinType::Left,
        suffix: None,
        validation: JoinValidation::ManyToMany,
        slice: None,
        coalesce: JoinCoalesce::CoalesceColumns,
        maintain_order: MaintainOrderJoin::Left,
        // a missing group key is a group of its own
        nulls_equal: true,
    };
    let mut result = totals
        .join(kept, group_keys(group_by), group_keys(group_by), join_args)
        .with_columns([
            col("group_total").cast(DataType::UInt64),
            col("filtered_in_group")
                .fill_null(lit(0))
                .cast(DataType::UInt64),
        ])
        .collect()?;

    let percents: Vec<f64> = count_values(&result, "filtered_in_group")?
        .into_iter()
        .zip(count_values(&result, "group_total")?)
        .map(|(kept, total)| share(kept, total))
        .collect();
    result.with_column(Column::new("percent_in_group".into(), percents))?;
    Ok(result)
}

/// `{<reduction>_<column>}` over the numeric reading of `column`
pub fn reduce(df: &DataFrame, column: &str, reduction: Reduction) -> Result<DataFrame> {
    let value = reduction.apply(&numeric_values(df, column)?);
    Ok(DataFrame::new(vec![Column::new(
        reduction.output_name(column).into(),
        [value],
    )])?)
}

/// Group columns plus `<reduction>_<column>`
pub fn reduce_grouped(
    df: &DataFrame,
    group_by: &[String],
    column: &str,
    reduction: Reduction,
) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .group_by_stable(group_keys(group_by))
        .agg([reduction.to_polars_expr(column)])
        .collect()?)
}

fn group_keys(group_by: &[String]) -> Vec<Expr> {
    group_by.iter().map(|name| col(name.as_str())).collect()
}

fn share(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ratio = part as f64 / whole as f64 * 100.0;
    round_to(ratio, 2)
}

fn count_values(df: &DataFrame, name: &str) -> Result<Vec<u64>> {
    let counts = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    Ok(counts.u64()?.into_iter().map(|c| c.unwrap_or(0)).collect())
}

fn with_u64_column(mut df: DataFrame, name: &str) -> Result<DataFrame> {
    let values = count_values(&df, name)?;
    df.with_column(Column::new(name.into(), values))?;
    Ok(df)
}
