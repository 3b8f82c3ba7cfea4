//! Projection and ranking

use polars::prelude::*;

use crate::error::Result;

/// Keep only `columns`, in the given order; an empty list keeps everything
pub fn project(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    if columns.is_empty() {
        return Ok(df.clone());
    }
    Ok(df.select(columns.iter().map(String::as_str))?)
}

/// Sort by `column` with missing values last, keep the first `limit` rows,
/// then project
pub fn top(
    df: &DataFrame,
    column: &str,
    descending: bool,
    limit: usize,
    columns: &[String],
) -> Result<DataFrame> {
    let sorted = df.sort(
        [column],
        SortMultipleOptions::default()
            .with_order_descending(descending)
            .with_nulls_last(true)
            .with_maintain_order(true),
    )?;
    project(&sorted.head(Some(limit)), columns)
}
