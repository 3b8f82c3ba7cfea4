//! Row-level cell access shared by the filter and the operations

use polars::prelude::*;

use crate::error::{Error, Result};

/// A single table cell, reduced to the kinds the engine reasons about
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    Null,
    Num(f64),
    Text(String),
    Bool(bool),
}

impl Cell {
    pub(crate) fn from_any(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => Cell::Null,
            AnyValue::Boolean(b) => Cell::Bool(*b),
            AnyValue::String(s) => Cell::Text((*s).to_string()),
            AnyValue::StringOwned(s) => Cell::Text(s.to_string()),
            other => match other.extract::<f64>() {
                Some(n) if n.is_nan() => Cell::Null,
                Some(n) => Cell::Num(n),
                None => Cell::Text(other.to_string()),
            },
        }
    }

    /// Numeric reading: booleans count as 0/1, text must parse
    pub(crate) fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Num(n) => Some(*n),
            Cell::Bool(b) => Some(f64::from(u8::from(*b))),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Null => None,
        }
    }

    /// The text a cell shows when compared as a string; missing is empty
    pub(crate) fn text_form(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Num(n) => n.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => b.to_string(),
        }
    }

    pub(crate) fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

pub(crate) fn column_cells(df: &DataFrame, name: &str) -> Result<Vec<Cell>> {
    let column = df.column(name).map_err(|_| Error::column(name))?;
    let series = column.as_materialized_series();
    (0..series.len())
        .map(|i| Ok(Cell::from_any(&series.get(i)?)))
        .collect()
}

/// Lower-cased text form of every cell of a column
pub(crate) fn lowercase_text(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(column_cells(df, name)?
        .iter()
        .map(|cell| cell.text_form().to_lowercase())
        .collect())
}

/// Coerce a column to numbers; cells that do not convert become missing
pub(crate) fn numeric_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df.column(name).map_err(|_| Error::column(name))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series.f64()?.clone())
}

/// Numeric values of a column with NaN treated as missing
pub(crate) fn numeric_values(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let values: Float64Chunked = numeric_column(df, name)?
        .into_iter()
        .map(|v| v.filter(|n| !n.is_nan()))
        .collect();
    Ok(values.with_name(name.into()))
}
