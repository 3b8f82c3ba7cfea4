//! Descriptive statistics and correlation

use polars::prelude::*;

use crate::cells::numeric_values;
use crate::error::Result;

/// Round half away from zero to `digits` decimals
#[must_use]
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// One row: `count`, `mean`, `std`, `min`, `25%`, `50%`, `75%`, `max`
pub fn describe(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let values = numeric_values(df, column)?;
    let count = (values.len() - values.null_count()) as u64;
    let quartile = |q: f64| values.quantile(q, QuantileMethod::Linear);

    Ok(DataFrame::new(vec![
        Column::new("count".into(), [count]),
        Column::new("mean".into(), [values.mean()]),
        Column::new("std".into(), [values.std(1).filter(|_| count > 1)]),
        Column::new("min".into(), [values.min()]),
        Column::new("25%".into(), [quartile(0.25)?]),
        Column::new("50%".into(), [quartile(0.5)?]),
        Column::new("75%".into(), [quartile(0.75)?]),
        Column::new("max".into(), [values.max()]),
    ])?)
}

/// One row: `correlation` (4 decimals, null when undefined) and
/// `columns` (`"a vs b"`), over rows where both values are present
pub fn correlation(df: &DataFrame, first: &str, second: &str) -> Result<DataFrame> {
    let pairs = DataFrame::new(vec![
        numeric_values(df, first)?.with_name("x".into()).into_series().into(),
        numeric_values(df, second)?.with_name("y".into()).into_series().into(),
    ])?
    .drop_nulls::<String>(None)?;

    let coefficient = pairs
        .lazy()
        .select([pearson_corr(col("x"), col("y")).alias("r")])
        .collect()?
        .column("r")?
        .f64()?
        .get(0)
        .filter(|r| r.is_finite())
        .map(|r| round_to(r, 4));
    if coefficient.is_none() {
        log::debug!("Correlation of '{first}' and '{second}' is undefined");
    }

    Ok(DataFrame::new(vec![
        Column::new("correlation".into(), [coefficient]),
        Column::new("columns".into(), [format!("{first} vs {second}")]),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn value(df: &DataFrame, name: &str) -> Option<f64> {
        df.column(name).unwrap().f64().unwrap().get(0)
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666_666, 2), 66.67);
        assert_eq!(round_to(0.123_46, 4), 0.1235);
        assert_eq!(round_to(-0.5, 0), -1.0);
    }

    #[test]
    fn test_describe() {
        let df = df! { "Age" => [Some(4.0), None, Some(1.0), Some(3.0), Some(2.0)] }.unwrap();
        let result = describe(&df, "Age").unwrap();
        assert_eq!(
            result.get_column_names_str(),
            vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]
        );
        assert_eq!(
            result.column("count").unwrap().u64().unwrap().get(0),
            Some(4)
        );
        assert_eq!(value(&result, "mean"), Some(2.5));
        assert_eq!(value(&result, "min"), Some(1.0));
        assert_eq!(value(&result, "25%"), Some(1.75));
        assert_eq!(value(&result, "75%"), Some(3.25));
        assert_eq!(value(&result, "max"), Some(4.0));
        let std = value(&result, "std").unwrap();
        assert!((std - 1.290_994).abs() < 1e-6);
    }

    #[test]
    fn test_describe_single_value_has_no_std() {
        let df = df! { "v" => [7.0] }.unwrap();
        let result = describe(&df, "v").unwrap();
        assert_eq!(value(&result, "std"), None);
        assert_eq!(value(&result, "50%"), Some(7.0));
    }

    #[test]
    fn test_correlation_pairwise_complete() {
        let df = df! {
            "x" => [Some(1.0), Some(2.0), None, Some(3.0)],
            "y" => [Some(2.0), Some(4.0), Some(100.0), Some(6.0)],
        }
        .unwrap();
        let result = correlation(&df, "x", "y").unwrap();
        assert_eq!(value(&result, "correlation"), Some(1.0));
        assert_eq!(
            result.column("columns").unwrap().get(0).unwrap(),
            AnyValue::String("x vs y")
        );
    }

    #[test]
    fn test_correlation_undefined_is_null() {
        let df = df! { "x" => [1.0, 2.0], "y" => [3.0, 3.0] }.unwrap();
        let result = correlation(&df, "x", "y").unwrap();
        assert_eq!(result.height(), 1);
        assert_eq!(value(&result, "correlation"), None);

        let df = df! { "x" => [Some(1.0), None], "y" => [Some(2.0), Some(5.0)] }.unwrap();
        let result = correlation(&df, "x", "y").unwrap();
        assert_eq!(value(&result, "correlation"), None);
    }

    #[test]
    fn test_correlation_negative_and_self() {
        let df = df! {
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [8.0, 6.0, 4.0, 2.0],
        }
        .unwrap();
        let result = correlation(&df, "x", "y").unwrap();
        assert_eq!(value(&result, "correlation"), Some(-1.0));

        let result = correlation(&df, "x", "x").unwrap();
        assert_eq!(value(&result, "correlation"), Some(1.0));
        assert_eq!(
            result.column("columns").unwrap().get(0).unwrap(),
            AnyValue::String("x vs x")
        );
    }
}
