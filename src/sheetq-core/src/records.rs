//! Result tables as JSON records

use polars::prelude::*;
use serde_json::{json, Map, Number, Value as JsonValue};

use crate::error::Result;

/// One JSON object per row, keys in column order
pub fn to_records(df: &DataFrame) -> Result<Vec<Map<String, JsonValue>>> {
    let columns: Vec<(String, &Series)> = df
        .get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.as_materialized_series()))
        .collect();

    let mut rows = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let mut record = Map::with_capacity(columns.len());
        for (name, series) in &columns {
            record.insert(name.clone(), any_value_to_json(&series.get(row)?));
        }
        rows.push(record);
    }
    Ok(rows)
}

/// `{"result": [...]}`; a table that cannot be converted gives an empty list
#[must_use]
pub fn to_envelope(df: &DataFrame) -> JsonValue {
    let records = to_records(df).unwrap_or_else(|e| {
        log::warn!("Could not serialize result table: {e}");
        Vec::new()
    });
    json!({ "result": records })
}

fn any_value_to_json(value: &AnyValue<'_>) -> JsonValue {
    match value {
        AnyValue::Null => JsonValue::Null,
        AnyValue::Boolean(b) => JsonValue::Bool(*b),
        AnyValue::String(s) => JsonValue::String((*s).to_string()),
        AnyValue::StringOwned(s) => JsonValue::String(s.to_string()),
        AnyValue::Int8(i) => JsonValue::from(*i),
        AnyValue::Int16(i) => JsonValue::from(*i),
        AnyValue::Int32(i) => JsonValue::from(*i),
        AnyValue::Int64(i) => JsonValue::from(*i),
        AnyValue::UInt8(u) => JsonValue::from(*u),
        AnyValue::UInt16(u) => JsonValue::from(*u),
        AnyValue::UInt32(u) => JsonValue::from(*u),
        AnyValue::UInt64(u) => JsonValue::from(*u),
        AnyValue::Float32(f) => float(f64::from(*f)),
        AnyValue::Float64(f) => float(*f),
        other => JsonValue::String(other.to_string()),
    }
}

fn float(value: f64) -> JsonValue {
    Number::from_f64(value).map_or(JsonValue::Null, JsonValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_records_keep_column_order() {
        let df = df! {
            "Name" => [Some("Ann"), None],
            "Age" => [Some(30i64), Some(41)],
            "Fare" => [Some(7.25), Some(f64::NAN)],
            "Alive" => [true, false],
        }
        .unwrap();
        let records = to_records(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["Name", "Age", "Fare", "Alive"]
        );
        assert_eq!(
            JsonValue::Object(records[1].clone()),
            json!({"Name": null, "Age": 41, "Fare": null, "Alive": false})
        );
    }

    #[test]
    fn test_envelope() {
        let df = df! { "count" => [3u32] }.unwrap();
        assert_eq!(to_envelope(&df), json!({"result": [{"count": 3}]}));
        assert_eq!(to_envelope(&DataFrame::empty()), json!({"result": []}));
    }
}
