//! The instruction object
//!
//! Instructions are written by people and by automated agents, so the
//! deserializer is forgiving: every field has a camelCase name plus the
//! snake_case / Portuguese spelling, scalars are accepted where lists are
//! expected (and the other way round), and anything unrecognized is ignored.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

/// A loosely specified column: a name, or a list whose first element is used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Single name, synonym or fragment
    Name(String),
    /// List of candidates; only the first one is considered
    List(Vec<String>),
}

impl ColumnRef {
    /// Build a reference from a JSON value; `null` gives `None`
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Array(items) => Some(ColumnRef::List(
                items.iter().filter(|v| !v.is_null()).map(value_text).collect(),
            )),
            other => Some(ColumnRef::Name(value_text(other))),
        }
    }

    /// The text the resolver works on
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            ColumnRef::Name(name) => Some(name),
            ColumnRef::List(items) => items.first().map(String::as_str),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

/// One predicate: an optional column reference and a value or expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    /// Column the value applies to; absent for self-contained expressions
    pub column: Option<ColumnRef>,
    /// Value text: a comparison, search terms or a boolean expression
    pub value: String,
}

impl FilterSpec {
    /// A filter bound to a column
    pub fn new(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            column: Some(ColumnRef::Name(column.into())),
            value: value.into(),
        }
    }

    /// A column-less filter whose value names its own columns
    pub fn condition(value: impl Into<String>) -> Self {
        Self {
            column: None,
            value: value.into(),
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(fields) => {
                let column = fields
                    .get("column_name")
                    .filter(|v| is_present(v))
                    .or_else(|| fields.get("column"))
                    .and_then(ColumnRef::from_value);
                let value = fields.get("value").map(value_text).unwrap_or_default();
                Self { column, value }
            }
            other => Self::condition(value_text(other)),
        }
    }
}

/// Sheet of a workbook, by position or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    /// Zero-based position
    Index(usize),
    /// Sheet name
    Name(String),
}

impl SheetSelector {
    /// Numbers and numeric strings select by position; other text by name
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        text.parse::<usize>()
            .map_or_else(|_| SheetSelector::Name(text.to_string()), SheetSelector::Index)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(n) => n.as_u64().map(|i| SheetSelector::Index(i as usize)),
            Value::Array(items) => items.first().and_then(Self::from_value),
            other => Some(Self::parse(&value_text(other))),
        }
    }
}

/// A fully normalized instruction
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawInstruction")]
pub struct Instruction {
    /// Per-call synonym overrides (term → column)
    pub column_mapping_override: IndexMap<String, String>,
    /// Column-bound filters, in application order
    pub filters: Vec<FilterSpec>,
    /// Free-form boolean expressions
    pub special_conditions: Vec<String>,
    /// Operation name, if any
    pub operation: Option<String>,
    /// Column reductions and rankings are computed over
    pub operand_column: Option<ColumnRef>,
    /// Grouping columns
    pub group_by: Vec<ColumnRef>,
    /// Projection
    pub columns_to_show: Vec<ColumnRef>,
    /// Column pair for `correlation`
    pub correlation_pair: Vec<ColumnRef>,
    /// Value/group pair for `compare_mean` (also the `correlation` fallback)
    pub comparison_pair: Vec<ColumnRef>,
    /// `asc` / `desc` and their synonyms
    pub ranking_direction: Option<String>,
    /// Row limit for `top`
    pub result_limit: Option<usize>,
    /// Path of the table source
    pub source: Option<String>,
    /// Sheet selector for workbook sources
    pub sheet: Option<SheetSelector>,
    /// Zero-based header row
    pub header_row: Option<usize>,
}

impl Instruction {
    /// Create an empty instruction
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an instruction from JSON text, failing on malformed input
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse an instruction from JSON text. Malformed input degrades to the
    /// empty instruction with a warning.
    #[must_use]
    pub fn from_json_str(text: &str) -> Self {
        match Self::parse(text) {
            Ok(instruction) => instruction,
            Err(e) => {
                log::warn!("Ignoring malformed instruction: {e}");
                Self::default()
            }
        }
    }

    /// Build an instruction from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Column filters followed by the special conditions as column-less filters
    #[must_use]
    pub fn filter_specs(&self) -> Vec<FilterSpec> {
        self.filters
            .iter()
            .cloned()
            .chain(self.special_conditions.iter().map(FilterSpec::condition))
            .collect()
    }

    /// Add a column filter
    #[must_use]
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(FilterSpec::new(column, value));
        self
    }

    /// Add a free-form condition
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.special_conditions.push(condition.into());
        self
    }

    /// Set the operation
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Set the operand column
    #[must_use]
    pub fn with_operand(mut self, column: impl Into<String>) -> Self {
        self.operand_column = Some(ColumnRef::Name(column.into()));
        self
    }

    /// Set the grouping columns
    #[must_use]
    pub fn with_group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(|c| ColumnRef::Name(c.into())).collect();
        self
    }
}

/// Wire shape of an instruction: every field optional and untyped. Each
/// spelling is its own field so an instruction may carry several of them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInstruction {
    #[serde(rename = "columnMappingOverride")]
    column_mapping_override: Option<Value>,
    colunas_mapeamento: Option<Value>,
    column_mapping: Option<Value>,
    filters: Option<Value>,
    data: Option<Value>,
    filter: Option<Value>,
    filtros: Option<Value>,
    #[serde(rename = "specialConditions")]
    special_conditions_camel: Option<Value>,
    special_conditions: Option<Value>,
    operation: Option<Value>,
    #[serde(rename = "operandColumn")]
    operand_column: Option<Value>,
    column_operation: Option<Value>,
    #[serde(rename = "groupBy")]
    group_by_camel: Option<Value>,
    group_by: Option<Value>,
    #[serde(rename = "columnsToShow")]
    columns_to_show_camel: Option<Value>,
    columns_to_show: Option<Value>,
    #[serde(rename = "correlationPair")]
    correlation_pair: Option<Value>,
    correlation: Option<Value>,
    #[serde(rename = "comparisonPair")]
    comparison_pair: Option<Value>,
    comparisons: Option<Value>,
    #[serde(rename = "rankingDirection")]
    ranking_direction: Option<Value>,
    ranking: Option<Value>,
    #[serde(rename = "resultLimit")]
    result_limit: Option<Value>,
    limit: Option<Value>,
    n: Option<Value>,
    source: Option<Value>,
    arquivo_excel: Option<Value>,
    sheet: Option<Value>,
    aba: Option<Value>,
    #[serde(rename = "headerRow")]
    header_row: Option<Value>,
    header_linha: Option<Value>,
}

impl From<RawInstruction> for Instruction {
    fn from(raw: RawInstruction) -> Self {
        let filters = [raw.filters, raw.data, raw.filter, raw.filtros]
            .iter()
            .flatten()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().map(FilterSpec::from_value).collect(),
                Value::Object(_) => vec![FilterSpec::from_value(v)],
                _ => Vec::new(),
            })
            .collect();

        let special_conditions =
            first_set([&raw.special_conditions_camel, &raw.special_conditions])
                .map(|v| one_or_many(v).iter().map(value_text).collect::<Vec<_>>())
                .unwrap_or_default()
                .into_iter()
                .filter(|s| !s.trim().is_empty())
                .collect();

        let column_mapping_override = match first_set([
            &raw.column_mapping_override,
            &raw.colunas_mapeamento,
            &raw.column_mapping,
        ]) {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, v)| is_present(v))
                .map(|(k, v)| (k.clone(), value_text(v)))
                .collect(),
            _ => IndexMap::new(),
        };

        Self {
            column_mapping_override,
            filters,
            special_conditions,
            operation: raw.operation.as_ref().and_then(first_text),
            operand_column: first_set([&raw.operand_column, &raw.column_operation])
                .and_then(ColumnRef::from_value),
            group_by: first_set([&raw.group_by_camel, &raw.group_by])
                .map(column_refs)
                .unwrap_or_default(),
            columns_to_show: first_set([&raw.columns_to_show_camel, &raw.columns_to_show])
                .map(column_refs)
                .unwrap_or_default(),
            correlation_pair: first_set([&raw.correlation_pair, &raw.correlation])
                .map(column_refs)
                .unwrap_or_default(),
            comparison_pair: first_set([&raw.comparison_pair, &raw.comparisons])
                .map(column_refs)
                .unwrap_or_default(),
            ranking_direction: first_set([&raw.ranking_direction, &raw.ranking])
                .and_then(first_text),
            // zero counts as "not given", like a missing limit
            result_limit: [&raw.result_limit, &raw.limit, &raw.n]
                .into_iter()
                .flatten()
                .filter_map(non_negative_integer)
                .find(|n| *n > 0),
            source: first_set([&raw.source, &raw.arquivo_excel]).and_then(first_text),
            sheet: first_set([&raw.sheet, &raw.aba]).and_then(SheetSelector::from_value),
            header_row: first_set([&raw.header_row, &raw.header_linha])
                .and_then(non_negative_integer),
        }
    }
}

/// First spelling that carries something; null, blank text and empty lists
/// fall through to the next one
fn first_set<const N: usize>(candidates: [&Option<Value>; N]) -> Option<&Value> {
    candidates.into_iter().flatten().find(|v| match v {
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        other => is_present(other),
    })
}

/// Render a JSON value as filter text. Lists are joined with a single space.
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(value_text)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => value.to_string(),
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn one_or_many(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Text of a scalar, or of the first element of a list; blank gives `None`
fn first_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Array(items) => items.first().map(value_text)?,
        other => value_text(other),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn column_refs(value: &Value) -> Vec<ColumnRef> {
    one_or_many(value)
        .iter()
        .filter_map(ColumnRef::from_value)
        .collect()
}

fn non_negative_integer(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(|n| n as usize),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        Value::Array(items) => items.first().and_then(non_negative_integer),
        _ => None,
    }
}
