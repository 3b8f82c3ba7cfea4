//! Table sources
//!
//! Loads the table an instruction runs against. Workbooks (`.xlsx`, `.xlsm`,
//! `.xlsb`, `.xls`, `.ods`) are read with calamine; delimited text and JSON go
//! through the polars readers. After loading, header names are trimmed and
//! blank or repeated names become `column_<n>` (1-based position).

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use polars::prelude::*;

use crate::error::{Error, Result};
use crate::instruction::SheetSelector;

/// Anything that can produce a table from a source reference
pub trait TableSource {
    /// Load `source`, choosing a sheet when the source has several and
    /// reading the header from the zero-based `header_row`
    fn load_table(
        &self,
        source: &str,
        sheet: Option<&SheetSelector>,
        header_row: usize,
    ) -> Result<DataFrame>;
}

/// Supported on-disk formats, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Spreadsheet workbook
    Workbook,
    /// Comma-separated values
    Csv,
    /// Tab-separated values
    Tsv,
    /// JSON array of records
    Json,
    /// Newline-delimited JSON records
    JsonLines,
}

impl SourceFormat {
    /// Detect the format of `path` from its extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            "csv" => Ok(SourceFormat::Csv),
            "tsv" => Ok(SourceFormat::Tsv),
            "json" => Ok(SourceFormat::Json),
            "ndjson" | "jsonl" => Ok(SourceFormat::JsonLines),
            "" => Err(Error::source_error(format!(
                "Cannot detect the format of '{}'",
                path.display()
            ))),
            other => Err(Error::source_error(format!(
                "Unsupported source format: {other}"
            ))),
        }
    }
}

/// Reads tables from local files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTableSource;

impl TableSource for FileTableSource {
    fn load_table(
        &self,
        source: &str,
        sheet: Option<&SheetSelector>,
        header_row: usize,
    ) -> Result<DataFrame> {
        let path = Path::new(source);
        let format = SourceFormat::from_path(path)?;
        log::debug!("Loading {format:?} source '{source}' (header row {header_row})");
        if sheet.is_some() && format != SourceFormat::Workbook {
            log::debug!("Sheet selector ignored for {format:?} source");
        }

        let mut df = match format {
            SourceFormat::Workbook => read_workbook(path, sheet, header_row)?,
            SourceFormat::Csv => read_delimited(path, b',', header_row)?,
            SourceFormat::Tsv => read_delimited(path, b'\t', header_row)?,
            SourceFormat::Json => read_json(path, polars::io::json::JsonFormat::Json)?,
            SourceFormat::JsonLines => {
                read_json(path, polars::io::json::JsonFormat::JsonLines)?
            }
        };
        normalize_headers(&mut df)?;
        log::debug!("Loaded {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }
}

/// Load a table, turning any failure into an empty table
#[must_use]
pub fn load_or_empty(
    loader: &dyn TableSource,
    source: &str,
    sheet: Option<&SheetSelector>,
    header_row: usize,
) -> DataFrame {
    match loader.load_table(source, sheet, header_row) {
        Ok(df) => df,
        Err(e) => {
            log::warn!("Could not load table from '{source}': {e}");
            DataFrame::empty()
        }
    }
}

fn read_delimited(path: &Path, separator: u8, header_row: usize) -> Result<DataFrame> {
    let mut options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000));
    if separator != b',' {
        let mut parse_options = (*options.parse_options).clone();
        parse_options.separator = separator;
        options.parse_options = std::sync::Arc::new(parse_options);
    }
    if header_row > 0 {
        options = options.with_skip_rows(header_row);
    }
    let reader = options.try_into_reader_with_file_path(Some(path.to_path_buf()))?;
    Ok(reader.finish()?)
}

fn read_json(path: &Path, format: polars::io::json::JsonFormat) -> Result<DataFrame> {
    let file = File::open(path)?;
    Ok(polars::io::json::JsonReader::new(file)
        .with_json_format(format)
        .finish()?)
}

fn read_workbook(
    path: &Path,
    sheet: Option<&SheetSelector>,
    header_row: usize,
) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let name = match sheet {
        None => names.first().cloned(),
        Some(SheetSelector::Index(i)) => names.get(*i).cloned(),
        Some(SheetSelector::Name(wanted)) => names
            .iter()
            .find(|n| *n == wanted)
            .or_else(|| names.iter().find(|n| n.trim().eq_ignore_ascii_case(wanted.trim())))
            .cloned(),
    }
    .ok_or_else(|| {
        Error::source_error(format!(
            "Sheet {sheet:?} not found in '{}' (sheets: {names:?})",
            path.display()
        ))
    })?;

    let range = workbook.worksheet_range(&name)?;
    range_to_frame(&range, header_row)
}

/// Build a table from a worksheet range; `header_row` counts from the top
/// of the sheet, not from the first used row
pub(crate) fn range_to_frame(range: &Range<Data>, header_row: usize) -> Result<DataFrame> {
    let first_used = range.start().map_or(0, |(row, _)| row as usize);
    let mut rows = range.rows().skip(header_row.saturating_sub(first_used));
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let body: Vec<&[Data]> = rows.collect();

    let names = header_names(header.iter().map(ToString::to_string));
    let empty = Data::Empty;
    let columns = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<&Data> = body.iter().map(|row| row.get(i).unwrap_or(&empty)).collect();
            typed_column(name, &cells)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn is_blank(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_))
}

fn as_integer(cell: &Data) -> Option<i64> {
    match cell {
        Data::Int(i) => Some(*i),
        #[allow(clippy::cast_possible_truncation)]
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Some(*f as i64),
        _ => None,
    }
}

fn as_float(cell: &Data) -> Option<f64> {
    match cell {
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::DateTime(dt) => Some(dt.as_f64()),
        _ => None,
    }
}

/// Type a column from its non-blank cells: Int64, Float64, Boolean, else String
fn typed_column(name: &str, cells: &[&Data]) -> Column {
    if cells.iter().all(|c| is_blank(c)) {
        return Column::full_null(name.into(), cells.len(), &DataType::Float64);
    }

    if cells.iter().all(|c| is_blank(c) || as_integer(c).is_some()) {
        let values: Vec<Option<i64>> = cells.iter().map(|c| as_integer(c)).collect();
        Column::new(name.into(), values)
    } else if cells.iter().all(|c| is_blank(c) || as_float(c).is_some()) {
        let values: Vec<Option<f64>> = cells.iter().map(|c| as_float(c)).collect();
        Column::new(name.into(), values)
    } else if cells.iter().all(|c| is_blank(c) || matches!(c, Data::Bool(_))) {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|c| match c {
                Data::Bool(b) => Some(*b),
                _ => None,
            })
            .collect();
        Column::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| (!is_blank(c)).then(|| c.to_string()))
            .collect();
        Column::new(name.into(), values)
    }
}

/// Trim header names; blank or repeated names become `column_<n>`
pub fn normalize_headers(df: &mut DataFrame) -> Result<()> {
    let names = header_names(df.get_column_names().into_iter().map(|n| n.to_string()));
    df.set_column_names(names)?;
    Ok(())
}

fn header_names(raw: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for (i, raw) in raw.enumerate() {
        let trimmed = raw.trim();
        let name = if trimmed.is_empty() || names.iter().any(|n| n == trimmed) {
            format!("column_{}", i + 1)
        } else {
            trimmed.to_string()
        };
        names.push(name);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn load(path: &Path, header_row: usize) -> Result<DataFrame> {
        FileTableSource.load_table(path.to_str().unwrap(), None, header_row)
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            SourceFormat::from_path(Path::new("dados.XLSX")).unwrap(),
            SourceFormat::Workbook
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("a.jsonl")).unwrap(),
            SourceFormat::JsonLines
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("a.parquet")),
            Err(Error::Source(_))
        ));
        assert!(SourceFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_csv_with_header_row() {
        let file = write_temp(".csv", "report title\n Name , Age\nAnn,30\nBob,41\n");
        let df = load(file.path(), 1).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["Name", "Age"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_tsv() {
        let file = write_temp(".tsv", "Name\tFare\nAnn\t7.25\n");
        let df = load(file.path(), 0).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["Name", "Fare"]);
        assert_eq!(df.column("Fare").unwrap().f64().unwrap().get(0), Some(7.25));
    }

    #[test]
    fn test_json_and_ndjson() {
        let file = write_temp(".json", r#"[{"Name": "Ann", "Age": 30}, {"Name": "Bob", "Age": 41}]"#);
        assert_eq!(load(file.path(), 0).unwrap().shape(), (2, 2));

        let file = write_temp(".ndjson", "{\"Name\": \"Ann\"}\n{\"Name\": \"Bob\"}\n");
        assert_eq!(load(file.path(), 0).unwrap().shape(), (2, 1));
    }

    #[test]
    fn test_load_or_empty() {
        let df = load_or_empty(&FileTableSource, "/nonexistent/table.csv", None, 0);
        assert_eq!(df.shape(), (0, 0));
        let df = load_or_empty(&FileTableSource, "table.parquet", None, 0);
        assert_eq!(df.shape(), (0, 0));
    }

    #[test]
    fn test_normalize_headers() {
        let mut df = df! {
            " Age " => [1],
            "  " => [2],
            "Age" => [3],
        }
        .unwrap();
        normalize_headers(&mut df).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["Age", "column_2", "column_3"]);
    }

    fn sheet() -> Range<Data> {
        let mut range = Range::new((0, 0), (4, 3));
        range.set_value((0, 0), Data::String("Passenger list".into()));
        for (c, title) in ["Name", "Age", "Fare", "Survived"].iter().enumerate() {
            range.set_value((1, c as u32), Data::String((*title).into()));
        }
        range.set_value((2, 0), Data::String("Ann".into()));
        range.set_value((2, 1), Data::Float(30.0));
        range.set_value((2, 2), Data::Float(7.25));
        range.set_value((2, 3), Data::Bool(true));
        range.set_value((3, 0), Data::String("Bob".into()));
        range.set_value((3, 2), Data::Int(8));
        range.set_value((3, 3), Data::Bool(false));
        range.set_value((4, 0), Data::Int(42));
        range.set_value((4, 1), Data::Float(41.0));
        range.set_value((4, 2), Data::Error(calamine::CellErrorType::Div0));
        range
    }

    #[test]
    fn test_range_types() {
        let df = range_to_frame(&sheet(), 1).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["Name", "Age", "Fare", "Survived"]);
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("Name").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("Name").unwrap().get(2).unwrap(), AnyValue::String("42"));
        assert_eq!(df.column("Age").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("Age").unwrap().null_count(), 1);
        assert_eq!(df.column("Fare").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("Fare").unwrap().null_count(), 1);
        assert_eq!(df.column("Survived").unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_range_blank_headers() {
        let mut range = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("A".into()));
        range.set_value((1, 0), Data::Int(1));
        range.set_value((1, 1), Data::Int(2));
        range.set_value((1, 2), Data::Int(3));
        let df = range_to_frame(&range, 0).unwrap();
        assert_eq!(df.get_column_names_str(), vec!["A", "column_2", "column_3"]);
    }

    #[test]
    fn test_range_header_past_end() {
        assert_eq!(range_to_frame(&sheet(), 10).unwrap().shape(), (0, 0));
    }
}
