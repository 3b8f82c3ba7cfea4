//! sheetq-cli library
//!
//! Provides [`Config`] and the run steps of the `sheetq` binary for
//! programmatic use.

pub mod cli;
mod config;

pub use config::{Config, DebugConfig, EngineSettings, OutputConfig, SheetSetting, SourceConfig};

use std::fs;
use std::io::Read;

use anyhow::{Context, Result};
use serde_json::Value as JsonValue;
use sheetq_core::{records, Engine, FileTableSource, Instruction};

use crate::cli::Cli;

/// Instruction text from the positional argument, `--file`, or stdin
pub fn read_instruction(cli: &Cli) -> Result<String> {
    if let Some(text) = &cli.instruction {
        return Ok(text.clone());
    }
    if let Some(path) = &cli.instruction_file {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read instruction file {}", path.display()));
    }
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .context("Failed to read instruction from stdin")?;
    Ok(text)
}

/// Build the instruction for `text` and apply the configured source
///
/// Source precedence: command line, then the instruction itself, then the
/// configuration file and environment.
#[must_use]
pub fn prepare_instruction(config: &Config, cli: &Cli, text: &str) -> Instruction {
    let mut instruction = Instruction::from_json_str(text);

    if let Some(source) = &cli.source {
        instruction.source = Some(source.clone());
    } else if instruction.source.is_none() {
        instruction.source.clone_from(&config.source.path);
    }

    if cli.sheet.is_some() || instruction.sheet.is_none() {
        if let Some(sheet) = &config.source.sheet {
            instruction.sheet = Some(sheet.to_selector());
        }
    }
    if cli.header_row.is_some() || instruction.header_row.is_none() {
        if let Some(row) = config.source.header_row {
            instruction.header_row = Some(row);
        }
    }
    instruction
}

/// Run one instruction and wrap the result table in the JSON envelope
#[must_use]
pub fn execute(config: &Config, instruction: &Instruction) -> JsonValue {
    let engine = Engine::new(config.engine_config());
    let result = engine.execute(&FileTableSource, instruction);
    log::info!("Result has {} rows", result.height());
    records::to_envelope(&result)
}

/// Serialize the envelope for stdout
pub fn render(envelope: &JsonValue, pretty: bool) -> Result<String> {
    let text = if pretty {
        serde_json::to_string_pretty(envelope)
    } else {
        serde_json::to_string(envelope)
    };
    text.context("Failed to serialize result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::parse_args_from;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sheetq_core::SheetSelector;
    use std::io::Write;

    fn csv_source() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"Name,Fare,Survived\nAnn,71.28,1\nBob,7.25,0\nCid,53.1,1\n")
            .unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_source_precedence() {
        let mut config = Config::default();
        config.source.path = Some("config.xlsx".to_string());

        let cli = parse_args_from(["sheetq"]).unwrap();
        let instruction = prepare_instruction(&config, &cli, r#"{"arquivo_excel": "own.xlsx"}"#);
        assert_eq!(instruction.source.as_deref(), Some("own.xlsx"));

        let instruction = prepare_instruction(&config, &cli, "{}");
        assert_eq!(instruction.source.as_deref(), Some("config.xlsx"));

        let cli = parse_args_from(["sheetq", "-s", "flag.xlsx"]).unwrap();
        let instruction = prepare_instruction(&config, &cli, r#"{"source": "own.xlsx"}"#);
        assert_eq!(instruction.source.as_deref(), Some("flag.xlsx"));
    }

    #[test]
    fn test_sheet_precedence() {
        let mut config = Config::default();
        config.source.sheet = Some(SheetSetting::Index(2));
        let cli = parse_args_from(["sheetq"]).unwrap();

        let instruction = prepare_instruction(&config, &cli, r#"{"aba": "Resumo"}"#);
        assert_eq!(instruction.sheet, Some(SheetSelector::Name("Resumo".to_string())));

        let instruction = prepare_instruction(&config, &cli, "{}");
        assert_eq!(instruction.sheet, Some(SheetSelector::Index(2)));
    }

    #[test]
    fn test_execute_csv() {
        let file = csv_source();
        let mut config = Config::default();
        let cli = parse_args_from(["sheetq", "-s", file.path().to_str().unwrap()]).unwrap();
        config.apply_cli(&cli);

        let instruction = prepare_instruction(
            &config,
            &cli,
            r#"{"filters": [{"column": "fare", "value": "maior que 50"}], "operation": "count"}"#,
        );
        assert_eq!(execute(&config, &instruction), json!({"result": [{"count": 2}]}));
    }

    #[test]
    fn test_missing_source_gives_empty_result() {
        let config = Config::default();
        let cli = parse_args_from(["sheetq", "-s", "/nonexistent/book.xlsx"]).unwrap();
        let instruction = prepare_instruction(&config, &cli, r#"{"operation": "count"}"#);
        assert_eq!(execute(&config, &instruction), json!({"result": []}));
    }

    #[test]
    fn test_render() {
        let envelope = json!({"result": [{"count": 2}]});
        assert_eq!(
            render(&envelope, false).unwrap(),
            r#"{"result":[{"count":2}]}"#
        );
        assert!(render(&envelope, true).unwrap().contains('\n'));
    }

    #[test]
    fn test_read_instruction_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"operation": "list"}"#).unwrap();
        let cli = parse_args_from(["sheetq", "-f", file.path().to_str().unwrap()]).unwrap();
        assert_eq!(read_instruction(&cli).unwrap(), r#"{"operation": "list"}"#);

        let cli = parse_args_from(["sheetq", "-f", "/nonexistent/q.json"]).unwrap();
        assert!(read_instruction(&cli).is_err());
    }
}
