//! Command-line interface for sheetq
//!
//! Argument parsing with clap derive. The parsed [`Cli`] is layered on top of
//! the file and environment configuration by [`crate::Config::apply_cli`].

use std::path::PathBuf;

use clap::Parser;

/// sheetq - semantic queries over spreadsheet tables
///
/// Runs one instruction (a JSON object naming filters, conditions and an
/// operation) against a workbook, CSV or JSON table and prints the result
/// as `{"result": [...]}`.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sheetq")]
#[command(author, version, about)]
#[command(after_help = "EXAMPLES:\n  \
    # Count passengers paying at least 50\n  \
    sheetq -s titanic.xlsx '{\"filters\": [{\"column\": \"Fare\", \"value\": \">= 50\"}], \"operation\": \"count\"}'\n\n  \
    # Mean fare per survival status, instruction read from a file\n  \
    sheetq -s titanic.csv -f mean_fare.json\n\n  \
    # Instruction on stdin, second sheet, header on the third row\n  \
    echo '{\"operation\": \"describe\", \"operandColumn\": \"Age\"}' | sheetq -s book.xlsx --sheet 1 --header-row 2")]
pub struct Cli {
    /// Instruction JSON text (read from --file or stdin when absent)
    #[arg(value_name = "INSTRUCTION")]
    pub instruction: Option<String>,

    /// Read the instruction JSON from a file
    #[arg(short = 'f', long = "file", value_name = "PATH", conflicts_with = "instruction")]
    pub instruction_file: Option<PathBuf>,

    /// Table source (overrides config and instruction)
    #[arg(short = 's', long, value_name = "PATH")]
    pub source: Option<String>,

    /// Sheet index or name
    #[arg(long, value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Zero-based header row
    #[arg(long, value_name = "N")]
    pub header_row: Option<usize>,

    /// Configuration file
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Compact JSON output
    #[arg(short = 'C', long)]
    pub compact: bool,

    /// Increase log verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse command-line arguments
#[must_use]
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Parse command-line arguments from a vector (for testing)
pub fn parse_args_from<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instruction_argument() {
        let cli = parse_args_from(["sheetq", "-s", "book.xlsx", r#"{"operation":"count"}"#]).unwrap();
        assert_eq!(cli.instruction.as_deref(), Some(r#"{"operation":"count"}"#));
        assert_eq!(cli.source.as_deref(), Some("book.xlsx"));
        assert!(!cli.compact);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_all_options() {
        let cli = parse_args_from([
            "sheetq",
            "--file",
            "q.json",
            "--sheet",
            "Passageiros",
            "--header-row",
            "2",
            "-c",
            "sheetq.toml",
            "-C",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.instruction_file, Some(PathBuf::from("q.json")));
        assert_eq!(cli.sheet.as_deref(), Some("Passageiros"));
        assert_eq!(cli.header_row, Some(2));
        assert_eq!(cli.config, Some(PathBuf::from("sheetq.toml")));
        assert!(cli.compact);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_file_conflicts_with_inline_instruction() {
        assert!(parse_args_from(["sheetq", "-f", "q.json", "{}"]).is_err());
    }

    #[test]
    fn test_header_row_must_be_number() {
        assert!(parse_args_from(["sheetq", "--header-row", "two"]).is_err());
    }
}
