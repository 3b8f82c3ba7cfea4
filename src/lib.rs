//! sheetq: semantic queries over spreadsheet tables
//!
//! Facade over the workspace crates. [`sheetq_core`] holds the engine (column
//! resolution, filters, operations, table loading); [`sheetq_parser`] holds the
//! condition and expression grammar.
//!
//! ```rust
//! use sheetq::polars::prelude::*;
//! use sheetq::{Engine, Instruction};
//!
//! let df = df! { "Age" => [22.0, 38.0, 26.0, 35.0] }?;
//! let instruction = Instruction::from_json_str(
//!     r#"{"columnMappingOverride": {"idade": "Age"},
//!         "filters": [{"column": "idade", "value": "maior que 30"}],
//!         "operation": "count"}"#,
//! );
//! let result = Engine::default().run(&df, &instruction);
//! assert_eq!(result.column("count")?.u64()?.get(0), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use sheetq_core;
pub use sheetq_parser;

pub use sheetq_core::{
    polars, records, Engine, EngineConfig, Error, FileTableSource, Instruction, Operation,
    Result, SynonymMap, TableSource, VERSION,
};
