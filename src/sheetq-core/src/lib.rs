//! sheetq-core: semantic queries over spreadsheet tables
//!
//! An [`Instruction`] is a loosely structured request, usually written by a
//! person or an automated agent: which columns to filter on (by name,
//! fragment or synonym), which conditions to apply (`">= 50"`,
//! `"maior que 10"`, `"Age > 30 and Sex == 'male'"`), and which operation
//! to compute. The [`Engine`] runs it against a polars [`DataFrame`] in
//! three stages:
//!
//! 1. **Column resolution** ([`resolver`]) maps references to real columns
//!    through the two-layer [`SynonymMap`], exact and partial matches.
//! 2. **Filter construction** ([`filter`]) turns each filter and special
//!    condition into a predicate and ANDs them into a [`RowMask`].
//! 3. **Operation dispatch** ([`ops`]) computes count, percent, numeric
//!    reductions, describe, top, list, correlation or compare-mean over the
//!    filtered rows.
//!
//! The engine never returns an error. Unresolvable columns and malformed
//! conditions are skipped with a warning; a failing operation yields an
//! empty table.
//!
//! # Quick Start
//!
//! ```rust
//! use polars::prelude::*;
//! use sheetq_core::{Engine, Instruction};
//!
//! let df = df! {
//!     "Fare" => [7.25, 71.28, 53.1, 8.05],
//!     "Survived" => [0, 1, 1, 0],
//! }?;
//!
//! let instruction = Instruction::parse(
//!     r#"{"filters": [{"column": "fare", "value": ">= 50"}], "operation": "count"}"#,
//! )?;
//! let result = Engine::default().run(&df, &instruction);
//! assert_eq!(result.column("count")?.u64()?.get(0), Some(2));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Loading from a file and serializing the result:
//!
//! ```rust,no_run
//! use sheetq_core::{records, Engine, FileTableSource, Instruction};
//!
//! let instruction = Instruction::from_json_str(
//!     r#"{"source": "titanic.xlsx", "operation": "mean", "operandColumn": "Fare", "groupBy": "Survived"}"#,
//! );
//! let result = Engine::default().execute(&FileTableSource, &instruction);
//! println!("{}", records::to_envelope(&result));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_lines
)]

mod cells;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod instruction;
pub mod ops;
pub mod records;
pub mod resolver;
pub mod source;
pub mod synonyms;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use filter::{build_mask, FilterBuilder, Predicate, RowMask};
pub use instruction::{ColumnRef, FilterSpec, Instruction, SheetSelector};
pub use ops::{dispatch, Operation};
pub use resolver::ColumnResolver;
pub use source::{load_or_empty, FileTableSource, TableSource};
pub use synonyms::SynonymMap;

// Re-export polars for downstream users building tables
pub use polars;

/// Version of the sheetq-core crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
