//! sheetq-parser: condition parsing for sheetq instructions
//!
//! Two kinds of text show up as filter values in a sheetq instruction:
//!
//! - **Simple conditions** recognized by pattern: `">= 5"`, `"maior que 10"`,
//!   `"at least 3"`, `"Age > 30"` or plain search words. See [`condition`].
//! - **Free-form boolean expressions** such as
//!   `` Pclass == 1 and (Fare > 50 or `Home Port` == 'S') ``, parsed with nom
//!   into a closed [`Expr`] tree. Nothing in the grammar can reach outside
//!   the table: no assignment, no attribute access, only the helpers listed
//!   in [`FUNCTIONS`].
//!
//! # Quick Start
//!
//! ```rust
//! use sheetq_parser::{ExpressionParser, Expr};
//!
//! let parser = ExpressionParser::new();
//! let expr: Expr = parser.parse("Survived == 1 and Fare >= 50")?;
//! assert_eq!(expr.referenced_columns(), vec!["Survived", "Fare"]);
//! # Ok::<(), sheetq_parser::ParseError>(())
//! ```
//!
//! ```rust
//! use sheetq_parser::{parse_numeric_condition, CompareOp};
//!
//! let cond = parse_numeric_condition("menor que 18").unwrap();
//! assert_eq!(cond.op, CompareOp::Lt);
//! assert!(cond.matches(12.0));
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::similar_names
)]

pub mod ast;
pub mod condition;
pub mod error;
mod parser;

// Re-export main types
pub use ast::*;
pub use condition::{
    looks_like_expression, parse_equality_literal, parse_inline_comparison,
    parse_numeric_condition, parse_operator_literal, parse_search_terms, InlineComparison,
    NumericCondition,
};
pub use error::*;
pub use parser::*;
