//! Error types for the sheetq parser

use std::fmt;

/// Errors that can occur while parsing a condition expression
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Input left over after a complete expression was read
    TrailingInput {
        /// The unparsed remainder
        found: String,
        /// Byte offset of the remainder in the input
        position: usize,
    },

    /// Invalid syntax
    InvalidSyntax {
        /// Description of the syntax error
        message: String,
        /// Byte offset in the input
        position: usize,
    },

    /// Call to a helper that is not part of the grammar
    UnknownFunction {
        /// The function name
        name: String,
    },

    /// Expression longer than the configured limit
    TooLong {
        /// Input length in characters
        length: usize,
        /// Accepted maximum
        max: usize,
    },

    /// Brackets nested deeper than the parser accepts
    TooDeep {
        /// Nesting depth found
        depth: usize,
        /// Accepted maximum
        max: usize,
    },

    /// Empty input
    EmptyInput,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TrailingInput { found, position } => {
                write!(f, "Unexpected input '{}' at position {}", found, position)
            }
            ParseError::InvalidSyntax { message, position } => {
                write!(f, "Invalid syntax at position {}: {}", position, message)
            }
            ParseError::UnknownFunction { name } => write!(f, "Unknown function '{}'", name),
            ParseError::TooLong { length, max } => {
                write!(
                    f,
                    "Expression of {} characters exceeds the limit of {}",
                    length, max
                )
            }
            ParseError::TooDeep { depth, max } => {
                write!(f, "Nesting depth {} exceeds the limit of {}", depth, max)
            }
            ParseError::EmptyInput => write!(f, "Empty input"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;

impl ParseError {
    /// Build an error from a nom failure, locating it relative to `input`
    pub(crate) fn from_nom(input: &str, err: nom::Err<nom::error::Error<&str>>) -> Self {
        match err {
            nom::Err::Error(e) | nom::Err::Failure(e) => ParseError::InvalidSyntax {
                message: format!("Parse error: {}", e.code.description()),
                position: input.len().saturating_sub(e.input.len()),
            },
            nom::Err::Incomplete(_) => ParseError::InvalidSyntax {
                message: "Incomplete input".to_string(),
                position: input.len(),
            },
        }
    }
}
