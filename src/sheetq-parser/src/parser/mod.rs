//! Parser implementation for sheetq condition expressions
//!
//! This module contains the parser that converts free-form condition strings
//! into AST representations using nom parser combinators.

use crate::ast::{Expr, FUNCTIONS};
use crate::error::{ParseError, Result};

mod expressions;
mod identifiers;
mod literals;
mod operators;
mod utils;

use expressions::parse_expr;

/// Default maximum accepted expression length, in characters
pub const DEFAULT_MAX_LENGTH: usize = 4096;

/// Deepest bracket nesting accepted before parsing is attempted
pub const MAX_NESTING: usize = 64;

/// Parser for free-form boolean conditions
#[derive(Debug, Clone)]
pub struct ExpressionParser {
    max_length: usize,
}

impl ExpressionParser {
    /// Create a new parser instance
    pub fn new() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    /// Create a parser that rejects inputs longer than `max_length` characters
    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    /// Parse a condition string into an AST
    pub fn parse(&self, input: &str) -> Result<Expr> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let length = input.chars().count();
        if length > self.max_length {
            return Err(ParseError::TooLong {
                length,
                max: self.max_length,
            });
        }

        let depth = nesting_depth(input);
        if depth > MAX_NESTING {
            return Err(ParseError::TooDeep {
                depth,
                max: MAX_NESTING,
            });
        }

        let (rest, expr) = parse_expr(input).map_err(|e| ParseError::from_nom(input, e))?;
        let rest = rest.trim_start();
        if !rest.is_empty() {
            return Err(ParseError::TrailingInput {
                found: rest.to_string(),
                position: input.len() - rest.len(),
            });
        }

        validate_functions(&expr)?;
        Ok(expr)
    }
}

impl Default for ExpressionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Maximum bracket depth outside quoted text
fn nesting_depth(input: &str) -> usize {
    let mut depth = 0usize;
    let mut max = 0usize;
    let mut quote: Option<char> = None;
    for c in input.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, '(' | '[') => {
                depth += 1;
                max = max.max(depth);
            }
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max
}

fn validate_functions(expr: &Expr) -> Result<()> {
    match expr {
        Expr::FunctionCall { name, args } => {
            if !FUNCTIONS.contains(&name.as_str()) {
                return Err(ParseError::UnknownFunction { name: name.clone() });
            }
            args.iter().try_for_each(validate_functions)
        }
        Expr::BinaryOp { left, right, .. } => {
            validate_functions(left)?;
            validate_functions(right)
        }
        Expr::UnaryOp { expr, .. } => validate_functions(expr),
        Expr::InList { expr, items, .. } => {
            validate_functions(expr)?;
            items.iter().try_for_each(validate_functions)
        }
        Expr::Literal(_) | Expr::Column(_) => Ok(()),
    }
}
