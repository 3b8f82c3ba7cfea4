//! Literal value parsing
//!
//! Strings (single or double quoted), numbers, booleans and null. Python-style
//! spellings (`True`, `None`) are accepted because callers often write
//! conditions in that dialect.

use nom::{
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, digit0, digit1},
    combinator::{map, map_res, opt, recognize},
    error::ErrorKind,
    sequence::delimited,
    IResult, Parser,
};

use crate::ast::{Expr, Literal};

use super::utils::keyword;

/// Parse literals
pub(crate) fn parse_literal(input: &str) -> IResult<&str, Expr> {
    alt((
        parse_string_literal,
        parse_number_literal,
        parse_boolean_literal,
        parse_null_literal,
    ))
    .parse(input)
}

/// Parse double-quoted string content with escapes
fn parse_string_content(input: &str) -> IResult<&str, String> {
    let mut result = String::new();
    let mut chars = input.char_indices();
    while let Some((i, ch)) = chars.next() {
        if ch == '"' {
            return Ok((&input[i..], result));
        } else if ch == '\\' {
            if let Some((_, esc_ch)) = chars.next() {
                let ch = match esc_ch {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    _ => esc_ch,
                };
                result.push(ch);
            } else {
                return Err(nom::Err::Error(nom::error::Error::new(
                    &input[i..],
                    ErrorKind::Eof,
                )));
            }
        } else {
            result.push(ch);
        }
    }
    Err(nom::Err::Error(nom::error::Error::new("", ErrorKind::Eof)))
}

/// Parse string literals
pub(crate) fn parse_string_literal(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            delimited(char('"'), parse_string_content, char('"')),
            |s: String| Expr::Literal(Literal::String(s)),
        ),
        // Single-quoted strings (no escapes)
        map(
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            |s: &str| Expr::Literal(Literal::String(s.to_string())),
        ),
    ))
    .parse(input)
}

/// Parse unsigned number literals; negation is handled by the unary parser
pub(crate) fn parse_number_literal(input: &str) -> IResult<&str, Expr> {
    map_res(
        recognize((
            alt((
                recognize((digit1, opt((char('.'), digit0)))),
                recognize((char('.'), digit1)),
            )),
            opt((
                alt((char('e'), char('E'))),
                opt(alt((char('+'), char('-')))),
                digit1,
            )),
        )),
        |s: &str| {
            s.parse::<f64>()
                .map(|n| Expr::Literal(Literal::Number(n)))
                .map_err(|e| format!("Invalid number {s}: {e}"))
        },
    )
    .parse(input)
}

/// Parse boolean literals
fn parse_boolean_literal(input: &str) -> IResult<&str, Expr> {
    alt((
        map(keyword("true"), |_| Expr::Literal(Literal::Bool(true))),
        map(keyword("false"), |_| Expr::Literal(Literal::Bool(false))),
    ))
    .parse(input)
}

/// Parse null literal
fn parse_null_literal(input: &str) -> IResult<&str, Expr> {
    map(alt((keyword("null"), keyword("none"))), |_| {
        Expr::Literal(Literal::Null)
    })
    .parse(input)
}
