//! Identifier and column reference parsing

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{map, recognize, verify},
    sequence::delimited,
    IResult, Parser,
};

use crate::ast::{is_keyword, Expr};

use super::utils::{is_ident_char, is_ident_start};

/// Parse identifiers
pub(crate) fn parse_identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize((take_while1(is_ident_start), take_while(is_ident_char))),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

/// Parse a column reference: a backtick-quoted name or a bare identifier
/// that is not a keyword
pub(crate) fn parse_column_ref(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            delimited(char('`'), take_while1(|c| c != '`'), char('`')),
            |s: &str| Expr::Column(s.to_string()),
        ),
        map(
            verify(parse_identifier, |name: &String| !is_keyword(name)),
            Expr::Column,
        ),
    ))
    .parse(input)
}
