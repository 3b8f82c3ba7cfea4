//! Expression parsing
//!
//! Primary expressions: parenthesized groups, literals, helper calls and
//! column references, plus the value lists used by `in`.

use nom::{
    branch::alt,
    character::complete::char,
    combinator::map,
    multi::separated_list0,
    sequence::{delimited, preceded, terminated},
    IResult, Parser,
};

use crate::ast::Expr;

use super::identifiers::{parse_column_ref, parse_identifier};
use super::literals::parse_literal;
use super::operators::{parse_additive_expr, parse_or_expr};
use super::utils::ws;

/// Parse an expression (main expression parser with precedence)
#[inline]
pub(crate) fn parse_expr(input: &str) -> IResult<&str, Expr> {
    parse_or_expr(input)
}

/// Parse primary expressions, skipping leading whitespace
#[inline]
pub(crate) fn parse_postfix_expr(input: &str) -> IResult<&str, Expr> {
    preceded(
        ws,
        alt((
            parse_paren_expr,
            parse_literal,
            parse_function_call,
            parse_column_ref,
        )),
    )
    .parse(input)
}

/// Parse parenthesized expressions
fn parse_paren_expr(input: &str) -> IResult<&str, Expr> {
    delimited(char('('), parse_expr, preceded(ws, char(')'))).parse(input)
}

/// Parse helper calls (`abs(Fare)`); names are validated after parsing
fn parse_function_call(input: &str) -> IResult<&str, Expr> {
    map(
        (
            parse_identifier,
            delimited(ws, char('('), ws),
            separated_list0(delimited(ws, char(','), ws), parse_expr),
            preceded(ws, char(')')),
        ),
        |(name, _, args, _)| Expr::FunctionCall {
            name: name.to_lowercase(),
            args,
        },
    )
    .parse(input)
}

/// Parse a value list for `in`: `(a, b)` or `[a, b]`
pub(crate) fn parse_list(input: &str) -> IResult<&str, Vec<Expr>> {
    let items = || {
        terminated(
            separated_list0(delimited(ws, char(','), ws), parse_additive_expr),
            (ws, opt_trailing_comma, ws),
        )
    };
    alt((
        delimited(char('('), items(), char(')')),
        delimited(char('['), items(), char(']')),
    ))
    .parse(input)
}

fn opt_trailing_comma(input: &str) -> IResult<&str, Option<char>> {
    nom::combinator::opt(char(',')).parse(input)
}
