//! Operator expression parsing
//!
//! Precedence, lowest first: `or`, `and`, `not`, comparison / membership,
//! additive, multiplicative, unary minus.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{map, not, opt},
    multi::many0,
    sequence::{preceded, terminated},
    IResult, Parser,
};

use crate::ast::{BinaryOperator, CompareOp, Expr, Literal, UnaryOperator};

use super::expressions::{parse_list, parse_postfix_expr};
use super::utils::{keyword, ws};

/// Parse logical OR expressions (`or`, `||`, `|`)
pub(crate) fn parse_or_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            parse_and_expr,
            many0(preceded(
                (ws, alt((keyword("or"), tag("||"), tag("|"))), ws),
                parse_and_expr,
            )),
        ),
        |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, right| Expr::binary(left, BinaryOperator::Or, right))
        },
    )
    .parse(input)
}

/// Parse logical AND expressions (`and`, `&&`, `&`)
pub(crate) fn parse_and_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            parse_not_expr,
            many0(preceded(
                (ws, alt((keyword("and"), tag("&&"), tag("&"))), ws),
                parse_not_expr,
            )),
        ),
        |(first, rest)| {
            rest.into_iter()
                .fold(first, |left, right| Expr::binary(left, BinaryOperator::And, right))
        },
    )
    .parse(input)
}

/// Parse logical negation (`not`, `~`, `!`)
///
/// A run of prefix operators is read in one pass and folded by parity, so
/// the tree never nests deeper than two negations however long the run is.
fn parse_not_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            many0((
                ws,
                alt((keyword("not"), tag("~"), terminated(tag("!"), not(char('='))))),
                ws,
            )),
            parse_comparison_expr,
        ),
        |(negations, expr)| fold_prefix(negations.len(), UnaryOperator::Not, expr),
    )
    .parse(input)
}

/// Wrap `expr` in `count` applications of `op`, keeping only their parity
fn fold_prefix(count: usize, op: UnaryOperator, expr: Expr) -> Expr {
    let depth = match count {
        0 => 0,
        n if n % 2 == 1 => 1,
        _ => 2,
    };
    (0..depth).fold(expr, |inner, _| Expr::UnaryOp {
        op,
        expr: Box::new(inner),
    })
}

enum ComparisonTail {
    Compare(CompareOp, Expr),
    In(bool, Vec<Expr>),
}

fn parse_compare_symbol(input: &str) -> IResult<&str, CompareOp> {
    map(
        alt((
            tag(">="),
            tag("<="),
            tag("!="),
            tag("=="),
            tag("<>"),
            tag(">"),
            tag("<"),
            tag("="),
        )),
        |symbol: &str| CompareOp::from_symbol(symbol).unwrap_or(CompareOp::Eq),
    )
    .parse(input)
}

/// Parse comparison and membership expressions
fn parse_comparison_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            parse_additive_expr,
            opt(alt((
                map(
                    (ws, parse_compare_symbol, ws, parse_additive_expr),
                    |(_, op, _, right)| ComparisonTail::Compare(op, right),
                ),
                map(
                    (
                        ws,
                        opt(terminated(keyword("not"), ws)),
                        keyword("in"),
                        ws,
                        parse_list,
                    ),
                    |(_, negated, _, _, items)| ComparisonTail::In(negated.is_some(), items),
                ),
            ))),
        ),
        |(left, tail)| match tail {
            None => left,
            Some(ComparisonTail::Compare(op, right)) => {
                Expr::binary(left, BinaryOperator::Compare(op), right)
            }
            Some(ComparisonTail::In(negated, items)) => Expr::InList {
                expr: Box::new(left),
                items,
                negated,
            },
        },
    )
    .parse(input)
}

/// Parse additive expressions (+, -)
pub(crate) fn parse_additive_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            parse_multiplicative_expr,
            many0((
                (ws, alt((char('+'), char('-'))), ws),
                parse_multiplicative_expr,
            )),
        ),
        |(first, rest)| {
            rest.into_iter().fold(first, |left, ((_, op, _), right)| {
                let op = if op == '+' {
                    BinaryOperator::Add
                } else {
                    BinaryOperator::Sub
                };
                Expr::binary(left, op, right)
            })
        },
    )
    .parse(input)
}

/// Parse multiplicative expressions (*, /, %)
fn parse_multiplicative_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            parse_unary_expr,
            many0((
                (ws, alt((char('*'), char('/'), char('%'))), ws),
                parse_unary_expr,
            )),
        ),
        |(first, rest)| {
            rest.into_iter().fold(first, |left, ((_, op, _), right)| {
                let op = match op {
                    '*' => BinaryOperator::Mul,
                    '/' => BinaryOperator::Div,
                    _ => BinaryOperator::Mod,
                };
                Expr::binary(left, op, right)
            })
        },
    )
    .parse(input)
}

/// Parse unary minus; a negated number literal folds into the literal
fn parse_unary_expr(input: &str) -> IResult<&str, Expr> {
    map(
        (
            many0((ws, char('-'), ws)),
            preceded(opt((ws, char('+'))), parse_postfix_expr),
        ),
        |(minuses, expr)| match expr {
            Expr::Literal(Literal::Number(n)) if minuses.len() % 2 == 1 => {
                Expr::Literal(Literal::Number(-n))
            }
            literal @ Expr::Literal(Literal::Number(_)) => literal,
            other => fold_prefix(minuses.len(), UnaryOperator::Neg, other),
        },
    )
    .parse(input)
}
