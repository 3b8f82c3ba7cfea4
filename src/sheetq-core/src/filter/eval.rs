//! Column-wise evaluation of parsed conditions
//!
//! Expressions are evaluated row by row over [`Cell`]s. Literals stay
//! scalar and broadcast against columns. The final value must be boolean
//! per row; missing counts as `false`.

use sheetq_parser::{BinaryOperator, CompareOp, Expr, Literal, UnaryOperator};

use polars::prelude::DataFrame;

use crate::cells::{column_cells, Cell};
use crate::error::{Error, Result};

enum Values {
    Scalar(Cell),
    Column(Vec<Cell>),
}

impl Values {
    fn get(&self, row: usize) -> &Cell {
        match self {
            Values::Scalar(cell) => cell,
            Values::Column(cells) => &cells[row],
        }
    }
}

/// Evaluate `expr` against every row of `df`
pub(crate) fn evaluate_mask(expr: &Expr, df: &DataFrame) -> Result<Vec<bool>> {
    let evaluator = Evaluator {
        df,
        height: df.height(),
    };
    match evaluator.eval(expr)? {
        Values::Scalar(cell) => Ok(vec![as_condition(&cell)?; evaluator.height]),
        Values::Column(cells) => cells.iter().map(as_condition).collect(),
    }
}

fn as_condition(cell: &Cell) -> Result<bool> {
    match cell {
        Cell::Bool(b) => Ok(*b),
        Cell::Null => Ok(false),
        other => Err(Error::operation(format!(
            "Expression does not produce a boolean (got {other:?})"
        ))),
    }
}

struct Evaluator<'a> {
    df: &'a DataFrame,
    height: usize,
}

impl Evaluator<'_> {
    fn eval(&self, expr: &Expr) -> Result<Values> {
        match expr {
            Expr::Literal(literal) => Ok(Values::Scalar(literal_cell(literal))),
            Expr::Column(name) => Ok(Values::Column(column_cells(self.df, name)?)),
            Expr::BinaryOp { left, op, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                self.zip(&left, &right, |a, b| binary(*op, a, b))
            }
            Expr::UnaryOp { op, expr } => {
                let value = self.eval(expr)?;
                self.map(&value, |cell| match op {
                    UnaryOperator::Not => Ok(Cell::Bool(!truthy(cell)?)),
                    UnaryOperator::Neg => match cell {
                        Cell::Null => Ok(Cell::Null),
                        other => Ok(Cell::Num(-number(other, "-")?)),
                    },
                })
            }
            Expr::InList {
                expr,
                items,
                negated,
            } => {
                let value = self.eval(expr)?;
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>>>()?;
                self.rows(|row| {
                    let cell = value.get(row);
                    let found = items
                        .iter()
                        .any(|item| compare(CompareOp::Eq, cell, item.get(row)));
                    Ok(Cell::Bool(found != *negated))
                })
            }
            Expr::FunctionCall { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.call(name, &args)
            }
        }
    }

    fn rows(&self, f: impl Fn(usize) -> Result<Cell>) -> Result<Values> {
        (0..self.height)
            .map(f)
            .collect::<Result<Vec<_>>>()
            .map(Values::Column)
    }

    fn map(&self, value: &Values, f: impl Fn(&Cell) -> Result<Cell>) -> Result<Values> {
        match value {
            Values::Scalar(cell) => Ok(Values::Scalar(f(cell)?)),
            Values::Column(_) => self.rows(|row| f(value.get(row))),
        }
    }

    fn zip(
        &self,
        left: &Values,
        right: &Values,
        f: impl Fn(&Cell, &Cell) -> Result<Cell>,
    ) -> Result<Values> {
        match (left, right) {
            (Values::Scalar(a), Values::Scalar(b)) => Ok(Values::Scalar(f(a, b)?)),
            _ => self.rows(|row| f(left.get(row), right.get(row))),
        }
    }

    fn call(&self, name: &str, args: &[Values]) -> Result<Values> {
        let arity = |expected: &[usize]| -> Result<()> {
            if expected.contains(&args.len()) {
                Ok(())
            } else {
                Err(Error::operation(format!(
                    "{name}() takes {expected:?} arguments, got {}",
                    args.len()
                )))
            }
        };

        match name {
            "abs" | "floor" | "ceil" | "sqrt" | "log" | "exp" => {
                arity(&[1])?;
                self.map(&args[0], |cell| {
                    if cell.is_null() {
                        return Ok(Cell::Null);
                    }
                    let n = number(cell, name)?;
                    Ok(Cell::Num(match name {
                        "abs" => n.abs(),
                        "floor" => n.floor(),
                        "ceil" => n.ceil(),
                        "sqrt" => n.sqrt(),
                        "log" => n.ln(),
                        _ => n.exp(),
                    }))
                })
            }
            "round" => {
                arity(&[1, 2])?;
                let digits = Values::Scalar(Cell::Num(0.0));
                let digits = args.get(1).unwrap_or(&digits);
                self.zip(&args[0], digits, |cell, digits| {
                    if cell.is_null() {
                        return Ok(Cell::Null);
                    }
                    let factor = 10f64.powi(number(digits, "round")? as i32);
                    Ok(Cell::Num((number(cell, "round")? * factor).round() / factor))
                })
            }
            "isnull" | "isna" | "notnull" | "notna" => {
                arity(&[1])?;
                let wants_null = name.starts_with("is");
                self.map(&args[0], |cell| Ok(Cell::Bool(cell.is_null() == wants_null)))
            }
            "contains" | "startswith" | "endswith" => {
                arity(&[2])?;
                self.zip(&args[0], &args[1], |cell, pattern| {
                    if cell.is_null() || pattern.is_null() {
                        return Ok(Cell::Bool(false));
                    }
                    let text = cell.text_form();
                    let pattern = pattern.text_form();
                    Ok(Cell::Bool(match name {
                        "contains" => text.contains(&pattern),
                        "startswith" => text.starts_with(&pattern),
                        _ => text.ends_with(&pattern),
                    }))
                })
            }
            "lower" | "upper" => {
                arity(&[1])?;
                self.map(&args[0], |cell| {
                    Ok(match cell {
                        Cell::Null => Cell::Null,
                        other if name == "lower" => Cell::Text(other.text_form().to_lowercase()),
                        other => Cell::Text(other.text_form().to_uppercase()),
                    })
                })
            }
            "len" => {
                arity(&[1])?;
                self.map(&args[0], |cell| {
                    Ok(match cell {
                        Cell::Null => Cell::Null,
                        other => Cell::Num(other.text_form().chars().count() as f64),
                    })
                })
            }
            other => Err(Error::operation(format!("Unknown function '{other}'"))),
        }
    }
}

fn literal_cell(literal: &Literal) -> Cell {
    match literal {
        Literal::Number(n) => Cell::Num(*n),
        Literal::String(s) => Cell::Text(s.clone()),
        Literal::Bool(b) => Cell::Bool(*b),
        Literal::Null => Cell::Null,
    }
}

fn number(cell: &Cell, context: &str) -> Result<f64> {
    cell.as_number().ok_or_else(|| {
        Error::operation(format!("'{}' is not numeric in {context}", cell.text_form()))
    })
}

fn truthy(cell: &Cell) -> Result<bool> {
    match cell {
        Cell::Bool(b) => Ok(*b),
        Cell::Null => Ok(false),
        Cell::Num(n) => Ok(*n != 0.0),
        Cell::Text(s) => Err(Error::operation(format!(
            "Text '{s}' used as a condition"
        ))),
    }
}

fn binary(op: BinaryOperator, a: &Cell, b: &Cell) -> Result<Cell> {
    match op {
        BinaryOperator::Compare(op) => Ok(Cell::Bool(compare(op, a, b))),
        BinaryOperator::And | BinaryOperator::Or => {
            // both sides must be conditions, even where the result is already decided
            let (x, y) = (truthy(a)?, truthy(b)?);
            Ok(Cell::Bool(if op == BinaryOperator::And { x && y } else { x || y }))
        }
        arithmetic => {
            if a.is_null() || b.is_null() {
                return Ok(Cell::Null);
            }
            if let (BinaryOperator::Add, Cell::Text(x), Cell::Text(y)) = (arithmetic, a, b) {
                return Ok(Cell::Text(format!("{x}{y}")));
            }
            let symbol = arithmetic.to_string();
            let x = number(a, &symbol)?;
            let y = number(b, &symbol)?;
            Ok(Cell::Num(match arithmetic {
                BinaryOperator::Add => x + y,
                BinaryOperator::Sub => x - y,
                BinaryOperator::Mul => x * y,
                BinaryOperator::Div => x / y,
                _ => floored_mod(x, y),
            }))
        }
    }
}

/// Remainder with the sign of the divisor
fn floored_mod(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && (r < 0.0) != (y < 0.0) {
        r + y
    } else {
        r
    }
}

/// Compare two cells. Missing values only satisfy `!=`; numbers compare
/// with numeric text, and text that is not numeric is never equal to a number.
fn compare(op: CompareOp, a: &Cell, b: &Cell) -> bool {
    match (a, b) {
        (Cell::Null, _) | (_, Cell::Null) => op == CompareOp::Ne,
        (Cell::Text(x), Cell::Text(y)) => op.matches_ordering(x.cmp(y)),
        (Cell::Bool(x), Cell::Bool(y)) => op.matches_ordering(x.cmp(y)),
        (Cell::Text(_), Cell::Bool(_)) | (Cell::Bool(_), Cell::Text(_)) => op == CompareOp::Ne,
        _ => match (a.as_number(), b.as_number()) {
            (Some(x), Some(y)) => op.compare(x, y),
            _ => op == CompareOp::Ne,
        },
    }
}
