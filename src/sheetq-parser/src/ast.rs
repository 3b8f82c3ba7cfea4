//! Abstract Syntax Tree (AST) definitions for sheetq condition expressions
//!
//! Free-form conditions such as `Pclass == 1 and Fare > 50` are parsed into
//! these nodes and later evaluated column-wise against a table. The grammar
//! is deliberately closed: there is no way to express assignment, attribute
//! access or arbitrary calls, only the helpers listed in [`FUNCTIONS`].

use std::fmt;

use serde::Serialize;

/// Helper functions callable from a condition expression
pub const FUNCTIONS: &[&str] = &[
    "abs",
    "round",
    "floor",
    "ceil",
    "sqrt",
    "log",
    "exp",
    "isnull",
    "isna",
    "notnull",
    "notna",
    "contains",
    "startswith",
    "endswith",
    "lower",
    "upper",
    "len",
];

/// Reserved words of the grammar; they never name a bare column
pub const KEYWORDS: &[&str] = &["and", "or", "not", "in", "true", "false", "null", "none"];

/// Whether `word` is a reserved word, ignoring case
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

/// Core expression types
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Literal value
    Literal(Literal),

    /// Reference to a table column, either bare (`Fare`) or quoted (`` `Home Port` ``)
    Column(String),

    /// Binary operation (left op right)
    BinaryOp {
        /// Left operand
        left: Box<Expr>,
        /// Operator
        op: BinaryOperator,
        /// Right operand
        right: Box<Expr>,
    },

    /// Unary operation (op expr)
    UnaryOp {
        /// Operator
        op: UnaryOperator,
        /// Operand
        expr: Box<Expr>,
    },

    /// Membership test (`expr in (a, b)` / `expr not in [a, b]`)
    InList {
        /// Tested expression
        expr: Box<Expr>,
        /// Candidate values
        items: Vec<Expr>,
        /// Whether the test is `not in`
        negated: bool,
    },

    /// Helper function call (`abs(Fare)`)
    FunctionCall {
        /// Function name, lower-cased
        name: String,
        /// Arguments
        args: Vec<Expr>,
    },
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    /// Numeric literal (integers are widened)
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Bool(bool),
    /// Null / missing
    Null,
}

/// Comparison operators shared by the numeric condition parser and the
/// expression grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    /// `==` (a bare `=` is read as equality)
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum BinaryOperator {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Remainder
    Mod,
    /// Comparison
    Compare(CompareOp),
    /// Logical AND
    And,
    /// Logical OR
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    /// Logical NOT
    Not,
    /// Numeric negation
    Neg,
}

impl CompareOp {
    /// Map an operator symbol to a comparison, treating `=` as `==`
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" | "=" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            _ => None,
        }
    }

    /// Compare two numbers
    #[must_use]
    pub fn compare(self, left: f64, right: f64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
        }
    }

    /// Interpret an ordering between two values
    #[must_use]
    pub fn matches_ordering(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering;
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }
}

impl Expr {
    /// Shorthand for building a binary node
    #[must_use]
    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Collect the names of every column the expression references
    #[must_use]
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::UnaryOp { expr, .. } => expr.collect_columns(out),
            Expr::InList { expr, items, .. } => {
                expr.collect_columns(out);
                for item in items {
                    item.collect_columns(out);
                }
            }
            Expr::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_columns(out);
                }
            }
            Expr::Literal(_) => {}
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Ge => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Le => write!(f, "<="),
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Sub => write!(f, "-"),
            BinaryOperator::Mul => write!(f, "*"),
            BinaryOperator::Div => write!(f, "/"),
            BinaryOperator::Mod => write!(f, "%"),
            BinaryOperator::Compare(op) => write!(f, "{op}"),
            BinaryOperator::And => write!(f, "and"),
            BinaryOperator::Or => write!(f, "or"),
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Not => write!(f, "not"),
            UnaryOperator::Neg => write!(f, "-"),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "'{s}'"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{lit}"),
            Expr::Column(name) => write!(f, "`{name}`"),
            Expr::BinaryOp { left, op, right } => write!(f, "({left} {op} {right})"),
            Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr,
            } => write!(f, "not {expr}"),
            Expr::UnaryOp {
                op: UnaryOperator::Neg,
                expr,
            } => write!(f, "-{expr}"),
            Expr::InList {
                expr,
                items,
                negated,
            } => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                let keyword = if *negated { "not in" } else { "in" };
                write!(f, "{expr} {keyword} ({})", items.join(", "))
            }
            Expr::FunctionCall { name, args } => {
                let args: Vec<String> = args.iter().map(ToString::to_string).collect();
                write!(f, "{name}({})", args.join(", "))
            }
        }
    }
}
