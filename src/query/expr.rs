use std::{fmt, sync::Arc};

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmpOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::NotEq => "!=",
            CmpOp::Lt => "<",
            CmpOp::LtEq => "<=",
            CmpOp::Gt => ">",
            CmpOp::GtEq => ">=",
        }
    }
}

/// Constant value appearing in a predicate expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Literal {
    /// Single-element array holding this value, used as a comparison scalar.
    pub(crate) fn to_array(&self) -> ArrayRef {
        match self {
            Literal::Int(v) => Arc::new(Int64Array::from(vec![*v])),
            Literal::Float(v) => Arc::new(Float64Array::from(vec![*v])),
            Literal::Str(v) => Arc::new(StringArray::from(vec![v.as_str()])),
            Literal::Bool(v) => Arc::new(BooleanArray::from(vec![*v])),
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Literal::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal::Int(value.into())
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<f32> for Literal {
    fn from(value: f32) -> Self {
        Literal::Float(value.into())
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

impl fmt::Display for Literal {
    /// Renders the literal in predicate syntax, so that it parses back to itself.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            // Debug keeps the decimal point (`5.0`), Display would print `5`
            Literal::Float(v) => write!(f, "{v:?}"),
            Literal::Str(v) => {
                write!(f, "'")?;
                for c in v.chars() {
                    match c {
                        '\'' => write!(f, "\\'")?,
                        '\\' => write!(f, "\\\\")?,
                        c => write!(f, "{c}")?,
                    }
                }
                write!(f, "'")
            }
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
        }
    }
}

/// One side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Literal),
}

impl Operand {
    pub fn column(name: impl Into<String>) -> Self {
        Operand::Column(name.into())
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Operand::Literal(value.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(name) => write!(f, "{}", ColumnDisplay(name)),
            Operand::Literal(value) => write!(f, "{value}"),
        }
    }
}

/// Parsed predicate expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    True,
    False,
    /// A boolean column used directly as a predicate.
    Column(String),
    Cmp {
        left: Operand,
        op: CmpOp,
        right: Operand,
    },
    InList {
        column: String,
        values: Vec<Literal>,
        negated: bool,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Build a comparison of a column against a literal.
    pub fn cmp(column: impl Into<String>, op: CmpOp, value: impl Into<Literal>) -> Self {
        Expr::Cmp {
            left: Operand::column(column),
            op,
            right: Operand::literal(value),
        }
    }

    /// Build an equality expression (`==`).
    pub fn eq(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::cmp(column, CmpOp::Eq, value)
    }

    /// Build a less-than expression (`<`).
    pub fn lt(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::cmp(column, CmpOp::Lt, value)
    }

    /// Build a greater-than-or-equal expression (`>=`).
    pub fn gt_eq(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Self::cmp(column, CmpOp::GtEq, value)
    }

    /// Build an `in [...]` expression.
    pub fn in_list(column: impl Into<String>, values: Vec<Literal>) -> Self {
        Expr::InList {
            column: column.into(),
            values,
            negated: false,
        }
    }

    /// Build an `isnull(...)` expression.
    pub fn is_null(column: impl Into<String>) -> Self {
        Expr::IsNull {
            column: column.into(),
            negated: false,
        }
    }

    /// Build a `notnull(...)` expression.
    pub fn is_not_null(column: impl Into<String>) -> Self {
        Expr::IsNull {
            column: column.into(),
            negated: true,
        }
    }

    pub fn and(parts: Vec<Expr>) -> Self {
        Expr::And(parts)
    }

    pub fn or(parts: Vec<Expr>) -> Self {
        Expr::Or(parts)
    }

    pub fn not(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }
}

const RESERVED: &[&str] = &["and", "or", "not", "in", "True", "False", "true", "false"];

/// Writes a column bare when it lexes as an identifier, backtick-quoted otherwise.
struct ColumnDisplay<'a>(&'a str);

impl fmt::Display for ColumnDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.0;
        let mut chars = name.chars();
        let bare = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            && !RESERVED.contains(&name);
        if bare {
            write!(f, "{name}")
        } else {
            write!(f, "`{name}`")
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, parts: &[Expr], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            write!(f, " {sep} ")?;
        }
        write!(f, "{part}")?;
    }
    write!(f, ")")
}

impl fmt::Display for Expr {
    /// Renders the expression in predicate syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::True => write!(f, "True"),
            Expr::False => write!(f, "False"),
            Expr::Column(name) => write!(f, "{}", ColumnDisplay(name)),
            Expr::Cmp { left, op, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::InList {
                column,
                values,
                negated,
            } => {
                let keyword = if *negated { "not in" } else { "in" };
                write!(f, "{} {} [", ColumnDisplay(column), keyword)?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Expr::IsNull { column, negated } => {
                let func = if *negated { "notnull" } else { "isnull" };
                write!(f, "{}({})", func, ColumnDisplay(column))
            }
            Expr::And(parts) => match parts.as_slice() {
                [] => write!(f, "True"),
                [single] => write!(f, "{single}"),
                _ => write_joined(f, parts, "&"),
            },
            Expr::Or(parts) => match parts.as_slice() {
                [] => write!(f, "False"),
                [single] => write!(f, "{single}"),
                _ => write_joined(f, parts, "|"),
            },
            Expr::Not(inner) => write!(f, "~({inner})"),
        }
    }
}
