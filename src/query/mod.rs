//! Predicate expression language evaluated by [`Table`](crate::Table).
//!
//! The syntax is a small subset of pandas' `DataFrame.query`:
//!
//! ```text
//! `sepal.length` >= 5 & (kind == 'setosa' | ~(width < 0.5))
//! 1 < age <= 30 and notnull(score)
//! status not in ['closed', 'merged']
//! ```
//!
//! Columns are bare identifiers or backtick-quoted names. `&`/`and`,
//! `|`/`or` and `~`/`not` combine predicates, `&` binding tighter than `|`.
//! Comparisons may be chained. `isnull`, `notnull`, `isna` and `notna` test for
//! missing values.
mod eval;
mod expr;
mod lexer;
mod parser;

pub use eval::RowFilter;
pub(crate) use eval::{canonical_zeros, missing_mask};
pub use expr::{CmpOp, Expr, Literal, Operand};
pub use parser::parse;
