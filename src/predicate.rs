use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
};

use crate::{
    error::Result,
    observability::log_trace,
    selector::Selector,
    table::{RowIdSet, Table},
};

/// Selector backed by a predicate expression string.
///
/// The expression is evaluated by [`Table::query`]. Its syntax is described
/// in the [`query`](crate::query) module. Building a `Query` never parses the
/// expression; syntax errors surface when it is evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Query {
    expr: String,
}

impl Query {
    pub fn new(expr: impl Into<String>) -> Self {
        Self { expr: expr.into() }
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Conjunction of both expressions, each side parenthesized.
    pub fn and(&self, other: &Query) -> Query {
        Query::new(format!("(({}) & ({}))", self.expr, other.expr))
    }

    /// Disjunction of both expressions, each side parenthesized.
    pub fn or(&self, other: &Query) -> Query {
        Query::new(format!("(({}) | ({}))", self.expr, other.expr))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> Query {
        Query::new(format!("~({})", self.expr))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

impl From<&str> for Query {
    fn from(expr: &str) -> Self {
        Query::new(expr)
    }
}

impl From<String> for Query {
    fn from(expr: String) -> Self {
        Query::new(expr)
    }
}

impl From<&Query> for Query {
    fn from(query: &Query) -> Self {
        query.clone()
    }
}

impl Selector for Query {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        log_trace!(component = "predicate", event = "query_select", expr = %self.expr);
        table.query_ids(&self.expr)
    }

    fn select(&self, table: &Table) -> Result<Table> {
        table.query(&self.expr)
    }

    fn as_query(&self) -> Option<&Query> {
        Some(self)
    }
}

impl BitAnd for &Query {
    type Output = Query;

    fn bitand(self, rhs: Self) -> Query {
        self.and(rhs)
    }
}

impl BitOr for &Query {
    type Output = Query;

    fn bitor(self, rhs: Self) -> Query {
        self.or(rhs)
    }
}

impl Not for &Query {
    type Output = Query;

    fn not(self) -> Query {
        Query::not(self)
    }
}
