//! Ready-made selectors reading a single, localizable column.
//!
//! Every selector here is a predicate expression underneath, so they combine
//! with each other and with [`Query`] by folding into a single expression.
use std::{borrow::Cow, fmt, marker::PhantomData};

use crate::{
    error::{Result, SelectorError},
    localize::{Localizable, Localized},
    predicate::Query,
    query::{CmpOp, Literal},
    selector::Selector,
    table::{RowIdSet, Table},
};

/// Implements [`Selector`] for a type holding its expression in `self.query`.
macro_rules! query_selector {
    ($ty:ty $(, $generic:ident: $bound:path)?) => {
        impl$(<$generic: $bound>)? Selector for $ty {
            fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
                self.query.select_ids(table)
            }

            fn select(&self, table: &Table) -> Result<Table> {
                self.query.select(table)
            }

            fn as_query(&self) -> Option<&Query> {
                Some(&self.query)
            }
        }
    };
}

/// Rows where a column equals a value.
///
/// `Equals` has no default column; bind it to one, here through a marker type.
///
/// ```
/// use rowselect::{ColumnBinding, Equals, Localizable, Selector};
///
/// struct Age;
///
/// impl ColumnBinding for Age {
///     const COLUMN: &'static str = "age";
/// }
///
/// let age = Equals::bound::<Age>();
/// let thirty = age.equals(30);
/// assert_eq!(thirty.as_query().unwrap().expr(), "`age` == 30");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Equals {
    value: Literal,
    query: Query,
}

impl Equals {
    pub fn new(column: impl Into<Cow<'static, str>>, value: impl Into<Literal>) -> Result<Self> {
        Ok(Self::localized(column)?.equals(value))
    }

    pub fn value(&self) -> &Literal {
        &self.value
    }
}

impl Localizable for Equals {}

impl Localized<Equals> {
    pub fn equals(&self, value: impl Into<Literal>) -> Equals {
        let value = value.into();
        let query = Query::new(format!("{} == {}", self.quoted(), value));
        Equals { value, query }
    }
}

query_selector!(Equals);

/// A categorical value, given by code or by name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryValue {
    Code(i64),
    Name(String),
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryValue::Code(code) => write!(f, "{code}"),
            CategoryValue::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<i64> for CategoryValue {
    fn from(code: i64) -> Self {
        CategoryValue::Code(code)
    }
}

impl From<i32> for CategoryValue {
    fn from(code: i32) -> Self {
        CategoryValue::Code(code.into())
    }
}

impl From<&str> for CategoryValue {
    fn from(name: &str) -> Self {
        CategoryValue::Name(name.to_string())
    }
}

impl From<String> for CategoryValue {
    fn from(name: String) -> Self {
        CategoryValue::Name(name)
    }
}

/// An enumerated encoding of a categorical column as integer codes.
pub trait Encoding: fmt::Debug + Send + Sync + 'static {
    /// Column the encoding is usually stored in.
    const DEFAULT_COLUMN: Option<&'static str> = None;

    /// Every `(code, name)` pair of the encoding.
    const CATEGORIES: &'static [(i64, &'static str)];

    /// Value selected by [`Localized::default_category`].
    const DEFAULT: Option<&'static str> = None;

    /// Code of `value`, if it belongs to the encoding.
    fn code_of(value: &CategoryValue) -> Option<i64> {
        Self::CATEGORIES
            .iter()
            .find(|(code, name)| match value {
                CategoryValue::Code(c) => c == code,
                CategoryValue::Name(n) => n == name,
            })
            .map(|(code, _)| *code)
    }
}

/// Encoding of a `sex` column: 0 female, 1 male, 2 other, 3 unknown.
#[derive(Clone, Copy, Debug)]
pub struct Sex;

impl Encoding for Sex {
    const DEFAULT_COLUMN: Option<&'static str> = Some("sex");
    const CATEGORIES: &'static [(i64, &'static str)] =
        &[(0, "female"), (1, "male"), (2, "other"), (3, "unknown")];
    const DEFAULT: Option<&'static str> = Some("male");
}

/// Rows where a categorical column holds one category of encoding `E`.
#[derive(Debug)]
pub struct Categorical<E: Encoding> {
    code: i64,
    query: Query,
    encoding: PhantomData<fn() -> E>,
}

impl<E: Encoding> Categorical<E> {
    pub fn new(
        column: impl Into<Cow<'static, str>>,
        value: impl Into<CategoryValue>,
    ) -> Result<Self> {
        Self::localized(column)?.category(value)
    }

    /// The encoded category.
    pub fn code(&self) -> i64 {
        self.code
    }
}

impl<E: Encoding> Clone for Categorical<E> {
    fn clone(&self) -> Self {
        Self {
            code: self.code,
            query: self.query.clone(),
            encoding: PhantomData,
        }
    }
}

impl<E: Encoding> Localizable for Categorical<E> {
    const DEFAULT_COLUMN: Option<&'static str> = E::DEFAULT_COLUMN;
}

impl<E: Encoding> Localized<Categorical<E>> {
    /// Select the rows holding `value`, given as a code or a name.
    pub fn category(&self, value: impl Into<CategoryValue>) -> Result<Categorical<E>> {
        let value = value.into();
        let code = E::code_of(&value).ok_or_else(|| {
            SelectorError::invalid(format!(
                "unknown value {value} for encoding {}",
                std::any::type_name::<E>()
            ))
        })?;
        Ok(Categorical {
            code,
            query: Query::new(format!("{} == {}", self.quoted(), code)),
            encoding: PhantomData,
        })
    }

    /// Select the rows holding the encoding's default value.
    pub fn default_category(&self) -> Result<Categorical<E>> {
        let value = E::DEFAULT.ok_or_else(|| {
            SelectorError::invalid(format!(
                "encoding {} has no default value",
                std::any::type_name::<E>()
            ))
        })?;
        self.category(value)
    }
}

query_selector!(Categorical<E>, E: Encoding);

/// Rows where a column lies within a range.
///
/// The range includes its minimum and excludes its maximum unless configured
/// otherwise. Either bound may be left open, but not both.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeQuery {
    min: Option<Literal>,
    max: Option<Literal>,
    query: Query,
}

impl RangeQuery {
    /// Start a range over `column`.
    ///
    /// # Example
    /// ```
    /// use rowselect::{RangeQuery, Selector};
    ///
    /// let range = RangeQuery::builder("age")
    ///     .unwrap()
    ///     .min(5)
    ///     .max(6)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(range.as_query().unwrap().expr(), "((`age` >= 5) & (`age` < 6))");
    /// ```
    pub fn builder(column: impl Into<Cow<'static, str>>) -> Result<RangeQueryBuilder> {
        Ok(Self::localized(column)?.range())
    }

    pub fn min(&self) -> Option<&Literal> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Literal> {
        self.max.as_ref()
    }
}

impl Localizable for RangeQuery {}

impl Localized<RangeQuery> {
    pub fn range(&self) -> RangeQueryBuilder {
        RangeQueryBuilder {
            column: self.quoted(),
            min: None,
            max: None,
            min_inclusive: true,
            max_inclusive: false,
        }
    }
}

query_selector!(RangeQuery);

/// Builder for RangeQuery
#[derive(Clone, Debug)]
pub struct RangeQueryBuilder {
    column: String,
    min: Option<Literal>,
    max: Option<Literal>,
    min_inclusive: bool,
    max_inclusive: bool,
}

impl RangeQueryBuilder {
    pub fn min(mut self, value: impl Into<Literal>) -> Self {
        self.min = Some(value.into());
        self
    }

    pub fn max(mut self, value: impl Into<Literal>) -> Self {
        self.max = Some(value.into());
        self
    }

    /// Whether the minimum itself is selected (default: true)
    pub fn min_inclusive(mut self, value: bool) -> Self {
        self.min_inclusive = value;
        self
    }

    /// Whether the maximum itself is selected (default: false)
    pub fn max_inclusive(mut self, value: bool) -> Self {
        self.max_inclusive = value;
        self
    }

    /// Build the selector.
    ///
    /// Fails if neither bound is set or a bound is not a finite number.
    pub fn build(self) -> Result<RangeQuery> {
        for bound in self.min.iter().chain(&self.max) {
            if !bound.is_finite() {
                return Err(SelectorError::invalid(format!(
                    "range bound {bound} is not finite"
                )));
            }
        }

        let min_op = if self.min_inclusive {
            CmpOp::GtEq
        } else {
            CmpOp::Gt
        };
        let max_op = if self.max_inclusive {
            CmpOp::LtEq
        } else {
            CmpOp::Lt
        };
        let lower = self.min.as_ref().map(|min| {
            Query::new(format!("{} {} {}", self.column, min_op.symbol(), min))
        });
        let upper = self.max.as_ref().map(|max| {
            Query::new(format!("{} {} {}", self.column, max_op.symbol(), max))
        });

        let query = match (lower, upper) {
            (Some(lower), Some(upper)) => lower.and(&upper),
            (Some(bound), None) | (None, Some(bound)) => bound,
            (None, None) => {
                return Err(SelectorError::invalid(
                    "a range needs a minimum or a maximum",
                ));
            }
        };
        Ok(RangeQuery {
            min: self.min,
            max: self.max,
            query,
        })
    }
}

/// Rows where a column holds a value, i.e. is neither null nor NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct HasValue {
    query: Query,
}

impl HasValue {
    pub fn new(column: impl Into<Cow<'static, str>>) -> Result<Self> {
        Ok(Self::localized(column)?.has_value())
    }
}

impl Localizable for HasValue {}

impl Localized<HasValue> {
    pub fn has_value(&self) -> HasValue {
        HasValue {
            query: Query::new(format!("notnull({})", self.quoted())),
        }
    }
}

query_selector!(HasValue);
