//! Binding selector kinds to the columns of a concrete dataset.
//!
//! Selectors such as [`RangeQuery`](crate::RangeQuery) are written once against
//! a role ("the age column") and bound to a concrete column name per dataset.
//! A binding is a [`Localized`] value, the pre-configured constructor of a
//! selector kind. There are three interchangeable ways to get one:
//!
//! ```
//! use rowselect::{ColumnBinding, HasValue, Localizable, Localized};
//!
//! // a marker type naming the column
//! struct Petal;
//! impl ColumnBinding for Petal {
//!     const COLUMN: &'static str = "petal.length";
//! }
//! let by_marker = HasValue::bound::<Petal>();
//!
//! // a constant holding the column
//! const PETAL: Localized<HasValue> = Localized::from_static("petal.length");
//!
//! // the factory
//! let by_factory = HasValue::localized("petal.length").unwrap();
//!
//! assert_eq!(by_marker, PETAL);
//! assert_eq!(by_factory, PETAL);
//! ```
//!
//! [`ColumnPresets`] adds a registry of named bindings configured at runtime.
use std::{borrow::Cow, collections::HashMap, fmt, marker::PhantomData};

use crate::error::{Result, SelectorError};

/// A selector kind that reads one column chosen at binding time.
pub trait Localizable: Sized {
    /// Column used by [`default_localized`](Localizable::default_localized).
    const DEFAULT_COLUMN: Option<&'static str> = None;

    /// Bind this kind to `column`.
    fn localized(column: impl Into<Cow<'static, str>>) -> Result<Localized<Self>> {
        Localized::new(column)
    }

    /// Bind this kind to the column named by the marker type `B`.
    fn bound<B: ColumnBinding>() -> Localized<Self> {
        Localized::from_static(B::COLUMN)
    }

    /// Bind this kind to its default column.
    fn default_localized() -> Result<Localized<Self>> {
        match Self::DEFAULT_COLUMN {
            Some(column) => Ok(Localized::from_static(column)),
            None => Err(SelectorError::invalid(format!(
                "{} has no default column",
                std::any::type_name::<Self>()
            ))),
        }
    }
}

/// Marker type naming a column, for [`Localizable::bound`].
pub trait ColumnBinding {
    const COLUMN: &'static str;
}

/// A selector kind `S` bound to a column.
///
/// The constructors of the bound selector are inherent methods on
/// `Localized<S>` for each kind, for example
/// [`Localized::<RangeQuery>::range`](crate::RangeQuery).
pub struct Localized<S> {
    column: Cow<'static, str>,
    kind: PhantomData<fn() -> S>,
}

impl<S> Localized<S> {
    /// Bind to a static column name.
    ///
    /// The name is not validated; a name containing a backtick yields
    /// selectors whose expressions fail to parse on evaluation.
    pub const fn from_static(column: &'static str) -> Self {
        Self {
            column: Cow::Borrowed(column),
            kind: PhantomData,
        }
    }

    /// Bind to `column`, rejecting names that cannot be quoted.
    pub fn new(column: impl Into<Cow<'static, str>>) -> Result<Self> {
        let column = column.into();
        validate_column(&column)?;
        Ok(Self {
            column,
            kind: PhantomData,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// The column as it appears in a predicate expression.
    pub(crate) fn quoted(&self) -> String {
        format!("`{}`", self.column)
    }
}

impl<S> Clone for Localized<S> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            kind: PhantomData,
        }
    }
}

impl<S> PartialEq for Localized<S> {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column
    }
}

impl<S> Eq for Localized<S> {}

impl<S> fmt::Debug for Localized<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localized")
            .field("kind", &std::any::type_name::<S>())
            .field("column", &self.column)
            .finish()
    }
}

pub(crate) fn validate_column(column: &str) -> Result<()> {
    if column.is_empty() {
        return Err(SelectorError::invalid("column name is empty"));
    }
    if column.contains('`') {
        return Err(SelectorError::invalid(format!(
            "column name '{column}' contains a backtick"
        )));
    }
    Ok(())
}

/// Registry of named column bindings.
///
/// Lets a dataset describe its columns once, by role, and every selector kind
/// look them up by that role.
///
/// # Example
/// ```
/// use rowselect::{ColumnPresets, HasValue, RangeQuery};
///
/// let presets = ColumnPresets::builder()
///     .bind("age", "age_at_scan")
///     .bind("score", "test score")
///     .build()
///     .unwrap();
///
/// let adults = presets.localized::<RangeQuery>("age").unwrap().range().min(18).build().unwrap();
/// let scored = presets.localized::<HasValue>("score").unwrap().has_value();
/// # let _ = (adults, scored);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ColumnPresets {
    columns: HashMap<String, Cow<'static, str>>,
}

impl ColumnPresets {
    pub fn builder() -> ColumnPresetsBuilder {
        ColumnPresetsBuilder::default()
    }

    /// Column bound to preset `name`.
    pub fn column(&self, name: &str) -> Option<&str> {
        self.columns.get(name).map(|column| column.as_ref())
    }

    /// Bind kind `S` to the column of preset `name`.
    pub fn localized<S: Localizable>(&self, name: &str) -> Result<Localized<S>> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| SelectorError::invalid(format!("unknown column preset '{name}'")))?;
        Ok(Localized {
            column: column.clone(),
            kind: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Builder for ColumnPresets
#[derive(Clone, Debug, Default)]
pub struct ColumnPresetsBuilder {
    columns: Vec<(String, Cow<'static, str>)>,
}

impl ColumnPresetsBuilder {
    /// Bind preset `name` to `column`. Binding a name twice keeps the last column.
    pub fn bind(mut self, name: impl Into<String>, column: impl Into<Cow<'static, str>>) -> Self {
        self.columns.push((name.into(), column.into()));
        self
    }

    /// Build the registry, validating every column name.
    pub fn build(self) -> Result<ColumnPresets> {
        let mut columns = HashMap::with_capacity(self.columns.len());
        for (name, column) in self.columns {
            validate_column(&column)?;
            columns.insert(name, column);
        }
        Ok(ColumnPresets { columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Kind;

    impl Localizable for Kind {}

    #[derive(Debug)]
    struct WithDefault;

    impl Localizable for WithDefault {
        const DEFAULT_COLUMN: Option<&'static str> = Some("age");
    }

    struct Score;

    impl ColumnBinding for Score {
        const COLUMN: &'static str = "score";
    }

    #[test]
    fn binding_mechanisms_agree() {
        const SCORE: Localized<Kind> = Localized::from_static("score");
        assert_eq!(Kind::bound::<Score>(), SCORE);
        assert_eq!(Kind::localized("score").unwrap(), SCORE);
        assert_eq!(Kind::localized(String::from("score")).unwrap().quoted(), "`score`");
    }

    #[test]
    fn default_column() {
        assert_eq!(WithDefault::default_localized().unwrap().column(), "age");
        assert!(matches!(
            Kind::default_localized(),
            Err(SelectorError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn rejects_unquotable_columns() {
        assert!(Kind::localized("").is_err());
        assert!(Kind::localized("a`b").is_err());
        assert!(Kind::localized("sepal length (cm)").is_ok());
    }

    #[test]
    fn presets_resolve_by_name() {
        let presets = ColumnPresets::builder()
            .bind("age", "age_at_scan")
            .bind("age", "age_years")
            .bind("score", "score")
            .build()
            .unwrap();
        assert_eq!(presets.len(), 2);
        assert_eq!(presets.column("age"), Some("age_years"));
        assert_eq!(presets.localized::<Kind>("score").unwrap(), Kind::bound::<Score>());
        assert!(matches!(
            presets.localized::<Kind>("height"),
            Err(SelectorError::InvalidSelector { .. })
        ));
        assert!(ColumnPresets::builder().bind("bad", "").build().is_err());
    }
}
