use std::{
    fmt,
    ops::{BitAnd, BitOr, Not},
    sync::Arc,
};

use crate::{
    combinator::{Complement, Intersection, Union},
    error::Result,
    predicate::Query,
    table::{RowIdSet, Table},
};

/// A composable predicate over table rows.
///
/// Implementors provide [`select_ids`](Selector::select_ids); everything else
/// has a default. Selectors are immutable once built: combining them through
/// [`SelectorRef`] creates new selectors and never touches the operands.
///
/// Two optional capabilities steer how [`SelectorRef`] combines selectors:
///
/// - [`as_query`](Selector::as_query): the selection is a single predicate
///   expression, so conjunctions, disjunctions and negations can be folded
///   into one new expression instead of a wrapper;
/// - [`complemented`](Selector::complemented): the selector is the complement
///   of another one, so negating it yields that other selector back.
pub trait Selector: fmt::Debug + Send + Sync {
    /// Identifiers of the selected rows of `table`.
    fn select_ids(&self, table: &Table) -> Result<RowIdSet>;

    /// The selected rows of `table`.
    ///
    /// Must agree with [`select_ids`](Selector::select_ids): the returned table
    /// holds exactly the rows whose identifiers are selected.
    fn select(&self, table: &Table) -> Result<Table> {
        table.project(&self.select_ids(table)?)
    }

    /// The predicate expression this selector evaluates, if it is one.
    fn as_query(&self) -> Option<&Query> {
        None
    }

    /// The selector this one is the complement of, if any.
    fn complemented(&self) -> Option<&SelectorRef> {
        None
    }

    /// Move the selector behind a shared handle.
    fn into_ref(self) -> SelectorRef
    where
        Self: Sized + 'static,
    {
        SelectorRef(Arc::new(self))
    }
}

/// Shared handle to an immutable selector.
///
/// This is the type selectors are combined through. `&`, `|` and `!` are
/// shorthands for [`and`](SelectorRef::and), [`or`](SelectorRef::or) and
/// [`not`](SelectorRef::not).
///
/// # Example
/// ```
/// use rowselect::{Query, Selector};
///
/// let short = Query::new("`petal.length` < 3").into_ref();
/// let long = Query::new("`petal.length` >= 6").into_ref();
/// let extremes = &short | &long;
/// assert_eq!(
///     extremes.as_query().unwrap().expr(),
///     "((`petal.length` < 3) | (`petal.length` >= 6))"
/// );
/// ```
#[derive(Clone)]
pub struct SelectorRef(Arc<dyn Selector>);

impl SelectorRef {
    pub fn new<S: Selector + 'static>(selector: S) -> Self {
        selector.into_ref()
    }

    /// Intersection with `other`, evaluated left first.
    ///
    /// Two predicate selectors fold into a single predicate; anything else
    /// becomes an [`Intersection`].
    pub fn and(&self, other: &SelectorRef) -> SelectorRef {
        if let (Some(left), Some(right)) = (self.as_query(), other.as_query()) {
            return left.and(right).into_ref();
        }
        Intersection::new(self.clone(), other.clone()).into_ref()
    }

    /// Union with `other`.
    pub fn or(&self, other: &SelectorRef) -> SelectorRef {
        if let (Some(left), Some(right)) = (self.as_query(), other.as_query()) {
            return left.or(right).into_ref();
        }
        Union::new(self.clone(), other.clone()).into_ref()
    }

    /// Complement of this selector.
    ///
    /// The complement of a [`Complement`] is the selector it wraps.
    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> SelectorRef {
        if let Some(query) = self.as_query() {
            return query.not().into_ref();
        }
        if let Some(inner) = self.complemented() {
            return inner.clone();
        }
        Complement::new(self.clone()).into_ref()
    }

    /// Whether both handles point at the same selector instance.
    pub fn ptr_eq(&self, other: &SelectorRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for SelectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Selector for SelectorRef {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        self.0.select_ids(table)
    }

    fn select(&self, table: &Table) -> Result<Table> {
        self.0.select(table)
    }

    fn as_query(&self) -> Option<&Query> {
        self.0.as_query()
    }

    fn complemented(&self) -> Option<&SelectorRef> {
        self.0.complemented()
    }

    fn into_ref(self) -> SelectorRef {
        self
    }
}

impl<S: Selector + ?Sized> Selector for &S {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        (**self).select_ids(table)
    }

    fn select(&self, table: &Table) -> Result<Table> {
        (**self).select(table)
    }

    fn as_query(&self) -> Option<&Query> {
        (**self).as_query()
    }

    fn complemented(&self) -> Option<&SelectorRef> {
        (**self).complemented()
    }
}

impl BitAnd for &SelectorRef {
    type Output = SelectorRef;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitAnd for SelectorRef {
    type Output = SelectorRef;

    fn bitand(self, rhs: Self) -> Self::Output {
        SelectorRef::and(&self, &rhs)
    }
}

impl BitOr for &SelectorRef {
    type Output = SelectorRef;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl BitOr for SelectorRef {
    type Output = SelectorRef;

    fn bitor(self, rhs: Self) -> Self::Output {
        SelectorRef::or(&self, &rhs)
    }
}

impl Not for &SelectorRef {
    type Output = SelectorRef;

    fn not(self) -> Self::Output {
        SelectorRef::not(self)
    }
}

impl Not for SelectorRef {
    type Output = SelectorRef;

    fn not(self) -> Self::Output {
        SelectorRef::not(&self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int32Array, RecordBatch};

    use super::*;

    /// Selects the first row of whatever table it is given.
    #[derive(Debug)]
    pub(crate) struct FirstRow;

    impl Selector for FirstRow {
        fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
            Ok(table.row_ids().iter().take(1).copied().collect())
        }
    }

    fn table() -> Table {
        let batch = RecordBatch::try_from_iter(vec![(
            "x",
            Arc::new(Int32Array::from(vec![5, 1, 4, 2, 3])) as ArrayRef,
        )])
        .unwrap();
        Table::new(batch).unwrap()
    }

    fn ids(selector: &SelectorRef) -> Vec<u32> {
        selector.select_ids(&table()).unwrap().iter().collect()
    }

    #[test]
    fn queries_fold_into_queries() {
        let small = Query::new("x < 3").into_ref();
        let odd = Query::new("x in [1, 3, 5]").into_ref();

        let both = small.and(&odd);
        assert_eq!(both.as_query().unwrap().expr(), "((x < 3) & (x in [1, 3, 5]))");
        let either = &small | &odd;
        assert_eq!(either.as_query().unwrap().expr(), "((x < 3) | (x in [1, 3, 5]))");
        assert_eq!(ids(&both), vec![1]);
        assert_eq!(ids(&either), vec![0, 1, 3, 4]);
    }

    #[test]
    fn mixed_operands_fall_back_to_generic_combinators() {
        let small = Query::new("x < 4").into_ref();
        let first = FirstRow.into_ref();

        let combined = small.and(&first);
        assert!(combined.as_query().is_none());
        assert_eq!(ids(&combined), vec![1]);

        let combined = first.or(&small);
        assert!(combined.as_query().is_none());
        assert_eq!(ids(&combined), vec![0, 1, 3, 4]);
    }

    #[test]
    fn complement_cancels() {
        let first = FirstRow.into_ref();
        let complement = !&first;
        assert_eq!(ids(&complement), vec![1, 2, 3, 4]);
        let back = complement.not();
        assert!(back.ptr_eq(&first));
        assert_eq!(ids(&back), vec![0]);
    }

    #[test]
    fn select_agrees_with_select_ids() {
        let table = table();
        let selectors = [
            Query::new("x >= 3").into_ref(),
            FirstRow.into_ref(),
            Query::new("x >= 3").into_ref() & FirstRow.into_ref(),
            !FirstRow.into_ref() | Query::new("x == 1").into_ref(),
        ];
        for selector in selectors {
            let ids = selector.select_ids(&table).unwrap();
            assert_eq!(selector.select(&table).unwrap(), table.project(&ids).unwrap());
        }
    }
}
