//! Generic set combinators over arbitrary selectors.
use crate::{
    error::Result,
    observability::log_trace,
    selector::{Selector, SelectorRef},
    table::{RowIdSet, Table},
};

/// Rows selected by both operands.
///
/// The right operand only ever sees the rows the left one selected. For
/// selectors that depend on which rows they are shown (sampling, "first row"
/// style selectors), `a & b` and `b & a` can therefore differ.
#[derive(Clone, Debug)]
pub struct Intersection {
    left: SelectorRef,
    right: SelectorRef,
}

impl Intersection {
    pub fn new(left: SelectorRef, right: SelectorRef) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &SelectorRef {
        &self.left
    }

    pub fn right(&self) -> &SelectorRef {
        &self.right
    }
}

impl Selector for Intersection {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        let left = self.left.select_ids(table)?;
        let narrowed = table.project(&left)?;
        log_trace!(
            component = "combinator",
            event = "intersection_narrowed",
            rows = table.num_rows(),
            narrowed = narrowed.num_rows(),
        );
        self.right.select_ids(&narrowed)
    }

    fn select(&self, table: &Table) -> Result<Table> {
        let narrowed = self.left.select(table)?;
        self.right.select(&narrowed)
    }
}

/// Rows selected by either operand.
#[derive(Clone, Debug)]
pub struct Union {
    left: SelectorRef,
    right: SelectorRef,
}

impl Union {
    pub fn new(left: SelectorRef, right: SelectorRef) -> Self {
        Self { left, right }
    }

    pub fn left(&self) -> &SelectorRef {
        &self.left
    }

    pub fn right(&self) -> &SelectorRef {
        &self.right
    }
}

impl Selector for Union {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        let left = self.left.select_ids(table)?;
        let right = self.right.select_ids(table)?;
        Ok(left | right)
    }
}

/// Rows not selected by the wrapped selector.
#[derive(Clone, Debug)]
pub struct Complement {
    inner: SelectorRef,
}

impl Complement {
    pub fn new(inner: SelectorRef) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &SelectorRef {
        &self.inner
    }
}

impl Selector for Complement {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        let excluded = self.inner.select_ids(table)?;
        Ok(table.all_ids() - excluded)
    }

    fn complemented(&self) -> Option<&SelectorRef> {
        Some(&self.inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int32Array, RecordBatch};

    use super::*;

    #[derive(Debug)]
    struct FirstRow;

    impl Selector for FirstRow {
        fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
            Ok(table.row_ids().iter().take(1).copied().collect())
        }
    }

    #[derive(Debug)]
    struct Ids(Vec<u32>);

    impl Selector for Ids {
        fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
            Ok(self.0.iter().copied().collect::<RowIdSet>() & table.all_ids())
        }
    }

    fn table() -> Table {
        let batch = RecordBatch::try_from_iter(vec![(
            "x",
            Arc::new(Int32Array::from(vec![0, 1, 2, 3, 4, 5])) as ArrayRef,
        )])
        .unwrap();
        Table::new(batch).unwrap()
    }

    fn ids(selector: impl Selector) -> Vec<u32> {
        selector.select_ids(&table()).unwrap().iter().collect()
    }

    #[test]
    fn intersection_shows_right_only_left_rows() {
        let evens = Ids(vec![2, 4]).into_ref();
        let first = FirstRow.into_ref();
        assert_eq!(ids(Intersection::new(evens.clone(), first.clone())), vec![2]);
        assert_eq!(ids(Intersection::new(first, evens)), Vec::<u32>::new());
    }

    #[test]
    fn intersection_select_matches_ids() {
        let table = table();
        let selector = Intersection::new(Ids(vec![1, 3, 5]).into_ref(), FirstRow.into_ref());
        let selected = selector.select(&table).unwrap();
        assert_eq!(selected.row_ids(), &[1]);
        assert_eq!(selected, table.project(&selector.select_ids(&table).unwrap()).unwrap());
    }

    #[test]
    fn union_and_complement() {
        let union = Union::new(Ids(vec![0, 5]).into_ref(), Ids(vec![2, 5]).into_ref());
        assert_eq!(ids(union), vec![0, 2, 5]);

        let complement = Complement::new(Ids(vec![0, 5]).into_ref());
        assert!(complement.complemented().is_some());
        assert_eq!(ids(complement), vec![1, 2, 3, 4]);
    }

    #[test]
    fn complement_only_covers_rows_of_the_table() {
        let table = table().project(&[1, 2, 3].into_iter().collect()).unwrap();
        let complement = Complement::new(Ids(vec![2]).into_ref());
        assert_eq!(
            complement.select_ids(&table).unwrap().iter().collect::<Vec<_>>(),
            vec![1, 3]
        );
    }
}
