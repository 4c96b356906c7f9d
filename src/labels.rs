//! Per-row labels derived from selectors.
use std::{collections::HashMap, sync::Arc};

use arrow::array::{ArrayRef, StringArray, UInt64Array};

use crate::{
    error::{Result, SelectorError},
    observability::log_debug,
    selector::Selector,
    table::{RowId, RowIdSet, Table},
};

/// Sparse assignment of labels to the rows of a table.
///
/// Rows no selector claimed have no label.
#[derive(Clone, Debug, PartialEq)]
pub struct RowLabels<L> {
    row_ids: Vec<RowId>,
    labels: HashMap<RowId, L>,
}

impl<L> RowLabels<L> {
    fn unlabeled(table: &Table) -> Self {
        Self {
            row_ids: table.row_ids().to_vec(),
            labels: HashMap::new(),
        }
    }

    /// Label of row `id`, `None` if unlabeled or not a row of the table.
    pub fn get(&self, id: RowId) -> Option<&L> {
        self.labels.get(&id)
    }

    /// Labels in table row order.
    pub fn iter(&self) -> impl Iterator<Item = (RowId, Option<&L>)> + '_ {
        self.row_ids.iter().map(|id| (*id, self.labels.get(id)))
    }

    /// Number of rows, labeled or not.
    pub fn len(&self) -> usize {
        self.row_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_ids.is_empty()
    }

    /// Number of labeled rows.
    pub fn labeled_len(&self) -> usize {
        self.labels.len()
    }

    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }
}

impl<L: AsRef<str>> RowLabels<L> {
    /// Labels as a nullable string column aligned with the table.
    pub fn to_string_array(&self) -> ArrayRef {
        let array: StringArray = self
            .iter()
            .map(|(_, label)| label.map(AsRef::<str>::as_ref))
            .collect();
        Arc::new(array)
    }
}

impl RowLabels<usize> {
    /// Group indices as a nullable integer column aligned with the table.
    pub fn to_index_array(&self) -> ArrayRef {
        let array: UInt64Array = self
            .iter()
            .map(|(_, index)| index.map(|i| *i as u64))
            .collect();
        Arc::new(array)
    }
}

/// Label the rows of `table` by the selectors that select them.
///
/// Selectors are applied in iteration order; a row selected by several of
/// them keeps the label of the last one.
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use arrow::array::{ArrayRef, Int32Array, RecordBatch};
/// use rowselect::{Query, Table, label_rows};
///
/// let batch = RecordBatch::try_from_iter(vec![(
///     "x",
///     Arc::new(Int32Array::from(vec![1, 2, 3])) as ArrayRef,
/// )])
/// .unwrap();
/// let table = Table::new(batch).unwrap();
///
/// let labels = label_rows(
///     &table,
///     [("a", Query::new("x <= 2")), ("b", Query::new("x >= 2"))],
/// )
/// .unwrap();
/// let labels: Vec<_> = labels.iter().map(|(_, l)| l.copied()).collect();
/// assert_eq!(labels, vec![Some("a"), Some("b"), Some("b")]);
/// ```
pub fn label_rows<L, S, I>(table: &Table, labeled: I) -> Result<RowLabels<L>>
where
    L: Clone,
    S: Selector,
    I: IntoIterator<Item = (L, S)>,
{
    let mut labels = RowLabels::unlabeled(table);
    let mut selectors = 0usize;
    for (label, selector) in labeled {
        for id in &selector.select_ids(table)? {
            labels.labels.insert(id, label.clone());
        }
        selectors += 1;
    }
    log_debug!(
        component = "labels",
        event = "rows_labeled",
        selectors,
        rows = labels.len(),
        labeled = labels.labeled_len(),
    );
    Ok(labels)
}

/// Label every row with the index of the selector selecting it.
///
/// Unless `allow_overlap` is set, fails with
/// [`SelectorError::OverlappingGroups`] before labeling anything if a row is
/// selected by more than one selector. With overlaps allowed, such a row gets
/// the highest index.
pub fn group_rows<S: Selector>(
    table: &Table,
    selectors: &[S],
    allow_overlap: bool,
) -> Result<RowLabels<usize>> {
    if !allow_overlap {
        let selections = selections(table, selectors)?;
        let overlapping = overlap(&selections);
        if overlapping > 0 {
            return Err(SelectorError::OverlappingGroups { overlapping });
        }
        let mut labels = RowLabels::unlabeled(table);
        for (index, ids) in selections.iter().enumerate() {
            labels.labels.extend(ids.iter().map(|id| (id, index)));
        }
        return Ok(labels);
    }
    label_rows(table, selectors.iter().enumerate())
}

/// Whether no row of `table` is selected by more than one of `selectors`.
pub fn are_disjoint_groups<S: Selector>(table: &Table, selectors: &[S]) -> Result<bool> {
    Ok(overlap(&selections(table, selectors)?) == 0)
}

fn selections<S: Selector>(table: &Table, selectors: &[S]) -> Result<Vec<RowIdSet>> {
    selectors
        .iter()
        .map(|selector| selector.select_ids(table))
        .collect()
}

/// Selected rows counted with multiplicity, minus distinct selected rows.
fn overlap(selections: &[RowIdSet]) -> u64 {
    let total: u64 = selections.iter().map(RowIdSet::len).sum();
    let mut union = RowIdSet::new();
    for ids in selections {
        union |= ids;
    }
    total - union.len()
}
