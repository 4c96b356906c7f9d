use std::{fmt, sync::Arc};

use crate::{
    error::{Result, SelectorError},
    observability::log_debug,
    selector::Selector,
    table::{RowIdSet, Table},
};

type Indexer = Arc<dyn Fn(&Table) -> usize + Send + Sync>;

/// One row per distinct value of a column.
///
/// The table is grouped by the column, see [`Table::group_by`]. From each group
/// the first row is taken, or the row at the position an indexer returns for
/// the group's rows. Rows with a missing value in the column are never
/// selected.
#[derive(Clone)]
pub struct UniqueElements {
    column: String,
    indexer: Option<Indexer>,
}

impl UniqueElements {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            indexer: None,
        }
    }

    /// Choose the row of each group with `indexer`.
    ///
    /// The indexer receives the rows of one group and returns a 0-based
    /// position within them. Evaluation fails with
    /// [`SelectorError::IndexerOutOfRange`] if it returns a position past the
    /// end of any group.
    pub fn with_indexer<F>(mut self, indexer: F) -> Self
    where
        F: Fn(&Table) -> usize + Send + Sync + 'static,
    {
        self.indexer = Some(Arc::new(indexer));
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl fmt::Debug for UniqueElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniqueElements")
            .field("column", &self.column)
            .field("indexer", &self.indexer.as_ref().map(|_| "Fn(&Table) -> usize"))
            .finish()
    }
}

impl Selector for UniqueElements {
    fn select_ids(&self, table: &Table) -> Result<RowIdSet> {
        let groups = table.group_by(&self.column)?;
        let mut selected = RowIdSet::new();
        for group in &groups {
            let rows = group.table();
            let position = self.indexer.as_ref().map_or(0, |indexer| indexer(rows));
            let Some(id) = rows.row_ids().get(position) else {
                return Err(SelectorError::IndexerOutOfRange {
                    group: group.key_string(),
                    position,
                    group_len: rows.num_rows(),
                });
            };
            selected.insert(*id);
        }
        log_debug!(
            component = "unique",
            event = "unique_selected",
            column = %self.column,
            groups = groups.len(),
        );
        Ok(selected)
    }
}
