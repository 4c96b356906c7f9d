use std::{collections::BTreeMap, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, BooleanArray, RecordBatch, UInt32Array},
    compute::{filter_record_batch, take_record_batch},
    row::{OwnedRow, RowConverter, SortField},
    util::display::array_value_to_string,
};
use arrow_schema::{Field, Schema};
use roaring::RoaringBitmap;

use crate::{
    error::{Result, SelectorError},
    observability::log_trace,
    query::{RowFilter, canonical_zeros, missing_mask, parse},
};

/// Stable handle of one row within a table snapshot.
pub type RowId = u32;

/// Set of row identifiers.
///
/// Limited to `u32::MAX` rows, the range of a `RoaringBitmap`.
pub type RowIdSet = RoaringBitmap;

/// An Arrow record batch whose rows carry stable identifiers.
///
/// Identifiers survive projections: a sub-table produced by [`Table::project`]
/// or [`Table::query`] keeps the identifiers its rows had in the parent table,
/// in the parent's row order.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    batch: RecordBatch,
    row_ids: Arc<[RowId]>,
}

/// Rows of a table sharing the same value in the grouping column.
#[derive(Clone, Debug)]
pub struct Group {
    key: ArrayRef,
    table: Table,
}

impl Group {
    /// The group's key as a single-element array.
    pub fn key(&self) -> &ArrayRef {
        &self.key
    }

    /// Display form of the key.
    pub fn key_string(&self) -> String {
        array_value_to_string(&self.key, 0).unwrap_or_else(|_| format!("{:?}", self.key))
    }

    /// The rows of this group, in table order.
    pub fn table(&self) -> &Table {
        &self.table
    }
}

impl Table {
    /// Wrap a record batch, numbering its rows `0..n`.
    pub fn new(batch: RecordBatch) -> Result<Self> {
        let num_rows = batch.num_rows();
        let Ok(end) = RowId::try_from(num_rows) else {
            return Err(SelectorError::InvalidTable {
                reason: format!("{num_rows} rows exceed the identifier range"),
            });
        };
        Ok(Self {
            batch,
            row_ids: (0..end).collect(),
        })
    }

    /// Wrap a record batch with caller supplied row identifiers.
    ///
    /// Fails if the number of identifiers does not match the number of rows or
    /// if an identifier appears twice.
    pub fn with_row_ids(batch: RecordBatch, row_ids: Vec<RowId>) -> Result<Self> {
        if row_ids.len() != batch.num_rows() {
            return Err(SelectorError::InvalidTable {
                reason: format!(
                    "{} row identifiers for {} rows",
                    row_ids.len(),
                    batch.num_rows()
                ),
            });
        }
        let mut seen = RowIdSet::new();
        for id in &row_ids {
            if !seen.insert(*id) {
                return Err(SelectorError::InvalidTable {
                    reason: format!("duplicate row identifier {id}"),
                });
            }
        }
        Ok(Self {
            batch,
            row_ids: row_ids.into(),
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Row identifiers in table order.
    pub fn row_ids(&self) -> &[RowId] {
        &self.row_ids
    }

    pub fn all_ids(&self) -> RowIdSet {
        self.row_ids.iter().copied().collect()
    }

    /// Identifiers of `ids` present in this table, in table order.
    pub fn ordered_ids(&self, ids: &RowIdSet) -> Vec<RowId> {
        self.row_ids
            .iter()
            .copied()
            .filter(|id| ids.contains(*id))
            .collect()
    }

    pub fn column_by_name(&self, name: &str) -> Result<&ArrayRef> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| SelectorError::column_not_found(name))
    }

    /// Keep the rows whose identifier is in `ids`.
    pub fn project(&self, ids: &RowIdSet) -> Result<Table> {
        let mask: BooleanArray = self
            .row_ids
            .iter()
            .map(|id| Some(ids.contains(*id)))
            .collect();
        self.filter(&mask)
    }

    /// Keep the rows where `mask` is true; null mask slots drop the row.
    pub fn filter(&self, mask: &BooleanArray) -> Result<Table> {
        let batch = filter_record_batch(&self.batch, mask)?;
        let row_ids = self
            .row_ids
            .iter()
            .zip(mask.iter())
            .filter_map(|(id, keep)| (keep == Some(true)).then_some(*id))
            .collect();
        Ok(Table { batch, row_ids })
    }

    /// Rows at the given positions, in the order given.
    pub fn take(&self, positions: &[usize]) -> Result<Table> {
        let mut indices = Vec::with_capacity(positions.len());
        let mut row_ids = Vec::with_capacity(positions.len());
        for &position in positions {
            let id = self.row_ids.get(position).ok_or_else(|| SelectorError::InvalidTable {
                reason: format!("position {position} out of range for {} rows", self.num_rows()),
            })?;
            // positions index a table of at most u32::MAX rows
            indices.push(position as u32);
            row_ids.push(*id);
        }
        let batch = take_record_batch(&self.batch, &UInt32Array::from(indices))?;
        Ok(Table {
            batch,
            row_ids: row_ids.into(),
        })
    }

    /// Rows matching a predicate expression.
    pub fn query(&self, expr: &str) -> Result<Table> {
        let mask = self.query_mask(expr)?;
        self.filter(&mask)
    }

    /// Identifiers of the rows matching a predicate expression.
    pub fn query_ids(&self, expr: &str) -> Result<RowIdSet> {
        let mask = self.query_mask(expr)?;
        Ok(self
            .row_ids
            .iter()
            .zip(mask.iter())
            .filter_map(|(id, keep)| (keep == Some(true)).then_some(*id))
            .collect())
    }

    fn query_mask(&self, expr: &str) -> Result<BooleanArray> {
        let filter = RowFilter::new(parse(expr)?);
        log_trace!(
            component = "table",
            event = "query_evaluated",
            expr = %filter.expr(),
            rows = self.num_rows(),
        );
        filter.filter_batch(&self.batch)
    }

    /// Split the table by the values of a column.
    ///
    /// Groups are ordered by key; rows with a missing key (null, or NaN in a
    /// float column) belong to no group. `-0.0` and `0.0` form one group.
    pub fn group_by(&self, column: &str) -> Result<Vec<Group>> {
        let array = canonical_zeros(self.column_by_name(column)?);
        let missing = missing_mask(&array)?;
        let converter = RowConverter::new(vec![SortField::new(array.data_type().clone())])?;
        let rows = converter.convert_columns(&[Arc::clone(&array)])?;

        let mut groups: BTreeMap<OwnedRow, Vec<usize>> = BTreeMap::new();
        for position in 0..array.len() {
            if missing.value(position) {
                continue;
            }
            groups
                .entry(rows.row(position).owned())
                .or_default()
                .push(position);
        }

        groups
            .into_values()
            .map(|positions| {
                Ok(Group {
                    key: array.slice(positions[0], 1),
                    table: self.take(&positions)?,
                })
            })
            .collect()
    }

    /// Append a column, typically labels produced by [`crate::label_rows`].
    pub fn with_column(&self, name: &str, array: ArrayRef) -> Result<Table> {
        let schema = self.batch.schema();
        let mut fields: Vec<Arc<Field>> = schema.fields().iter().cloned().collect();
        fields.push(Arc::new(Field::new(name, array.data_type().clone(), true)));
        let mut columns = self.batch.columns().to_vec();
        columns.push(array);
        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
        Ok(Table {
            batch,
            row_ids: Arc::clone(&self.row_ids),
        })
    }
}
