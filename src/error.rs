use arrow_schema::{ArrowError, DataType};
use parquet::errors::ParquetError;
use thiserror::Error;

/// Errors raised while building or evaluating selectors.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// A selector was constructed with invalid arguments.
    ///
    /// Always raised at construction time, never deferred to evaluation.
    #[error("Invalid selector: {reason}")]
    InvalidSelector {
        /// What was wrong with the arguments
        reason: String,
    },

    /// The indexer of a unique-elements selector returned a position that
    /// does not exist in one of the groups.
    #[error(
        "The indexer does not provide an index for all groups: position {position} is out of range for group '{group}' with {group_len} rows"
    )]
    IndexerOutOfRange {
        /// Display form of the offending group key
        group: String,
        /// Position returned by the indexer
        position: usize,
        /// Number of rows in the group
        group_len: usize,
    },

    /// Selectors required to be disjoint select some rows more than once.
    #[error("The selectors overlap on {overlapping} row(s)")]
    OverlappingGroups {
        /// Number of surplus selections (selected rows counted with multiplicity, minus distinct rows)
        overlapping: u64,
    },

    /// The predicate expression could not be parsed.
    #[error("Cannot parse '{expr}' at offset {position}: {message}")]
    Parse {
        /// The full expression
        expr: String,
        /// Byte offset of the problem
        position: usize,
        /// What the parser expected
        message: String,
    },

    /// Column not found in the table
    #[error("Column '{column_name}' not found in table")]
    ColumnNotFound {
        /// Name of the column that was not found
        column_name: String,
    },

    /// Two operands of a comparison have no common type.
    #[error("Cannot compare {left:?} with {right:?}")]
    TypeMismatch {
        /// Type of the left operand
        left: DataType,
        /// Type of the right operand
        right: DataType,
    },

    /// The table could not be constructed.
    #[error("Invalid table: {reason}")]
    InvalidTable {
        /// What was wrong with the table
        reason: String,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
}

impl SelectorError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SelectorError::InvalidSelector {
            reason: reason.into(),
        }
    }

    pub(crate) fn column_not_found(column_name: impl Into<String>) -> Self {
        SelectorError::ColumnNotFound {
            column_name: column_name.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = SelectorError> = std::result::Result<T, E>;
