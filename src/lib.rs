//! Composable row selectors for Arrow tables.
//!
//! A [`Selector`] picks a subset of the rows of a [`Table`]. Selectors are
//! combined through [`SelectorRef`] into new selectors with `&` (intersection),
//! `|` (union) and `!` (complement). Selectors that are predicate expressions,
//! such as [`Query`] and the column selectors in [`selectors`], fold into a
//! single expression when combined with each other.
//!
//! ```
//! use std::sync::Arc;
//!
//! use arrow::array::{ArrayRef, Float64Array, RecordBatch, StringArray};
//! use rowselect::{Query, RangeQuery, Sample, Selector, Table, UniqueElements};
//!
//! let batch = RecordBatch::try_from_iter(vec![
//!     (
//!         "species",
//!         Arc::new(StringArray::from(vec!["setosa", "virginica", "setosa", "versicolor"])) as ArrayRef,
//!     ),
//!     (
//!         "petal.length",
//!         Arc::new(Float64Array::from(vec![1.4, 6.0, 1.3, 4.5])) as ArrayRef,
//!     ),
//! ])
//! .unwrap();
//! let table = Table::new(batch).unwrap();
//!
//! let setosa = Query::new("species == 'setosa'").into_ref();
//! let long = RangeQuery::builder("petal.length").unwrap().min(4).build().unwrap().into_ref();
//!
//! assert_eq!(setosa.select(&table).unwrap().num_rows(), 2);
//! assert_eq!((&setosa | &long).select_ids(&table).unwrap().len(), 4);
//! assert_eq!((!&setosa & long.clone()).select_ids(&table).unwrap().len(), 2);
//!
//! let one_per_species = UniqueElements::new("species");
//! assert_eq!(one_per_species.select_ids(&table).unwrap().len(), 3);
//!
//! let picked = Sample::new(1).with_seed(3) << long;
//! assert_eq!(picked.select_ids(&table).unwrap().len(), 1);
//! ```
mod combinator;
mod error;
mod io;
mod labels;
mod localize;
mod observability;
mod predicate;
pub mod query;
mod sample;
mod selector;
pub mod selectors;
mod table;
mod unique;

pub use combinator::{Complement, Intersection, Union};
pub use error::{Result, SelectorError};
pub use labels::{RowLabels, are_disjoint_groups, group_rows, label_rows};
pub use localize::{ColumnBinding, ColumnPresets, ColumnPresetsBuilder, Localizable, Localized};
pub use predicate::Query;
pub use sample::{Sample, SampleBuilder};
pub use selector::{Selector, SelectorRef};
pub use selectors::{
    Categorical, CategoryValue, Encoding, Equals, HasValue, RangeQuery, RangeQueryBuilder, Sex,
};
pub use table::{Group, RowId, RowIdSet, Table};
pub use unique::UniqueElements;
