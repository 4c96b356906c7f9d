//! Row-level evaluation of parsed predicates against Arrow record batches.
//!
//! Masks produced here never contain nulls: a comparison touching a missing
//! value (null, or NaN in a floating-point column) is false. Negation is then
//! plain boolean negation, so `~(p)` selects exactly the rows `p` does not.
use std::sync::Arc;

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Datum, RecordBatch, Scalar},
    compute::{
        CastOptions, and, cast_with_options, filter_record_batch, is_null,
        kernels::cmp::{eq, gt, gt_eq, lt, lt_eq, neq},
        not, or, prep_null_mask_filter,
    },
    datatypes::{DataType, Float32Type, Float64Type},
};

use super::expr::{CmpOp, Expr, Literal, Operand};
use crate::error::{Result, SelectorError};

/// Evaluates a predicate expression against record batches.
#[derive(Clone, Debug)]
pub struct RowFilter {
    expr: Expr,
}

/// An evaluated comparison operand.
struct Value {
    array: ArrayRef,
    /// Literals are single-element arrays compared as scalars.
    scalar: bool,
}

impl RowFilter {
    /// Create a new row filter from a parsed expression
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// The expression this filter evaluates.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate the filter against a batch and return a null-free boolean mask
    pub fn filter_batch(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        self.evaluate_expr(&self.expr, batch)
    }

    /// Evaluate and apply the filter, returning only matching rows
    pub fn apply_filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = self.filter_batch(batch)?;
        Ok(filter_record_batch(batch, &mask)?)
    }

    fn evaluate_expr(&self, expr: &Expr, batch: &RecordBatch) -> Result<BooleanArray> {
        match expr {
            Expr::True => Ok(BooleanArray::from(vec![true; batch.num_rows()])),
            Expr::False => Ok(BooleanArray::from(vec![false; batch.num_rows()])),
            Expr::Column(name) => {
                let array = column(batch, name)?;
                let booleans = array.as_boolean_opt().ok_or_else(|| SelectorError::TypeMismatch {
                    left: array.data_type().clone(),
                    right: DataType::Boolean,
                })?;
                Ok(definite(booleans))
            }
            Expr::Cmp { left, op, right } => self.evaluate_cmp(batch, left, *op, right),
            Expr::InList {
                column,
                values,
                negated,
            } => self.evaluate_in_list(batch, column, values, *negated),
            Expr::IsNull { column: name, negated } => {
                let missing = missing_mask(column(batch, name)?)?;
                if *negated {
                    Ok(not(&missing)?)
                } else {
                    Ok(missing)
                }
            }
            Expr::And(exprs) => {
                let mut result = BooleanArray::from(vec![true; batch.num_rows()]);
                for expr in exprs {
                    result = and(&result, &self.evaluate_expr(expr, batch)?)?;
                }
                Ok(result)
            }
            Expr::Or(exprs) => {
                let mut result = BooleanArray::from(vec![false; batch.num_rows()]);
                for expr in exprs {
                    result = or(&result, &self.evaluate_expr(expr, batch)?)?;
                }
                Ok(result)
            }
            Expr::Not(inner) => Ok(not(&self.evaluate_expr(inner, batch)?)?),
        }
    }

    fn evaluate_operand(&self, batch: &RecordBatch, operand: &Operand) -> Result<Value> {
        match operand {
            Operand::Column(name) => Ok(Value {
                array: Arc::clone(column(batch, name)?),
                scalar: false,
            }),
            Operand::Literal(value) => Ok(Value {
                array: value.to_array(),
                scalar: true,
            }),
        }
    }

    fn evaluate_cmp(
        &self,
        batch: &RecordBatch,
        left: &Operand,
        op: CmpOp,
        right: &Operand,
    ) -> Result<BooleanArray> {
        let left = self.evaluate_operand(batch, left)?;
        let right = self.evaluate_operand(batch, right)?;

        let target = common_type(left.array.data_type(), right.array.data_type()).ok_or_else(
            || SelectorError::TypeMismatch {
                left: left.array.data_type().clone(),
                right: right.array.data_type().clone(),
            },
        )?;
        let left = left.cast_to(&target)?;
        let right = right.cast_to(&target)?;

        let result = compare(op, &left, &right)?;
        if left.scalar && right.scalar {
            let matched = result.is_valid(0) && result.value(0);
            return Ok(BooleanArray::from(vec![matched; batch.num_rows()]));
        }

        let mut mask = definite(&result);
        for side in [&left, &right] {
            if !side.scalar {
                mask = and(&mask, &not(&missing_mask(&side.array)?)?)?;
            }
        }
        Ok(mask)
    }

    fn evaluate_in_list(
        &self,
        batch: &RecordBatch,
        name: &str,
        values: &[Literal],
        negated: bool,
    ) -> Result<BooleanArray> {
        let target = Operand::Column(name.to_string());
        // resolve the column up front so an empty list still reports a missing column
        column(batch, name)?;

        let mut result = BooleanArray::from(vec![false; batch.num_rows()]);
        for value in values {
            let matches =
                self.evaluate_cmp(batch, &target, CmpOp::Eq, &Operand::Literal(value.clone()))?;
            result = or(&result, &matches)?;
        }

        if negated {
            Ok(not(&result)?)
        } else {
            Ok(result)
        }
    }
}

impl Value {
    fn cast_to(self, target: &DataType) -> Result<Value> {
        let array = if self.array.data_type() == target {
            self.array
        } else {
            // an unconvertible literal is an error, an unconvertible cell is a missing value
            let options = CastOptions {
                safe: !self.scalar,
                ..Default::default()
            };
            cast_with_options(&self.array, target, &options)?
        };
        // the comparison kernels order floats totally, which puts -0.0 below 0.0
        Ok(Value {
            array: canonical_zeros(&array),
            scalar: self.scalar,
        })
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| SelectorError::column_not_found(name))
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<BooleanArray> {
    let left_scalar;
    let right_scalar;
    let lhs: &dyn Datum = if left.scalar {
        left_scalar = Scalar::new(Arc::clone(&left.array));
        &left_scalar
    } else {
        &left.array
    };
    let rhs: &dyn Datum = if right.scalar {
        right_scalar = Scalar::new(Arc::clone(&right.array));
        &right_scalar
    } else {
        &right.array
    };

    let result = match op {
        CmpOp::Eq => eq(lhs, rhs)?,
        CmpOp::NotEq => neq(lhs, rhs)?,
        CmpOp::Lt => lt(lhs, rhs)?,
        CmpOp::LtEq => lt_eq(lhs, rhs)?,
        CmpOp::Gt => gt(lhs, rhs)?,
        CmpOp::GtEq => gt_eq(lhs, rhs)?,
    };
    Ok(result)
}

/// Replace nulls in a mask by `false`.
fn definite(mask: &BooleanArray) -> BooleanArray {
    if mask.null_count() > 0 {
        prep_null_mask_filter(mask)
    } else {
        mask.clone()
    }
}

/// Floating-point arrays with `-0.0` replaced by `0.0`; other arrays as is.
pub(crate) fn canonical_zeros(array: &ArrayRef) -> ArrayRef {
    match array.data_type() {
        DataType::Float32 => Arc::new(
            array
                .as_primitive::<Float32Type>()
                .unary::<_, Float32Type>(|v| if v == 0.0 { 0.0 } else { v }),
        ),
        DataType::Float64 => Arc::new(
            array
                .as_primitive::<Float64Type>()
                .unary::<_, Float64Type>(|v| if v == 0.0 { 0.0 } else { v }),
        ),
        _ => Arc::clone(array),
    }
}

/// Rows holding no value: nulls, and NaN in floating-point columns.
pub(crate) fn missing_mask(array: &ArrayRef) -> Result<BooleanArray> {
    let nulls = is_null(array.as_ref())?;
    let nan: Option<Vec<bool>> = match array.data_type() {
        DataType::Float32 => Some(
            array
                .as_primitive::<Float32Type>()
                .iter()
                .map(|v| v.is_some_and(f32::is_nan))
                .collect(),
        ),
        DataType::Float64 => Some(
            array
                .as_primitive::<Float64Type>()
                .iter()
                .map(|v| v.is_some_and(f64::is_nan))
                .collect(),
        ),
        _ => None,
    };
    match nan {
        Some(nan) => Ok(or(&nulls, &BooleanArray::from(nan))?),
        None => Ok(nulls),
    }
}

fn is_string(data_type: &DataType) -> bool {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => true,
        DataType::Dictionary(_, values) => is_string(values),
        _ => false,
    }
}

/// Type both sides of a comparison are cast to before comparing.
fn common_type(left: &DataType, right: &DataType) -> Option<DataType> {
    if left == right && !matches!(left, DataType::Dictionary(..)) {
        return Some(left.clone());
    }
    match (left, right) {
        (DataType::Null, other) | (other, DataType::Null) => Some(other.clone()),
        (l, r) if l.is_numeric() && r.is_numeric() => {
            if l.is_integer() && r.is_integer() {
                if l.is_unsigned_integer() && r.is_unsigned_integer() {
                    Some(DataType::UInt64)
                } else {
                    Some(DataType::Int64)
                }
            } else {
                Some(DataType::Float64)
            }
        }
        (l, r) if is_string(l) && is_string(r) => Some(DataType::Utf8),
        (l, r) if l.is_temporal() && is_string(r) => Some(l.clone()),
        (l, r) if is_string(l) && r.is_temporal() => Some(r.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::{Float64Array, Int32Array, StringArray, UInt8Array};
    use arrow_schema::{Field, Schema};

    use super::*;
    use crate::query::parse;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, false),
            Field::new("width", DataType::Float64, true),
            Field::new("name", DataType::Utf8, true),
            Field::new("grade", DataType::UInt8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3, 4, 5])),
                Arc::new(Float64Array::from(vec![
                    Some(1.5),
                    None,
                    Some(f64::NAN),
                    Some(4.0),
                    Some(0.5),
                ])),
                Arc::new(StringArray::from(vec![
                    Some("alice"),
                    Some("bob"),
                    None,
                    Some("admin"),
                    Some("bob"),
                ])),
                Arc::new(UInt8Array::from(vec![3, 1, 4, 1, 5])),
            ],
        )
        .unwrap()
    }

    fn mask(expr: &str) -> Vec<bool> {
        let filter = RowFilter::new(parse(expr).unwrap());
        let result = filter.filter_batch(&batch()).unwrap();
        assert_eq!(result.null_count(), 0);
        result.iter().map(|v| v.unwrap()).collect()
    }

    #[test]
    fn test_equality_filter() {
        assert_eq!(mask("id == 3"), vec![false, false, true, false, false]);
        assert_eq!(mask("3 == id"), vec![false, false, true, false, false]);
    }

    #[test]
    fn test_range_filter_mixes_int_and_float() {
        assert_eq!(mask("id >= 2.5"), vec![false, false, true, true, true]);
        assert_eq!(mask("width > 1"), vec![true, false, false, true, false]);
        assert_eq!(mask("grade < 2"), vec![false, true, false, true, false]);
    }

    #[test]
    fn missing_values_never_match_comparisons() {
        assert_eq!(mask("width == width"), vec![true, false, false, true, true]);
        assert_eq!(mask("name != 'bob'"), vec![true, false, false, true, false]);
    }

    #[test]
    fn negation_is_the_exact_complement() {
        assert_eq!(mask("~(width > 1)"), vec![false, true, true, false, true]);
        assert_eq!(mask("~(name == 'bob')"), vec![true, false, true, true, false]);
    }

    #[test]
    fn negative_zero_equals_zero() {
        let batch = RecordBatch::try_from_iter(vec![(
            "g",
            Arc::new(Float64Array::from(vec![
                Some(1.0),
                Some(f64::NAN),
                None,
                Some(-0.0),
                Some(0.0),
            ])) as ArrayRef,
        )])
        .unwrap();
        let mask = |expr: &str| -> Vec<bool> {
            let filter = RowFilter::new(parse(expr).unwrap());
            filter.filter_batch(&batch).unwrap().iter().map(|v| v.unwrap()).collect()
        };
        assert_eq!(mask("g == 0"), vec![false, false, false, true, true]);
        assert_eq!(mask("g >= 0"), vec![true, false, false, true, true]);
        assert_eq!(mask("g < 0"), vec![false; 5]);
        assert_eq!(mask("g == -0.0"), vec![false, false, false, true, true]);
        assert_eq!(mask("~(g < 0)"), vec![true; 5]);
    }

    #[test]
    fn test_null_checks_treat_nan_as_missing() {
        assert_eq!(mask("isnull(width)"), vec![false, true, true, false, false]);
        assert_eq!(mask("notnull(name)"), vec![true, true, false, true, true]);
    }

    #[test]
    fn test_in_list_filter() {
        assert_eq!(
            mask("name in ['bob', 'admin']"),
            vec![false, true, false, true, true]
        );
        assert_eq!(mask("id not in [1, 5]"), vec![false, true, true, true, false]);
        assert_eq!(mask("id in []"), vec![false; 5]);
    }

    #[test]
    fn test_and_or_filter() {
        assert_eq!(
            mask("(id > 1 & id < 5) | name == 'alice'"),
            vec![true, true, true, true, false]
        );
        assert_eq!(mask("1 == 1"), vec![true; 5]);
        assert_eq!(mask("True & ~False"), vec![true; 5]);
    }

    #[test]
    fn reports_unknown_columns_and_type_mismatches() {
        let filter = RowFilter::new(parse("missing == 1").unwrap());
        assert!(matches!(
            filter.filter_batch(&batch()),
            Err(SelectorError::ColumnNotFound { column_name }) if column_name == "missing"
        ));

        let filter = RowFilter::new(parse("name > 3").unwrap());
        assert!(matches!(
            filter.filter_batch(&batch()),
            Err(SelectorError::TypeMismatch { .. })
        ));

        let filter = RowFilter::new(parse("id").unwrap());
        assert!(matches!(
            filter.filter_batch(&batch()),
            Err(SelectorError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn apply_filter_keeps_matching_rows() {
        let filter = RowFilter::new(parse("name == 'bob'").unwrap());
        let filtered = filter.apply_filter(&batch()).unwrap();
        assert_eq!(filtered.num_rows(), 2);
        let ids = filtered.column(0).as_primitive::<arrow::datatypes::Int32Type>();
        assert_eq!(ids.values().to_vec(), vec![2, 5]);
    }
}
