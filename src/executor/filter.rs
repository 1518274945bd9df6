//! Filter operator for boolean row selection.

use std::mem::size_of;

use arrow::array::{Array, ArrayRef, BooleanArray, UInt32Array};
use arrow::datatypes::DataType as ArrowDataType;
use tracing::debug;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::executor::BatchOperator;
use crate::expr::{evaluate, Expr};
use crate::types::describe;

/// Keeps rows where `mask` is non-null and true.
///
/// Every column is gathered through the same index list, so the output keeps
/// the input schema and column order.
///
/// # Errors
///
/// Returns `TypeMismatch` if the mask is not boolean and `LengthMismatch` if
/// its length differs from the batch.
pub fn filter(ctx: &ExecContext, batch: &Batch, mask: &ArrayRef) -> Result<Batch> {
    if mask.len() != batch.num_rows() {
        return Err(EngineError::length_mismatch("filter mask", batch.num_rows(), mask.len()));
    }
    // An untyped null mask selects nothing.
    if mask.data_type() == &ArrowDataType::Null {
        return batch.take(&UInt32Array::from(Vec::<u32>::new()));
    }
    let mask = mask
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| EngineError::type_mismatch("filter", "boolean", describe(mask.data_type())))?;

    let selected = mask.true_count();
    let _reservation = ctx.reserve("filter", selected * size_of::<u32>())?;
    let indices: UInt32Array = (0..mask.len())
        .filter(|&row| mask.is_valid(row) && mask.value(row))
        .map(|row| row as u32)
        .collect();
    debug!(input_rows = batch.num_rows(), output_rows = indices.len(), "filtered batch");
    batch.take(&indices)
}

/// Filter operator driven by a predicate expression.
#[derive(Debug, Clone)]
pub struct FilterOperator {
    predicate: Expr,
}

impl FilterOperator {
    /// Creates a new filter operator with the given predicate.
    #[must_use]
    pub fn new(predicate: Expr) -> Self {
        FilterOperator { predicate }
    }
}

impl BatchOperator for FilterOperator {
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch> {
        let mask = evaluate(ctx, &self.predicate, input)?;
        filter(ctx, input, &mask)
    }
}
