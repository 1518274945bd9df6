//! Executor module for batch operators.
//!
//! Each operator consumes a [`Batch`] and returns a new one; inputs are never
//! mutated. Scratch buffers are reserved from the context's memory pool for
//! the duration of the call.

mod aggregate;
mod filter;
pub(crate) mod keys;
mod join;
mod project;
mod sort;
mod window;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::Result;

pub use aggregate::{AggregateFunction, AggregateOperator, Aggregation, GroupBy};
pub use filter::{filter, FilterOperator};
pub use join::{join, join_on, JoinOperator, JoinType, RIGHT_PREFIX};
pub use project::{DistinctOperator, LimitOperator, ProjectOperator, Projection};
pub use sort::{SortKey, SortOperator};
pub use window::{Window, WindowExpr, WindowFunction, WindowOperator};

/// Trait for single-input operators in a batch pipeline.
pub trait BatchOperator {
    /// Runs the operator over `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not fit the operator (unknown
    /// columns, wrong types) or the memory pool refuses a reservation.
    fn execute(&self, ctx: &ExecContext, input: &Batch) -> Result<Batch>;
}
