//! arrowframe - embeddable columnar query engine
//!
//! Expressions, filters, grouped aggregation, equality joins and window
//! functions over immutable Arrow batches. Operators are synchronous and take
//! an explicit [`ExecContext`] that carries configuration and the memory pool
//! scratch buffers are reserved from.

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod expr;
pub mod frame;
pub mod io;
pub mod memory;
pub mod types;

pub use batch::Batch;
pub use config::{EngineConfig, ExecContext};
pub use error::{EngineError, Result};
pub use executor::{
    filter, join, join_on, AggregateFunction, Aggregation, BatchOperator, GroupBy, JoinType,
    SortKey, Window, WindowExpr, WindowFunction,
};
pub use expr::{col, evaluate, lit, null, BinaryOp, Expr, TruncUnit, UnaryOp, VectorOp};
pub use frame::{DataFrame, GroupedFrame, WindowedFrame};
pub use io::{BatchSink, BatchSource, MemorySink, MemorySource};
pub use memory::{LimitedMemoryPool, MemoryPool, MemoryPressure, MemoryReservation, UnboundedMemoryPool};
pub use types::{DataType, ScalarValue};
