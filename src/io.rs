//! Storage boundary.
//!
//! Format readers and writers live outside the engine. They hand batches in
//! through [`BatchSource`] and take results through [`BatchSink`]; the
//! in-memory implementations here serve embedding code and tests.

use std::collections::VecDeque;

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use tracing::debug;

use crate::batch::Batch;
use crate::error::{EngineError, Result};

/// A stream of batches, read until it returns `None`.
pub trait BatchSource {
    /// Returns the next batch, or `None` when the stream is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    fn next_batch(&mut self) -> Result<Option<Batch>>;
}

/// A destination for batches.
pub trait BatchSink {
    /// Writes one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be accepted.
    fn write_batch(&mut self, batch: &Batch) -> Result<()>;

    /// Flushes and closes the sink. No batch may be written afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be finalized.
    fn finish(&mut self) -> Result<()>;
}

/// Batches held in memory, yielded front to back.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    batches: VecDeque<Batch>,
}

impl MemorySource {
    #[must_use]
    pub fn new(batches: Vec<Batch>) -> Self {
        MemorySource {
            batches: batches.into(),
        }
    }

    /// Splits `batch` into zero-copy slices of at most `chunk_rows` rows.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `chunk_rows` is zero.
    pub fn chunked(batch: &Batch, chunk_rows: usize) -> Result<Self> {
        if chunk_rows == 0 {
            return Err(EngineError::InvalidArgument("chunk size must be positive".into()));
        }
        let batches = (0..batch.num_rows())
            .step_by(chunk_rows)
            .map(|offset| batch.slice(offset, chunk_rows))
            .collect();
        Ok(MemorySource { batches })
    }

    /// Batches not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl BatchSource for MemorySource {
    fn next_batch(&mut self) -> Result<Option<Batch>> {
        Ok(self.batches.pop_front())
    }
}

/// Collects written batches in memory.
///
/// Every batch must have the schema of the first one.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Vec<Batch>,
    schema: Option<SchemaRef>,
    rows: usize,
    finished: bool,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Total rows written.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Concatenates everything written into one batch.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if concatenation fails.
    pub fn into_batch(self) -> Result<Batch> {
        match self.schema {
            None => Ok(Batch::empty()),
            Some(schema) => {
                let parts: Vec<_> = self.batches.iter().map(Batch::record_batch).collect();
                let merged = concat_batches(&schema, parts)?;
                Batch::from_record_batch(merged)
            }
        }
    }
}

impl BatchSink for MemorySink {
    fn write_batch(&mut self, batch: &Batch) -> Result<()> {
        if self.finished {
            return Err(EngineError::InvalidArgument("write to a finished sink".into()));
        }
        match &self.schema {
            Some(schema) if *schema != batch.schema() => {
                return Err(EngineError::InvalidArgument(format!(
                    "batch schema [{}] does not match sink schema",
                    batch.column_names().join(", ")
                )));
            }
            Some(_) => {}
            None => self.schema = Some(batch.schema()),
        }
        self.rows += batch.num_rows();
        self.batches.push(batch.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        debug!(batches = self.batches.len(), rows = self.rows, "memory sink finished");
        Ok(())
    }
}

/// Reads every batch from `source`.
///
/// # Errors
///
/// Returns the first error raised by the source.
pub fn read_all(source: &mut dyn BatchSource) -> Result<Vec<Batch>> {
    let mut batches = Vec::new();
    while let Some(batch) = source.next_batch()? {
        batches.push(batch);
    }
    Ok(batches)
}

/// Pumps `source` into `sink` through `transform`, then finishes the sink.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns the first error raised by the source, the transform or the sink.
pub fn copy<F>(
    source: &mut dyn BatchSource,
    sink: &mut dyn BatchSink,
    mut transform: F,
) -> Result<usize>
where
    F: FnMut(Batch) -> Result<Batch>,
{
    let mut rows = 0;
    while let Some(batch) = source.next_batch()? {
        let out = transform(batch)?;
        rows += out.num_rows();
        sink.write_batch(&out)?;
    }
    sink.finish()?;
    Ok(rows)
}
