//! Hash equality joins and the cross product.
//!
//! The build side is indexed by key hash with row lists kept in ascending
//! order, so every join type emits rows deterministically: probe rows in
//! input order, and within one probe row its matches in build-row order.
//! Null keys never match.

use std::fmt;
use std::mem::size_of;
use std::str::FromStr;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use arrow::array::ArrayRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::{EngineError, Result};
use crate::executor::keys::KeyColumns;
use crate::memory::MemoryReservation;

/// Prefix given to right-side columns whose names collide.
pub const RIGHT_PREFIX: &str = "right_";

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    FullOuter,
    Cross,
}

impl JoinType {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::FullOuter => "full_outer",
            JoinType::Cross => "cross",
        }
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for JoinType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinType::Inner),
            "left" => Ok(JoinType::Left),
            "right" => Ok(JoinType::Right),
            "full" | "outer" | "full_outer" => Ok(JoinType::FullOuter),
            "cross" => Ok(JoinType::Cross),
            other => Err(EngineError::UnsupportedOperation(format!(
                "unknown join type '{other}'"
            ))),
        }
    }
}

/// Joins on a single key pair.
///
/// # Errors
///
/// See [`join_on`].
pub fn join(
    ctx: &ExecContext,
    left: &Batch,
    right: &Batch,
    left_key: &str,
    right_key: &str,
    join_type: JoinType,
) -> Result<Batch> {
    join_on(ctx, left, right, &[(left_key, right_key)], join_type)
}

/// Joins on one or more `(left, right)` key pairs.
///
/// Output holds all left columns followed by all right columns; a right
/// column whose name is already taken is prefixed with `right_` until it is
/// unique. Keys are ignored for [`JoinType::Cross`].
///
/// # Errors
///
/// Returns `ColumnNotFound` for a missing key column, `InvalidJoinKey` for no
/// key pairs or mismatched key types, and `MemoryLimitExceeded` if the hash
/// table or output indices do not fit the pool.
pub fn join_on<L, R>(
    ctx: &ExecContext,
    left: &Batch,
    right: &Batch,
    on: &[(L, R)],
    join_type: JoinType,
) -> Result<Batch>
where
    L: AsRef<str>,
    R: AsRef<str>,
{
    for batch in [left, right] {
        if u32::try_from(batch.num_rows()).is_err() {
            return Err(EngineError::InvalidArgument(format!(
                "join input of {} rows exceeds the index range",
                batch.num_rows()
            )));
        }
    }
    let mut reservation = MemoryReservation::new(Arc::clone(ctx.pool()), "join");
    let pairs = if join_type == JoinType::Cross {
        cross_pairs(left.num_rows(), right.num_rows(), &mut reservation)?
    } else {
        if on.is_empty() {
            return Err(EngineError::InvalidJoinKey("at least one key pair is required".into()));
        }
        let left_names: Vec<&str> = on.iter().map(|(l, _)| l.as_ref()).collect();
        let right_names: Vec<&str> = on.iter().map(|(_, r)| r.as_ref()).collect();
        let left_keys = KeyColumns::new(left, &left_names, "join")?;
        let right_keys = KeyColumns::new(right, &right_names, "join")?;
        for ((l, r), (ln, rn)) in left_keys
            .columns()
            .iter()
            .zip(right_keys.columns())
            .zip(left_names.iter().zip(&right_names))
        {
            if l.data_type() != r.data_type() {
                return Err(EngineError::InvalidJoinKey(format!(
                    "key types differ: '{ln}' is {} but '{rn}' is {}",
                    l.data_type(),
                    r.data_type()
                )));
            }
        }
        hash_pairs(
            &left_keys,
            &right_keys,
            left.num_rows(),
            right.num_rows(),
            join_type,
            &mut reservation,
        )?
    };
    debug!(
        join_type = join_type.name(),
        left_rows = left.num_rows(),
        right_rows = right.num_rows(),
        output_rows = pairs.len(),
        "joined batches"
    );

    let (left_idx, right_idx): (Vec<Option<u32>>, Vec<Option<u32>>) = pairs.into_iter().unzip();
    let left_out = left.take_optional(&left_idx)?;
    let right_out = right.take_optional(&right_idx)?;
    let names = disambiguate(&left_out.column_names(), right_out.column_names());
    let right_columns: Vec<(String, ArrayRef)> = names
        .into_iter()
        .zip(right_out.columns().into_iter().map(|(_, c)| c))
        .collect();
    left_out.append_columns(right_columns)
}

type RowPair = (Option<u32>, Option<u32>);

fn cross_pairs(
    left_rows: usize,
    right_rows: usize,
    reservation: &mut MemoryReservation,
) -> Result<Vec<RowPair>> {
    let total = left_rows
        .checked_mul(right_rows)
        .ok_or_else(|| EngineError::InvalidArgument("cross join output is too large".into()))?;
    reservation.try_grow(total.saturating_mul(size_of::<RowPair>()))?;
    let mut pairs = Vec::with_capacity(total);
    for l in 0..left_rows {
        for r in 0..right_rows {
            pairs.push((Some(l as u32), Some(r as u32)));
        }
    }
    Ok(pairs)
}

/// Hash index over the non-null key rows of one side.
struct JoinIndex {
    buckets: AHashMap<u64, Vec<usize>>,
}

impl JoinIndex {
    fn build(keys: &KeyColumns<'_>, rows: usize) -> Self {
        let mut buckets: AHashMap<u64, Vec<usize>> = AHashMap::new();
        for row in 0..rows {
            if !keys.has_null(row) {
                buckets.entry(keys.hash_row(row)).or_default().push(row);
            }
        }
        JoinIndex { buckets }
    }

    /// Build rows equal to `probe_row`, ascending.
    fn matches<'a>(
        &'a self,
        build: &'a KeyColumns<'a>,
        probe: &'a KeyColumns<'a>,
        probe_row: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        let candidates = if probe.has_null(probe_row) {
            None
        } else {
            self.buckets.get(&probe.hash_row(probe_row))
        };
        candidates
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&b| build.rows_equal(b, probe, probe_row))
    }
}

fn hash_pairs(
    left: &KeyColumns<'_>,
    right: &KeyColumns<'_>,
    left_rows: usize,
    right_rows: usize,
    join_type: JoinType,
    reservation: &mut MemoryReservation,
) -> Result<Vec<RowPair>> {
    let build_rows = if join_type == JoinType::Right { left_rows } else { right_rows };
    reservation.try_grow(build_rows * (size_of::<u64>() + size_of::<usize>()))?;
    let mut pairs: Vec<RowPair> = Vec::new();
    let mut push = |pairs: &mut Vec<RowPair>, pair: RowPair| -> Result<()> {
        if pairs.len() == pairs.capacity() {
            let extra = pairs.capacity().max(64);
            reservation.try_grow(extra * size_of::<RowPair>())?;
            pairs.reserve_exact(extra);
        }
        pairs.push(pair);
        Ok(())
    };

    if join_type == JoinType::Right {
        let index = JoinIndex::build(left, left_rows);
        for r in 0..right_rows {
            let mut matched = false;
            for l in index.matches(left, right, r) {
                matched = true;
                push(&mut pairs, (Some(l as u32), Some(r as u32)))?;
            }
            if !matched {
                push(&mut pairs, (None, Some(r as u32)))?;
            }
        }
        return Ok(pairs);
    }

    let index = JoinIndex::build(right, right_rows);
    let tracked = if join_type == JoinType::FullOuter { right_rows } else { 0 };
    let mut right_matched = vec![false; tracked];
    for l in 0..left_rows {
        let mut matched = false;
        for r in index.matches(right, left, l) {
            matched = true;
            if let Some(flag) = right_matched.get_mut(r) {
                *flag = true;
            }
            push(&mut pairs, (Some(l as u32), Some(r as u32)))?;
        }
        if !matched && join_type != JoinType::Inner {
            push(&mut pairs, (Some(l as u32), None))?;
        }
    }
    for (r, matched) in right_matched.iter().enumerate() {
        if !matched {
            push(&mut pairs, (None, Some(r as u32)))?;
        }
    }
    Ok(pairs)
}

/// Renames right-side names that collide with names already in use.
fn disambiguate(left_names: &[String], right_names: Vec<String>) -> Vec<String> {
    let mut used: AHashSet<String> = left_names.iter().cloned().collect();
    right_names
        .into_iter()
        .map(|mut name| {
            while used.contains(&name) {
                name = format!("{RIGHT_PREFIX}{name}");
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// Operator form of a join over two inputs.
#[derive(Debug, Clone)]
pub struct JoinOperator {
    on: Vec<(String, String)>,
    join_type: JoinType,
}

impl JoinOperator {
    /// Creates a new join operator.
    #[must_use]
    pub fn new(on: Vec<(String, String)>, join_type: JoinType) -> Self {
        JoinOperator { on, join_type }
    }

    /// Joins `left` with `right`.
    ///
    /// # Errors
    ///
    /// See [`join_on`].
    pub fn execute(&self, ctx: &ExecContext, left: &Batch, right: &Batch) -> Result<Batch> {
        join_on(ctx, left, right, &self.on, self.join_type)
    }
}
