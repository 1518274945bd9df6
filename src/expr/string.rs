//! String operators over Utf8 columns.

use std::sync::Arc;

use ahash::AHashMap;
use arrow::array::{Array, ArrayRef, Int64Builder, StringArray, StringBuilder};
use regex::Regex;

use super::evaluator::boolean_rows;
use super::{BinaryOp, UnaryOp};
use crate::error::{EngineError, Result};
use crate::types::describe;

/// Compiled patterns keyed by their source text.
///
/// Each distinct pattern is compiled at most once while it stays cached.
/// When the cache is full it is cleared before the next insert.
#[derive(Debug)]
pub(crate) struct RegexCache {
    capacity: usize,
    patterns: AHashMap<String, Regex>,
}

impl RegexCache {
    pub(crate) fn new(capacity: usize) -> Self {
        RegexCache {
            capacity: capacity.max(1),
            patterns: AHashMap::new(),
        }
    }

    pub(crate) fn get(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let regex = Regex::new(pattern).map_err(|e| {
                EngineError::InvalidArgument(format!("invalid regex pattern '{pattern}': {e}"))
            })?;
            if self.patterns.len() >= self.capacity {
                self.patterns.clear();
            }
            self.patterns.insert(pattern.to_string(), regex);
        }
        self.patterns
            .get(pattern)
            .ok_or_else(|| EngineError::InvalidArgument(format!("regex pattern '{pattern}' evicted")))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.patterns.len()
    }
}

fn utf8<'a>(array: &'a ArrayRef, op: &str) -> Result<&'a StringArray> {
    array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| EngineError::type_mismatch(op, "string", describe(array.data_type())))
}

pub(super) fn unary(op: UnaryOp, array: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    let strings = utf8(array, &name)?;
    if op == UnaryOp::Length {
        let mut builder = Int64Builder::with_capacity(strings.len());
        for value in strings.iter() {
            builder.append_option(value.map(|s| s.chars().count() as i64));
        }
        return Ok(Arc::new(builder.finish()));
    }
    let transform: fn(&str) -> String = match op {
        UnaryOp::Upper => str::to_uppercase,
        UnaryOp::Lower => str::to_lowercase,
        UnaryOp::Trim => |s| s.trim().to_string(),
        UnaryOp::TrimStart => |s| s.trim_start().to_string(),
        UnaryOp::TrimEnd => |s| s.trim_end().to_string(),
        _ => return Err(EngineError::unsupported_type(name, "Utf8")),
    };
    let mut builder = StringBuilder::with_capacity(strings.len(), strings.value_data().len());
    for value in strings.iter() {
        match value {
            Some(s) => builder.append_value(transform(s)),
            None => builder.append_null(),
        }
    }
    Ok(Arc::new(builder.finish()))
}

pub(super) fn binary(
    op: BinaryOp,
    left: &ArrayRef,
    right: &ArrayRef,
    regexes: &mut RegexCache,
) -> Result<ArrayRef> {
    let name = op.name();
    let l = utf8(left, name)?;
    let r = utf8(right, name)?;
    let out: ArrayRef = match op {
        BinaryOp::Concat => {
            let mut builder = StringBuilder::with_capacity(
                l.len(),
                l.value_data().len() + r.value_data().len(),
            );
            for row in 0..l.len() {
                if l.is_null(row) || r.is_null(row) {
                    builder.append_null();
                } else {
                    builder.append_value(format!("{}{}", l.value(row), r.value(row)));
                }
            }
            Arc::new(builder.finish())
        }
        BinaryOp::RegexMatch => Arc::new(boolean_rows(l.len(), |row| {
            if l.is_null(row) || r.is_null(row) {
                return Ok(None);
            }
            Ok(Some(regexes.get(r.value(row))?.is_match(l.value(row))))
        })?),
        BinaryOp::Contains | BinaryOp::StartsWith | BinaryOp::EndsWith => {
            Arc::new(boolean_rows(l.len(), |row| {
                if l.is_null(row) || r.is_null(row) {
                    return Ok(None);
                }
                let (s, p) = (l.value(row), r.value(row));
                Ok(Some(match op {
                    BinaryOp::Contains => s.contains(p),
                    BinaryOp::StartsWith => s.starts_with(p),
                    _ => s.ends_with(p),
                }))
            })?)
        }
        other => return Err(EngineError::unsupported_type(other.name(), "Utf8 and Utf8")),
    };
    Ok(out)
}
