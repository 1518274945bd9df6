//! `DataType` and `ScalarValue` definitions.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use arrow::array::{
    new_null_array, Array, ArrayRef, BooleanArray, BooleanBuilder, Date32Array, Date32Builder,
    Float64Array, Float64Builder, Int64Array, Int64Builder, StringArray, StringBuilder,
    TimestampMicrosecondArray, TimestampMicrosecondBuilder,
};
use arrow::datatypes::{DataType as ArrowDataType, TimeUnit};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Microseconds in one day.
pub(crate) const MICROS_PER_DAY: i64 = 86_400_000_000;

/// Column types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point.
    Float64,
    /// UTF-8 string.
    Utf8,
    /// Boolean.
    Boolean,
    /// Date (stored as days since epoch).
    Date,
    /// Timestamp (stored as microseconds since epoch, no time zone).
    Timestamp,
    /// Type of an untyped null literal.
    Null,
}

impl DataType {
    /// Returns the display name of the data type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Int64 => "Int64",
            DataType::Float64 => "Float64",
            DataType::Utf8 => "Utf8",
            DataType::Boolean => "Boolean",
            DataType::Date => "Date",
            DataType::Timestamp => "Timestamp",
            DataType::Null => "Null",
        }
    }

    /// Returns whether this type is numeric.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }

    /// Returns whether this type is a date or timestamp.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self, DataType::Date | DataType::Timestamp)
    }

    /// Converts to an Arrow data type.
    #[must_use]
    pub fn to_arrow(&self) -> ArrowDataType {
        match self {
            DataType::Int64 => ArrowDataType::Int64,
            DataType::Float64 => ArrowDataType::Float64,
            DataType::Utf8 => ArrowDataType::Utf8,
            DataType::Boolean => ArrowDataType::Boolean,
            DataType::Date => ArrowDataType::Date32,
            DataType::Timestamp => ArrowDataType::Timestamp(TimeUnit::Microsecond, None),
            DataType::Null => ArrowDataType::Null,
        }
    }

    /// Converts from an Arrow data type.
    ///
    /// Returns None for Arrow types the engine does not dispatch on.
    #[must_use]
    pub fn from_arrow(arrow_type: &ArrowDataType) -> Option<Self> {
        match arrow_type {
            ArrowDataType::Int64 => Some(DataType::Int64),
            ArrowDataType::Float64 => Some(DataType::Float64),
            ArrowDataType::Utf8 => Some(DataType::Utf8),
            ArrowDataType::Boolean => Some(DataType::Boolean),
            ArrowDataType::Date32 => Some(DataType::Date),
            ArrowDataType::Timestamp(TimeUnit::Microsecond, _) => Some(DataType::Timestamp),
            ArrowDataType::Null => Some(DataType::Null),
            _ => None,
        }
    }

    /// Resolves the engine type of an array, failing for unsupported Arrow types.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` naming `op` if the array type is not supported.
    pub fn of(array: &dyn Array, op: &str) -> Result<Self> {
        Self::from_arrow(array.data_type())
            .ok_or_else(|| EngineError::unsupported_type(op, format!("{}", array.data_type())))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Describes an Arrow type for error messages, preferring engine type names.
pub(crate) fn describe(arrow_type: &ArrowDataType) -> String {
    DataType::from_arrow(arrow_type).map_or_else(|| arrow_type.to_string(), |t| t.name().to_string())
}

/// Converts a day count since the Unix epoch into a calendar date.
pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Converts a calendar date into a day count since the Unix epoch.
pub(crate) fn days_from_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Converts microseconds since the Unix epoch into a naive date-time.
pub(crate) fn datetime_from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// Converts a naive date-time into microseconds since the Unix epoch.
pub(crate) fn micros_from_datetime(datetime: NaiveDateTime) -> i64 {
    datetime.and_utc().timestamp_micros()
}

/// Runtime value container for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// 64-bit signed integer value.
    Int64(i64),
    /// 64-bit floating point value.
    Float64(f64),
    /// String value.
    Utf8(String),
    /// Boolean value.
    Boolean(bool),
    /// Date value (days since Unix epoch).
    Date(i32),
    /// Timestamp value (microseconds since Unix epoch).
    Timestamp(i64),
    /// Null value.
    Null,
}

impl ScalarValue {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Returns the data type of this value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Date(_) => DataType::Date,
            ScalarValue::Timestamp(_) => DataType::Timestamp,
            ScalarValue::Null => DataType::Null,
        }
    }

    /// Compares two values of the same type.
    ///
    /// Returns None if either value is null or types don't match.
    #[must_use]
    pub fn compare(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Int64(a), ScalarValue::Int64(b))
            | (ScalarValue::Timestamp(a), ScalarValue::Timestamp(b)) => Some(a.cmp(b)),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => a.partial_cmp(b),
            (ScalarValue::Boolean(a), ScalarValue::Boolean(b)) => Some(a.cmp(b)),
            (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => Some(a.cmp(b)),
            (ScalarValue::Date(a), ScalarValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Reads the value at `row` of an array.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` for Arrow types outside the engine's type set.
    pub fn try_from_array(array: &dyn Array, row: usize) -> Result<Self> {
        let data_type = DataType::of(array, "scalar access")?;
        if data_type == DataType::Null || array.is_null(row) {
            return Ok(ScalarValue::Null);
        }
        let value = match data_type {
            DataType::Int64 => ScalarValue::Int64(downcast_array::<Int64Array>(array, "scalar access")?.value(row)),
            DataType::Float64 => ScalarValue::Float64(downcast_array::<Float64Array>(array, "scalar access")?.value(row)),
            DataType::Utf8 => {
                ScalarValue::Utf8(downcast_array::<StringArray>(array, "scalar access")?.value(row).to_string())
            }
            DataType::Boolean => ScalarValue::Boolean(downcast_array::<BooleanArray>(array, "scalar access")?.value(row)),
            DataType::Date => ScalarValue::Date(downcast_array::<Date32Array>(array, "scalar access")?.value(row)),
            DataType::Timestamp => {
                ScalarValue::Timestamp(downcast_array::<TimestampMicrosecondArray>(array, "scalar access")?.value(row))
            }
            DataType::Null => ScalarValue::Null,
        };
        Ok(value)
    }

    /// Broadcasts this value into an array of `len` rows.
    #[must_use]
    pub fn to_array(&self, len: usize) -> ArrayRef {
        match self {
            ScalarValue::Int64(v) => Arc::new(Int64Array::from(vec![*v; len])),
            ScalarValue::Float64(v) => Arc::new(Float64Array::from(vec![*v; len])),
            ScalarValue::Utf8(v) => Arc::new(StringArray::from(vec![v.as_str(); len])),
            ScalarValue::Boolean(v) => Arc::new(BooleanArray::from(vec![*v; len])),
            ScalarValue::Date(v) => Arc::new(Date32Array::from(vec![*v; len])),
            ScalarValue::Timestamp(v) => Arc::new(TimestampMicrosecondArray::from(vec![*v; len])),
            ScalarValue::Null => new_null_array(&ArrowDataType::Null, len),
        }
    }

    /// Builds an array of `data_type` from a sequence of values.
    ///
    /// `Null` entries become null slots.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if a non-null value is not of `data_type`.
    pub fn iter_to_array(
        data_type: DataType,
        values: impl IntoIterator<Item = ScalarValue>,
    ) -> Result<ArrayRef> {
        let values = values.into_iter();
        let mismatch = |v: &ScalarValue| {
            EngineError::type_mismatch("array construction", data_type.name(), v.data_type().name())
        };
        let array: ArrayRef = match data_type {
            DataType::Int64 => {
                let mut builder = Int64Builder::with_capacity(values.size_hint().0);
                for v in values {
                    match v {
                        ScalarValue::Int64(i) => builder.append_value(i),
                        ScalarValue::Null => builder.append_null(),
                        other => return Err(mismatch(&other)),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Float64 => {
                let mut builder = Float64Builder::with_capacity(values.size_hint().0);
                for v in values {
                    match v {
                        ScalarValue::Float64(f) => builder.append_value(f),
                        ScalarValue::Null => builder.append_null(),
                        other => return Err(mismatch(&other)),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Utf8 => {
                let mut builder = StringBuilder::new();
                for v in values {
                    match v {
                        ScalarValue::Utf8(s) => builder.append_value(s),
                        ScalarValue::Null => builder.append_null(),
                        other => return Err(mismatch(&other)),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Boolean => {
                let mut builder = BooleanBuilder::with_capacity(values.size_hint().0);
                for v in values {
                    match v {
                        ScalarValue::Boolean(b) => builder.append_value(b),
                        ScalarValue::Null => builder.append_null(),
                        other => return Err(mismatch(&other)),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Date => {
                let mut builder = Date32Builder::with_capacity(values.size_hint().0);
                for v in values {
                    match v {
                        ScalarValue::Date(d) => builder.append_value(d),
                        ScalarValue::Null => builder.append_null(),
                        other => return Err(mismatch(&other)),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Timestamp => {
                let mut builder = TimestampMicrosecondBuilder::with_capacity(values.size_hint().0);
                for v in values {
                    match v {
                        ScalarValue::Timestamp(t) => builder.append_value(t),
                        ScalarValue::Null => builder.append_null(),
                        other => return Err(mismatch(&other)),
                    }
                }
                Arc::new(builder.finish())
            }
            DataType::Null => {
                let mut len = 0;
                for v in values {
                    if !v.is_null() {
                        return Err(mismatch(&v));
                    }
                    len += 1;
                }
                new_null_array(&ArrowDataType::Null, len)
            }
        };
        Ok(array)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => f.write_str(v),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
            ScalarValue::Date(v) => match date_from_days(*v) {
                Some(date) => write!(f, "{date}"),
                None => write!(f, "date({v})"),
            },
            ScalarValue::Timestamp(v) => match datetime_from_micros(*v) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
                None => write!(f, "timestamp({v})"),
            },
            ScalarValue::Null => f.write_str("null"),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int64(i64::from(v))
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Boolean(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(v: NaiveDate) -> Self {
        ScalarValue::Date(days_from_date(v))
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(v: NaiveDateTime) -> Self {
        ScalarValue::Timestamp(micros_from_datetime(v))
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ScalarValue::Null, Into::into)
    }
}

/// Downcasts an array to its concrete Arrow type.
pub(crate) fn downcast_array<'a, T: 'static>(array: &'a dyn Array, op: &str) -> Result<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| EngineError::unsupported_type(op, describe(array.data_type())))
}
