//! Date and timestamp operators.
//!
//! Dates are days since the Unix epoch, timestamps microseconds since the
//! epoch without a time zone. Calendar math goes through chrono.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, Int64Array, TimestampMicrosecondArray};
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, Timelike};

use super::evaluator::{binary_rows, unary_rows};
use super::{BinaryOp, TruncUnit, UnaryOp};
use crate::error::{EngineError, Result};
use crate::types::{
    date_from_days, datetime_from_micros, days_from_date, describe, downcast_array,
    micros_from_datetime, DataType, MICROS_PER_DAY,
};

const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

fn out_of_range(what: &str, row: usize) -> EngineError {
    EngineError::UnsupportedOperation(format!("{what} at row {row} is out of range"))
}

fn date_at(row: usize, days: i32) -> Result<NaiveDate> {
    date_from_days(days).ok_or_else(|| out_of_range("date", row))
}

fn datetime_at(row: usize, micros: i64) -> Result<NaiveDateTime> {
    datetime_from_micros(micros).ok_or_else(|| out_of_range("timestamp", row))
}

fn temporal_type(array: &ArrayRef, op: &str) -> Result<DataType> {
    match DataType::from_arrow(array.data_type()) {
        Some(t) if t.is_temporal() => Ok(t),
        _ => Err(EngineError::type_mismatch(
            op,
            "temporal",
            describe(array.data_type()),
        )),
    }
}

fn extract_date(op: UnaryOp, date: NaiveDate) -> i64 {
    let value = match op {
        UnaryOp::Year => return i64::from(date.year()),
        UnaryOp::Month => date.month(),
        UnaryOp::Day => date.day(),
        UnaryOp::Weekday => date.weekday().number_from_monday(),
        UnaryOp::DayOfYear => date.ordinal(),
        _ => 0,
    };
    i64::from(value)
}

fn extract_datetime(op: UnaryOp, datetime: NaiveDateTime) -> i64 {
    match op {
        UnaryOp::Hour => i64::from(datetime.hour()),
        UnaryOp::Minute => i64::from(datetime.minute()),
        UnaryOp::Second => i64::from(datetime.second()),
        op => extract_date(op, datetime.date()),
    }
}

fn truncate_date(unit: TruncUnit, date: NaiveDate) -> NaiveDate {
    match unit {
        TruncUnit::Year => date.with_ordinal(1).unwrap_or(date),
        TruncUnit::Month => date.with_day(1).unwrap_or(date),
        TruncUnit::Day | TruncUnit::Hour | TruncUnit::Minute | TruncUnit::Second => date,
    }
}

fn truncate_micros(row: usize, unit: TruncUnit, micros: i64) -> Result<i64> {
    let step = match unit {
        TruncUnit::Year | TruncUnit::Month => {
            let date = truncate_date(unit, datetime_at(row, micros)?.date());
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| out_of_range("timestamp", row))?;
            return Ok(micros_from_datetime(midnight));
        }
        TruncUnit::Day => MICROS_PER_DAY,
        TruncUnit::Hour => MICROS_PER_HOUR,
        TruncUnit::Minute => MICROS_PER_MINUTE,
        TruncUnit::Second => MICROS_PER_SECOND,
    };
    micros
        .checked_sub(micros.rem_euclid(step))
        .ok_or_else(|| out_of_range("timestamp", row))
}

pub(super) fn unary(op: UnaryOp, array: &ArrayRef) -> Result<ArrayRef> {
    let name = op.name();
    let data_type = temporal_type(array, &name)?;
    match (op, data_type) {
        (UnaryOp::Truncate(unit), DataType::Date) => {
            let dates = downcast_array::<Date32Array>(array.as_ref(), &name)?;
            let out: Date32Array = unary_rows(dates, |row, days: i32| {
                Ok(days_from_date(truncate_date(unit, date_at(row, days)?)))
            })?;
            Ok(Arc::new(out))
        }
        (UnaryOp::Truncate(unit), _) => {
            let stamps = downcast_array::<TimestampMicrosecondArray>(array.as_ref(), &name)?;
            let out: TimestampMicrosecondArray =
                unary_rows(stamps, |row, micros: i64| truncate_micros(row, unit, micros))?;
            Ok(Arc::new(out))
        }
        (op, DataType::Date) => {
            let dates = downcast_array::<Date32Array>(array.as_ref(), &name)?;
            let out: Int64Array =
                unary_rows(dates, |row, days: i32| Ok(extract_date(op, date_at(row, days)?)))?;
            Ok(Arc::new(out))
        }
        (op, _) => {
            let stamps = downcast_array::<TimestampMicrosecondArray>(array.as_ref(), &name)?;
            let out: Int64Array = unary_rows(stamps, |row, micros: i64| {
                Ok(extract_datetime(op, datetime_at(row, micros)?))
            })?;
            Ok(Arc::new(out))
        }
    }
}

fn shift_months<T>(row: usize, value: T, months: i64, what: &str) -> Result<T>
where
    T: ShiftMonths,
{
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| out_of_range(what, row))?;
    let shifted = if months >= 0 {
        value.add_months(Months::new(magnitude))
    } else {
        value.sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| out_of_range(what, row))
}

/// Month arithmetic shared by dates and date-times; chrono clamps the day.
trait ShiftMonths: Sized {
    fn add_months(self, months: Months) -> Option<Self>;
    fn sub_months(self, months: Months) -> Option<Self>;
}

impl ShiftMonths for NaiveDate {
    fn add_months(self, months: Months) -> Option<Self> {
        self.checked_add_months(months)
    }

    fn sub_months(self, months: Months) -> Option<Self> {
        self.checked_sub_months(months)
    }
}

impl ShiftMonths for NaiveDateTime {
    fn add_months(self, months: Months) -> Option<Self> {
        self.checked_add_months(months)
    }

    fn sub_months(self, months: Months) -> Option<Self> {
        self.checked_sub_months(months)
    }
}

fn shift(op: BinaryOp, left: &ArrayRef, right: &ArrayRef, left_type: DataType) -> Result<ArrayRef> {
    let name = op.name();
    let amounts = right
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| {
            EngineError::unsupported_type(
                name,
                format!("{left_type} and {}", describe(right.data_type())),
            )
        })?;
    if left_type == DataType::Date {
        let dates = downcast_array::<Date32Array>(left.as_ref(), name)?;
        let out: Date32Array = binary_rows(dates, amounts, |row, days: i32, n: i64| {
            if op == BinaryOp::AddDays {
                return i64::from(days)
                    .checked_add(n)
                    .and_then(|d| i32::try_from(d).ok())
                    .ok_or_else(|| out_of_range("date", row));
            }
            let date = shift_months(row, date_at(row, days)?, n, "date")?;
            Ok(days_from_date(date))
        })?;
        return Ok(Arc::new(out));
    }
    let stamps = downcast_array::<TimestampMicrosecondArray>(left.as_ref(), name)?;
    let out: TimestampMicrosecondArray = binary_rows(stamps, amounts, |row, micros: i64, n: i64| {
        if op == BinaryOp::AddDays {
            return n
                .checked_mul(MICROS_PER_DAY)
                .and_then(|delta| micros.checked_add(delta))
                .ok_or_else(|| out_of_range("timestamp", row));
        }
        let datetime = shift_months(row, datetime_at(row, micros)?, n, "timestamp")?;
        Ok(micros_from_datetime(datetime))
    })?;
    Ok(Arc::new(out))
}

fn diff_days(left: &ArrayRef, right: &ArrayRef, left_type: DataType) -> Result<ArrayRef> {
    let name = BinaryOp::DiffDays.name();
    let right_type = DataType::of(right.as_ref(), name)?;
    if left_type != right_type {
        return Err(EngineError::unsupported_type(
            name,
            format!("{left_type} and {right_type}"),
        ));
    }
    let out: Int64Array = if left_type == DataType::Date {
        let l = downcast_array::<Date32Array>(left.as_ref(), name)?;
        let r = downcast_array::<Date32Array>(right.as_ref(), name)?;
        binary_rows(l, r, |_, a: i32, b: i32| Ok(i64::from(a) - i64::from(b)))?
    } else {
        let l = downcast_array::<TimestampMicrosecondArray>(left.as_ref(), name)?;
        let r = downcast_array::<TimestampMicrosecondArray>(right.as_ref(), name)?;
        binary_rows(l, r, |_, a: i64, b: i64| {
            let days = (i128::from(a) - i128::from(b)) / i128::from(MICROS_PER_DAY);
            // |a - b| / MICROS_PER_DAY always fits in i64.
            Ok(days as i64)
        })?
    };
    Ok(Arc::new(out))
}

pub(super) fn binary(op: BinaryOp, left: &ArrayRef, right: &ArrayRef) -> Result<ArrayRef> {
    let left_type = temporal_type(left, op.name())?;
    match op {
        BinaryOp::AddDays | BinaryOp::AddMonths => shift(op, left, right, left_type),
        BinaryOp::DiffDays => diff_days(left, right, left_type),
        other => Err(EngineError::unsupported_type(
            other.name(),
            format!("{left_type} and {}", describe(right.data_type())),
        )),
    }
}
