//! Logical column types and scalar values.

mod value;

pub use value::{DataType, ScalarValue};

pub(crate) use value::{
    date_from_days, datetime_from_micros, days_from_date, describe, downcast_array, micros_from_datetime,
    MICROS_PER_DAY,
};
