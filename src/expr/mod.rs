//! Typed expression trees and their evaluation against a [`Batch`].
//!
//! An [`Expr`] is an immutable tree. [`evaluate`] walks it post-order and
//! produces one output column, dispatching every operator over the concrete
//! types of its operands. There is no implicit widening: `Int64 + Float64`
//! fails with `UnsupportedType` and needs an explicit [`Expr::cast`].
//!
//! Null rule: for every arithmetic, comparison, logical, string and temporal
//! operator, a null operand at row `i` yields null at row `i`. Only
//! `IsNull`/`IsNotNull` are null-safe.

mod evaluator;
mod string;
mod temporal;
mod vectorized;

pub(crate) use vectorized::{mean, sample_variance};

use std::fmt;

use arrow::array::ArrayRef;

use crate::batch::Batch;
use crate::config::ExecContext;
use crate::error::Result;
use crate::types::{DataType, ScalarValue};

/// Calendar unit for timestamp and date truncation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruncUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl TruncUnit {
    fn name(self) -> &'static str {
        match self {
            TruncUnit::Year => "year",
            TruncUnit::Month => "month",
            TruncUnit::Day => "day",
            TruncUnit::Hour => "hour",
            TruncUnit::Minute => "minute",
            TruncUnit::Second => "second",
        }
    }
}

/// Single-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Abs,
    Not,
    IsNull,
    IsNotNull,
    Upper,
    Lower,
    Trim,
    TrimStart,
    TrimEnd,
    Length,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    /// ISO weekday, Monday = 1 through Sunday = 7.
    Weekday,
    DayOfYear,
    Truncate(TruncUnit),
    Cast(DataType),
}

impl UnaryOp {
    /// Operator name used in error messages.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            UnaryOp::Neg => "neg".into(),
            UnaryOp::Abs => "abs".into(),
            UnaryOp::Not => "not".into(),
            UnaryOp::IsNull => "is_null".into(),
            UnaryOp::IsNotNull => "is_not_null".into(),
            UnaryOp::Upper => "upper".into(),
            UnaryOp::Lower => "lower".into(),
            UnaryOp::Trim => "trim".into(),
            UnaryOp::TrimStart => "trim_start".into(),
            UnaryOp::TrimEnd => "trim_end".into(),
            UnaryOp::Length => "length".into(),
            UnaryOp::Year => "year".into(),
            UnaryOp::Month => "month".into(),
            UnaryOp::Day => "day".into(),
            UnaryOp::Hour => "hour".into(),
            UnaryOp::Minute => "minute".into(),
            UnaryOp::Second => "second".into(),
            UnaryOp::Weekday => "weekday".into(),
            UnaryOp::DayOfYear => "day_of_year".into(),
            UnaryOp::Truncate(unit) => format!("truncate_{}", unit.name()),
            UnaryOp::Cast(to) => format!("cast_{}", to.name().to_lowercase()),
        }
    }

    fn is_string(self) -> bool {
        matches!(
            self,
            UnaryOp::Upper
                | UnaryOp::Lower
                | UnaryOp::Trim
                | UnaryOp::TrimStart
                | UnaryOp::TrimEnd
                | UnaryOp::Length
        )
    }

    fn is_temporal(self) -> bool {
        matches!(
            self,
            UnaryOp::Year
                | UnaryOp::Month
                | UnaryOp::Day
                | UnaryOp::Hour
                | UnaryOp::Minute
                | UnaryOp::Second
                | UnaryOp::Weekday
                | UnaryOp::DayOfYear
                | UnaryOp::Truncate(_)
        )
    }
}

/// Two-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Contains,
    StartsWith,
    EndsWith,
    Concat,
    RegexMatch,
    AddDays,
    AddMonths,
    DiffDays,
}

impl BinaryOp {
    /// Operator name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::Eq => "eq",
            BinaryOp::NotEq => "neq",
            BinaryOp::Lt => "lt",
            BinaryOp::LtEq => "lte",
            BinaryOp::Gt => "gt",
            BinaryOp::GtEq => "gte",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Contains => "contains",
            BinaryOp::StartsWith => "starts_with",
            BinaryOp::EndsWith => "ends_with",
            BinaryOp::Concat => "concat",
            BinaryOp::RegexMatch => "regex_match",
            BinaryOp::AddDays => "add_days",
            BinaryOp::AddMonths => "add_months",
            BinaryOp::DiffDays => "diff_days",
        }
    }

    fn symbol(self) -> Option<&'static str> {
        match self {
            BinaryOp::Add => Some("+"),
            BinaryOp::Sub => Some("-"),
            BinaryOp::Mul => Some("*"),
            BinaryOp::Div => Some("/"),
            BinaryOp::Mod => Some("%"),
            BinaryOp::Eq => Some("="),
            BinaryOp::NotEq => Some("!="),
            BinaryOp::Lt => Some("<"),
            BinaryOp::LtEq => Some("<="),
            BinaryOp::Gt => Some(">"),
            BinaryOp::GtEq => Some(">="),
            BinaryOp::And => Some("AND"),
            BinaryOp::Or => Some("OR"),
            _ => None,
        }
    }

    /// Returns true for `+ - * / %`.
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    /// Returns true for the six comparison operators.
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    fn is_string(self) -> bool {
        matches!(
            self,
            BinaryOp::Contains
                | BinaryOp::StartsWith
                | BinaryOp::EndsWith
                | BinaryOp::Concat
                | BinaryOp::RegexMatch
        )
    }
}

/// Whole-column operators evaluated with bulk compute kernels.
///
/// Aggregates take one operand and produce a length-1 column; arithmetic
/// operators take two and follow the same rules as their [`BinaryOp`]
/// counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorOp {
    Sum,
    Mean,
    Min,
    Max,
    StdDev,
    Variance,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl VectorOp {
    /// Operator name used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            VectorOp::Sum => "vec_sum",
            VectorOp::Mean => "vec_mean",
            VectorOp::Min => "vec_min",
            VectorOp::Max => "vec_max",
            VectorOp::StdDev => "vec_stddev",
            VectorOp::Variance => "vec_variance",
            VectorOp::Add => "vec_add",
            VectorOp::Sub => "vec_sub",
            VectorOp::Mul => "vec_mul",
            VectorOp::Div => "vec_div",
            VectorOp::Mod => "vec_mod",
        }
    }

    /// Number of operands the operator takes.
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            VectorOp::Sum
            | VectorOp::Mean
            | VectorOp::Min
            | VectorOp::Max
            | VectorOp::StdDev
            | VectorOp::Variance => 1,
            VectorOp::Add | VectorOp::Sub | VectorOp::Mul | VectorOp::Div | VectorOp::Mod => 2,
        }
    }

    fn as_binary(self) -> Option<BinaryOp> {
        match self {
            VectorOp::Add => Some(BinaryOp::Add),
            VectorOp::Sub => Some(BinaryOp::Sub),
            VectorOp::Mul => Some(BinaryOp::Mul),
            VectorOp::Div => Some(BinaryOp::Div),
            VectorOp::Mod => Some(BinaryOp::Mod),
            _ => None,
        }
    }
}

/// An expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a column by name.
    Column(String),
    /// Constant broadcast to the batch's row count.
    Literal(ScalarValue),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Vectorized {
        op: VectorOp,
        operands: Vec<Expr>,
    },
}

/// References a column.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Creates a literal; its type is inferred from the host value.
pub fn lit(value: impl Into<ScalarValue>) -> Expr {
    Expr::Literal(value.into())
}

/// An untyped null literal.
#[must_use]
pub fn null() -> Expr {
    Expr::Literal(ScalarValue::Null)
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    /// Builds a unary expression.
    #[must_use]
    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Builds a binary expression.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Builds a vectorized expression.
    #[must_use]
    pub fn vectorized(op: VectorOp, operands: Vec<Expr>) -> Expr {
        Expr::Vectorized { op, operands }
    }

    pub fn add(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Add, self, other)
    }

    pub fn sub(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Sub, self, other)
    }

    pub fn mul(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Mul, self, other)
    }

    pub fn div(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Div, self, other)
    }

    pub fn modulo(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Mod, self, other)
    }

    pub fn eq(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Eq, self, other)
    }

    pub fn not_eq(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::NotEq, self, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Lt, self, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::LtEq, self, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Gt, self, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::GtEq, self, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::And, self, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Or, self, other)
    }

    pub fn not(self) -> Expr {
        Expr::unary(UnaryOp::Not, self)
    }

    pub fn neg(self) -> Expr {
        Expr::unary(UnaryOp::Neg, self)
    }

    pub fn abs(self) -> Expr {
        Expr::unary(UnaryOp::Abs, self)
    }

    pub fn is_null(self) -> Expr {
        Expr::unary(UnaryOp::IsNull, self)
    }

    pub fn is_not_null(self) -> Expr {
        Expr::unary(UnaryOp::IsNotNull, self)
    }

    pub fn contains(self, pattern: Expr) -> Expr {
        Expr::binary(BinaryOp::Contains, self, pattern)
    }

    pub fn starts_with(self, prefix: Expr) -> Expr {
        Expr::binary(BinaryOp::StartsWith, self, prefix)
    }

    pub fn ends_with(self, suffix: Expr) -> Expr {
        Expr::binary(BinaryOp::EndsWith, self, suffix)
    }

    pub fn concat(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::Concat, self, other)
    }

    pub fn regex_match(self, pattern: Expr) -> Expr {
        Expr::binary(BinaryOp::RegexMatch, self, pattern)
    }

    pub fn upper(self) -> Expr {
        Expr::unary(UnaryOp::Upper, self)
    }

    pub fn lower(self) -> Expr {
        Expr::unary(UnaryOp::Lower, self)
    }

    pub fn trim(self) -> Expr {
        Expr::unary(UnaryOp::Trim, self)
    }

    pub fn trim_start(self) -> Expr {
        Expr::unary(UnaryOp::TrimStart, self)
    }

    pub fn trim_end(self) -> Expr {
        Expr::unary(UnaryOp::TrimEnd, self)
    }

    pub fn length(self) -> Expr {
        Expr::unary(UnaryOp::Length, self)
    }

    pub fn year(self) -> Expr {
        Expr::unary(UnaryOp::Year, self)
    }

    pub fn month(self) -> Expr {
        Expr::unary(UnaryOp::Month, self)
    }

    pub fn day(self) -> Expr {
        Expr::unary(UnaryOp::Day, self)
    }

    pub fn hour(self) -> Expr {
        Expr::unary(UnaryOp::Hour, self)
    }

    pub fn minute(self) -> Expr {
        Expr::unary(UnaryOp::Minute, self)
    }

    pub fn second(self) -> Expr {
        Expr::unary(UnaryOp::Second, self)
    }

    pub fn weekday(self) -> Expr {
        Expr::unary(UnaryOp::Weekday, self)
    }

    pub fn day_of_year(self) -> Expr {
        Expr::unary(UnaryOp::DayOfYear, self)
    }

    pub fn truncate(self, unit: TruncUnit) -> Expr {
        Expr::unary(UnaryOp::Truncate(unit), self)
    }

    pub fn cast(self, to: DataType) -> Expr {
        Expr::unary(UnaryOp::Cast(to), self)
    }

    pub fn add_days(self, days: Expr) -> Expr {
        Expr::binary(BinaryOp::AddDays, self, days)
    }

    pub fn add_months(self, months: Expr) -> Expr {
        Expr::binary(BinaryOp::AddMonths, self, months)
    }

    pub fn diff_days(self, other: Expr) -> Expr {
        Expr::binary(BinaryOp::DiffDays, self, other)
    }

    /// Returns the names of all columns referenced by this expression.
    #[must_use]
    pub fn column_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_column_refs(&mut refs);
        refs
    }

    fn collect_column_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Expr::Column(name) => {
                if !refs.contains(&name.as_str()) {
                    refs.push(name);
                }
            }
            Expr::Literal(_) => {}
            Expr::Unary { operand, .. } => operand.collect_column_refs(refs),
            Expr::Binary { left, right, .. } => {
                left.collect_column_refs(refs);
                right.collect_column_refs(refs);
            }
            Expr::Vectorized { operands, .. } => {
                for operand in operands {
                    operand.collect_column_refs(refs);
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal(ScalarValue::Utf8(s)) => write!(f, "'{s}'"),
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Unary { op, operand } => write!(f, "{}({operand})", op.name()),
            Expr::Binary { op, left, right } => match op.symbol() {
                Some(symbol) => write!(f, "({left} {symbol} {right})"),
                None => write!(f, "{}({left}, {right})", op.name()),
            },
            Expr::Vectorized { op, operands } => {
                write!(f, "{}(", op.name())?;
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{operand}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Evaluates `expr` against `batch`, producing one column of `batch.num_rows()` rows.
///
/// Vectorized aggregates produce a single-row column instead.
///
/// # Errors
///
/// Returns `ColumnNotFound`, `TypeMismatch`, `UnsupportedType`,
/// `LengthMismatch` or `DivisionByZero`; no partial result is produced.
pub fn evaluate(ctx: &ExecContext, expr: &Expr, batch: &Batch) -> Result<ArrayRef> {
    evaluator::Evaluator::new(ctx, batch).evaluate(expr)
}
