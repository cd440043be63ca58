//! Shared numeric helpers for SUM and AVG.
//!
//! This module is the single source of truth for how aggregate arithmetic
//! widens and combines numbers, so SUM and AVG agree on every input type.
//! Running sums are exact for INTEGER, BIGINT and DECIMAL inputs; only DOUBLE
//! sums round.

use super::value::{struct_field, SqlValue};
use crate::velostream::sql::execution::types::{FieldValue, SqlType, MAX_DECIMAL_PRECISION};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// A numeric input type that SUM and AVG can accumulate.
///
/// `add` must be associative and commutative over `Sum`. Integer sums wrap in
/// two's complement so overflow cannot break merge order independence.
pub trait Summable: SqlValue {
    /// Running sum carried in the aggregate state.
    type Sum: SqlValue + PartialEq;
    /// Value SUM emits.
    type Total: SqlValue;

    /// Lift one input into a sum. `scale` is the declared DECIMAL scale and is
    /// zero for every other type.
    fn lift(self, scale: u32) -> Self::Sum;

    fn add(left: Self::Sum, right: Self::Sum) -> Self::Sum;

    /// The emitted SUM, or `None` when it does not fit the result type.
    fn total(sum: &Self::Sum, scale: u32) -> Option<Self::Total>;

    /// The sum as a DOUBLE, for AVG.
    fn to_f64(sum: &Self::Sum, scale: u32) -> Option<f64>;
}

impl Summable for i32 {
    type Sum = i64;
    type Total = i64;

    #[inline]
    fn lift(self, _scale: u32) -> i64 {
        i64::from(self)
    }

    #[inline]
    fn add(left: i64, right: i64) -> i64 {
        left.wrapping_add(right)
    }

    fn total(sum: &i64, _scale: u32) -> Option<i64> {
        Some(*sum)
    }

    fn to_f64(sum: &i64, _scale: u32) -> Option<f64> {
        Some(*sum as f64)
    }
}

impl Summable for i64 {
    type Sum = i64;
    type Total = i64;

    #[inline]
    fn lift(self, _scale: u32) -> i64 {
        self
    }

    #[inline]
    fn add(left: i64, right: i64) -> i64 {
        left.wrapping_add(right)
    }

    fn total(sum: &i64, _scale: u32) -> Option<i64> {
        Some(*sum)
    }

    fn to_f64(sum: &i64, _scale: u32) -> Option<f64> {
        Some(*sum as f64)
    }
}

impl Summable for f64 {
    type Sum = f64;
    type Total = f64;

    #[inline]
    fn lift(self, _scale: u32) -> f64 {
        self
    }

    #[inline]
    fn add(left: f64, right: f64) -> f64 {
        left + right
    }

    fn total(sum: &f64, _scale: u32) -> Option<f64> {
        Some(*sum)
    }

    fn to_f64(sum: &f64, _scale: u32) -> Option<f64> {
        Some(*sum)
    }
}

impl Summable for Decimal {
    type Sum = DecimalSum;
    type Total = Decimal;

    #[inline]
    fn lift(self, scale: u32) -> DecimalSum {
        DecimalSum::from_decimal(self, scale)
    }

    #[inline]
    fn add(left: DecimalSum, right: DecimalSum) -> DecimalSum {
        left.add(right)
    }

    fn total(sum: &DecimalSum, scale: u32) -> Option<Decimal> {
        sum.to_decimal(scale)
    }

    fn to_f64(sum: &DecimalSum, scale: u32) -> Option<f64> {
        if sum.overflowed {
            return None;
        }
        Some(sum.unscaled as f64 / 10f64.powi(scale as i32))
    }
}

const HIGH_FIELD: &str = "HIGH";
const LOW_FIELD: &str = "LOW";
const OVERFLOW_FIELD: &str = "OVERFLOW";

/// Exact running sum of DECIMAL values at the declared scale.
///
/// The unscaled total is an `i128` that wraps, like BIGINT sums. Partial sums
/// never round or saturate, so a total that leaves the DECIMAL range mid-way
/// and comes back is still exact. An input that cannot be represented at the
/// declared scale sets `overflowed`, which every later `add` keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalSum {
    pub unscaled: i128,
    pub overflowed: bool,
}

impl DecimalSum {
    pub const ZERO: DecimalSum = DecimalSum {
        unscaled: 0,
        overflowed: false,
    };

    /// Rescale `value` to `scale`, rounding half away from zero.
    pub fn from_decimal(value: Decimal, scale: u32) -> Self {
        let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        let unscaled = scale
            .checked_sub(rounded.scale())
            .and_then(|shift| 10i128.checked_pow(shift))
            .and_then(|factor| rounded.mantissa().checked_mul(factor));
        match unscaled {
            Some(unscaled) => DecimalSum {
                unscaled,
                overflowed: false,
            },
            None => DecimalSum {
                unscaled: 0,
                overflowed: true,
            },
        }
    }

    #[inline]
    pub fn add(self, other: DecimalSum) -> DecimalSum {
        DecimalSum {
            unscaled: self.unscaled.wrapping_add(other.unscaled),
            overflowed: self.overflowed || other.overflowed,
        }
    }

    /// The total as a DECIMAL, or `None` once it is outside the DECIMAL range.
    pub fn to_decimal(&self, scale: u32) -> Option<Decimal> {
        if self.overflowed {
            return None;
        }
        Decimal::try_from_i128_with_scale(self.unscaled, scale).ok()
    }

    /// STRUCT the sum is stored as.
    pub fn state_type() -> SqlType {
        SqlType::structure([
            (HIGH_FIELD, SqlType::BigInt),
            (LOW_FIELD, SqlType::BigInt),
            (OVERFLOW_FIELD, SqlType::Boolean),
        ])
    }
}

impl SqlValue for DecimalSum {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Struct(fields) => {
                let high: i64 = struct_field(fields, HIGH_FIELD)?;
                let low: i64 = struct_field(fields, LOW_FIELD)?;
                Some(DecimalSum {
                    unscaled: (i128::from(high) << 64) | i128::from(low as u64),
                    overflowed: struct_field(fields, OVERFLOW_FIELD)?,
                })
            }
            _ => None,
        }
    }

    fn into_field(self) -> FieldValue {
        let mut fields = BTreeMap::new();
        fields.insert(
            HIGH_FIELD.to_string(),
            FieldValue::BigInt((self.unscaled >> 64) as i64),
        );
        fields.insert(
            LOW_FIELD.to_string(),
            FieldValue::BigInt(self.unscaled as u64 as i64),
        );
        fields.insert(
            OVERFLOW_FIELD.to_string(),
            FieldValue::Boolean(self.overflowed),
        );
        FieldValue::Struct(fields)
    }
}

/// Declared scale of a DECIMAL argument, zero for other types.
pub fn declared_scale(input: &SqlType) -> u32 {
    match input {
        SqlType::Decimal { scale, .. } => u32::from(*scale),
        _ => 0,
    }
}

/// Result type of SUM for an input type, or `None` when SUM does not apply.
pub fn sum_result_type(input: &SqlType) -> Option<SqlType> {
    match input {
        SqlType::Decimal { scale, .. } => Some(SqlType::decimal(MAX_DECIMAL_PRECISION, *scale)),
        SqlType::Double => Some(SqlType::Double),
        t if t.is_numeric() => Some(SqlType::BigInt),
        _ => None,
    }
}

/// Type of the running sum kept in SUM and AVG state.
pub fn sum_state_type(input: &SqlType) -> Option<SqlType> {
    match input {
        SqlType::Decimal { .. } => Some(DecimalSum::state_type()),
        t => sum_result_type(t),
    }
}

/// Compute the average from a running sum and count.
pub fn compute_avg(sum: f64, count: i64) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
