//! SQL comparison semantics for orderable value types.
//!
//! [`SqlOrd`] is the total order MIN, MAX and TOPK rank values by. It must
//! agree with the query language's comparison operators:
//!
//! - numbers compare by magnitude
//! - strings compare by Unicode codepoint, lexicographically
//! - decimals compare by value regardless of scale, so `1.50 == 1.5`
//! - dates and timestamps compare chronologically, `false < true`
//!
//! DOUBLE has no natural total order, so it follows the engine's comparison
//! rules: every NaN compares equal to every other NaN and greater than all
//! other values, including positive infinity, and `-0.0 < 0.0`.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Total order matching SQL comparison for one value type.
///
/// Implementations must be reflexive, antisymmetric and transitive, and must
/// not depend on anything but the two operands.
pub trait SqlOrd {
    fn sql_cmp(&self, other: &Self) -> Ordering;
}

macro_rules! impl_sql_ord_via_ord {
    ($($t:ty),* $(,)?) => {
        $(
            impl SqlOrd for $t {
                #[inline]
                fn sql_cmp(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }
        )*
    };
}

// `Ord` on `String` compares UTF-8 bytes, which is codepoint order.
// `Ord` on `Decimal` compares values after scale normalization.
impl_sql_ord_via_ord!(i32, i64, bool, String, Decimal, NaiveDate, NaiveDateTime);

impl SqlOrd for f64 {
    #[inline]
    fn sql_cmp(&self, other: &Self) -> Ordering {
        match (self.is_nan(), other.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            // total_cmp orders -0.0 before 0.0 and agrees with `<` elsewhere
            (false, false) => self.total_cmp(other),
        }
    }
}

/// Which end of the order an extremum keeps.
pub trait RankDirection: Send + Sync + 'static {
    /// SQL name of the aggregate that keeps this end (`MAX` / `MIN`).
    const FUNCTION_NAME: &'static str;

    /// Whether `candidate` strictly ranks past `current`.
    ///
    /// Equal-ranked values never replace the current one, which keeps the
    /// result deterministic for a given call order.
    fn ranks_past<T: SqlOrd>(candidate: &T, current: &T) -> bool;
}

/// Keep the greatest value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Greatest;

/// Keep the least value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Least;

impl RankDirection for Greatest {
    const FUNCTION_NAME: &'static str = "MAX";

    #[inline]
    fn ranks_past<T: SqlOrd>(candidate: &T, current: &T) -> bool {
        candidate.sql_cmp(current) == Ordering::Greater
    }
}

impl RankDirection for Least {
    const FUNCTION_NAME: &'static str = "MIN";

    #[inline]
    fn ranks_past<T: SqlOrd>(candidate: &T, current: &T) -> bool {
        candidate.sql_cmp(current) == Ordering::Less
    }
}

/// Sort `values` so the highest-ranked value comes first.
pub fn sort_descending<T: SqlOrd>(values: &mut [T]) {
    values.sort_by(|a, b| b.sql_cmp(a));
}
