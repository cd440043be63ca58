//! Conversions between [`FieldValue`] and the native types aggregates run on.
//!
//! Conversion is exact: a `FieldValue` of the wrong variant does not convert,
//! it is reported back to the caller as a type mismatch.

use crate::velostream::sql::execution::types::FieldValue;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// A native Rust type with a lossless `FieldValue` representation.
pub trait SqlValue: Sized + Clone + Send + Sync + 'static {
    /// Extract a value of this type. Returns `None` on a variant mismatch,
    /// including `FieldValue::Null`.
    fn from_field(value: &FieldValue) -> Option<Self>;

    fn into_field(self) -> FieldValue;
}

macro_rules! impl_sql_value {
    ($t:ty, $variant:ident) => {
        impl SqlValue for $t {
            #[inline]
            fn from_field(value: &FieldValue) -> Option<Self> {
                match value {
                    FieldValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }

            #[inline]
            fn into_field(self) -> FieldValue {
                FieldValue::$variant(self)
            }
        }
    };
}

impl_sql_value!(i32, Integer);
impl_sql_value!(i64, BigInt);
impl_sql_value!(f64, Double);
impl_sql_value!(Decimal, Decimal);
impl_sql_value!(String, String);
impl_sql_value!(bool, Boolean);
impl_sql_value!(NaiveDate, Date);
impl_sql_value!(NaiveDateTime, Timestamp);

/// Any non-null value, for functions such as COUNT that accept every type.
impl SqlValue for FieldValue {
    #[inline]
    fn from_field(value: &FieldValue) -> Option<Self> {
        if value.is_null() {
            None
        } else {
            Some(value.clone())
        }
    }

    #[inline]
    fn into_field(self) -> FieldValue {
        self
    }
}

impl<T: SqlValue> SqlValue for Vec<T> {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Array(items) => items.iter().map(T::from_field).collect(),
            _ => None,
        }
    }

    fn into_field(self) -> FieldValue {
        FieldValue::Array(self.into_iter().map(SqlValue::into_field).collect())
    }
}

/// Read a named field from a STRUCT value.
pub(crate) fn struct_field<T: SqlValue>(
    fields: &BTreeMap<String, FieldValue>,
    name: &str,
) -> Option<T> {
    fields.get(name).and_then(T::from_field)
}
