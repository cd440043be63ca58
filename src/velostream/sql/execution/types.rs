//! Core value and type descriptors shared by the aggregate framework.
//!
//! This module contains the fundamental data types aggregate functions operate on:
//! - [`SqlType`] - The compile-time type descriptor of an argument or result
//! - [`FieldValue`] - The runtime value representation, including SQL NULL
//! - [`GenericKey`] - The grouping key a state belongs to

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Largest precision a DECIMAL value can carry.
pub const MAX_DECIMAL_PRECISION: u8 = 28;

/// A SQL type descriptor, resolved by the query compiler before execution.
///
/// Descriptors are immutable and cheap to clone. They key the function
/// registry cache, so equality and hashing are structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 64-bit IEEE 754 floating point
    Double,
    /// Fixed-point decimal with `precision` total digits, `scale` of them fractional
    Decimal { precision: u8, scale: u8 },
    /// UTF-8 string
    String,
    /// Boolean value
    Boolean,
    /// Calendar date without time zone
    Date,
    /// Timestamp without time zone
    Timestamp,
    /// Array of a single element type
    Array(Box<SqlType>),
    /// Map from string keys to a single value type
    Map(Box<SqlType>),
    /// Structured value with ordered, named fields
    Struct(Vec<(String, SqlType)>),
}

impl SqlType {
    /// DECIMAL(precision, scale)
    pub fn decimal(precision: u8, scale: u8) -> Self {
        SqlType::Decimal { precision, scale }
    }

    /// ARRAY<element>
    pub fn array(element: SqlType) -> Self {
        SqlType::Array(Box::new(element))
    }

    /// MAP<STRING, value>
    pub fn map(value: SqlType) -> Self {
        SqlType::Map(Box::new(value))
    }

    /// STRUCT<name type, ...>
    pub fn structure<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, SqlType)>,
        S: Into<String>,
    {
        SqlType::Struct(
            fields
                .into_iter()
                .map(|(name, ty)| (name.into(), ty))
                .collect(),
        )
    }

    /// Whether values of this type have a total order usable by MIN/MAX.
    ///
    /// Structured types (ARRAY, MAP, STRUCT) are never orderable.
    pub fn is_orderable(&self) -> bool {
        !matches!(
            self,
            SqlType::Array(_) | SqlType::Map(_) | SqlType::Struct(_)
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::Integer | SqlType::BigInt | SqlType::Double | SqlType::Decimal { .. }
        )
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Integer => write!(f, "INTEGER"),
            SqlType::BigInt => write!(f, "BIGINT"),
            SqlType::Double => write!(f, "DOUBLE"),
            SqlType::Decimal { precision, scale } => write!(f, "DECIMAL({}, {})", precision, scale),
            SqlType::String => write!(f, "STRING"),
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::Date => write!(f, "DATE"),
            SqlType::Timestamp => write!(f, "TIMESTAMP"),
            SqlType::Array(element) => write!(f, "ARRAY<{}>", element),
            SqlType::Map(value) => write!(f, "MAP<STRING, {}>", value),
            SqlType::Struct(fields) => {
                write!(f, "STRUCT<")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", name, ty)?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Render an argument signature as `(INTEGER, STRING)` for error messages.
pub fn format_signature(types: &[SqlType]) -> String {
    let rendered: Vec<String> = types.iter().map(|t| t.to_string()).collect();
    format!("({})", rendered.join(", "))
}

/// A value in a SQL record field
///
/// `Null` is the SQL NULL carried by an input record. It is deliberately a
/// value, not a state: "this record had no value" is distinct from "this
/// window has observed nothing yet", which is
/// [`AggregateState::Uninitialized`](crate::velostream::sql::execution::aggregation::AggregateState).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// SQL NULL value
    Null,
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    BigInt(i64),
    /// 64-bit floating point number
    Double(f64),
    /// Decimal type for precise arithmetic
    Decimal(Decimal),
    /// UTF-8 string
    String(String),
    /// Boolean value (true/false)
    Boolean(bool),
    /// Date type (YYYY-MM-DD)
    Date(NaiveDate),
    /// Timestamp type (YYYY-MM-DD HH:MM:SS[.nnn])
    Timestamp(NaiveDateTime),
    /// Array of values - all elements must be the same type
    Array(Vec<FieldValue>),
    /// Map of key-value pairs - keys must be strings
    Map(BTreeMap<String, FieldValue>),
    /// Structured data with named fields
    Struct(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "NULL",
            FieldValue::Integer(_) => "INTEGER",
            FieldValue::BigInt(_) => "BIGINT",
            FieldValue::Double(_) => "DOUBLE",
            FieldValue::Decimal(_) => "DECIMAL",
            FieldValue::String(_) => "STRING",
            FieldValue::Boolean(_) => "BOOLEAN",
            FieldValue::Date(_) => "DATE",
            FieldValue::Timestamp(_) => "TIMESTAMP",
            FieldValue::Array(_) => "ARRAY",
            FieldValue::Map(_) => "MAP",
            FieldValue::Struct(_) => "STRUCT",
        }
    }

    /// Convenience constructor for string values.
    pub fn string(value: impl Into<String>) -> Self {
        FieldValue::String(value.into())
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::BigInt(i) => write!(f, "{}", i),
            FieldValue::Double(v) => write!(f, "{}", v),
            FieldValue::Decimal(d) => write!(f, "{}", d),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Timestamp(t) => write!(f, "{}", t),
            FieldValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Map(entries) | FieldValue::Struct(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Grouping key of the state being merged.
///
/// Built-in aggregates never inspect it; it is threaded through `merge` so
/// key-aware aggregates can share the same calling convention.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenericKey {
    values: Vec<FieldValue>,
}

impl GenericKey {
    pub fn new(values: Vec<FieldValue>) -> Self {
        Self { values }
    }

    /// A key with a single column.
    pub fn single(value: FieldValue) -> Self {
        Self {
            values: vec![value],
        }
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for GenericKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}
