//! Aggregate function framework for streaming SQL queries.
//!
//! This module computes running aggregates per key and window. It provides:
//!
//! - [`SqlOrd`] - SQL comparison semantics per value type
//! - [`Udaf`] - The typed update / merge / output contract
//! - MIN, MAX, SUM, COUNT, AVG and TOPK built on that contract
//! - [`AggregateFunctionRegistry`] - Compile-time resolution by name and argument types
//! - [`AggregationExecutor`] - The per-row calling convention used by the engine
//!
//! ## Usage
//!
//! ```rust
//! use velostream_aggregates::velostream::sql::execution::aggregation::{
//!     AggregateFunctionInitArguments, AggregateFunctionRegistry, AggregateState,
//! };
//! use velostream_aggregates::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};
//!
//! let registry = AggregateFunctionRegistry::new();
//! let max = registry
//!     .resolve("MAX", &[SqlType::Integer], &AggregateFunctionInitArguments::empty())
//!     .unwrap();
//!
//! let mut state = max.initial_state();
//! for v in [3, 8, 5] {
//!     state = max.update(&FieldValue::Integer(v), state).unwrap();
//! }
//! let merged = max
//!     .merge(&GenericKey::default(), state, AggregateState::Active(FieldValue::Integer(12)))
//!     .unwrap();
//! assert_eq!(max.output(&merged).unwrap(), FieldValue::Integer(12));
//! ```

pub mod average;
pub mod compute;
pub mod executor;
pub mod extremum;
pub mod function;
pub mod function_metadata;
pub mod ordering;
pub mod registry;
pub mod sum;
pub mod topk;
pub mod udaf;
pub mod value;

// Re-export key types for convenience
pub use self::average::{avg_state_type, AvgAggregate, AvgState};
pub use self::compute::{DecimalSum, Summable};
pub use self::executor::{AggregateCall, AggregateCallSpec, AggregateRow, AggregationExecutor};
pub use self::extremum::{Extremum, MaxAggregate, MinAggregate};
pub use self::function::{AggregateFunction, AggregateFunctionInitArguments, TypedAggregateFunction};
pub use self::ordering::{Greatest, Least, RankDirection, SqlOrd};
pub use self::registry::AggregateFunctionRegistry;
pub use self::sum::{CountAggregate, SumAggregate};
pub use self::topk::TopKAggregate;
pub use self::udaf::{AggregateState, Udaf};
pub use self::value::SqlValue;
