//! # velostream-aggregates
//!
//! The aggregate function framework of the Velostream streaming SQL engine.
//! It computes running MIN, MAX, SUM, COUNT, AVG and TOPK values over
//! unbounded, keyed and windowed streams, where partial results computed on
//! different workers must merge into the same answer regardless of order.
//!
//! ## Features
//!
//! - **Typed Execution**: Each call-site is resolved once into a monomorphized implementation
//! - **Mergeable State**: Every aggregate merges commutatively and associatively
//! - **Explicit Absence**: "Nothing observed yet" is a state, distinct from a NULL input
//! - **Self-Registering Functions**: Built-ins register through `inventory`
//!
//! ## Quick Start
//!
//! ```rust
//! use velostream_aggregates::velostream::sql::execution::aggregation::{
//!     AggregateCallSpec, AggregationExecutor,
//! };
//! use velostream_aggregates::velostream::sql::{AggregateFunctionRegistry, FieldValue, SqlType};
//! use velostream_aggregates::velostream::sql::execution::GenericKey;
//!
//! let registry = AggregateFunctionRegistry::new();
//! let schema = [SqlType::String, SqlType::Integer];
//! let executor = AggregationExecutor::compile(
//!     &registry,
//!     &schema,
//!     &[AggregateCallSpec::new("MIN", 0), AggregateCallSpec::new("MAX", 1)],
//! )
//! .unwrap();
//!
//! let mut states = executor.initialize();
//! for (name, qty) in [("b", 4), ("a", 9), ("c", 2)] {
//!     let row = [FieldValue::string(name), FieldValue::Integer(qty)];
//!     states = executor.apply(&row, states).unwrap();
//! }
//! let merged = executor
//!     .merge(&GenericKey::default(), states, executor.initialize())
//!     .unwrap();
//! assert_eq!(
//!     executor.result(&merged).unwrap(),
//!     vec![FieldValue::string("a"), FieldValue::Integer(9)]
//! );
//! ```

pub mod velostream;

// Re-export main API at crate root for easy access
pub use velostream::config::AggregationConfig;
pub use velostream::sql::error::{AggregateError, AggregateResult};
pub use velostream::sql::execution::aggregation::{
    AggregateFunction, AggregateFunctionInitArguments, AggregateFunctionRegistry, AggregateState,
    AggregationExecutor, SqlOrd, Udaf,
};
pub use velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};
