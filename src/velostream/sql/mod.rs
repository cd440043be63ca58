// Streaming SQL module for velostream
// Provides the aggregate function framework used by GROUP BY and windowed queries

pub mod error;
pub mod execution;

// Re-export main API
pub use error::{AggregateError, AggregateResult};
pub use execution::{AggregateFunctionRegistry, FieldValue, SqlType};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "aggregate_functions", // COUNT, SUM, AVG, MIN, MAX, TOPK
    "partial_aggregation", // Commutative, associative merge of partial states
    "typed_resolution",    // Argument types resolved once per call-site
];
