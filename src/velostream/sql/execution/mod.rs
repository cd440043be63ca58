// Streaming SQL execution support: value types and aggregate functions

pub mod aggregation;
pub mod types;

pub use aggregation::{AggregateFunction, AggregateFunctionRegistry, AggregateState, AggregationExecutor};
pub use types::{FieldValue, GenericKey, SqlType};
