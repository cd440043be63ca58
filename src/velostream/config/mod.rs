//! VeloStream Configuration Management
//!
//! Configuration for the aggregate function framework, loadable from
//! defaults, environment variables or YAML.

pub mod aggregation;

// Re-export main types for convenience
pub use aggregation::AggregationConfig;
