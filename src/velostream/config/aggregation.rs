//! Aggregate framework configuration
//!
//! Supports layered configuration:
//! 1. Defaults
//! 2. Environment variables (for deployment)
//! 3. YAML documents (for job files)
//! 4. Builder pattern (for runtime customization)
//!
//! # Examples
//!
//! ```rust
//! use velostream_aggregates::velostream::config::AggregationConfig;
//!
//! let config = AggregationConfig::new()
//!     .with_max_top_k(50)
//!     .with_cache_resolved_functions(false);
//! assert_eq!(config.max_top_k, 50);
//! ```

use crate::velostream::sql::error::{AggregateError, AggregateResult};
use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_MAX_TOP_K: usize = 1000;

/// Configuration for aggregate function resolution
///
/// ## Environment Variables
/// - `VELOSTREAM_AGG_CACHE_FUNCTIONS`: Cache resolved functions, true/false (default: true)
/// - `VELOSTREAM_AGG_MAX_TOP_K`: Largest `k` accepted by TOPK (default: 1000)
/// - `VELOSTREAM_AGG_LOG_RESOLUTIONS`: Log each resolution at info level (default: false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Reuse instances resolved with an empty init configuration
    pub cache_resolved_functions: bool,

    /// Upper bound for the `k` init argument of TOPK
    pub max_top_k: usize,

    /// Log resolutions at info instead of debug
    pub log_resolutions: bool,
}

impl AggregationConfig {
    pub fn new() -> Self {
        Self {
            cache_resolved_functions: true,
            max_top_k: DEFAULT_MAX_TOP_K,
            log_resolutions: false,
        }
    }

    /// Load configuration from environment variables with fallback to defaults
    ///
    /// Unparseable values fall back to the default for that field.
    pub fn from_env() -> Self {
        let defaults = Self::new();

        let cache_resolved_functions = env::var("VELOSTREAM_AGG_CACHE_FUNCTIONS")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.cache_resolved_functions);

        let max_top_k = env::var("VELOSTREAM_AGG_MAX_TOP_K")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|k: &usize| *k > 0)
            .unwrap_or(defaults.max_top_k);

        let log_resolutions = env::var("VELOSTREAM_AGG_LOG_RESOLUTIONS")
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(defaults.log_resolutions);

        Self {
            cache_resolved_functions,
            max_top_k,
            log_resolutions,
        }
    }

    /// Parse a YAML document. Missing keys take their default value.
    ///
    /// ```yaml
    /// cache_resolved_functions: false
    /// max_top_k: 25
    /// ```
    pub fn from_yaml_str(yaml: &str) -> AggregateResult<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| AggregateError::Config {
            message: format!("invalid aggregation config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AggregateResult<()> {
        if self.max_top_k == 0 {
            return Err(AggregateError::Config {
                message: "max_top_k must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_cache_resolved_functions(mut self, enabled: bool) -> Self {
        self.cache_resolved_functions = enabled;
        self
    }

    pub fn with_max_top_k(mut self, max_top_k: usize) -> Self {
        self.max_top_k = max_top_k;
        self
    }

    pub fn with_log_resolutions(mut self, enabled: bool) -> Self {
        self.log_resolutions = enabled;
        self
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
