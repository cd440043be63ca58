//! Aggregate Function Registry
//!
//! Resolves an aggregate call-site `(name, argument types, init arguments)`
//! to a concrete [`AggregateFunction`] while the query is being compiled.
//! Every failure (unknown name, wrong arity, unsupported type, bad init
//! arguments) surfaces here, before the first record arrives.
//!
//! Instances resolved without init arguments depend only on the name and the
//! argument types, so they are cached and shared between call-sites.

use super::function::{AggregateFunction, AggregateFunctionInitArguments};
use super::function_metadata::{self, AggregateFunctionDef};
use crate::velostream::config::AggregationConfig;
use crate::velostream::sql::error::{AggregateError, AggregateResult};
use crate::velostream::sql::execution::types::{format_signature, SqlType};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type CacheKey = (&'static str, Vec<SqlType>);

pub struct AggregateFunctionRegistry {
    config: AggregationConfig,
    cache: RwLock<HashMap<CacheKey, Arc<dyn AggregateFunction>>>,
}

impl AggregateFunctionRegistry {
    pub fn new() -> Self {
        Self::with_config(AggregationConfig::default())
    }

    pub fn with_config(config: AggregationConfig) -> Self {
        Self {
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Resolve one aggregate call-site.
    ///
    /// # Errors
    /// - [`AggregateError::UnknownFunction`] when no aggregate has this name
    /// - [`AggregateError::ArityMismatch`] when the argument count is wrong
    /// - [`AggregateError::UnsupportedType`] when an argument type has no implementation
    /// - [`AggregateError::InvalidInitArguments`] when init literals are rejected
    pub fn resolve(
        &self,
        name: &str,
        argument_types: &[SqlType],
        init_args: &AggregateFunctionInitArguments,
    ) -> AggregateResult<Arc<dyn AggregateFunction>> {
        let def = self.lookup(name)?;

        if argument_types.len() != def.arity {
            log::warn!(
                "Rejected {}{}: expected {} argument(s)",
                def.name,
                format_signature(argument_types),
                def.arity
            );
            return Err(AggregateError::ArityMismatch {
                function: def.name.to_string(),
                expected: def.arity,
                actual: argument_types.len(),
                signature: argument_types.to_vec(),
            });
        }

        let cacheable = self.config.cache_resolved_functions && init_args.is_empty();
        let key = (def.name, argument_types.to_vec());

        if cacheable {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(function) = cache.get(&key) {
                log::trace!("Aggregate cache hit for {}{}", def.name, format_signature(argument_types));
                return Ok(Arc::clone(function));
            }
        }

        let function = (def.factory)(argument_types, init_args, &self.config).inspect_err(|e| {
            log::warn!("Failed to resolve {}{}: {}", def.name, format_signature(argument_types), e);
        })?;

        if self.config.log_resolutions {
            log::info!(
                "Resolved {}{} -> {}",
                def.name,
                format_signature(argument_types),
                function.return_type()
            );
        } else {
            log::debug!(
                "Resolved {}{} -> {}",
                def.name,
                format_signature(argument_types),
                function.return_type()
            );
        }

        if cacheable {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            // Another resolver may have won the race; keep its instance.
            let entry = cache.entry(key).or_insert(function);
            return Ok(Arc::clone(entry));
        }

        Ok(function)
    }

    /// Check if a name refers to a registered aggregate
    pub fn is_aggregate_function(&self, name: &str) -> bool {
        function_metadata::lookup_function(name).is_some()
    }

    /// Metadata for a registered aggregate
    pub fn describe(&self, name: &str) -> Option<&'static AggregateFunctionDef> {
        function_metadata::lookup_function(name)
    }

    /// Primary names of all registered aggregates, sorted
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = function_metadata::all_registered_functions()
            .map(|def| def.name)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Get list of similar function names (for suggestions)
    pub fn find_similar_functions(&self, name: &str, max_results: usize) -> Vec<String> {
        let name_upper = name.to_uppercase();
        let first = name_upper.chars().next();
        let mut similar: Vec<String> = function_metadata::registered_names()
            .filter(|f| {
                // Simple similarity: starts with same letter or contains substring
                first.is_some_and(|c| f.starts_with(c))
                    || f.contains(name_upper.as_str())
                    || name_upper.contains(f)
            })
            .map(str::to_string)
            .collect();

        similar.sort();
        similar.truncate(max_results);
        similar
    }

    /// Number of resolved instances currently cached
    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lookup(&self, name: &str) -> AggregateResult<&'static AggregateFunctionDef> {
        function_metadata::lookup_function(name).ok_or_else(|| {
            log::warn!("Unknown aggregate function '{}'", name);
            AggregateError::UnknownFunction {
                name: name.to_string(),
                suggestions: self.find_similar_functions(name, 3),
            }
        })
    }
}

impl Default for AggregateFunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
