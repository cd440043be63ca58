//! Aggregate Function Metadata and Self-Registration System
//!
//! Built-in aggregates declare their metadata next to their implementation
//! and register themselves at compile time through the inventory pattern.
//! The [`AggregateFunctionRegistry`](super::registry::AggregateFunctionRegistry)
//! reads the collected table; nothing has to be listed by hand.

use super::function::{AggregateFunction, AggregateFunctionInitArguments};
use crate::velostream::config::AggregationConfig;
use crate::velostream::sql::error::AggregateResult;
use crate::velostream::sql::execution::types::SqlType;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Factory signature: builds the typed instance for one argument signature.
///
/// Arity has already been checked when a factory is called. Factories reject
/// argument types they have no implementation for.
pub type AggregateFactory = fn(
    &[SqlType],
    &AggregateFunctionInitArguments,
    &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>>;

/// Aggregate function metadata for self-registration
#[derive(Debug, Clone)]
pub struct AggregateFunctionDef {
    /// Primary function name (uppercase)
    pub name: &'static str,
    /// Alternative names for the function (uppercase)
    pub aliases: &'static [&'static str],
    /// Number of column arguments, not counting init literals
    pub arity: usize,
    pub description: &'static str,
    pub factory: AggregateFactory,
}

// Distributed registration storage for aggregate functions
inventory::collect!(AggregateFunctionDef);

/// Lookup table from uppercase name or alias to definition.
static FUNCTION_LOOKUP: LazyLock<HashMap<String, &'static AggregateFunctionDef>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();

        for def in inventory::iter::<AggregateFunctionDef> {
            map.insert(def.name.to_string(), def);

            for alias in def.aliases {
                map.insert((*alias).to_string(), def);
            }
        }

        map
    });

/// Macro to register an aggregate function with metadata
///
/// # Example
/// ```rust,ignore
/// register_aggregate_function!(
///     name: "MAX",
///     aliases: [],
///     arity: 1,
///     description: "Returns the maximum value",
///     factory: create_max
/// );
/// ```
#[macro_export]
macro_rules! register_aggregate_function {
    (
        name: $name:expr,
        aliases: [$($alias:expr),*],
        arity: $arity:expr,
        description: $description:expr,
        factory: $factory:path
    ) => {
        inventory::submit! {
            $crate::velostream::sql::execution::aggregation::function_metadata::AggregateFunctionDef {
                name: $name,
                aliases: &[$($alias),*],
                arity: $arity,
                description: $description,
                factory: $factory,
            }
        }
    };
}

/// All registered aggregate definitions, one entry per function.
pub fn all_registered_functions() -> impl Iterator<Item = &'static AggregateFunctionDef> {
    inventory::iter::<AggregateFunctionDef>.into_iter()
}

/// Find a definition by name or alias, case-insensitively.
pub fn lookup_function(name: &str) -> Option<&'static AggregateFunctionDef> {
    FUNCTION_LOOKUP.get(&name.to_uppercase()).copied()
}

/// All registered names and aliases, uppercase.
pub fn registered_names() -> impl Iterator<Item = &'static str> {
    FUNCTION_LOOKUP.keys().map(|k| k.as_str())
}
