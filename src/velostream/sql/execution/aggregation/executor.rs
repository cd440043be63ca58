//! Per-row execution of a query's aggregates.
//!
//! [`AggregationExecutor`] holds the functions resolved for one GROUP BY and
//! the input column each reads. The owning engine keeps one state vector per
//! key and window and passes it through `apply` for each record and `merge`
//! when two partial results meet. Routing every record for a key to a single
//! task is the engine's responsibility.

use super::function::{AggregateFunction, AggregateFunctionInitArguments};
use super::registry::AggregateFunctionRegistry;
use super::udaf::AggregateState;
use crate::velostream::sql::error::{AggregateError, AggregateResult};
use crate::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};
use std::sync::Arc;

/// One aggregate call in a SELECT list, before resolution.
#[derive(Debug, Clone)]
pub struct AggregateCallSpec {
    pub function: String,
    /// Column of the input row the function reads
    pub argument_index: usize,
    pub init_args: AggregateFunctionInitArguments,
}

impl AggregateCallSpec {
    pub fn new(function: impl Into<String>, argument_index: usize) -> Self {
        Self {
            function: function.into(),
            argument_index,
            init_args: AggregateFunctionInitArguments::empty(),
        }
    }

    pub fn with_init_args(mut self, args: Vec<FieldValue>) -> Self {
        self.init_args = AggregateFunctionInitArguments::new(args);
        self
    }
}

/// A resolved aggregate call.
#[derive(Debug, Clone)]
pub struct AggregateCall {
    pub function: Arc<dyn AggregateFunction>,
    pub argument_index: usize,
}

/// States of every aggregate in a query, for one key and window.
pub type AggregateRow = Vec<AggregateState<FieldValue>>;

#[derive(Debug, Clone)]
pub struct AggregationExecutor {
    calls: Vec<AggregateCall>,
}

impl AggregationExecutor {
    pub fn new(calls: Vec<AggregateCall>) -> Self {
        Self { calls }
    }

    /// Resolve every call against the input schema. Fails on the first call
    /// that cannot be resolved, so a bad query never starts.
    pub fn compile(
        registry: &AggregateFunctionRegistry,
        input_schema: &[SqlType],
        specs: &[AggregateCallSpec],
    ) -> AggregateResult<Self> {
        let calls = specs
            .iter()
            .map(|spec| -> AggregateResult<AggregateCall> {
                let ty = input_schema.get(spec.argument_index).ok_or(
                    AggregateError::ArgumentIndexOutOfRange {
                        index: spec.argument_index,
                        width: input_schema.len(),
                    },
                )?;
                let function = registry.resolve(
                    &spec.function,
                    std::slice::from_ref(ty),
                    &spec.init_args,
                )?;
                Ok(AggregateCall {
                    function,
                    argument_index: spec.argument_index,
                })
            })
            .collect::<AggregateResult<Vec<_>>>()?;

        log::debug!("Compiled aggregation with {} call(s)", calls.len());
        Ok(Self { calls })
    }

    pub fn calls(&self) -> &[AggregateCall] {
        &self.calls
    }

    /// Output types, in call order
    pub fn return_types(&self) -> Vec<SqlType> {
        self.calls
            .iter()
            .map(|c| c.function.return_type().clone())
            .collect()
    }

    /// Fresh states for a newly opened window.
    pub fn initialize(&self) -> AggregateRow {
        self.calls
            .iter()
            .map(|c| c.function.initial_state())
            .collect()
    }

    /// Fold one input row into the states.
    pub fn apply(&self, row: &[FieldValue], states: AggregateRow) -> AggregateResult<AggregateRow> {
        self.check_width(states.len())?;
        self.calls
            .iter()
            .zip(states)
            .map(|(call, state)| -> AggregateResult<AggregateState<FieldValue>> {
                let value = row.get(call.argument_index).ok_or_else(|| {
                    AggregateError::internal(
                        call.function.name(),
                        format!(
                            "row has {} column(s), aggregate reads column {}",
                            row.len(),
                            call.argument_index
                        ),
                    )
                })?;
                call.function.update(value, state)
            })
            .collect()
    }

    /// Merge two partial state rows of the same key.
    pub fn merge(
        &self,
        key: &GenericKey,
        left: AggregateRow,
        right: AggregateRow,
    ) -> AggregateResult<AggregateRow> {
        self.check_width(left.len())?;
        self.check_width(right.len())?;
        self.calls
            .iter()
            .zip(left.into_iter().zip(right))
            .map(|(call, (l, r))| call.function.merge(key, l, r))
            .collect()
    }

    /// Project states into the emitted values.
    pub fn result(&self, states: &[AggregateState<FieldValue>]) -> AggregateResult<Vec<FieldValue>> {
        self.check_width(states.len())?;
        self.calls
            .iter()
            .zip(states)
            .map(|(call, state)| call.function.output(state))
            .collect()
    }

    fn check_width(&self, width: usize) -> AggregateResult<()> {
        if width != self.calls.len() {
            return Err(AggregateError::internal(
                "aggregation",
                format!(
                    "expected {} aggregate state(s), got {}",
                    self.calls.len(),
                    width
                ),
            ));
        }
        Ok(())
    }
}
