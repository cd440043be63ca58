//! Type-erased aggregate functions as seen by the execution engine.
//!
//! The registry hands out `Arc<dyn AggregateFunction>`. Each one wraps a
//! statically typed [`Udaf`] that was picked for the argument types at
//! resolution time, so per-record calls only unwrap the `FieldValue` into the
//! native type and never re-inspect the SQL type.

use super::udaf::{AggregateState, Udaf};
use super::value::SqlValue;
use crate::velostream::sql::error::{AggregateError, AggregateResult};
use crate::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};
use std::any::Any;
use std::fmt;

/// Literal arguments supplied to an aggregate at query compile time.
///
/// For `TOPK(price, 3)` the column is the aggregate argument and `3` is an
/// init argument.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateFunctionInitArguments {
    args: Vec<FieldValue>,
}

impl AggregateFunctionInitArguments {
    pub fn new(args: Vec<FieldValue>) -> Self {
        Self { args }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Option<&FieldValue> {
        self.args.get(index)
    }

    pub fn args(&self) -> &[FieldValue] {
        &self.args
    }

    /// Read argument `index` as a strictly positive integer.
    pub fn positive_integer(&self, index: usize, function: &str) -> AggregateResult<usize> {
        let value = self.args.get(index).ok_or_else(|| {
            AggregateError::invalid_init_arguments(
                function,
                format!("missing init argument at position {}", index),
            )
        })?;
        let raw = match value {
            FieldValue::Integer(v) => i64::from(*v),
            FieldValue::BigInt(v) => *v,
            other => {
                return Err(AggregateError::invalid_init_arguments(
                    function,
                    format!(
                        "init argument {} must be an integer literal, got {} {}",
                        index,
                        other.type_name(),
                        other
                    ),
                ));
            }
        };
        if raw <= 0 {
            return Err(AggregateError::invalid_init_arguments(
                function,
                format!("init argument {} must be positive, got {}", index, raw),
            ));
        }
        usize::try_from(raw).map_err(|_| {
            AggregateError::invalid_init_arguments(
                function,
                format!("init argument {} is too large: {}", index, raw),
            )
        })
    }
}

/// A resolved aggregate, bound to one argument signature.
///
/// Instances are immutable and shared between tasks. Every state goes in by
/// value and comes back out, so callers own storage and persistence.
pub trait AggregateFunction: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn argument_types(&self) -> &[SqlType];

    fn state_type(&self) -> &SqlType;

    fn return_type(&self) -> &SqlType;

    fn initial_state(&self) -> AggregateState<FieldValue>;

    /// Fold one record's value into the state. `FieldValue::Null` is an absent input.
    fn update(
        &self,
        value: &FieldValue,
        state: AggregateState<FieldValue>,
    ) -> AggregateResult<AggregateState<FieldValue>>;

    fn merge(
        &self,
        key: &GenericKey,
        left: AggregateState<FieldValue>,
        right: AggregateState<FieldValue>,
    ) -> AggregateResult<AggregateState<FieldValue>>;

    /// Project a state into the emitted value; `FieldValue::Null` when there is none.
    fn output(&self, state: &AggregateState<FieldValue>) -> AggregateResult<FieldValue>;

    fn as_any(&self) -> &dyn Any;
}

impl dyn AggregateFunction {
    /// Access the typed implementation behind a resolved function.
    pub fn downcast_udaf<U: Udaf>(&self) -> Option<&U> {
        self.as_any()
            .downcast_ref::<TypedAggregateFunction<U>>()
            .map(|f| &f.udaf)
    }
}

/// Adapter exposing a typed [`Udaf`] through [`AggregateFunction`].
pub struct TypedAggregateFunction<U: Udaf> {
    name: &'static str,
    description: &'static str,
    argument_types: Vec<SqlType>,
    state_type: SqlType,
    return_type: SqlType,
    udaf: U,
}

impl<U> TypedAggregateFunction<U>
where
    U: Udaf,
    U::Input: SqlValue,
    U::State: SqlValue,
    U::Output: SqlValue,
{
    pub fn new(
        name: &'static str,
        description: &'static str,
        argument_types: Vec<SqlType>,
        state_type: SqlType,
        return_type: SqlType,
        udaf: U,
    ) -> Self {
        Self {
            name,
            description,
            argument_types,
            state_type,
            return_type,
            udaf,
        }
    }

    pub fn udaf(&self) -> &U {
        &self.udaf
    }

    fn decode_input(&self, value: &FieldValue) -> AggregateResult<Option<U::Input>> {
        if value.is_null() {
            return Ok(None);
        }
        U::Input::from_field(value).map(Some).ok_or_else(|| {
            AggregateError::internal(
                self.name,
                format!(
                    "received {} value '{}' but was resolved for {:?}",
                    value.type_name(),
                    value,
                    self.argument_types
                ),
            )
        })
    }

    fn decode_state(
        &self,
        state: &AggregateState<FieldValue>,
    ) -> AggregateResult<AggregateState<U::State>> {
        match state {
            AggregateState::Uninitialized => Ok(AggregateState::Uninitialized),
            AggregateState::Active(value) => U::State::from_field(value)
                .map(AggregateState::Active)
                .ok_or_else(|| {
                    AggregateError::internal(
                        self.name,
                        format!(
                            "state {} '{}' does not match state type {}",
                            value.type_name(),
                            value,
                            self.state_type
                        ),
                    )
                }),
        }
    }
}

impl<U: Udaf> fmt::Debug for TypedAggregateFunction<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAggregateFunction")
            .field("name", &self.name)
            .field("argument_types", &self.argument_types)
            .field("state_type", &self.state_type)
            .field("return_type", &self.return_type)
            .finish()
    }
}

impl<U> AggregateFunction for TypedAggregateFunction<U>
where
    U: Udaf,
    U::Input: SqlValue,
    U::State: SqlValue,
    U::Output: SqlValue,
{
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn argument_types(&self) -> &[SqlType] {
        &self.argument_types
    }

    fn state_type(&self) -> &SqlType {
        &self.state_type
    }

    fn return_type(&self) -> &SqlType {
        &self.return_type
    }

    fn initial_state(&self) -> AggregateState<FieldValue> {
        self.udaf.initial_state().map(SqlValue::into_field)
    }

    #[inline]
    fn update(
        &self,
        value: &FieldValue,
        state: AggregateState<FieldValue>,
    ) -> AggregateResult<AggregateState<FieldValue>> {
        let input = self.decode_input(value)?;
        let typed = self.decode_state(&state)?;
        // Absent input never changes the state; hand back the caller's value as-is.
        if input.is_none() {
            return Ok(state);
        }
        Ok(self.udaf.update(input, typed).map(SqlValue::into_field))
    }

    fn merge(
        &self,
        key: &GenericKey,
        left: AggregateState<FieldValue>,
        right: AggregateState<FieldValue>,
    ) -> AggregateResult<AggregateState<FieldValue>> {
        let left = self.decode_state(&left)?;
        let right = self.decode_state(&right)?;
        Ok(self
            .udaf
            .merge(key, left, right)
            .map(SqlValue::into_field))
    }

    fn output(&self, state: &AggregateState<FieldValue>) -> AggregateResult<FieldValue> {
        let typed = self.decode_state(state)?;
        Ok(self
            .udaf
            .output(&typed)
            .map(SqlValue::into_field)
            .unwrap_or(FieldValue::Null))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
