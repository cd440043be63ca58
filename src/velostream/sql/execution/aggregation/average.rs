//! AVG, the reference compound aggregate.
//!
//! The state is a `{SUM, COUNT}` pair rather than the running mean, because
//! pairs merge exactly while means do not. The sum uses the same exact
//! representation as SUM for the input type; the mean is only computed, as a
//! DOUBLE, when the window is emitted.

use super::compute::{compute_avg, declared_scale, sum_state_type, Summable};
use super::function::{AggregateFunction, AggregateFunctionInitArguments, TypedAggregateFunction};
use super::udaf::{AggregateState, Udaf};
use super::value::{struct_field, SqlValue};
use crate::register_aggregate_function;
use crate::velostream::config::AggregationConfig;
use crate::velostream::sql::error::{AggregateError, AggregateResult};
use crate::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

const AVG_DESCRIPTION: &str = "Returns the average of a numeric column within a window.";

const SUM_FIELD: &str = "SUM";
const COUNT_FIELD: &str = "COUNT";

#[derive(Debug, Clone, PartialEq)]
pub struct AvgState<S> {
    pub sum: S,
    pub count: i64,
}

/// STRUCT type of the AVG state for an input type, `None` for non-numeric input.
pub fn avg_state_type(input: &SqlType) -> Option<SqlType> {
    sum_state_type(input)
        .map(|sum| SqlType::structure([(SUM_FIELD, sum), (COUNT_FIELD, SqlType::BigInt)]))
}

impl<S: SqlValue> SqlValue for AvgState<S> {
    fn from_field(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Struct(fields) => Some(AvgState {
                sum: struct_field(fields, SUM_FIELD)?,
                count: struct_field(fields, COUNT_FIELD)?,
            }),
            _ => None,
        }
    }

    fn into_field(self) -> FieldValue {
        let mut fields = BTreeMap::new();
        fields.insert(SUM_FIELD.to_string(), self.sum.into_field());
        fields.insert(COUNT_FIELD.to_string(), FieldValue::BigInt(self.count));
        FieldValue::Struct(fields)
    }
}

#[derive(Debug)]
pub struct AvgAggregate<T> {
    scale: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AvgAggregate<T> {
    pub fn new() -> Self {
        Self::with_scale(0)
    }

    /// Average DECIMAL inputs summed at the declared `scale`.
    pub fn with_scale(scale: u32) -> Self {
        Self {
            scale,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for AvgAggregate<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn add_states<T: Summable>(a: AvgState<T::Sum>, b: AvgState<T::Sum>) -> AvgState<T::Sum> {
    AvgState {
        sum: T::add(a.sum, b.sum),
        count: a.count.wrapping_add(b.count),
    }
}

impl<T: Summable> Udaf for AvgAggregate<T> {
    type Input = T;
    type State = AvgState<T::Sum>;
    type Output = f64;

    fn update(
        &self,
        value: Option<T>,
        state: AggregateState<AvgState<T::Sum>>,
    ) -> AggregateState<AvgState<T::Sum>> {
        match value {
            None => state,
            Some(v) => {
                let observed = AvgState {
                    sum: v.lift(self.scale),
                    count: 1,
                };
                state.combine_with(AggregateState::Active(observed), add_states::<T>)
            }
        }
    }

    fn merge(
        &self,
        _key: &GenericKey,
        left: AggregateState<AvgState<T::Sum>>,
        right: AggregateState<AvgState<T::Sum>>,
    ) -> AggregateState<AvgState<T::Sum>> {
        left.combine_with(right, add_states::<T>)
    }

    fn output(&self, state: &AggregateState<AvgState<T::Sum>>) -> Option<f64> {
        let state = state.as_active()?;
        compute_avg(T::to_f64(&state.sum, self.scale)?, state.count)
    }
}

fn create_avg(
    argument_types: &[SqlType],
    _init: &AggregateFunctionInitArguments,
    _config: &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    let ty = argument_types
        .first()
        .ok_or_else(|| AggregateError::internal("AVG", "resolved without an argument type"))?;
    let state_type = avg_state_type(ty).ok_or_else(|| {
        AggregateError::unsupported_type("AVG", ty, argument_types, "AVG requires a numeric type")
    })?;

    fn bind<T: Summable>(ty: &SqlType, state_type: SqlType) -> Arc<dyn AggregateFunction> {
        Arc::new(TypedAggregateFunction::new(
            "AVG",
            AVG_DESCRIPTION,
            vec![ty.clone()],
            state_type,
            SqlType::Double,
            AvgAggregate::<T>::with_scale(declared_scale(ty)),
        ))
    }

    match ty {
        SqlType::Integer => Ok(bind::<i32>(ty, state_type)),
        SqlType::BigInt => Ok(bind::<i64>(ty, state_type)),
        SqlType::Double => Ok(bind::<f64>(ty, state_type)),
        SqlType::Decimal { .. } => Ok(bind::<Decimal>(ty, state_type)),
        other => Err(AggregateError::internal(
            "AVG",
            format!("no implementation for numeric type {}", other),
        )),
    }
}

register_aggregate_function!(
    name: "AVG",
    aliases: [],
    arity: 1,
    description: AVG_DESCRIPTION,
    factory: create_avg
);
