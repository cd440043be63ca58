//! SUM and COUNT.

use super::compute::{declared_scale, sum_result_type, sum_state_type, Summable};
use super::function::{AggregateFunction, AggregateFunctionInitArguments, TypedAggregateFunction};
use super::udaf::{AggregateState, Udaf};
use crate::register_aggregate_function;
use crate::velostream::config::AggregationConfig;
use crate::velostream::sql::error::{AggregateError, AggregateResult};
use crate::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use std::sync::Arc;

const SUM_DESCRIPTION: &str = "Returns the sum of a numeric column within a window.";
const COUNT_DESCRIPTION: &str = "Returns the number of non-NULL values of a column within a window.";

/// Running sum. A window with no non-NULL input sums to NULL.
#[derive(Debug)]
pub struct SumAggregate<T> {
    scale: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SumAggregate<T> {
    pub fn new() -> Self {
        Self::with_scale(0)
    }

    /// Sum DECIMAL inputs at the declared `scale`.
    pub fn with_scale(scale: u32) -> Self {
        Self {
            scale,
            _marker: PhantomData,
        }
    }
}

impl<T> Default for SumAggregate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Summable> Udaf for SumAggregate<T> {
    type Input = T;
    type State = T::Sum;
    type Output = T::Total;

    fn update(&self, value: Option<T>, state: AggregateState<T::Sum>) -> AggregateState<T::Sum> {
        match value {
            None => state,
            Some(v) => state.combine_with(AggregateState::Active(v.lift(self.scale)), T::add),
        }
    }

    fn merge(
        &self,
        _key: &GenericKey,
        left: AggregateState<T::Sum>,
        right: AggregateState<T::Sum>,
    ) -> AggregateState<T::Sum> {
        left.combine_with(right, T::add)
    }

    fn output(&self, state: &AggregateState<T::Sum>) -> Option<T::Total> {
        state.as_active().and_then(|sum| T::total(sum, self.scale))
    }
}

/// Counts non-NULL inputs. Starts at zero, so COUNT is never NULL.
#[derive(Debug, Default)]
pub struct CountAggregate;

impl Udaf for CountAggregate {
    type Input = FieldValue;
    type State = i64;
    type Output = i64;

    fn initial_state(&self) -> AggregateState<i64> {
        AggregateState::Active(0)
    }

    fn update(&self, value: Option<FieldValue>, state: AggregateState<i64>) -> AggregateState<i64> {
        match value {
            None => state,
            Some(_) => AggregateState::Active(state.into_active().unwrap_or(0).wrapping_add(1)),
        }
    }

    fn merge(
        &self,
        _key: &GenericKey,
        left: AggregateState<i64>,
        right: AggregateState<i64>,
    ) -> AggregateState<i64> {
        left.combine_with(right, i64::wrapping_add)
    }

    fn output(&self, state: &AggregateState<i64>) -> Option<i64> {
        Some(state.as_active().copied().unwrap_or(0))
    }
}

fn create_sum(
    argument_types: &[SqlType],
    _init: &AggregateFunctionInitArguments,
    _config: &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    let ty = argument_types
        .first()
        .ok_or_else(|| AggregateError::internal("SUM", "resolved without an argument type"))?;
    let (Some(state_type), Some(result_type)) = (sum_state_type(ty), sum_result_type(ty)) else {
        return Err(AggregateError::unsupported_type(
            "SUM",
            ty,
            argument_types,
            "SUM requires a numeric type",
        ));
    };

    fn bind<T: Summable>(
        ty: &SqlType,
        state_type: SqlType,
        result_type: SqlType,
    ) -> Arc<dyn AggregateFunction> {
        Arc::new(TypedAggregateFunction::new(
            "SUM",
            SUM_DESCRIPTION,
            vec![ty.clone()],
            state_type,
            result_type,
            SumAggregate::<T>::with_scale(declared_scale(ty)),
        ))
    }

    match ty {
        SqlType::Integer => Ok(bind::<i32>(ty, state_type, result_type)),
        SqlType::BigInt => Ok(bind::<i64>(ty, state_type, result_type)),
        SqlType::Double => Ok(bind::<f64>(ty, state_type, result_type)),
        SqlType::Decimal { .. } => Ok(bind::<Decimal>(ty, state_type, result_type)),
        other => Err(AggregateError::internal(
            "SUM",
            format!("no implementation for numeric type {}", other),
        )),
    }
}

fn create_count(
    argument_types: &[SqlType],
    _init: &AggregateFunctionInitArguments,
    _config: &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    Ok(Arc::new(TypedAggregateFunction::new(
        "COUNT",
        COUNT_DESCRIPTION,
        argument_types.to_vec(),
        SqlType::BigInt,
        SqlType::BigInt,
        CountAggregate,
    )))
}

register_aggregate_function!(
    name: "SUM",
    aliases: [],
    arity: 1,
    description: SUM_DESCRIPTION,
    factory: create_sum
);

register_aggregate_function!(
    name: "COUNT",
    aliases: [],
    arity: 1,
    description: COUNT_DESCRIPTION,
    factory: create_count
);
