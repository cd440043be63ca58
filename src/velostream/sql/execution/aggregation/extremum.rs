//! MAX and MIN.
//!
//! One generic [`Extremum`] is instantiated per value type and direction at
//! resolution time. `update` and `merge` share the same comparison, so a
//! partial extremum merges with another exactly as a value would.

use super::function::{AggregateFunction, AggregateFunctionInitArguments, TypedAggregateFunction};
use super::ordering::{Greatest, Least, RankDirection, SqlOrd};
use super::udaf::{AggregateState, Udaf};
use super::value::SqlValue;
use crate::register_aggregate_function;
use crate::velostream::config::AggregationConfig;
use crate::velostream::sql::error::{AggregateError, AggregateResult};
use crate::velostream::sql::execution::types::{GenericKey, SqlType};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::marker::PhantomData;
use std::sync::Arc;

const MAX_DESCRIPTION: &str = "Returns the maximum value observed for a column within a window.";
const MIN_DESCRIPTION: &str = "Returns the minimum value observed for a column within a window.";

/// Keeps the value ranked furthest in direction `D`.
#[derive(Debug)]
pub struct Extremum<T, D> {
    _marker: PhantomData<fn() -> (T, D)>,
}

pub type MaxAggregate<T> = Extremum<T, Greatest>;
pub type MinAggregate<T> = Extremum<T, Least>;

impl<T, D> Extremum<T, D> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T, D> Default for Extremum<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, D> Extremum<T, D>
where
    T: SqlOrd,
    D: RankDirection,
{
    #[inline]
    fn pick(current: T, candidate: T) -> T {
        if D::ranks_past(&candidate, &current) {
            candidate
        } else {
            current
        }
    }
}

impl<T, D> Udaf for Extremum<T, D>
where
    T: SqlOrd + Clone + Send + Sync + 'static,
    D: RankDirection,
{
    type Input = T;
    type State = T;
    type Output = T;

    #[inline]
    fn update(&self, value: Option<T>, state: AggregateState<T>) -> AggregateState<T> {
        match (value, state) {
            (None, state) => state,
            (Some(v), AggregateState::Uninitialized) => AggregateState::Active(v),
            (Some(v), AggregateState::Active(current)) => {
                AggregateState::Active(Self::pick(current, v))
            }
        }
    }

    #[inline]
    fn merge(
        &self,
        _key: &GenericKey,
        left: AggregateState<T>,
        right: AggregateState<T>,
    ) -> AggregateState<T> {
        left.combine_with(right, Self::pick)
    }

    fn output(&self, state: &AggregateState<T>) -> Option<T> {
        state.as_active().cloned()
    }
}

fn create_max(
    argument_types: &[SqlType],
    _init: &AggregateFunctionInitArguments,
    _config: &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    create_extremum::<Greatest>(argument_types, MAX_DESCRIPTION)
}

fn create_min(
    argument_types: &[SqlType],
    _init: &AggregateFunctionInitArguments,
    _config: &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    create_extremum::<Least>(argument_types, MIN_DESCRIPTION)
}

/// Pick the instantiation for the argument type. This is the only place the
/// SQL type is matched; the returned function runs monomorphized code.
fn create_extremum<D: RankDirection>(
    argument_types: &[SqlType],
    description: &'static str,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    let ty = argument_types.first().ok_or_else(|| {
        AggregateError::internal(D::FUNCTION_NAME, "resolved without an argument type")
    })?;

    if !ty.is_orderable() {
        return Err(AggregateError::unsupported_type(
            D::FUNCTION_NAME,
            ty,
            argument_types,
            "type has no ordering",
        ));
    }

    fn bind<T, D>(ty: &SqlType, description: &'static str) -> Arc<dyn AggregateFunction>
    where
        T: SqlOrd + SqlValue,
        D: RankDirection,
    {
        Arc::new(TypedAggregateFunction::new(
            D::FUNCTION_NAME,
            description,
            vec![ty.clone()],
            ty.clone(),
            ty.clone(),
            Extremum::<T, D>::new(),
        ))
    }

    match ty {
        SqlType::Integer => Ok(bind::<i32, D>(ty, description)),
        SqlType::BigInt => Ok(bind::<i64, D>(ty, description)),
        SqlType::Double => Ok(bind::<f64, D>(ty, description)),
        SqlType::Decimal { .. } => Ok(bind::<Decimal, D>(ty, description)),
        SqlType::String => Ok(bind::<String, D>(ty, description)),
        SqlType::Boolean => Ok(bind::<bool, D>(ty, description)),
        SqlType::Date => Ok(bind::<NaiveDate, D>(ty, description)),
        SqlType::Timestamp => Ok(bind::<NaiveDateTime, D>(ty, description)),
        other => Err(AggregateError::internal(
            D::FUNCTION_NAME,
            format!("no implementation for orderable type {}", other),
        )),
    }
}

register_aggregate_function!(
    name: "MAX",
    aliases: [],
    arity: 1,
    description: MAX_DESCRIPTION,
    factory: create_max
);

register_aggregate_function!(
    name: "MIN",
    aliases: [],
    arity: 1,
    description: MIN_DESCRIPTION,
    factory: create_min
);
