//! TOPK(column, k): the k highest values of a column, highest first.
//!
//! `k` is an init argument, fixed when the query is compiled. The state is
//! the current top-k list, so merging two partial states is "top k of the
//! union", which does not depend on merge order.

use super::function::{AggregateFunction, AggregateFunctionInitArguments, TypedAggregateFunction};
use super::ordering::{sort_descending, SqlOrd};
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

const TOPK_DESCRIPTION: &str =
    "Returns the k highest values of a column within a window, highest first.";

#[derive(Debug)]
pub struct TopKAggregate<T> {
    k: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: SqlOrd> TopKAggregate<T> {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            _marker: PhantomData,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn insert(&self, mut top: Vec<T>, value: T) -> Vec<T> {
        // First position whose element ranks strictly below `value`; ties stay ahead.
        let at = top
            .iter()
            .position(|existing| value.sql_cmp(existing) == std::cmp::Ordering::Greater)
            .unwrap_or(top.len());
        if at < self.k {
            top.insert(at, value);
            top.truncate(self.k);
        }
        top
    }
}

impl<T> Udaf for TopKAggregate<T>
where
    T: SqlOrd + Clone + Send + Sync + 'static,
{
    type Input = T;
    type State = Vec<T>;
    type Output = Vec<T>;

    fn update(&self, value: Option<T>, state: AggregateState<Vec<T>>) -> AggregateState<Vec<T>> {
        match value {
            None => state,
            Some(v) => {
                let top = state.into_active().unwrap_or_default();
                AggregateState::Active(self.insert(top, v))
            }
        }
    }

    fn merge(
        &self,
        _key: &GenericKey,
        left: AggregateState<Vec<T>>,
        right: AggregateState<Vec<T>>,
    ) -> AggregateState<Vec<T>> {
        left.combine_with(right, |mut a, b| {
            a.extend(b);
            sort_descending(&mut a);
            a.truncate(self.k);
            a
        })
    }

    fn output(&self, state: &AggregateState<Vec<T>>) -> Option<Vec<T>> {
        state.as_active().cloned()
    }
}

fn create_topk(
    argument_types: &[SqlType],
    init: &AggregateFunctionInitArguments,
    config: &AggregationConfig,
) -> AggregateResult<Arc<dyn AggregateFunction>> {
    let ty = argument_types
        .first()
        .ok_or_else(|| AggregateError::internal("TOPK", "resolved without an argument type"))?;

    if !ty.is_orderable() {
        return Err(AggregateError::unsupported_type(
            "TOPK",
            ty,
            argument_types,
            "type has no ordering",
        ));
    }
    if init.len() != 1 {
        return Err(AggregateError::invalid_init_arguments(
            "TOPK",
            format!("expected exactly one init argument (k), got {}", init.len()),
        ));
    }
    let k = init.positive_integer(0, "TOPK")?;
    if k > config.max_top_k {
        return Err(AggregateError::invalid_init_arguments(
            "TOPK",
            format!("k = {} exceeds the configured maximum of {}", k, config.max_top_k),
        ));
    }

    fn bind<T: SqlOrd + SqlValue>(ty: &SqlType, k: usize) -> Arc<dyn AggregateFunction> {
        let list = SqlType::array(ty.clone());
        Arc::new(TypedAggregateFunction::new(
            "TOPK",
            TOPK_DESCRIPTION,
            vec![ty.clone()],
            list.clone(),
            list,
            TopKAggregate::<T>::new(k),
        ))
    }

    match ty {
        SqlType::Integer => Ok(bind::<i32>(ty, k)),
        SqlType::BigInt => Ok(bind::<i64>(ty, k)),
        SqlType::Double => Ok(bind::<f64>(ty, k)),
        SqlType::Decimal { .. } => Ok(bind::<Decimal>(ty, k)),
        SqlType::String => Ok(bind::<String>(ty, k)),
        SqlType::Boolean => Ok(bind::<bool>(ty, k)),
        SqlType::Date => Ok(bind::<NaiveDate>(ty, k)),
        SqlType::Timestamp => Ok(bind::<NaiveDateTime>(ty, k)),
        other => Err(AggregateError::internal(
            "TOPK",
            format!("no implementation for orderable type {}", other),
        )),
    }
}

register_aggregate_function!(
    name: "TOPK",
    aliases: [],
    arity: 1,
    description: TOPK_DESCRIPTION,
    factory: create_topk
);
