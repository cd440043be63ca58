//! States are plain values: they survive a checkpoint and aggregation resumes

use crate::unit::test_utils::{active, fold, ints, resolve};
use velostream_aggregates::velostream::sql::execution::aggregation::{
    AggregateFunctionInitArguments, AggregateFunctionRegistry, AggregateState,
};
use velostream_aggregates::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};

fn checkpoint(state: &AggregateState<FieldValue>) -> AggregateState<FieldValue> {
    let json = serde_json::to_string(state).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn test_uninitialized_survives_checkpoint() {
    let state: AggregateState<FieldValue> = AggregateState::Uninitialized;
    assert_eq!(checkpoint(&state), AggregateState::Uninitialized);
}

#[test]
fn test_avg_resumes_after_checkpoint() {
    let avg = resolve("AVG", SqlType::Integer);
    let before = fold(avg.as_ref(), avg.initial_state(), &ints(&[1, 2]));
    let restored = checkpoint(&before);
    assert_eq!(restored, before);

    let after = fold(avg.as_ref(), restored, &ints(&[6]));
    assert_eq!(avg.output(&after).unwrap(), FieldValue::Double(3.0));
}

#[test]
fn test_topk_resumes_after_checkpoint() {
    let topk = AggregateFunctionRegistry::new()
        .resolve(
            "TOPK",
            &[SqlType::BigInt],
            &AggregateFunctionInitArguments::new(vec![FieldValue::Integer(2)]),
        )
        .unwrap();
    let big = |v: &[i64]| -> Vec<FieldValue> { v.iter().map(|x| FieldValue::BigInt(*x)).collect() };

    let restored = checkpoint(&fold(topk.as_ref(), topk.initial_state(), &big(&[5, 1])));
    let resumed = fold(topk.as_ref(), restored, &big(&[3]));
    assert_eq!(
        resumed,
        active(FieldValue::Array(vec![FieldValue::BigInt(5), FieldValue::BigInt(3)]))
    );
}

#[test]
fn test_restored_partials_merge() {
    let min = resolve("MIN", SqlType::String);
    let key = GenericKey::single(FieldValue::Integer(1));

    let left = checkpoint(&active(FieldValue::string("P")));
    let right = checkpoint(&active(FieldValue::string("F")));
    let merged = min.merge(&key, left, right).unwrap();
    assert_eq!(merged, active(FieldValue::string("F")));
}
