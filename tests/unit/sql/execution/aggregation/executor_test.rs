//! The calling convention the engine uses: one state row per key and window

use crate::unit::test_utils::init_logger;
use velostream_aggregates::velostream::sql::error::AggregateError;
use velostream_aggregates::velostream::sql::execution::aggregation::{
    AggregateCallSpec, AggregateFunctionRegistry, AggregateState, AggregationExecutor,
};
use velostream_aggregates::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};

fn schema() -> Vec<SqlType> {
    vec![SqlType::String, SqlType::Integer, SqlType::Double]
}

fn row(name: &str, qty: Option<i32>, price: f64) -> Vec<FieldValue> {
    vec![
        FieldValue::string(name),
        qty.map(FieldValue::Integer).unwrap_or(FieldValue::Null),
        FieldValue::Double(price),
    ]
}

fn compile() -> AggregationExecutor {
    init_logger();
    let specs = [
        AggregateCallSpec::new("MIN", 0),
        AggregateCallSpec::new("MAX", 1),
        AggregateCallSpec::new("SUM", 1),
        AggregateCallSpec::new("COUNT", 1),
        AggregateCallSpec::new("AVG", 2),
        AggregateCallSpec::new("TOPK", 2).with_init_args(vec![FieldValue::Integer(2)]),
    ];
    AggregationExecutor::compile(&AggregateFunctionRegistry::new(), &schema(), &specs).unwrap()
}

#[test]
fn test_return_types_follow_call_order() {
    let executor = compile();
    assert_eq!(
        executor.return_types(),
        vec![
            SqlType::String,
            SqlType::Integer,
            SqlType::BigInt,
            SqlType::BigInt,
            SqlType::Double,
            SqlType::array(SqlType::Double),
        ]
    );
    assert_eq!(executor.calls().len(), 6);
}

#[test]
fn test_fresh_window_emits_nulls_and_zero_count() {
    let executor = compile();
    let result = executor.result(&executor.initialize()).unwrap();
    assert_eq!(
        result,
        vec![
            FieldValue::Null,
            FieldValue::Null,
            FieldValue::Null,
            FieldValue::BigInt(0),
            FieldValue::Null,
            FieldValue::Null,
        ]
    );
}

#[test]
fn test_apply_then_merge_partials() {
    let executor = compile();
    let key = GenericKey::single(FieldValue::string("orders"));

    let mut left = executor.initialize();
    for r in [row("kiwi", Some(3), 2.0), row("banana", None, 4.0)] {
        left = executor.apply(&r, left).unwrap();
    }

    let mut right = executor.initialize();
    for r in [row("cherry", Some(7), 1.0), row("date", Some(-1), 5.0)] {
        right = executor.apply(&r, right).unwrap();
    }

    let merged = executor.merge(&key, left, right).unwrap();
    assert_eq!(
        executor.result(&merged).unwrap(),
        vec![
            FieldValue::string("banana"),
            FieldValue::Integer(7),
            FieldValue::BigInt(9),
            FieldValue::BigInt(3),
            FieldValue::Double(3.0),
            FieldValue::Array(vec![FieldValue::Double(5.0), FieldValue::Double(4.0)]),
        ]
    );
}

#[test]
fn test_merge_with_empty_window_keeps_partial() {
    let executor = compile();
    let key = GenericKey::default();
    let partial = executor
        .apply(&row("fig", Some(2), 8.0), executor.initialize())
        .unwrap();

    let merged = executor
        .merge(&key, executor.initialize(), partial.clone())
        .unwrap();
    assert_eq!(merged, partial);
}

#[test]
fn test_argument_index_out_of_range_fails_compilation() {
    let err = AggregationExecutor::compile(
        &AggregateFunctionRegistry::new(),
        &schema(),
        &[AggregateCallSpec::new("MAX", 3)],
    )
    .unwrap_err();
    assert_eq!(err, AggregateError::ArgumentIndexOutOfRange { index: 3, width: 3 });
}

#[test]
fn test_one_bad_call_rejects_the_query() {
    let schema = vec![SqlType::Integer, SqlType::map(SqlType::Integer)];
    let err = AggregationExecutor::compile(
        &AggregateFunctionRegistry::new(),
        &schema,
        &[AggregateCallSpec::new("MAX", 0), AggregateCallSpec::new("MIN", 1)],
    )
    .unwrap_err();
    assert!(matches!(err, AggregateError::UnsupportedType { ref function, .. } if function == "MIN"));
}

#[test]
fn test_state_width_mismatch_is_internal() {
    let executor = compile();
    let mut states = executor.initialize();
    states.pop();

    let err = executor.apply(&row("x", Some(1), 1.0), states).unwrap_err();
    assert!(matches!(err, AggregateError::Internal { .. }));

    let err = executor
        .merge(&GenericKey::default(), executor.initialize(), vec![])
        .unwrap_err();
    assert!(matches!(err, AggregateError::Internal { .. }));
}

#[test]
fn test_short_row_is_internal() {
    let executor = compile();
    let err = executor
        .apply(&[FieldValue::string("only")], executor.initialize())
        .unwrap_err();
    assert!(matches!(err, AggregateError::Internal { .. }));
}

#[test]
fn test_wrongly_typed_row_is_internal() {
    let executor = compile();
    let bad = vec![
        FieldValue::Integer(1),
        FieldValue::Integer(1),
        FieldValue::Double(1.0),
    ];
    let err = executor.apply(&bad, executor.initialize()).unwrap_err();
    match err {
        AggregateError::Internal { function, .. } => assert_eq!(function, "MIN"),
        other => panic!("expected Internal, got {:?}", other),
    }
}

#[test]
fn test_uninitialized_row_is_distinct_from_null_values() {
    let executor = compile();
    let states = executor
        .apply(
            &[FieldValue::Null, FieldValue::Null, FieldValue::Null],
            executor.initialize(),
        )
        .unwrap();
    // NULL input leaves MIN untouched; COUNT starts active
    assert_eq!(states[0], AggregateState::Uninitialized);
    assert_eq!(states[3], AggregateState::Active(FieldValue::BigInt(0)));
}
