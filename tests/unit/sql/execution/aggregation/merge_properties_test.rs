//! Algebraic properties every aggregate must satisfy for partial aggregation
//! to be correct: absent is the identity, merge is commutative and
//! associative, and splitting the input never changes the result.

use crate::unit::test_utils::{active, fold, ints, resolve, strings};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use velostream_aggregates::velostream::sql::execution::aggregation::{
    AggregateFunction, AggregateFunctionInitArguments, AggregateFunctionRegistry, AggregateState,
    SqlOrd,
};
use velostream_aggregates::velostream::sql::execution::types::{FieldValue, GenericKey, SqlType};

fn sample_states(values: &[FieldValue]) -> Vec<AggregateState<FieldValue>> {
    let mut states = vec![AggregateState::Uninitialized];
    states.extend(values.iter().cloned().map(AggregateState::Active));
    states
}

fn assert_merge_laws(function: &dyn AggregateFunction, states: &[AggregateState<FieldValue>]) {
    assert_merge_laws_with(function, states, |a, b| a == b);
}

fn assert_merge_laws_with<F>(
    function: &dyn AggregateFunction,
    states: &[AggregateState<FieldValue>],
    same: F,
) where
    F: Fn(&AggregateState<FieldValue>, &AggregateState<FieldValue>) -> bool,
{
    let key = GenericKey::single(FieldValue::string("key-1"));
    let merge = |a: &AggregateState<FieldValue>, b: &AggregateState<FieldValue>| {
        function.merge(&key, a.clone(), b.clone()).unwrap()
    };

    for a in states {
        assert!(same(&merge(a, &AggregateState::Uninitialized), a), "right identity for {:?}", a);
        assert!(same(&merge(&AggregateState::Uninitialized, a), a), "left identity for {:?}", a);
        for b in states {
            let (ab, ba) = (merge(a, b), merge(b, a));
            assert!(same(&ab, &ba), "commutativity for {:?}, {:?}: {:?} vs {:?}", a, b, ab, ba);
            for c in states {
                let left = merge(&ab, c);
                let right = merge(a, &merge(b, c));
                assert!(
                    same(&left, &right),
                    "associativity for {:?}, {:?}, {:?}: {:?} vs {:?}",
                    a,
                    b,
                    c,
                    left,
                    right
                );
            }
        }
    }
}

/// Equality under SQL comparison, so NaN states compare equal to each other.
fn same_double(a: &AggregateState<FieldValue>, b: &AggregateState<FieldValue>) -> bool {
    match (a, b) {
        (AggregateState::Uninitialized, AggregateState::Uninitialized) => true,
        (
            AggregateState::Active(FieldValue::Double(x)),
            AggregateState::Active(FieldValue::Double(y)),
        ) => x.sql_cmp(y) == Ordering::Equal,
        _ => false,
    }
}

/// States produced by folding each group of inputs from a fresh state.
fn folded_states(
    function: &dyn AggregateFunction,
    groups: &[Vec<FieldValue>],
) -> Vec<AggregateState<FieldValue>> {
    let mut states = vec![AggregateState::Uninitialized];
    states.extend(
        groups
            .iter()
            .map(|group| fold(function, function.initial_state(), group)),
    );
    states
}

fn bigints(values: &[i64]) -> Vec<FieldValue> {
    values.iter().map(|v| FieldValue::BigInt(*v)).collect()
}

fn decimals(values: &[Decimal]) -> Vec<FieldValue> {
    values.iter().map(|v| FieldValue::Decimal(*v)).collect()
}

fn assert_partition_independence(function: &dyn AggregateFunction, values: &[FieldValue]) {
    let key = GenericKey::default();
    let whole = fold(function, function.initial_state(), values);
    for split in 0..=values.len() {
        let (head, tail) = values.split_at(split);
        let left = fold(function, function.initial_state(), head);
        let right = fold(function, function.initial_state(), tail);
        let merged = function.merge(&key, left, right).unwrap();
        assert_eq!(
            function.output(&merged).unwrap(),
            function.output(&whole).unwrap(),
            "split at {}",
            split
        );
    }

    // Interleaved partitions, as produced by hashing records across workers
    let evens: Vec<FieldValue> = values.iter().step_by(2).cloned().collect();
    let odds: Vec<FieldValue> = values.iter().skip(1).step_by(2).cloned().collect();
    let merged = function
        .merge(
            &key,
            fold(function, function.initial_state(), &odds),
            fold(function, function.initial_state(), &evens),
        )
        .unwrap();
    assert_eq!(function.output(&merged).unwrap(), function.output(&whole).unwrap());
}

#[test]
fn test_absent_update_is_identity() {
    for name in ["MAX", "MIN", "SUM", "AVG"] {
        let function = resolve(name, SqlType::Integer);
        assert_eq!(
            function.update(&FieldValue::Null, AggregateState::Uninitialized).unwrap(),
            AggregateState::Uninitialized,
            "{}",
            name
        );
        let state = function.update(&FieldValue::Integer(5), AggregateState::Uninitialized).unwrap();
        assert_eq!(function.update(&FieldValue::Null, state.clone()).unwrap(), state);
    }
}

#[test]
fn test_first_update_defines_extremum_state() {
    for name in ["MAX", "MIN"] {
        let function = resolve(name, SqlType::Integer);
        assert_eq!(
            function
                .update(&FieldValue::Integer(-7), AggregateState::Uninitialized)
                .unwrap(),
            active(FieldValue::Integer(-7))
        );
    }
}

#[test]
fn test_all_absent_folds_to_absent() {
    for name in ["MAX", "MIN"] {
        let function = resolve(name, SqlType::String);
        let values = vec![FieldValue::Null; 4];
        assert_eq!(
            fold(function.as_ref(), function.initial_state(), &values),
            AggregateState::Uninitialized
        );
    }
}

#[test]
fn test_fold_matches_true_extremum_with_interleaved_nulls() {
    let values = vec![
        FieldValue::Null,
        FieldValue::Integer(4),
        FieldValue::Integer(-3),
        FieldValue::Null,
        FieldValue::Integer(11),
        FieldValue::Integer(0),
        FieldValue::Null,
    ];
    let max = resolve("MAX", SqlType::Integer);
    let min = resolve("MIN", SqlType::Integer);
    assert_eq!(fold(max.as_ref(), max.initial_state(), &values), active(FieldValue::Integer(11)));
    assert_eq!(fold(min.as_ref(), min.initial_state(), &values), active(FieldValue::Integer(-3)));
}

#[test]
fn test_extremum_merge_laws() {
    let int_states = sample_states(&ints(&[-12, 0, 10, 12]));
    assert_merge_laws(resolve("MAX", SqlType::Integer).as_ref(), &int_states);
    assert_merge_laws(resolve("MIN", SqlType::Integer).as_ref(), &int_states);

    let string_states = sample_states(&strings(&["A", "B", "K", "P"]));
    assert_merge_laws(resolve("MAX", SqlType::String).as_ref(), &string_states);
    assert_merge_laws(resolve("MIN", SqlType::String).as_ref(), &string_states);

    let double_states = sample_states(&[
        FieldValue::Double(f64::NEG_INFINITY),
        FieldValue::Double(-0.0),
        FieldValue::Double(0.0),
        FieldValue::Double(1.5),
    ]);
    assert_merge_laws(resolve("MAX", SqlType::Double).as_ref(), &double_states);
    assert_merge_laws(resolve("MIN", SqlType::Double).as_ref(), &double_states);
}

#[test]
fn test_extremum_merge_laws_with_nan() {
    let states = sample_states(&[
        FieldValue::Double(f64::NAN),
        FieldValue::Double(-f64::NAN),
        FieldValue::Double(f64::INFINITY),
        FieldValue::Double(-0.0),
        FieldValue::Double(0.0),
        FieldValue::Double(f64::MIN),
    ]);
    for name in ["MAX", "MIN"] {
        assert_merge_laws_with(resolve(name, SqlType::Double).as_ref(), &states, same_double);
    }
}

#[test]
fn test_compound_merge_laws() {
    let sum_states = sample_states(&[
        FieldValue::BigInt(-4),
        FieldValue::BigInt(0),
        FieldValue::BigInt(9),
    ]);
    assert_merge_laws(resolve("SUM", SqlType::Integer).as_ref(), &sum_states);
    assert_merge_laws(resolve("COUNT", SqlType::String).as_ref(), &sample_states(&[
        FieldValue::BigInt(0),
        FieldValue::BigInt(2),
        FieldValue::BigInt(5),
    ]));

    let topk = AggregateFunctionRegistry::new()
        .resolve(
            "TOPK",
            &[SqlType::Integer],
            &AggregateFunctionInitArguments::new(vec![FieldValue::Integer(3)]),
        )
        .unwrap();
    let list = |v: &[i32]| FieldValue::Array(ints(v));
    let topk_states = sample_states(&[list(&[9, 2]), list(&[7, 5, 1]), list(&[8]), list(&[3, 3, 3])]);
    assert_merge_laws(topk.as_ref(), &topk_states);
}

#[test]
fn test_decimal_sum_merge_laws_at_range_boundary() {
    let sum = resolve("SUM", SqlType::decimal(28, 0));
    let groups = [
        decimals(&[Decimal::MAX]),
        decimals(&[Decimal::ONE]),
        decimals(&[Decimal::NEGATIVE_ONE]),
        decimals(&[Decimal::MIN]),
        decimals(&[Decimal::MAX, Decimal::MAX]),
        decimals(&[Decimal::ZERO]),
    ];
    assert_merge_laws(sum.as_ref(), &folded_states(sum.as_ref(), &groups));
}

#[test]
fn test_decimal_sum_overflowing_partial_does_not_change_total() {
    let sum = resolve("SUM", SqlType::decimal(28, 0));
    let key = GenericKey::default();
    let state = |v: Decimal| fold(sum.as_ref(), sum.initial_state(), &decimals(&[v]));
    let (max, one, minus_one) = (state(Decimal::MAX), state(Decimal::ONE), state(Decimal::NEGATIVE_ONE));

    let over = sum.merge(&key, max.clone(), one.clone()).unwrap();
    assert_eq!(sum.output(&over).unwrap(), FieldValue::Null);

    let left = sum.merge(&key, over, minus_one.clone()).unwrap();
    let right = sum
        .merge(&key, max, sum.merge(&key, one, minus_one).unwrap())
        .unwrap();
    assert_eq!(left, right);
    assert_eq!(sum.output(&left).unwrap(), FieldValue::Decimal(Decimal::MAX));
}

#[test]
fn test_avg_merge_laws() {
    let avg = resolve("AVG", SqlType::BigInt);
    let groups = [
        bigints(&[1 << 53]),
        bigints(&[1]),
        bigints(&[1, 1]),
        bigints(&[i64::MAX]),
        bigints(&[-5, 7, i64::MIN]),
    ];
    assert_merge_laws(avg.as_ref(), &folded_states(avg.as_ref(), &groups));

    let avg = resolve("AVG", SqlType::Integer);
    let groups = [ints(&[i32::MAX, i32::MAX]), ints(&[i32::MIN]), ints(&[3, -3, 0])];
    assert_merge_laws(avg.as_ref(), &folded_states(avg.as_ref(), &groups));

    let avg = resolve("AVG", SqlType::decimal(28, 2));
    let groups = [
        decimals(&[Decimal::new(105, 2), Decimal::new(-3, 1)]),
        decimals(&[Decimal::MAX]),
        decimals(&[Decimal::MIN]),
    ];
    assert_merge_laws(avg.as_ref(), &folded_states(avg.as_ref(), &groups));
}

#[test]
fn test_avg_bigint_is_exact_past_double_precision() {
    let avg = resolve("AVG", SqlType::BigInt);
    let key = GenericKey::default();
    let state = |v: i64| fold(avg.as_ref(), avg.initial_state(), &bigints(&[v]));
    let (big, one) = (state(1 << 53), state(1));

    let left_deep = avg
        .merge(&key, avg.merge(&key, big.clone(), one.clone()).unwrap(), one.clone())
        .unwrap();
    let right_deep = avg
        .merge(&key, big, avg.merge(&key, one.clone(), one).unwrap())
        .unwrap();
    assert_eq!(left_deep, right_deep);
    assert_eq!(
        avg.output(&left_deep).unwrap(),
        FieldValue::Double(((1i64 << 53) + 2) as f64 / 3.0)
    );
}

#[test]
fn test_partition_independence() {
    let values = ints(&[3, 5, 8, 2, 3, 4, 5, -1, 12, 7]);
    for name in ["MAX", "MIN", "SUM", "COUNT", "AVG"] {
        assert_partition_independence(resolve(name, SqlType::Integer).as_ref(), &values);
    }

    let mut with_nulls = strings(&["C", "F", "B", "E", "A", "D", "B"]);
    with_nulls.insert(3, FieldValue::Null);
    with_nulls.push(FieldValue::Null);
    for name in ["MAX", "MIN", "COUNT"] {
        assert_partition_independence(resolve(name, SqlType::String).as_ref(), &with_nulls);
    }
}

#[test]
fn test_merge_tree_shape_does_not_matter() {
    let max = resolve("MAX", SqlType::Integer);
    let key = GenericKey::default();
    let partials: Vec<AggregateState<FieldValue>> = [vec![3, 1], vec![], vec![9, 4], vec![7]]
        .iter()
        .map(|part| fold(max.as_ref(), max.initial_state(), &ints(part)))
        .collect();

    let left_deep = partials
        .iter()
        .cloned()
        .reduce(|acc, s| max.merge(&key, acc, s).unwrap())
        .unwrap();
    let right_deep = partials
        .iter()
        .rev()
        .cloned()
        .reduce(|acc, s| max.merge(&key, s, acc).unwrap())
        .unwrap();
    let balanced = max
        .merge(
            &key,
            max.merge(&key, partials[0].clone(), partials[1].clone()).unwrap(),
            max.merge(&key, partials[2].clone(), partials[3].clone()).unwrap(),
        )
        .unwrap();

    assert_eq!(left_deep, active(FieldValue::Integer(9)));
    assert_eq!(right_deep, left_deep);
    assert_eq!(balanced, left_deep);
}
