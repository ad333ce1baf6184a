mod common;

use common::*;
use lyra_runtime::{ErrorKind, Value};

#[test]
fn len_over_builtin_shapes() {
    let mut rt = rt();
    assert_eq!(as_int(&rt.call_global("len", &[ints(&[1, 2, 3])]).unwrap()), 3);
    assert_eq!(
        as_int(&rt.call_global("len", &[Value::str("héllo")]).unwrap()),
        5
    );
    assert_eq!(
        as_int(&rt.call_global("len", &[Value::bytes(vec![1, 2])]).unwrap()),
        2
    );
    assert_eq!(
        as_int(&rt.call_global("len", &[Value::tuple(vec![Value::None])]).unwrap()),
        1
    );
    let err = rt.call_global("len", &[Value::Int(5)]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("'int' has no len()"));
}

#[test]
fn all_any_identities() {
    let mut rt = rt();
    assert!(as_bool(&rt.call_global("all", &[Value::list(vec![])]).unwrap()));
    assert!(!as_bool(&rt.call_global("any", &[Value::list(vec![])]).unwrap()));
    let bools = Value::list(vec![Value::Bool(true), Value::Bool(true)]);
    assert!(as_bool(&rt.call_global("all", &[bools]).unwrap()));
    let falsy = Value::list(vec![Value::Bool(false), Value::Int(0), Value::str("")]);
    assert!(!as_bool(&rt.call_global("any", &[falsy]).unwrap()));
}

#[test]
fn all_any_packed_fast_paths() {
    let mut rt = rt();
    // IntPacked storage without boxing
    assert!(as_bool(&rt.call_global("all", &[ints(&[1, 2, 3])]).unwrap()));
    assert!(!as_bool(&rt.call_global("all", &[ints(&[1, 0])]).unwrap()));
    assert!(as_bool(&rt.call_global("any", &[ints(&[0, 0, 7])]).unwrap()));
}

#[test]
fn all_short_circuits() {
    let mut rt = rt();
    // the poison value after the first falsy element is never truth-tested
    let items = Value::list(vec![Value::Int(0), Value::str("never reached")]);
    assert!(!as_bool(&rt.call_global("all", &[items]).unwrap()));
}

#[test]
fn min_max_forms() {
    let mut rt = rt();
    assert_eq!(as_int(&rt.call_global("min", &[ints(&[3, 1, 2])]).unwrap()), 1);
    assert_eq!(as_int(&rt.call_global("max", &[ints(&[3, 1, 2])]).unwrap()), 3);
    // multi-argument form
    assert_eq!(
        as_int(&rt.call_global("min", &[Value::Int(4), Value::Int(9)]).unwrap()),
        4
    );
}

#[test]
fn min_empty_raises_unless_default() {
    let mut rt = rt();
    let err = rt.call_global("min", &[Value::list(vec![])]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValueError);
    assert!(err.message.contains("empty sequence"));

    let f = rt.get_global("min").unwrap();
    let r = rt
        .call_kw(&f, &[Value::list(vec![])], &[kw("default", Value::Int(5))])
        .unwrap();
    assert_eq!(as_int(&r), 5);
}

#[test]
fn min_default_rejected_with_multiple_args() {
    let mut rt = rt();
    let f = rt.get_global("min").unwrap();
    let err = rt
        .call_kw(
            &f,
            &[Value::Int(1), Value::Int(2)],
            &[kw("default", Value::Int(5))],
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn min_key_applied_once_per_candidate() {
    let mut rt = rt();
    // key = abs via the builtin; -1 has the smallest absolute value
    let abs_f = rt.get_global("abs").unwrap();
    let f = rt.get_global("min").unwrap();
    let r = rt
        .call_kw(&f, &[ints(&[-5, 3, -1])], &[kw("key", abs_f)])
        .unwrap();
    assert_eq!(as_int(&r), -1);
}

#[test]
fn sum_int_path_and_promotion() {
    let mut rt = rt();
    assert_eq!(as_int(&rt.call_global("sum", &[ints(&[1, 2, 3])]).unwrap()), 6);
    // overflow leaves native width but stays exact
    let big = rt
        .call_global("sum", &[ints(&[i64::MAX, i64::MAX, 2])])
        .unwrap();
    let expected = num_bigint::BigInt::from(i64::MAX) * 2 + 2;
    match big {
        Value::Big(b) => assert_eq!(*b, expected),
        other => panic!("expected Big, got {other:?}"),
    }
}

#[test]
fn sum_switches_to_float_and_generic() {
    let mut rt = rt();
    let mixed = Value::list(vec![Value::Int(1), Value::Float(0.5), Value::Int(2)]);
    let r = rt.call_global("sum", &[mixed]).unwrap();
    assert_eq!(as_f64(&r), 3.5);

    let with_start = rt
        .call_global("sum", &[ints(&[1, 2]), Value::Float(0.5)])
        .unwrap();
    assert_eq!(as_f64(&with_start), 3.5);
}

#[test]
fn sum_rejects_string_start() {
    let mut rt = rt();
    let err = rt
        .call_global("sum", &[Value::list(vec![]), Value::str("")])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("can't sum strings"));
}

#[test]
fn sorted_is_stable_and_keyed() {
    let mut rt = rt();
    let r = rt.call_global("sorted", &[ints(&[3, 1, 2])]).unwrap();
    match &r {
        Value::List(l) => assert_eq!(l.borrow().as_int_slice(), Some(&[1i64, 2, 3][..])),
        other => panic!("expected list, got {other:?}"),
    }

    let f = rt.get_global("sorted").unwrap();
    let abs_f = rt.get_global("abs").unwrap();
    let r = rt
        .call_kw(&f, &[ints(&[-3, 1, -2])], &[kw("key", abs_f)])
        .unwrap();
    match &r {
        Value::List(l) => assert_eq!(l.borrow().as_int_slice(), Some(&[1i64, -2, -3][..])),
        other => panic!("expected list, got {other:?}"),
    }

    let r = rt
        .call_kw(&f, &[ints(&[3, 1, 2])], &[kw("reverse", Value::Bool(true))])
        .unwrap();
    match &r {
        Value::List(l) => assert_eq!(l.borrow().as_int_slice(), Some(&[3i64, 2, 1][..])),
        other => panic!("expected list, got {other:?}"),
    }
}

#[test]
fn sorted_incomparable_raises() {
    let mut rt = rt();
    let mixed = Value::list(vec![Value::Int(1), Value::str("a")]);
    let err = rt.call_global("sorted", &[mixed]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("'<' not supported"));
}

#[test]
fn iter_next_protocol() {
    let mut rt = rt();
    let it = rt.call_global("iter", &[ints(&[10, 20])]).unwrap();
    assert_eq!(as_int(&rt.call_global("next", &[it.clone()]).unwrap()), 10);
    assert_eq!(as_int(&rt.call_global("next", &[it.clone()]).unwrap()), 20);
    // exhaustion becomes StopIteration only at the boundary
    let err = rt.call_global("next", &[it.clone()]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StopIteration);
    // a supplied default suppresses it
    let r = rt.call_global("next", &[it, Value::Int(-1)]).unwrap();
    assert_eq!(as_int(&r), -1);
}

#[test]
fn next_distinguishes_non_iterator_from_exhausted() {
    let mut rt = rt();
    let err = rt.call_global("next", &[ints(&[1])]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("not an iterator"));
}

#[test]
fn iter_callable_sentinel_form() {
    let mut rt = rt();
    // globals() returns the same live dict every call, so using it as its
    // own sentinel exhausts the callable-iterator on the first step
    let globals_f = rt.get_global("globals").unwrap();
    let sentinel = rt.call_global("globals", &[]).unwrap();
    let it = rt.call_global("iter", &[globals_f, sentinel]).unwrap();
    let err = rt.call_global("next", &[it]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::StopIteration);

    let err = rt
        .call_global("iter", &[Value::Int(1), Value::Int(0)])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn string_and_dict_iteration() {
    let mut rt = rt();
    let it = rt.call_global("iter", &[Value::str("ab")]).unwrap();
    let a = rt.call_global("next", &[it.clone()]).unwrap();
    assert!(matches!(&a, Value::Str(s) if &**s == "a"));
    let b = rt.call_global("next", &[it.clone()]).unwrap();
    assert!(matches!(&b, Value::Str(s) if &**s == "b"));
    assert!(rt.call_global("next", &[it]).is_err());

    let it = rt.call_global("iter", &[Value::bytes(vec![7, 8])]).unwrap();
    assert_eq!(as_int(&rt.call_global("next", &[it.clone()]).unwrap()), 7);
    assert_eq!(as_int(&rt.call_global("next", &[it]).unwrap()), 8);
}
