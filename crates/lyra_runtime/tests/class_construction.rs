mod common;

use common::*;
use lyra_runtime::{DictKey, ErrorKind, KwArgs, NativeFn, RunResult, Runtime, Value};

/// Class body that defines `answer = 42` in its namespace.
fn body_answer(_rt: &mut Runtime, args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
    match &args[0] {
        Value::Dict(d) => {
            d.borrow_mut()
                .insert(DictKey::from_str("answer"), Value::Int(42));
            Ok(Value::None)
        }
        other => panic!("body namespace should be a dict, got {other:?}"),
    }
}

fn empty_body(_rt: &mut Runtime, args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
    assert!(matches!(&args[0], Value::Dict(_) | Value::Object(_)));
    Ok(Value::None)
}

fn build(
    rt: &mut Runtime,
    name: &str,
    bases: &[Value],
    kwargs: &KwArgs,
) -> RunResult<Value> {
    let f = rt.get_global("__build_class__").unwrap();
    let mut args = vec![
        Value::function("body", body_answer as NativeFn),
        Value::str(name),
    ];
    args.extend_from_slice(bases);
    rt.call_kw(&f, &args, kwargs)
}

#[test]
fn simple_class_with_namespace() {
    let mut rt = rt();
    let cls = build(&mut rt, "Simple", &[], &[]).unwrap();
    let Value::Type(t) = &cls else {
        panic!("expected a class")
    };
    assert_eq!(t.name(), "Simple");
    assert_eq!(as_int(&rt.get_attr(&cls, "answer").unwrap()), 42);

    // instances see class attributes and satisfy isinstance
    let instance = rt.call(&cls, &[]).unwrap();
    assert_eq!(as_int(&rt.get_attr(&instance, "answer").unwrap()), 42);
    let r = rt
        .call_global("isinstance", &[instance, cls.clone()])
        .unwrap();
    assert!(as_bool(&r));
}

#[test]
fn not_enough_arguments_and_bad_name() {
    let mut rt = rt();
    let f = rt.get_global("__build_class__").unwrap();
    let err = rt.call(&f, &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("not enough arguments"));

    let err = rt
        .call(
            &f,
            &[
                Value::function("body", empty_body as NativeFn),
                Value::Int(3),
            ],
        )
        .unwrap_err();
    assert!(err.message.contains("name is not a string"));

    let err = rt
        .call(&f, &[Value::Int(1), Value::str("X")])
        .unwrap_err();
    assert!(err.message.contains("func must be a function"));
}

#[test]
fn single_inheritance_and_issubclass() {
    let mut rt = rt();
    let base = build(&mut rt, "Base", &[], &[]).unwrap();
    let derived = build(&mut rt, "Derived", &[base.clone()], &[]).unwrap();
    assert!(as_bool(
        &rt.call_global("issubclass", &[derived.clone(), base.clone()])
            .unwrap()
    ));
    assert!(!as_bool(
        &rt.call_global("issubclass", &[base, derived]).unwrap()
    ));
}

#[test]
fn metaclass_conflict_between_unrelated_metaclasses() {
    let mut rt = rt();
    let type_v = rt.get_global("type").unwrap();
    let mk_meta = |rt: &mut Runtime, name: &str| {
        rt.call(
            &type_v,
            &[
                Value::str(name),
                Value::tuple(vec![rt.get_global("type").unwrap()]),
                Value::dict(lyra_runtime::core::value::dict_new()),
            ],
        )
        .unwrap()
    };
    let meta1 = mk_meta(&mut rt, "Meta1");
    let meta2 = mk_meta(&mut rt, "Meta2");

    let a = build(&mut rt, "A", &[], &[kw("metaclass", meta1)]).unwrap();
    let b = build(&mut rt, "B", &[], &[kw("metaclass", meta2)]).unwrap();

    let err = build(&mut rt, "C", &[a.clone(), b.clone()], &[]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("metaclass conflict"), "{}", err.message);

    // a metaclass related to both bases' metaclasses is fine
    let c = build(&mut rt, "C2", &[a.clone()], &[]).unwrap();
    let cls_of = rt.call(&rt.get_global("type").unwrap().clone(), &[c]).unwrap();
    let r = rt
        .call_global("issubclass", &[cls_of, rt.get_global("type").unwrap()])
        .unwrap();
    assert!(as_bool(&r));
}

fn prepare_seeded(_rt: &mut Runtime, args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
    // (name, bases) arrive positionally
    assert!(matches!(&args[0], Value::Str(_)));
    assert!(matches!(&args[1], Value::Tuple(_)));
    let mut ns = lyra_runtime::core::value::dict_new();
    ns.insert(DictKey::from_str("seeded"), Value::str("by prepare"));
    Ok(Value::dict(ns))
}

fn prepare_bad(_rt: &mut Runtime, _args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
    Ok(Value::Int(3))
}

fn make_meta_with(rt: &mut Runtime, name: &str, attr: &str, f: NativeFn) -> Value {
    let mut ns = lyra_runtime::core::value::dict_new();
    ns.insert(DictKey::from_str(attr), Value::function("hook", f));
    let type_v = rt.get_global("type").unwrap();
    rt.call(
        &type_v,
        &[
            Value::str(name),
            Value::tuple(vec![rt.get_global("type").unwrap()]),
            Value::dict(ns),
        ],
    )
    .unwrap()
}

#[test]
fn prepare_hook_namespace_flows_into_class() {
    let mut rt = rt();
    let meta = make_meta_with(&mut rt, "SeedingMeta", "__prepare__", prepare_seeded);
    let cls = build(&mut rt, "Prepared", &[], &[kw("metaclass", meta)]).unwrap();
    // both the prepared seed and the body's own write are visible
    assert!(matches!(
        rt.get_attr(&cls, "seeded").unwrap(),
        Value::Str(s) if &*s == "by prepare"
    ));
    assert_eq!(as_int(&rt.get_attr(&cls, "answer").unwrap()), 42);
}

#[test]
fn prepare_returning_non_mapping_raises() {
    let mut rt = rt();
    let meta = make_meta_with(&mut rt, "BadMeta", "__prepare__", prepare_bad);
    let err = build(&mut rt, "Broken", &[], &[kw("metaclass", meta)]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(
        err.message.contains("__prepare__() must return a mapping"),
        "{}",
        err.message
    );
}

fn mro_entries_to_object(rt: &mut Runtime, _args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
    Ok(Value::tuple(vec![rt.get_global("object").unwrap()]))
}

#[test]
fn mro_entries_rewrites_bases_and_records_originals() {
    let mut rt = rt();
    // a pseudo-base: instance of a class carrying __mro_entries__
    let mut ns = lyra_runtime::core::value::dict_new();
    ns.insert(
        DictKey::from_str("__mro_entries__"),
        Value::function("__mro_entries__", mro_entries_to_object as NativeFn),
    );
    let type_v = rt.get_global("type").unwrap();
    let pseudo_cls = rt
        .call(
            &type_v,
            &[
                Value::str("PseudoGeneric"),
                Value::tuple(vec![]),
                Value::dict(ns),
            ],
        )
        .unwrap();
    let pseudo = rt.call(&pseudo_cls, &[]).unwrap();

    let cls = build(&mut rt, "Rewritten", &[pseudo.clone()], &[]).unwrap();
    let orig = rt.get_attr(&cls, "__orig_bases__").unwrap();
    match &orig {
        Value::Tuple(items) => {
            assert_eq!(items.len(), 1);
            assert!(lyra_runtime::values_equal(&items[0], &pseudo));
        }
        other => panic!("expected tuple, got {other:?}"),
    }
    // the rewritten base list made the class a plain object subclass
    let r = rt
        .call_global("issubclass", &[cls, rt.get_global("object").unwrap()])
        .unwrap();
    assert!(as_bool(&r));
}

#[test]
fn diamond_mro_is_c3_linearized() {
    let mut rt = rt();
    let a = build(&mut rt, "A", &[], &[]).unwrap();
    let b = build(&mut rt, "B", &[a.clone()], &[]).unwrap();
    let c = build(&mut rt, "C", &[a.clone()], &[]).unwrap();
    let d = build(&mut rt, "D", &[b.clone(), c.clone()], &[]).unwrap();
    let Value::Type(dt) = &d else { panic!() };
    let names: Vec<String> = dt.mro.borrow().iter().map(|t| t.name.clone()).collect();
    assert_eq!(names, ["D", "B", "C", "A", "object"]);
}

#[test]
fn class_namespace_preserves_insertion_order() {
    fn ordered_body(_rt: &mut Runtime, args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
        let Value::Dict(d) = &args[0] else { panic!() };
        for key in ["zeta", "alpha", "mid"] {
            d.borrow_mut().insert(DictKey::from_str(key), Value::None);
        }
        Ok(Value::None)
    }
    let mut rt = rt();
    let f = rt.get_global("__build_class__").unwrap();
    let cls = rt
        .call(
            &f,
            &[
                Value::function("body", ordered_body as NativeFn),
                Value::str("Ordered"),
            ],
        )
        .unwrap();
    let Value::Type(t) = &cls else { panic!() };
    let keys: Vec<String> = t
        .namespace
        .borrow()
        .keys()
        .filter_map(|k| k.as_str().map(str::to_string))
        .collect();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
}

fn instancecheck_always(_rt: &mut Runtime, _args: &[Value], _kwargs: &KwArgs) -> RunResult<Value> {
    Ok(Value::Bool(true))
}

#[test]
fn instancecheck_hook_consulted_after_exact_match() {
    let mut rt = rt();
    let meta = make_meta_with(&mut rt, "AnyMeta", "__instancecheck__", instancecheck_always);
    let anyclass = build(&mut rt, "Anything", &[], &[kw("metaclass", meta)]).unwrap();
    // not an instance by type, but the metaclass hook says yes
    let r = rt
        .call_global("isinstance", &[Value::Int(5), anyclass])
        .unwrap();
    assert!(as_bool(&r));
}
