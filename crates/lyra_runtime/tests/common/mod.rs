//! Shared helpers for the integration suites.
#![allow(dead_code)]

use std::rc::Rc;

use lyra_runtime::{RunResult, Runtime, Value};

pub fn rt() -> Runtime {
    Runtime::new()
}

pub fn ints(xs: &[i64]) -> Value {
    Value::list(xs.iter().map(|x| Value::Int(*x)).collect())
}

pub fn floats(xs: &[f64]) -> Value {
    Value::list(xs.iter().map(|x| Value::Float(*x)).collect())
}

pub fn kw(name: &str, value: Value) -> (Rc<str>, Value) {
    (Rc::from(name), value)
}

/// Call a member of an installed module namespace (math, codecs).
pub fn call_module(
    rt: &mut Runtime,
    module: &str,
    name: &str,
    args: &[Value],
) -> RunResult<Value> {
    let f = module_member(rt, module, name);
    rt.call(&f, args)
}

pub fn module_member(rt: &Runtime, module: &str, name: &str) -> Value {
    let ns = rt.get_global(module).expect("module installed");
    match ns {
        Value::Dict(d) => d
            .borrow()
            .get(&lyra_runtime::DictKey::from_str(name))
            .cloned()
            .unwrap_or_else(|| panic!("missing {module}.{name}")),
        other => panic!("{module} is not a namespace: {other:?}"),
    }
}

pub fn as_int(v: &Value) -> i64 {
    match v {
        Value::Int(i) => *i,
        Value::Bool(b) => *b as i64,
        other => panic!("expected int, got {other:?}"),
    }
}

pub fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Float(f) => *f,
        other => panic!("expected float, got {other:?}"),
    }
}

pub fn as_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        other => panic!("expected bool, got {other:?}"),
    }
}
