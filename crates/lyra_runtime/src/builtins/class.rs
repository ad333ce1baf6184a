//! Class construction.
//!
//! `__build_class__` runs the six-step protocol: base rewriting through
//! `__mro_entries__`, most-derived-metaclass resolution, the `__prepare__`
//! namespace hook, class-body execution against that namespace, recording
//! the original bases when rewriting fired, and finally calling the
//! metaclass.

use std::rc::Rc;

use super::common::*;
use crate::core::type_obj::{TypeObject, is_subtype};
use crate::core::value::{DictKey, KwArgs, Value, dict_new};
use crate::errors::{RunResult, messages, runtime_error, type_error};
use crate::runtime::Runtime;

pub fn builtin_build_class(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    if args.len() < 2 {
        return Err(type_error("__build_class__: not enough arguments"));
    }
    let body = &args[0];
    if !body.is_callable() && !matches!(body, Value::Code(_)) {
        return Err(type_error("__build_class__: func must be a function"));
    }
    let name = match &args[1] {
        Value::Str(s) => s.clone(),
        _ => return Err(type_error("__build_class__: name is not a string")),
    };
    let orig_bases: Vec<Value> = args[2..].to_vec();

    let mut metaclass_kw: Option<Value> = None;
    let mut passthrough_kw: Vec<(Rc<str>, Value)> = Vec::new();
    for (k, v) in kwargs {
        if &**k == "metaclass" {
            metaclass_kw = Some(v.clone());
        } else {
            passthrough_kw.push((k.clone(), v.clone()));
        }
    }

    // 1. rewrite bases through __mro_entries__
    let (bases, rewrote) = resolve_mro_entries(rt, &orig_bases)?;

    // 2. determine the winning metaclass
    let meta = match metaclass_kw {
        Some(m) => m,
        None => {
            if bases.is_empty() {
                Value::Type(rt.core_types.type_.clone())
            } else {
                Value::Type(rt.get_class(&bases[0]))
            }
        }
    };
    let meta = match meta {
        Value::Type(seed) => {
            let mut winner = seed;
            for base in &bases {
                if !matches!(base, Value::Type(_)) {
                    return Err(type_error(format!(
                        "bases must be types, got {}",
                        base.type_name()
                    )));
                }
                let base_meta = rt.get_class(base);
                if is_subtype(&winner, &base_meta) {
                    continue;
                }
                if is_subtype(&base_meta, &winner) {
                    winner = base_meta;
                    continue;
                }
                return Err(type_error(messages::METACLASS_CONFLICT));
            }
            Value::Type(winner)
        }
        // a non-class metaclass is used exactly as given
        other => other,
    };

    // 3. namespace preparation
    let namespace = match lookup_prepare(rt, &meta) {
        Some(prepare) => {
            let ns = rt.call_reentrant_kw(
                &prepare,
                &[Value::Str(name.clone()), Value::tuple(bases.clone())],
                &passthrough_kw,
            )?;
            let mapping_ok = match &ns {
                Value::Dict(_) => true,
                Value::Object(o) => o.class.lookup("__setitem__").is_some(),
                _ => false,
            };
            if !mapping_ok {
                let meta_name = match &meta {
                    Value::Type(t) => t.name().to_string(),
                    other => other.type_name().to_string(),
                };
                return Err(type_error(format!(
                    "{meta_name}.__prepare__() must return a mapping, not {}",
                    ns.type_name()
                )));
            }
            ns
        }
        None => Value::dict(dict_new()),
    };

    // 4. run the class body against the namespace
    execute_body(rt, body, &namespace)?;

    // 5. remember what the caller wrote before rewriting
    if rewrote {
        set_namespace_entry(
            rt,
            &namespace,
            "__orig_bases__",
            Value::tuple(orig_bases.clone()),
        )?;
    }

    // 6. the metaclass builds the class object
    rt.call_reentrant_kw(
        &meta,
        &[Value::Str(name), Value::tuple(bases), namespace],
        &passthrough_kw,
    )
}

fn resolve_mro_entries(rt: &mut Runtime, bases: &[Value]) -> RunResult<(Vec<Value>, bool)> {
    let mut out = Vec::with_capacity(bases.len());
    let mut rewrote = false;
    for base in bases {
        if matches!(base, Value::Type(_)) {
            out.push(base.clone());
            continue;
        }
        match rt.lookup_special(base, "__mro_entries__") {
            Some(hook) => {
                let entries =
                    rt.call_reentrant(&hook, &[base.clone(), Value::tuple(bases.to_vec())])?;
                match entries {
                    Value::Tuple(items) => {
                        out.extend(items.iter().cloned());
                        rewrote = true;
                    }
                    _ => return Err(type_error("__mro_entries__ must return a tuple")),
                }
            }
            None => out.push(base.clone()),
        }
    }
    Ok((out, rewrote))
}

fn lookup_prepare(rt: &Runtime, meta: &Value) -> Option<Value> {
    match meta {
        Value::Type(t) => t.lookup("__prepare__"),
        other => rt.lookup_special(other, "__prepare__"),
    }
}

fn execute_body(rt: &mut Runtime, body: &Value, namespace: &Value) -> RunResult<()> {
    match body {
        Value::Code(code) => {
            let interpreter = rt
                .interpreter
                .clone()
                .ok_or_else(|| runtime_error("no interpreter configured"))?;
            let globals = interpreter.current_globals(rt)?;
            interpreter.invoke(rt, code, &globals, namespace)?;
            Ok(())
        }
        callable => {
            rt.call_reentrant(callable, &[namespace.clone()])?;
            Ok(())
        }
    }
}

fn set_namespace_entry(
    rt: &mut Runtime,
    namespace: &Value,
    key: &str,
    value: Value,
) -> RunResult<()> {
    match namespace {
        Value::Dict(d) => {
            d.borrow_mut().insert(DictKey::from_str(key), value);
            Ok(())
        }
        Value::Object(_) => {
            let hook = rt
                .lookup_special(namespace, "__setitem__")
                .ok_or_else(|| type_error("class namespace is not a mapping"))?;
            rt.call_reentrant(&hook, &[namespace.clone(), Value::str(key), value])?;
            Ok(())
        }
        _ => Err(type_error("class namespace is not a mapping")),
    }
}

/// `type(name, bases, dict)` — build a class object with a C3 MRO and the
/// given metaclass.
pub fn type_new(
    rt: &mut Runtime,
    metaclass: &Rc<TypeObject>,
    name: &Value,
    bases: &Value,
    namespace: &Value,
    _kwargs: &KwArgs,
) -> RunResult<Value> {
    let name = match name {
        Value::Str(s) => s.to_string(),
        _ => return Err(type_error("type() argument 1 must be str")),
    };
    let base_values = match bases {
        Value::Tuple(items) => items.to_vec(),
        _ => return Err(type_error("type() argument 2 must be tuple")),
    };
    let namespace = match namespace {
        Value::Dict(d) => d.borrow().clone(),
        _ => {
            return Err(type_error(format!(
                "type() argument 3 must be dict, not {}",
                namespace.type_name()
            )));
        }
    };

    let mut base_types = Vec::with_capacity(base_values.len());
    for b in &base_values {
        match b {
            Value::Type(t) => base_types.push(t.clone()),
            other => {
                return Err(type_error(format!(
                    "bases must be types, got {}",
                    other.type_name()
                )));
            }
        }
    }
    if base_types.is_empty() {
        base_types.push(rt.core_types.object.clone());
    }

    let ty = TypeObject::new_rc(name, base_types, namespace)?;
    *ty.class.borrow_mut() = Some(metaclass.clone());
    Ok(Value::Type(ty))
}
