//! Container and iteration builtins.
//!
//! Each one dispatches over the closed set of representations with packed
//! fast paths where a list's storage allows, and a generic fallback through
//! the iterator protocol.

use super::common::*;
use crate::core::iter::IterState;
use crate::core::value::{KwArgs, Value, value_lt};
use crate::errors::{RunResult, type_error, value_error};
use crate::num;
use crate::runtime::Runtime;

pub fn builtin_len(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("len", kwargs)?;
    check_arity("len", args, 1, 1)?;
    let v = &args[0];
    let n: i64 = match v {
        Value::Str(s) => s.chars().count() as i64,
        Value::Bytes(b) => b.len() as i64,
        Value::List(l) => l.borrow().len() as i64,
        Value::Tuple(t) => t.len() as i64,
        Value::Dict(d) => d.borrow().len() as i64,
        Value::Object(_) => {
            let hook = rt.lookup_special(v, "__len__").ok_or_else(|| {
                type_error(format!("object of type '{}' has no len()", v.type_name()))
            })?;
            let r = rt.call_reentrant(&hook, &[v.clone()])?;
            let n = r.as_index("__len__")?;
            if n < 0 {
                return Err(value_error("__len__() should return >= 0"));
            }
            n
        }
        _ => {
            return Err(type_error(format!(
                "object of type '{}' has no len()",
                v.type_name()
            )));
        }
    };
    Ok(Value::Int(n))
}

pub fn builtin_iter(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("iter", kwargs)?;
    check_arity("iter", args, 1, 2)?;
    if args.len() == 2 {
        if !args[0].is_callable() {
            return Err(type_error("iter(v, w): v must be callable"));
        }
        return Ok(IterState::Callable {
            callable: args[0].clone(),
            sentinel: args[1].clone(),
            done: false,
        }
        .into_value());
    }
    rt.get_iter(&args[0])
}

pub fn builtin_next(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("next", kwargs)?;
    check_arity("next", args, 1, 2)?;
    let target = &args[0];
    // "not an iterator" (TypeError) is distinct from exhaustion
    // (StopIteration); exhaustion surfaces only here, at the boundary.
    let step = match target {
        Value::Iter(_) => rt.iter_next(target)?,
        Value::Object(o) => match o.class.lookup("__next__") {
            Some(hook) => match rt.call_reentrant(&hook, &[target.clone()]) {
                Ok(v) => Some(v),
                Err(e) if e.is(crate::errors::ErrorKind::StopIteration) => None,
                Err(e) => return Err(e),
            },
            None => {
                return Err(type_error(format!(
                    "'{}' object is not an iterator",
                    target.type_name()
                )));
            }
        },
        _ => {
            return Err(type_error(format!(
                "'{}' object is not an iterator",
                target.type_name()
            )));
        }
    };
    match step {
        Some(v) => Ok(v),
        None => match args.get(1) {
            Some(default) => Ok(default.clone()),
            None => Err(crate::errors::stop_iteration()),
        },
    }
}

pub fn builtin_all(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("all", kwargs)?;
    check_arity("all", args, 1, 1)?;
    if let Value::List(l) = &args[0] {
        let storage = l.borrow();
        if let Some(bools) = storage.as_bool_slice() {
            return Ok(Value::Bool(bools.iter().all(|b| *b)));
        }
        if let Some(ints) = storage.as_int_slice() {
            return Ok(Value::Bool(ints.iter().all(|i| *i != 0)));
        }
    }
    let it = rt.get_iter(&args[0])?;
    while let Some(item) = rt.iter_next(&it)? {
        if !rt.is_truthy(&item)? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn builtin_any(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("any", kwargs)?;
    check_arity("any", args, 1, 1)?;
    if let Value::List(l) = &args[0] {
        let storage = l.borrow();
        if let Some(bools) = storage.as_bool_slice() {
            return Ok(Value::Bool(bools.iter().any(|b| *b)));
        }
        if let Some(ints) = storage.as_int_slice() {
            return Ok(Value::Bool(ints.iter().any(|i| *i != 0)));
        }
    }
    let it = rt.get_iter(&args[0])?;
    while let Some(item) = rt.iter_next(&it)? {
        if rt.is_truthy(&item)? {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

pub fn builtin_min(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    min_max(rt, args, kwargs, "min", false)
}

pub fn builtin_max(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    min_max(rt, args, kwargs, "max", true)
}

fn min_max(
    rt: &mut Runtime,
    args: &[Value],
    kwargs: &KwArgs,
    name: &str,
    take_max: bool,
) -> RunResult<Value> {
    check_kwargs(name, kwargs, &["key", "default"])?;
    let key = kwarg(kwargs, "key").cloned().filter(|k| !k.is_none());
    let default = kwarg(kwargs, "default").cloned();
    if args.is_empty() {
        return Err(type_error(format!(
            "{name} expected at least 1 argument, got 0"
        )));
    }
    let it = if args.len() == 1 {
        rt.get_iter(&args[0])?
    } else {
        // multi-argument form forbids default=
        if default.is_some() {
            return Err(type_error(format!(
                "Cannot specify a default for {name}() with multiple positional arguments"
            )));
        }
        rt.get_iter(&Value::tuple(args.to_vec()))?
    };

    // (candidate key, candidate); the key function runs once per candidate
    let mut best: Option<(Value, Value)> = None;
    while let Some(item) = rt.iter_next(&it)? {
        let k = match &key {
            Some(kf) => rt.call_reentrant(kf, &[item.clone()])?,
            None => item.clone(),
        };
        best = match best {
            None => Some((k, item)),
            Some((best_k, best_v)) => {
                let replace = if take_max {
                    value_lt(&best_k, &k)?
                } else {
                    value_lt(&k, &best_k)?
                };
                if replace {
                    Some((k, item))
                } else {
                    Some((best_k, best_v))
                }
            }
        };
    }
    match best {
        Some((_, v)) => Ok(v),
        None => default.ok_or_else(|| value_error(format!("{name}() arg is an empty sequence"))),
    }
}

pub fn builtin_sum(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("sum", kwargs, &["start"])?;
    check_arity("sum", args, 1, 2)?;
    let start = args
        .get(1)
        .or_else(|| kwarg(kwargs, "start"))
        .cloned()
        .unwrap_or(Value::Int(0));
    match &start {
        Value::Str(_) => {
            return Err(type_error(
                "sum() can't sum strings [use ''.join(seq) instead]",
            ));
        }
        Value::Bytes(_) => {
            return Err(type_error(
                "sum() can't sum bytes [use b''.join(seq) instead]",
            ));
        }
        _ => {}
    }

    // Adaptive accumulator: stay native as long as consecutive items allow,
    // and merge the exact partial total arithmetically on every path exit.
    enum Acc {
        Int(i64),
        Float(f64),
        Generic(Value),
    }
    let mut acc = match &start {
        Value::Int(i) => Acc::Int(*i),
        Value::Bool(b) => Acc::Int(*b as i64),
        Value::Float(f) => Acc::Float(*f),
        other => Acc::Generic(other.clone()),
    };

    let it = rt.get_iter(&args[0])?;
    while let Some(item) = rt.iter_next(&it)? {
        acc = match acc {
            Acc::Int(total) => match &item {
                Value::Int(i) => match total.checked_add(*i) {
                    Some(t) => Acc::Int(t),
                    None => Acc::Generic(num::add(&Value::Int(total), &item)?),
                },
                Value::Bool(b) => match total.checked_add(*b as i64) {
                    Some(t) => Acc::Int(t),
                    None => Acc::Generic(num::add(&Value::Int(total), &item)?),
                },
                Value::Float(f) => Acc::Float(total as f64 + f),
                _ => Acc::Generic(num::add(&Value::Int(total), &item)?),
            },
            Acc::Float(total) => match &item {
                Value::Float(f) => Acc::Float(total + f),
                Value::Int(i) => Acc::Float(total + *i as f64),
                Value::Bool(b) => Acc::Float(total + (*b as i64) as f64),
                _ => Acc::Generic(num::add(&Value::Float(total), &item)?),
            },
            Acc::Generic(total) => Acc::Generic(num::add(&total, &item)?),
        };
    }
    Ok(match acc {
        Acc::Int(total) => Value::Int(total),
        Acc::Float(total) => Value::Float(total),
        Acc::Generic(total) => total,
    })
}

pub fn builtin_sorted(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("sorted", kwargs, &["key", "reverse"])?;
    check_arity("sorted", args, 1, 1)?;
    let key = kwarg(kwargs, "key").cloned().filter(|k| !k.is_none());
    let reverse = match kwarg(kwargs, "reverse") {
        Some(v) => rt.is_truthy(v)?,
        None => false,
    };

    let it = rt.get_iter(&args[0])?;
    let mut items = Vec::new();
    while let Some(item) = rt.iter_next(&it)? {
        items.push(item);
    }

    // decorate once per element
    let mut decorated: Vec<(Value, Value)> = Vec::with_capacity(items.len());
    for item in items {
        let k = match &key {
            Some(kf) => rt.call_reentrant(kf, &[item.clone()])?,
            None => item.clone(),
        };
        decorated.push((k, item));
    }

    // reverse-sort-reverse keeps the sort stable for equal keys
    if reverse {
        decorated.reverse();
    }
    let mut failed: Option<crate::errors::RunError> = None;
    decorated.sort_by(|a, b| {
        use std::cmp::Ordering;
        if failed.is_some() {
            return Ordering::Equal;
        }
        match value_lt(&a.0, &b.0) {
            Ok(true) => Ordering::Less,
            Ok(false) => match value_lt(&b.0, &a.0) {
                Ok(true) => Ordering::Greater,
                Ok(false) => Ordering::Equal,
                Err(e) => {
                    failed = Some(e);
                    Ordering::Equal
                }
            },
            Err(e) => {
                failed = Some(e);
                Ordering::Equal
            }
        }
    });
    if let Some(e) = failed {
        return Err(e);
    }
    if reverse {
        decorated.reverse();
    }
    Ok(Value::list(
        decorated.into_iter().map(|(_, v)| v).collect(),
    ))
}
