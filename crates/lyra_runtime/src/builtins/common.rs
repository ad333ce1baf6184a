//! Shared argument-handling helpers for the builtin layer.

use crate::core::value::{KwArgs, Value, repr_value, str_value};
use crate::errors::{RunResult, type_error};
use crate::runtime::Runtime;

pub fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> RunResult<()> {
    if args.len() < min || args.len() > max {
        if min == max {
            return Err(type_error(format!(
                "{name}() takes exactly {min} argument{} ({} given)",
                if min == 1 { "" } else { "s" },
                args.len()
            )));
        }
        return Err(type_error(format!(
            "{name}() takes from {min} to {max} arguments ({} given)",
            args.len()
        )));
    }
    Ok(())
}

pub fn no_kwargs(name: &str, kwargs: &KwArgs) -> RunResult<()> {
    match kwargs.first() {
        None => Ok(()),
        Some((k, _)) => Err(type_error(format!(
            "{name}() got an unexpected keyword argument '{k}'"
        ))),
    }
}

pub fn check_kwargs(name: &str, kwargs: &KwArgs, allowed: &[&str]) -> RunResult<()> {
    for (k, _) in kwargs {
        if !allowed.contains(&&**k) {
            return Err(type_error(format!(
                "{name}() got an unexpected keyword argument '{k}'"
            )));
        }
    }
    Ok(())
}

pub fn kwarg<'a>(kwargs: &'a KwArgs, name: &str) -> Option<&'a Value> {
    kwargs.iter().find(|(k, _)| &**k == name).map(|(_, v)| v)
}

pub fn str_arg<'a>(name: &str, pos: &str, v: &'a Value) -> RunResult<&'a str> {
    match v {
        Value::Str(s) => Ok(s),
        _ => Err(type_error(format!(
            "{name}() {pos} must be str, not {}",
            v.type_name()
        ))),
    }
}

/// `str()` conversion honoring `__str__`/`__repr__` hooks on objects.
pub fn to_str(rt: &mut Runtime, v: &Value) -> RunResult<String> {
    if let Value::Object(_) = v {
        for hook_name in ["__str__", "__repr__"] {
            if let Some(hook) = rt.lookup_special(v, hook_name) {
                let r = rt.call_reentrant(&hook, &[v.clone()])?;
                return match r {
                    Value::Str(s) => Ok(s.to_string()),
                    _ => Err(type_error(format!(
                        "{hook_name} returned non-string (type {})",
                        r.type_name()
                    ))),
                };
            }
        }
    }
    Ok(str_value(v))
}

/// `repr()` conversion honoring the `__repr__` hook on objects.
pub fn to_repr(rt: &mut Runtime, v: &Value) -> RunResult<String> {
    if let Value::Object(_) = v {
        if let Some(hook) = rt.lookup_special(v, "__repr__") {
            let r = rt.call_reentrant(&hook, &[v.clone()])?;
            return match r {
                Value::Str(s) => Ok(s.to_string()),
                _ => Err(type_error(format!(
                    "__repr__ returned non-string (type {})",
                    r.type_name()
                ))),
            };
        }
    }
    Ok(repr_value(v))
}
