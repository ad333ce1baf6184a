//! Output builtins.

use super::common::*;
use crate::core::value::{KwArgs, Value};
use crate::errors::{RunResult, type_error};
use crate::runtime::Runtime;

pub fn builtin_print(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("print", kwargs, &["sep", "end", "file", "flush"])?;

    let sep = match kwarg(kwargs, "sep") {
        None | Some(Value::None) => " ".to_string(),
        Some(Value::Str(s)) => s.to_string(),
        Some(v) => {
            return Err(type_error(format!(
                "sep must be None or a string, not {}",
                v.type_name()
            )));
        }
    };
    let end = match kwarg(kwargs, "end") {
        None | Some(Value::None) => "\n".to_string(),
        Some(Value::Str(s)) => s.to_string(),
        Some(v) => {
            return Err(type_error(format!(
                "end must be None or a string, not {}",
                v.type_name()
            )));
        }
    };
    let file = kwarg(kwargs, "file").cloned().filter(|f| !f.is_none());
    let flush = match kwarg(kwargs, "flush") {
        Some(v) => rt.is_truthy(v)?,
        None => false,
    };

    // a detached stdout makes print a silent no-op
    if file.is_none() && !rt.stdout_connected() {
        return Ok(Value::None);
    }

    let mut text = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            text.push_str(&sep);
        }
        text.push_str(&to_str(rt, arg)?);
    }
    text.push_str(&end);

    match file {
        Some(target) => {
            // duck-typed stream: anything with a write method
            match rt.lookup_special(&target, "write") {
                Some(write) => {
                    rt.call_reentrant(&write, &[target.clone(), Value::str(text)])?;
                    if flush {
                        if let Some(flush_m) = rt.lookup_special(&target, "flush") {
                            rt.call_reentrant(&flush_m, &[target.clone()])?;
                        }
                    }
                }
                None => {
                    return Err(type_error(format!(
                        "'{}' object has no attribute 'write'",
                        target.type_name()
                    )));
                }
            }
        }
        None => {
            rt.write_output(&text);
            if flush {
                rt.flush_output();
            }
        }
    }
    Ok(Value::None)
}
