//! Type checks, reflection, and the numeric builtin surface.

use std::rc::Rc;

use num_traits::Signed;

use super::common::*;
use crate::core::type_obj::{is_subtype, same_type};
use crate::core::value::{DictKey, KwArgs, Value};
use crate::errors::{RunResult, type_error, value_error};
use crate::num;
use crate::runtime::Runtime;

// ============================================================================
// isinstance / issubclass
// ============================================================================

pub fn builtin_isinstance(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("isinstance", kwargs)?;
    check_arity("isinstance", args, 2, 2)?;
    Ok(Value::Bool(isinstance_check(rt, &args[0], &args[1], 0)?))
}

fn isinstance_check(
    rt: &mut Runtime,
    obj: &Value,
    classinfo: &Value,
    depth: usize,
) -> RunResult<bool> {
    match classinfo {
        Value::Tuple(items) => {
            if depth >= rt.config().type_check_recursion_limit {
                // deep tuple nesting: explicit worklist instead of native
                // recursion, so hostile inputs cannot blow the stack
                let mut work: Vec<Value> = items.iter().rev().cloned().collect();
                while let Some(ci) = work.pop() {
                    match ci {
                        Value::Tuple(inner) => work.extend(inner.iter().rev().cloned()),
                        other => {
                            if isinstance_check(rt, obj, &other, 0)? {
                                return Ok(true);
                            }
                        }
                    }
                }
                return Ok(false);
            }
            for ci in items.iter() {
                if isinstance_check(rt, obj, ci, depth + 1)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Type(t) => {
            let cls = rt.get_class(obj);
            // exact-type match answers before any override hook runs
            if same_type(&cls, t) {
                return Ok(true);
            }
            if let Some(hook) = rt.lookup_special(classinfo, "__instancecheck__") {
                let r = rt.call_reentrant(&hook, &[classinfo.clone(), obj.clone()])?;
                return rt.is_truthy(&r);
            }
            Ok(is_subtype(&cls, t))
        }
        _ => Err(type_error(
            "isinstance() arg 2 must be a type or tuple of types",
        )),
    }
}

pub fn builtin_issubclass(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("issubclass", kwargs)?;
    check_arity("issubclass", args, 2, 2)?;
    Ok(Value::Bool(issubclass_check(rt, &args[0], &args[1], 0)?))
}

fn issubclass_check(
    rt: &mut Runtime,
    cls: &Value,
    classinfo: &Value,
    depth: usize,
) -> RunResult<bool> {
    let Value::Type(derived) = cls else {
        return Err(type_error("issubclass() arg 1 must be a class"));
    };
    match classinfo {
        Value::Tuple(items) => {
            if depth >= rt.config().type_check_recursion_limit {
                let mut work: Vec<Value> = items.iter().rev().cloned().collect();
                while let Some(ci) = work.pop() {
                    match ci {
                        Value::Tuple(inner) => work.extend(inner.iter().rev().cloned()),
                        other => {
                            if issubclass_check(rt, cls, &other, 0)? {
                                return Ok(true);
                            }
                        }
                    }
                }
                return Ok(false);
            }
            for ci in items.iter() {
                if issubclass_check(rt, cls, ci, depth + 1)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Type(t) => {
            if same_type(derived, t) {
                return Ok(true);
            }
            if let Some(hook) = rt.lookup_special(classinfo, "__subclasscheck__") {
                let r = rt.call_reentrant(&hook, &[classinfo.clone(), cls.clone()])?;
                return rt.is_truthy(&r);
            }
            Ok(is_subtype(derived, t))
        }
        _ => Err(type_error(
            "issubclass() arg 2 must be a class or tuple of classes",
        )),
    }
}

// ============================================================================
// Reflection
// ============================================================================

pub fn builtin_callable(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("callable", kwargs)?;
    check_arity("callable", args, 1, 1)?;
    Ok(Value::Bool(args[0].is_callable()))
}

pub fn builtin_repr(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("repr", kwargs)?;
    check_arity("repr", args, 1, 1)?;
    Ok(Value::str(to_repr(rt, &args[0])?))
}

/// repr with non-ASCII characters escaped.
pub fn builtin_ascii(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("ascii", kwargs)?;
    check_arity("ascii", args, 1, 1)?;
    let r = to_repr(rt, &args[0])?;
    let mut out = String::with_capacity(r.len());
    for c in r.chars() {
        let cp = c as u32;
        if cp < 0x80 {
            out.push(c);
        } else if cp < 0x10000 {
            out.push_str(&format!("\\u{cp:04x}"));
        } else {
            out.push_str(&format!("\\U{cp:08x}"));
        }
    }
    Ok(Value::str(out))
}

pub fn builtin_hash(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("hash", kwargs)?;
    check_arity("hash", args, 1, 1)?;
    Ok(Value::Int(value_hash(rt, &args[0])?))
}

fn value_hash(rt: &mut Runtime, v: &Value) -> RunResult<i64> {
    if let Some(h) = num::hash_number(v) {
        return Ok(h);
    }
    match v {
        Value::None => Ok(0x6f63_8c8b),
        Value::Str(s) => Ok(DictKey::hash_str(s) as i64),
        Value::Bytes(b) => {
            use std::hash::{Hash, Hasher};
            let mut hasher = ahash::AHasher::default();
            b.hash(&mut hasher);
            Ok(hasher.finish() as i64)
        }
        Value::Tuple(items) => {
            // combine element hashes order-sensitively
            let mut acc: i64 = 0x345678;
            for item in items.iter() {
                let h = value_hash(rt, item)?;
                acc = acc.wrapping_mul(1_000_003).wrapping_add(h);
            }
            Ok(acc)
        }
        Value::Type(t) => Ok(Rc::as_ptr(t) as i64),
        Value::Object(o) => {
            if let Some(hook) = o.class.lookup("__hash__") {
                let r = rt.call_reentrant(&hook, &[v.clone()])?;
                return r.as_index("__hash__");
            }
            Ok(Rc::as_ptr(o) as i64)
        }
        Value::Function(f) => Ok(Rc::as_ptr(f) as i64),
        _ => Err(type_error(format!(
            "unhashable type: '{}'",
            v.type_name()
        ))),
    }
}

pub fn builtin_getattr(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("getattr", kwargs)?;
    check_arity("getattr", args, 2, 3)?;
    let name = str_arg("getattr", "attribute name", &args[1])?;
    match rt.get_attr(&args[0], name) {
        Ok(v) => Ok(v),
        Err(e) if e.is(crate::errors::ErrorKind::AttributeError) && args.len() == 3 => {
            Ok(args[2].clone())
        }
        Err(e) => Err(e),
    }
}

pub fn builtin_setattr(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("setattr", kwargs)?;
    check_arity("setattr", args, 3, 3)?;
    let name = str_arg("setattr", "attribute name", &args[1])?;
    rt.set_attr(&args[0], name, args[2].clone())?;
    Ok(Value::None)
}

pub fn builtin_delattr(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("delattr", kwargs)?;
    check_arity("delattr", args, 2, 2)?;
    let name = str_arg("delattr", "attribute name", &args[1])?;
    rt.del_attr(&args[0], name)?;
    Ok(Value::None)
}

pub fn builtin_hasattr(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("hasattr", kwargs)?;
    check_arity("hasattr", args, 2, 2)?;
    let name = str_arg("hasattr", "attribute name", &args[1])?;
    Ok(Value::Bool(rt.get_attr(&args[0], name).is_ok()))
}

// ============================================================================
// Numbers
// ============================================================================

pub fn builtin_abs(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("abs", kwargs)?;
    check_arity("abs", args, 1, 1)?;
    num::absolute(&args[0])
}

pub fn builtin_divmod(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("divmod", kwargs)?;
    check_arity("divmod", args, 2, 2)?;
    let (q, r) = num::divmod(&args[0], &args[1])?;
    Ok(Value::tuple(vec![q, r]))
}

pub fn builtin_pow(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("pow", kwargs, &["mod"])?;
    check_arity("pow", args, 2, 3)?;
    let modulus = args.get(2).or_else(|| kwarg(kwargs, "mod"));
    let modulus = modulus.filter(|m| !m.is_none());
    num::pow(&args[0], &args[1], modulus)
}

pub fn builtin_round(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("round", kwargs, &["ndigits"])?;
    check_arity("round", args, 1, 2)?;
    let ndigits = args.get(1).or_else(|| kwarg(kwargs, "ndigits"));
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(v) => Some(v.as_index("ndigits")?),
    };
    match (&args[0], ndigits) {
        (Value::Float(f), None) => {
            // round-half-even to an integer value
            let r = f.round_ties_even();
            crate::math::trunc(&Value::Float(r))
        }
        (Value::Float(f), Some(nd)) => {
            if !f.is_finite() {
                return Ok(Value::Float(*f));
            }
            let scale = 10f64.powi(nd.clamp(-323, 323) as i32);
            let scaled = f * scale;
            if !scaled.is_finite() {
                return Ok(Value::Float(*f));
            }
            Ok(Value::Float(scaled.round_ties_even() / scale))
        }
        (v @ (Value::Int(_) | Value::Big(_) | Value::Bool(_)), None) => {
            num::add(v, &Value::Int(0))
        }
        (v @ (Value::Int(_) | Value::Big(_) | Value::Bool(_)), Some(nd)) => {
            if nd >= 0 {
                return num::add(v, &Value::Int(0));
            }
            // round away 10^-nd with half-to-even at the boundary
            let pow10 = num::pow(&Value::Int(10), &Value::Int(-nd), None)?;
            let (q, r) = num::divmod(v, &pow10)?;
            let double_r = num::mul(&r, &Value::Int(2))?;
            let round_up = match num::numeric_cmp(&double_r, &pow10) {
                Some(std::cmp::Ordering::Greater) => true,
                Some(std::cmp::Ordering::Equal) => {
                    // ties go to the even multiple
                    let (_, q_rem) = num::divmod(&q, &Value::Int(2))?;
                    !matches!(q_rem, Value::Int(0))
                }
                _ => false,
            };
            let q = if round_up {
                num::add(&q, &Value::Int(1))?
            } else {
                q
            };
            num::mul(&q, &pow10)
        }
        (v, _) => Err(type_error(format!(
            "type {} doesn't define __round__ method",
            v.type_name()
        ))),
    }
}

pub fn builtin_chr(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("chr", kwargs)?;
    check_arity("chr", args, 1, 1)?;
    let cp = args[0].as_index("chr()")?;
    if !(0..=0x10ffff).contains(&cp) {
        return Err(value_error("chr() arg not in range(0x110000)"));
    }
    match char::from_u32(cp as u32) {
        Some(c) => Ok(Value::str(c.to_string())),
        None => Err(value_error("chr() arg not in range(0x110000)")),
    }
}

pub fn builtin_ord(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("ord", kwargs)?;
    check_arity("ord", args, 1, 1)?;
    match &args[0] {
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Int(c as i64)),
                _ => Err(type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        Value::Bytes(b) if b.len() == 1 => Ok(Value::Int(b[0] as i64)),
        Value::Bytes(b) => Err(type_error(format!(
            "ord() expected a character, but string of length {} found",
            b.len()
        ))),
        v => Err(type_error(format!(
            "ord() expected string of length 1, but {} found",
            v.type_name()
        ))),
    }
}

fn format_radix(v: &Value, prefix: &str, radix: u32) -> RunResult<Value> {
    let big = num::to_big(v).ok_or_else(|| {
        type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            v.type_name()
        ))
    })?;
    let digits = big.abs().to_str_radix(radix);
    let sign = if big.is_negative() { "-" } else { "" };
    Ok(Value::str(format!("{sign}{prefix}{digits}")))
}

pub fn builtin_bin(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("bin", kwargs)?;
    check_arity("bin", args, 1, 1)?;
    format_radix(&args[0], "0b", 2)
}

pub fn builtin_oct(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("oct", kwargs)?;
    check_arity("oct", args, 1, 1)?;
    format_radix(&args[0], "0o", 8)
}

pub fn builtin_hex(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("hex", kwargs)?;
    check_arity("hex", args, 1, 1)?;
    format_radix(&args[0], "0x", 16)
}
