//! Codec-module builtins over the codec engine.

use super::common::*;
use crate::codecs;
use crate::core::value::{KwArgs, Value};
use crate::errors::{RunResult, type_error};
use crate::runtime::Runtime;

fn encoding_arg<'a>(args: &'a [Value], kwargs: &'a KwArgs, index: usize) -> RunResult<&'a str> {
    match args.get(index).or_else(|| kwarg(kwargs, "encoding")) {
        None => Ok("utf-8"),
        Some(Value::Str(s)) => Ok(s),
        Some(v) => Err(type_error(format!(
            "encoding must be str, not {}",
            v.type_name()
        ))),
    }
}

fn errors_arg<'a>(args: &'a [Value], kwargs: &'a KwArgs, index: usize) -> RunResult<&'a str> {
    match args.get(index).or_else(|| kwarg(kwargs, "errors")) {
        None => Ok("strict"),
        Some(Value::Str(s)) => Ok(s),
        Some(v) => Err(type_error(format!(
            "errors must be str, not {}",
            v.type_name()
        ))),
    }
}

pub fn builtin_encode(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("encode", kwargs, &["encoding", "errors"])?;
    check_arity("encode", args, 1, 3)?;
    let text = match &args[0] {
        Value::Str(s) => s.clone(),
        v => {
            return Err(type_error(format!(
                "encode() argument 'obj' must be str, not {}",
                v.type_name()
            )));
        }
    };
    let encoding = encoding_arg(args, kwargs, 1)?.to_string();
    let errors = errors_arg(args, kwargs, 2)?.to_string();
    let bytes = codecs::encode(rt, &text, &encoding, &errors)?;
    Ok(Value::bytes(bytes))
}

pub fn builtin_decode(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("decode", kwargs, &["encoding", "errors"])?;
    check_arity("decode", args, 1, 3)?;
    let data = match &args[0] {
        Value::Bytes(b) => b.clone(),
        v => {
            return Err(type_error(format!(
                "decode() argument 'obj' must be bytes, not {}",
                v.type_name()
            )));
        }
    };
    let encoding = encoding_arg(args, kwargs, 1)?.to_string();
    let errors = errors_arg(args, kwargs, 2)?.to_string();
    let text = codecs::decode(rt, &data, &encoding, &errors)?;
    Ok(Value::str(text))
}

pub fn builtin_lookup(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("lookup", kwargs)?;
    check_arity("lookup", args, 1, 1)?;
    let name = str_arg("lookup", "encoding", &args[0])?.to_string();
    let entry = codecs::lookup(rt, &name)?;
    // surface the canonical name; the entry itself stays native
    Ok(Value::str(entry.name.to_string()))
}

pub fn builtin_register(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("register", kwargs)?;
    check_arity("register", args, 1, 1)?;
    codecs::register(rt, args[0].clone())?;
    Ok(Value::None)
}

pub fn builtin_unregister(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("unregister", kwargs)?;
    check_arity("unregister", args, 1, 1)?;
    codecs::unregister(rt, &args[0]);
    Ok(Value::None)
}

pub fn builtin_register_error(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("register_error", kwargs)?;
    check_arity("register_error", args, 2, 2)?;
    let name = str_arg("register_error", "name", &args[0])?.to_string();
    codecs::register_error(rt, &name, args[1].clone())?;
    Ok(Value::None)
}

pub fn builtin_lookup_error(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("lookup_error", kwargs)?;
    check_arity("lookup_error", args, 1, 1)?;
    let name = str_arg("lookup_error", "name", &args[0])?;
    match codecs::lookup_error_handler(rt, name)? {
        codecs::ErrorHandler::Callable(v) => Ok(v),
        codecs::ErrorHandler::Native(handler_name, _) => Ok(Value::str(handler_name)),
    }
}

pub fn builtin_escape_decode(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("escape_decode", kwargs)?;
    check_arity("escape_decode", args, 1, 2)?;
    let data = match &args[0] {
        Value::Bytes(b) => b.to_vec(),
        Value::Str(s) => s.as_bytes().to_vec(),
        v => {
            return Err(type_error(format!(
                "escape_decode() argument must be str or bytes, not {}",
                v.type_name()
            )));
        }
    };
    let errors = match args.get(1) {
        None | Some(Value::None) => "strict",
        Some(Value::Str(s)) => s,
        Some(v) => {
            return Err(type_error(format!(
                "errors must be str, not {}",
                v.type_name()
            )));
        }
    };
    let (decoded, consumed) = codecs::escape_decode(&data, errors)?;
    Ok(Value::tuple(vec![
        Value::bytes(decoded),
        Value::Int(consumed as i64),
    ]))
}

pub fn builtin_escape_encode(_rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("escape_encode", kwargs)?;
    check_arity("escape_encode", args, 1, 1)?;
    let data = match &args[0] {
        Value::Bytes(b) => b,
        v => {
            return Err(type_error(format!(
                "escape_encode() argument must be bytes, not {}",
                v.type_name()
            )));
        }
    };
    let (encoded, consumed) = codecs::escape_encode(data);
    Ok(Value::tuple(vec![
        Value::bytes(encoded),
        Value::Int(consumed as i64),
    ]))
}
