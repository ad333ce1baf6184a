//! compile / eval / exec and frame-namespace access.
//!
//! Parsing and execution are delegated to the front-end and interpreter
//! capabilities; this layer owns argument validation, compile-flag checking,
//! and decoding bytes source (BOM sniffing plus the coding declaration).

use std::rc::Rc;
use std::sync::OnceLock;

use lyra_ir::{CodeUnit, ParseMode, flags};
use regex::bytes::Regex;

use super::common::*;
use crate::codecs;
use crate::core::value::{KwArgs, Value};
use crate::errors::{
    ErrorKind, RunError, RunResult, runtime_error, type_error, value_error,
};
use crate::runtime::Runtime;

fn coding_declaration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // the declaration format is specified as this exact pattern
        Regex::new(r"coding[:=][ \t]*([-_.a-zA-Z0-9]+)").expect("static pattern")
    })
}

/// Decode source bytes: a BOM wins, then an explicit coding declaration in
/// the first two lines, then UTF-8.
pub fn decode_source(rt: &mut Runtime, data: &[u8]) -> RunResult<String> {
    const BOM_UTF8: &[u8] = &[0xef, 0xbb, 0xbf];
    if let Some(rest) = data.strip_prefix(BOM_UTF8) {
        return codecs::decode(rt, rest, "utf-8", "strict");
    }
    // utf-32 BOMs subsume the utf-16 ones, so test them first
    if let Some(rest) = data.strip_prefix(&[0xff, 0xfe, 0x00, 0x00][..]) {
        return codecs::decode(rt, rest, "utf-32-le", "strict");
    }
    if let Some(rest) = data.strip_prefix(&[0x00, 0x00, 0xfe, 0xff][..]) {
        return codecs::decode(rt, rest, "utf-32-be", "strict");
    }
    if let Some(rest) = data.strip_prefix(&[0xff, 0xfe][..]) {
        return codecs::decode(rt, rest, "utf-16-le", "strict");
    }
    if let Some(rest) = data.strip_prefix(&[0xfe, 0xff][..]) {
        return codecs::decode(rt, rest, "utf-16-be", "strict");
    }

    // PEP-263-style declaration: only comment lines among the first two count
    let mut encoding: Option<String> = None;
    for (i, line) in data.split(|b| *b == b'\n').take(2).enumerate() {
        let trimmed: &[u8] = {
            let mut l = line;
            while let Some((first, rest)) = l.split_first() {
                if *first == b' ' || *first == b'\t' || *first == 0x0c {
                    l = rest;
                } else {
                    break;
                }
            }
            l
        };
        if !trimmed.starts_with(b"#") {
            if i == 0 && !trimmed.is_empty() {
                break; // code before any comment ends the search
            }
            continue;
        }
        if let Some(caps) = coding_declaration().captures(trimmed) {
            let name = String::from_utf8_lossy(&caps[1]).into_owned();
            encoding = Some(name);
            break;
        }
    }
    let encoding = encoding.unwrap_or_else(|| "utf-8".to_string());
    codecs::decode(rt, data, &encoding, "strict")
}

fn frontend_error(e: lyra_ir::FrontendError) -> RunError {
    let mut message = e.message;
    if let Some(line) = e.line {
        message = format!("{message} ({}, line {line})", e.filename);
    }
    RunError::new(ErrorKind::SyntaxError, message)
}

pub fn builtin_compile(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("compile", kwargs, &["flags", "dont_inherit", "optimize"])?;
    check_arity("compile", args, 3, 6)?;

    let filename = str_arg("compile", "filename", &args[1])?.to_string();
    let mode_name = str_arg("compile", "mode", &args[2])?;
    let mode = ParseMode::from_name(mode_name).ok_or_else(|| {
        value_error("compile() mode must be 'exec', 'eval' or 'single'")
    })?;

    let flags_val = args.get(3).or_else(|| kwarg(kwargs, "flags"));
    let flag_bits = match flags_val {
        None | Some(Value::None) => 0,
        Some(v) => v.as_index("flags")? as u32,
    };
    if flag_bits & !flags::MASK != 0 {
        return Err(value_error("compile(): unrecognised flags"));
    }

    // code objects pass through untouched
    if let Value::Code(c) = &args[0] {
        return Ok(Value::Code(c.clone()));
    }

    let tree = match &args[0] {
        Value::Ast(tree) => (**tree).clone(),
        source => {
            let text = match source {
                Value::Str(s) => s.to_string(),
                Value::Bytes(b) => {
                    let b = b.clone();
                    decode_source(rt, &b)?
                }
                other => {
                    return Err(type_error(format!(
                        "compile() arg 1 must be a string, bytes or AST object, not {}",
                        other.type_name()
                    )));
                }
            };
            let frontend = rt
                .frontend
                .as_ref()
                .ok_or_else(|| runtime_error("no front end configured"))?;
            frontend
                .parse(&text, &filename, mode, flag_bits)
                .map_err(frontend_error)?
        }
    };

    if flag_bits & flags::AST_ONLY != 0 {
        return Ok(Value::Ast(Rc::new(tree)));
    }
    let frontend = rt
        .frontend
        .as_ref()
        .ok_or_else(|| runtime_error("no front end configured"))?;
    let code = frontend.compile(&tree, flag_bits).map_err(frontend_error)?;
    Ok(Value::Code(Rc::new(code)))
}

/// Validate an eval/exec namespace argument.
fn namespace_arg(name: &str, which: &str, v: Option<&Value>) -> RunResult<Option<Value>> {
    match v {
        None | Some(Value::None) => Ok(None),
        Some(d @ Value::Dict(_)) => Ok(Some(d.clone())),
        Some(other) => Err(type_error(format!(
            "{name}() {which} must be a dict, not {}",
            other.type_name()
        ))),
    }
}

fn run_source(
    rt: &mut Runtime,
    name: &str,
    mode: ParseMode,
    args: &[Value],
    kwargs: &KwArgs,
) -> RunResult<Value> {
    let globals = namespace_arg(name, "globals", args.get(1).or_else(|| kwarg(kwargs, "globals")))?;
    let locals = namespace_arg(name, "locals", args.get(2).or_else(|| kwarg(kwargs, "locals")))?;

    let code: Rc<CodeUnit> = match &args[0] {
        Value::Code(c) => c.clone(),
        Value::Str(s) => {
            let compiled = builtin_compile(
                rt,
                &[
                    Value::Str(s.clone()),
                    Value::str("<string>"),
                    Value::str(mode.name()),
                ],
                &[],
            )?;
            match compiled {
                Value::Code(c) => c,
                _ => unreachable!("compile() without AST_ONLY yields code"),
            }
        }
        Value::Bytes(b) => {
            let compiled = builtin_compile(
                rt,
                &[
                    Value::Bytes(b.clone()),
                    Value::str("<string>"),
                    Value::str(mode.name()),
                ],
                &[],
            )?;
            match compiled {
                Value::Code(c) => c,
                _ => unreachable!("compile() without AST_ONLY yields code"),
            }
        }
        other => {
            return Err(type_error(format!(
                "{name}() arg 1 must be a string, bytes or code object, not {}",
                other.type_name()
            )));
        }
    };

    let interpreter = rt
        .interpreter
        .clone()
        .ok_or_else(|| runtime_error("no interpreter configured"))?;
    let globals = match globals {
        Some(g) => g,
        None => interpreter.current_globals(rt)?,
    };
    let locals = match locals {
        Some(l) => l,
        None => globals.clone(),
    };
    interpreter.invoke(rt, &code, &globals, &locals)
}

pub fn builtin_eval(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("eval", kwargs, &["globals", "locals"])?;
    check_arity("eval", args, 1, 3)?;
    run_source(rt, "eval", ParseMode::Eval, args, kwargs)
}

pub fn builtin_exec(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    check_kwargs("exec", kwargs, &["globals", "locals"])?;
    check_arity("exec", args, 1, 3)?;
    run_source(rt, "exec", ParseMode::Exec, args, kwargs)?;
    Ok(Value::None)
}

pub fn builtin_globals(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("globals", kwargs)?;
    check_arity("globals", args, 0, 0)?;
    match rt.interpreter.clone() {
        Some(interp) => interp.current_globals(rt),
        None => Ok(rt.globals_value()),
    }
}

pub fn builtin_locals(rt: &mut Runtime, args: &[Value], kwargs: &KwArgs) -> RunResult<Value> {
    no_kwargs("locals", kwargs)?;
    check_arity("locals", args, 0, 0)?;
    match rt.interpreter.clone() {
        Some(interp) => interp.current_locals(rt),
        None => Ok(rt.globals_value()),
    }
}
