mod common;

use std::rc::Rc;

use common::*;
use lyra_runtime::{
    CodeUnit, DictKey, ErrorKind, Interpreter, ParseMode, RunResult, Runtime, Value,
};

/// Toy interpreter: a code unit's source is either an integer literal or a
/// name resolved against the given globals dict.
struct LiteralInterpreter;

impl Interpreter for LiteralInterpreter {
    fn invoke(
        &self,
        _rt: &mut Runtime,
        code: &CodeUnit,
        globals: &Value,
        _locals: &Value,
    ) -> RunResult<Value> {
        let src = code.source.trim();
        if let Ok(i) = src.parse::<i64>() {
            return Ok(Value::Int(i));
        }
        match globals {
            Value::Dict(d) => d
                .borrow()
                .get(&DictKey::from_str(src))
                .cloned()
                .ok_or_else(|| {
                    lyra_runtime::errors::lookup_error(format!("name '{src}' is not defined"))
                }),
            _ => unreachable!("globals validated by eval"),
        }
    }

    fn current_globals(&self, rt: &mut Runtime) -> RunResult<Value> {
        Ok(rt.globals_value())
    }

    fn current_locals(&self, rt: &mut Runtime) -> RunResult<Value> {
        Ok(rt.globals_value())
    }
}

fn rt_with_interp() -> Runtime {
    let mut rt = rt();
    rt.set_interpreter(Rc::new(LiteralInterpreter));
    rt
}

#[test]
fn compile_produces_code_objects_per_mode() {
    let mut rt = rt();
    for mode in ["exec", "eval", "single", "func_type"] {
        let r = rt
            .call_global(
                "compile",
                &[Value::str("42"), Value::str("<test>"), Value::str(mode)],
            )
            .unwrap();
        match &r {
            Value::Code(c) => {
                assert_eq!(c.mode, ParseMode::from_name(mode).unwrap());
                assert_eq!(c.filename, "<test>");
            }
            other => panic!("expected code, got {other:?}"),
        }
    }
}

#[test]
fn compile_rejects_bad_mode_and_flags() {
    let mut rt = rt();
    let err = rt
        .call_global(
            "compile",
            &[Value::str("x"), Value::str("<t>"), Value::str("statement")],
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValueError);
    assert!(err.message.contains("mode must be"));

    let err = rt
        .call_global(
            "compile",
            &[
                Value::str("x"),
                Value::str("<t>"),
                Value::str("eval"),
                Value::Int(0x8000_0000),
            ],
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValueError);
    assert!(err.message.contains("unrecognised flags"));
}

#[test]
fn compile_ast_only_round_trips() {
    let mut rt = rt();
    const AST_ONLY: i64 = 0x0400;
    let ast = rt
        .call_global(
            "compile",
            &[
                Value::str("1 + 2"),
                Value::str("<t>"),
                Value::str("eval"),
                Value::Int(AST_ONLY),
            ],
        )
        .unwrap();
    assert!(matches!(&ast, Value::Ast(_)));
    // an AST object feeds back into compile without the flag
    let code = rt
        .call_global(
            "compile",
            &[ast, Value::str("<t>"), Value::str("eval")],
        )
        .unwrap();
    assert!(matches!(&code, Value::Code(_)));
}

#[test]
fn compile_code_object_passes_through() {
    let mut rt = rt();
    let code = rt
        .call_global(
            "compile",
            &[Value::str("7"), Value::str("<t>"), Value::str("eval")],
        )
        .unwrap();
    let again = rt
        .call_global(
            "compile",
            &[code.clone(), Value::str("<other>"), Value::str("eval")],
        )
        .unwrap();
    assert!(lyra_runtime::values_equal(&code, &again));
}

#[test]
fn bytes_source_bom_detection() {
    let mut rt = rt();
    let mut utf8_bom = vec![0xef, 0xbb, 0xbf];
    utf8_bom.extend_from_slice("99".as_bytes());
    let code = rt
        .call_global(
            "compile",
            &[Value::bytes(utf8_bom), Value::str("<t>"), Value::str("eval")],
        )
        .unwrap();
    match &code {
        Value::Code(c) => assert_eq!(c.source, "99"),
        other => panic!("expected code, got {other:?}"),
    }

    // utf-16-le BOM
    let mut utf16 = vec![0xff, 0xfe];
    for unit in "55".encode_utf16() {
        utf16.extend_from_slice(&unit.to_le_bytes());
    }
    let code = rt
        .call_global(
            "compile",
            &[Value::bytes(utf16), Value::str("<t>"), Value::str("eval")],
        )
        .unwrap();
    match &code {
        Value::Code(c) => assert_eq!(c.source, "55"),
        other => panic!("expected code, got {other:?}"),
    }
}

#[test]
fn bytes_source_coding_declaration() {
    let mut rt = rt();
    // latin-1 payload with an explicit declaration on line one
    let mut source = b"# -*- coding: latin-1 -*-\n".to_vec();
    source.push(0xe9); // é in latin-1, malformed as utf-8
    let code = rt
        .call_global(
            "compile",
            &[Value::bytes(source), Value::str("<t>"), Value::str("exec")],
        )
        .unwrap();
    match &code {
        Value::Code(c) => assert!(c.source.ends_with('\u{e9}')),
        other => panic!("expected code, got {other:?}"),
    }

    // without the declaration the same bytes are a decode error
    let err = rt
        .call_global(
            "compile",
            &[
                Value::bytes(vec![b'#', b'\n', 0xe9]),
                Value::str("<t>"),
                Value::str("exec"),
            ],
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnicodeDecodeError);
}

#[test]
fn eval_delegates_to_interpreter() {
    let mut rt = rt_with_interp();
    let r = rt.call_global("eval", &[Value::str("41")]).unwrap();
    assert_eq!(as_int(&r), 41);

    // names resolve against the supplied globals mapping
    let mut globals = lyra_runtime::core::value::dict_new();
    globals.insert(DictKey::from_str("answer"), Value::Int(42));
    let r = rt
        .call_global(
            "eval",
            &[Value::str("answer"), Value::dict(globals)],
        )
        .unwrap();
    assert_eq!(as_int(&r), 42);
}

#[test]
fn eval_validates_namespace_arguments() {
    let mut rt = rt_with_interp();
    let err = rt
        .call_global("eval", &[Value::str("1"), Value::Int(3)])
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert!(err.message.contains("globals must be a dict"));

    let err = rt
        .call_global(
            "eval",
            &[Value::str("1"), Value::None, Value::str("locals")],
        )
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::TypeError);
}

#[test]
fn exec_returns_none_and_accepts_code() {
    let mut rt = rt_with_interp();
    let code = rt
        .call_global(
            "compile",
            &[Value::str("13"), Value::str("<t>"), Value::str("exec")],
        )
        .unwrap();
    let r = rt.call_global("exec", &[code]).unwrap();
    assert!(r.is_none());
}

#[test]
fn eval_without_interpreter_reports_missing_capability() {
    let mut rt = rt();
    let err = rt.call_global("eval", &[Value::str("1")]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeError);
}

#[test]
fn globals_builtin_exposes_live_namespace() {
    let mut rt = rt();
    let g = rt.call_global("globals", &[]).unwrap();
    match &g {
        Value::Dict(d) => {
            assert!(d.borrow().get(&DictKey::from_str("len")).is_some());
        }
        other => panic!("expected dict, got {other:?}"),
    }
}
