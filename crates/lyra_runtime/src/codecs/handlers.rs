//! Codec error handlers.
//!
//! Handlers live in their own registry, separate from the codec search path.
//! A handler receives the full error context and answers with a replacement
//! string plus the input position to resume from; `strict` answers by
//! raising.

use crate::core::value::{FastHashMap, Value, fast_map_new};
use crate::errors::{ErrorKind, RunError, RunResult, lookup_error, type_error};
use crate::runtime::Runtime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodecErrorKind {
    Decode,
    Encode,
}

/// Everything a handler may inspect about the pending error.
pub struct CodecErrorContext<'a> {
    pub kind: CodecErrorKind,
    pub encoding: &'a str,
    /// Byte input for decode errors.
    pub bytes: Option<&'a [u8]>,
    /// Text input for encode errors.
    pub text: Option<&'a str>,
    pub start: usize,
    pub end: usize,
    pub reason: &'a str,
}

impl CodecErrorContext<'_> {
    /// The user-visible error this context describes.
    pub fn to_error(&self) -> RunError {
        match self.kind {
            CodecErrorKind::Decode => {
                let byte = self
                    .bytes
                    .and_then(|b| b.get(self.start))
                    .copied()
                    .unwrap_or(0);
                RunError::new(
                    ErrorKind::UnicodeDecodeError,
                    format!(
                        "'{}' codec can't decode byte 0x{:02x} in position {}: {}",
                        self.encoding, byte, self.start, self.reason
                    ),
                )
            }
            CodecErrorKind::Encode => {
                let ch = self
                    .text
                    .and_then(|t| t[self.start..].chars().next())
                    .unwrap_or('\u{fffd}');
                RunError::new(
                    ErrorKind::UnicodeEncodeError,
                    format!(
                        "'{}' codec can't encode character '\\u{:04x}' in position {}: {}",
                        self.encoding, ch as u32, self.start, self.reason
                    ),
                )
            }
        }
    }
}

pub type NativeHandlerFn = fn(&mut Runtime, &CodecErrorContext<'_>) -> RunResult<(String, usize)>;

#[derive(Clone)]
pub enum ErrorHandler {
    Native(&'static str, NativeHandlerFn),
    /// User callable: invoked with (encoding, object, start, end, reason),
    /// must return a (replacement, resume_position) pair.
    Callable(Value),
}

pub struct HandlerRegistry {
    table: FastHashMap<String, ErrorHandler>,
}

impl HandlerRegistry {
    pub fn with_builtins() -> Self {
        let mut table: FastHashMap<String, ErrorHandler> = fast_map_new();
        for (name, f) in [
            ("strict", strict as NativeHandlerFn),
            ("ignore", ignore as NativeHandlerFn),
            ("replace", replace as NativeHandlerFn),
            ("backslashreplace", backslashreplace as NativeHandlerFn),
        ] {
            table.insert(name.to_string(), ErrorHandler::Native(name, f));
        }
        Self { table }
    }

    pub fn register(&mut self, name: &str, handler: Value) {
        self.table
            .insert(name.to_string(), ErrorHandler::Callable(handler));
    }

    pub fn lookup(&self, name: &str) -> RunResult<ErrorHandler> {
        self.table
            .get(name)
            .cloned()
            .ok_or_else(|| lookup_error(format!("unknown error handler name '{name}'")))
    }
}

/// Run the named handler for a pending error and return the replacement and
/// resume position.
pub fn invoke(
    rt: &mut Runtime,
    name: &str,
    ctx: &CodecErrorContext<'_>,
) -> RunResult<(String, usize)> {
    let handler = rt.codec_error_handlers.lookup(name)?;
    match handler {
        ErrorHandler::Native(_, f) => f(rt, ctx),
        ErrorHandler::Callable(f) => {
            let object = match ctx.kind {
                CodecErrorKind::Decode => Value::bytes(ctx.bytes.unwrap_or(&[]).to_vec()),
                CodecErrorKind::Encode => Value::str(ctx.text.unwrap_or("")),
            };
            let args = [
                Value::str(ctx.encoding),
                object,
                Value::Int(ctx.start as i64),
                Value::Int(ctx.end as i64),
                Value::str(ctx.reason),
            ];
            // Reentry into interpreted code: guard restores caller state.
            let result = rt.call_reentrant(&f, &args)?;
            let input_len = match ctx.kind {
                CodecErrorKind::Decode => ctx.bytes.map_or(0, |b| b.len()),
                CodecErrorKind::Encode => ctx.text.map_or(0, |t| t.len()),
            };
            parse_handler_result(&result, input_len)
        }
    }
}

fn parse_handler_result(result: &Value, input_len: usize) -> RunResult<(String, usize)> {
    let items = match result {
        Value::Tuple(items) if items.len() == 2 => items,
        _ => {
            return Err(type_error(
                "error handler must return a (str, int) tuple",
            ));
        }
    };
    let replacement = match &items[0] {
        Value::Str(s) => s.to_string(),
        _ => {
            return Err(type_error(
                "error handler must return a (str, int) tuple",
            ));
        }
    };
    let pos = items[1].as_index("error handler position")?;
    // Negative positions count from the end of the input.
    let resolved = if pos < 0 {
        pos + input_len as i64
    } else {
        pos
    };
    if resolved < 0 || resolved as usize > input_len {
        return Err(crate::errors::RunError::new(
            ErrorKind::LookupError,
            format!("position {pos} from error handler out of bounds"),
        ));
    }
    Ok((replacement, resolved as usize))
}

// ============================================================================
// Builtin handlers
// ============================================================================

fn strict(_rt: &mut Runtime, ctx: &CodecErrorContext<'_>) -> RunResult<(String, usize)> {
    Err(ctx.to_error())
}

fn ignore(_rt: &mut Runtime, ctx: &CodecErrorContext<'_>) -> RunResult<(String, usize)> {
    Ok((String::new(), ctx.end))
}

fn replace(_rt: &mut Runtime, ctx: &CodecErrorContext<'_>) -> RunResult<(String, usize)> {
    let replacement = match ctx.kind {
        CodecErrorKind::Decode => "\u{fffd}".to_string(),
        CodecErrorKind::Encode => {
            let span = ctx
                .text
                .map(|t| t[ctx.start..ctx.end].chars().count())
                .unwrap_or(1);
            "?".repeat(span)
        }
    };
    Ok((replacement, ctx.end))
}

fn backslashreplace(_rt: &mut Runtime, ctx: &CodecErrorContext<'_>) -> RunResult<(String, usize)> {
    let mut out = String::new();
    match ctx.kind {
        CodecErrorKind::Decode => {
            if let Some(bytes) = ctx.bytes {
                for b in &bytes[ctx.start..ctx.end] {
                    out.push_str(&format!("\\x{b:02x}"));
                }
            }
        }
        CodecErrorKind::Encode => {
            if let Some(text) = ctx.text {
                for c in text[ctx.start..ctx.end].chars() {
                    let cp = c as u32;
                    if cp < 0x100 {
                        out.push_str(&format!("\\x{cp:02x}"));
                    } else if cp < 0x10000 {
                        out.push_str(&format!("\\u{cp:04x}"));
                    } else {
                        out.push_str(&format!("\\U{cp:08x}"));
                    }
                }
            }
        }
    }
    Ok((out, ctx.end))
}
