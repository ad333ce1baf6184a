//! Codec engine: registry, transcode loops, error handlers, escape codec.

pub mod charsets;
pub mod engine;
pub mod escape;
pub mod handlers;

pub use charsets::{Charset, CoderResult};
pub use engine::{StreamReader, StreamWriter};
pub use escape::{escape_decode, escape_encode};
pub use handlers::{CodecErrorContext, CodecErrorKind, ErrorHandler, HandlerRegistry};

use std::rc::Rc;

use crate::core::value::{FastHashMap, Value, fast_map_new, values_equal};
use crate::errors::{RunResult, lookup_error, type_error};
use crate::runtime::Runtime;

/// One registry entry: the four codec capabilities under a canonical name.
///
/// Builtin entries drive the charset engine; entries produced by search
/// functions carry the four callables they returned.
#[derive(Clone)]
pub struct CodecEntry {
    pub name: Rc<str>,
    pub imp: CodecImpl,
}

#[derive(Clone)]
pub enum CodecImpl {
    Charset(Rc<dyn Charset>),
    User {
        encode: Value,
        decode: Value,
        stream_reader: Value,
        stream_writer: Value,
    },
}

/// Stream factories answer with a native engine stream for builtin
/// charsets, or the user factory callable for registered codecs.
pub enum ReaderHandle {
    Native(StreamReader),
    Factory(Value),
}

pub enum WriterHandle {
    Native(StreamWriter),
    Factory(Value),
}

impl CodecEntry {
    pub fn encode(&self, rt: &mut Runtime, text: &str, errors: &str) -> RunResult<Vec<u8>> {
        match &self.imp {
            CodecImpl::Charset(cs) => {
                let cs = cs.clone();
                Ok(engine::encode_loop(rt, cs.as_ref(), errors, text)?.0)
            }
            CodecImpl::User { encode, .. } => {
                let f = encode.clone();
                let result =
                    rt.call_reentrant(&f, &[Value::str(text), Value::str(errors)])?;
                match &result {
                    Value::Tuple(items) if items.len() == 2 => match &items[0] {
                        Value::Bytes(b) => Ok(b.to_vec()),
                        _ => Err(type_error("encoder must return a (bytes, int) tuple")),
                    },
                    _ => Err(type_error("encoder must return a (bytes, int) tuple")),
                }
            }
        }
    }

    pub fn decode(&self, rt: &mut Runtime, data: &[u8], errors: &str) -> RunResult<String> {
        match &self.imp {
            CodecImpl::Charset(cs) => {
                let cs = cs.clone();
                Ok(engine::decode_loop(rt, cs.as_ref(), errors, data)?.0)
            }
            CodecImpl::User { decode, .. } => {
                let f = decode.clone();
                let result =
                    rt.call_reentrant(&f, &[Value::bytes(data.to_vec()), Value::str(errors)])?;
                match &result {
                    Value::Tuple(items) if items.len() == 2 => match &items[0] {
                        Value::Str(s) => Ok(s.to_string()),
                        _ => Err(type_error("decoder must return a (str, int) tuple")),
                    },
                    _ => Err(type_error("decoder must return a (str, int) tuple")),
                }
            }
        }
    }

    pub fn stream_reader(&self, errors: &str) -> ReaderHandle {
        match &self.imp {
            CodecImpl::Charset(cs) => ReaderHandle::Native(StreamReader::new(cs.clone(), errors)),
            CodecImpl::User { stream_reader, .. } => ReaderHandle::Factory(stream_reader.clone()),
        }
    }

    pub fn stream_writer(&self, errors: &str) -> WriterHandle {
        match &self.imp {
            CodecImpl::Charset(cs) => WriterHandle::Native(StreamWriter::new(cs.clone(), errors)),
            CodecImpl::User { stream_writer, .. } => WriterHandle::Factory(stream_writer.clone()),
        }
    }
}

/// Per-runtime codec registry: the search path and the lookup cache.
pub struct CodecRegistry {
    search_fns: Vec<Value>,
    cache: FastHashMap<String, CodecEntry>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self {
            search_fns: Vec::new(),
            cache: fast_map_new(),
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase the name and collapse punctuation runs to underscores.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' | '.' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Resolve aliases to the canonical builtin key, so every spelling shares
/// one cache slot.
fn canonical_builtin(normalized: &str) -> Option<&'static str> {
    Some(match normalized {
        "utf_8" | "utf8" | "utf" | "u8" | "cp65001" => "utf_8",
        "ascii" | "646" | "us_ascii" | "ansi_x3_4_1968" => "ascii",
        "latin_1" | "latin1" | "latin" | "iso_8859_1" | "iso8859_1" | "8859" | "l1" | "cp819" => {
            "latin_1"
        }
        "utf_16" | "utf16" | "u16" | "utf_16_le" | "utf16le" | "unicodelittleunmarked" => {
            "utf_16_le"
        }
        "utf_16_be" | "utf16be" | "unicodebigunmarked" => "utf_16_be",
        "utf_32" | "utf32" | "u32" | "utf_32_le" | "utf32le" => "utf_32_le",
        "utf_32_be" | "utf32be" => "utf_32_be",
        _ => return None,
    })
}

fn builtin_charset(canonical: &str) -> Option<Rc<dyn Charset>> {
    Some(match canonical {
        "utf_8" => Rc::new(charsets::Utf8),
        "ascii" => Rc::new(charsets::Ascii),
        "latin_1" => Rc::new(charsets::Latin1),
        "utf_16_le" => Rc::new(charsets::Utf16 { big_endian: false }),
        "utf_16_be" => Rc::new(charsets::Utf16 { big_endian: true }),
        "utf_32_le" => Rc::new(charsets::Utf32 { big_endian: false }),
        "utf_32_be" => Rc::new(charsets::Utf32 { big_endian: true }),
        _ => return None,
    })
}

/// Find the codec for `name`: cache, then builtin table, then the search
/// functions in registration order. The winner is cached under its
/// canonical key.
pub fn lookup(rt: &mut Runtime, name: &str) -> RunResult<CodecEntry> {
    let normalized = normalize_name(name);
    let key = canonical_builtin(&normalized)
        .map(str::to_string)
        .unwrap_or_else(|| normalized.clone());

    if let Some(entry) = rt.codec_registry.cache.get(&key) {
        return Ok(entry.clone());
    }

    if let Some(cs) = builtin_charset(&key) {
        let entry = CodecEntry {
            name: Rc::from(key.as_str()),
            imp: CodecImpl::Charset(cs),
        };
        rt.codec_registry.cache.insert(key, entry.clone());
        return Ok(entry);
    }

    let search_fns = rt.codec_registry.search_fns.clone();
    for f in search_fns {
        let result = rt.call_reentrant(&f, &[Value::str(normalized.clone())])?;
        if result.is_none() {
            continue;
        }
        let entry = match &result {
            Value::Tuple(items) if items.len() == 4 => CodecEntry {
                name: Rc::from(normalized.as_str()),
                imp: CodecImpl::User {
                    encode: items[0].clone(),
                    decode: items[1].clone(),
                    stream_reader: items[2].clone(),
                    stream_writer: items[3].clone(),
                },
            },
            _ => {
                return Err(type_error("codec search functions must return 4-tuples"));
            }
        };
        rt.codec_registry.cache.insert(key, entry.clone());
        return Ok(entry);
    }

    Err(lookup_error(format!("unknown encoding: {name}")))
}

/// Append a search function to the path. Registration order is lookup
/// order; builtins always win first.
pub fn register(rt: &mut Runtime, search_fn: Value) -> RunResult<()> {
    if !search_fn.is_callable() {
        return Err(type_error("argument must be callable"));
    }
    rt.codec_registry.search_fns.push(search_fn);
    Ok(())
}

/// Remove a search function and drop the entire lookup cache: entries the
/// removed function produced cannot be told apart from ones another search
/// function would now produce differently.
pub fn unregister(rt: &mut Runtime, search_fn: &Value) {
    rt.codec_registry
        .search_fns
        .retain(|f| !values_equal(f, search_fn));
    rt.codec_registry.cache.clear();
}

pub fn encode(rt: &mut Runtime, text: &str, encoding: &str, errors: &str) -> RunResult<Vec<u8>> {
    let entry = lookup(rt, encoding)?;
    entry.encode(rt, text, errors)
}

pub fn decode(rt: &mut Runtime, data: &[u8], encoding: &str, errors: &str) -> RunResult<String> {
    let entry = lookup(rt, encoding)?;
    entry.decode(rt, data, errors)
}

pub fn register_error(rt: &mut Runtime, name: &str, handler: Value) -> RunResult<()> {
    if !handler.is_callable() {
        return Err(type_error("handler must be callable"));
    }
    rt.codec_error_handlers.register(name, handler);
    Ok(())
}

pub fn lookup_error_handler(rt: &Runtime, name: &str) -> RunResult<ErrorHandler> {
    rt.codec_error_handlers.lookup(name)
}
