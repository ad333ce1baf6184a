//! The transcode loop.
//!
//! Per operation the engine moves through Ready -> Stepping -> (Done |
//! ErrorPending) -> (Stepping | Done). A step drives the charset engine:
//! underflow finishes the operation, overflow grows the output buffer and
//! re-steps, and a malformed/unmappable span parks the machine in
//! ErrorPending until the active error handler supplies a replacement and a
//! resume position. Handler replacements on the encode side are themselves
//! encoded through the same charset, so a handler can answer with any text
//! the target charset can carry.

use std::rc::Rc;

use crate::codecs::charsets::{Charset, CoderResult};
use crate::codecs::handlers::{self, CodecErrorContext, CodecErrorKind};
use crate::errors::RunResult;
use crate::runtime::Runtime;

pub fn decode_loop(
    rt: &mut Runtime,
    charset: &dyn Charset,
    errors: &str,
    input: &[u8],
) -> RunResult<(String, usize)> {
    let mut pos = 0usize;
    let mut out = String::new();
    let mut cap = input.len().max(16);
    loop {
        match charset.decode_step(input, &mut pos, &mut out, cap) {
            CoderResult::Underflow => return Ok((out, input.len())),
            CoderResult::Overflow => {
                cap *= 2;
                out.reserve(cap - out.len());
            }
            CoderResult::Malformed { len } | CoderResult::Unmappable { len } => {
                let ctx = CodecErrorContext {
                    kind: CodecErrorKind::Decode,
                    encoding: charset.name(),
                    bytes: Some(input),
                    text: None,
                    start: pos,
                    end: (pos + len.max(1)).min(input.len()),
                    reason: charset.decode_reason(),
                };
                let (replacement, resume) = handlers::invoke(rt, errors, &ctx)?;
                out.push_str(&replacement);
                pos = resume;
            }
        }
    }
}

pub fn encode_loop(
    rt: &mut Runtime,
    charset: &dyn Charset,
    errors: &str,
    input: &str,
) -> RunResult<(Vec<u8>, usize)> {
    let mut pos = 0usize;
    let mut out = Vec::new();
    let mut cap = input.len().max(16);
    loop {
        match charset.encode_step(input, &mut pos, &mut out, cap) {
            CoderResult::Underflow => return Ok((out, input.chars().count())),
            CoderResult::Overflow => {
                cap *= 2;
                out.reserve(cap - out.len());
            }
            CoderResult::Malformed { len } | CoderResult::Unmappable { len } => {
                let ctx = CodecErrorContext {
                    kind: CodecErrorKind::Encode,
                    encoding: charset.name(),
                    bytes: None,
                    text: Some(input),
                    start: pos,
                    end: (pos + len.max(1)).min(input.len()),
                    reason: charset.encode_reason(),
                };
                let (replacement, resume) = handlers::invoke(rt, errors, &ctx)?;
                encode_replacement(charset, &replacement, &mut out, &ctx)?;
                pos = resume;
            }
        }
    }
}

/// Replacement text goes back through the same encoder, strictly: a
/// replacement the charset cannot carry raises rather than recursing into
/// the handler again.
fn encode_replacement(
    charset: &dyn Charset,
    replacement: &str,
    out: &mut Vec<u8>,
    original: &CodecErrorContext<'_>,
) -> RunResult<()> {
    let mut pos = 0usize;
    loop {
        match charset.encode_step(replacement, &mut pos, out, usize::MAX) {
            CoderResult::Underflow => return Ok(()),
            CoderResult::Overflow => continue,
            CoderResult::Malformed { .. } | CoderResult::Unmappable { .. } => {
                return Err(original.to_error());
            }
        }
    }
}

// ============================================================================
// Incremental stream codecs
// ============================================================================

/// Incremental decoder: buffers a trailing incomplete unit between feeds.
pub struct StreamReader {
    charset: Rc<dyn Charset>,
    errors: String,
    pending: Vec<u8>,
}

impl StreamReader {
    pub fn new(charset: Rc<dyn Charset>, errors: &str) -> Self {
        Self {
            charset,
            errors: errors.to_string(),
            pending: Vec::new(),
        }
    }

    /// Decode a chunk. A malformed span touching the end of the buffer is
    /// held back as a partial unit unless `final_chunk` is set.
    pub fn feed(&mut self, rt: &mut Runtime, chunk: &[u8], final_chunk: bool) -> RunResult<String> {
        self.pending.extend_from_slice(chunk);
        let input = std::mem::take(&mut self.pending);
        let mut pos = 0usize;
        let mut out = String::new();
        let mut cap = input.len().max(16);
        loop {
            match self.charset.decode_step(&input, &mut pos, &mut out, cap) {
                CoderResult::Underflow => break,
                CoderResult::Overflow => cap *= 2,
                CoderResult::Malformed { len } | CoderResult::Unmappable { len } => {
                    if !final_chunk && pos + len >= input.len() {
                        // possibly completed by the next feed
                        self.pending = input[pos..].to_vec();
                        return Ok(out);
                    }
                    let ctx = CodecErrorContext {
                        kind: CodecErrorKind::Decode,
                        encoding: self.charset.name(),
                        bytes: Some(&input),
                        text: None,
                        start: pos,
                        end: (pos + len.max(1)).min(input.len()),
                        reason: self.charset.decode_reason(),
                    };
                    let (replacement, resume) = handlers::invoke(rt, &self.errors, &ctx)?;
                    out.push_str(&replacement);
                    pos = resume;
                }
            }
        }
        Ok(out)
    }
}

/// Incremental encoder. Text arrives in whole characters, so there is no
/// partial-unit state to keep; the writer exists for registry symmetry.
pub struct StreamWriter {
    charset: Rc<dyn Charset>,
    errors: String,
}

impl StreamWriter {
    pub fn new(charset: Rc<dyn Charset>, errors: &str) -> Self {
        Self {
            charset,
            errors: errors.to_string(),
        }
    }

    pub fn write(&self, rt: &mut Runtime, text: &str) -> RunResult<Vec<u8>> {
        let charset = self.charset.clone();
        Ok(encode_loop(rt, charset.as_ref(), &self.errors, text)?.0)
    }
}
