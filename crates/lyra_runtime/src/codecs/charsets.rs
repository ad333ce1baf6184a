//! Built-in charset engines.
//!
//! Each charset implements one step contract: consume input from the cursor,
//! produce output until the soft capacity is reached, and report how the
//! step ended. The transcode loop in `engine` owns buffer growth and error
//! recovery; charsets never see the error handler.

/// How a charset step ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoderResult {
    /// All input consumed; output flushed.
    Underflow,
    /// Output reached capacity; grow and re-step.
    Overflow,
    /// Ill-formed unit of `len` bytes/chars at the cursor.
    Malformed { len: usize },
    /// Well-formed input the target charset cannot represent.
    Unmappable { len: usize },
}

pub trait Charset {
    fn name(&self) -> &'static str;

    /// Decode bytes from `input[*pos..]`, appending to `out` while
    /// `out.len() < out_cap`.
    fn decode_step(
        &self,
        input: &[u8],
        pos: &mut usize,
        out: &mut String,
        out_cap: usize,
    ) -> CoderResult;

    /// Encode chars from `input[*pos..]` (byte offset), appending to `out`
    /// while `out.len() < out_cap`.
    fn encode_step(
        &self,
        input: &str,
        pos: &mut usize,
        out: &mut Vec<u8>,
        out_cap: usize,
    ) -> CoderResult;

    /// Reason strings for error messages.
    fn decode_reason(&self) -> &'static str {
        "invalid byte sequence"
    }

    fn encode_reason(&self) -> &'static str {
        "character not representable"
    }
}

// ============================================================================
// UTF-8
// ============================================================================

pub struct Utf8;

impl Charset for Utf8 {
    fn name(&self) -> &'static str {
        "utf-8"
    }

    fn decode_step(
        &self,
        input: &[u8],
        pos: &mut usize,
        out: &mut String,
        out_cap: usize,
    ) -> CoderResult {
        while *pos < input.len() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            let chunk = &input[*pos..];
            match std::str::from_utf8(chunk) {
                Ok(s) => {
                    out.push_str(s);
                    *pos += chunk.len();
                    return CoderResult::Underflow;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    if valid > 0 {
                        // SAFETY: validated prefix
                        out.push_str(unsafe { std::str::from_utf8_unchecked(&chunk[..valid]) });
                        *pos += valid;
                        continue;
                    }
                    let len = e.error_len().unwrap_or(chunk.len());
                    return CoderResult::Malformed { len };
                }
            }
        }
        CoderResult::Underflow
    }

    fn encode_step(
        &self,
        input: &str,
        pos: &mut usize,
        out: &mut Vec<u8>,
        out_cap: usize,
    ) -> CoderResult {
        // Rust strings are already well-formed UTF-8.
        for c in input[*pos..].chars() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            *pos += c.len_utf8();
        }
        CoderResult::Underflow
    }

    fn decode_reason(&self) -> &'static str {
        "invalid start byte"
    }
}

// ============================================================================
// ASCII and Latin-1
// ============================================================================

pub struct Ascii;

impl Charset for Ascii {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn decode_step(
        &self,
        input: &[u8],
        pos: &mut usize,
        out: &mut String,
        out_cap: usize,
    ) -> CoderResult {
        while let Some(&b) = input.get(*pos) {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            if b >= 0x80 {
                return CoderResult::Malformed { len: 1 };
            }
            out.push(b as char);
            *pos += 1;
        }
        CoderResult::Underflow
    }

    fn encode_step(
        &self,
        input: &str,
        pos: &mut usize,
        out: &mut Vec<u8>,
        out_cap: usize,
    ) -> CoderResult {
        for c in input[*pos..].chars() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            if (c as u32) >= 0x80 {
                return CoderResult::Unmappable { len: c.len_utf8() };
            }
            out.push(c as u8);
            *pos += 1;
        }
        CoderResult::Underflow
    }

    fn decode_reason(&self) -> &'static str {
        "ordinal not in range(128)"
    }

    fn encode_reason(&self) -> &'static str {
        "ordinal not in range(128)"
    }
}

pub struct Latin1;

impl Charset for Latin1 {
    fn name(&self) -> &'static str {
        "latin-1"
    }

    fn decode_step(
        &self,
        input: &[u8],
        pos: &mut usize,
        out: &mut String,
        out_cap: usize,
    ) -> CoderResult {
        while let Some(&b) = input.get(*pos) {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            out.push(b as char);
            *pos += 1;
        }
        CoderResult::Underflow
    }

    fn encode_step(
        &self,
        input: &str,
        pos: &mut usize,
        out: &mut Vec<u8>,
        out_cap: usize,
    ) -> CoderResult {
        for c in input[*pos..].chars() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            if (c as u32) >= 0x100 {
                return CoderResult::Unmappable { len: c.len_utf8() };
            }
            out.push(c as u8);
            *pos += c.len_utf8();
        }
        CoderResult::Underflow
    }

    fn encode_reason(&self) -> &'static str {
        "ordinal not in range(256)"
    }
}

// ============================================================================
// UTF-16 / UTF-32
// ============================================================================

pub struct Utf16 {
    pub big_endian: bool,
}

impl Utf16 {
    fn unit(&self, input: &[u8], at: usize) -> u16 {
        let (a, b) = (input[at], input[at + 1]);
        if self.big_endian {
            u16::from_be_bytes([a, b])
        } else {
            u16::from_le_bytes([a, b])
        }
    }

    fn push_unit(&self, out: &mut Vec<u8>, unit: u16) {
        let bytes = if self.big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        };
        out.extend_from_slice(&bytes);
    }
}

impl Charset for Utf16 {
    fn name(&self) -> &'static str {
        if self.big_endian { "utf-16-be" } else { "utf-16-le" }
    }

    fn decode_step(
        &self,
        input: &[u8],
        pos: &mut usize,
        out: &mut String,
        out_cap: usize,
    ) -> CoderResult {
        while *pos < input.len() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            if input.len() - *pos < 2 {
                return CoderResult::Malformed {
                    len: input.len() - *pos,
                };
            }
            let w1 = self.unit(input, *pos);
            match w1 {
                0xd800..=0xdbff => {
                    if input.len() - *pos < 4 {
                        return CoderResult::Malformed {
                            len: input.len() - *pos,
                        };
                    }
                    let w2 = self.unit(input, *pos + 2);
                    if !(0xdc00..=0xdfff).contains(&w2) {
                        return CoderResult::Malformed { len: 2 };
                    }
                    let cp =
                        0x10000 + (((w1 as u32 - 0xd800) << 10) | (w2 as u32 - 0xdc00));
                    out.push(char::from_u32(cp).expect("valid surrogate pair"));
                    *pos += 4;
                }
                0xdc00..=0xdfff => return CoderResult::Malformed { len: 2 },
                _ => {
                    out.push(char::from_u32(w1 as u32).expect("BMP scalar"));
                    *pos += 2;
                }
            }
        }
        CoderResult::Underflow
    }

    fn encode_step(
        &self,
        input: &str,
        pos: &mut usize,
        out: &mut Vec<u8>,
        out_cap: usize,
    ) -> CoderResult {
        for c in input[*pos..].chars() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                self.push_unit(out, *unit);
            }
            *pos += c.len_utf8();
        }
        CoderResult::Underflow
    }

    fn decode_reason(&self) -> &'static str {
        "truncated data"
    }
}

pub struct Utf32 {
    pub big_endian: bool,
}

impl Charset for Utf32 {
    fn name(&self) -> &'static str {
        if self.big_endian { "utf-32-be" } else { "utf-32-le" }
    }

    fn decode_step(
        &self,
        input: &[u8],
        pos: &mut usize,
        out: &mut String,
        out_cap: usize,
    ) -> CoderResult {
        while *pos < input.len() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            if input.len() - *pos < 4 {
                return CoderResult::Malformed {
                    len: input.len() - *pos,
                };
            }
            let raw = [
                input[*pos],
                input[*pos + 1],
                input[*pos + 2],
                input[*pos + 3],
            ];
            let cp = if self.big_endian {
                u32::from_be_bytes(raw)
            } else {
                u32::from_le_bytes(raw)
            };
            match char::from_u32(cp) {
                Some(c) => {
                    out.push(c);
                    *pos += 4;
                }
                None => return CoderResult::Malformed { len: 4 },
            }
        }
        CoderResult::Underflow
    }

    fn encode_step(
        &self,
        input: &str,
        pos: &mut usize,
        out: &mut Vec<u8>,
        out_cap: usize,
    ) -> CoderResult {
        for c in input[*pos..].chars() {
            if out.len() >= out_cap {
                return CoderResult::Overflow;
            }
            let bytes = if self.big_endian {
                (c as u32).to_be_bytes()
            } else {
                (c as u32).to_le_bytes()
            };
            out.extend_from_slice(&bytes);
            *pos += c.len_utf8();
        }
        CoderResult::Underflow
    }

    fn decode_reason(&self) -> &'static str {
        "code point not in range(0x110000)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(cs: &dyn Charset, input: &[u8]) -> Result<String, (usize, usize)> {
        let mut pos = 0;
        let mut out = String::new();
        loop {
            match cs.decode_step(input, &mut pos, &mut out, usize::MAX) {
                CoderResult::Underflow => return Ok(out),
                CoderResult::Malformed { len } | CoderResult::Unmappable { len } => {
                    return Err((pos, len));
                }
                CoderResult::Overflow => unreachable!(),
            }
        }
    }

    #[test]
    fn utf8_round_trip() {
        let s = "héllo ∀x 🎈";
        let mut pos = 0;
        let mut bytes = Vec::new();
        assert_eq!(
            Utf8.encode_step(s, &mut pos, &mut bytes, usize::MAX),
            CoderResult::Underflow
        );
        assert_eq!(decode_all(&Utf8, &bytes).unwrap(), s);
    }

    #[test]
    fn utf8_reports_error_position() {
        let r = decode_all(&Utf8, b"ab\xffcd");
        assert_eq!(r, Err((2, 1)));
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        assert_eq!(decode_all(&Ascii, b"ok").unwrap(), "ok");
        assert_eq!(decode_all(&Ascii, b"a\x80"), Err((1, 1)));
    }

    #[test]
    fn latin1_decodes_everything() {
        let all: Vec<u8> = (0..=255).collect();
        let s = decode_all(&Latin1, &all).unwrap();
        assert_eq!(s.chars().count(), 256);
        assert_eq!(s.chars().last().unwrap(), '\u{ff}');
    }

    #[test]
    fn utf16_surrogate_pairs() {
        let cs = Utf16 { big_endian: false };
        let mut pos = 0;
        let mut bytes = Vec::new();
        cs.encode_step("a🎈", &mut pos, &mut bytes, usize::MAX);
        assert_eq!(bytes.len(), 6); // 2 + surrogate pair
        assert_eq!(decode_all(&cs, &bytes).unwrap(), "a🎈");
    }

    #[test]
    fn utf16_lone_surrogate_is_malformed() {
        let cs = Utf16 { big_endian: true };
        // lone high surrogate then 'a'
        let bytes = [0xd8, 0x00, 0x00, b'a'];
        assert!(decode_all(&cs, &bytes).is_err());
    }

    #[test]
    fn utf32_range_check() {
        let cs = Utf32 { big_endian: false };
        let bad = 0x0011_0000u32.to_le_bytes();
        assert_eq!(decode_all(&cs, &bad), Err((0, 4)));
        let mut pos = 0;
        let mut bytes = Vec::new();
        cs.encode_step("🎈", &mut pos, &mut bytes, usize::MAX);
        assert_eq!(decode_all(&cs, &bytes).unwrap(), "🎈");
    }
}
