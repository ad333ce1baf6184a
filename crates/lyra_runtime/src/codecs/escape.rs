//! Backslash-escape codec.
//!
//! A byte-level state machine over C-style escapes, deliberately not routed
//! through the charset engine: it maps bytes to bytes. The error policy
//! argument applies only to malformed `\x` sequences; unknown escapes pass
//! through with the backslash preserved.

use crate::errors::{RunResult, value_error};

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Decode `\n`, `\t`, octal `\ooo`, hex `\xHH` and friends.
///
/// Returns the decoded bytes and the number of input bytes consumed.
pub fn escape_decode(input: &[u8], errors: &str) -> RunResult<(Vec<u8>, usize)> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0usize;
    while i < input.len() {
        let b = input[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }
        i += 1;
        let Some(&esc) = input.get(i) else {
            return Err(value_error("Trailing \\ in string"));
        };
        i += 1;
        match esc {
            b'\n' => {} // line continuation disappears
            b'\\' => out.push(b'\\'),
            b'\'' => out.push(b'\''),
            b'"' => out.push(b'"'),
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                // up to three octal digits
                let mut value = (esc - b'0') as u32;
                for _ in 0..2 {
                    match input.get(i) {
                        Some(&d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            i += 1;
                        }
                        _ => break,
                    }
                }
                out.push((value & 0xff) as u8);
            }
            b'x' => {
                let hi = input.get(i).copied().and_then(hex_digit);
                let lo = input.get(i + 1).copied().and_then(hex_digit);
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        out.push((h << 4) | l);
                        i += 2;
                    }
                    _ => match errors {
                        "strict" => {
                            return Err(value_error(format!(
                                "invalid \\x escape at position {}",
                                i - 2
                            )));
                        }
                        "replace" => out.push(b'?'),
                        "ignore" => {}
                        other => {
                            return Err(value_error(format!(
                                "decoding error; unknown error handling code: {other}"
                            )));
                        }
                    },
                }
            }
            other => {
                // not an escape we know: keep it verbatim
                out.push(b'\\');
                out.push(other);
            }
        }
    }
    Ok((out, input.len()))
}

/// Encode bytes into their backslash-escaped form.
pub fn escape_encode(input: &[u8]) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(input.len());
    for &b in input {
        match b {
            b'\\' => out.extend_from_slice(b"\\\\"),
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            b'\t' => out.extend_from_slice(b"\\t"),
            b'\'' => out.extend_from_slice(b"\\'"),
            0x20..=0x7e => out.push(b),
            _ => {
                out.extend_from_slice(format!("\\x{b:02x}").as_bytes());
            }
        }
    }
    (out, input.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_escapes() {
        let (out, n) = escape_decode(b"a\\nb\\tc", "strict").unwrap();
        assert_eq!(out, b"a\nb\tc");
        assert_eq!(n, 7);
    }

    #[test]
    fn octal_and_hex() {
        let (out, _) = escape_decode(b"\\101\\x42\\7", "strict").unwrap();
        assert_eq!(out, b"AB\x07");
    }

    #[test]
    fn octal_wraps_at_byte() {
        let (out, _) = escape_decode(b"\\777", "strict").unwrap();
        assert_eq!(out, [0xff]);
    }

    #[test]
    fn unknown_escape_passes_through() {
        let (out, _) = escape_decode(b"\\q", "strict").unwrap();
        assert_eq!(out, b"\\q");
    }

    #[test]
    fn malformed_hex_policies() {
        assert!(escape_decode(b"\\xZZ", "strict").is_err());
        assert_eq!(escape_decode(b"a\\xZZb", "replace").unwrap().0, b"a?ZZb");
        assert_eq!(escape_decode(b"a\\xZZb", "ignore").unwrap().0, b"aZZb");
    }

    #[test]
    fn trailing_backslash() {
        assert!(escape_decode(b"abc\\", "strict").is_err());
    }

    #[test]
    fn line_continuation_disappears() {
        let (out, _) = escape_decode(b"a\\\nb", "strict").unwrap();
        assert_eq!(out, b"ab");
    }

    #[test]
    fn encode_round_trips_through_decode() {
        let data: Vec<u8> = (0u8..=255).collect();
        let (encoded, _) = escape_encode(&data);
        let (decoded, _) = escape_decode(&encoded, "strict").unwrap();
        assert_eq!(decoded, data);
    }
}
