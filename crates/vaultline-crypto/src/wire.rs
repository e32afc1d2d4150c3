// SPDX-FileCopyrightText: 2026 Vaultline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `$`-delimited binary field serializer.
//!
//! Values are written as a flat sequence of fields in declaration order.
//! Every scalar, string or byte field is terminated by [`SEPARATOR`] unless
//! the enclosing aggregate switched its children to packed mode, in which
//! case fields are written back to back and the reader must know each
//! length in advance.
//!
//! Packed mode is scoped: [`WireWriter::set_packed`] affects only the fields
//! written by the current aggregate, and the previous mode is restored when
//! a nested aggregate returns.

use thiserror::Error;

/// Field terminator.
pub const SEPARATOR: u8 = b'$';

/// Errors raised while decoding wire fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The input ended before the current field was complete.
    #[error("unexpected end of input at byte {offset}")]
    TruncatedInput { offset: usize },

    /// A field was present but could not be interpreted.
    #[error("malformed field at byte {offset}: {reason}")]
    MalformedField { offset: usize, reason: String },
}

/// A value that knows how to lay out its fields on the wire.
pub trait WireFormat: Sized {
    /// Error produced when decoding. Must absorb plain wire errors.
    type Error: From<WireError>;

    fn write_fields(&self, writer: &mut WireWriter);

    fn read_fields(reader: &mut WireReader<'_>) -> Result<Self, Self::Error>;
}

/// Serializes `value` into a fresh buffer.
pub fn encode<T: WireFormat>(value: &T) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.nested(value);
    writer.into_bytes()
}

/// Deserializes a `T` from `input`. Trailing bytes are ignored.
pub fn decode<T: WireFormat>(input: &[u8]) -> Result<T, T::Error> {
    let mut reader = WireReader::new(input);
    reader.nested::<T>()
}

/// Appends fields to a byte buffer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
    packed: bool,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Switches the remaining fields of the current aggregate in or out of
    /// packed mode.
    pub fn set_packed(&mut self, packed: bool) {
        self.packed = packed;
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        if !self.packed {
            self.buf.push(SEPARATOR);
        }
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_str(&value.to_string());
    }

    /// Runs `f` as a nested aggregate. Mode changes made inside do not leak
    /// out.
    pub fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        let saved = self.packed;
        f(self);
        self.packed = saved;
    }

    pub fn nested<T: WireFormat>(&mut self, value: &T) {
        self.scoped(|w| value.write_fields(w));
    }
}

/// Reads fields from a borrowed byte buffer.
#[derive(Debug)]
pub struct WireReader<'a> {
    input: &'a [u8],
    pos: usize,
    packed: bool,
}

impl<'a> WireReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            packed: false,
        }
    }

    pub fn set_packed(&mut self, packed: bool) {
        self.packed = packed;
    }

    /// Byte offset of the next field.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    /// Reads one byte field.
    ///
    /// In delimited mode a `len` of zero reads up to the next separator and
    /// a non-zero `len` reads exactly that many bytes followed by a
    /// separator. In packed mode a non-zero `len` reads exactly that many
    /// bytes and a `len` of zero consumes everything that is left.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let input = self.input;
        let rest = &input[self.pos..];
        match (self.packed, len) {
            (false, 0) => {
                let end = rest
                    .iter()
                    .position(|b| *b == SEPARATOR)
                    .ok_or(WireError::TruncatedInput {
                        offset: self.input.len(),
                    })?;
                self.pos += end + 1;
                Ok(&rest[..end])
            }
            (false, n) => {
                if rest.len() < n + 1 {
                    return Err(WireError::TruncatedInput {
                        offset: self.input.len(),
                    });
                }
                if rest[n] != SEPARATOR {
                    return Err(WireError::MalformedField {
                        offset: self.pos + n,
                        reason: "expected field separator".to_string(),
                    });
                }
                self.pos += n + 1;
                Ok(&rest[..n])
            }
            (true, 0) => {
                self.pos = self.input.len();
                Ok(rest)
            }
            (true, n) => {
                if rest.len() < n {
                    return Err(WireError::TruncatedInput {
                        offset: self.input.len(),
                    });
                }
                self.pos += n;
                Ok(&rest[..n])
            }
        }
    }

    pub fn read_str(&mut self) -> Result<String, WireError> {
        let offset = self.pos;
        let bytes = self.read_bytes(0)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::MalformedField {
                offset,
                reason: "field is not valid UTF-8".to_string(),
            })
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let offset = self.pos;
        let token = self.read_str()?;
        token.parse().map_err(|_| WireError::MalformedField {
            offset,
            reason: format!("`{token}` is not a decimal number"),
        })
    }

    pub fn scoped<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.packed;
        let out = f(self);
        self.packed = saved;
        out
    }

    pub fn nested<T: WireFormat>(&mut self) -> Result<T, T::Error> {
        self.scoped(|r| T::read_fields(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Pair {
        name: String,
        count: u32,
    }

    impl WireFormat for Pair {
        type Error = WireError;

        fn write_fields(&self, w: &mut WireWriter) {
            w.write_str(&self.name);
            w.write_u32(self.count);
        }

        fn read_fields(r: &mut WireReader<'_>) -> Result<Self, WireError> {
            Ok(Self {
                name: r.read_str()?,
                count: r.read_u32()?,
            })
        }
    }

    #[derive(Debug, PartialEq)]
    struct Outer {
        head: Pair,
        tail: Vec<u8>,
        after: Pair,
    }

    impl WireFormat for Outer {
        type Error = WireError;

        fn write_fields(&self, w: &mut WireWriter) {
            w.nested(&self.head);
            w.scoped(|w| {
                w.set_packed(true);
                w.write_bytes(&self.tail);
            });
            w.nested(&self.after);
        }

        fn read_fields(r: &mut WireReader<'_>) -> Result<Self, WireError> {
            let head = r.nested::<Pair>()?;
            let tail = r.scoped(|r| {
                r.set_packed(true);
                r.read_bytes(4).map(<[u8]>::to_vec)
            })?;
            let after = r.nested::<Pair>()?;
            Ok(Self { head, tail, after })
        }
    }

    #[test]
    fn delimited_fields_are_terminated() {
        let bytes = encode(&Pair {
            name: "aes256".into(),
            count: 16,
        });
        assert_eq!(bytes, b"aes256$16$");
    }

    #[test]
    fn empty_field_still_emits_separator() {
        let mut w = WireWriter::new();
        w.write_bytes(b"");
        w.write_u32(1);
        assert_eq!(w.into_bytes(), b"$1$");
    }

    #[test]
    fn packed_mode_does_not_leak_out_of_scope() {
        let value = Outer {
            head: Pair {
                name: "a".into(),
                count: 1,
            },
            tail: b"WXYZ".to_vec(),
            after: Pair {
                name: "b".into(),
                count: 2,
            },
        };
        let bytes = encode(&value);
        assert_eq!(bytes, b"a$1$WXYZb$2$");
        assert_eq!(decode::<Outer>(&bytes).unwrap(), value);
    }

    #[test]
    fn packed_zero_length_consumes_remainder() {
        let mut r = WireReader::new(b"abc$def");
        assert_eq!(r.read_bytes(0).unwrap(), b"abc");
        r.set_packed(true);
        assert_eq!(r.read_bytes(0).unwrap(), b"def");
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn missing_separator_is_truncation() {
        let err = decode::<Pair>(b"name$12").unwrap_err();
        assert_eq!(err, WireError::TruncatedInput { offset: 7 });
    }

    #[test]
    fn short_packed_field_is_truncation() {
        let mut r = WireReader::new(b"ab");
        r.set_packed(true);
        assert!(matches!(
            r.read_bytes(3),
            Err(WireError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn non_numeric_token_is_malformed() {
        let err = decode::<Pair>(b"name$twelve$").unwrap_err();
        assert!(matches!(err, WireError::MalformedField { offset: 5, .. }));
    }

    #[test]
    fn sized_delimited_field_requires_separator() {
        let mut r = WireReader::new(b"abcd$");
        assert!(matches!(
            r.read_bytes(3),
            Err(WireError::MalformedField { offset: 3, .. })
        ));
    }
}
