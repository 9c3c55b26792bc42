//! Fixed-layout record codecs.
//!
//! The controller exchanges packed little-endian records whose layout
//! matches the vendor library's C structures byte-for-byte:
//!
//! | Record            | Size | Module       |
//! |-------------------|------|--------------|
//! | Machine status    | 660  | [`status`]   |
//! | Device parameters | 92   | [`params`]   |
//! | Version info      | 12   | [`status`]   |
//!
//! Decoding never judges legality of the contents; that is the job of the
//! axis state machine.

pub mod params;
pub mod status;

pub use params::{decode_params, encode_params};
pub use status::{decode_status, decode_version, encode_status, encode_version};

use crate::error::DecodeError;

/// Reject input whose length differs from the fixed record size.
#[inline]
pub(crate) fn check_size(bytes: &[u8], expected: usize) -> Result<(), DecodeError> {
    if bytes.len() != expected {
        return Err(DecodeError::SizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(())
}

/// Sequential little-endian reader over a size-checked record.
pub(crate) struct RecordReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> RecordReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn word(&mut self) -> [u8; 4] {
        let mut w = [0u8; 4];
        w.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        self.pos += 4;
        w
    }

    pub(crate) fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.word())
    }

    pub(crate) fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.word())
    }

    pub(crate) fn f32(&mut self) -> f32 {
        f32::from_le_bytes(self.word())
    }

    pub(crate) fn bytes(&mut self, len: usize) -> &'a [u8] {
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        out
    }

    pub(crate) fn skip(&mut self, len: usize) {
        self.pos += len;
    }
}

/// Little-endian writer producing a record of known size.
pub(crate) struct RecordWriter {
    buf: Vec<u8>,
}

impl RecordWriter {
    pub(crate) fn with_capacity(size: usize) -> Self {
        Self {
            buf: Vec::with_capacity(size),
        }
    }

    pub(crate) fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub(crate) fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// Write `text` into a fixed-width field, NUL padded. Caller checks width.
    pub(crate) fn padded(&mut self, text: &[u8], width: usize) {
        self.buf.extend_from_slice(text);
        self.buf.resize(self.buf.len() + (width - text.len()), 0);
    }

    pub(crate) fn zeros(&mut self, len: usize) {
        self.buf.resize(self.buf.len() + len, 0);
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Decode a NUL/space padded text field.
///
/// Content ends at the first NUL; trailing spaces are trimmed. Each invalid
/// UTF-8 byte becomes `?`, so decoding stays total and the text never grows
/// past the field width.
pub(crate) fn padded_text(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let mut text = String::with_capacity(end);
    for chunk in field[..end].utf8_chunks() {
        text.push_str(chunk.valid());
        text.extend(chunk.invalid().iter().map(|_| '?'));
    }
    text.truncate(text.trim_end_matches(' ').len());
    text
}
