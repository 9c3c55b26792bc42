//! Motion command model, builder and wire frames.
//!
//! - [`selection`]: closed set of axis combinations
//! - [`motion`]: [`MotionCommand`] variants, their parameters and encoding
//! - [`builder`]: validation against parameters and the current snapshot
//!
//! Every frame sent to the controller starts with a one-byte opcode and a
//! one-byte axis mask, followed by little-endian parameters.

pub mod builder;
pub mod motion;
pub mod selection;

pub use builder::{CommandLimits, MotionCommandBuilder};
pub use motion::{
    ArcDirection, ArcParams, HomeDirection, HomeParams, JogMode, JogParams, LineParams,
    MotionCommand, StopMode,
};
pub use selection::AxisSelection;

use fmc_common::consts::FILE_SLOT_LEN;

/// Little-endian command frame writer.
pub(crate) struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    pub(crate) fn new(opcode: u8, mask: u8) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.push(opcode);
        buf.push(mask);
        Self { buf }
    }

    pub(crate) fn f32(mut self, v: f32) -> Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub(crate) fn f32s(mut self, values: &[f32]) -> Self {
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        self
    }

    pub(crate) fn u8(mut self, v: u8) -> Self {
        self.buf.push(v);
        self
    }

    /// File name, NUL padded to one slot. Caller checks the length.
    pub(crate) fn slot_name(mut self, name: &str) -> Self {
        let bytes = name.as_bytes();
        let len = bytes.len().min(FILE_SLOT_LEN);
        self.buf.extend_from_slice(&bytes[..len]);
        self.buf.resize(self.buf.len() + (FILE_SLOT_LEN - len), 0);
        self
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_header_then_payload() {
        let frame = FrameWriter::new(0x01, 0x02).f32(1.0).u8(2).finish();
        assert_eq!(frame, vec![0x01, 0x02, 0x00, 0x00, 0x80, 0x3F, 0x02]);
    }

    #[test]
    fn slot_name_is_padded() {
        let frame = FrameWriter::new(0x20, 0).slot_name("a.lua").finish();
        assert_eq!(frame.len(), 2 + FILE_SLOT_LEN);
        assert_eq!(&frame[2..7], b"a.lua");
        assert!(frame[7..].iter().all(|&b| b == 0));
    }
}
