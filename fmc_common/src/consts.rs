//! System-wide constants for the FMC workspace.
//!
//! Single source of truth for axis counts, record sizes and field widths.
//! Record sizes are fixed by the controller firmware and must not change.

use static_assertions::const_assert_eq;

/// Number of physical axes on the controller (X, Y, Z).
pub const MAX_AXIS: usize = 3;

/// Number of file-name slots in the controller's resident file table.
pub const MAX_FILES: usize = 20;

/// Width of one file-name slot in bytes (NUL/space padded).
pub const FILE_SLOT_LEN: usize = 30;

/// Width of the IP address text field in the parameter record.
pub const IP_FIELD_LEN: usize = 15;

/// Number of digital input lines (IN0..IN3) and output lines (OUT0..OUT3).
pub const DIGITAL_IO_LINES: u8 = 4;

/// Size of the machine-status record in bytes.
///
/// 6×f32 + 5×u32 + 3×u32 + 1×u32 + 20×30 file slots.
pub const STATUS_RECORD_SIZE: usize = 6 * 4 + 5 * 4 + MAX_AXIS * 4 + 4 + MAX_FILES * FILE_SLOT_LEN;

/// Size of the device-parameter record in bytes.
///
/// 3×u32 + 15-byte IP + 1 alignment byte + i32 port + 5 arrays of 3×i32.
pub const PARAM_RECORD_SIZE: usize = 3 * 4 + IP_FIELD_LEN + 1 + 4 + 5 * MAX_AXIS * 4;

/// Size of the version record in bytes.
pub const VERSION_RECORD_SIZE: usize = 3 * 4;

/// Maximum payload for a raw RS-485 passthrough frame.
pub const MAX_RAW_BUS_FRAME: usize = 100;

/// Default relative tolerance for arc radius consistency checks.
pub const DEFAULT_ARC_TOLERANCE: f64 = 1e-3;

const_assert_eq!(STATUS_RECORD_SIZE, 660);
const_assert_eq!(PARAM_RECORD_SIZE, 92);
const_assert_eq!(VERSION_RECORD_SIZE, 12);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_table_is_600_bytes() {
        assert_eq!(MAX_FILES * FILE_SLOT_LEN, 600);
    }

    #[test]
    fn port_field_is_word_aligned() {
        // id, baud232, baud485, ip text, pad → port starts at offset 28.
        let port_offset = 3 * 4 + IP_FIELD_LEN + 1;
        assert_eq!(port_offset % 4, 0);
    }
}
