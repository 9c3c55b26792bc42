//! Machine-status and version record codec.

use tracing::trace;

use super::{RecordReader, RecordWriter, check_size, padded_text};
use crate::consts::{FILE_SLOT_LEN, MAX_FILES, STATUS_RECORD_SIZE, VERSION_RECORD_SIZE};
use crate::error::DecodeError;
use crate::status::{AxisFlags, FileTable, MachineStatus, RunMode, VersionInfo};

/// Decode a 660-byte status record.
///
/// Unknown axis bits and run-mode values are preserved. Empty file slots are
/// skipped; occupied slots keep their order.
///
/// # Errors
///
/// `DecodeError::SizeMismatch` if `bytes` is not exactly
/// [`STATUS_RECORD_SIZE`] long.
pub fn decode_status(bytes: &[u8]) -> Result<MachineStatus, DecodeError> {
    check_size(bytes, STATUS_RECORD_SIZE)?;
    let mut r = RecordReader::new(bytes);

    let mut status = MachineStatus::default();
    for v in status.real_pos.iter_mut() {
        *v = r.f32();
    }
    for v in status.real_speed.iter_mut() {
        *v = r.f32();
    }
    status.input_status = r.u32();
    status.output_status = r.u32();
    status.limit_n_status = r.u32();
    status.limit_p_status = r.u32();
    status.run_mode = RunMode::from_bits(r.u32());
    for flags in status.axis_status.iter_mut() {
        *flags = AxisFlags::from_bits_retain(r.u32());
    }
    status.home_status = r.u32();

    let mut files = FileTable::new();
    for _ in 0..MAX_FILES {
        let name = padded_text(r.bytes(FILE_SLOT_LEN));
        if !name.is_empty() {
            // Cannot overflow: at most MAX_FILES slots are read.
            let _ = files.push(name);
        }
    }
    status.files = files;

    trace!(files = status.files.len(), "decoded status record");
    Ok(status)
}

/// Encode a status snapshot into its 660-byte record.
///
/// # Errors
///
/// - `DecodeError::NameTooLong` if a file name exceeds [`FILE_SLOT_LEN`]
/// - `DecodeError::InvalidName` if a file name is empty, contains NUL or
///   ends in padding
pub fn encode_status(status: &MachineStatus) -> Result<Vec<u8>, DecodeError> {
    for name in status.files.iter() {
        check_file_name(name)?;
    }

    let mut w = RecordWriter::with_capacity(STATUS_RECORD_SIZE);
    for &v in &status.real_pos {
        w.f32(v);
    }
    for &v in &status.real_speed {
        w.f32(v);
    }
    w.u32(status.input_status);
    w.u32(status.output_status);
    w.u32(status.limit_n_status);
    w.u32(status.limit_p_status);
    w.u32(status.run_mode.bits());
    for flags in &status.axis_status {
        w.u32(flags.bits());
    }
    w.u32(status.home_status);
    for name in status.files.iter() {
        w.padded(name.as_bytes(), FILE_SLOT_LEN);
    }
    w.zeros((MAX_FILES - status.files.len()) * FILE_SLOT_LEN);

    Ok(w.finish())
}

/// Check that `name` fits a file slot and survives a decode unchanged.
pub fn check_file_name(name: &str) -> Result<(), DecodeError> {
    if name.len() > FILE_SLOT_LEN {
        return Err(DecodeError::NameTooLong {
            name: name.to_string(),
            max: FILE_SLOT_LEN,
        });
    }
    if name.is_empty() || name.contains('\0') || name.ends_with(' ') {
        return Err(DecodeError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Decode a 12-byte version record.
pub fn decode_version(bytes: &[u8]) -> Result<VersionInfo, DecodeError> {
    check_size(bytes, VERSION_RECORD_SIZE)?;
    let mut r = RecordReader::new(bytes);
    Ok(VersionInfo {
        firmware: r.u32(),
        lib: r.u32(),
        serial_number: r.u32(),
    })
}

/// Encode a version record (fixtures and simulated controllers).
pub fn encode_version(version: &VersionInfo) -> Vec<u8> {
    let mut w = RecordWriter::with_capacity(VERSION_RECORD_SIZE);
    w.u32(version.firmware);
    w.u32(version.lib);
    w.u32(version.serial_number);
    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Axis;

    fn sample() -> MachineStatus {
        let mut files = FileTable::new();
        files.push("prog.bin".to_string()).unwrap();
        files.push("scan_line.lua".to_string()).unwrap();
        MachineStatus {
            real_pos: [12.5, -3.25, 0.0],
            real_speed: [100.0, 0.0, 0.0],
            input_status: 0b0101,
            output_status: 0b0010,
            limit_n_status: 0b001,
            limit_p_status: 0,
            run_mode: RunMode::Manual,
            axis_status: [
                AxisFlags::RUNNING,
                AxisFlags::HOME_DONE,
                AxisFlags::LIMIT_N_UNDEFINED | AxisFlags::LIMIT_P_UNDEFINED,
            ],
            home_status: 0b010,
            files,
        }
    }

    #[test]
    fn roundtrip() {
        let status = sample();
        let bytes = encode_status(&status).unwrap();
        assert_eq!(bytes.len(), STATUS_RECORD_SIZE);
        assert_eq!(decode_status(&bytes).unwrap(), status);
    }

    #[test]
    fn field_offsets_match_layout() {
        let bytes = encode_status(&sample()).unwrap();
        // real_pos[0] at 0, input_status at 24, run mode at 40, axis_status at 44.
        assert_eq!(f32::from_le_bytes(bytes[0..4].try_into().unwrap()), 12.5);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 0b0101);
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[44..48].try_into().unwrap()), 0x0001);
        assert_eq!(u32::from_le_bytes(bytes[56..60].try_into().unwrap()), 0b010);
        assert_eq!(&bytes[60..68], b"prog.bin");
        assert_eq!(&bytes[90..103], b"scan_line.lua");
    }

    #[test]
    fn size_mismatch_short_and_long() {
        assert_eq!(
            decode_status(&[0u8; STATUS_RECORD_SIZE - 1]),
            Err(DecodeError::SizeMismatch {
                expected: STATUS_RECORD_SIZE,
                actual: STATUS_RECORD_SIZE - 1
            })
        );
        assert!(matches!(
            decode_status(&[0u8; STATUS_RECORD_SIZE + 1]),
            Err(DecodeError::SizeMismatch { .. })
        ));
        assert!(matches!(decode_status(&[]), Err(DecodeError::SizeMismatch { .. })));
    }

    #[test]
    fn unknown_bits_preserved() {
        let mut bytes = vec![0u8; STATUS_RECORD_SIZE];
        bytes[40..44].copy_from_slice(&9u32.to_le_bytes());
        bytes[48..52].copy_from_slice(&0x4000_0081u32.to_le_bytes());
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.run_mode, RunMode::Unknown(9));
        assert_eq!(status.axis_flags(Axis::Y).bits(), 0x4000_0081);
        assert_eq!(encode_status(&status).unwrap(), bytes);
    }

    #[test]
    fn space_padded_slots_trimmed_and_empty_slots_skipped() {
        let mut bytes = vec![0u8; STATUS_RECORD_SIZE];
        let slot = |i: usize| 60 + i * FILE_SLOT_LEN;
        bytes[slot(0)..slot(1)].fill(b' ');
        bytes[slot(3)..slot(3) + 6].copy_from_slice(b"a.lua ");
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.files.len(), 1);
        assert_eq!(status.files[0], "a.lua");
    }

    #[test]
    fn non_utf8_slot_decodes_to_encodable_name() {
        let mut bytes = vec![0u8; STATUS_RECORD_SIZE];
        bytes[60..60 + FILE_SLOT_LEN].fill(0xFF);
        let status = decode_status(&bytes).unwrap();
        assert_eq!(status.files[0].len(), FILE_SLOT_LEN);

        let reencoded = encode_status(&status).unwrap();
        assert_eq!(decode_status(&reencoded).unwrap(), status);
    }

    #[test]
    fn name_too_long_rejected() {
        let mut status = sample();
        status.files.push("x".repeat(FILE_SLOT_LEN + 1)).unwrap();
        assert!(matches!(
            encode_status(&status),
            Err(DecodeError::NameTooLong { max: FILE_SLOT_LEN, .. })
        ));
    }

    #[test]
    fn full_width_name_accepted() {
        let mut status = sample();
        status.files.push("y".repeat(FILE_SLOT_LEN)).unwrap();
        let bytes = encode_status(&status).unwrap();
        assert_eq!(decode_status(&bytes).unwrap(), status);
    }

    #[test]
    fn padded_names_rejected() {
        assert!(matches!(check_file_name(""), Err(DecodeError::InvalidName { .. })));
        assert!(matches!(check_file_name("a "), Err(DecodeError::InvalidName { .. })));
        assert!(matches!(check_file_name("a\0b"), Err(DecodeError::InvalidName { .. })));
    }

    #[test]
    fn version_record() {
        let v = VersionInfo {
            firmware: 0x0102,
            lib: 7,
            serial_number: 40_300_021,
        };
        let bytes = encode_version(&v);
        assert_eq!(bytes.len(), VERSION_RECORD_SIZE);
        assert_eq!(decode_version(&bytes).unwrap(), v);
        assert!(matches!(decode_version(&bytes[..8]), Err(DecodeError::SizeMismatch { .. })));
    }
}
