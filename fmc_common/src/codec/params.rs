//! Device-parameter record codec.
//!
//! Layout (little-endian, 92 bytes):
//!
//! | Offset | Field          | Type      |
//! |--------|----------------|-----------|
//! | 0      | id             | u32       |
//! | 4      | baud232        | u32       |
//! | 8      | baud485        | u32       |
//! | 12     | ip             | [u8; 15]  |
//! | 27     | (alignment)    | u8        |
//! | 28     | port           | i32       |
//! | 32     | div            | [i32; 3]  |
//! | 44     | lead           | [i32; 3]  |
//! | 56     | softLimitMax   | [i32; 3]  |
//! | 68     | softLimitMin   | [i32; 3]  |
//! | 80     | homeTime       | [i32; 3]  |

use super::{RecordReader, RecordWriter, check_size, padded_text};
use crate::consts::{IP_FIELD_LEN, MAX_AXIS, PARAM_RECORD_SIZE};
use crate::error::{DecodeError, ValidationError};
use crate::params::{AxisParams, DeviceParams};

/// Decode a 92-byte parameter record. Always yields [`MAX_AXIS`] axis entries.
pub fn decode_params(bytes: &[u8]) -> Result<DeviceParams, DecodeError> {
    check_size(bytes, PARAM_RECORD_SIZE)?;
    let mut r = RecordReader::new(bytes);

    let id = r.u32();
    let baud_232 = r.u32();
    let baud_485 = r.u32();
    let ip = padded_text(r.bytes(IP_FIELD_LEN));
    r.skip(1);
    let port = r.i32();

    let mut axes = vec![AxisParams::default(); MAX_AXIS];
    for a in axes.iter_mut() {
        a.div = r.i32();
    }
    for a in axes.iter_mut() {
        a.lead = r.i32();
    }
    for a in axes.iter_mut() {
        a.soft_limit_max = r.i32();
    }
    for a in axes.iter_mut() {
        a.soft_limit_min = r.i32();
    }
    for a in axes.iter_mut() {
        a.home_time = r.i32();
    }

    Ok(DeviceParams {
        id,
        baud_232,
        baud_485,
        ip,
        port,
        axes,
    })
}

/// Validate and encode a parameter record.
///
/// Records with fewer than [`MAX_AXIS`] axis entries are zero-filled.
///
/// # Errors
///
/// Any [`ValidationError`] reported by [`DeviceParams::validate`].
pub fn encode_params(params: &DeviceParams) -> Result<Vec<u8>, ValidationError> {
    params.validate()?;

    let mut w = RecordWriter::with_capacity(PARAM_RECORD_SIZE);
    w.u32(params.id);
    w.u32(params.baud_232);
    w.u32(params.baud_485);
    w.padded(params.ip.as_bytes(), IP_FIELD_LEN);
    w.zeros(1);
    w.i32(params.port);

    let fields: [fn(&AxisParams) -> i32; 5] = [
        |a| a.div,
        |a| a.lead,
        |a| a.soft_limit_max,
        |a| a.soft_limit_min,
        |a| a.home_time,
    ];
    for field in fields {
        for i in 0..MAX_AXIS {
            w.i32(field(&params.axis(i)));
        }
    }

    Ok(w.finish())
}
