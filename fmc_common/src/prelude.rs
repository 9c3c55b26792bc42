//! Prelude module for common re-exports.
//!
//! `use fmc_common::prelude::*;` brings in the record types, codecs and
//! error enums that nearly every consumer needs.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{
    DIGITAL_IO_LINES, FILE_SLOT_LEN, MAX_AXIS, MAX_FILES, PARAM_RECORD_SIZE, STATUS_RECORD_SIZE,
    VERSION_RECORD_SIZE,
};

// ─── Records ────────────────────────────────────────────────────────
pub use crate::params::{AxisParams, DeviceParams};
pub use crate::status::{
    Axis, AxisFlags, AxisState, FileTable, FlagConflict, LimitSide, MachineStatus, RunMode,
    StatusAnomaly, VersionInfo,
};

// ─── Codecs ─────────────────────────────────────────────────────────
pub use crate::codec::{
    decode_params, decode_status, decode_version, encode_params, encode_status, encode_version,
};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{CommandError, DecodeError, FileError, TransportError, ValidationError};
