//! Error taxonomy shared by every FMC crate.
//!
//! - [`DecodeError`] - malformed or mis-sized record bytes, bad bus responses
//! - [`ValidationError`] - semantic violations in a parameter record
//! - [`CommandError`] - command illegal for the current axis state, or bad
//!   parameters
//! - [`FileError`] - referenced controller file absent or malformed
//! - [`TransportError`] - passthrough from the link implementation

use thiserror::Error;

use crate::status::{Axis, AxisState};

/// Errors produced while decoding or encoding fixed-layout records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input length differs from the fixed record size.
    #[error("record size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Required record size.
        expected: usize,
        /// Supplied byte count.
        actual: usize,
    },

    /// A file name does not fit its fixed-width slot.
    #[error("file name '{name}' exceeds slot width of {max} bytes")]
    NameTooLong {
        /// Offending name.
        name: String,
        /// Slot width.
        max: usize,
    },

    /// A file name is empty or carries padding characters.
    #[error("file name '{name}' is empty or padded")]
    InvalidName {
        /// Offending name.
        name: String,
    },

    /// Extension device answered with an exception response.
    #[error("bus exception on function {function:#04x}: code {code:#04x}")]
    BusException {
        /// Function code of the request.
        function: u8,
        /// Exception code returned by the slave.
        code: u8,
    },

    /// Response frame does not match the request.
    #[error("unexpected bus response: {0}")]
    UnexpectedResponse(String),
}

/// Semantic violations in a device-parameter record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Soft-limit minimum exceeds maximum on an axis.
    #[error("axis {axis}: soft limit min {min} exceeds max {max}")]
    InvalidSoftLimits {
        /// Axis index.
        axis: usize,
        /// Configured minimum.
        min: i32,
        /// Configured maximum.
        max: i32,
    },

    /// More axis entries than the controller supports.
    #[error("{count} axis entries supplied, controller supports {max}")]
    InvalidAxisCount {
        /// Supplied entry count.
        count: usize,
        /// Supported axis count.
        max: usize,
    },

    /// Network address text does not fit its field.
    #[error("address '{address}' exceeds {max} bytes")]
    AddressTooLong {
        /// Offending address.
        address: String,
        /// Field width.
        max: usize,
    },

    /// Address text carries NUL or trailing padding the record cannot keep.
    #[error("address '{address}' contains NUL or trailing spaces")]
    InvalidAddress {
        /// Offending address.
        address: String,
    },
}

/// Command rejected before it reaches the controller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Target axis is moving or homing.
    #[error("axis {axis} is busy ({state:?})")]
    AxisBusy {
        /// Axis that is busy.
        axis: Axis,
        /// Its derived state.
        state: AxisState,
    },

    /// Homing requested while a limit sensor is undefined.
    #[error("axis {axis} cannot home: limit sensors undefined")]
    HomeRequiresLimits {
        /// Axis with undefined limits.
        axis: Axis,
    },

    /// Pause/resume requested from a state that does not allow it.
    #[error("cannot {command} axis {axis} in state {state:?}")]
    InvalidStateTransition {
        /// Axis that blocked the transition.
        axis: Axis,
        /// Its derived state.
        state: AxisState,
        /// Requested command.
        command: &'static str,
    },

    /// Auto-run requested while manual motion or another script is active.
    #[error("mode conflict: {0}")]
    ModeConflict(&'static str),

    /// Parameter value outside its legal range.
    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Axis bit pattern does not fit the command shape.
    #[error("invalid axis mask {mask:#04x}: {expected}")]
    InvalidAxisMask {
        /// Supplied mask.
        mask: u8,
        /// What the command accepts.
        expected: &'static str,
    },

    /// Arc end point does not lie on the circle given by center and radius.
    #[error("arc geometry mismatch: radius {radius}, center-to-end distance {distance}")]
    ArcGeometryMismatch {
        /// Declared radius.
        radius: f64,
        /// Measured center-to-end distance.
        distance: f64,
    },
}

impl CommandError {
    /// Shorthand for an [`CommandError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Errors related to the controller's resident file table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    /// File is not present in the current snapshot.
    #[error("file '{0}' not found on controller")]
    NotFound(String),

    /// File name does not fit a controller slot.
    #[error("file name '{name}' exceeds {max} bytes")]
    NameTooLong {
        /// Offending name.
        name: String,
        /// Slot width.
        max: usize,
    },

    /// File name is empty or cannot be stored in a slot unchanged.
    #[error("file name '{0}' is not a valid controller file name")]
    InvalidName(String),

    /// Declared file kind is neither binary nor script.
    #[error("unsupported file kind: {0}")]
    UnsupportedKind(String),
}

/// Failure reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Link to the controller dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// Controller did not answer in time.
    #[error("transport timeout")]
    Timeout,

    /// Controller rejected the request with a return code.
    #[error("controller returned error code {code}")]
    Nak {
        /// Raw return code (negative on the controller API).
        code: i32,
    },

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Other(String),
}
