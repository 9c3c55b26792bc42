//! Crate-level error aggregating the shared taxonomy.

use fmc_common::error::{CommandError, DecodeError, FileError, TransportError, ValidationError};
use thiserror::Error;

use crate::transport::DeviceId;

/// Any failure a [`DeviceSession`](crate::session::DeviceSession) operation can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// No status has been polled for the device yet.
    #[error("no status snapshot cached for device {device}")]
    NoSnapshot { device: DeviceId },

    /// Parameters have not been loaded or stored for the device yet.
    #[error("no parameters cached for device {device}")]
    NoParams { device: DeviceId },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
