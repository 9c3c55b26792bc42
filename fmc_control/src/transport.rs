//! Link to the controller.
//!
//! The protocol core never opens sockets or serial ports. A [`Transport`]
//! moves already-encoded frames and records; [`sim::SimTransport`] is an
//! in-memory implementation for development and tests.

pub mod sim;

use std::path::Path;

use fmc_common::error::TransportError;

use crate::files::FileKind;

/// Controller identifier, matching `DeviceParams::id`.
pub type DeviceId = u32;

/// Interface for pluggable controller links (Ethernet, RS-232, simulation).
///
/// Implementations own their connections and perform the blocking I/O. No
/// method retries; a failure is reported once and the caller decides.
/// Negative controller return codes surface as [`TransportError::Nak`].
pub trait Transport: Send {
    /// Short identifier for logs, e.g. `"sim"`.
    fn name(&self) -> &'static str;

    /// Deliver one command frame.
    fn send(&mut self, device: DeviceId, frame: &[u8]) -> Result<(), TransportError>;

    /// Fetch the raw machine-status record.
    fn poll(&mut self, device: DeviceId) -> Result<Vec<u8>, TransportError>;

    /// Fetch the raw device-parameter record.
    fn get_params(&mut self, device: DeviceId) -> Result<Vec<u8>, TransportError>;

    /// Store a raw device-parameter record.
    fn set_params(&mut self, device: DeviceId, record: &[u8]) -> Result<(), TransportError>;

    /// Transfer a local file into the controller's file table.
    fn upload_file(
        &mut self,
        device: DeviceId,
        path: &Path,
        kind: FileKind,
    ) -> Result<(), TransportError>;

    /// Fetch the raw version record.
    fn get_version(&mut self, device: DeviceId) -> Result<Vec<u8>, TransportError>;

    /// Exchange one request/response on the controller's RS-485 sub-bus.
    fn bus_transfer(&mut self, device: DeviceId, request: &[u8]) -> Result<Vec<u8>, TransportError>;
}
