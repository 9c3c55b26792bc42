//! In-memory controller simulation.
//!
//! `SimTransport` keeps one record set per device and logs every frame it
//! receives. It does not execute motion: tests set the status they want the
//! next poll to return. Uploads are reflected in the simulated file table
//! so that start/delete can be exercised end to end.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use fmc_common::codec::{decode_status, encode_params, encode_status, encode_version};
use fmc_common::error::{DecodeError, TransportError, ValidationError};
use fmc_common::params::DeviceParams;
use fmc_common::status::{MachineStatus, VersionInfo};
use tracing::{debug, trace};

use super::{DeviceId, Transport};
use crate::files::FileKind;

/// Records held for one simulated controller.
#[derive(Debug, Clone, Default)]
pub struct SimDevice {
    /// Raw status record returned by `poll`.
    pub status: Vec<u8>,
    /// Raw parameter record returned by `get_params`.
    pub params: Vec<u8>,
    /// Raw version record returned by `get_version`.
    pub version: Vec<u8>,
    /// Every command frame received, in order.
    pub sent: Vec<Vec<u8>>,
    /// Every upload received, in order.
    pub uploads: Vec<(PathBuf, FileKind)>,
    /// Every sub-bus request received, in order.
    pub bus_requests: Vec<Vec<u8>>,
    /// Replies handed out to sub-bus requests, front first.
    pub bus_replies: VecDeque<Vec<u8>>,
}

/// Simulated transport implementing [`Transport`].
#[derive(Debug, Default)]
pub struct SimTransport {
    devices: HashMap<DeviceId, SimDevice>,
    fail_next: Option<TransportError>,
}

impl SimTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device with an initial status snapshot.
    pub fn add_device(&mut self, device: DeviceId, status: &MachineStatus) -> Result<(), DecodeError> {
        let record = encode_status(status)?;
        let params = DeviceParams {
            id: device,
            ..Default::default()
        };
        let entry = self.devices.entry(device).or_default();
        entry.status = record;
        entry.params = encode_params(&params).map_err(validation_to_decode)?;
        entry.version = encode_version(&VersionInfo::default());
        debug!(device, "simulated device added");
        Ok(())
    }

    /// Replace the status the next poll returns.
    pub fn set_status(&mut self, device: DeviceId, status: &MachineStatus) -> Result<(), DecodeError> {
        let record = encode_status(status)?;
        self.devices.entry(device).or_default().status = record;
        Ok(())
    }

    /// Replace the status record with arbitrary bytes (malformed input tests).
    pub fn set_status_bytes(&mut self, device: DeviceId, record: Vec<u8>) {
        self.devices.entry(device).or_default().status = record;
    }

    pub fn set_version(&mut self, device: DeviceId, version: &VersionInfo) {
        self.devices.entry(device).or_default().version = encode_version(version);
    }

    /// Queue the reply to the next sub-bus request.
    pub fn queue_bus_reply(&mut self, device: DeviceId, reply: Vec<u8>) {
        self.devices.entry(device).or_default().bus_replies.push_back(reply);
    }

    /// Make the next transport call fail with `error`, whatever it is.
    pub fn fail_next(&mut self, error: TransportError) {
        self.fail_next = Some(error);
    }

    pub fn device(&self, device: DeviceId) -> Option<&SimDevice> {
        self.devices.get(&device)
    }

    /// Frames received by `device`, empty if unknown.
    pub fn sent(&self, device: DeviceId) -> &[Vec<u8>] {
        self.devices
            .get(&device)
            .map(|d| d.sent.as_slice())
            .unwrap_or_default()
    }

    fn device_mut(&mut self, device: DeviceId) -> Result<&mut SimDevice, TransportError> {
        if let Some(error) = self.fail_next.take() {
            trace!(device, %error, "injected failure");
            return Err(error);
        }
        self.devices
            .get_mut(&device)
            .ok_or_else(|| TransportError::ConnectionLost(format!("device {device} not connected")))
    }
}

fn validation_to_decode(e: ValidationError) -> DecodeError {
    DecodeError::UnexpectedResponse(e.to_string())
}

impl Transport for SimTransport {
    fn name(&self) -> &'static str {
        "sim"
    }

    fn send(&mut self, device: DeviceId, frame: &[u8]) -> Result<(), TransportError> {
        let dev = self.device_mut(device)?;
        dev.sent.push(frame.to_vec());
        Ok(())
    }

    fn poll(&mut self, device: DeviceId) -> Result<Vec<u8>, TransportError> {
        Ok(self.device_mut(device)?.status.clone())
    }

    fn get_params(&mut self, device: DeviceId) -> Result<Vec<u8>, TransportError> {
        Ok(self.device_mut(device)?.params.clone())
    }

    fn set_params(&mut self, device: DeviceId, record: &[u8]) -> Result<(), TransportError> {
        self.device_mut(device)?.params = record.to_vec();
        Ok(())
    }

    fn upload_file(
        &mut self,
        device: DeviceId,
        path: &Path,
        kind: FileKind,
    ) -> Result<(), TransportError> {
        let dev = self.device_mut(device)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| TransportError::Other(format!("no file name in {}", path.display())))?;

        let mut status =
            decode_status(&dev.status).map_err(|e| TransportError::Other(e.to_string()))?;
        if !status.has_file(name) {
            // Controller returns -6 when the file table is full.
            status
                .files
                .push(name.to_string())
                .map_err(|_| TransportError::Nak { code: -6 })?;
        }
        dev.status = encode_status(&status).map_err(|e| TransportError::Other(e.to_string()))?;
        dev.uploads.push((path.to_path_buf(), kind));
        Ok(())
    }

    fn get_version(&mut self, device: DeviceId) -> Result<Vec<u8>, TransportError> {
        Ok(self.device_mut(device)?.version.clone())
    }

    fn bus_transfer(&mut self, device: DeviceId, request: &[u8]) -> Result<Vec<u8>, TransportError> {
        let dev = self.device_mut(device)?;
        dev.bus_requests.push(request.to_vec());
        dev.bus_replies.pop_front().ok_or(TransportError::Timeout)
    }
}
