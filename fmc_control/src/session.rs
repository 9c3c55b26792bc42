//! Per-device snapshot cache and command submission.
//!
//! A [`DeviceSession`] owns one [`Transport`] and remembers, per device id,
//! the last decoded [`MachineStatus`] and [`DeviceParams`]. Cache entries
//! are replaced wholesale and only after a successful transfer and decode;
//! a failure anywhere leaves the previous entry untouched.
//!
//! Commands are built against the cached snapshot, so poll first. The
//! session never assumes a command took effect: the next poll tells.
//!
//! Operations take `&mut self`. Share a session across threads behind a
//! `Mutex` to keep one command pipeline per device.

use std::collections::HashMap;
use std::path::Path;

use fmc_common::config::ConfigError;
use fmc_common::codec::{decode_params, decode_status, decode_version, encode_params};
use fmc_common::params::DeviceParams;
use fmc_common::status::{Axis, MachineStatus, VersionInfo};
use tracing::{debug, info, warn};

use crate::command::{
    ArcParams, AxisSelection, HomeParams, JogParams, LineParams, MotionCommand,
    MotionCommandBuilder, StopMode,
};
use crate::config::ControlConfig;
use crate::error::{Error, Result};
use crate::files::{self, FileKind};
use crate::io::{self, OutputLevel};
use crate::subbus::{BusResponse, CoilConvention, RawBusFrame, SubBusFrame};
use crate::transport::{DeviceId, Transport};

#[derive(Debug, Clone, Default)]
struct DeviceCache {
    status: Option<MachineStatus>,
    params: Option<DeviceParams>,
}

/// Command pipeline and snapshot cache over one transport.
#[derive(Debug)]
pub struct DeviceSession<T: Transport> {
    transport: T,
    builder: MotionCommandBuilder,
    coil_convention: CoilConvention,
    cache: HashMap<DeviceId, DeviceCache>,
}

impl<T: Transport> DeviceSession<T> {
    /// Session enforcing the limits in `config`.
    ///
    /// # Errors
    ///
    /// Any error from [`ControlConfig::validate`].
    pub fn new(transport: T, config: &ControlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            transport,
            builder: MotionCommandBuilder::new(config.command)?,
            coil_convention: config.bus.coil_convention,
            cache: HashMap::new(),
        })
    }

    /// Session with default limits and the lenient coil convention.
    pub fn with_defaults(transport: T) -> Self {
        Self {
            transport,
            builder: MotionCommandBuilder::default(),
            coil_convention: CoilConvention::default(),
            cache: HashMap::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    pub fn coil_convention(&self) -> CoilConvention {
        self.coil_convention
    }

    // ─── Status and parameters ──────────────────────────────────────

    /// Poll, decode and cache a fresh snapshot.
    pub fn poll_status(&mut self, device: DeviceId) -> Result<&MachineStatus> {
        let link = self.transport.name();
        let record = self.transport.poll(device).map_err(|e| {
            warn!(device, link, error = %e, "status poll failed");
            e
        })?;
        let status = decode_status(&record).map_err(|e| {
            warn!(device, link, error = %e, "status record rejected");
            e
        })?;

        for anomaly in status.anomalies() {
            warn!(
                device,
                axis = %anomaly.axis,
                conflict = ?anomaly.conflict,
                "contradictory axis status bits"
            );
        }

        let entry = self.cache.entry(device).or_default();
        Ok(entry.status.insert(status))
    }

    /// Last cached snapshot.
    pub fn status(&self, device: DeviceId) -> Result<&MachineStatus> {
        self.cache
            .get(&device)
            .and_then(|c| c.status.as_ref())
            .ok_or(Error::NoSnapshot { device })
    }

    /// Last cached parameters.
    pub fn params(&self, device: DeviceId) -> Result<&DeviceParams> {
        self.cache
            .get(&device)
            .and_then(|c| c.params.as_ref())
            .ok_or(Error::NoParams { device })
    }

    /// Read, decode and cache the parameter record.
    pub fn load_params(&mut self, device: DeviceId) -> Result<&DeviceParams> {
        let record = self.transport.get_params(device)?;
        let params = decode_params(&record)?;
        let entry = self.cache.entry(device).or_default();
        Ok(entry.params.insert(params))
    }

    /// Validate, encode and store a parameter record.
    ///
    /// The cache is updated only after the transport acknowledges, and holds
    /// the record as the device will report it (all axes present).
    pub fn store_params(&mut self, device: DeviceId, params: DeviceParams) -> Result<()> {
        let record = encode_params(&params)?;
        let stored = decode_params(&record)?;
        let link = self.transport.name();
        self.transport.set_params(device, &record).map_err(|e| {
            warn!(device, link, error = %e, "parameter write failed");
            e
        })?;
        info!(device, id = params.id, "device parameters written");
        self.cache.entry(device).or_default().params = Some(stored);
        Ok(())
    }

    pub fn version(&mut self, device: DeviceId) -> Result<VersionInfo> {
        let record = self.transport.get_version(device)?;
        Ok(decode_version(&record)?)
    }

    /// Drop everything cached for `device`. Returns whether anything was cached.
    pub fn forget(&mut self, device: DeviceId) -> bool {
        self.cache.remove(&device).is_some()
    }

    // ─── Motion ─────────────────────────────────────────────────────

    pub fn jog(&mut self, device: DeviceId, axes: AxisSelection, params: JogParams) -> Result<()> {
        let cmd = self.builder.jog(self.status(device)?, axes, params)?;
        self.submit(device, &cmd)
    }

    pub fn home(&mut self, device: DeviceId, axis: Axis, params: HomeParams) -> Result<()> {
        let cmd = self.builder.home(self.status(device)?, axis, params)?;
        self.submit(device, &cmd)
    }

    pub fn line_2axis(
        &mut self,
        device: DeviceId,
        axes: AxisSelection,
        params: LineParams<2>,
    ) -> Result<()> {
        let cmd = self.builder.line_2axis(self.status(device)?, axes, params)?;
        self.submit(device, &cmd)
    }

    pub fn line_3axis(
        &mut self,
        device: DeviceId,
        axes: AxisSelection,
        params: LineParams<3>,
    ) -> Result<()> {
        let cmd = self.builder.line_3axis(self.status(device)?, axes, params)?;
        self.submit(device, &cmd)
    }

    pub fn arc_2axis(
        &mut self,
        device: DeviceId,
        axes: AxisSelection,
        params: ArcParams,
    ) -> Result<()> {
        let cmd = self.builder.arc_2axis(self.status(device)?, axes, params)?;
        self.submit(device, &cmd)
    }

    pub fn pause(&mut self, device: DeviceId, axes: AxisSelection) -> Result<()> {
        let cmd = self.builder.pause(self.status(device)?, axes)?;
        self.submit(device, &cmd)
    }

    pub fn resume(&mut self, device: DeviceId, axes: AxisSelection) -> Result<()> {
        let cmd = self.builder.resume(self.status(device)?, axes)?;
        self.submit(device, &cmd)
    }

    /// Stop one axis. Needs no snapshot.
    pub fn stop_axis(&mut self, device: DeviceId, axis: Axis, mode: StopMode) -> Result<()> {
        let cmd = self.builder.stop(axis, mode);
        self.submit(device, &cmd)
    }

    /// Stop all motion. Needs no snapshot.
    pub fn stop_all(&mut self, device: DeviceId) -> Result<()> {
        let cmd = self.builder.stop_all();
        self.submit(device, &cmd)
    }

    fn submit(&mut self, device: DeviceId, cmd: &MotionCommand) -> Result<()> {
        debug!(device, command = cmd.name(), axes = %cmd.selection(), "submitting");
        self.send_frame(device, &cmd.encode(), cmd.name())
    }

    fn send_frame(&mut self, device: DeviceId, frame: &[u8], what: &'static str) -> Result<()> {
        let link = self.transport.name();
        self.transport.send(device, frame).map_err(|e| {
            warn!(device, link, command = what, error = %e, "command not delivered");
            e.into()
        })
    }

    // ─── I/O and files ──────────────────────────────────────────────

    pub fn set_output(&mut self, device: DeviceId, line: u8, level: OutputLevel) -> Result<()> {
        let cmd = io::set_output(line, level)?;
        debug!(device, line, level = ?level, "set output");
        self.send_frame(device, &cmd.encode(), "set_output")
    }

    pub fn start_auto_run(&mut self, device: DeviceId, name: &str) -> Result<()> {
        let cmd = files::start_auto_run(self.status(device)?, name)?;
        debug!(device, file = name, "start auto-run");
        self.send_frame(device, &cmd.encode(), "start_auto_run")
    }

    /// Stop a running script. Needs no snapshot.
    pub fn stop_auto_run(&mut self, device: DeviceId) -> Result<()> {
        self.send_frame(device, &files::stop_auto_run().encode(), "stop_auto_run")
    }

    pub fn delete_script(&mut self, device: DeviceId, name: &str) -> Result<()> {
        let cmd = files::delete_script(self.status(device)?, name)?;
        debug!(device, file = name, "delete script");
        self.send_frame(device, &cmd.encode(), "delete_script")
    }

    /// Validate and upload a file. The new name appears in the next poll.
    pub fn upload_file(&mut self, device: DeviceId, path: &Path, kind: FileKind) -> Result<()> {
        let upload = files::upload(path, kind)?;
        let link = self.transport.name();
        info!(device, link, file = %upload.name, kind = %upload.kind, "uploading file");
        self.transport
            .upload_file(device, upload.path, upload.kind)
            .map_err(|e| {
                warn!(device, link, error = %e, "upload failed");
                e.into()
            })
    }

    // ─── Sub-bus ────────────────────────────────────────────────────

    /// Exchange one register/coil request with an extension device.
    pub fn bus_request(&mut self, device: DeviceId, frame: &SubBusFrame) -> Result<BusResponse> {
        let reply = self.transport.bus_transfer(device, &frame.encode())?;
        frame.decode_response(&reply).map_err(|e| {
            warn!(device, slave = frame.slave_id(), error = %e, "sub-bus reply rejected");
            e.into()
        })
    }

    /// Raw RS-485 passthrough; the reply is returned unchecked.
    pub fn bus_raw(&mut self, device: DeviceId, frame: &RawBusFrame) -> Result<Vec<u8>> {
        Ok(self.transport.bus_transfer(device, frame.as_bytes())?)
    }
}
