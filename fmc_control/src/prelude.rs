//! Common re-exports: `use fmc_control::prelude::*;`.

pub use fmc_common::prelude::*;

pub use crate::command::{
    ArcDirection, ArcParams, AxisSelection, CommandLimits, HomeDirection, HomeParams, JogMode,
    JogParams, LineParams, MotionCommand, MotionCommandBuilder, StopMode,
};
pub use crate::config::{BusConfig, ControlConfig};
pub use crate::error::Error;
pub use crate::files::{FileKind, ScriptCommand};
pub use crate::io::{IoCommand, OutputLevel};
pub use crate::session::DeviceSession;
pub use crate::state::{AxisStateMachine, derive_state, is_axis_stopped};
pub use crate::subbus::{BusRequest, BusResponse, CoilConvention, RawBusFrame, SubBusFrame};
pub use crate::transport::sim::SimTransport;
pub use crate::transport::{DeviceId, Transport};
