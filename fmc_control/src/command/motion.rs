//! Motion command variants and their frame encoding.
//!
//! | Opcode | Command   | Payload after opcode + mask                          |
//! |--------|-----------|------------------------------------------------------|
//! | 0x01   | Jog       | pos, speed, acc, dec (f32), mode (u8)                |
//! | 0x02   | Home      | speed, acc_dec, fall_step (f32), dir (u8)            |
//! | 0x03   | Stop      | mode (u8)                                            |
//! | 0x04   | Line2Axis | end[2], speed, acc, dec (f32)                        |
//! | 0x05   | Line3Axis | end[3], speed, acc, dec (f32)                        |
//! | 0x06   | Arc2Axis  | end[2], center[2], radius, speed, acc, dec, dir (u8) |
//! | 0x07   | Pause     | none                                                 |
//! | 0x08   | Resume    | none                                                 |
//! | 0x09   | StopAll   | none, mask is always 0x07                            |

use fmc_common::status::Axis;
use serde::{Deserialize, Serialize};

use super::FrameWriter;
use super::selection::AxisSelection;

// ─── Mode and direction codes ───────────────────────────────────────

/// Jog target interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JogMode {
    /// Target is a distance from the current position.
    Relative = 1,
    /// Target is an absolute position.
    Absolute = 2,
}

impl JogMode {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Relative),
            2 => Some(Self::Absolute),
            _ => None,
        }
    }
}

/// How an axis comes to rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StopMode {
    /// Ramp down with the configured deceleration.
    Decelerate = 1,
    /// Stop pulse output immediately.
    Immediate = 2,
}

impl StopMode {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Decelerate),
            2 => Some(Self::Immediate),
            _ => None,
        }
    }
}

/// Limit switch the axis homes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HomeDirection {
    Positive = 1,
    Negative = 2,
}

impl HomeDirection {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Positive),
            2 => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Arc traversal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ArcDirection {
    Clockwise = 1,
    CounterClockwise = 2,
}

impl ArcDirection {
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            1 => Some(Self::Clockwise),
            2 => Some(Self::CounterClockwise),
            _ => None,
        }
    }
}

// ─── Parameters ─────────────────────────────────────────────────────

/// Point-to-point jog.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JogParams {
    pub target: f32,
    pub speed: f32,
    pub acc: f32,
    pub dec: f32,
    pub mode: JogMode,
}

/// Homing against a limit switch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeParams {
    pub speed: f32,
    pub acc_dec: f32,
    /// Back-off distance after the switch triggers.
    pub fall_step: f32,
    pub dir: HomeDirection,
}

/// Linear interpolation over `N` axes. `speed` is the resultant path speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams<const N: usize> {
    pub end: [f32; N],
    pub speed: f32,
    pub acc: f32,
    pub dec: f32,
}

/// Circular interpolation in a plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcParams {
    pub end: [f32; 2],
    pub center: [f32; 2],
    pub radius: f32,
    pub speed: f32,
    pub acc: f32,
    pub dec: f32,
    pub dir: ArcDirection,
}

// ─── Command ────────────────────────────────────────────────────────

/// A validated motion command, ready to encode and submit.
///
/// Construct through [`MotionCommandBuilder`](super::MotionCommandBuilder);
/// variants carry already-checked parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionCommand {
    Jog {
        axes: AxisSelection,
        params: JogParams,
    },
    Home {
        axis: Axis,
        params: HomeParams,
    },
    Stop {
        axis: Axis,
        mode: StopMode,
    },
    Line2Axis {
        axes: AxisSelection,
        params: LineParams<2>,
    },
    Line3Axis {
        params: LineParams<3>,
    },
    Arc2Axis {
        axes: AxisSelection,
        params: ArcParams,
    },
    Pause {
        axes: AxisSelection,
    },
    Resume {
        axes: AxisSelection,
    },
    StopAll,
}

impl MotionCommand {
    pub const OP_JOG: u8 = 0x01;
    pub const OP_HOME: u8 = 0x02;
    pub const OP_STOP: u8 = 0x03;
    pub const OP_LINE_2AXIS: u8 = 0x04;
    pub const OP_LINE_3AXIS: u8 = 0x05;
    pub const OP_ARC_2AXIS: u8 = 0x06;
    pub const OP_PAUSE: u8 = 0x07;
    pub const OP_RESUME: u8 = 0x08;
    pub const OP_STOP_ALL: u8 = 0x09;

    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Jog { .. } => Self::OP_JOG,
            Self::Home { .. } => Self::OP_HOME,
            Self::Stop { .. } => Self::OP_STOP,
            Self::Line2Axis { .. } => Self::OP_LINE_2AXIS,
            Self::Line3Axis { .. } => Self::OP_LINE_3AXIS,
            Self::Arc2Axis { .. } => Self::OP_ARC_2AXIS,
            Self::Pause { .. } => Self::OP_PAUSE,
            Self::Resume { .. } => Self::OP_RESUME,
            Self::StopAll => Self::OP_STOP_ALL,
        }
    }

    /// Axes the command addresses.
    pub const fn selection(&self) -> AxisSelection {
        match *self {
            Self::Jog { axes, .. }
            | Self::Line2Axis { axes, .. }
            | Self::Arc2Axis { axes, .. }
            | Self::Pause { axes }
            | Self::Resume { axes } => axes,
            Self::Home { axis, .. } | Self::Stop { axis, .. } => match axis {
                Axis::X => AxisSelection::X,
                Axis::Y => AxisSelection::Y,
                Axis::Z => AxisSelection::Z,
            },
            Self::Line3Axis { .. } | Self::StopAll => AxisSelection::XYZ,
        }
    }

    /// Short name used in logs and error messages.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Jog { .. } => "jog",
            Self::Home { .. } => "home",
            Self::Stop { .. } => "stop",
            Self::Line2Axis { .. } => "line_2axis",
            Self::Line3Axis { .. } => "line_3axis",
            Self::Arc2Axis { .. } => "arc_2axis",
            Self::Pause { .. } => "pause",
            Self::Resume { .. } => "resume",
            Self::StopAll => "stop_all",
        }
    }

    /// Encode into a command frame.
    pub fn encode(&self) -> Vec<u8> {
        let w = FrameWriter::new(self.opcode(), self.selection().mask());
        let w = match self {
            Self::Jog { params: p, .. } => w
                .f32s(&[p.target, p.speed, p.acc, p.dec])
                .u8(p.mode as u8),
            Self::Home { params: p, .. } => w
                .f32s(&[p.speed, p.acc_dec, p.fall_step])
                .u8(p.dir as u8),
            Self::Stop { mode, .. } => w.u8(*mode as u8),
            Self::Line2Axis { params: p, .. } => w.f32s(&p.end).f32s(&[p.speed, p.acc, p.dec]),
            Self::Line3Axis { params: p } => w.f32s(&p.end).f32s(&[p.speed, p.acc, p.dec]),
            Self::Arc2Axis { params: p, .. } => w
                .f32s(&p.end)
                .f32s(&p.center)
                .f32(p.radius)
                .f32s(&[p.speed, p.acc, p.dec])
                .u8(p.dir as u8),
            Self::Pause { .. } | Self::Resume { .. } | Self::StopAll => w,
        };
        w.finish()
    }
}
