//! Machine-status snapshot types.
//!
//! [`MachineStatus`] mirrors the controller's packed status record. Per-axis
//! conditions are kept as raw [`AxisFlags`]; the logical [`AxisState`] is
//! derived from them on demand and never stored.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_AXIS, MAX_FILES};

// ─── Axis identity ──────────────────────────────────────────────────

/// Physical axis. Discriminant is the array index in every per-axis field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; MAX_AXIS] = [Axis::X, Axis::Y, Axis::Z];

    /// Convert from an array index. Returns `None` for `index >= MAX_AXIS`.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            _ => None,
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Single-bit mask used by interpolation and pause/resume commands.
    #[inline]
    pub const fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
        };
        f.write_str(name)
    }
}

// ─── Raw status bits ────────────────────────────────────────────────

bitflags! {
    /// Per-axis condition bits reported by the controller.
    ///
    /// Several bits may be set at once. Unknown bits are retained so that a
    /// decoded snapshot re-encodes byte-for-byte. The default is
    /// [`AxisFlags::POWER_ON`].
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct AxisFlags: u32 {
        /// Axis executing a motion.
        const RUNNING            = 0x0001;
        /// Motion paused.
        const PAUSE              = 0x0002;
        /// Motion resumed after a pause.
        const RESUME             = 0x0004;
        /// Motion stopped.
        const STOP               = 0x0008;
        /// Negative limit switch active.
        const LIMIT_N            = 0x0010;
        /// Positive limit switch active.
        const LIMIT_P            = 0x0020;
        /// Homing completed.
        const HOME_DONE          = 0x0040;
        /// Homing in progress.
        const HOMING             = 0x0080;
        /// Script/program auto-run active.
        const AUTO_RUN           = 0x0100;
        /// Negative limit sensor not configured.
        const LIMIT_N_UNDEFINED  = 0x0200;
        /// Positive limit sensor not configured.
        const LIMIT_P_UNDEFINED  = 0x0400;
        /// Home sensor not configured.
        const HOME_UNDEFINED     = 0x0800;
        /// Homing exceeded its configured time.
        const HOME_TIMEOUT       = 0x1000;
    }
}

impl AxisFlags {
    /// Power-on state: no condition bit set.
    pub const POWER_ON: Self = Self::empty();

    /// Either limit sensor is reported as undefined.
    #[inline]
    pub const fn limits_undefined(&self) -> bool {
        self.intersects(Self::LIMIT_N_UNDEFINED.union(Self::LIMIT_P_UNDEFINED))
    }

    /// Bit pairs that the controller protocol declares mutually exclusive.
    pub fn conflicts(&self) -> Vec<FlagConflict> {
        const PAIRS: [(AxisFlags, AxisFlags, FlagConflict); 5] = [
            (AxisFlags::RUNNING, AxisFlags::STOP, FlagConflict::RunningAndStopped),
            (AxisFlags::PAUSE, AxisFlags::RESUME, FlagConflict::PausedAndResumed),
            (AxisFlags::HOMING, AxisFlags::HOME_DONE, FlagConflict::HomingAndHomeDone),
            (AxisFlags::LIMIT_N, AxisFlags::LIMIT_N_UNDEFINED, FlagConflict::LimitNWhileUndefined),
            (AxisFlags::LIMIT_P, AxisFlags::LIMIT_P_UNDEFINED, FlagConflict::LimitPWhileUndefined),
        ];
        PAIRS
            .iter()
            .filter(|(a, b, _)| self.contains(a.union(*b)))
            .map(|(_, _, c)| *c)
            .collect()
    }
}

/// Mutually exclusive bit combination observed in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagConflict {
    RunningAndStopped,
    PausedAndResumed,
    HomingAndHomeDone,
    LimitNWhileUndefined,
    LimitPWhileUndefined,
}

/// A protocol invariant violation found in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAnomaly {
    pub axis: Axis,
    pub conflict: FlagConflict,
}

// ─── Machine run mode ───────────────────────────────────────────────

/// Controller run mode (`machineRunStatus`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    /// Manual operation (jog, home, interpolation from the host).
    #[default]
    Manual,
    /// Automatic program execution.
    Auto,
    /// Value outside the documented set, preserved verbatim.
    Unknown(u32),
}

impl RunMode {
    pub const MANUAL_BITS: u32 = 0x0001;
    pub const AUTO_BITS: u32 = 0x0002;

    #[inline]
    pub const fn from_bits(value: u32) -> Self {
        match value {
            Self::MANUAL_BITS => Self::Manual,
            Self::AUTO_BITS => Self::Auto,
            other => Self::Unknown(other),
        }
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Manual => Self::MANUAL_BITS,
            Self::Auto => Self::AUTO_BITS,
            Self::Unknown(v) => v,
        }
    }
}

// ─── Derived axis state ─────────────────────────────────────────────

/// Which limit switch triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitSide {
    Negative,
    Positive,
}

/// Logical axis state derived from [`AxisFlags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
    Homing,
    HomeDone,
    LimitTriggered(LimitSide),
    HomeTimeout,
}

impl AxisState {
    /// Axis is executing motion that blocks new motion commands.
    #[inline]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Running | Self::Homing)
    }
}

// ─── Snapshot ───────────────────────────────────────────────────────

/// Resident file table: at most [`MAX_FILES`] names.
pub type FileTable = heapless::Vec<String, MAX_FILES>;

/// One decoded machine-status snapshot.
///
/// Replaced wholesale on every poll; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineStatus {
    /// Measured position per axis.
    pub real_pos: [f32; MAX_AXIS],
    /// Measured speed per axis.
    pub real_speed: [f32; MAX_AXIS],
    /// Digital input bitmask.
    pub input_status: u32,
    /// Digital output bitmask.
    pub output_status: u32,
    /// Negative limit switch bitmask (one bit per axis).
    pub limit_n_status: u32,
    /// Positive limit switch bitmask (one bit per axis).
    pub limit_p_status: u32,
    /// Controller run mode.
    pub run_mode: RunMode,
    /// Raw condition bits per axis.
    pub axis_status: [AxisFlags; MAX_AXIS],
    /// Per-axis homing completion bitmask.
    pub home_status: u32,
    /// Names in the controller's file table, in slot order.
    pub files: FileTable,
}

impl MachineStatus {
    #[inline]
    pub fn axis_flags(&self, axis: Axis) -> AxisFlags {
        self.axis_status[axis.index()]
    }

    /// Whether `name` is present in the resident file table.
    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f == name)
    }

    /// Whether the controller reports homing complete for `axis`.
    #[inline]
    pub fn is_homed(&self, axis: Axis) -> bool {
        self.home_status & (1 << axis.index()) != 0
    }

    /// All mutually exclusive flag combinations present in this snapshot.
    pub fn anomalies(&self) -> Vec<StatusAnomaly> {
        Axis::ALL
            .iter()
            .flat_map(|&axis| {
                self.axis_flags(axis)
                    .conflicts()
                    .into_iter()
                    .map(move |conflict| StatusAnomaly { axis, conflict })
            })
            .collect()
    }
}

/// Firmware/library identifiers. Opaque, read-only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub firmware: u32,
    pub lib: u32,
    pub serial_number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_defaults() {
        assert_eq!(AxisFlags::default(), AxisFlags::POWER_ON);
        assert_eq!(RunMode::default(), RunMode::Manual);
        assert_eq!(AxisState::default(), AxisState::Idle);
        let status = MachineStatus::default();
        assert_eq!(status.run_mode.bits(), RunMode::MANUAL_BITS);
    }

    #[test]
    fn axis_index_roundtrip() {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(Axis::from_index(i), Some(*axis));
            assert_eq!(axis.index(), i);
        }
        assert!(Axis::from_index(3).is_none());
        assert_eq!(Axis::Z.mask(), 0x04);
    }

    #[test]
    fn flag_bits_match_controller() {
        assert_eq!(AxisFlags::POWER_ON.bits(), 0x0000);
        assert_eq!(AxisFlags::AUTO_RUN.bits(), 0x0100);
        assert_eq!(AxisFlags::HOME_TIMEOUT.bits(), 0x1000);
    }

    #[test]
    fn unknown_bits_are_retained() {
        let flags = AxisFlags::from_bits_retain(0x8001);
        assert!(flags.contains(AxisFlags::RUNNING));
        assert_eq!(flags.bits(), 0x8001);
    }

    #[test]
    fn conflicts_detected() {
        let flags = AxisFlags::RUNNING | AxisFlags::STOP | AxisFlags::LIMIT_P | AxisFlags::LIMIT_P_UNDEFINED;
        assert_eq!(
            flags.conflicts(),
            vec![FlagConflict::RunningAndStopped, FlagConflict::LimitPWhileUndefined]
        );
        assert!((AxisFlags::RUNNING | AxisFlags::RESUME).conflicts().is_empty());
    }

    #[test]
    fn run_mode_preserves_unknown() {
        assert_eq!(RunMode::from_bits(1), RunMode::Manual);
        assert_eq!(RunMode::from_bits(2), RunMode::Auto);
        assert_eq!(RunMode::from_bits(7), RunMode::Unknown(7));
        assert_eq!(RunMode::Unknown(7).bits(), 7);
    }

    #[test]
    fn snapshot_anomalies_carry_axis() {
        let mut status = MachineStatus::default();
        status.axis_status[2] = AxisFlags::PAUSE | AxisFlags::RESUME;
        assert_eq!(
            status.anomalies(),
            vec![StatusAnomaly {
                axis: Axis::Z,
                conflict: FlagConflict::PausedAndResumed,
            }]
        );
    }

    #[test]
    fn home_status_bits() {
        let status = MachineStatus {
            home_status: 0b101,
            ..Default::default()
        };
        assert!(status.is_homed(Axis::X));
        assert!(!status.is_homed(Axis::Y));
        assert!(status.is_homed(Axis::Z));
    }
}
