//! Axis state derivation and command gating.
//!
//! The controller drives every transition; this layer only reads the
//! reported [`AxisFlags`] and decides whether a requested command is legal.
//!
//! Derivation priority (first match wins):
//!
//! | Bits                 | State                        |
//! |----------------------|------------------------------|
//! | HOME_TIMEOUT         | `HomeTimeout`                |
//! | HOMING               | `Homing`                     |
//! | PAUSE                | `Paused`                     |
//! | RUNNING or RESUME    | `Running`                    |
//! | LIMIT_N              | `LimitTriggered(Negative)`   |
//! | LIMIT_P              | `LimitTriggered(Positive)`   |
//! | STOP                 | `Stopped`                    |
//! | HOME_DONE            | `HomeDone`                   |
//! | none of the above    | `Idle`                       |
//!
//! Each axis cycles independently:
//! Idle → (Homing → HomeDone | HomeTimeout) / (Running → Paused ⇄ Running → Stopped → Idle).

use fmc_common::error::CommandError;
use fmc_common::status::{Axis, AxisFlags, AxisState, LimitSide, MachineStatus, RunMode};

use crate::command::AxisSelection;

/// Derive the logical state of one axis from its raw bits.
pub const fn derive_state(flags: AxisFlags) -> AxisState {
    if flags.contains(AxisFlags::HOME_TIMEOUT) {
        AxisState::HomeTimeout
    } else if flags.contains(AxisFlags::HOMING) {
        AxisState::Homing
    } else if flags.contains(AxisFlags::PAUSE) {
        AxisState::Paused
    } else if flags.intersects(AxisFlags::RUNNING.union(AxisFlags::RESUME)) {
        AxisState::Running
    } else if flags.contains(AxisFlags::LIMIT_N) {
        AxisState::LimitTriggered(LimitSide::Negative)
    } else if flags.contains(AxisFlags::LIMIT_P) {
        AxisState::LimitTriggered(LimitSide::Positive)
    } else if flags.contains(AxisFlags::STOP) {
        AxisState::Stopped
    } else if flags.contains(AxisFlags::HOME_DONE) {
        AxisState::HomeDone
    } else {
        AxisState::Idle
    }
}

/// Read-only view over one snapshot that validates command intent.
///
/// Holds no state of its own; build one per decision.
#[derive(Debug, Clone, Copy)]
pub struct AxisStateMachine<'a> {
    status: &'a MachineStatus,
}

impl<'a> AxisStateMachine<'a> {
    pub const fn new(status: &'a MachineStatus) -> Self {
        Self { status }
    }

    #[inline]
    pub fn state(&self, axis: Axis) -> AxisState {
        derive_state(self.status.axis_flags(axis))
    }

    /// Derived state of every axis, index = axis.
    pub fn states(&self) -> [AxisState; 3] {
        Axis::ALL.map(|axis| self.state(axis))
    }

    /// Axis is not running, paused or homing.
    pub fn is_axis_stopped(&self, axis: Axis) -> bool {
        !matches!(
            self.state(axis),
            AxisState::Running | AxisState::Paused | AxisState::Homing
        )
    }

    /// A script or program is executing on any axis.
    pub fn is_script_running(&self) -> bool {
        Axis::ALL
            .iter()
            .any(|&axis| self.status.axis_flags(axis).contains(AxisFlags::AUTO_RUN))
    }

    /// Jog and interpolation: every target axis must be free of motion.
    pub fn check_motion(&self, axes: AxisSelection) -> Result<(), CommandError> {
        for axis in axes.axes() {
            let state = self.state(axis);
            if state.is_busy() {
                return Err(CommandError::AxisBusy { axis, state });
            }
        }
        Ok(())
    }

    /// Homing: axis must be free and both limit sensors defined.
    pub fn check_home(&self, axis: Axis) -> Result<(), CommandError> {
        let state = self.state(axis);
        if state.is_busy() {
            return Err(CommandError::AxisBusy { axis, state });
        }
        if self.status.axis_flags(axis).limits_undefined() {
            return Err(CommandError::HomeRequiresLimits { axis });
        }
        Ok(())
    }

    /// Pause: every selected axis must be running.
    pub fn check_pause(&self, axes: AxisSelection) -> Result<(), CommandError> {
        self.require_all(axes, AxisState::Running, "pause")
    }

    /// Resume: every selected axis must be paused.
    pub fn check_resume(&self, axes: AxisSelection) -> Result<(), CommandError> {
        self.require_all(axes, AxisState::Paused, "resume")
    }

    /// Script start: no manual motion in progress and no script already running.
    pub fn check_auto_run(&self) -> Result<(), CommandError> {
        if self.is_script_running() {
            return Err(CommandError::ModeConflict("a script is already running"));
        }
        if self.status.run_mode == RunMode::Manual
            && Axis::ALL.iter().any(|&axis| self.state(axis).is_busy())
        {
            return Err(CommandError::ModeConflict(
                "manual motion in progress",
            ));
        }
        Ok(())
    }

    fn require_all(
        &self,
        axes: AxisSelection,
        required: AxisState,
        command: &'static str,
    ) -> Result<(), CommandError> {
        for axis in axes.axes() {
            let state = self.state(axis);
            if state != required {
                return Err(CommandError::InvalidStateTransition {
                    axis,
                    state,
                    command,
                });
            }
        }
        Ok(())
    }
}

/// Derived state of `axis` in `status`.
pub fn axis_state(status: &MachineStatus, axis: Axis) -> AxisState {
    AxisStateMachine::new(status).state(axis)
}

/// Whether `axis` is at rest (not running, paused or homing).
pub fn is_axis_stopped(status: &MachineStatus, axis: Axis) -> bool {
    AxisStateMachine::new(status).is_axis_stopped(axis)
}
