//! Parameter validation and state gating for motion commands.
//!
//! Builders are pure: they read a snapshot and return a command or an error.
//! Submission is the session's job.

use fmc_common::config::ConfigError;
use fmc_common::consts::DEFAULT_ARC_TOLERANCE;
use fmc_common::error::CommandError;
use fmc_common::status::{Axis, MachineStatus};
use serde::{Deserialize, Serialize};

use super::motion::{ArcParams, HomeParams, JogParams, LineParams, MotionCommand, StopMode};
use super::selection::AxisSelection;
use crate::state::AxisStateMachine;

/// Tunable acceptance limits for motion commands (`[command]` table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandLimits {
    /// Relative tolerance on `| |end - center| - radius |` for arcs.
    pub arc_radius_tolerance: f64,
    /// Accept jog commands addressing more than one axis.
    pub allow_multi_axis_jog: bool,
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            arc_radius_tolerance: DEFAULT_ARC_TOLERANCE,
            allow_multi_axis_jog: false,
        }
    }
}

impl CommandLimits {
    /// # Errors
    ///
    /// `ConfigError::ValidationError` unless the arc tolerance is a positive
    /// finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tol = self.arc_radius_tolerance;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "command.arc_radius_tolerance must be positive and finite, got {tol}"
            )));
        }
        Ok(())
    }
}

// ─── Value checks ───────────────────────────────────────────────────

fn finite(name: &'static str, v: f32) -> Result<(), CommandError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(CommandError::invalid(name, format!("{v} is not finite")))
    }
}

fn non_negative(name: &'static str, v: f32) -> Result<(), CommandError> {
    finite(name, v)?;
    if v < 0.0 {
        return Err(CommandError::invalid(name, format!("{v} is negative")));
    }
    Ok(())
}

fn profile(speed: f32, acc: f32, dec: f32) -> Result<(), CommandError> {
    non_negative("speed", speed)?;
    non_negative("acc", acc)?;
    non_negative("dec", dec)
}

fn require_plane(axes: AxisSelection) -> Result<(), CommandError> {
    if axes.count() != 2 {
        return Err(CommandError::InvalidAxisMask {
            mask: axes.mask(),
            expected: "exactly two axes (XY, XZ or YZ)",
        });
    }
    Ok(())
}

// ─── Builder ────────────────────────────────────────────────────────

/// Builds [`MotionCommand`]s against a status snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct MotionCommandBuilder {
    limits: CommandLimits,
}

impl MotionCommandBuilder {
    /// Builder enforcing `limits`.
    ///
    /// # Errors
    ///
    /// Any error from [`CommandLimits::validate`]; a NaN tolerance would
    /// otherwise accept every arc.
    pub fn new(limits: CommandLimits) -> Result<Self, ConfigError> {
        limits.validate()?;
        Ok(Self { limits })
    }

    pub const fn limits(&self) -> &CommandLimits {
        &self.limits
    }

    /// Point-to-point jog on one axis (several if multi-axis jog is enabled).
    pub fn jog(
        &self,
        status: &MachineStatus,
        axes: AxisSelection,
        params: JogParams,
    ) -> Result<MotionCommand, CommandError> {
        if axes.single().is_none() && !self.limits.allow_multi_axis_jog {
            return Err(CommandError::InvalidAxisMask {
                mask: axes.mask(),
                expected: "single axis",
            });
        }
        finite("target", params.target)?;
        profile(params.speed, params.acc, params.dec)?;
        AxisStateMachine::new(status).check_motion(axes)?;
        Ok(MotionCommand::Jog { axes, params })
    }

    /// Home one axis against the limit switch in `params.dir`.
    pub fn home(
        &self,
        status: &MachineStatus,
        axis: Axis,
        params: HomeParams,
    ) -> Result<MotionCommand, CommandError> {
        non_negative("home_speed", params.speed)?;
        non_negative("home_acc_dec", params.acc_dec)?;
        non_negative("home_fall_step", params.fall_step)?;
        AxisStateMachine::new(status).check_home(axis)?;
        Ok(MotionCommand::Home { axis, params })
    }

    /// Linear interpolation in one of the XY, XZ or YZ planes.
    pub fn line_2axis(
        &self,
        status: &MachineStatus,
        axes: AxisSelection,
        params: LineParams<2>,
    ) -> Result<MotionCommand, CommandError> {
        require_plane(axes)?;
        for v in params.end {
            finite("end", v)?;
        }
        profile(params.speed, params.acc, params.dec)?;
        AxisStateMachine::new(status).check_motion(axes)?;
        Ok(MotionCommand::Line2Axis { axes, params })
    }

    /// Linear interpolation over all three axes.
    pub fn line_3axis(
        &self,
        status: &MachineStatus,
        axes: AxisSelection,
        params: LineParams<3>,
    ) -> Result<MotionCommand, CommandError> {
        if axes != AxisSelection::XYZ {
            return Err(CommandError::InvalidAxisMask {
                mask: axes.mask(),
                expected: "all three axes (XYZ)",
            });
        }
        for v in params.end {
            finite("end", v)?;
        }
        profile(params.speed, params.acc, params.dec)?;
        AxisStateMachine::new(status).check_motion(axes)?;
        Ok(MotionCommand::Line3Axis { params })
    }

    /// Circular interpolation in a plane.
    ///
    /// The end point must lie on the circle through `center` with `radius`
    /// within the configured relative tolerance. The start point is the
    /// axes' current position and is not checked.
    pub fn arc_2axis(
        &self,
        status: &MachineStatus,
        axes: AxisSelection,
        params: ArcParams,
    ) -> Result<MotionCommand, CommandError> {
        require_plane(axes)?;
        for v in params.end {
            finite("end", v)?;
        }
        for v in params.center {
            finite("center", v)?;
        }
        finite("radius", params.radius)?;
        if params.radius <= 0.0 {
            return Err(CommandError::invalid(
                "radius",
                format!("{} is not positive", params.radius),
            ));
        }
        profile(params.speed, params.acc, params.dec)?;

        let radius = f64::from(params.radius);
        let dx = f64::from(params.end[0]) - f64::from(params.center[0]);
        let dy = f64::from(params.end[1]) - f64::from(params.center[1]);
        let distance = dx.hypot(dy);
        if (distance - radius).abs() > self.limits.arc_radius_tolerance * radius {
            return Err(CommandError::ArcGeometryMismatch { radius, distance });
        }

        AxisStateMachine::new(status).check_motion(axes)?;
        Ok(MotionCommand::Arc2Axis { axes, params })
    }

    /// Stop one axis. Always legal.
    pub const fn stop(&self, axis: Axis, mode: StopMode) -> MotionCommand {
        MotionCommand::Stop { axis, mode }
    }

    /// Stop every axis and any interpolation. Always legal.
    pub const fn stop_all(&self) -> MotionCommand {
        MotionCommand::StopAll
    }

    pub fn pause(
        &self,
        status: &MachineStatus,
        axes: AxisSelection,
    ) -> Result<MotionCommand, CommandError> {
        AxisStateMachine::new(status).check_pause(axes)?;
        Ok(MotionCommand::Pause { axes })
    }

    pub fn resume(
        &self,
        status: &MachineStatus,
        axes: AxisSelection,
    ) -> Result<MotionCommand, CommandError> {
        AxisStateMachine::new(status).check_resume(axes)?;
        Ok(MotionCommand::Resume { axes })
    }
}
