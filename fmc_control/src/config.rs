//! Control-layer configuration (`[command]` and `[bus]` tables).
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "fmc-cell-2"
//! log_level = "debug"
//!
//! [command]
//! arc_radius_tolerance = 0.002
//! allow_multi_axis_jog = false
//!
//! [bus]
//! coil_convention = "strict"
//! ```
//!
//! Every table is optional; missing values take their defaults.

use fmc_common::config::{ConfigError, SharedConfig};
use serde::{Deserialize, Serialize};

use crate::command::CommandLimits;
use crate::subbus::CoilConvention;

/// Sub-bus settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub coil_convention: CoilConvention,
}

/// Full configuration for a [`DeviceSession`](crate::session::DeviceSession).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControlConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub command: CommandLimits,
    #[serde(default)]
    pub bus: BusConfig,
}

impl ControlConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` if the shared section is invalid or the
    /// arc tolerance is not a positive finite number.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.command.validate()
    }
}
