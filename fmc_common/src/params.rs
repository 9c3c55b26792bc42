//! Device configuration record (identity, communication, per-axis scaling).

use serde::{Deserialize, Serialize};

use crate::consts::{IP_FIELD_LEN, MAX_AXIS};
use crate::error::ValidationError;

/// Per-axis scaling, soft limits and homing timeout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisParams {
    /// Pulse subdivision (microsteps per step).
    #[serde(default)]
    pub div: i32,
    /// Lead: travel per motor revolution.
    #[serde(default)]
    pub lead: i32,
    /// Upper software position limit.
    #[serde(default)]
    pub soft_limit_max: i32,
    /// Lower software position limit.
    #[serde(default)]
    pub soft_limit_min: i32,
    /// Homing timeout.
    #[serde(default)]
    pub home_time: i32,
}

/// Device parameter record as stored on the controller.
///
/// # TOML Example
///
/// ```toml
/// id = 0
/// baud_232 = 115200
/// baud_485 = 115200
/// ip = "192.168.0.30"
/// port = 8088
///
/// [[axes]]
/// div = 16
/// lead = 10
/// soft_limit_max = 970
/// soft_limit_min = 0
/// home_time = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceParams {
    /// Device id used to address the controller.
    pub id: u32,
    /// RS-232 baud rate.
    pub baud_232: u32,
    /// RS-485 baud rate.
    pub baud_485: u32,
    /// Controller IP address text.
    pub ip: String,
    /// Controller TCP port.
    pub port: i32,
    /// Per-axis parameters, index = axis.
    #[serde(default)]
    pub axes: Vec<AxisParams>,
}

impl DeviceParams {
    /// Validate the record before it is written to a controller.
    ///
    /// # Errors
    ///
    /// - `InvalidAxisCount` if more than [`MAX_AXIS`] axis entries are present
    /// - `InvalidSoftLimits` if `soft_limit_min > soft_limit_max` on any axis
    /// - `AddressTooLong` if `ip` does not fit its 15-byte field
    /// - `InvalidAddress` if `ip` contains NUL or ends in a space
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.axes.len() > MAX_AXIS {
            return Err(ValidationError::InvalidAxisCount {
                count: self.axes.len(),
                max: MAX_AXIS,
            });
        }
        for (axis, p) in self.axes.iter().enumerate() {
            if p.soft_limit_min > p.soft_limit_max {
                return Err(ValidationError::InvalidSoftLimits {
                    axis,
                    min: p.soft_limit_min,
                    max: p.soft_limit_max,
                });
            }
        }
        if self.ip.len() > IP_FIELD_LEN {
            return Err(ValidationError::AddressTooLong {
                address: self.ip.clone(),
                max: IP_FIELD_LEN,
            });
        }
        if self.ip.contains('\0') || self.ip.ends_with(' ') {
            return Err(ValidationError::InvalidAddress {
                address: self.ip.clone(),
            });
        }
        Ok(())
    }

    /// Parameters for one axis, or zeros when the record has fewer entries.
    pub fn axis(&self, index: usize) -> AxisParams {
        self.axes.get(index).copied().unwrap_or_default()
    }
}
