//! Closed enumeration of axis combinations.

use std::fmt;

use fmc_common::error::CommandError;
use fmc_common::status::Axis;
use serde::{Deserialize, Serialize};

/// Axes addressed by a command. Discriminant is the controller bit mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AxisSelection {
    X = 0x01,
    Y = 0x02,
    XY = 0x03,
    Z = 0x04,
    XZ = 0x05,
    YZ = 0x06,
    XYZ = 0x07,
}

impl AxisSelection {
    /// The three two-axis planes accepted by 2-axis interpolation.
    pub const PLANES: [AxisSelection; 3] = [Self::XY, Self::XZ, Self::YZ];

    /// Convert from a raw bit mask.
    pub const fn from_u8(mask: u8) -> Option<Self> {
        match mask {
            0x01 => Some(Self::X),
            0x02 => Some(Self::Y),
            0x03 => Some(Self::XY),
            0x04 => Some(Self::Z),
            0x05 => Some(Self::XZ),
            0x06 => Some(Self::YZ),
            0x07 => Some(Self::XYZ),
            _ => None,
        }
    }

    /// Convert from a raw bit mask, rejecting empty or out-of-range masks.
    pub fn from_mask(mask: u8) -> Result<Self, CommandError> {
        Self::from_u8(mask).ok_or(CommandError::InvalidAxisMask {
            mask,
            expected: "non-empty combination of X (0x01), Y (0x02), Z (0x04)",
        })
    }

    #[inline]
    pub const fn mask(self) -> u8 {
        self as u8
    }

    /// Number of axes selected.
    #[inline]
    pub const fn count(self) -> u32 {
        self.mask().count_ones()
    }

    #[inline]
    pub const fn contains(self, axis: Axis) -> bool {
        self.mask() & axis.mask() != 0
    }

    /// Selected axes in index order.
    pub fn axes(self) -> impl Iterator<Item = Axis> {
        Axis::ALL.into_iter().filter(move |&a| self.contains(a))
    }

    /// The axis, if exactly one is selected.
    pub const fn single(self) -> Option<Axis> {
        match self {
            Self::X => Some(Axis::X),
            Self::Y => Some(Axis::Y),
            Self::Z => Some(Axis::Z),
            _ => None,
        }
    }
}

impl From<Axis> for AxisSelection {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::X => Self::X,
            Axis::Y => Self::Y,
            Axis::Z => Self::Z,
        }
    }
}

impl fmt::Display for AxisSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in self.axes() {
            write!(f, "{axis}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_match_controller_bits() {
        assert_eq!(AxisSelection::X.mask(), 0x01);
        assert_eq!(AxisSelection::Y.mask(), 0x02);
        assert_eq!(AxisSelection::Z.mask(), 0x04);
        assert_eq!(AxisSelection::XY.mask(), 0x03);
        assert_eq!(AxisSelection::XZ.mask(), 0x05);
        assert_eq!(AxisSelection::YZ.mask(), 0x06);
        assert_eq!(AxisSelection::XYZ.mask(), 0x07);
    }

    #[test]
    fn from_mask_roundtrip_and_rejects() {
        for mask in 1..=7u8 {
            assert_eq!(AxisSelection::from_mask(mask).unwrap().mask(), mask);
        }
        for mask in [0u8, 0x08, 0x0F, 0xFF] {
            assert!(matches!(
                AxisSelection::from_mask(mask),
                Err(CommandError::InvalidAxisMask { mask: m, .. }) if m == mask
            ));
        }
    }

    #[test]
    fn axes_iterates_in_index_order() {
        let axes: Vec<Axis> = AxisSelection::XZ.axes().collect();
        assert_eq!(axes, vec![Axis::X, Axis::Z]);
        assert_eq!(AxisSelection::XYZ.count(), 3);
        assert_eq!(AxisSelection::YZ.single(), None);
        assert_eq!(AxisSelection::from(Axis::Y).single(), Some(Axis::Y));
        assert_eq!(AxisSelection::XZ.to_string(), "XZ");
    }
}
