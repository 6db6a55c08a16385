//! Test axes and accelerometer chip resolution
//!
//! A test is run along a logical axis; accelerometer chips are bound to
//! the axis they observe. A chip serves a requested axis when either axis
//! name contains the other, so a combined `xy` chip answers `x`, `y` and
//! `xy` requests, and an `xy` request collects from dedicated `x` and `y`
//! chips alike.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ResonanceError;

/// Logical test axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Axis {
    /// X axis only
    X,
    /// Y axis only
    Y,
    /// Both axes at once (combined chip, or a 2D tour)
    Xy,
}

impl Axis {
    /// Lower-case axis tag as used in commands and file names
    pub const fn as_str(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Xy => "xy",
        }
    }

    /// Unit vibration direction in the XY plane
    ///
    /// Only single axes have a direction; `xy` tests move along a path.
    pub const fn direction(self) -> Option<(f64, f64)> {
        match self {
            Axis::X => Some((1., 0.)),
            Axis::Y => Some((0., 1.)),
            Axis::Xy => None,
        }
    }

    /// Parse an axis tag, ignoring ASCII case
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        [Axis::X, Axis::Y, Axis::Xy]
            .into_iter()
            .find(|axis| axis.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = ResonanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Axis::parse(s).ok_or_else(|| ResonanceError::UnsupportedAxis(s.trim().to_ascii_lowercase()))
    }
}

/// Check whether a chip bound to `chip_axis` serves a `requested` test axis
///
/// Either tag containing the other counts as a match.
pub fn axes_match(requested: Axis, chip_axis: Axis) -> bool {
    let (requested, chip_axis) = (requested.as_str(), chip_axis.as_str());
    requested.contains(chip_axis) || chip_axis.contains(requested)
}

/// An accelerometer bound to the axis it observes
#[derive(Debug)]
pub struct AccelChip<A> {
    /// Axis the chip is mounted for
    pub axis: Axis,
    /// Configured chip name (for reports and errors)
    pub name: String,
    /// The sensor itself
    pub sensor: A,
}

impl<A> AccelChip<A> {
    /// Bind a sensor to an axis
    pub fn new(axis: Axis, name: &str, sensor: A) -> Self {
        Self {
            axis,
            name: name.to_string(),
            sensor,
        }
    }

    /// Check whether this chip records data for a requested test axis
    pub fn serves(&self, requested: Axis) -> bool {
        axes_match(requested, self.axis)
    }
}

/// Indices of the chips that serve a requested axis, in binding order
pub fn chips_for_axis<A>(chips: &[AccelChip<A>], requested: Axis) -> Vec<usize> {
    chips
        .iter()
        .enumerate()
        .filter(|(_, chip)| chip.serves(requested))
        .map(|(i, _)| i)
        .collect()
}
