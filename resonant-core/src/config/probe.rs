//! Probe points
//!
//! Locations where a test is executed. Configured as one `x, y[, z]` entry
//! per line.

use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;

use crate::error::ConfigError;

/// A test location with two or three coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbePoint {
    pub x: f64,
    pub y: f64,
    /// Height; `None` keeps the current toolhead height
    pub z: Option<f64>,
}

impl ProbePoint {
    /// Build from 2 or 3 coordinates
    pub fn new(coords: &[f64]) -> Option<Self> {
        match *coords {
            [x, y] => Some(Self { x, y, z: None }),
            [x, y, z] => Some(Self { x, y, z: Some(z) }),
            _ => None,
        }
    }

    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl fmt::Display for ProbePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, z),
            None => write!(f, "({:.3}, {:.3})", self.x, self.y),
        }
    }
}

/// Parse the `probe_points` option text
///
/// Blank lines are skipped. Each remaining line holds comma separated
/// coordinates; anything after the third field stays in the third field
/// and must therefore still parse as a single number.
pub fn parse_probe_points(text: &str) -> Result<Vec<ProbePoint>, ConfigError> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Result<ProbePoint, ConfigError> {
    let invalid = || ConfigError::InvalidProbePoints {
        entry: line.to_string(),
    };

    let mut coords: heapless::Vec<f64, 3> = heapless::Vec::new();
    for field in line.splitn(3, ',') {
        let value = field.trim().parse::<f64>().map_err(|_| invalid())?;
        coords.push(value).map_err(|_| invalid())?;
    }
    ProbePoint::new(&coords).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_parse_multiline() {
        let points = parse_probe_points("\n  100, 100, 20\n\n 50.5,60\n").unwrap();
        assert_eq!(
            points,
            [ProbePoint::xyz(100., 100., 20.), ProbePoint::new(&[50.5, 60.]).unwrap()]
        );
    }

    #[test]
    fn test_extra_fields_are_rejected() {
        let err = parse_probe_points("1,2,3,4").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidProbePoints {
                entry: "1,2,3,4".into()
            }
        );
    }

    #[test]
    fn test_single_coordinate_is_rejected() {
        assert!(parse_probe_points("100").is_err());
        assert!(parse_probe_points("100, abc").is_err());
    }

    #[test]
    fn test_empty_text_gives_no_points() {
        assert!(parse_probe_points("\n \n").unwrap().is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ProbePoint::xyz(1., 2.5, 3.).to_string(),
            "(1.000, 2.500, 3.000)"
        );
        assert_eq!(ProbePoint::new(&[1., 2.]).unwrap().to_string(), "(1.000, 2.000)");
    }
}
