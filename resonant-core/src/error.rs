//! Error types
//!
//! Configuration problems are caught at setup; everything else aborts the
//! running command. Nothing in this crate retries.

use alloc::format;
use alloc::string::String;

use thiserror::Error;

use crate::axis::Axis;
use crate::config::ProbePoint;
use crate::traits::{MotionError, PersistError, SensorError};

/// Invalid or missing configuration / command parameter
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Required option not given
    #[error("option '{option}' must be specified")]
    Missing { option: &'static str },
    /// Value below an inclusive minimum
    #[error("option '{option}' must have minimum of {min} (got {value})")]
    BelowMinimum {
        option: &'static str,
        value: f64,
        min: f64,
    },
    /// Value above an inclusive maximum
    #[error("option '{option}' must have maximum of {max} (got {value})")]
    AboveMaximum {
        option: &'static str,
        value: f64,
        max: f64,
    },
    /// Value not strictly above a bound
    #[error("option '{option}' must be above {bound} (got {value})")]
    NotAbove {
        option: &'static str,
        value: f64,
        bound: f64,
    },
    /// Value is not one of the accepted choices
    #[error("choice '{value}' for option '{option}' is not a valid choice")]
    InvalidChoice { option: &'static str, value: String },
    /// A numeric command parameter could not be parsed
    #[error("unable to parse '{value}' as a number for '{option}'")]
    InvalidNumber { option: &'static str, value: String },
    /// A probe point line could not be parsed
    #[error("unable to parse probe_points entry '{entry}'")]
    InvalidProbePoints { entry: String },
    /// The test has no point to run at
    #[error("no probe points configured")]
    NoProbePoints,
    /// TOML syntax or shape error
    #[error("config parse error: {0}")]
    Parse(String),
}

/// Failure of a resonance test command
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResonanceError {
    /// Bad configuration or command parameter
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The active test cannot run along the requested axis
    #[error("unsupported axis '{0}'")]
    UnsupportedAxis(String),
    /// The active test supports several axes and none was requested
    #[error("missing required parameter 'AXIS'")]
    MissingAxis,
    /// No accelerometer records the requested axis
    #[error("no accelerometer configured for axis '{0}'")]
    NoChipForAxis(Axis),
    /// A capture window produced no samples
    #[error("{chip_axis}-axis accelerometer '{chip}' measured no data{}", at_point(.point))]
    EmptyMeasurement {
        chip_axis: Axis,
        chip: String,
        point: Option<ProbePoint>,
    },
    /// The motion queue rejected a command
    #[error("motion error: {0}")]
    Motion(#[from] MotionError),
    /// An accelerometer reported a failure
    #[error("accelerometer '{chip}': {source}")]
    Sensor { chip: String, source: SensorError },
    /// Writing an output file failed
    #[error(transparent)]
    Persist(#[from] PersistError),
}

fn at_point(point: &Option<ProbePoint>) -> String {
    match point {
        Some(p) => format!(" at point {}", p),
        None => String::new(),
    }
}
