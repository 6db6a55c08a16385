//! Range checks shared by config options and command parameters
//!
//! Comparisons are written so NaN never passes.

use crate::error::ConfigError;

pub(crate) fn at_least(option: &'static str, value: f64, min: f64) -> Result<f64, ConfigError> {
    if value >= min {
        Ok(value)
    } else {
        Err(ConfigError::BelowMinimum { option, value, min })
    }
}

pub(crate) fn at_most(option: &'static str, value: f64, max: f64) -> Result<f64, ConfigError> {
    if value <= max {
        Ok(value)
    } else {
        Err(ConfigError::AboveMaximum { option, value, max })
    }
}

pub(crate) fn above(option: &'static str, value: f64, bound: f64) -> Result<f64, ConfigError> {
    if value > bound {
        Ok(value)
    } else {
        Err(ConfigError::NotAbove {
            option,
            value,
            bound,
        })
    }
}

pub(crate) fn within(
    option: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError> {
    at_least(option, value, min).and_then(|v| at_most(option, v, max))
}
