//! Board-agnostic resonance testing core
//!
//! Drives a toolhead through excitation moves while accelerometers record
//! the response, for input shaper calibration:
//!
//! - Waveform generators (sine sweep, pulse train, Moore curve tour)
//! - Axis resolution between requested test axes and accelerometer chips
//! - Test orchestration: probe points, capture windows, dataset joining
//! - Output file naming
//! - Configuration types and the `[resonance_tester]` TOML loader
//!
//! The motion queue, accelerometers and frequency analysis are external
//! collaborators described by the traits in [`traits`].

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod axis;
pub mod config;
pub mod error;
pub mod tester;
pub mod traits;
pub mod waveform;

#[cfg(test)]
pub(crate) mod mock;

pub use axis::{axes_match, AccelChip, Axis};
pub use error::{ConfigError, ResonanceError};
pub use tester::ResonanceTester;
