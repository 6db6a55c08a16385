//! Frequency sweep plan shared by the sine and pulse tests
//!
//! The configured range is the default; each command may narrow it or
//! change the sweep rate. Preparing a sweep also raises the toolhead
//! acceleration limits to what the highest test frequency needs.

use super::TestOverrides;
use crate::config::{
    above, at_least, at_most, SweepConfig, MAX_HZ_PER_SEC, MAX_TEST_FREQ, MIN_TEST_FREQ,
};
use crate::error::{ConfigError, ResonanceError};
use crate::traits::MotionController;

/// Slack on the end frequency so rounding never drops the last cycle
pub const FREQ_TOLERANCE: f64 = 0.000_001;

/// Frequency range and rate for one test run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepPlan {
    /// First test frequency (Hz)
    pub freq_start: f64,
    /// Last test frequency (Hz)
    pub freq_end: f64,
    /// Sweep rate (Hz/s)
    pub hz_per_sec: f64,
}

impl SweepPlan {
    /// Plan covering the configured range
    pub fn from_config(config: &SweepConfig) -> Self {
        Self {
            freq_start: config.min_freq,
            freq_end: config.max_freq,
            hz_per_sec: config.hz_per_sec,
        }
    }

    /// Apply command overrides on top of the configured range
    pub fn with_overrides(
        config: &SweepConfig,
        overrides: &TestOverrides,
    ) -> Result<Self, ConfigError> {
        let freq_start = overrides.freq_start.unwrap_or(config.min_freq);
        let freq_start = at_least("FREQ_START", freq_start, MIN_TEST_FREQ)?;

        let freq_end = overrides.freq_end.unwrap_or(config.max_freq);
        let freq_end = at_least("FREQ_END", freq_end, freq_start)?;
        let freq_end = at_most("FREQ_END", freq_end, MAX_TEST_FREQ)?;

        let hz_per_sec = overrides.hz_per_sec.unwrap_or(config.hz_per_sec);
        let hz_per_sec = above("HZ_PER_SEC", hz_per_sec, 0.)?;
        let hz_per_sec = at_most("HZ_PER_SEC", hz_per_sec, MAX_HZ_PER_SEC)?;

        Ok(Self {
            freq_start,
            freq_end,
            hz_per_sec,
        })
    }

    /// Whether `freq` is still inside the sweep
    pub fn includes(&self, freq: f64) -> bool {
        freq <= self.freq_end + FREQ_TOLERANCE
    }

    /// Acceleration needed at the end frequency
    pub fn max_accel(&self, accel_per_hz: f64) -> f64 {
        self.freq_end * accel_per_hz
    }
}

/// Resolve the sweep plan and raise the toolhead limits for it
pub(crate) fn prepare_sweep<M: MotionController + ?Sized>(
    config: &SweepConfig,
    overrides: &TestOverrides,
    toolhead: &mut M,
) -> Result<SweepPlan, ResonanceError> {
    let plan = SweepPlan::with_overrides(config, overrides)?;
    let max_accel = plan.max_accel(config.accel_per_hz);
    toolhead.set_velocity_limit(max_accel, max_accel)?;
    debug!(
        "sweep {} -> {} Hz at {} Hz/s, accel limit {}",
        plan.freq_start,
        plan.freq_end,
        plan.hz_per_sec,
        max_accel
    );
    Ok(plan)
}
