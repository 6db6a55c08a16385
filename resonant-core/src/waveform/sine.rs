//! Sine sweep excitation
//!
//! The toolhead oscillates around its start position along one axis while
//! the frequency rises linearly. The amplitude at each frequency is chosen
//! so the peak acceleration is `accel_per_hz * f`, capped by the toolhead
//! limit:
//!
//! ```text
//! A = min(accel_per_hz * f, accel_limit) / (2 pi f)^2
//! offset(t) = A * sin(2 pi f t)
//! ```
//!
//! The oscillation is emitted as short straight moves of `seg_sec` each.

use core::f64::consts::PI;

use super::sweep::{prepare_sweep, SweepPlan};
use super::{MotionCommand, Progress, TestOverrides, TestStep};
use crate::axis::Axis;
use crate::config::SineTestConfig;
use crate::error::{ConfigError, ResonanceError};
use crate::traits::{MotionController, Position};

/// One sample of the sweep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepPoint {
    /// Frequency the sample was generated at (Hz)
    pub freq: f64,
    /// Elapsed time since the sweep started (s)
    pub time: f64,
    /// Oscillation amplitude at `freq` (mm)
    pub amplitude: f64,
    /// Offset from the start position (mm)
    pub offset: f64,
}

/// Sine sweep sample generator
///
/// Sample `i` (1-based) is taken at `t = i * seg_sec` using the frequency
/// reached after the previous sample, so the sweep starts exactly at
/// `freq_start`.
#[derive(Debug, Clone)]
pub struct SineSweep {
    plan: SweepPlan,
    seg_sec: f64,
    accel_per_hz: f64,
    accel_limit: f64,
    index: u64,
    freq: f64,
}

impl SineSweep {
    pub fn new(plan: SweepPlan, seg_sec: f64, accel_per_hz: f64, accel_limit: f64) -> Self {
        Self {
            plan,
            seg_sec,
            accel_per_hz,
            accel_limit,
            index: 0,
            freq: plan.freq_start,
        }
    }

    /// Frequency the next sample will use
    pub fn frequency(&self) -> f64 {
        self.freq
    }
}

impl Iterator for SineSweep {
    type Item = SweepPoint;

    fn next(&mut self) -> Option<SweepPoint> {
        if !self.plan.includes(self.freq) {
            return None;
        }
        self.index += 1;

        let freq = self.freq;
        let accel = (self.accel_per_hz * freq).min(self.accel_limit);
        let omega = 2. * PI * freq;
        let amplitude = accel / (omega * omega);
        let time = self.seg_sec * self.index as f64;
        let offset = amplitude * libm::sin(omega * time);

        self.freq = self.plan.freq_start + time * self.plan.hz_per_sec;
        Some(SweepPoint {
            freq,
            time,
            amplitude,
            offset,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Announce,
    Sweep,
    Return,
    Done,
}

/// Test steps of a sine sweep along one axis
///
/// Announces the start frequency, emits one move per sweep sample, reports
/// every whole hertz crossed and finally returns to the start position.
#[derive(Debug, Clone)]
pub struct SineSweepSteps {
    sweep: SineSweep,
    seg_sec: f64,
    start: Position,
    direction: (f64, f64),
    prev: Position,
    speed: Option<f64>,
    phase: Phase,
    pending: Option<TestStep>,
}

impl Iterator for SineSweepSteps {
    type Item = TestStep;

    fn next(&mut self) -> Option<TestStep> {
        if let Some(step) = self.pending.take() {
            return Some(step);
        }

        match self.phase {
            Phase::Announce => {
                self.phase = Phase::Sweep;
                Some(TestStep::Progress(Progress::Frequency(self.sweep.frequency())))
            }
            Phase::Sweep => {
                let old_freq = self.sweep.frequency();
                let Some(point) = self.sweep.next() else {
                    self.phase = Phase::Return;
                    return self.next();
                };

                let (dx, dy) = self.direction;
                let target = self.start.with_xy(
                    self.start.x + dx * point.offset,
                    self.start.y + dy * point.offset,
                );
                let speed = target.xy_distance(&self.prev) / self.seg_sec;
                self.prev = target;
                self.speed = Some(speed);

                let freq = self.sweep.frequency();
                if libm::floor(freq) > libm::floor(old_freq) {
                    self.pending = Some(TestStep::Progress(Progress::Frequency(freq)));
                }
                Some(TestStep::Move(MotionCommand { target, speed }))
            }
            Phase::Return => {
                self.phase = Phase::Done;
                // Nothing moved, nothing to undo
                let speed = self.speed?;
                Some(TestStep::Move(MotionCommand {
                    target: self.start,
                    speed,
                }))
            }
            Phase::Done => None,
        }
    }
}

/// Sine sweep test
#[derive(Debug, Clone)]
pub struct SineSweepTest {
    config: SineTestConfig,
    plan: SweepPlan,
}

impl SineSweepTest {
    pub const SUPPORTED_AXES: &'static [Axis] = &[Axis::X, Axis::Y];

    pub fn new(config: SineTestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let plan = SweepPlan::from_config(&config.sweep);
        Ok(Self { config, plan })
    }

    pub fn config(&self) -> &SineTestConfig {
        &self.config
    }

    /// Sweep plan used by the next run
    pub fn plan(&self) -> &SweepPlan {
        &self.plan
    }

    pub fn prepare<M: MotionController + ?Sized>(
        &mut self,
        toolhead: &mut M,
        overrides: &TestOverrides,
    ) -> Result<(), ResonanceError> {
        self.plan = prepare_sweep(&self.config.sweep, overrides, toolhead)?;
        Ok(())
    }

    /// Raw sweep samples for the current plan
    pub fn sweep(&self, accel_limit: f64) -> SineSweep {
        SineSweep::new(
            self.plan,
            self.config.seg_sec,
            self.config.sweep.accel_per_hz,
            accel_limit,
        )
    }

    /// Steps for a sweep around `start` along `axis`
    pub fn steps(
        &self,
        start: Position,
        axis: Axis,
        accel_limit: f64,
    ) -> Result<SineSweepSteps, ResonanceError> {
        let direction = axis
            .direction()
            .ok_or_else(|| ResonanceError::UnsupportedAxis(axis.as_str().into()))?;
        Ok(SineSweepSteps {
            sweep: self.sweep(accel_limit),
            seg_sec: self.config.seg_sec,
            start,
            direction,
            prev: start,
            speed: None,
            phase: Phase::Announce,
            pending: None,
        })
    }
}
