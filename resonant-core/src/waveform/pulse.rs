//! Pulse train excitation
//!
//! Each cycle is a quarter period out and a quarter period back at
//! constant acceleration, alternating direction from cycle to cycle:
//!
//! ```text
//! t_seg = 0.25 / f
//! a     = min(accel_per_hz * f, accel_limit)
//! V     = a * t_seg
//! L     = 0.5 * a * t_seg^2
//! ```
//!
//! The frequency advances by `2 * t_seg * hz_per_sec` per cycle.

use heapless::Deque;

use super::sweep::{prepare_sweep, SweepPlan};
use super::{MotionCommand, Progress, TestOverrides, TestStep};
use crate::axis::Axis;
use crate::config::SweepConfig;
use crate::error::{ConfigError, ResonanceError};
use crate::traits::{MotionController, Position};

/// Parameters of one out-and-back pulse
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseCycle {
    /// Frequency of this cycle (Hz)
    pub freq: f64,
    /// Direction along the axis, +1 or -1
    pub sign: f64,
    /// Duration of each half of the cycle (s)
    pub t_seg: f64,
    /// Acceleration (mm/s^2)
    pub accel: f64,
    /// Move speed (mm/s)
    pub speed: f64,
    /// Pulse length (mm)
    pub distance: f64,
}

/// Pulse cycle generator
#[derive(Debug, Clone)]
pub struct PulseTrain {
    plan: SweepPlan,
    accel_per_hz: f64,
    accel_limit: f64,
    freq: f64,
    sign: f64,
}

impl PulseTrain {
    pub fn new(plan: SweepPlan, accel_per_hz: f64, accel_limit: f64) -> Self {
        Self {
            plan,
            accel_per_hz,
            accel_limit,
            freq: plan.freq_start,
            sign: 1.,
        }
    }

    /// Frequency of the next cycle
    pub fn frequency(&self) -> f64 {
        self.freq
    }
}

impl Iterator for PulseTrain {
    type Item = PulseCycle;

    fn next(&mut self) -> Option<PulseCycle> {
        if !self.plan.includes(self.freq) {
            return None;
        }

        let freq = self.freq;
        let t_seg = 0.25 / freq;
        let accel = (self.accel_per_hz * freq).min(self.accel_limit);
        let cycle = PulseCycle {
            freq,
            sign: self.sign,
            t_seg,
            accel,
            speed: accel * t_seg,
            distance: 0.5 * accel * t_seg * t_seg,
        };

        self.sign = -self.sign;
        self.freq += 2. * t_seg * self.plan.hz_per_sec;
        Some(cycle)
    }
}

/// Steps queued behind a cycle's acceleration change: out, back, progress
const CYCLE_QUEUE: usize = 3;

/// Test steps of a pulse train along one axis
///
/// Per cycle: set the acceleration, pulse out, come back to the start, and
/// report the frequency if a whole hertz was crossed.
#[derive(Debug, Clone)]
pub struct PulseTrainSteps {
    train: PulseTrain,
    start: Position,
    direction: (f64, f64),
    pending: Deque<TestStep, CYCLE_QUEUE>,
    announced: bool,
}

impl PulseTrainSteps {
    fn queue(&mut self, step: TestStep) {
        let queued = self.pending.push_back(step).is_ok();
        debug_assert!(queued, "pulse cycle queue overflow");
    }
}

impl Iterator for PulseTrainSteps {
    type Item = TestStep;

    fn next(&mut self) -> Option<TestStep> {
        if let Some(step) = self.pending.pop_front() {
            return Some(step);
        }
        if !self.announced {
            self.announced = true;
            return Some(TestStep::Progress(Progress::Frequency(self.train.frequency())));
        }

        let cycle = self.train.next()?;
        let (dx, dy) = self.direction;
        let offset = cycle.sign * cycle.distance;
        let out = self
            .start
            .with_xy(self.start.x + dx * offset, self.start.y + dy * offset);

        self.queue(TestStep::Move(MotionCommand {
            target: out,
            speed: cycle.speed,
        }));
        self.queue(TestStep::Move(MotionCommand {
            target: self.start,
            speed: cycle.speed,
        }));
        let freq = self.train.frequency();
        if libm::floor(freq) > libm::floor(cycle.freq) {
            self.queue(TestStep::Progress(Progress::Frequency(freq)));
        }
        Some(TestStep::SetAcceleration(cycle.accel))
    }
}

/// Pulse train test
#[derive(Debug, Clone)]
pub struct PulseTrainTest {
    config: SweepConfig,
    plan: SweepPlan,
}

impl PulseTrainTest {
    pub const SUPPORTED_AXES: &'static [Axis] = &[Axis::X, Axis::Y];

    pub fn new(config: SweepConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let plan = SweepPlan::from_config(&config);
        Ok(Self { config, plan })
    }

    pub fn config(&self) -> &SweepConfig {
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
        self.plan = prepare_sweep(&self.config, overrides, toolhead)?;
        Ok(())
    }

    /// Raw pulse cycles for the current plan
    pub fn train(&self, accel_limit: f64) -> PulseTrain {
        PulseTrain::new(self.plan, self.config.accel_per_hz, accel_limit)
    }

    /// Steps for a pulse train around `start` along `axis`
    pub fn steps(
        &self,
        start: Position,
        axis: Axis,
        accel_limit: f64,
    ) -> Result<PulseTrainSteps, ResonanceError> {
        let direction = axis
            .direction()
            .ok_or_else(|| ResonanceError::UnsupportedAxis(axis.as_str().into()))?;
        Ok(PulseTrainSteps {
            train: self.train(accel_limit),
            start,
            direction,
            pending: Deque::new(),
            announced: false,
        })
    }
}
