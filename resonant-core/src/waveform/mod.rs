//! Excitation waveforms
//!
//! Each test method turns its parameters into a lazy stream of
//! [`TestStep`]s: moves for the motion queue, acceleration changes and
//! operator progress messages. [`execute`] feeds a stream to the
//! collaborators in order, so the whole test runs inside one capture
//! window without buffering the trajectory.

pub mod moore;
pub mod pulse;
pub mod sine;
pub mod sweep;

use core::fmt;

use alloc::string::ToString;

pub use moore::{MooreCurve, MooreCurveTest};
pub use pulse::{PulseCycle, PulseTrain, PulseTrainTest};
pub use sine::{SineSweep, SineSweepTest, SweepPoint};
pub use sweep::SweepPlan;

use crate::axis::Axis;
use crate::config::{ProbePoint, TestMethod, TestMethodConfig};
use crate::error::{ConfigError, ResonanceError};
use crate::traits::{Console, MotionController, MotionError, Position};

/// A straight move for the motion queue
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionCommand {
    /// Absolute target (x, y, z, e)
    pub target: Position,
    /// Requested speed (mm/s)
    pub speed: f64,
}

/// Operator progress notification
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// Sweep reached a new whole frequency (Hz)
    Frequency(f64),
    /// A Moore curve traversal started (1-based)
    MooreRun { run: u32, runs: u32 },
    /// Completed share of the current traversal
    MoorePercent(u32),
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Frequency(freq) => write!(f, "Testing frequency {:.0} Hz", freq),
            Progress::MooreRun { run, runs } => {
                write!(f, "Moore curve run {} out of {}", run, runs)
            }
            Progress::MoorePercent(percent) => {
                write!(f, "Moore curve run progress {} %", percent)
            }
        }
    }
}

/// One element of a test trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestStep {
    Move(MotionCommand),
    /// Acceleration for the following moves (mm/s^2)
    SetAcceleration(f64),
    Progress(Progress),
}

/// Per-command parameter overrides
///
/// Frequencies and rate apply to the sweep tests, `move_speed` to the
/// Moore curve tour. Overrides last for one command only.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestOverrides {
    pub freq_start: Option<f64>,
    pub freq_end: Option<f64>,
    pub hz_per_sec: Option<f64>,
    pub move_speed: Option<f64>,
}

/// The configured test method, selected once at setup
#[derive(Debug, Clone)]
pub enum VibrationTest {
    Sine(SineSweepTest),
    Pulse(PulseTrainTest),
    Moore(MooreCurveTest),
}

impl VibrationTest {
    /// Validate the parameters and build the test
    ///
    /// The Moore curve waypoints are computed here.
    pub fn from_config(config: &TestMethodConfig) -> Result<Self, ConfigError> {
        Ok(match config {
            TestMethodConfig::Sine(sine) => VibrationTest::Sine(SineSweepTest::new(sine.clone())?),
            TestMethodConfig::Pulse(sweep) => {
                VibrationTest::Pulse(PulseTrainTest::new(sweep.clone())?)
            }
            TestMethodConfig::Moore(moore) => {
                VibrationTest::Moore(MooreCurveTest::new(moore.clone())?)
            }
        })
    }

    pub fn method(&self) -> TestMethod {
        match self {
            VibrationTest::Sine(_) => TestMethod::Sine,
            VibrationTest::Pulse(_) => TestMethod::Pulse,
            VibrationTest::Moore(_) => TestMethod::Moore,
        }
    }

    /// Axes the test can excite
    pub fn supported_axes(&self) -> &'static [Axis] {
        match self {
            VibrationTest::Sine(_) => SineSweepTest::SUPPORTED_AXES,
            VibrationTest::Pulse(_) => PulseTrainTest::SUPPORTED_AXES,
            VibrationTest::Moore(_) => MooreCurveTest::SUPPORTED_AXES,
        }
    }

    /// Points the toolhead visits before each test run
    pub fn start_points(&self) -> &[ProbePoint] {
        match self {
            VibrationTest::Sine(test) => &test.config().sweep.probe_points,
            VibrationTest::Pulse(test) => &test.config().probe_points,
            VibrationTest::Moore(test) => test.start_points(),
        }
    }

    /// Reject axes the test cannot excite
    pub fn check_axis(&self, axis: Axis) -> Result<(), ResonanceError> {
        if self.supported_axes().contains(&axis) {
            Ok(())
        } else {
            Err(ResonanceError::UnsupportedAxis(axis.as_str().to_string()))
        }
    }

    /// Apply command overrides and raise the toolhead limits for this run
    pub fn prepare<M: MotionController + ?Sized>(
        &mut self,
        toolhead: &mut M,
        overrides: &TestOverrides,
    ) -> Result<(), ResonanceError> {
        match self {
            VibrationTest::Sine(test) => test.prepare(toolhead, overrides),
            VibrationTest::Pulse(test) => test.prepare(toolhead, overrides),
            VibrationTest::Moore(test) => test.prepare(overrides),
        }
    }

    /// Run the test from the current toolhead position
    ///
    /// Returns the number of moves queued.
    pub fn run<M, C>(
        &self,
        toolhead: &mut M,
        axis: Axis,
        console: &mut C,
    ) -> Result<usize, ResonanceError>
    where
        M: MotionController + ?Sized,
        C: Console + ?Sized,
    {
        self.check_axis(axis)?;
        let start = toolhead.current_position();
        let accel_limit = toolhead.max_accel_to_decel();

        let moves = match self {
            VibrationTest::Sine(test) => {
                execute(test.steps(start, axis, accel_limit)?, toolhead, console)?
            }
            VibrationTest::Pulse(test) => {
                execute(test.steps(start, axis, accel_limit)?, toolhead, console)?
            }
            VibrationTest::Moore(test) => execute(test.steps(start), toolhead, console)?,
        };
        debug!("{} test queued {} moves", self.method().as_str(), moves);
        Ok(moves)
    }
}

/// Feed a step stream to the motion queue and console, in order
///
/// Stops at the first motion error. Returns the number of moves queued.
pub fn execute<I, M, C>(steps: I, toolhead: &mut M, console: &mut C) -> Result<usize, MotionError>
where
    I: IntoIterator<Item = TestStep>,
    M: MotionController + ?Sized,
    C: Console + ?Sized,
{
    let mut moves = 0;
    for step in steps {
        match step {
            TestStep::Move(cmd) => {
                toolhead.queue_move(cmd.target, cmd.speed)?;
                moves += 1;
            }
            TestStep::SetAcceleration(accel) => toolhead.set_acceleration(accel)?,
            TestStep::Progress(progress) => console.respond_info(&progress.to_string()),
        }
    }
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MooreTestConfig, SweepConfig};
    use crate::mock::{Event, EventLog, MockConsole, MockToolhead};

    fn pulse_config() -> TestMethodConfig {
        TestMethodConfig::Pulse(SweepConfig::with_points(alloc::vec![
            ProbePoint::xyz(100., 100., 20.),
            ProbePoint::xyz(50., 50., 20.),
        ]))
    }

    fn moore_config() -> TestMethodConfig {
        TestMethodConfig::Moore(MooreTestConfig {
            xmin: 0.,
            xmax: 30.,
            ymin: 0.,
            ymax: 30.,
            z: 10.,
            order: 1,
            runs: 1,
        })
    }

    #[test]
    fn test_progress_messages() {
        assert_eq!(Progress::Frequency(5.).to_string(), "Testing frequency 5 Hz");
        assert_eq!(Progress::Frequency(6.0004).to_string(), "Testing frequency 6 Hz");
        assert_eq!(
            Progress::MooreRun { run: 2, runs: 3 }.to_string(),
            "Moore curve run 2 out of 3"
        );
        assert_eq!(
            Progress::MoorePercent(100).to_string(),
            "Moore curve run progress 100 %"
        );
    }

    #[test]
    fn test_supported_axes() {
        let pulse = VibrationTest::from_config(&pulse_config()).unwrap();
        assert_eq!(pulse.supported_axes(), [Axis::X, Axis::Y]);
        assert!(pulse.check_axis(Axis::X).is_ok());
        assert_eq!(
            pulse.check_axis(Axis::Xy),
            Err(ResonanceError::UnsupportedAxis("xy".into()))
        );

        let moore = VibrationTest::from_config(&moore_config()).unwrap();
        assert_eq!(moore.supported_axes(), [Axis::Xy]);
        assert!(moore.check_axis(Axis::Y).is_err());
    }

    #[test]
    fn test_start_points() {
        let pulse = VibrationTest::from_config(&pulse_config()).unwrap();
        assert_eq!(pulse.start_points().len(), 2);

        let moore = VibrationTest::from_config(&moore_config()).unwrap();
        // (2^1 - 1) grid steps of 10 mm from xmin, at ymin
        assert_eq!(moore.start_points(), [ProbePoint::xyz(10., 0., 10.)]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut sweep = SweepConfig::with_points(alloc::vec![]);
        assert_eq!(
            VibrationTest::from_config(&TestMethodConfig::Pulse(sweep.clone())).unwrap_err(),
            ConfigError::NoProbePoints
        );
        sweep.probe_points.push(ProbePoint::xyz(0., 0., 0.));
        sweep.max_freq = 300.;
        assert!(matches!(
            VibrationTest::from_config(&TestMethodConfig::Pulse(sweep)),
            Err(ConfigError::AboveMaximum { option: "max_freq", .. })
        ));
    }

    #[test]
    fn test_prepare_sets_velocity_limit() {
        let log = EventLog::default();
        let mut toolhead = MockToolhead::new(&log);
        let mut test = VibrationTest::from_config(&pulse_config()).unwrap();

        let overrides = TestOverrides {
            freq_end: Some(100.),
            ..Default::default()
        };
        test.prepare(&mut toolhead, &overrides).unwrap();
        assert_eq!(log.events(), [Event::VelocityLimit(7500., 7500.)]);
    }

    #[test]
    fn test_execute_in_order() {
        let log = EventLog::default();
        let mut toolhead = MockToolhead::new(&log);
        let mut console = MockConsole::new(&log);
        let target = Position::new(1., 2., 3., 4.);

        let steps = [
            TestStep::Progress(Progress::Frequency(5.)),
            TestStep::SetAcceleration(375.),
            TestStep::Move(MotionCommand { target, speed: 25. }),
        ];
        let moves = execute(steps, &mut toolhead, &mut console).unwrap();

        assert_eq!(moves, 1);
        assert_eq!(
            log.events(),
            [
                Event::Info("Testing frequency 5 Hz".into()),
                Event::SetAccel(375.),
                Event::Move(target, 25.),
            ]
        );
    }

    #[test]
    fn test_execute_stops_on_motion_error() {
        let log = EventLog::default();
        let mut toolhead = MockToolhead::new(&log);
        toolhead.fail_after_moves(1);
        let mut console = MockConsole::new(&log);

        let cmd = MotionCommand {
            target: Position::default(),
            speed: 10.,
        };
        let steps = [TestStep::Move(cmd), TestStep::Move(cmd), TestStep::Move(cmd)];
        assert_eq!(
            execute(steps, &mut toolhead, &mut console),
            Err(MotionError::OutOfRange)
        );
        assert_eq!(log.count(|e| matches!(e, Event::Move(..))), 1);
    }
}
