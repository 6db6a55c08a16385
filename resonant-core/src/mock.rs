//! Recording collaborators for tests
//!
//! Every mock appends to one shared [`EventLog`] so tests can assert the
//! exact interleaving of motion, capture windows and console output.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::axis::Axis;
use crate::config::ProbePoint;
use crate::traits::{
    Accelerometer, AxesNoise, CalibrationAnalyzer, CalibrationDataset, Clock, Console,
    InputShaperControl, MotionController, MotionError, PersistError, Position, SampleAggregate,
    SensorError, ShaperFit, Timestamp,
};

/// Something a collaborator was asked to do
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Move(Position, f64),
    MoveTo(ProbePoint, f64),
    Drain,
    Delay(f64),
    VelocityLimit(f64, f64),
    SetAccel(f64),
    Info(String),
    StartCapture(String),
    StopCapture(String),
    RawDump(String),
    Process(usize),
    Join,
    Normalize,
    SaveParams(Axis, String, f64),
    SaveData(String),
    SaveFigure(String),
    ShaperDisabled,
    ShaperEnabled,
}

/// Shared, ordered event record
#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Position of the first matching event
    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(pred)
    }

    /// Console lines, in order
    pub fn messages(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Info(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Motion queue that records moves and tracks the commanded position
pub struct MockToolhead {
    log: EventLog,
    position: Position,
    accel_to_decel: f64,
    moves: usize,
    fail_after: Option<usize>,
}

impl MockToolhead {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            position: Position::new(0., 0., 10., 0.),
            accel_to_decel: 5000.,
            moves: 0,
            fail_after: None,
        }
    }

    /// Reject every queued move after the first `moves`
    pub fn fail_after_moves(&mut self, moves: usize) {
        self.fail_after = Some(moves);
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

impl MotionController for MockToolhead {
    fn current_position(&self) -> Position {
        self.position
    }

    fn queue_move(&mut self, target: Position, speed: f64) -> Result<(), MotionError> {
        if self.fail_after.is_some_and(|limit| self.moves >= limit) {
            return Err(MotionError::OutOfRange);
        }
        self.moves += 1;
        self.position = target;
        self.log.push(Event::Move(target, speed));
        Ok(())
    }

    fn move_to(&mut self, point: &ProbePoint, speed: f64) -> Result<(), MotionError> {
        self.position.x = point.x;
        self.position.y = point.y;
        if let Some(z) = point.z {
            self.position.z = z;
        }
        self.log.push(Event::MoveTo(*point, speed));
        Ok(())
    }

    fn drain(&mut self) -> Result<(), MotionError> {
        self.log.push(Event::Drain);
        Ok(())
    }

    fn delay(&mut self, seconds: f64) -> Result<(), MotionError> {
        self.log.push(Event::Delay(seconds));
        Ok(())
    }

    fn set_velocity_limit(&mut self, accel: f64, accel_to_decel: f64) -> Result<(), MotionError> {
        self.accel_to_decel = accel_to_decel;
        self.log.push(Event::VelocityLimit(accel, accel_to_decel));
        Ok(())
    }

    fn set_acceleration(&mut self, accel: f64) -> Result<(), MotionError> {
        self.log.push(Event::SetAccel(accel));
        Ok(())
    }

    fn max_accel_to_decel(&self) -> f64 {
        self.accel_to_decel
    }
}

/// Console that records every line
pub struct MockConsole {
    log: EventLog,
}

impl MockConsole {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl Console for MockConsole {
    fn respond_info(&mut self, msg: &str) {
        self.log.push(Event::Info(msg.to_string()));
    }
}

/// Fixed wall clock
pub struct FixedClock(pub Timestamp);

impl FixedClock {
    pub fn new() -> Self {
        Self(Timestamp {
            year: 2024,
            month: 3,
            day: 9,
            hour: 14,
            minute: 5,
            second: 7,
        })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Captured samples; only the count is tracked
#[derive(Debug)]
pub struct MockSamples {
    log: EventLog,
    pub count: usize,
}

impl SampleAggregate for MockSamples {
    fn is_empty(&self) -> bool {
        self.count == 0
    }

    fn stats(&self) -> String {
        format!("{} samples", self.count)
    }

    fn write_to_file(&self, path: &str) -> Result<(), PersistError> {
        self.log.push(Event::RawDump(path.to_string()));
        Ok(())
    }
}

/// Accelerometer returning a fixed number of samples per window
pub struct MockSensor {
    log: EventLog,
    name: String,
    samples: usize,
    running: bool,
    fail_start: bool,
}

impl MockSensor {
    pub fn new(log: &EventLog, name: &str, samples: usize) -> Self {
        Self {
            log: log.clone(),
            name: name.to_string(),
            samples,
            running: false,
            fail_start: false,
        }
    }

    /// Sensor that never records anything
    pub fn silent(log: &EventLog, name: &str) -> Self {
        Self::new(log, name, 0)
    }

    /// Sensor whose capture cannot be started
    pub fn broken(log: &EventLog, name: &str) -> Self {
        Self {
            fail_start: true,
            ..Self::new(log, name, 0)
        }
    }
}

impl Accelerometer for MockSensor {
    type Samples = MockSamples;

    fn start_capture(&mut self) -> Result<(), SensorError> {
        if self.fail_start {
            return Err(SensorError::CommunicationError);
        }
        if self.running {
            return Err(SensorError::AlreadyRunning);
        }
        self.running = true;
        self.log.push(Event::StartCapture(self.name.clone()));
        Ok(())
    }

    fn stop_capture(&mut self) -> Result<MockSamples, SensorError> {
        if !self.running {
            return Err(SensorError::NotRunning);
        }
        self.running = false;
        self.log.push(Event::StopCapture(self.name.clone()));
        Ok(MockSamples {
            log: self.log.clone(),
            count: self.samples,
        })
    }
}

/// Dataset counting the windows folded into it
#[derive(Debug)]
pub struct MockDataset {
    log: EventLog,
    pub windows: usize,
    pub samples: usize,
    pub normalized: bool,
}

impl CalibrationDataset for MockDataset {
    fn join(&mut self, other: Self) {
        self.log.push(Event::Join);
        self.windows += other.windows;
        self.samples += other.samples;
    }

    fn normalize_to_frequencies(&mut self) {
        self.log.push(Event::Normalize);
        self.normalized = true;
    }
}

/// Analyzer recommending a fixed shaper
pub struct MockAnalyzer {
    log: EventLog,
    pub fail_persist: bool,
}

impl MockAnalyzer {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_persist: false,
        }
    }

    fn persist(&self, path: &str, event: Event) -> Result<(), PersistError> {
        if self.fail_persist {
            return Err(PersistError {
                path: path.to_string(),
                reason: "read-only file system".to_string(),
            });
        }
        self.log.push(event);
        Ok(())
    }
}

impl CalibrationAnalyzer for MockAnalyzer {
    type Samples = MockSamples;
    type Dataset = MockDataset;
    type Shapers = Vec<String>;

    fn process_samples(&mut self, samples: &MockSamples) -> MockDataset {
        self.log.push(Event::Process(samples.count));
        MockDataset {
            log: self.log.clone(),
            windows: 1,
            samples: samples.count,
            normalized: false,
        }
    }

    fn axes_noise(&self, data: &MockDataset) -> AxesNoise {
        let level = data.samples as f64 / 1000.;
        AxesNoise {
            x: level,
            y: level * 2.,
            z: level * 3.,
        }
    }

    fn find_best_shaper(
        &mut self,
        _data: &MockDataset,
        console: &mut dyn Console,
    ) -> ShaperFit<Vec<String>> {
        console.respond_info("Fitted shaper 'mzv' frequency = 48.2 Hz");
        ShaperFit {
            name: "mzv".to_string(),
            freq: 48.34,
            shapers: alloc::vec!["zv".to_string(), "mzv".to_string()],
        }
    }

    fn save_params(&mut self, axis: Axis, shaper_name: &str, shaper_freq: f64) {
        self.log
            .push(Event::SaveParams(axis, shaper_name.to_string(), shaper_freq));
    }

    fn save_calibration_data(
        &mut self,
        path: &str,
        _data: &MockDataset,
        _shapers: Option<&Vec<String>>,
    ) -> Result<(), PersistError> {
        self.persist(path, Event::SaveData(path.to_string()))
    }

    fn save_figure(
        &mut self,
        path: &str,
        _data: &MockDataset,
        _shapers: Option<&Vec<String>>,
        _selected: Option<&str>,
    ) -> Result<(), PersistError> {
        self.persist(path, Event::SaveFigure(path.to_string()))
    }
}

/// Input shaper switch that records toggles
pub struct MockShaper {
    log: EventLog,
}

impl MockShaper {
    pub fn new(log: &EventLog) -> Self {
        Self { log: log.clone() }
    }
}

impl InputShaperControl for MockShaper {
    fn disable_shaping(&mut self) {
        self.log.push(Event::ShaperDisabled);
    }

    fn enable_shaping(&mut self) {
        self.log.push(Event::ShaperEnabled);
    }
}
