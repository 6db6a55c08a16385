//! Moore curve tour
//!
//! A closed space-filling tour over the test rectangle. The grid has
//! `2^(order+1)` cells per side; the tour starts at the bottom edge just
//! left of centre, heading +y, and is generated by the L-system
//!
//! ```text
//! axiom: L F L + F + L F L
//! L -> - R F + L F L + F R -
//! R -> + L F - R F R - F L +
//! ```
//!
//! where `F` steps one cell forward, `-` turns left and `+` turns right.
//! Both rules expand to nothing at order 0. The walk is done on integer
//! cells so the tour lands back on its start exactly.

use alloc::vec::Vec;
use core::slice;

use super::{MotionCommand, Progress, TestOverrides, TestStep};
use crate::axis::Axis;
use crate::config::{above, MooreTestConfig, ProbePoint, DEFAULT_MOVE_SPEED};
use crate::error::{ConfigError, ResonanceError};
use crate::traits::Position;

/// Planar tour waypoint (mm)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
}

/// Grid walker for the L-system
struct Turtle {
    cell: (i32, i32),
    heading: (i32, i32),
    cells: Vec<(i32, i32)>,
}

impl Turtle {
    fn left(&mut self) {
        let (dx, dy) = self.heading;
        self.heading = (-dy, dx);
    }

    fn right(&mut self) {
        let (dx, dy) = self.heading;
        self.heading = (dy, -dx);
    }

    fn forward(&mut self) {
        self.cell.0 += self.heading.0;
        self.cell.1 += self.heading.1;
        self.cells.push(self.cell);
    }

    fn rule_l(&mut self, order: u8) {
        if order == 0 {
            return;
        }
        self.left();
        self.rule_r(order - 1);
        self.forward();
        self.right();
        self.rule_l(order - 1);
        self.forward();
        self.rule_l(order - 1);
        self.right();
        self.forward();
        self.rule_r(order - 1);
        self.left();
    }

    fn rule_r(&mut self, order: u8) {
        if order == 0 {
            return;
        }
        self.right();
        self.rule_l(order - 1);
        self.forward();
        self.left();
        self.rule_r(order - 1);
        self.forward();
        self.rule_r(order - 1);
        self.left();
        self.forward();
        self.rule_l(order - 1);
        self.right();
    }
}

/// Precomputed Moore curve waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct MooreCurve {
    start: Waypoint,
    waypoints: Vec<Waypoint>,
}

impl MooreCurve {
    /// Walk the curve for the configured rectangle and order
    pub fn generate(config: &MooreTestConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let order = config.order;
        // cells per side minus one
        let steps = (1u32 << (order + 1)) - 1;
        let xl = (config.xmax - config.xmin) / f64::from(steps);
        let yl = (config.ymax - config.ymin) / f64::from(steps);

        let start_cell = ((1i32 << order) - 1, 0);
        let mut turtle = Turtle {
            cell: start_cell,
            heading: (0, 1),
            cells: Vec::with_capacity(1usize << (2 * (order as usize + 1))),
        };

        turtle.rule_l(order);
        turtle.forward();
        turtle.rule_l(order);
        turtle.right();
        turtle.forward();
        turtle.right();
        turtle.rule_l(order);
        turtle.forward();
        turtle.rule_l(order);
        turtle.cells.push(start_cell);

        let to_mm = |(i, j): (i32, i32)| Waypoint {
            x: config.xmin + xl * f64::from(i),
            y: config.ymin + yl * f64::from(j),
        };
        let waypoints: Vec<Waypoint> = turtle.cells.into_iter().map(to_mm).collect();
        debug!("Moore curve order {}: {} waypoints", order, waypoints.len());

        Ok(Self {
            start: to_mm(start_cell),
            waypoints,
        })
    }

    /// Tour start, also the last waypoint
    pub fn start(&self) -> Waypoint {
        self.start
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Grid steps walked before closing the tour
    pub fn forward_steps(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }
}

/// Steps replaying the tour `runs` times
///
/// Each run is announced, then every waypoint is visited at `speed`,
/// reporting each whole percent of the run reached.
#[derive(Debug, Clone)]
pub struct MooreSteps<'a> {
    waypoints: &'a [Waypoint],
    z: f64,
    e: f64,
    speed: f64,
    runs: u32,
    run: u32,
    index: usize,
    percent: u32,
    pending: Option<TestStep>,
}

impl Iterator for MooreSteps<'_> {
    type Item = TestStep;

    fn next(&mut self) -> Option<TestStep> {
        if let Some(step) = self.pending.take() {
            return Some(step);
        }

        if self.index == self.waypoints.len() {
            if self.run == self.runs || self.waypoints.is_empty() {
                return None;
            }
            self.run += 1;
            self.index = 0;
            self.percent = 0;
            return Some(TestStep::Progress(Progress::MooreRun {
                run: self.run,
                runs: self.runs,
            }));
        }

        let point = self.waypoints[self.index];
        self.index += 1;
        let percent = (self.index * 100 / self.waypoints.len()) as u32;
        if percent != self.percent {
            self.percent = percent;
            self.pending = Some(TestStep::Progress(Progress::MoorePercent(percent)));
        }
        Some(TestStep::Move(MotionCommand {
            target: Position::new(point.x, point.y, self.z, self.e),
            speed: self.speed,
        }))
    }
}

/// Moore curve tour test
#[derive(Debug, Clone)]
pub struct MooreCurveTest {
    config: MooreTestConfig,
    curve: MooreCurve,
    start_point: ProbePoint,
    speed: f64,
}

impl MooreCurveTest {
    pub const SUPPORTED_AXES: &'static [Axis] = &[Axis::Xy];

    /// Validate the parameters and precompute the tour
    pub fn new(config: MooreTestConfig) -> Result<Self, ConfigError> {
        let curve = MooreCurve::generate(&config)?;
        let start = curve.start();
        Ok(Self {
            start_point: ProbePoint::xyz(start.x, start.y, config.z),
            config,
            curve,
            speed: DEFAULT_MOVE_SPEED,
        })
    }

    pub fn config(&self) -> &MooreTestConfig {
        &self.config
    }

    pub fn curve(&self) -> &MooreCurve {
        &self.curve
    }

    /// Tour speed for the next run (mm/s)
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// The tour start, as the single probe point
    pub fn start_points(&self) -> &[ProbePoint] {
        slice::from_ref(&self.start_point)
    }

    /// Pick the tour speed for this command
    pub fn prepare(&mut self, overrides: &TestOverrides) -> Result<(), ResonanceError> {
        let speed = overrides.move_speed.unwrap_or(DEFAULT_MOVE_SPEED);
        self.speed = above("MOVE_SPEED", speed, 0.)?;
        Ok(())
    }

    /// Steps for the configured runs, keeping the current z and extruder
    pub fn steps(&self, current: Position) -> MooreSteps<'_> {
        MooreSteps {
            waypoints: self.curve.waypoints(),
            z: current.z,
            e: current.e,
            speed: self.speed,
            runs: self.config.runs,
            run: 0,
            index: self.curve.waypoints().len(),
            percent: 0,
            pending: None,
        }
    }
}
