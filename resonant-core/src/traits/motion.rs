//! Motion queue trait
//!
//! The toolhead owns lookahead, kinematics and step generation. Tests only
//! append moves, change acceleration limits and wait for the queue.

use alloc::string::String;

use thiserror::Error;

use crate::config::ProbePoint;

/// Toolhead position in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Extruder
    pub e: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    /// Same z/e, new x/y
    pub const fn with_xy(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }

    /// Planar distance to another position
    pub fn xy_distance(&self, other: &Position) -> f64 {
        libm::hypot(self.x - other.x, self.y - other.y)
    }
}

/// Errors reported by the motion queue
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Target outside the machine limits
    #[error("move out of range")]
    OutOfRange,
    /// Axes must be homed before moving
    #[error("must home axis first")]
    NotHomed,
    /// The printer shut down
    #[error("printer is shutdown: {0}")]
    Shutdown(String),
}

/// Trait for the toolhead motion queue
///
/// Moves are queued and may execute well after the call returns. Use
/// [`MotionController::drain`] to wait for the physical motion.
pub trait MotionController {
    /// Commanded position at the tail of the queue
    fn current_position(&self) -> Position;

    /// Queue a straight move to `target` at `speed` mm/s
    fn queue_move(&mut self, target: Position, speed: f64) -> Result<(), MotionError>;

    /// Travel to a probe point outside of a test
    ///
    /// Coordinates missing from the point keep their current value.
    fn move_to(&mut self, point: &ProbePoint, speed: f64) -> Result<(), MotionError>;

    /// Block until all queued motion has been executed
    fn drain(&mut self) -> Result<(), MotionError>;

    /// Insert an idle gap of `seconds` into the queue
    fn delay(&mut self, seconds: f64) -> Result<(), MotionError>;

    /// Set the maximum acceleration and accel-to-decel limits (mm/s^2)
    fn set_velocity_limit(&mut self, accel: f64, accel_to_decel: f64) -> Result<(), MotionError>;

    /// Set the acceleration used for subsequent moves (mm/s^2)
    fn set_acceleration(&mut self, accel: f64) -> Result<(), MotionError>;

    /// Currently requested accel-to-decel limit (mm/s^2)
    fn max_accel_to_decel(&self) -> f64;
}
