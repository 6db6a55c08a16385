//! Collaborator traits
//!
//! These traits define the interface between the test sequencing logic
//! and the motion queue, accelerometers, analysis and console.

pub mod analyzer;
pub mod console;
pub mod motion;
pub mod sensor;

pub use analyzer::{AxesNoise, CalibrationAnalyzer, CalibrationDataset, ShaperFit};
pub use console::{Clock, Console, InputShaperControl, Timestamp};
pub use motion::{MotionController, MotionError, Position};
pub use sensor::{Accelerometer, PersistError, SampleAggregate, SensorError};
