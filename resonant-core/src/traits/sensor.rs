//! Accelerometer traits

use alloc::string::String;

use thiserror::Error;

/// Errors that can occur with accelerometer capture
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Communication error with the chip (SPI/I2C)
    #[error("communication error")]
    CommunicationError,
    /// Capture started twice
    #[error("measurements already running")]
    AlreadyRunning,
    /// Capture stopped without being started
    #[error("measurements not running")]
    NotRunning,
    /// Samples lost because the host fell behind
    #[error("sample overflow: {0}")]
    Overflow(String),
}

/// Error writing an output file
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("error writing to file '{path}': {reason}")]
pub struct PersistError {
    /// File that could not be written
    pub path: String,
    /// Underlying cause
    pub reason: String,
}

/// Samples captured during one measurement window
///
/// The contents are opaque to the tester; it only checks for emptiness,
/// reports statistics and optionally dumps the raw data.
pub trait SampleAggregate {
    /// True when the window recorded nothing
    fn is_empty(&self) -> bool;

    /// Human-readable statistics summary
    fn stats(&self) -> String;

    /// Write the raw samples to `path`
    fn write_to_file(&self, path: &str) -> Result<(), PersistError>;
}

/// Trait for accelerometer chips
pub trait Accelerometer {
    /// Aggregate returned when a capture window closes
    type Samples: SampleAggregate;

    /// Open a capture window
    fn start_capture(&mut self) -> Result<(), SensorError>;

    /// Close the capture window and collect its samples
    fn stop_capture(&mut self) -> Result<Self::Samples, SensorError>;
}
