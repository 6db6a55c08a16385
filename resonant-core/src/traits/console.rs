//! Operator console, wall clock and input shaper switch

use core::fmt;

/// Trait for the command console
///
/// Receives progress and result messages for the operator.
pub trait Console {
    /// Print an informational line
    fn respond_info(&mut self, msg: &str);
}

/// Wall-clock time used for output file names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl fmt::Display for Timestamp {
    /// `YYYYMMDD_HHMMSS`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}_{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Trait for a local wall clock
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Trait for the printer's input shaper
///
/// Shaping is switched off while calibrating so the test moves reach the
/// toolhead unfiltered.
pub trait InputShaperControl {
    fn disable_shaping(&mut self);
    fn enable_shaping(&mut self);
}
