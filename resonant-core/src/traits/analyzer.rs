//! Frequency analysis collaborator
//!
//! PSD estimation, shaper search, plotting and CSV export live outside this
//! crate. The tester only feeds samples in, joins the resulting datasets
//! and asks for exports.

use alloc::string::String;

use crate::axis::Axis;
use crate::traits::{Console, PersistError};

/// Mean noise power per accelerometer axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxesNoise {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Result of a shaper search
#[derive(Debug, Clone, PartialEq)]
pub struct ShaperFit<S> {
    /// Recommended shaper type (e.g. "mzv")
    pub name: String,
    /// Recommended shaper frequency in Hz
    pub freq: f64,
    /// Every evaluated shaper, for plotting and export
    pub shapers: S,
}

/// Processed calibration data
pub trait CalibrationDataset {
    /// Fold another dataset into this one
    fn join(&mut self, other: Self)
    where
        Self: Sized;

    /// Normalize the accumulated PSDs before the shaper search
    fn normalize_to_frequencies(&mut self);
}

/// Trait for the calibration analyzer
pub trait CalibrationAnalyzer {
    /// Raw samples accepted by [`CalibrationAnalyzer::process_samples`]
    type Samples;
    /// Processed dataset
    type Dataset: CalibrationDataset;
    /// Evaluated shaper set returned by the search
    type Shapers;

    /// Turn one capture window into a dataset
    fn process_samples(&mut self, samples: &Self::Samples) -> Self::Dataset;

    /// Mean noise levels of a dataset
    fn axes_noise(&self, data: &Self::Dataset) -> AxesNoise;

    /// Search for the best input shaper, reporting candidates to `console`
    fn find_best_shaper(
        &mut self,
        data: &Self::Dataset,
        console: &mut dyn Console,
    ) -> ShaperFit<Self::Shapers>;

    /// Stage the recommended shaper parameters for the printer config
    fn save_params(&mut self, axis: Axis, shaper_name: &str, shaper_freq: f64);

    /// Export the dataset (and evaluated shapers, if any) as CSV
    fn save_calibration_data(
        &mut self,
        path: &str,
        data: &Self::Dataset,
        shapers: Option<&Self::Shapers>,
    ) -> Result<(), PersistError>;

    /// Plot the frequency response to `path`
    fn save_figure(
        &mut self,
        path: &str,
        data: &Self::Dataset,
        shapers: Option<&Self::Shapers>,
        selected: Option<&str>,
    ) -> Result<(), PersistError>;
}
