//! Resonance test orchestration
//!
//! Implements the `TEST_RESONANCES`, `SHAPER_CALIBRATE` and
//! `MEASURE_AXES_NOISE` commands on top of the collaborator traits.
//!
//! Every test run follows the same bracket at each probe point:
//!
//! ```text
//! move to point -> drain -> dwell 0.5 s -> start chips -> run test
//!   -> stop chips -> report stats -> check samples -> process -> join
//! ```
//!
//! Any failure aborts the whole command. Samples are checked for every chip
//! of a window before any of them is processed, so an empty capture never
//! reaches the dataset.

pub mod output;
pub mod request;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

pub use output::{output_filename, OUTPUT_DIR};
pub use request::{noise_meas_time, CalibrateRequest, ResonanceRequest};

use crate::axis::{chips_for_axis, AccelChip, Axis};
use crate::config::{above, ChipBinding, ProbePoint, ResonanceConfig};
use crate::error::{ConfigError, ResonanceError};
use crate::traits::{
    Accelerometer, AxesNoise, CalibrationAnalyzer, CalibrationDataset, Clock, Console,
    InputShaperControl, MotionController, SampleAggregate,
};
use crate::waveform::VibrationTest;
use request::DEFAULT_NOISE_MEAS_TIME;

/// Dwell between draining the queue and opening a capture window (s)
pub const SETTLE_TIME_S: f64 = 0.5;

/// Recommended shaper for one axis
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShaperRecommendation {
    pub axis: Axis,
    pub shaper_type: String,
    /// Hz
    pub shaper_freq: f64,
}

/// Noise levels measured by one chip
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoiseReport {
    /// Axis the chip is bound to
    pub axis: Axis,
    pub chip: String,
    pub noise: AxesNoise,
}

/// Look up the configured chips by name
pub fn connect_chips<A, F>(
    bindings: &[ChipBinding],
    mut lookup: F,
) -> Result<Vec<AccelChip<A>>, ConfigError>
where
    F: FnMut(&str) -> Option<A>,
{
    bindings
        .iter()
        .map(|binding| {
            let sensor = lookup(&binding.name).ok_or_else(|| ConfigError::InvalidChoice {
                option: "accel_chip",
                value: binding.name.clone(),
            })?;
            Ok(AccelChip::new(binding.axis, &binding.name, sensor))
        })
        .collect()
}

/// Fold `data` into the accumulator, keeping insertion order
fn accumulate<D: CalibrationDataset>(acc: &mut Option<D>, data: D) {
    match acc {
        Some(existing) => existing.join(data),
        None => *acc = Some(data),
    }
}

/// Resonance tester
///
/// Owns the toolhead, the accelerometer chips, the operator console and a
/// wall clock, plus the test method selected by the configuration.
pub struct ResonanceTester<M, A, C, K> {
    toolhead: M,
    chips: Vec<AccelChip<A>>,
    console: C,
    clock: K,
    test: VibrationTest,
    move_speed: f64,
}

impl<M, A, C, K> ResonanceTester<M, A, C, K>
where
    M: MotionController,
    A: Accelerometer,
    C: Console,
    K: Clock,
{
    /// Build a tester from a validated configuration and connected chips
    pub fn new(
        config: &ResonanceConfig,
        toolhead: M,
        chips: Vec<AccelChip<A>>,
        console: C,
        clock: K,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let test = VibrationTest::from_config(&config.method)?;
        if test.start_points().is_empty() {
            return Err(ConfigError::NoProbePoints);
        }
        if chips.is_empty() {
            return Err(ConfigError::Missing {
                option: "accel_chip",
            });
        }
        info!(
            "resonance tester ready: {} test, {} chip(s), {} point(s)",
            test.method().as_str(),
            chips.len(),
            test.start_points().len()
        );

        Ok(Self {
            toolhead,
            chips,
            console,
            clock,
            test,
            move_speed: config.move_speed,
        })
    }

    /// Build a tester, resolving the configured chip names with `lookup`
    pub fn connect<F>(
        config: &ResonanceConfig,
        toolhead: M,
        lookup: F,
        console: C,
        clock: K,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(&str) -> Option<A>,
    {
        let chips = connect_chips(&config.accel_chips, lookup)?;
        Self::new(config, toolhead, chips, console, clock)
    }

    pub fn test(&self) -> &VibrationTest {
        &self.test
    }

    pub fn chips(&self) -> &[AccelChip<A>] {
        &self.chips
    }

    pub fn toolhead(&self) -> &M {
        &self.toolhead
    }

    pub fn toolhead_mut(&mut self) -> &mut M {
        &mut self.toolhead
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    /// `TEST_RESONANCES`: excite one axis at every probe point
    ///
    /// Returns the dataset joined over all points and chips, after writing
    /// it (and the optional figure) to disk.
    pub fn test_resonances<Z>(
        &mut self,
        analyzer: &mut Z,
        request: &ResonanceRequest,
    ) -> Result<Z::Dataset, ResonanceError>
    where
        Z: CalibrationAnalyzer<Samples = A::Samples>,
    {
        let result = self.run_test_resonances(analyzer, request);
        if let Err(e) = &result {
            warn!("TEST_RESONANCES aborted: {}", e);
        }
        result
    }

    fn run_test_resonances<Z>(
        &mut self,
        analyzer: &mut Z,
        request: &ResonanceRequest,
    ) -> Result<Z::Dataset, ResonanceError>
    where
        Z: CalibrationAnalyzer<Samples = A::Samples>,
    {
        let axis = self.resolve_test_axis(request.axis.as_deref())?;
        let chips = self.chips_serving(axis)?;
        self.test.prepare(&mut self.toolhead, &request.overrides)?;

        let points = self.test.start_points().to_vec();
        let multi_point = points.len() > 1;
        let mut data = None;
        for point in &points {
            self.move_to_point(point, multi_point)?;
            let window = self.test_window(
                analyzer,
                axis,
                &chips,
                point,
                multi_point,
                request.raw_name.as_deref(),
            )?;
            accumulate(&mut data, window);
        }
        let data = data.ok_or(ConfigError::NoProbePoints)?;

        if let Some(fig_name) = &request.fig_name {
            let path = self.output_path(fig_name, axis);
            analyzer.save_figure(&path, &data, None, None)?;
        }
        let path = self.output_path(&request.csv_name, axis);
        analyzer.save_calibration_data(&path, &data, None)?;
        info!("resonance data written to {}", path.as_str());
        Ok(data)
    }

    /// `SHAPER_CALIBRATE`: measure each axis and pick an input shaper
    ///
    /// The input shaper, when given, is disabled for the measurement and
    /// re-enabled afterwards, also when the command fails.
    pub fn shaper_calibrate<Z>(
        &mut self,
        analyzer: &mut Z,
        mut input_shaper: Option<&mut dyn InputShaperControl>,
        request: &CalibrateRequest,
    ) -> Result<Vec<ShaperRecommendation>, ResonanceError>
    where
        Z: CalibrationAnalyzer<Samples = A::Samples>,
    {
        let axes = self.resolve_calibration_axes(request.axis.as_deref())?;
        let chips = axes
            .iter()
            .map(|&axis| self.chips_serving(axis))
            .collect::<Result<Vec<_>, _>>()?;
        self.test.prepare(&mut self.toolhead, &request.overrides)?;

        if let Some(shaper) = input_shaper.as_deref_mut() {
            shaper.disable_shaping();
            self.console
                .respond_info("Disabled [input_shaper] for calibration");
        }

        let result = self.run_shaper_calibrate(analyzer, &axes, &chips, request);

        if let Some(shaper) = input_shaper {
            shaper.enable_shaping();
            self.console
                .respond_info("Re-enabled [input_shaper] after calibration");
        }
        if let Err(e) = &result {
            warn!("SHAPER_CALIBRATE aborted: {}", e);
        }
        result
    }

    fn run_shaper_calibrate<Z>(
        &mut self,
        analyzer: &mut Z,
        axes: &[Axis],
        chips: &[Vec<usize>],
        request: &CalibrateRequest,
    ) -> Result<Vec<ShaperRecommendation>, ResonanceError>
    where
        Z: CalibrationAnalyzer<Samples = A::Samples>,
    {
        let points = self.test.start_points().to_vec();
        let multi_point = points.len() > 1;
        let mut data: Vec<Option<Z::Dataset>> = axes.iter().map(|_| None).collect();

        for point in &points {
            self.move_to_point(point, multi_point)?;
            for ((&axis, chips), acc) in axes.iter().zip(chips).zip(data.iter_mut()) {
                let window = self.test_window(analyzer, axis, chips, point, multi_point, None)?;
                accumulate(acc, window);
            }
        }

        let mut recommendations = Vec::with_capacity(axes.len());
        for (&axis, data) in axes.iter().zip(data) {
            let mut data = data.ok_or(ConfigError::NoProbePoints)?;
            self.console.respond_info(&format!(
                "Calculating the best input shaper parameters for {} axis",
                axis
            ));
            data.normalize_to_frequencies();
            let fit = analyzer.find_best_shaper(&data, &mut self.console);
            self.console.respond_info(&format!(
                "Recommended shaper_type_{axis} = {}, shaper_freq_{axis} = {:.1} Hz",
                fit.name, fit.freq
            ));
            analyzer.save_params(axis, &fit.name, fit.freq);

            if let Some(fig_name) = &request.fig_name {
                let path = self.output_path(fig_name, axis);
                analyzer.save_figure(&path, &data, Some(&fit.shapers), Some(&fit.name))?;
            }
            let path = self.output_path(&request.csv_name, axis);
            analyzer.save_calibration_data(&path, &data, Some(&fit.shapers))?;

            info!("axis {}: {} at {} Hz", axis.as_str(), fit.name.as_str(), fit.freq);
            recommendations.push(ShaperRecommendation {
                axis,
                shaper_type: fit.name,
                shaper_freq: fit.freq,
            });
        }

        self.console.respond_info(
            "The SAVE_CONFIG command will update the printer config file\n\
             with these parameters and restart the printer.",
        );
        Ok(recommendations)
    }

    /// `MEASURE_AXES_NOISE`: record all chips while the toolhead stands still
    pub fn measure_axes_noise<Z>(
        &mut self,
        analyzer: &mut Z,
        meas_time: Option<f64>,
    ) -> Result<Vec<NoiseReport>, ResonanceError>
    where
        Z: CalibrationAnalyzer<Samples = A::Samples>,
    {
        let meas_time = above(
            "MEAS_TIME",
            meas_time.unwrap_or(DEFAULT_NOISE_MEAS_TIME),
            0.,
        )?;
        let chips: Vec<usize> = (0..self.chips.len()).collect();
        let captures = self.capture(&chips, |tester| {
            tester.toolhead.delay(meas_time)?;
            Ok(())
        })?;
        self.check_samples(&captures, None)?;

        let mut reports = Vec::with_capacity(captures.len());
        for (i, samples) in &captures {
            let data = analyzer.process_samples(samples);
            let noise = analyzer.axes_noise(&data);
            let chip = &self.chips[*i];
            self.console.respond_info(&format!(
                "Axes noise for {}-axis accelerometer: {:.6} (x), {:.6} (y), {:.6} (z)",
                chip.axis, noise.x, noise.y, noise.z
            ));
            reports.push(NoiseReport {
                axis: chip.axis,
                chip: chip.name.clone(),
                noise,
            });
        }
        Ok(reports)
    }

    /// Axis for `TEST_RESONANCES`; may only be omitted for single-axis tests
    fn resolve_test_axis(&self, requested: Option<&str>) -> Result<Axis, ResonanceError> {
        let supported = self.test.supported_axes();
        let axis = match requested {
            Some(tag) => tag.parse()?,
            None => match supported {
                [only] => *only,
                _ => return Err(ResonanceError::MissingAxis),
            },
        };
        self.test.check_axis(axis)?;
        Ok(axis)
    }

    /// Axes for `SHAPER_CALIBRATE`; all supported axes when none requested
    fn resolve_calibration_axes(&self, requested: Option<&str>) -> Result<Vec<Axis>, ResonanceError> {
        match requested.map(str::trim).filter(|tag| !tag.is_empty()) {
            None => Ok(self.test.supported_axes().to_vec()),
            Some(tag) => {
                let axis = tag.parse()?;
                self.test.check_axis(axis)?;
                Ok(alloc::vec![axis])
            }
        }
    }

    fn chips_serving(&self, axis: Axis) -> Result<Vec<usize>, ResonanceError> {
        let chips = chips_for_axis(&self.chips, axis);
        if chips.is_empty() {
            return Err(ResonanceError::NoChipForAxis(axis));
        }
        Ok(chips)
    }

    fn move_to_point(&mut self, point: &ProbePoint, announce: bool) -> Result<(), ResonanceError> {
        self.toolhead.move_to(point, self.move_speed)?;
        if announce {
            self.console
                .respond_info(&format!("Probing point {}", point));
        }
        info!("probing point ({}, {})", point.x, point.y);
        Ok(())
    }

    /// One settle + capture bracket around a test run along `axis`
    fn test_window<Z>(
        &mut self,
        analyzer: &mut Z,
        axis: Axis,
        chips: &[usize],
        point: &ProbePoint,
        multi_point: bool,
        raw_name: Option<&str>,
    ) -> Result<Z::Dataset, ResonanceError>
    where
        Z: CalibrationAnalyzer<Samples = A::Samples>,
    {
        self.toolhead.drain()?;
        self.toolhead.delay(SETTLE_TIME_S)?;
        self.console
            .respond_info(&format!("Testing axis {}", axis.as_str().to_ascii_uppercase()));

        let captures = self.capture(chips, |tester| {
            tester
                .test
                .run(&mut tester.toolhead, axis, &mut tester.console)?;
            Ok(())
        })?;
        self.check_samples(&captures, Some(point))?;

        if let Some(template) = raw_name {
            let point = multi_point.then_some(point);
            for (i, samples) in &captures {
                // Chips sharing a window are told apart by their own axis
                let tag = if captures.len() > 1 {
                    self.chips[*i].axis
                } else {
                    axis
                };
                let path = output_filename(template, Some(tag), point, &self.clock.now());
                samples.write_to_file(&path)?;
            }
        }

        let mut data = None;
        for (_, samples) in &captures {
            accumulate(&mut data, analyzer.process_samples(samples));
        }
        data.ok_or(ResonanceError::NoChipForAxis(axis))
    }

    /// Open a capture window on `chips`, run `during`, then close it
    ///
    /// Chips that were started are always stopped again; the first error
    /// wins.
    fn capture<F>(
        &mut self,
        chips: &[usize],
        during: F,
    ) -> Result<Vec<(usize, A::Samples)>, ResonanceError>
    where
        F: FnOnce(&mut Self) -> Result<(), ResonanceError>,
    {
        let mut result = Ok(());
        let mut started = 0;
        for &i in chips {
            let chip = &mut self.chips[i];
            if let Err(source) = chip.sensor.start_capture() {
                result = Err(ResonanceError::Sensor {
                    chip: chip.name.clone(),
                    source,
                });
                break;
            }
            started += 1;
        }
        debug!("capture window open on {} chip(s)", started);

        if result.is_ok() {
            result = during(self);
        }

        let mut captures = Vec::with_capacity(started);
        for &i in &chips[..started] {
            let chip = &mut self.chips[i];
            match chip.sensor.stop_capture() {
                Ok(samples) => captures.push((i, samples)),
                Err(source) => {
                    if result.is_ok() {
                        result = Err(ResonanceError::Sensor {
                            chip: chip.name.clone(),
                            source,
                        });
                    }
                }
            }
        }
        debug!("capture window closed");
        result.map(|()| captures)
    }

    /// Report per-chip stats, then fail on the first empty capture
    fn check_samples(
        &mut self,
        captures: &[(usize, A::Samples)],
        point: Option<&ProbePoint>,
    ) -> Result<(), ResonanceError> {
        for (i, samples) in captures {
            self.console.respond_info(&format!(
                "{}-axis accelerometer stats: {}",
                self.chips[*i].axis,
                samples.stats()
            ));
        }
        match captures.iter().find(|(_, samples)| samples.is_empty()) {
            Some((i, _)) => {
                let chip = &self.chips[*i];
                Err(ResonanceError::EmptyMeasurement {
                    chip_axis: chip.axis,
                    chip: chip.name.clone(),
                    point: point.copied(),
                })
            }
            None => Ok(()),
        }
    }

    fn output_path(&self, template: &str, axis: Axis) -> String {
        output_filename(template, Some(axis), None, &self.clock.now())
    }
}
