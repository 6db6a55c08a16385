//! Configuration type definitions
//!
//! [`ResonanceSection`] mirrors the raw `[resonance_tester]` options as
//! written by the user. [`ResonanceConfig`] is the validated form the tester
//! is built from.

use alloc::string::String;
use alloc::vec::Vec;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::check::{above, at_least, at_most, within};
use super::probe::{parse_probe_points, ProbePoint};
use crate::axis::Axis;
use crate::error::ConfigError;

/// Default travel speed between probe points (mm/s)
pub const DEFAULT_MOVE_SPEED: f64 = 50.;

/// Default sine sweep segment duration (s)
pub const DEFAULT_SEG_SEC: f64 = 0.0005;

/// Lowest test frequency accepted (Hz)
pub const MIN_TEST_FREQ: f64 = 1.;

/// Highest test frequency accepted (Hz)
pub const MAX_TEST_FREQ: f64 = 200.;

/// Default sweep start frequency (Hz)
pub const DEFAULT_MIN_FREQ: f64 = 5.;

/// Default sweep end frequency (Hz)
pub const DEFAULT_MAX_FREQ: f64 = 120.;

/// Default acceleration per test frequency (mm/s^2 per Hz)
pub const DEFAULT_ACCEL_PER_HZ: f64 = 75.;

/// Default sweep rate (Hz/s)
pub const DEFAULT_HZ_PER_SEC: f64 = 1.;

/// Configurable sweep rate range (Hz/s)
pub const MIN_HZ_PER_SEC: f64 = 0.1;
pub const MAX_HZ_PER_SEC: f64 = 2.;

/// Moore curve order limits
pub const DEFAULT_MOORE_ORDER: u8 = 3;
pub const MAX_MOORE_ORDER: u8 = 8;

/// Default number of Moore curve traversals per test
pub const DEFAULT_MOORE_RUNS: u32 = 3;

/// Excitation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TestMethod {
    /// Triangular velocity pulses of rising frequency
    #[default]
    Pulse,
    /// Continuous sine sweep
    Sine,
    /// Closed Moore curve tour over a rectangle
    Moore,
}

impl TestMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            TestMethod::Pulse => "pulse",
            TestMethod::Sine => "sine",
            TestMethod::Moore => "moore",
        }
    }
}

impl FromStr for TestMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pulse" => Ok(TestMethod::Pulse),
            "sine" => Ok(TestMethod::Sine),
            "moore" => Ok(TestMethod::Moore),
            other => Err(ConfigError::InvalidChoice {
                option: "method",
                value: other.into(),
            }),
        }
    }
}

/// `probe_points` as written: newline separated text or a list of points
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ProbePointsOption {
    Text(String),
    List(Vec<Vec<f64>>),
}

impl ProbePointsOption {
    pub fn to_points(&self) -> Result<Vec<ProbePoint>, ConfigError> {
        match self {
            ProbePointsOption::Text(text) => parse_probe_points(text),
            ProbePointsOption::List(list) => list
                .iter()
                .map(|coords| {
                    ProbePoint::new(coords).ok_or_else(|| ConfigError::InvalidProbePoints {
                        entry: alloc::format!("{:?}", coords),
                    })
                })
                .collect(),
        }
    }
}

/// Raw `[resonance_tester]` options
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ResonanceSection {
    pub method: Option<TestMethod>,
    pub move_speed: Option<f64>,
    pub accel_chip: Option<String>,
    pub accel_chip_x: Option<String>,
    pub accel_chip_y: Option<String>,
    // sine / pulse
    pub seg_sec: Option<f64>,
    pub min_freq: Option<f64>,
    pub max_freq: Option<f64>,
    pub accel_per_hz: Option<f64>,
    pub hz_per_sec: Option<f64>,
    pub probe_points: Option<ProbePointsOption>,
    // moore
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
    pub z: Option<f64>,
    pub order: Option<i64>,
    pub runs: Option<i64>,
}

/// Frequency sweep parameters shared by the sine and pulse tests
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepConfig {
    /// Sweep start frequency (Hz)
    pub min_freq: f64,
    /// Sweep end frequency (Hz)
    pub max_freq: f64,
    /// Acceleration per test frequency (mm/s^2 per Hz)
    pub accel_per_hz: f64,
    /// Sweep rate (Hz/s)
    pub hz_per_sec: f64,
    /// Where the test is executed
    pub probe_points: Vec<ProbePoint>,
}

impl SweepConfig {
    /// Sweep with default frequencies at the given points
    pub fn with_points(probe_points: Vec<ProbePoint>) -> Self {
        Self {
            min_freq: DEFAULT_MIN_FREQ,
            max_freq: DEFAULT_MAX_FREQ,
            accel_per_hz: DEFAULT_ACCEL_PER_HZ,
            hz_per_sec: DEFAULT_HZ_PER_SEC,
            probe_points,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        at_least("min_freq", self.min_freq, MIN_TEST_FREQ)?;
        at_least("max_freq", self.max_freq, self.min_freq)?;
        at_most("max_freq", self.max_freq, MAX_TEST_FREQ)?;
        above("accel_per_hz", self.accel_per_hz, 0.)?;
        within("hz_per_sec", self.hz_per_sec, MIN_HZ_PER_SEC, MAX_HZ_PER_SEC)?;
        if self.probe_points.is_empty() {
            return Err(ConfigError::NoProbePoints);
        }
        Ok(())
    }
}

/// Sine sweep test parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SineTestConfig {
    /// Duration of one generated move (s)
    pub seg_sec: f64,
    pub sweep: SweepConfig,
}

impl SineTestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        above("seg_sec", self.seg_sec, 0.)?;
        self.sweep.validate()
    }
}

/// Moore curve test parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MooreTestConfig {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    /// Height the tour runs at
    pub z: f64,
    /// Curve order, 0..=8
    pub order: u8,
    /// Traversals per test
    pub runs: u32,
}

impl MooreTestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        above("xmax", self.xmax, self.xmin)?;
        above("ymax", self.ymax, self.ymin)?;
        at_most("order", f64::from(self.order), f64::from(MAX_MOORE_ORDER))?;
        at_least("runs", f64::from(self.runs), 1.)?;
        Ok(())
    }
}

/// Selected excitation method with its parameters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestMethodConfig {
    Pulse(SweepConfig),
    Sine(SineTestConfig),
    Moore(MooreTestConfig),
}

impl TestMethodConfig {
    pub fn method(&self) -> TestMethod {
        match self {
            TestMethodConfig::Pulse(_) => TestMethod::Pulse,
            TestMethodConfig::Sine(_) => TestMethod::Sine,
            TestMethodConfig::Moore(_) => TestMethod::Moore,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            TestMethodConfig::Pulse(sweep) => sweep.validate(),
            TestMethodConfig::Sine(sine) => sine.validate(),
            TestMethodConfig::Moore(moore) => moore.validate(),
        }
    }
}

/// Accelerometer chip name bound to an axis
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChipBinding {
    pub axis: Axis,
    pub name: String,
}

impl ChipBinding {
    pub fn new(axis: Axis, name: &str) -> Self {
        Self {
            axis,
            name: name.into(),
        }
    }
}

/// Resolve the chip options into axis bindings
///
/// A single `accel_chip` serves both axes. Dedicated `accel_chip_x` and
/// `accel_chip_y` naming the same chip collapse into one `xy` binding.
pub fn resolve_chip_bindings(
    accel_chip: Option<&str>,
    accel_chip_x: Option<&str>,
    accel_chip_y: Option<&str>,
) -> Result<Vec<ChipBinding>, ConfigError> {
    fn non_empty(name: Option<&str>) -> Option<&str> {
        name.map(str::trim).filter(|n| !n.is_empty())
    }

    let Some(chip_x) = non_empty(accel_chip_x) else {
        let chip = non_empty(accel_chip).ok_or(ConfigError::Missing {
            option: "accel_chip",
        })?;
        return Ok(alloc::vec![ChipBinding::new(Axis::Xy, chip)]);
    };
    let chip_y = non_empty(accel_chip_y).ok_or(ConfigError::Missing {
        option: "accel_chip_y",
    })?;

    if chip_x == chip_y {
        Ok(alloc::vec![ChipBinding::new(Axis::Xy, chip_x)])
    } else {
        Ok(alloc::vec![
            ChipBinding::new(Axis::X, chip_x),
            ChipBinding::new(Axis::Y, chip_y),
        ])
    }
}

/// Validated resonance tester configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResonanceConfig {
    /// Travel speed to probe points (mm/s)
    pub move_speed: f64,
    pub method: TestMethodConfig,
    pub accel_chips: Vec<ChipBinding>,
}

impl ResonanceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        above("move_speed", self.move_speed, 0.)?;
        if self.accel_chips.is_empty() {
            return Err(ConfigError::Missing {
                option: "accel_chip",
            });
        }
        self.method.validate()
    }

    /// Build and validate from the raw section
    pub fn from_section(section: &ResonanceSection) -> Result<Self, ConfigError> {
        let method = match section.method.unwrap_or_default() {
            TestMethod::Pulse => TestMethodConfig::Pulse(sweep_from_section(section)?),
            TestMethod::Sine => TestMethodConfig::Sine(SineTestConfig {
                seg_sec: section.seg_sec.unwrap_or(DEFAULT_SEG_SEC),
                sweep: sweep_from_section(section)?,
            }),
            TestMethod::Moore => TestMethodConfig::Moore(moore_from_section(section)?),
        };

        let config = Self {
            move_speed: section.move_speed.unwrap_or(DEFAULT_MOVE_SPEED),
            method,
            accel_chips: resolve_chip_bindings(
                section.accel_chip.as_deref(),
                section.accel_chip_x.as_deref(),
                section.accel_chip_y.as_deref(),
            )?,
        };
        config.validate()?;
        Ok(config)
    }
}

fn required(option: &'static str, value: Option<f64>) -> Result<f64, ConfigError> {
    value.ok_or(ConfigError::Missing { option })
}

fn sweep_from_section(section: &ResonanceSection) -> Result<SweepConfig, ConfigError> {
    let probe_points = section
        .probe_points
        .as_ref()
        .ok_or(ConfigError::Missing {
            option: "probe_points",
        })?
        .to_points()?;

    Ok(SweepConfig {
        min_freq: section.min_freq.unwrap_or(DEFAULT_MIN_FREQ),
        max_freq: section.max_freq.unwrap_or(DEFAULT_MAX_FREQ),
        accel_per_hz: section.accel_per_hz.unwrap_or(DEFAULT_ACCEL_PER_HZ),
        hz_per_sec: section.hz_per_sec.unwrap_or(DEFAULT_HZ_PER_SEC),
        probe_points,
    })
}

fn moore_from_section(section: &ResonanceSection) -> Result<MooreTestConfig, ConfigError> {
    let order = section.order.unwrap_or(i64::from(DEFAULT_MOORE_ORDER));
    let order = within("order", order as f64, 0., f64::from(MAX_MOORE_ORDER))? as u8;
    let runs = section.runs.unwrap_or(i64::from(DEFAULT_MOORE_RUNS));
    let runs = within("runs", runs as f64, 1., f64::from(u32::MAX))? as u32;

    Ok(MooreTestConfig {
        xmin: required("xmin", section.xmin)?,
        xmax: required("xmax", section.xmax)?,
        ymin: required("ymin", section.ymin)?,
        ymax: required("ymax", section.ymax)?,
        z: required("z", section.z)?,
        order,
        runs,
    })
}
