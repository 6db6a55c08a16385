//! Command parameters
//!
//! Requests can be built directly or from `KEY=value` pairs as given on a
//! G-code command line. Keys are case-insensitive; unknown keys are
//! ignored.

use alloc::string::{String, ToString};

use crate::error::ConfigError;
use crate::waveform::TestOverrides;

/// Default data file template for `TEST_RESONANCES`
pub const DEFAULT_RESONANCE_CSV: &str = "resonance_data.csv";

/// Default data file template for `SHAPER_CALIBRATE`
pub const DEFAULT_CALIBRATION_CSV: &str = "calibration_data.csv";

/// Default `MEASURE_AXES_NOISE` capture duration (s)
pub const DEFAULT_NOISE_MEAS_TIME: f64 = 2.;

/// `TEST_RESONANCES` parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ResonanceRequest {
    /// Test axis, required when the test supports several
    pub axis: Option<String>,
    pub overrides: TestOverrides,
    /// Figure file template
    pub fig_name: Option<String>,
    /// Data file template
    pub csv_name: String,
    /// Raw sample dump template, one file per chip and point
    pub raw_name: Option<String>,
}

impl Default for ResonanceRequest {
    fn default() -> Self {
        Self {
            axis: None,
            overrides: TestOverrides::default(),
            fig_name: None,
            csv_name: DEFAULT_RESONANCE_CSV.to_string(),
            raw_name: None,
        }
    }
}

impl ResonanceRequest {
    pub fn for_axis(axis: &str) -> Self {
        Self {
            axis: Some(axis.to_string()),
            ..Default::default()
        }
    }

    pub fn from_params<'a, I>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::default();
        for (key, value) in params {
            if request.overrides.apply(key, value)? {
                continue;
            }
            match_key(key, value, "AXIS", &mut request.axis);
            match_key(key, value, "FIG_NAME", &mut request.fig_name);
            match_key(key, value, "RAW_NAME", &mut request.raw_name);
            if key.eq_ignore_ascii_case("CSV_NAME") {
                request.csv_name = value.to_string();
            }
        }
        Ok(request)
    }
}

/// `SHAPER_CALIBRATE` parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrateRequest {
    /// Single axis to calibrate; all supported axes when absent
    pub axis: Option<String>,
    pub overrides: TestOverrides,
    pub fig_name: Option<String>,
    pub csv_name: String,
}

impl Default for CalibrateRequest {
    fn default() -> Self {
        Self {
            axis: None,
            overrides: TestOverrides::default(),
            fig_name: None,
            csv_name: DEFAULT_CALIBRATION_CSV.to_string(),
        }
    }
}

impl CalibrateRequest {
    pub fn from_params<'a, I>(params: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut request = Self::default();
        for (key, value) in params {
            if request.overrides.apply(key, value)? {
                continue;
            }
            match_key(key, value, "AXIS", &mut request.axis);
            match_key(key, value, "FIG_NAME", &mut request.fig_name);
            if key.eq_ignore_ascii_case("CSV_NAME") {
                request.csv_name = value.to_string();
            }
        }
        Ok(request)
    }
}

/// `MEASURE_AXES_NOISE` capture duration from `MEAS_TIME`
pub fn noise_meas_time<'a, I>(params: I) -> Result<f64, ConfigError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut meas_time = DEFAULT_NOISE_MEAS_TIME;
    for (key, value) in params {
        if key.eq_ignore_ascii_case("MEAS_TIME") {
            meas_time = parse_number("MEAS_TIME", value)?;
        }
    }
    Ok(meas_time)
}

impl TestOverrides {
    /// Take a sweep or tour override; false when `key` is not one
    fn apply(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        let (option, slot) = if key.eq_ignore_ascii_case("FREQ_START") {
            ("FREQ_START", &mut self.freq_start)
        } else if key.eq_ignore_ascii_case("FREQ_END") {
            ("FREQ_END", &mut self.freq_end)
        } else if key.eq_ignore_ascii_case("HZ_PER_SEC") {
            ("HZ_PER_SEC", &mut self.hz_per_sec)
        } else if key.eq_ignore_ascii_case("MOVE_SPEED") {
            ("MOVE_SPEED", &mut self.move_speed)
        } else {
            return Ok(false);
        };
        *slot = Some(parse_number(option, value)?);
        Ok(true)
    }
}

fn match_key(key: &str, value: &str, name: &str, slot: &mut Option<String>) {
    if key.eq_ignore_ascii_case(name) {
        *slot = Some(value.to_string());
    }
}

fn parse_number(option: &'static str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ConfigError::InvalidNumber {
            option,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resonance_defaults() {
        let request = ResonanceRequest::from_params(core::iter::empty()).unwrap();
        assert_eq!(request, ResonanceRequest::default());
        assert_eq!(request.csv_name, "resonance_data.csv");
        assert_eq!(CalibrateRequest::default().csv_name, "calibration_data.csv");
    }

    #[test]
    fn test_resonance_params() {
        let request = ResonanceRequest::from_params([
            ("AXIS", "x"),
            ("freq_start", "10"),
            ("FREQ_END", " 60.5 "),
            ("HZ_PER_SEC", "2"),
            ("FIG_NAME", "response.png"),
            ("CSV_NAME", "out.csv"),
            ("RAW_NAME", "raw.csv"),
            ("CHIP", "ignored"),
        ])
        .unwrap();

        assert_eq!(request.axis.as_deref(), Some("x"));
        assert_eq!(
            request.overrides,
            TestOverrides {
                freq_start: Some(10.),
                freq_end: Some(60.5),
                hz_per_sec: Some(2.),
                move_speed: None,
            }
        );
        assert_eq!(request.fig_name.as_deref(), Some("response.png"));
        assert_eq!(request.csv_name, "out.csv");
        assert_eq!(request.raw_name.as_deref(), Some("raw.csv"));
    }

    #[test]
    fn test_calibrate_params() {
        let request =
            CalibrateRequest::from_params([("MOVE_SPEED", "80"), ("axis", "Y")]).unwrap();
        assert_eq!(request.axis.as_deref(), Some("Y"));
        assert_eq!(request.overrides.move_speed, Some(80.));
        assert_eq!(request.csv_name, "calibration_data.csv");
    }

    #[test]
    fn test_bad_number() {
        assert_eq!(
            ResonanceRequest::from_params([("FREQ_END", "fast")]).unwrap_err(),
            ConfigError::InvalidNumber {
                option: "FREQ_END",
                value: "fast".into(),
            }
        );
        assert!(noise_meas_time([("MEAS_TIME", "nan")]).is_err());
    }

    #[test]
    fn test_meas_time() {
        assert_eq!(noise_meas_time(core::iter::empty()).unwrap(), 2.);
        assert_eq!(noise_meas_time([("meas_time", "0.5")]).unwrap(), 0.5);
    }
}
