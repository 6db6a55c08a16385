//! TOML loader for the `[resonance_tester]` section
//!
//! ```toml
//! [resonance_tester]
//! method = "sine"
//! accel_chip = "adxl345"
//! probe_points = """
//!     100, 100, 20
//!     50, 50, 20
//! """
//! ```
//!
//! `probe_points` may also be given as an array: `[[100, 100, 20]]`.
//! Unknown keys are rejected.

use alloc::string::ToString;

use serde::Deserialize;

use super::types::{ResonanceConfig, ResonanceSection};
use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct Document {
    resonance_tester: ResonanceSection,
}

/// Parse and validate a resonance tester configuration
pub fn parse_config(input: &str) -> Result<ResonanceConfig, ConfigError> {
    let section = parse_section(input)?;
    let config = ResonanceConfig::from_section(&section)?;
    info!(
        "resonance tester config loaded: {} chip(s)",
        config.accel_chips.len()
    );
    Ok(config)
}

/// Parse the raw section without validating it
pub fn parse_section(input: &str) -> Result<ResonanceSection, ConfigError> {
    let document: Document =
        ::toml::from_str(input).map_err(|e| ConfigError::Parse(e.message().to_string()))?;
    Ok(document.resonance_tester)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::Axis;
    use crate::config::{ChipBinding, ProbePoint, TestMethod, TestMethodConfig};

    #[test]
    fn test_parse_sine_config() {
        let config = parse_config(
            r#"
            [resonance_tester]
            method = "sine"
            accel_chip_x = "adxl345 hotend"
            accel_chip_y = "adxl345 bed"
            min_freq = 10
            max_freq = 100.0
            probe_points = """
                100, 100, 20
                50.5, 60
            """
            "#,
        )
        .unwrap();

        assert_eq!(config.method.method(), TestMethod::Sine);
        let TestMethodConfig::Sine(sine) = &config.method else {
            panic!("expected sine test");
        };
        assert_eq!(sine.sweep.min_freq, 10.);
        assert_eq!(sine.sweep.max_freq, 100.);
        assert_eq!(
            sine.sweep.probe_points,
            [
                ProbePoint::xyz(100., 100., 20.),
                ProbePoint::new(&[50.5, 60.]).unwrap()
            ]
        );
        assert_eq!(
            config.accel_chips,
            [
                ChipBinding::new(Axis::X, "adxl345 hotend"),
                ChipBinding::new(Axis::Y, "adxl345 bed"),
            ]
        );
    }

    #[test]
    fn test_parse_probe_point_array() {
        let config = parse_config(
            r#"
            [resonance_tester]
            accel_chip = "adxl345"
            probe_points = [[100, 100, 20], [150.5, 80, 20]]
            "#,
        )
        .unwrap();
        let TestMethodConfig::Pulse(sweep) = &config.method else {
            panic!("expected pulse test");
        };
        assert_eq!(sweep.probe_points.len(), 2);
        assert_eq!(sweep.probe_points[1], ProbePoint::xyz(150.5, 80., 20.));
    }

    #[test]
    fn test_parse_moore_config() {
        let config = parse_config(
            r#"
            [resonance_tester]
            method = "moore"
            accel_chip = "adxl345"
            xmin = 0
            xmax = 100
            ymin = 0
            ymax = 100
            z = 10
            order = 2
            runs = 1
            move_speed = 80
            "#,
        )
        .unwrap();
        assert_eq!(config.move_speed, 80.);
        let TestMethodConfig::Moore(moore) = &config.method else {
            panic!("expected moore test");
        };
        assert_eq!(moore.order, 2);
        assert_eq!(moore.runs, 1);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_section(
            r#"
            [resonance_tester]
            accel_chip = "adxl345"
            sweep_rate = 2
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let err = parse_section(
            r#"
            [resonance_tester]
            method = "chirp"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_section() {
        assert!(matches!(
            parse_config("[printer]\nkinematics = \"corexy\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
