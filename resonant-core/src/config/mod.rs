//! Configuration types
//!
//! Board-agnostic configuration for the resonance tester, loaded from the
//! `[resonance_tester]` TOML section.

mod check;
pub mod probe;
#[cfg(feature = "toml")]
pub mod toml;
pub mod types;

pub(crate) use check::{above, at_least, at_most};
pub use probe::{parse_probe_points, ProbePoint};
#[cfg(feature = "toml")]
pub use self::toml::parse_config;
pub use types::*;
