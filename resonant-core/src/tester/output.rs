//! Output file naming
//!
//! A user template such as `resonances.csv` becomes
//! `/tmp/resonances_x_100.000_50.000_20240309_140507.csv`: directory parts
//! are dropped, then the axis, probe point and timestamp are appended to
//! the base name.

use alloc::format;
use alloc::string::String;
use core::fmt::Write;

use crate::axis::Axis;
use crate::config::ProbePoint;
use crate::traits::Timestamp;

/// Directory all output files are written to
pub const OUTPUT_DIR: &str = "/tmp";

/// Build an output path from a name template
pub fn output_filename(
    template: &str,
    axis: Option<Axis>,
    point: Option<&ProbePoint>,
    stamp: &Timestamp,
) -> String {
    let name = file_name(template);
    let (base, ext) = split_extension(name);

    let mut out = format!("{}/{}", OUTPUT_DIR, base);
    // Writing to a String cannot fail
    if let Some(axis) = axis {
        let _ = write!(out, "_{}", axis);
    }
    if let Some(point) = point {
        let _ = write!(out, "_{:.3}_{:.3}", point.x, point.y);
    }
    let _ = write!(out, "_{}{}", stamp, ext);
    out
}

/// Last path component, ignoring trailing separators
fn file_name(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Split `name` into base and extension (with its dot)
///
/// Leading dots belong to the base, so `.hidden` has no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if name[..i].chars().any(|c| c != '.') => name.split_at(i),
        _ => (name, ""),
    }
}
