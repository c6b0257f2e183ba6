//! # Export
//!
//! Builds leave the library either as a JSON array (re-importable as drafts)
//! or as a plain-text card for printing.
//!
//! ## Text Format
//!
//! ```text
//! Arrow Build: Elk 2025
//! Type: Arrow
//! Created: 2025-10-01 12:00 UTC
//!
//! Components:
//!   Knock: 15 grains
//!   Tip: 125 grains
//!
//! GPI: 12.5
//! Length: 28"
//! Total Weight: 140 grains
//! ```

use std::fmt::Write as _;

use crate::build::Build;
use crate::errors::{BuildError, BuildResult};

/// Pretty-printed JSON array of builds
pub fn to_json(builds: &[&Build]) -> BuildResult<String> {
    serde_json::to_string_pretty(builds).map_err(BuildError::serialization)
}

/// Plain-text summary of one build.
///
/// A missing or zero GPI prints as `N/A`.
pub fn to_text(build: &Build) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Arrow Build: {}", build.name);
    let _ = writeln!(out, "Type: {}", build.build_type);
    let _ = writeln!(out, "Created: {}", build.created_at.format("%Y-%m-%d %H:%M UTC"));
    out.push('\n');
    out.push_str("Components:\n");
    for component in &build.components {
        let _ = writeln!(out, "  {}: {} grains", component.name, component.grains);
    }
    out.push('\n');
    match build.gpi {
        Some(gpi) if gpi != 0.0 => {
            let _ = writeln!(out, "GPI: {}", gpi);
        }
        _ => out.push_str("GPI: N/A\n"),
    }
    let _ = writeln!(out, "Length: {}\"", build.length_in);
    let _ = writeln!(out, "Total Weight: {} grains", build.total_grains);
    out
}

/// File name for an exported build: `<name>_build.<extension>`, with every
/// character outside `[A-Za-z0-9]` replaced by `_`.
pub fn export_file_name(build: &Build, extension: &str) -> String {
    let stem: String = build
        .name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_build.{}", stem, extension)
}
