//! Terminal formatting shared by every command.

use std::fmt;

use anyhow::Result;
use serde::Serialize;

use quiver_core::build::Build;
use quiver_core::calculator::BalanceReport;

/// FOC band considered a good hunting setup, in percent
pub const FOC_GOOD_MIN: f64 = 10.0;
pub const FOC_GOOD_MAX: f64 = 20.0;

/// How a FOC value reads against the 10-20 % target band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocRating {
    Good,
    OutsideTarget,
    Undefined,
}

impl FocRating {
    pub fn of(foc_percent: Option<f64>) -> Self {
        match foc_percent {
            None => FocRating::Undefined,
            Some(foc) if (FOC_GOOD_MIN..=FOC_GOOD_MAX).contains(&foc) => FocRating::Good,
            Some(_) => FocRating::OutsideTarget,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocRating::Good => "good",
            FocRating::OutsideTarget => "outside target",
            FocRating::Undefined => "-",
        }
    }
}

impl fmt::Display for FocRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// `15.74%`, or `-` when undefined
pub fn format_foc(foc_percent: Option<f64>) -> String {
    match foc_percent {
        Some(foc) => format!("{:.2}%", foc),
        None => "-".to_string(),
    }
}

/// `15.74% (good)`, or `-` when undefined
pub fn format_foc_rated(foc_percent: Option<f64>) -> String {
    match FocRating::of(foc_percent) {
        FocRating::Undefined => "-".to_string(),
        rating => format!("{} ({})", format_foc(foc_percent), rating),
    }
}

pub fn format_grains(grains: f64) -> String {
    format!("{:.2} gr", grains)
}

/// First eight characters of a build id
pub fn short_id(build: &Build) -> String {
    build.id.to_string()[..8].to_string()
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_stat(label: &str, value: &str) {
    println!("  {:<14}{}", format!("{}:", label), value);
}

pub fn print_balance(report: &BalanceReport) {
    print_stat("Total", &format_grains(report.total_grains));
    print_stat(
        "Balance point",
        &report
            .balance_point_in
            .map(|p| format!("{:.2}\" from nock", p))
            .unwrap_or_else(|| "-".to_string()),
    );
    print_stat("FOC", &format_foc_rated(report.foc_percent));
}

/// One-line table row for `list`
pub fn build_row(build: &Build) -> String {
    format!(
        "{}  {:<24} {:<6} {:>10} {:>7}\" {:>8}",
        short_id(build),
        truncate(&build.name, 24),
        build.build_type.as_str(),
        format_grains(build.total_grains),
        build.length_in,
        format_foc(build.foc_percent()),
    )
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('~');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foc_rating_band() {
        assert_eq!(FocRating::of(Some(10.0)), FocRating::Good);
        assert_eq!(FocRating::of(Some(15.74)), FocRating::Good);
        assert_eq!(FocRating::of(Some(20.0)), FocRating::Good);
        assert_eq!(FocRating::of(Some(9.99)), FocRating::OutsideTarget);
        assert_eq!(FocRating::of(Some(-3.0)), FocRating::OutsideTarget);
        assert_eq!(FocRating::of(None), FocRating::Undefined);
    }

    #[test]
    fn test_format_foc() {
        assert_eq!(format_foc(Some(15.7407)), "15.74%");
        assert_eq!(format_foc(None), "-");
        assert_eq!(format_foc_rated(Some(25.0)), "25.00% (outside target)");
        assert_eq!(format_foc_rated(None), "-");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Elk", 24), "Elk");
        assert_eq!(truncate("abcdef", 4), "abc~");
    }
}
