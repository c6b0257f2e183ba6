//! # Build Types and Length Bounds
//!
//! Arrows (vertical bows) and bolts (crossbows) share the same weight model
//! but use different length domains:
//!
//! | Type  | Selectable lengths | Default |
//! |-------|--------------------|---------|
//! | bolt  | 14.00 - 24.00 in   | 20.00   |
//! | arrow | 20.00 - 34.00 in   | 28.00   |
//!
//! Stored builds are checked against the looser [`STORAGE_RANGE`] of
//! 10 - 40 in and need not sit on the 0.25 in grid.
//!
//! When a caller omits the type, [`BuildType::infer_from_length`] picks one
//! once at creation. A stored type is never re-derived from length.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length at or below which an untyped build is classified as a bolt
pub const BOLT_INFERENCE_MAX_IN: f64 = 24.0;

/// Increment between selectable lengths
pub const LENGTH_STEP_IN: f64 = 0.25;

/// Length bounds enforced on every stored build
pub const STORAGE_RANGE: LengthRange = LengthRange {
    min_in: 10.0,
    max_in: 40.0,
    step_in: None,
};

/// Arrow or crossbow bolt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    #[default]
    Arrow,
    Bolt,
}

impl BuildType {
    /// All build types for UI selection
    pub const ALL: [BuildType; 2] = [BuildType::Arrow, BuildType::Bolt];

    /// Classify an untyped build by its length.
    ///
    /// Only used when a build is created without an explicit type.
    pub fn infer_from_length(length_in: f64) -> Self {
        if length_in <= BOLT_INFERENCE_MAX_IN {
            BuildType::Bolt
        } else {
            BuildType::Arrow
        }
    }

    /// Lengths offered by a length picker for this type
    pub fn presentation_range(&self) -> LengthRange {
        match self {
            BuildType::Bolt => LengthRange {
                min_in: 14.0,
                max_in: 24.0,
                step_in: Some(LENGTH_STEP_IN),
            },
            BuildType::Arrow => LengthRange {
                min_in: 20.0,
                max_in: 34.0,
                step_in: Some(LENGTH_STEP_IN),
            },
        }
    }

    /// Length a fresh or re-clamped build of this type starts at
    pub fn default_length_in(&self) -> f64 {
        match self {
            BuildType::Bolt => 20.0,
            BuildType::Arrow => 28.0,
        }
    }

    /// Every selectable length, ascending
    pub fn length_options(&self) -> Vec<f64> {
        self.presentation_range().options()
    }

    /// Keep `length_in` if it lies in this type's domain, otherwise fall back
    /// to the type's default length.
    ///
    /// Used when a user toggles the build type in an editor.
    pub fn clamp_length(&self, length_in: f64) -> f64 {
        if self.presentation_range().contains(length_in) {
            length_in
        } else {
            self.default_length_in()
        }
    }

    /// Stored (lowercase) name
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Arrow => "arrow",
            BuildType::Bolt => "bolt",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            BuildType::Arrow => "Arrow",
            BuildType::Bolt => "Bolt",
        }
    }

    /// Parse from a case-insensitive name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "arrow" => Some(BuildType::Arrow),
            "bolt" => Some(BuildType::Bolt),
            _ => None,
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// An inclusive length interval in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LengthRange {
    pub min_in: f64,
    pub max_in: f64,
    /// Grid spacing for pickers; `None` for a continuous range
    pub step_in: Option<f64>,
}

impl LengthRange {
    /// Inclusive containment; NaN is never contained
    pub fn contains(&self, length_in: f64) -> bool {
        length_in >= self.min_in && length_in <= self.max_in
    }

    /// Grid points from `min_in` to `max_in` inclusive.
    ///
    /// A continuous range yields just its endpoints.
    pub fn options(&self) -> Vec<f64> {
        match self.step_in {
            Some(step) if step > 0.0 => {
                // count steps with integers so the grid doesn't drift
                let count = ((self.max_in - self.min_in) / step).round() as usize;
                (0..=count).map(|i| self.min_in + step * i as f64).collect()
            }
            _ => vec![self.min_in, self.max_in],
        }
    }
}
