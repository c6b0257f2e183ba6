//! # Unit Types
//!
//! Type-safe wrappers for the handful of units an arrow build deals with.
//! These are plain f64 newtypes so JSON stays clean (just numbers).
//!
//! ## Units
//!
//! - Mass: grains (gr), milligrams (mg), grams (g). 1 gr = 64.79891 mg exactly.
//! - Length: inches (in)
//!
//! Builds store raw `f64` fields with a unit suffix (`total_grains`,
//! `length_in`); these wrappers are for conversions at the display edge.
//!
//! ## Example
//!
//! ```rust
//! use quiver_core::units::{Grains, Grams};
//!
//! let total = Grains(565.0);
//! let grams: Grams = total.into();
//! assert!((grams.0 - 36.611).abs() < 1e-3);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// Milligrams per grain (exact, by definition of the grain)
pub const MG_PER_GRAIN: f64 = 64.79891;

// ============================================================================
// Mass Units
// ============================================================================

/// Mass in grains
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grains(pub f64);

/// Mass in milligrams
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Milligrams(pub f64);

/// Mass in grams
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grams(pub f64);

impl From<Grains> for Milligrams {
    fn from(gr: Grains) -> Self {
        Milligrams(gr.0 * MG_PER_GRAIN)
    }
}

impl From<Milligrams> for Grains {
    fn from(mg: Milligrams) -> Self {
        Grains(mg.0 / MG_PER_GRAIN)
    }
}

impl From<Milligrams> for Grams {
    fn from(mg: Milligrams) -> Self {
        Grams(mg.0 / 1000.0)
    }
}

impl From<Grams> for Milligrams {
    fn from(g: Grams) -> Self {
        Milligrams(g.0 * 1000.0)
    }
}

impl From<Grains> for Grams {
    fn from(gr: Grains) -> Self {
        Milligrams::from(gr).into()
    }
}

impl From<Grams> for Grains {
    fn from(g: Grams) -> Self {
        Milligrams::from(g).into()
    }
}

// ============================================================================
// Length Units
// ============================================================================

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl Inches {
    /// Length in centimeters
    pub fn to_cm(self) -> f64 {
        self.0 * 2.54
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Grains);
impl_arithmetic!(Milligrams);
impl_arithmetic!(Grams);
impl_arithmetic!(Inches);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grains_to_milligrams() {
        let mg: Milligrams = Grains(1.0).into();
        assert_eq!(mg.0, MG_PER_GRAIN);
    }

    #[test]
    fn test_grams_roundtrip() {
        let g: Grams = Grains(7000.0).into();
        // 7000 gr is one avoirdupois pound
        assert!((g.0 - 453.59237).abs() < 1e-9);

        let back: Grains = g.into();
        assert!((back.0 - 7000.0).abs() < 1e-9);
    }

    #[test]
    fn test_arithmetic() {
        let a = Grains(125.0);
        let b = Grains(50.0);
        assert_eq!((a + b).0, 175.0);
        assert_eq!((a - b).0, 75.0);
        assert_eq!((b * 2.0).0, 100.0);
        assert_eq!((a / 5.0).0, 25.0);
    }

    #[test]
    fn test_inches_to_cm() {
        assert!((Inches(28.0).to_cm() - 71.12).abs() < 1e-9);
    }

    #[test]
    fn test_serialization() {
        let gr = Grains(565.5);
        let json = serde_json::to_string(&gr).unwrap();
        assert_eq!(json, "565.5");

        let roundtrip: Grains = serde_json::from_str(&json).unwrap();
        assert_eq!(gr, roundtrip);
    }
}
