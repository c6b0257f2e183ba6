//! # Build Comparison
//!
//! Side-by-side figures for up to [`MAX_COMPARE`] builds, with a shared
//! scale per metric so bar charts of different builds line up.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::build::Build;
use crate::build_type::BuildType;
use crate::calculator::ComponentWeights;
use crate::component::ComponentName;
use crate::errors::{BuildError, BuildResult};

/// Most builds a single comparison accepts
pub const MAX_COMPARE: usize = 8;

/// One build's figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub id: Uuid,
    pub name: String,
    pub build_type: BuildType,
    pub length_in: f64,
    pub total_grains: f64,
    /// Rounded to one decimal; `None` for a weightless build
    pub foc_percent: Option<f64>,
    pub weights: ComponentWeights,
}

/// Chart maxima, each at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonScales {
    pub total_grains: f64,
    pub foc_percent: f64,
    pub components: ComponentWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub rows: Vec<ComparisonRow>,
    pub scales: ComparisonScales,
}

/// Compare 1 to [`MAX_COMPARE`] builds, in the order given.
pub fn compare_builds(builds: &[&Build]) -> BuildResult<Comparison> {
    if builds.is_empty() {
        return Err(BuildError::missing_field("builds"));
    }
    if builds.len() > MAX_COMPARE {
        return Err(BuildError::TooManyBuilds {
            count: builds.len(),
            max: MAX_COMPARE,
        });
    }

    let rows: Vec<ComparisonRow> = builds
        .iter()
        .map(|build| ComparisonRow {
            id: build.id,
            name: build.name.clone(),
            build_type: build.build_type,
            length_in: build.length_in,
            total_grains: build.total_grains,
            foc_percent: build.foc_percent().map(round1),
            weights: build.weights(),
        })
        .collect();

    let mut components = ComponentWeights::default();
    for name in ComponentName::ALL {
        components.set(name, chart_scale(rows.iter().map(|r| r.weights.get(name))));
    }

    let scales = ComparisonScales {
        total_grains: chart_scale(rows.iter().map(|r| r.total_grains)),
        foc_percent: chart_scale(rows.iter().filter_map(|r| r.foc_percent)),
        components,
    };

    Ok(Comparison { rows, scales })
}

/// Largest value, but never below 1
pub fn chart_scale(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(1.0, f64::max)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
