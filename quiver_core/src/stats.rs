//! # Library Statistics
//!
//! Aggregate figures over a set of builds, split by [`BuildType`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::build::Build;
use crate::build_type::BuildType;
use crate::component::ComponentName;

/// Weight spread for the builds of one type.
///
/// All figures are zero when `count` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeightSpread {
    pub count: usize,
    pub avg_grains: f64,
    pub min_grains: f64,
    pub max_grains: f64,
}

impl WeightSpread {
    fn from_totals(totals: &[f64]) -> Self {
        if totals.is_empty() {
            return WeightSpread::default();
        }
        let sum: f64 = totals.iter().sum();
        WeightSpread {
            count: totals.len(),
            avg_grains: sum / totals.len() as f64,
            min_grains: totals.iter().copied().fold(f64::INFINITY, f64::min),
            max_grains: totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Summary of a build collection.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_builds": 3,
///   "arrows": { "count": 2, "avg_grains": 540.0, "min_grains": 515.0, "max_grains": 565.0 },
///   "bolts": { "count": 1, "avg_grains": 420.0, "min_grains": 420.0, "max_grains": 420.0 },
///   "avg_component_grains": { "knock": 14.0, "tip": 125.0 },
///   "avg_foc_percent": 13.2
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LibraryStats {
    pub total_builds: usize,
    pub arrows: WeightSpread,
    pub bolts: WeightSpread,
    /// Mean weight of each component name over the builds that have it
    pub avg_component_grains: BTreeMap<ComponentName, f64>,
    /// Mean FOC over builds whose FOC is defined
    pub avg_foc_percent: Option<f64>,
}

impl LibraryStats {
    pub fn from_builds(builds: &[&Build]) -> Self {
        let mut arrow_totals = Vec::new();
        let mut bolt_totals = Vec::new();
        let mut usage: BTreeMap<ComponentName, (f64, usize)> = BTreeMap::new();
        let mut focs = Vec::new();

        for build in builds {
            match build.build_type {
                BuildType::Arrow => arrow_totals.push(build.total_grains),
                BuildType::Bolt => bolt_totals.push(build.total_grains),
            }
            for component in &build.components {
                let entry = usage.entry(component.name).or_insert((0.0, 0));
                entry.0 += component.grains;
                entry.1 += 1;
            }
            if let Some(foc) = build.foc_percent() {
                focs.push(foc);
            }
        }

        let avg_foc_percent = if focs.is_empty() {
            None
        } else {
            Some(focs.iter().sum::<f64>() / focs.len() as f64)
        };

        LibraryStats {
            total_builds: builds.len(),
            arrows: WeightSpread::from_totals(&arrow_totals),
            bolts: WeightSpread::from_totals(&bolt_totals),
            avg_component_grains: usage
                .into_iter()
                .map(|(name, (sum, count))| (name, sum / count as f64))
                .collect(),
            avg_foc_percent,
        }
    }

    /// Spread for one build type
    pub fn spread(&self, build_type: BuildType) -> &WeightSpread {
        match build_type {
            BuildType::Arrow => &self.arrows,
            BuildType::Bolt => &self.bolts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildDraft;
    use crate::library::LibrarySettings;

    fn build(draft: BuildDraft) -> Build {
        Build::from_draft(&draft, None, &LibrarySettings::default()).unwrap()
    }

    #[test]
    fn test_empty_collection() {
        let stats = LibraryStats::from_builds(&[]);
        assert_eq!(stats.total_builds, 0);
        assert_eq!(stats.arrows, WeightSpread::default());
        assert!(stats.avg_component_grains.is_empty());
        assert_eq!(stats.avg_foc_percent, None);
    }

    #[test]
    fn test_spread_by_type() {
        let a = build(BuildDraft::new("A").with_component("tip", 100.0).with_component("knock", 10.0).with_length(28.0));
        let b = build(BuildDraft::new("B").with_component("tip", 150.0).with_length(29.0));
        let c = build(BuildDraft::new("C").with_component("tip", 200.0).with_length(20.0));

        let stats = LibraryStats::from_builds(&[&a, &b, &c]);
        assert_eq!(stats.total_builds, 3);

        assert_eq!(stats.arrows.count, 2);
        assert_eq!(stats.arrows.avg_grains, 130.0);
        assert_eq!(stats.arrows.min_grains, 110.0);
        assert_eq!(stats.arrows.max_grains, 150.0);

        assert_eq!(stats.spread(BuildType::Bolt).count, 1);
        assert_eq!(stats.bolts.avg_grains, 200.0);

        assert_eq!(stats.avg_component_grains[&ComponentName::Tip], 150.0);
        assert_eq!(stats.avg_component_grains[&ComponentName::Knock], 10.0);
        assert!(!stats.avg_component_grains.contains_key(&ComponentName::Shaft));
    }

    #[test]
    fn test_avg_foc_skips_weightless_builds() {
        let weighted = build(BuildDraft::new("W").with_component("tip", 100.0).with_length(28.0));
        let empty = build(BuildDraft::new("E").with_length(28.0));

        let stats = LibraryStats::from_builds(&[&weighted, &empty]);
        // all weight at the tip puts the balance point at the tip: 50% FOC
        assert_eq!(stats.avg_foc_percent, Some(50.0));
    }

    #[test]
    fn test_stats_serialize_component_keys() {
        let a = build(BuildDraft::new("A").with_component("insert", 50.0));
        let json = serde_json::to_value(LibraryStats::from_builds(&[&a])).unwrap();
        assert_eq!(json["avg_component_grains"]["insert"], 50.0);
    }
}
