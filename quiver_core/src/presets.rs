//! # Big-Game Presets
//!
//! Ready-made starting builds, three weight classes (light, medium, heavy)
//! for each [`TargetAnimal`]. The table ships inside the crate as
//! `data/presets.toml` and is parsed once on first use.
//!
//! Preset keys are `<animal>-<variant>`, e.g. `elk-heavy`.
//!
//! ## Example
//!
//! ```rust
//! use quiver_core::presets::find_preset;
//!
//! let preset = find_preset("deer-medium").unwrap();
//! assert_eq!(preset.name, "Deer - Medium");
//! let draft = preset.to_draft();
//! assert_eq!(draft.components.len(), 5);
//! ```

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::build::{BuildDraft, TargetAnimal};
use crate::build_type::BuildType;
use crate::calculator::{balance_report, BalanceReport, ComponentWeights};
use crate::component::{Component, RawComponent};
use crate::errors::{BuildError, BuildResult};

static PRESETS: Lazy<BuildResult<Vec<Preset>>> = Lazy::new(|| {
    #[derive(Deserialize)]
    struct PresetFile {
        preset: Vec<Preset>,
    }

    toml::from_str::<PresetFile>(include_str!("../data/presets.toml"))
        .map(|file| file.preset)
        .map_err(BuildError::serialization)
});

/// One ready-made build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// Lookup key, `<animal>-<variant>`
    pub key: String,
    pub name: String,
    /// "Light", "Medium" or "Heavy"
    pub variant: String,
    pub animal: TargetAnimal,
    pub build_type: BuildType,
    pub components: Vec<Component>,
    pub gpi: f64,
    pub length_in: f64,
    pub description: String,
    /// Recommended kinetic energy, free text ("45-50 ft-lbs")
    pub ke_target: String,
    /// Recommended FOC range, free text ("12-15%")
    pub foc_target: String,
}

impl Preset {
    /// Sum of the preset's component weights
    pub fn total_grains(&self) -> f64 {
        self.components.iter().map(|c| c.grains).sum()
    }

    pub fn balance(&self) -> BalanceReport {
        balance_report(&ComponentWeights::from_components(&self.components), self.length_in)
    }

    /// A draft that creates this preset as a build, tagged with its animal.
    pub fn to_draft(&self) -> BuildDraft {
        BuildDraft {
            name: self.name.clone(),
            components: self.components.iter().copied().map(RawComponent::from).collect(),
            gpi: Some(self.gpi),
            length_in: Some(self.length_in),
            build_type: Some(self.build_type),
            target_animal: Some(self.animal),
        }
    }
}

/// Every preset, grouped by animal in table order.
pub fn all_presets() -> BuildResult<&'static [Preset]> {
    PRESETS.as_deref().map_err(Clone::clone)
}

/// The light, medium and heavy presets for one animal.
pub fn presets_for(animal: TargetAnimal) -> BuildResult<Vec<&'static Preset>> {
    Ok(all_presets()?.iter().filter(|p| p.animal == animal).collect())
}

/// Look up a preset by key, case-insensitively.
pub fn find_preset(key: &str) -> BuildResult<&'static Preset> {
    let wanted = key.trim().to_lowercase();
    all_presets()?
        .iter()
        .find(|p| p.key == wanted)
        .ok_or_else(|| BuildError::PresetNotFound { key: key.to_string() })
}
