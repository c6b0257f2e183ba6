//! # Builds
//!
//! A [`Build`] is a named, persisted component configuration. Callers never
//! construct one directly; they submit a [`BuildDraft`] and the build is
//! created or updated from it, which recomputes `total_grains` every time.
//!
//! ## Draft JSON Example
//!
//! ```json
//! {
//!   "name": "Elk 2025",
//!   "components": [
//!     { "name": "knock", "grains": 15 },
//!     { "name": "fletching", "grains": 25 },
//!     { "name": "shaft", "grains": 350 },
//!     { "name": "insert", "grains": 50 },
//!     { "name": "tip", "grains": 125 }
//!   ],
//!   "gpi": 12.5,
//!   "length_in": 28.0,
//!   "target_animal": "elk"
//! }
//! ```
//!
//! `build_type` is optional: if it is missing at creation the type is
//! inferred from `length_in`, and if it is missing on update the stored type
//! is kept.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::build_type::{BuildType, STORAGE_RANGE};
use crate::calculator::{
    self, balance_report, normalize, strict_total, validate_names, validate_uniqueness,
    BalanceReport, ComponentWeights, TotalMode,
};
use crate::component::{Component, RawComponent};
use crate::errors::{BuildError, BuildResult};
use crate::library::LibrarySettings;
use crate::units::{Grains, Inches};

/// Optional descriptive label for what a build is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetAnimal {
    Deer,
    Elk,
    Bear,
    Moose,
    Turkey,
    Hogs,
    Caribou,
}

impl TargetAnimal {
    /// All target animals for UI selection
    pub const ALL: [TargetAnimal; 7] = [
        TargetAnimal::Deer,
        TargetAnimal::Elk,
        TargetAnimal::Bear,
        TargetAnimal::Moose,
        TargetAnimal::Turkey,
        TargetAnimal::Hogs,
        TargetAnimal::Caribou,
    ];

    /// Stored (lowercase) name
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetAnimal::Deer => "deer",
            TargetAnimal::Elk => "elk",
            TargetAnimal::Bear => "bear",
            TargetAnimal::Moose => "moose",
            TargetAnimal::Turkey => "turkey",
            TargetAnimal::Hogs => "hogs",
            TargetAnimal::Caribou => "caribou",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetAnimal::Deer => "Deer",
            TargetAnimal::Elk => "Elk",
            TargetAnimal::Bear => "Bear",
            TargetAnimal::Moose => "Moose",
            TargetAnimal::Turkey => "Turkey",
            TargetAnimal::Hogs => "Wild Hog",
            TargetAnimal::Caribou => "Caribou",
        }
    }

    /// Parse from common spellings ("hog", "Wild Hog", "HOGS")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "deer" => Some(TargetAnimal::Deer),
            "elk" => Some(TargetAnimal::Elk),
            "bear" => Some(TargetAnimal::Bear),
            "moose" => Some(TargetAnimal::Moose),
            "turkey" => Some(TargetAnimal::Turkey),
            "hogs" | "hog" | "wild hog" | "wild hogs" => Some(TargetAnimal::Hogs),
            "caribou" => Some(TargetAnimal::Caribou),
            _ => None,
        }
    }
}

impl fmt::Display for TargetAnimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Caller payload for creating or updating a build.
///
/// There is deliberately no total field: a `total_grains` key in incoming
/// JSON is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub components: Vec<RawComponent>,
    #[serde(default)]
    pub gpi: Option<f64>,
    #[serde(default)]
    pub length_in: Option<f64>,
    #[serde(default)]
    pub build_type: Option<BuildType>,
    #[serde(default)]
    pub target_animal: Option<TargetAnimal>,
}

impl BuildDraft {
    pub fn new(name: impl Into<String>) -> Self {
        BuildDraft {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, grains: f64) -> Self {
        self.components.push(RawComponent::new(name, grains));
        self
    }

    pub fn with_gpi(mut self, gpi: f64) -> Self {
        self.gpi = Some(gpi);
        self
    }

    pub fn with_length(mut self, length_in: f64) -> Self {
        self.length_in = Some(length_in);
        self
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = Some(build_type);
        self
    }

    pub fn with_target_animal(mut self, animal: TargetAnimal) -> Self {
        self.target_animal = Some(animal);
        self
    }
}

/// Everything derived from a draft, computed before any build is touched.
struct ValidatedDraft {
    name: String,
    components: Vec<Component>,
    total_grains: f64,
    gpi: Option<f64>,
    length_in: f64,
}

fn validate_draft(draft: &BuildDraft, settings: &LibrarySettings) -> BuildResult<ValidatedDraft> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(BuildError::missing_field("name"));
    }

    let components = prepare_components(&draft.components, settings.weight_policy)?;
    let total_grains = calculator::total_grains(&components, settings.weight_policy)?;

    if let Some(gpi) = draft.gpi {
        if !gpi.is_finite() || gpi < 0.0 {
            return Err(BuildError::invalid_input(
                "gpi",
                gpi.to_string(),
                "GPI must be a non-negative number",
            ));
        }
    }

    let length_in = draft.length_in.unwrap_or(settings.default_length_in);
    if !STORAGE_RANGE.contains(length_in) {
        return Err(BuildError::invalid_input(
            "length_in",
            length_in.to_string(),
            format!(
                "Length must be between {} and {} inches",
                STORAGE_RANGE.min_in, STORAGE_RANGE.max_in
            ),
        ));
    }

    Ok(ValidatedDraft {
        name: name.to_string(),
        components,
        total_grains,
        gpi: draft.gpi,
        length_in,
    })
}

/// Normalize, validate names and uniqueness, and apply the weight policy.
///
/// Strict mode rejects bad weights up front. Lenient mode stores unusable
/// and negative weights as zero so the stored list always agrees with the
/// stored total.
pub fn prepare_components(raw: &[RawComponent], mode: TotalMode) -> BuildResult<Vec<Component>> {
    if mode == TotalMode::Strict {
        strict_total(raw)?;
    }

    let mut components = validate_names(&normalize(raw))?;
    validate_uniqueness(&components)?;

    for component in &mut components {
        if component.grains < 0.0 {
            debug!(component = %component.name, grains = component.grains, "negative grains stored as 0");
            component.grains = 0.0;
        }
    }
    Ok(components)
}

/// A persisted build.
///
/// ## JSON Example
///
/// ```json
/// {
///   "id": "5f0c6d2e-...",
///   "name": "Elk 2025",
///   "components": [{ "name": "tip", "grains": 125.0 }],
///   "total_grains": 125.0,
///   "gpi": null,
///   "length_in": 28.0,
///   "build_type": "arrow",
///   "target_animal": "elk",
///   "owner": "jane@example.com",
///   "created_at": "2025-10-01T12:00:00Z",
///   "updated_at": "2025-10-01T12:00:00Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: Uuid,
    pub name: String,
    /// Components in the order they were submitted
    pub components: Vec<Component>,
    /// Authoritative sum, recomputed on every create and update
    pub total_grains: f64,
    /// Grains per inch of shaft (reference only)
    pub gpi: Option<f64>,
    /// Overall length in inches
    pub length_in: f64,
    pub build_type: BuildType,
    pub target_animal: Option<TargetAnimal>,
    /// Principal that created the build; `None` for shared builds
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Build {
    /// Create a build from a draft.
    ///
    /// The build type is the draft's, or inferred from length if absent.
    pub fn from_draft(draft: &BuildDraft, owner: Option<&str>, settings: &LibrarySettings) -> BuildResult<Self> {
        let valid = validate_draft(draft, settings)?;
        let build_type = draft
            .build_type
            .unwrap_or_else(|| BuildType::infer_from_length(valid.length_in));

        let now = Utc::now();
        Ok(Build {
            id: Uuid::new_v4(),
            name: valid.name,
            components: valid.components,
            total_grains: valid.total_grains,
            gpi: valid.gpi,
            length_in: valid.length_in,
            build_type,
            target_animal: draft.target_animal,
            owner: owner.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace this build's editable fields from a draft.
    ///
    /// On error the build is left untouched. A draft without a build type
    /// keeps the stored one, whatever the new length.
    pub fn apply_update(&mut self, draft: &BuildDraft, settings: &LibrarySettings) -> BuildResult<()> {
        let valid = validate_draft(draft, settings)?;

        self.name = valid.name;
        self.components = valid.components;
        self.total_grains = valid.total_grains;
        self.gpi = valid.gpi;
        self.length_in = valid.length_in;
        if let Some(build_type) = draft.build_type {
            self.build_type = build_type;
        }
        self.target_animal = draft.target_animal;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Total weight as a unit value, for conversion to grams
    pub fn total_weight(&self) -> Grains {
        Grains(self.total_grains)
    }

    pub fn length(&self) -> Inches {
        Inches(self.length_in)
    }

    /// The stored components as canonical weights
    pub fn weights(&self) -> ComponentWeights {
        ComponentWeights::from_components(&self.components)
    }

    /// Total weight, balance point and FOC for this build
    pub fn balance(&self) -> BalanceReport {
        balance_report(&self.weights(), self.length_in)
    }

    /// FOC percentage, `None` for a weightless build
    pub fn foc_percent(&self) -> Option<f64> {
        self.balance().foc_percent
    }

    /// True if `principal` may see and modify this build
    pub fn is_visible_to(&self, principal: Option<&str>) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => principal == Some(owner.as_str()),
        }
    }

    /// Convert back to a draft, e.g. to edit and resubmit
    pub fn to_draft(&self) -> BuildDraft {
        BuildDraft {
            name: self.name.clone(),
            components: self.components.iter().copied().map(RawComponent::from).collect(),
            gpi: self.gpi,
            length_in: Some(self.length_in),
            build_type: Some(self.build_type),
            target_animal: self.target_animal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentName;
    use serde_json::json;

    fn reference_draft() -> BuildDraft {
        BuildDraft::new("  Elk 2025 ")
            .with_component("Knock", 15.0)
            .with_component("fletching", 25.0)
            .with_component("shaft", 350.0)
            .with_component("insert", 50.0)
            .with_component("TIP", 125.0)
            .with_gpi(12.5)
            .with_length(28.0)
    }

    #[test]
    fn test_from_draft_computes_total() {
        let build = Build::from_draft(&reference_draft(), None, &LibrarySettings::default()).unwrap();
        assert_eq!(build.name, "Elk 2025");
        assert_eq!(build.total_grains, 565.0);
        assert_eq!(build.components[0].name, ComponentName::Knock);
        assert_eq!(build.components[4].name, ComponentName::Tip);
        assert_eq!(build.build_type, BuildType::Arrow);
        assert_eq!(build.created_at, build.updated_at);
    }

    #[test]
    fn test_total_from_caller_is_ignored() {
        let draft: BuildDraft = serde_json::from_value(json!({
            "name": "Sneaky",
            "components": [{ "name": "tip", "grains": 100 }],
            "total_grains": 9999,
            "length_in": 28.0
        }))
        .unwrap();
        let build = Build::from_draft(&draft, None, &LibrarySettings::default()).unwrap();
        assert_eq!(build.total_grains, 100.0);
    }

    #[test]
    fn test_build_type_inference() {
        let settings = LibrarySettings::default();
        let bolt = Build::from_draft(&BuildDraft::new("Short").with_length(20.0), None, &settings).unwrap();
        assert_eq!(bolt.build_type, BuildType::Bolt);

        let arrow = Build::from_draft(&BuildDraft::new("Long").with_length(28.0), None, &settings).unwrap();
        assert_eq!(arrow.build_type, BuildType::Arrow);
    }

    #[test]
    fn test_update_keeps_stored_build_type() {
        let settings = LibrarySettings::default();
        let mut build = Build::from_draft(
            &BuildDraft::new("Crossbow").with_length(30.0).with_build_type(BuildType::Bolt),
            None,
            &settings,
        )
        .unwrap();
        assert_eq!(build.build_type, BuildType::Bolt);

        build
            .apply_update(&BuildDraft::new("Crossbow").with_length(32.0), &settings)
            .unwrap();
        assert_eq!(build.build_type, BuildType::Bolt);
        assert_eq!(build.length_in, 32.0);

        let mut inferred = Build::from_draft(&BuildDraft::new("Was arrow").with_length(28.0), None, &settings).unwrap();
        inferred
            .apply_update(&BuildDraft::new("Was arrow").with_length(18.0), &settings)
            .unwrap();
        assert_eq!(inferred.build_type, BuildType::Arrow);
    }

    #[test]
    fn test_update_failure_leaves_build_untouched() {
        let settings = LibrarySettings::default();
        let mut build = Build::from_draft(&reference_draft(), None, &settings).unwrap();
        let before = build.clone();

        let bad = BuildDraft::new("Elk 2025").with_length(55.0);
        let err = build.apply_update(&bad, &settings).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert_eq!(build, before);
    }

    #[test]
    fn test_name_required() {
        let err = Build::from_draft(&BuildDraft::new("   "), None, &LibrarySettings::default()).unwrap_err();
        assert_eq!(err, BuildError::missing_field("name"));
    }

    #[test]
    fn test_rejects_unknown_and_duplicate_components() {
        let settings = LibrarySettings::default();
        let unknown = BuildDraft::new("x").with_component("vane", 5.0);
        assert_eq!(
            Build::from_draft(&unknown, None, &settings).unwrap_err(),
            BuildError::UnknownComponent { name: "vane".into() }
        );

        let dup = BuildDraft::new("x").with_component("tip", 100.0).with_component("Tip", 125.0);
        assert_eq!(
            Build::from_draft(&dup, None, &settings).unwrap_err(),
            BuildError::DuplicateComponent { name: "tip".into() }
        );
    }

    #[test]
    fn test_length_and_gpi_bounds() {
        let settings = LibrarySettings::default();
        assert!(Build::from_draft(&BuildDraft::new("x").with_length(9.5), None, &settings).is_err());
        assert!(Build::from_draft(&BuildDraft::new("x").with_length(40.0), None, &settings).is_ok());
        assert!(Build::from_draft(&BuildDraft::new("x").with_length(f64::NAN), None, &settings).is_err());
        assert!(Build::from_draft(&BuildDraft::new("x").with_gpi(-1.0), None, &settings).is_err());
    }

    #[test]
    fn test_missing_length_uses_default() {
        let build = Build::from_draft(&BuildDraft::new("x"), None, &LibrarySettings::default()).unwrap();
        assert_eq!(build.length_in, 28.0);
        assert_eq!(build.build_type, BuildType::Arrow);
    }

    #[test]
    fn test_lenient_policy_zeroes_bad_weights() {
        let draft: BuildDraft = serde_json::from_value(json!({
            "name": "Messy",
            "components": [
                { "name": "tip", "grains": "125" },
                { "name": "insert", "grains": "abc" },
                { "name": "knock", "grains": -4 }
            ]
        }))
        .unwrap();
        let build = Build::from_draft(&draft, None, &LibrarySettings::default()).unwrap();
        assert_eq!(build.total_grains, 125.0);
        assert!(build.components.iter().all(|c| c.grains >= 0.0));
    }

    #[test]
    fn test_strict_policy_rejects_bad_weights() {
        let settings = LibrarySettings {
            weight_policy: TotalMode::Strict,
            ..Default::default()
        };
        let draft = BuildDraft::new("Strict").with_component("tip", -5.0);
        assert_eq!(
            Build::from_draft(&draft, None, &settings).unwrap_err(),
            BuildError::invalid_component_weight("tip")
        );
    }

    #[test]
    fn test_balance() {
        let build = Build::from_draft(&reference_draft(), None, &LibrarySettings::default()).unwrap();
        let report = build.balance();
        assert_eq!(report.total_grains, 565.0);
        assert_eq!(calculator::round2(report.foc_percent.unwrap()), 15.74);

        let empty = Build::from_draft(&BuildDraft::new("Empty"), None, &LibrarySettings::default()).unwrap();
        assert_eq!(empty.foc_percent(), None);
    }

    #[test]
    fn test_unit_accessors() {
        let build = Build::from_draft(&reference_draft(), None, &LibrarySettings::default()).unwrap();
        let grams: crate::units::Grams = build.total_weight().into();
        assert!((grams.value() - 36.611).abs() < 0.001);
        assert!((build.length().to_cm() - 71.12).abs() < 1e-9);
    }

    #[test]
    fn test_visibility() {
        let settings = LibrarySettings::default();
        let owned = Build::from_draft(&reference_draft(), Some("jane"), &settings).unwrap();
        assert!(owned.is_visible_to(Some("jane")));
        assert!(!owned.is_visible_to(Some("john")));
        assert!(!owned.is_visible_to(None));

        let shared = Build::from_draft(&reference_draft(), None, &settings).unwrap();
        assert!(shared.is_visible_to(Some("john")));
        assert!(shared.is_visible_to(None));
    }

    #[test]
    fn test_to_draft_roundtrip() {
        let settings = LibrarySettings::default();
        let build = Build::from_draft(&reference_draft(), None, &settings).unwrap();
        let again = Build::from_draft(&build.to_draft(), None, &settings).unwrap();
        assert_eq!(again.components, build.components);
        assert_eq!(again.total_grains, build.total_grains);
        assert_eq!(again.build_type, build.build_type);
    }

    #[test]
    fn test_target_animal_parse() {
        assert_eq!(TargetAnimal::parse("Wild Hog"), Some(TargetAnimal::Hogs));
        assert_eq!(TargetAnimal::parse("ELK"), Some(TargetAnimal::Elk));
        assert_eq!(TargetAnimal::parse("rabbit"), None);
        assert_eq!(TargetAnimal::Hogs.to_string(), "Wild Hog");
        assert_eq!(serde_json::to_string(&TargetAnimal::Hogs).unwrap(), "\"hogs\"");
    }
}
