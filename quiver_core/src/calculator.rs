//! # Build Calculator
//!
//! Pure weight and balance arithmetic for an arrow or bolt build:
//!
//! - [`normalize`] - loosely-typed entries to lowercase names and finite grains
//! - [`total_grains`] - authoritative sum, in [`TotalMode::Strict`] or [`TotalMode::Lenient`]
//! - [`compute_foc`] - front-of-center percentage from a fixed lever-arm model
//! - [`derive_shaft_grains`] - shaft weight from grains-per-inch and length
//!
//! Nothing here holds state or performs I/O, so every function is safe to call
//! on each keystroke of an interactive editor.
//!
//! ## FOC Model
//!
//! Each component is a point mass at a fixed distance from the nock end:
//!
//! ```text
//! knock      0
//! fletching  L - 2
//! shaft      L / 2
//! insert     L - 1
//! tip        L
//! ```
//!
//! `FOC% = ((balance_point - L/2) / L) * 100`. A zero total weight has no
//! balance point and yields `None`.
//!
//! ## Example
//!
//! ```rust
//! use quiver_core::calculator::{compute_foc, ComponentWeights};
//!
//! let weights = ComponentWeights {
//!     knock: 15.0,
//!     fletching: 25.0,
//!     shaft: 350.0,
//!     insert: 50.0,
//!     tip: 125.0,
//! };
//! let foc = compute_foc(&weights, 28.0).unwrap();
//! assert!((foc - 15.74).abs() < 0.01);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::{Component, ComponentName, GrainEntry, NormalizedComponent, RawComponent};
use crate::errors::{BuildError, BuildResult};

/// Tolerance policy for the total-weight sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalMode {
    /// Reject any entry whose grains are not a non-negative number
    Strict,
    /// Count unusable grains as zero; never fails
    #[default]
    Lenient,
}

/// Normalize caller-supplied component entries.
///
/// Entries whose `name` is not a string are dropped. Names are lowercased
/// but not checked against the fixed set, and duplicates are kept; see
/// [`validate_names`] and [`validate_uniqueness`]. Grains that do not
/// coerce to a finite number become `0`.
///
/// Normalizing an already-normalized list returns it unchanged.
pub fn normalize(raw: &[RawComponent]) -> Vec<NormalizedComponent> {
    raw.iter()
        .filter_map(|entry| {
            let name = entry.name_str()?.to_lowercase();
            let parsed = entry.grains_value();
            let grains = if parsed.is_finite() {
                parsed
            } else {
                debug!(component = %name, raw = %entry.grains, "non-finite grains coerced to 0");
                0.0
            };
            Some(NormalizedComponent { name, grains })
        })
        .collect()
}

/// Sum the grains of every entry under the given policy.
///
/// Only [`TotalMode::Strict`] can fail, with
/// [`BuildError::InvalidComponentWeight`] naming the first bad entry.
pub fn total_grains<E: GrainEntry>(entries: &[E], mode: TotalMode) -> BuildResult<f64> {
    match mode {
        TotalMode::Strict => strict_total(entries),
        TotalMode::Lenient => Ok(lenient_total(entries)),
    }
}

/// Strict total: every entry must parse to a finite, non-negative number.
pub fn strict_total<E: GrainEntry>(entries: &[E]) -> BuildResult<f64> {
    let mut total = 0.0;
    for entry in entries {
        let grains = entry.grains_value();
        if !grains.is_finite() || grains < 0.0 {
            return Err(BuildError::invalid_component_weight(entry.entry_name()));
        }
        total += grains;
    }
    Ok(total)
}

/// Lenient total: unusable or negative grains count as zero.
///
/// Entries without a string name are skipped, matching [`normalize`]. The
/// result is always finite and non-negative; a sum that overflows
/// saturates at `f64::MAX`.
pub fn lenient_total<E: GrainEntry>(entries: &[E]) -> f64 {
    let total: f64 = entries
        .iter()
        .filter(|entry| entry.is_named())
        .map(|entry| {
            let grains = entry.grains_value();
            if grains.is_finite() && grains > 0.0 {
                grains
            } else {
                0.0
            }
        })
        .sum();

    if total.is_finite() {
        total
    } else {
        f64::MAX
    }
}

/// Check every normalized name against the fixed component set.
pub fn validate_names(components: &[NormalizedComponent]) -> BuildResult<Vec<Component>> {
    components
        .iter()
        .cloned()
        .map(Component::try_from)
        .collect()
}

/// Reject a component list that names the same part twice.
pub fn validate_uniqueness(components: &[Component]) -> BuildResult<()> {
    let mut seen = HashSet::new();
    for component in components {
        if !seen.insert(component.name) {
            return Err(BuildError::DuplicateComponent {
                name: component.name.as_str().to_string(),
            });
        }
    }
    Ok(())
}

/// Round to two decimal places.
///
/// Values too large to scale have no fractional digits left and come back
/// unchanged.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}

/// Shaft weight from grains-per-inch and overall length.
///
/// Returns `0` unless both inputs and their product are finite and
/// non-negative, so partially typed input degrades quietly.
pub fn derive_shaft_grains(gpi: f64, length_in: f64) -> f64 {
    if !gpi.is_finite() || gpi < 0.0 || !length_in.is_finite() || length_in < 0.0 {
        return 0.0;
    }
    let grains = gpi * length_in;
    if !grains.is_finite() {
        return 0.0;
    }
    round2(grains)
}

/// The five canonical component weights in grains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentWeights {
    pub knock: f64,
    pub fletching: f64,
    pub shaft: f64,
    pub insert: f64,
    pub tip: f64,
}

impl ComponentWeights {
    /// Collect weights from validated components.
    ///
    /// The first entry for each name wins; missing names are zero.
    pub fn from_components(components: &[Component]) -> Self {
        let mut weights = ComponentWeights::default();
        let mut seen = HashSet::new();
        for component in components {
            if seen.insert(component.name) {
                weights.set(component.name, component.grains);
            }
        }
        weights
    }

    /// Collect weights from normalized entries, ignoring names outside the set.
    pub fn from_normalized(components: &[NormalizedComponent]) -> Self {
        let typed: Vec<Component> = components
            .iter()
            .filter_map(|c| {
                ComponentName::parse(&c.name).map(|name| Component::new(name, c.grains))
            })
            .collect();
        ComponentWeights::from_components(&typed)
    }

    /// Weight of one component
    pub fn get(&self, name: ComponentName) -> f64 {
        match name {
            ComponentName::Knock => self.knock,
            ComponentName::Fletching => self.fletching,
            ComponentName::Shaft => self.shaft,
            ComponentName::Insert => self.insert,
            ComponentName::Tip => self.tip,
        }
    }

    /// Set the weight of one component
    pub fn set(&mut self, name: ComponentName, grains: f64) {
        match name {
            ComponentName::Knock => self.knock = grains,
            ComponentName::Fletching => self.fletching = grains,
            ComponentName::Shaft => self.shaft = grains,
            ComponentName::Insert => self.insert = grains,
            ComponentName::Tip => self.tip = grains,
        }
    }

    /// Sum of all five weights
    pub fn total(&self) -> f64 {
        self.tip + self.insert + self.shaft + self.fletching + self.knock
    }

    /// The weights as a component list, nock end first
    pub fn to_components(&self) -> Vec<Component> {
        ComponentName::ALL
            .into_iter()
            .map(|name| Component::new(name, self.get(name)))
            .collect()
    }
}

/// Balance point in inches from the nock end, or `None` for a weightless build.
pub fn balance_point(weights: &ComponentWeights, length_in: f64) -> Option<f64> {
    let total = weights.total();
    if total == 0.0 {
        debug!("zero total weight, balance point undefined");
        return None;
    }

    let moment = weights.tip * length_in
        + weights.insert * (length_in - 1.0)
        + weights.shaft * (length_in / 2.0)
        + weights.fletching * (length_in - 2.0)
        + weights.knock * 0.0;

    let point = moment / total;
    point.is_finite().then_some(point)
}

/// Front-of-center percentage.
///
/// `None` when the total weight is zero or the arithmetic is not finite
/// (e.g. a zero length). Values are never clamped; a negative result means
/// the balance point sits behind the midpoint.
pub fn compute_foc(weights: &ComponentWeights, length_in: f64) -> Option<f64> {
    let point = balance_point(weights, length_in)?;
    let foc = ((point - length_in / 2.0) / length_in) * 100.0;
    if foc.is_finite() {
        Some(foc)
    } else {
        debug!(length_in, "FOC undefined for this length");
        None
    }
}

/// Total weight and balance for one set of weights.
///
/// ## JSON Example
///
/// ```json
/// {
///   "total_grains": 565.0,
///   "balance_point_in": 18.407,
///   "foc_percent": 15.74
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub total_grains: f64,
    pub balance_point_in: Option<f64>,
    pub foc_percent: Option<f64>,
}

/// Compute the full balance report.
pub fn balance_report(weights: &ComponentWeights, length_in: f64) -> BalanceReport {
    BalanceReport {
        total_grains: weights.total(),
        balance_point_in: balance_point(weights, length_in),
        foc_percent: compute_foc(weights, length_in),
    }
}

/// Input for a one-shot calculation.
///
/// When `gpi` is given and the components carry no shaft entry, a shaft of
/// `gpi × length_in` grains is appended. An explicit shaft entry always wins.
///
/// ## JSON Example
///
/// ```json
/// {
///   "components": [
///     { "name": "knock", "grains": 15 },
///     { "name": "tip", "grains": "125" }
///   ],
///   "gpi": 10.0,
///   "length_in": 28.0,
///   "mode": "lenient"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalcInput {
    pub components: Vec<RawComponent>,
    #[serde(default)]
    pub gpi: Option<f64>,
    #[serde(default)]
    pub length_in: Option<f64>,
    #[serde(default)]
    pub mode: TotalMode,
}

/// Result of [`calculate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalcResult {
    /// Normalized components, including a derived shaft if one was added
    pub components: Vec<NormalizedComponent>,
    /// True when the shaft weight came from gpi × length
    pub shaft_derived: bool,
    pub total_grains: f64,
    /// Absent when no length was supplied
    pub balance_point_in: Option<f64>,
    pub foc_percent: Option<f64>,
}

/// Run normalization, totals and balance in one call.
///
/// In strict mode the raw entries are checked before anything is coerced.
pub fn calculate(input: &CalcInput) -> BuildResult<CalcResult> {
    if input.mode == TotalMode::Strict {
        strict_total(&input.components)?;
    }

    let mut components = normalize(&input.components);

    let has_shaft = components
        .iter()
        .any(|c| c.name == ComponentName::Shaft.as_str());
    let shaft_derived = match (input.gpi, input.length_in) {
        (Some(gpi), Some(length)) if !has_shaft => {
            components.push(NormalizedComponent {
                name: ComponentName::Shaft.as_str().to_string(),
                grains: derive_shaft_grains(gpi, length),
            });
            true
        }
        _ => false,
    };

    let total = total_grains(&components, input.mode)?;
    let weights = ComponentWeights::from_normalized(&components);
    let (balance_point_in, foc_percent) = match input.length_in {
        Some(length) => (balance_point(&weights, length), compute_foc(&weights, length)),
        None => (None, None),
    };

    Ok(CalcResult {
        components,
        shaft_derived,
        total_grains: total,
        balance_point_in,
        foc_percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn reference_weights() -> ComponentWeights {
        ComponentWeights {
            knock: 15.0,
            fletching: 25.0,
            shaft: 350.0,
            insert: 50.0,
            tip: 125.0,
        }
    }

    fn raw(name: Value, grains: Value) -> RawComponent {
        RawComponent { name, grains }
    }

    #[test]
    fn test_normalize_lowercases_and_coerces() {
        let input = vec![
            raw(json!("TIP"), json!("125")),
            raw(json!(7), json!(10)),
            raw(json!("Insert"), json!("abc")),
            raw(json!("knock"), json!(null)),
            raw(json!("shaft"), json!("Infinity")),
        ];
        let normalized = normalize(&input);
        assert_eq!(
            normalized,
            vec![
                NormalizedComponent { name: "tip".into(), grains: 125.0 },
                NormalizedComponent { name: "insert".into(), grains: 0.0 },
                NormalizedComponent { name: "knock".into(), grains: 0.0 },
                NormalizedComponent { name: "shaft".into(), grains: 0.0 },
            ]
        );
    }

    #[test]
    fn test_normalize_keeps_duplicates_and_unknown_names() {
        let input = vec![
            RawComponent::new("tip", 100.0),
            RawComponent::new("Tip", 125.0),
            RawComponent::new("vane", 5.0),
        ];
        let normalized = normalize(&input);
        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized[1].name, "tip");
        assert_eq!(normalized[2].name, "vane");
    }

    #[test]
    fn test_empty_total_is_zero() {
        let empty: Vec<RawComponent> = Vec::new();
        assert_eq!(total_grains(&empty, TotalMode::Strict).unwrap(), 0.0);
        assert_eq!(total_grains(&empty, TotalMode::Lenient).unwrap(), 0.0);
    }

    #[test]
    fn test_strict_rejects_negative_and_non_numeric() {
        let negative = vec![raw(json!("tip"), json!(-5))];
        assert_eq!(
            total_grains(&negative, TotalMode::Strict),
            Err(BuildError::invalid_component_weight("tip"))
        );

        let text = vec![raw(json!("tip"), json!("abc"))];
        assert_eq!(
            total_grains(&text, TotalMode::Strict),
            Err(BuildError::invalid_component_weight("tip"))
        );
    }

    #[test]
    fn test_strict_reports_first_bad_entry() {
        let entries = vec![
            RawComponent::new("knock", 15.0),
            raw(json!("insert"), json!(null)),
            raw(json!("tip"), json!(-1)),
        ];
        assert_eq!(
            strict_total(&entries),
            Err(BuildError::invalid_component_weight("insert"))
        );
    }

    #[test]
    fn test_strict_accepts_numeric_strings() {
        let entries = vec![
            raw(json!("knock"), json!("15")),
            raw(json!("tip"), json!(125.5)),
        ];
        assert_eq!(strict_total(&entries).unwrap(), 140.5);
    }

    #[test]
    fn test_lenient_coerces_bad_values() {
        let entries = vec![
            raw(json!("knock"), json!(15)),
            raw(json!("fletching"), json!("abc")),
            raw(json!("shaft"), json!(-20)),
            raw(json!(null), json!(1000)),
            raw(json!("tip"), json!({"weight": 1})),
        ];
        assert_eq!(total_grains(&entries, TotalMode::Lenient).unwrap(), 15.0);
    }

    #[test]
    fn test_uniqueness() {
        let ok = vec![
            Component::new(ComponentName::Tip, 100.0),
            Component::new(ComponentName::Shaft, 300.0),
        ];
        assert!(validate_uniqueness(&ok).is_ok());

        let dup = vec![
            Component::new(ComponentName::Tip, 100.0),
            Component::new(ComponentName::Tip, 125.0),
        ];
        assert_eq!(
            validate_uniqueness(&dup),
            Err(BuildError::DuplicateComponent { name: "tip".into() })
        );
    }

    #[test]
    fn test_validate_names() {
        let normalized = normalize(&[RawComponent::new("Knock", 12.0), RawComponent::new("point", 100.0)]);
        assert_eq!(
            validate_names(&normalized),
            Err(BuildError::UnknownComponent { name: "point".into() })
        );
    }

    #[test]
    fn test_reference_foc() {
        let weights = reference_weights();
        assert_eq!(weights.total(), 565.0);

        let point = balance_point(&weights, 28.0).unwrap();
        assert!((point - 10400.0 / 565.0).abs() < 1e-9);

        let foc = compute_foc(&weights, 28.0).unwrap();
        assert_eq!(round2(foc), 15.74);
    }

    #[test]
    fn test_foc_undefined_for_zero_weight() {
        assert_eq!(compute_foc(&ComponentWeights::default(), 28.0), None);
        assert_eq!(compute_foc(&ComponentWeights::from_components(&[]), 31.5), None);

        let zeros: Vec<Component> = ComponentName::ALL
            .into_iter()
            .map(|name| Component::new(name, 0.0))
            .collect();
        assert_eq!(compute_foc(&ComponentWeights::from_components(&zeros), 28.0), None);
    }

    #[test]
    fn test_foc_undefined_for_zero_length() {
        assert_eq!(compute_foc(&reference_weights(), 0.0), None);
    }

    #[test]
    fn test_foc_can_be_negative() {
        let tail_heavy = ComponentWeights {
            knock: 400.0,
            shaft: 100.0,
            ..Default::default()
        };
        let foc = compute_foc(&tail_heavy, 28.0).unwrap();
        assert!(foc < 0.0);
        // balance at (100*14)/500 = 2.8 in; (2.8 - 14)/28 = -40%
        assert!((foc + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_first_entry_wins() {
        let components = vec![
            Component::new(ComponentName::Tip, 100.0),
            Component::new(ComponentName::Tip, 300.0),
        ];
        let weights = ComponentWeights::from_components(&components);
        assert_eq!(weights.tip, 100.0);
        assert_eq!(weights.knock, 0.0);
    }

    #[test]
    fn test_derive_shaft_grains() {
        assert_eq!(derive_shaft_grains(10.0, 28.0), 280.0);
        assert_eq!(derive_shaft_grains(10.2, 28.5), 290.7);
        assert_eq!(derive_shaft_grains(f64::NAN, 28.0), 0.0);
        assert_eq!(derive_shaft_grains(10.0, f64::INFINITY), 0.0);
        assert_eq!(derive_shaft_grains(-1.0, 28.0), 0.0);
        assert_eq!(derive_shaft_grains(f64::MAX, 28.0), 0.0);
    }

    #[test]
    fn test_round2_large_values() {
        assert_eq!(round2(290.704), 290.7);
        assert_eq!(round2(1e307), 1e307);
        assert_eq!(round2(f64::MAX), f64::MAX);
    }

    #[test]
    fn test_calculate_overflowing_gpi_yields_zero_shaft() {
        let input = CalcInput {
            components: vec![RawComponent::new("tip", 100.0)],
            gpi: Some(1e308),
            length_in: Some(28.0),
            mode: TotalMode::Lenient,
        };
        let result = calculate(&input).unwrap();
        assert!(result.shaft_derived);
        assert_eq!(result.components[1].grains, 0.0);
        assert_eq!(result.total_grains, 100.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["components"][1]["grains"], 0.0);
    }

    #[test]
    fn test_calculate_derives_missing_shaft() {
        let input = CalcInput {
            components: vec![
                RawComponent::new("knock", 15.0),
                RawComponent::new("fletching", 25.0),
                RawComponent::new("insert", 50.0),
                RawComponent::new("tip", 125.0),
            ],
            gpi: Some(12.5),
            length_in: Some(28.0),
            mode: TotalMode::Lenient,
        };
        let result = calculate(&input).unwrap();
        assert!(result.shaft_derived);
        assert_eq!(result.total_grains, 565.0);
        assert_eq!(round2(result.foc_percent.unwrap()), 15.74);
    }

    #[test]
    fn test_calculate_keeps_explicit_shaft() {
        let input = CalcInput {
            components: vec![RawComponent::new("shaft", 300.0)],
            gpi: Some(10.0),
            length_in: Some(28.0),
            mode: TotalMode::Lenient,
        };
        let result = calculate(&input).unwrap();
        assert!(!result.shaft_derived);
        assert_eq!(result.total_grains, 300.0);
    }

    #[test]
    fn test_calculate_strict_fails_before_coercion() {
        let input = CalcInput {
            components: vec![raw(json!("tip"), json!("heavy"))],
            mode: TotalMode::Strict,
            ..Default::default()
        };
        assert_eq!(
            calculate(&input).unwrap_err(),
            BuildError::invalid_component_weight("tip")
        );
    }

    #[test]
    fn test_calculate_without_length_has_no_foc() {
        let input = CalcInput {
            components: vec![RawComponent::new("tip", 125.0)],
            ..Default::default()
        };
        let result = calculate(&input).unwrap();
        assert_eq!(result.total_grains, 125.0);
        assert_eq!(result.foc_percent, None);
    }

    fn arb_json_grains() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<f64>().prop_map(Value::from),
            (0.0f64..5000.0).prop_map(Value::from),
            "[0-9a-zA-Z. +-]{0,12}".prop_map(Value::String),
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            Just(json!({"grains": 10})),
            Just(json!([1, 2])),
            Just(json!("NaN")),
        ]
    }

    fn arb_json_name() -> impl Strategy<Value = Value> {
        prop_oneof![
            prop::sample::select(vec!["knock", "Fletching", "SHAFT", "insert", "Tip"])
                .prop_map(|s| Value::String(s.to_string())),
            "[a-zA-Z]{1,10}".prop_map(Value::String),
            Just(Value::Null),
            any::<i32>().prop_map(Value::from),
        ]
    }

    fn arb_raw_components() -> impl Strategy<Value = Vec<RawComponent>> {
        prop::collection::vec(
            (arb_json_name(), arb_json_grains()).prop_map(|(name, grains)| RawComponent { name, grains }),
            0..8,
        )
    }

    proptest! {
        #[test]
        fn prop_total_is_order_independent(
            (original, shuffled) in prop::collection::vec(0.0f64..10_000.0, 0..12)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            let to_entries = |values: &[f64]| -> Vec<RawComponent> {
                values.iter().map(|g| RawComponent::new("tip", *g)).collect()
            };
            let a = strict_total(&to_entries(&original)).unwrap();
            let b = strict_total(&to_entries(&shuffled)).unwrap();
            prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
        }

        #[test]
        fn prop_lenient_total_is_total(entries in arb_raw_components()) {
            let total = total_grains(&entries, TotalMode::Lenient).unwrap();
            prop_assert!(total.is_finite());
            prop_assert!(total >= 0.0);
        }

        #[test]
        fn prop_normalize_is_idempotent(entries in arb_raw_components()) {
            let once = normalize(&entries);
            let as_raw: Vec<RawComponent> = once.iter().cloned().map(RawComponent::from).collect();
            let twice = normalize(&as_raw);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalized_grains_are_finite(entries in arb_raw_components()) {
            for component in normalize(&entries) {
                prop_assert!(component.grains.is_finite());
            }
        }

        #[test]
        fn prop_foc_never_infinite(
            knock in 0.0f64..500.0,
            tip in 0.0f64..500.0,
            length in 0.0f64..40.0,
        ) {
            let weights = ComponentWeights { knock, tip, ..Default::default() };
            if let Some(foc) = compute_foc(&weights, length) {
                prop_assert!(foc.is_finite());
            }
        }
    }
}
