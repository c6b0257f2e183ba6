//! # Components
//!
//! The physical parts of an arrow or bolt, in three shapes:
//!
//! - [`RawComponent`] - what a caller sends: `name` and `grains` as arbitrary JSON
//! - [`NormalizedComponent`] - lowercased name, finite `f64` grains (output of
//!   [`crate::calculator::normalize`])
//! - [`Component`] - a validated entry with a [`ComponentName`] from the fixed set
//!
//! ## JSON Example
//!
//! ```json
//! [
//!   { "name": "knock", "grains": 15 },
//!   { "name": "Fletching", "grains": "25" },
//!   { "name": "tip", "grains": null }
//! ]
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::BuildError;

/// The closed set of component names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentName {
    Knock,
    Fletching,
    Shaft,
    Insert,
    Tip,
}

impl ComponentName {
    /// All component names, nock end first
    pub const ALL: [ComponentName; 5] = [
        ComponentName::Knock,
        ComponentName::Fletching,
        ComponentName::Shaft,
        ComponentName::Insert,
        ComponentName::Tip,
    ];

    /// Stored (lowercase) name
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentName::Knock => "knock",
            ComponentName::Fletching => "fletching",
            ComponentName::Shaft => "shaft",
            ComponentName::Insert => "insert",
            ComponentName::Tip => "tip",
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            ComponentName::Knock => "Knock",
            ComponentName::Fletching => "Fletching",
            ComponentName::Shaft => "Shaft",
            ComponentName::Insert => "Insert",
            ComponentName::Tip => "Tip",
        }
    }

    /// Case-insensitive lookup. Surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let lowered = s.trim().to_lowercase();
        ComponentName::ALL
            .into_iter()
            .find(|name| name.as_str() == lowered)
    }
}

impl FromStr for ComponentName {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentName::parse(s).ok_or_else(|| BuildError::UnknownComponent {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A loosely-typed component entry as submitted by a caller.
///
/// Missing fields deserialize as JSON `null`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawComponent {
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub grains: Value,
}

impl RawComponent {
    /// Convenience constructor for well-formed entries
    pub fn new(name: impl Into<String>, grains: f64) -> Self {
        RawComponent {
            name: Value::String(name.into()),
            grains: Value::from(grains),
        }
    }

    /// The name, if it is a JSON string
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_str()
    }
}

/// A component after normalization: lowercase name, finite grains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedComponent {
    pub name: String,
    pub grains: f64,
}

impl From<NormalizedComponent> for RawComponent {
    fn from(c: NormalizedComponent) -> Self {
        RawComponent::new(c.name, c.grains)
    }
}

/// A validated component as stored on a build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: ComponentName,
    pub grains: f64,
}

impl Component {
    pub fn new(name: ComponentName, grains: f64) -> Self {
        Component { name, grains }
    }
}

impl TryFrom<NormalizedComponent> for Component {
    type Error = BuildError;

    fn try_from(c: NormalizedComponent) -> Result<Self, Self::Error> {
        let name = c.name.parse()?;
        Ok(Component {
            name,
            grains: c.grains,
        })
    }
}

impl From<Component> for NormalizedComponent {
    fn from(c: Component) -> Self {
        NormalizedComponent {
            name: c.name.as_str().to_string(),
            grains: c.grains,
        }
    }
}

impl From<Component> for RawComponent {
    fn from(c: Component) -> Self {
        RawComponent::new(c.name.as_str(), c.grains)
    }
}

/// Anything the total-weight calculation can sum over.
pub trait GrainEntry {
    /// Name used in error reports
    fn entry_name(&self) -> Cow<'_, str>;

    /// Parsed grain value; NaN when the value is not a number
    fn grains_value(&self) -> f64;

    /// False for entries that lenient processing skips
    fn is_named(&self) -> bool {
        true
    }
}

impl GrainEntry for RawComponent {
    fn entry_name(&self) -> Cow<'_, str> {
        match &self.name {
            Value::String(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }

    fn grains_value(&self) -> f64 {
        coerce_grains(&self.grains)
    }

    fn is_named(&self) -> bool {
        self.name.is_string()
    }
}

impl GrainEntry for NormalizedComponent {
    fn entry_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn grains_value(&self) -> f64 {
        self.grains
    }
}

impl GrainEntry for Component {
    fn entry_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_str())
    }

    fn grains_value(&self) -> f64 {
        self.grains
    }
}

/// Coerce a JSON value to a grain count.
///
/// Numbers pass through. Strings yield their longest leading decimal
/// literal (`"12.5gr"` is 12.5, `" -3"` is -3, `"Infinity"` is +inf).
/// Arrays are read as their comma-joined text, so `[5]` and `[5, 6]` are 5.
/// Everything else, and text without a leading number, is NaN.
pub fn coerce_grains(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => parse_leading_number(s),
        Value::Array(items) => parse_leading_number(&array_text(items)),
        _ => f64::NAN,
    }
}

/// Comma-joined text of an array; `null` elements are empty.
fn array_text(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(inner) => array_text(inner),
            Value::Object(_) => "[object Object]".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_leading_number(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    if s[pos..].starts_with("Infinity") {
        return if negative { f64::NEG_INFINITY } else { f64::INFINITY };
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = pos - int_start;

    let mut frac_digits = 0;
    if pos < bytes.len() && bytes[pos] == b'.' {
        let dot = pos;
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        frac_digits = pos - dot - 1;
        if frac_digits == 0 {
            // trailing dot, not part of the literal
            pos = dot;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return f64::NAN;
    }

    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_pos = pos + 1;
        if exp_pos < bytes.len() && (bytes[exp_pos] == b'+' || bytes[exp_pos] == b'-') {
            exp_pos += 1;
        }
        let exp_digits_start = exp_pos;
        while exp_pos < bytes.len() && bytes[exp_pos].is_ascii_digit() {
            exp_pos += 1;
        }
        if exp_pos > exp_digits_start {
            pos = exp_pos;
        }
    }

    let mut literal = String::with_capacity(pos + 1);
    if negative {
        literal.push('-');
    }
    if int_digits == 0 {
        literal.push('0');
    }
    literal.push_str(&s[int_start..pos]);

    literal.parse().unwrap_or(f64::NAN)
}
