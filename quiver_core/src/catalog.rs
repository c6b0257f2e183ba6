//! # Component Catalog
//!
//! A small reference list of common nocks, fletchings, shafts, inserts and
//! tips, bundled as `data/catalog.toml`. Shafts are sold by weight per inch,
//! so their entries carry `gpi` and the build's length decides the grains.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::calculator::derive_shaft_grains;
use crate::component::{Component, ComponentName};
use crate::errors::{BuildError, BuildResult};

static CATALOG: Lazy<BuildResult<Vec<CatalogEntry>>> = Lazy::new(|| {
    #[derive(Deserialize)]
    struct CatalogFile {
        entry: Vec<CatalogEntry>,
    }

    toml::from_str::<CatalogFile>(include_str!("../data/catalog.toml"))
        .map(|file| file.entry)
        .map_err(BuildError::serialization)
});

/// A catalog part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub category: ComponentName,
    pub name: String,
    /// Fixed weight; absent for shafts
    #[serde(default)]
    pub grains: Option<f64>,
    /// Grains per inch; shafts only
    #[serde(default)]
    pub gpi: Option<f64>,
    pub brand: String,
    pub material: String,
}

impl CatalogEntry {
    /// Weight this part adds to a build of `length_in` inches
    pub fn grains_at(&self, length_in: f64) -> f64 {
        match (self.grains, self.gpi) {
            (Some(grains), _) => grains,
            (None, Some(gpi)) => derive_shaft_grains(gpi, length_in),
            (None, None) => 0.0,
        }
    }

    pub fn to_component(&self, length_in: f64) -> Component {
        Component::new(self.category, self.grains_at(length_in))
    }

    /// Short weight label: "125 gr" or "10.2 GPI"
    pub fn weight_label(&self) -> String {
        match (self.grains, self.gpi) {
            (Some(grains), _) => format!("{} gr", grains),
            (None, Some(gpi)) => format!("{} GPI", gpi),
            (None, None) => "-".to_string(),
        }
    }

    fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(term) || self.brand.to_lowercase().contains(term)
    }
}

/// The whole catalog
pub fn catalog() -> BuildResult<&'static [CatalogEntry]> {
    CATALOG.as_deref().map_err(Clone::clone)
}

/// Entries in one category, in catalog order
pub fn entries_for(category: ComponentName) -> BuildResult<Vec<&'static CatalogEntry>> {
    Ok(catalog()?.iter().filter(|e| e.category == category).collect())
}

/// Entries in `category` whose name or brand contains `term`, ignoring case.
///
/// An empty term matches everything in the category.
pub fn search(category: ComponentName, term: &str) -> BuildResult<Vec<&'static CatalogEntry>> {
    let term = term.trim().to_lowercase();
    Ok(entries_for(category)?
        .into_iter()
        .filter(|e| e.matches(&term))
        .collect())
}
