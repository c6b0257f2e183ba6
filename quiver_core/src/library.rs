//! # Build Library
//!
//! The `BuildLibrary` struct is the root container for saved builds.
//! Libraries serialize to `.qvr` (Quiver) files as human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! BuildLibrary
//! ├── meta: LibraryMetadata (schema version, timestamps)
//! ├── settings: LibrarySettings (weight policy, default length)
//! └── builds: HashMap<Uuid, Build> (all saved builds)
//! ```
//!
//! ## Ownership
//!
//! Every operation takes the caller's principal. A build created by a
//! principal is invisible to everyone else, and lookups of it fail with
//! [`BuildError::BuildNotFound`]. Builds created without a principal are
//! shared.
//!
//! ## Example
//!
//! ```rust
//! use quiver_core::build::BuildDraft;
//! use quiver_core::library::BuildLibrary;
//!
//! let mut library = BuildLibrary::new();
//! let draft = BuildDraft::new("Deer 2025")
//!     .with_component("tip", 125.0)
//!     .with_length(28.0);
//!
//! let id = library.create_build(&draft, Some("jane@example.com")).unwrap();
//! assert_eq!(library.get_build(&id, Some("jane@example.com")).unwrap().total_grains, 125.0);
//! assert!(library.get_build(&id, None).is_err());
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::build::{Build, BuildDraft};
use crate::build_type::STORAGE_RANGE;
use crate::calculator::TotalMode;
use crate::errors::{BuildError, BuildResult};

/// Current schema version for .qvr files
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Root library container.
///
/// Builds are stored in a flat UUID-keyed map for O(1) lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildLibrary {
    /// Library metadata (version, timestamps)
    pub meta: LibraryMetadata,

    /// Settings applied to every create and update
    pub settings: LibrarySettings,

    /// All saved builds, keyed by UUID
    pub builds: HashMap<Uuid, Build>,
}

impl BuildLibrary {
    /// Create a new empty library.
    pub fn new() -> Self {
        let now = Utc::now();
        BuildLibrary {
            meta: LibraryMetadata {
                version: SCHEMA_VERSION.to_string(),
                created: now,
                modified: now,
            },
            settings: LibrarySettings::default(),
            builds: HashMap::new(),
        }
    }

    /// Validate a draft and store it as a new build.
    ///
    /// Returns the UUID assigned to the build.
    pub fn create_build(&mut self, draft: &BuildDraft, principal: Option<&str>) -> BuildResult<Uuid> {
        let build = Build::from_draft(draft, principal, &self.settings)?;
        let id = build.id;
        info!(%id, name = %build.name, total_grains = build.total_grains, "build created");
        self.builds.insert(id, build);
        self.touch();
        Ok(id)
    }

    /// Replace a build's fields from a draft.
    ///
    /// The total is recomputed; the build type is kept unless the draft sets one.
    pub fn update_build(&mut self, id: &Uuid, draft: &BuildDraft, principal: Option<&str>) -> BuildResult<&Build> {
        let settings = self.settings.clone();
        let build = self
            .builds
            .get_mut(id)
            .filter(|b| b.is_visible_to(principal))
            .ok_or_else(|| BuildError::build_not_found(id))?;

        build.apply_update(draft, &settings)?;
        info!(%id, total_grains = build.total_grains, "build updated");
        self.meta.modified = Utc::now();
        self.get_build(id, principal)
    }

    /// Remove a build by UUID.
    ///
    /// Returns the removed build.
    pub fn delete_build(&mut self, id: &Uuid, principal: Option<&str>) -> BuildResult<Build> {
        self.get_build(id, principal)?;
        let build = self
            .builds
            .remove(id)
            .ok_or_else(|| BuildError::build_not_found(id))?;
        info!(%id, name = %build.name, "build deleted");
        self.touch();
        Ok(build)
    }

    /// Get a build visible to `principal`.
    pub fn get_build(&self, id: &Uuid, principal: Option<&str>) -> BuildResult<&Build> {
        self.builds
            .get(id)
            .filter(|b| b.is_visible_to(principal))
            .ok_or_else(|| BuildError::build_not_found(id))
    }

    /// All builds visible to `principal`, newest first.
    pub fn list_builds(&self, principal: Option<&str>) -> Vec<&Build> {
        let mut builds: Vec<&Build> = self
            .builds
            .values()
            .filter(|b| b.is_visible_to(principal))
            .collect();
        builds.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
        builds
    }

    /// Find visible builds by id prefix (as typed on a command line).
    pub fn find_by_prefix(&self, prefix: &str, principal: Option<&str>) -> Vec<&Build> {
        let prefix = prefix.to_lowercase();
        self.list_builds(principal)
            .into_iter()
            .filter(|b| b.id.to_string().starts_with(&prefix))
            .collect()
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    /// Number of builds in the library, across all owners.
    pub fn build_count(&self) -> usize {
        self.builds.len()
    }
}

impl Default for BuildLibrary {
    fn default() -> Self {
        BuildLibrary::new()
    }
}

/// Library metadata stored in the file header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryMetadata {
    /// Schema version (for migration compatibility)
    pub version: String,

    /// When the library was created
    pub created: DateTime<Utc>,

    /// When the library was last modified
    pub modified: DateTime<Utc>,
}

/// Library-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// How bad component weights are handled on save
    pub weight_policy: TotalMode,

    /// Length used when a draft omits one
    pub default_length_in: f64,
}

impl LibrarySettings {
    /// Check the settings themselves are usable.
    pub fn validate(&self) -> BuildResult<()> {
        if !STORAGE_RANGE.contains(self.default_length_in) {
            return Err(BuildError::invalid_input(
                "default_length_in",
                self.default_length_in.to_string(),
                format!(
                    "Default length must be between {} and {} inches",
                    STORAGE_RANGE.min_in, STORAGE_RANGE.max_in
                ),
            ));
        }
        Ok(())
    }
}

impl Default for LibrarySettings {
    fn default() -> Self {
        LibrarySettings {
            weight_policy: TotalMode::Lenient,
            default_length_in: 28.0,
        }
    }
}
