//! Command implementations and the state they share.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use tracing::{debug, warn};
use uuid::Uuid;

use quiver_core::build::{BuildDraft, TargetAnimal};
use quiver_core::build_type::BuildType;
use quiver_core::calculator::{derive_shaft_grains, TotalMode};
use quiver_core::component::{ComponentName, RawComponent};
use quiver_core::errors::{BuildError, BuildResult};
use quiver_core::file_io::{load_library_with_lock_check, load_or_create_library, save_library, FileLock};
use quiver_core::library::BuildLibrary;

pub mod calc;
pub mod library;
pub mod reference;
pub mod report;

const LOCK_ATTEMPTS: u32 = 40;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Options every command sees.
pub struct Context {
    pub library_path: PathBuf,
    pub user: Option<String>,
    pub json: bool,
}

impl Context {
    pub fn principal(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Load the library for reading. A missing file reads as empty.
    pub fn load(&self) -> Result<BuildLibrary> {
        if !self.library_path.exists() {
            return Ok(load_or_create_library(&self.library_path)?);
        }
        let (library, lock) = load_library_with_lock_check(&self.library_path)
            .with_context(|| format!("loading {}", self.library_path.display()))?;
        if let Some(lock) = lock {
            warn!(holder = %lock.user_id, machine = %lock.machine, "library is being edited elsewhere");
        }
        Ok(library)
    }

    /// Lock, load, change and save the library in one step.
    ///
    /// Nothing is written if `change` fails.
    pub fn modify<T>(&self, change: impl FnOnce(&mut BuildLibrary, Option<&str>) -> BuildResult<T>) -> Result<T> {
        let _lock = self.lock()?;
        let mut library = load_or_create_library(&self.library_path)?;
        let value = change(&mut library, self.principal())?;
        save_library(&library, &self.library_path)?;
        Ok(value)
    }

    /// Take the library lock, waiting out a holder for up to
    /// `LOCK_ATTEMPTS * LOCK_RETRY_DELAY`.
    fn lock(&self) -> BuildResult<FileLock> {
        let user = self.principal().unwrap_or("anonymous");
        let mut attempt = 1;
        loop {
            match FileLock::acquire(&self.library_path, user) {
                Err(e) if e.is_recoverable() && attempt < LOCK_ATTEMPTS => {
                    debug!(attempt, error = %e, "library locked, retrying");
                    attempt += 1;
                    thread::sleep(LOCK_RETRY_DELAY);
                }
                result => return result,
            }
        }
    }
}

/// Resolve a full id or a unique id prefix to a visible build's id.
pub fn resolve_id(library: &BuildLibrary, id: &str, principal: Option<&str>) -> BuildResult<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return library.get_build(&uuid, principal).map(|b| b.id);
    }

    let matches = library.find_by_prefix(id, principal);
    match matches.as_slice() {
        [build] => Ok(build.id),
        [] => Err(BuildError::build_not_found(id)),
        many => Err(BuildError::invalid_input(
            "id",
            id,
            format!("prefix matches {} builds", many.len()),
        )),
    }
}

pub fn parse_build_type(s: &str) -> BuildResult<BuildType> {
    BuildType::parse(s).ok_or_else(|| BuildError::invalid_input("type", s, "expected arrow or bolt"))
}

pub fn parse_animal(s: &str) -> BuildResult<TargetAnimal> {
    TargetAnimal::parse(s).ok_or_else(|| {
        BuildError::invalid_input(
            "animal",
            s,
            "expected deer, elk, bear, moose, turkey, hogs or caribou",
        )
    })
}

pub fn parse_policy(s: &str) -> BuildResult<TotalMode> {
    match s.trim().to_lowercase().as_str() {
        "strict" => Ok(TotalMode::Strict),
        "lenient" => Ok(TotalMode::Lenient),
        _ => Err(BuildError::invalid_input("policy", s, "expected strict or lenient")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Text,
}

/// Per-component weight flags plus shaft geometry.
#[derive(Args, Debug, Clone, Default)]
pub struct ComponentArgs {
    /// Nock weight (grains)
    #[arg(long)]
    pub knock: Option<f64>,

    /// Fletching weight (grains)
    #[arg(long)]
    pub fletching: Option<f64>,

    /// Shaft weight (grains); derived from --gpi and --length if omitted
    #[arg(long)]
    pub shaft: Option<f64>,

    /// Insert weight (grains)
    #[arg(long)]
    pub insert: Option<f64>,

    /// Tip weight (grains)
    #[arg(long)]
    pub tip: Option<f64>,

    /// Shaft grains per inch
    #[arg(long)]
    pub gpi: Option<f64>,

    /// Overall length (inches)
    #[arg(long)]
    pub length: Option<f64>,
}

impl ComponentArgs {
    /// The weights that were given, nock end first
    pub fn given(&self) -> Vec<(ComponentName, f64)> {
        ComponentName::ALL
            .into_iter()
            .filter_map(|name| self.weight(name).map(|grains| (name, grains)))
            .collect()
    }

    fn weight(&self, name: ComponentName) -> Option<f64> {
        match name {
            ComponentName::Knock => self.knock,
            ComponentName::Fletching => self.fletching,
            ComponentName::Shaft => self.shaft,
            ComponentName::Insert => self.insert,
            ComponentName::Tip => self.tip,
        }
    }

    pub fn raw_components(&self) -> Vec<RawComponent> {
        self.given()
            .into_iter()
            .map(|(name, grains)| RawComponent::new(name.as_str(), grains))
            .collect()
    }
}

/// Flags shared by `save` and `update`.
#[derive(Args, Debug, Clone, Default)]
pub struct DraftArgs {
    #[command(flatten)]
    pub components: ComponentArgs,

    /// arrow or bolt; inferred from length on save if omitted
    #[arg(long = "type")]
    pub build_type: Option<String>,

    /// Target animal label
    #[arg(long)]
    pub animal: Option<String>,
}

impl DraftArgs {
    /// Overlay the given flags onto `draft`.
    ///
    /// A given weight replaces the draft's entry of the same name or is
    /// appended. Without an explicit `--shaft`, a draft with a gpi gets its
    /// shaft derived from gpi × length when it has no shaft entry yet, or
    /// re-derived when `--gpi` or `--length` changed.
    pub fn apply_to(&self, draft: &mut BuildDraft, default_length_in: f64) -> BuildResult<()> {
        for (name, grains) in self.components.given() {
            set_component(draft, name, grains);
        }

        if let Some(gpi) = self.components.gpi {
            draft.gpi = Some(gpi);
        }
        if let Some(length) = self.components.length {
            draft.length_in = Some(length);
        }
        if let Some(build_type) = &self.build_type {
            draft.build_type = Some(parse_build_type(build_type)?);
        }
        if let Some(animal) = &self.animal {
            draft.target_animal = Some(parse_animal(animal)?);
        }

        if self.components.shaft.is_some() {
            return Ok(());
        }
        let geometry_changed = self.components.gpi.is_some() || self.components.length.is_some();
        if let Some(gpi) = draft.gpi {
            if geometry_changed || find_component(draft, ComponentName::Shaft).is_none() {
                let length = draft.length_in.unwrap_or(default_length_in);
                set_component(draft, ComponentName::Shaft, derive_shaft_grains(gpi, length));
            }
        }
        Ok(())
    }
}

fn find_component(draft: &mut BuildDraft, name: ComponentName) -> Option<&mut RawComponent> {
    draft
        .components
        .iter_mut()
        .find(|c| c.name_str().and_then(ComponentName::parse) == Some(name))
}

/// Replace the entry named `name` in place, or append one.
fn set_component(draft: &mut BuildDraft, name: ComponentName, grains: f64) {
    let entry = RawComponent::new(name.as_str(), grains);
    match find_component(draft, name) {
        Some(existing) => *existing = entry,
        None => draft.components.push(entry),
    }
}
