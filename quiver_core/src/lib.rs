//! # quiver_core - Arrow Build Weight and Balance Engine
//!
//! `quiver_core` computes total weight and front-of-center (FOC) balance for
//! arrow and crossbow bolt builds, and keeps a library of saved builds. All
//! inputs and outputs are JSON-serializable so the same types back a CLI, a
//! file format, or a request handler.
//!
//! ## Design Philosophy
//!
//! - **Server-side totals**: A build's `total_grains` is always recomputed, never trusted
//! - **JSON-First**: All types implement Serialize/Deserialize
//! - **Rich Errors**: Structured error types, not just strings
//! - **Tolerant by default**: Messy weights are coerced unless strict mode is asked for
//!
//! ## Quick Start
//!
//! ```rust
//! use quiver_core::calculator::{calculate, CalcInput};
//! use quiver_core::component::RawComponent;
//!
//! let input = CalcInput {
//!     components: vec![
//!         RawComponent::new("knock", 15.0),
//!         RawComponent::new("fletching", 25.0),
//!         RawComponent::new("shaft", 350.0),
//!         RawComponent::new("insert", 50.0),
//!         RawComponent::new("tip", 125.0),
//!     ],
//!     length_in: Some(28.0),
//!     ..Default::default()
//! };
//!
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.total_grains, 565.0);
//! ```
//!
//! ## Modules
//!
//! - [`calculator`] - Normalization, totals, shaft derivation, FOC
//! - [`component`] - Component names and the raw/normalized/validated shapes
//! - [`build`] - Builds and drafts
//! - [`build_type`] - Arrow vs bolt, length domains
//! - [`library`] - Saved-build container with per-owner visibility
//! - [`presets`] - Big-game starting builds
//! - [`catalog`] - Common off-the-shelf parts
//! - [`stats`], [`compare`], [`export`] - Reporting over saved builds
//! - [`units`] - Type-safe unit wrappers
//! - [`errors`] - Structured error types
//! - [`file_io`] - File operations with atomic saves and locking

pub mod build;
pub mod build_type;
pub mod calculator;
pub mod catalog;
pub mod compare;
pub mod component;
pub mod errors;
pub mod export;
#[cfg(not(target_arch = "wasm32"))]
pub mod file_io;
pub mod library;
pub mod presets;
pub mod stats;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use build::{Build, BuildDraft, TargetAnimal};
pub use build_type::BuildType;
pub use calculator::{calculate, CalcInput, CalcResult, TotalMode};
pub use component::{Component, ComponentName, RawComponent};
pub use errors::{BuildError, BuildResult};
#[cfg(not(target_arch = "wasm32"))]
pub use file_io::{load_library, load_or_create_library, save_library, FileLock};
pub use library::{BuildLibrary, LibrarySettings};
