//! depgraph - dependency analysis for crates-style package registries
//!
//! depgraph validates the parameters of a dependency analysis run and
//! resolves a package's direct dependencies against a registry exposing the
//! crates.io v1 endpoint shapes. Dependency records come either from the
//! registry's structured dependency endpoint or from scanning the manifest
//! inside the published source archive:
//!
//! - Strict, message-per-rule validation of package name, repository
//!   locator, run mode, and traversal depth before any network activity
//! - First-failure error reporting with a category per failure class
//! - Safe archive handling: scoped temp files, conservative entry
//!   filtering, no path traversal
//! - Line-oriented manifest scanning that degrades unrecognized
//!   declarations to an "unknown" requirement instead of failing
//!
//! # Examples
//!
//! ```no_run
//! use depgraph::{resolve_direct_dependencies, Config, DependencySource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//!
//! let deps = resolve_direct_dependencies(
//!     "serde",
//!     "https://crates.io/api/v1/crates/",
//!     &config.http,
//!     DependencySource::RegistryApi,
//! )?;
//!
//! println!("{} direct dependencies", deps.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`validate`] - Parameter validation and the run parameter bundle
//! - [`registry`] - Registry client and dependency records
//! - [`extract`] - Archive extraction and manifest scanning
//! - [`resolver`] - Resolution orchestration and source selection
//! - [`config`] - User configuration management
//! - [`error`] - Error types and result handling

pub mod config;
pub mod error;
pub mod extract;
pub mod registry;
pub mod resolver;
pub mod validate;

pub use config::{Config, HttpConfig};
pub use error::{Error, Result};
pub use extract::{extract_manifest_dependencies, parse_manifest_dependencies, MANIFEST_FILE};
pub use registry::{DependencyRecord, RegistryClient, UNKNOWN_REQUIREMENT};
pub use resolver::{resolve_direct_dependencies, DependencySource};
pub use validate::{
    validate_depth, validate_mode, validate_package_name, validate_repository, AnalysisParams,
    RunMode, DEFAULT_DEPTH, MAX_DEPTH,
};
