//! Direct dependency resolution
//!
//! This module composes the validators, the registry client, and the
//! archive extractor into the tool's single high-level operation: resolve
//! the latest version of a package and report its direct dependencies.
//!
//! # Examples
//!
//! ```no_run
//! use depgraph::{resolve_direct_dependencies, Config, DependencySource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let deps = resolve_direct_dependencies(
//!     "serde",
//!     "https://crates.io/api/v1/crates/",
//!     &config.http,
//!     DependencySource::RegistryApi,
//! )?;
//!
//! for dep in deps {
//!     println!("{} @ {}", dep.name, dep.requirement);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::HttpConfig;
use crate::extract::extract_manifest_dependencies;
use crate::registry::{DependencyRecord, RegistryClient};
use crate::validate::{validate_package_name, validate_repository};
use crate::Result;
use tempfile::TempDir;

/// Where the dependency records of a resolved version come from
///
/// The structured API is the default source. The archive source is opt-in
/// and there is no fallback between the two: a failure in the selected
/// source is reported, never silently retried against the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySource {
    /// The registry's structured dependency endpoint
    RegistryApi,
    /// The manifest inside the published source archive
    SourceArchive,
}

impl DependencySource {
    /// Produce the dependency records of one package version
    pub fn dependency_records(
        &self,
        registry: &RegistryClient,
        name: &str,
        version: &str,
    ) -> Result<Vec<DependencyRecord>> {
        match self {
            DependencySource::RegistryApi => registry.dependencies(name, version),
            DependencySource::SourceArchive => {
                let archive = registry.download_archive(name, Some(version))?;
                // Scratch directory lives exactly as long as this call
                let scratch = TempDir::new()?;
                extract_manifest_dependencies(&archive, scratch.path())
            }
        }
    }
}

/// Resolve the direct dependencies of a package's latest version
///
/// The package name and repository locator are validated here as well;
/// nothing touches the network until both pass.
pub fn resolve_direct_dependencies(
    package: &str,
    repository: &str,
    http: &HttpConfig,
    source: DependencySource,
) -> Result<Vec<DependencyRecord>> {
    let package = validate_package_name(Some(package))?;
    let repository = validate_repository(Some(repository))?;

    let registry = RegistryClient::new(repository, http)?;
    let version = registry.latest_version(&package)?;

    source.dependency_records(&registry, &package, &version)
}
