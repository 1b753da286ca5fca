//! Package registry client and dependency records
//!
//! This module provides a blocking HTTP client for crates-style registries
//! exposing the v1 endpoint shapes: package metadata at `{base}{name}`,
//! dependency listings at `{base}{name}/{version}/dependencies`, and source
//! archives at `{base}{name}/{version}/download`.
//!
//! # Examples
//!
//! ```no_run
//! use depgraph::{Config, RegistryClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let registry = RegistryClient::new(
//!     "https://crates.io/api/v1/crates/".to_string(),
//!     &config.http,
//! )?;
//!
//! let version = registry.latest_version("serde")?;
//! for dep in registry.dependencies("serde", &version)? {
//!     println!("{} @ {}", dep.name, dep.requirement);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::HttpConfig;
use crate::{Error, Result};
use serde::Deserialize;
use std::time::Duration;

/// Requirement text reported when a manifest declares a dependency without
/// a recognizable version string
pub const UNKNOWN_REQUIREMENT: &str = "unknown";

/// One direct dependency of a package
///
/// Produced either from the registry's dependency endpoint or from a
/// manifest scan; value semantics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub name: String,
    pub requirement: String,
    pub optional: bool,
    pub default_features: Option<bool>,
    pub features: Vec<String>,
    pub kind: Option<String>,
}

impl DependencyRecord {
    /// Build a record carrying only a name and requirement
    ///
    /// The manifest scanner sees no optionality or feature information, so
    /// everything else takes its neutral default.
    pub fn from_requirement(name: impl Into<String>, requirement: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirement: requirement.into(),
            optional: false,
            default_features: None,
            features: Vec::new(),
            kind: None,
        }
    }
}

/// Blocking client for one registry
///
/// The base URL is used verbatim as a prefix for every request, so the
/// caller supplies whatever trailing separator the registry's path layout
/// needs (e.g. `https://crates.io/api/v1/crates/`).
pub struct RegistryClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl RegistryClient {
    pub fn new(base_url: String, http: &HttpConfig) -> Result<Self> {
        let mut builder =
            reqwest::blocking::Client::builder().user_agent(http.user_agent.clone());
        if http.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(http.timeout_seconds));
        }

        Ok(Self {
            base_url,
            client: builder.build()?,
        })
    }

    /// Resolve the latest published version of a package
    pub fn latest_version(&self, name: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, name);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Registry(format!(
                "HTTP {} when fetching metadata for '{}'",
                status.as_u16(),
                name
            )));
        }

        // A malformed body is a registry error, not a transport error
        let body = response.text()?;
        let metadata: ApiCrateResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Registry(format!("malformed metadata response for '{}': {}", name, e))
        })?;

        metadata.krate.and_then(|c| c.max_version).ok_or_else(|| {
            Error::Registry(format!(
                "metadata response for '{}' has no latest version",
                name
            ))
        })
    }

    /// Fetch the direct dependency records of one published version
    ///
    /// Records are returned in the registry's order.
    pub fn dependencies(&self, name: &str, version: &str) -> Result<Vec<DependencyRecord>> {
        let url = format!("{}{}/{}/dependencies", self.base_url, name, version);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Registry(format!(
                "HTTP {} when fetching dependencies for '{}@{}'",
                status.as_u16(),
                name,
                version
            )));
        }

        let body = response.text()?;
        let listing: ApiDependencyList = serde_json::from_str(&body).map_err(|e| {
            Error::Registry(format!(
                "malformed dependency response for '{}@{}': {}",
                name, version, e
            ))
        })?;

        let dependencies = listing.dependencies.ok_or_else(|| {
            Error::Registry(format!(
                "dependency response for '{}@{}' has no dependency list",
                name, version
            ))
        })?;

        Ok(dependencies
            .into_iter()
            .map(|d| DependencyRecord {
                name: d.crate_id,
                requirement: d.req,
                optional: d.optional,
                default_features: d.default_features,
                features: d.features,
                kind: d.kind,
            })
            .collect())
    }

    /// Download the source archive of a package version
    ///
    /// With `version: None` the latest version is resolved first.
    pub fn download_archive(&self, name: &str, version: Option<&str>) -> Result<Vec<u8>> {
        let version = match version {
            Some(v) => v.to_string(),
            None => self.latest_version(name)?,
        };

        let url = format!("{}{}/{}/download", self.base_url, name, version);

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Registry(format!(
                "HTTP {} when downloading '{}@{}'",
                status.as_u16(),
                name,
                version
            )));
        }

        Ok(response.bytes()?.to_vec())
    }
}

// API response structures
#[derive(Debug, Deserialize)]
struct ApiCrateResponse {
    #[serde(rename = "crate")]
    krate: Option<ApiCrate>,
}

#[derive(Debug, Deserialize)]
struct ApiCrate {
    max_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDependencyList {
    dependencies: Option<Vec<ApiDependency>>,
}

#[derive(Debug, Deserialize)]
struct ApiDependency {
    crate_id: String,
    req: String,
    #[serde(default)]
    optional: bool,
    default_features: Option<bool>,
    #[serde(default)]
    features: Vec<String>,
    kind: Option<String>,
}
