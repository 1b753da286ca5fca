//! Parameter validation for dependency analysis runs
//!
//! This module validates the raw CLI inputs (package name, repository
//! locator, run mode, traversal depth) before any network activity happens.
//! All functions are pure: absent input is modeled as `None` and defaults
//! are applied here, not stored anywhere.
//!
//! # Examples
//!
//! ```
//! use depgraph::{validate_depth, validate_mode, RunMode};
//!
//! let depth = validate_depth(Some(" 5 ")).unwrap();
//! assert_eq!(depth, 5);
//!
//! let mode = validate_mode(None).unwrap();
//! assert_eq!(mode, RunMode::Production);
//! ```

use crate::{Error, Result};
use std::fmt;

/// Depth used when no `--depth` is given
pub const DEFAULT_DEPTH: u32 = 3;

/// Upper bound for the traversal depth
pub const MAX_DEPTH: u32 = 10;

/// Run mode for an analysis
///
/// Validated and reported alongside the other parameters; reserved for the
/// future multi-level traversal, nothing branches on it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    #[default]
    Production,
    Development,
    Test,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Production => "production",
            RunMode::Development => "development",
            RunMode::Test => "test",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated parameter bundle for one analysis run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisParams {
    pub package: String,
    pub repository: String,
    pub mode: RunMode,
    pub depth: u32,
}

impl AnalysisParams {
    /// Validate all four raw parameters in declaration order
    ///
    /// The first failing parameter wins: a bad package name is reported even
    /// when the depth is also out of range.
    pub fn from_raw(
        package: Option<&str>,
        repository: Option<&str>,
        mode: Option<&str>,
        depth: Option<&str>,
    ) -> Result<Self> {
        Ok(Self {
            package: validate_package_name(package)?,
            repository: validate_repository(repository)?,
            mode: validate_mode(mode)?,
            depth: validate_depth(depth)?,
        })
    }
}

/// Validate a package name, returning the trimmed name
pub fn validate_package_name(raw: Option<&str>) -> Result<String> {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => {
            return Err(Error::InvalidInput(
                "package name must be a non-empty string".to_string(),
            ))
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "package name must not be empty or whitespace only".to_string(),
        ));
    }

    Ok(trimmed.to_string())
}

/// Validate a repository locator: a URL or an opaque filesystem path
///
/// URL-shaped values (`http://` / `https://` prefix) must carry a host
/// segment containing at least one dot. Anything else is accepted as a
/// path; its existence is checked at use, not here.
pub fn validate_repository(raw: Option<&str>) -> Result<String> {
    let raw = match raw {
        Some(value) if !value.is_empty() => value,
        _ => {
            return Err(Error::InvalidInput(
                "repository URL or file path must be a non-empty string".to_string(),
            ))
        }
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput(
            "repository URL or file path must not be empty".to_string(),
        ));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        let rest = trimmed.split("://").nth(1).unwrap_or_default();
        let host = rest.split('/').next().unwrap_or_default();
        if !host.contains('.') {
            return Err(Error::InvalidInput(
                "invalid repository URL format".to_string(),
            ));
        }
    }

    Ok(trimmed.to_string())
}

/// Validate the run mode, defaulting to production when absent
///
/// Matching is trim- and case-insensitive.
pub fn validate_mode(raw: Option<&str>) -> Result<RunMode> {
    let raw = match raw {
        Some(value) => value,
        None => return Ok(RunMode::Production),
    };

    let normalized = raw.trim().to_lowercase();
    match normalized.as_str() {
        "production" => Ok(RunMode::Production),
        "development" => Ok(RunMode::Development),
        "test" => Ok(RunMode::Test),
        _ => Err(Error::InvalidInput(format!(
            "invalid run mode: '{}' (valid modes: production, development, test)",
            normalized
        ))),
    }
}

/// Validate the traversal depth, defaulting to 3 when absent
///
/// The raw text is trimmed and coerced through an integer parse, so
/// `" 7 "` and `"+7"` are accepted while `"5.5"` is not. The valid range
/// is 1 through [`MAX_DEPTH`] inclusive.
pub fn validate_depth(raw: Option<&str>) -> Result<u32> {
    let raw = match raw {
        Some(value) => value,
        None => return Ok(DEFAULT_DEPTH),
    };

    let depth: i64 = raw.trim().parse().map_err(|_| {
        Error::InvalidInput("analysis depth must be an integer".to_string())
    })?;

    if depth < 1 {
        return Err(Error::InvalidInput(
            "analysis depth must be positive".to_string(),
        ));
    }
    if depth > MAX_DEPTH as i64 {
        return Err(Error::InvalidInput(format!(
            "analysis depth must not exceed {}",
            MAX_DEPTH
        )));
    }

    Ok(depth as u32)
}
