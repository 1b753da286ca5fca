//! Source archive extraction and manifest scanning
//!
//! This module turns a package's raw `.tar.gz` bytes into dependency
//! records: the bytes are spooled to a temporary file, unpacked into a
//! scratch directory with a conservative entry filter, and the manifest
//! found under the first package root is scanned for dependency
//! declarations.
//!
//! The manifest scanner is deliberately not a full TOML parser. It walks
//! the text line by line, tracks `[section]` headers, and extracts
//! `key = value` pairs from dependency sections, degrading unrecognized
//! value shapes to the `"unknown"` requirement instead of failing.
//!
//! # Examples
//!
//! ```no_run
//! use depgraph::extract_manifest_dependencies;
//! use tempfile::TempDir;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = std::fs::read("serde-1.0.219.tar.gz")?;
//! let scratch = TempDir::new()?;
//!
//! for dep in extract_manifest_dependencies(&archive, scratch.path())? {
//!     println!("{} @ {}", dep.name, dep.requirement);
//! }
//! # Ok(())
//! # }
//! ```

use crate::registry::{DependencyRecord, UNKNOWN_REQUIREMENT};
use crate::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tar::Archive;

/// File name of the dependency manifest inside a package root
pub const MANIFEST_FILE: &str = "Cargo.toml";

/// Extract an archive into `scratch_dir` and scan its manifest
///
/// The caller owns the scratch directory's lifetime; everything this
/// function creates inside it besides the unpacked entries is removed
/// again before it returns, on success and on failure alike.
pub fn extract_manifest_dependencies(
    archive: &[u8],
    scratch_dir: &Path,
) -> Result<Vec<DependencyRecord>> {
    unpack_archive(archive, scratch_dir)?;

    let package_root = first_package_root(scratch_dir)?;
    let manifest_path = package_root.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(Error::Extraction("manifest not found".to_string()));
    }

    let manifest = fs::read_to_string(&manifest_path)?;
    Ok(parse_manifest_dependencies(&manifest))
}

/// Unpack the gzip-compressed tarball into the scratch directory
///
/// Only regular files and directories are materialized; links and special
/// entries are skipped, as are entries whose paths would escape the
/// scratch directory.
fn unpack_archive(archive: &[u8], scratch_dir: &Path) -> Result<()> {
    // Spool to a uniquely named temp file; RAII removal covers every exit
    // path, and the file is gone before the scratch directory is scanned
    let mut spool = tempfile::Builder::new()
        .prefix("archive-")
        .suffix(".tar.gz")
        .tempfile_in(scratch_dir)?;
    spool.write_all(archive)?;
    spool.flush()?;

    let reader = File::open(spool.path())?;
    let mut tarball = Archive::new(GzDecoder::new(reader));
    tarball.set_preserve_permissions(false);
    tarball.set_preserve_mtime(false);

    let entries = tarball
        .entries()
        .map_err(|e| Error::Extraction(format!("failed to unpack archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::Extraction(format!("failed to unpack archive: {}", e)))?;

        let kind = entry.header().entry_type();
        if !kind.is_file() && !kind.is_dir() {
            continue;
        }

        // unpack_in refuses paths that leave the scratch directory
        entry
            .unpack_in(scratch_dir)
            .map_err(|e| Error::Extraction(format!("failed to unpack archive: {}", e)))?;
    }

    Ok(())
}

/// Find the package root: the first top-level directory in name order
///
/// Registries conventionally publish archives with a single
/// `{package}-{version}/` root.
fn first_package_root(scratch_dir: &Path) -> Result<PathBuf> {
    let mut entries: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(scratch_dir)? {
        entries.push(entry?.path());
    }

    if entries.is_empty() {
        return Err(Error::Extraction("archive is empty".to_string()));
    }

    entries.sort();
    entries
        .into_iter()
        .find(|path| path.is_dir())
        .ok_or_else(|| Error::Extraction("manifest not found".to_string()))
}

/// One `[section]` of a manifest with its raw body text
struct ManifestSection {
    name: String,
    body: String,
}

/// Scan manifest text for dependency declarations
///
/// Records appear in declaration order; duplicates across sections are not
/// collapsed. Lines that do not form a recognizable `key = value` pair are
/// skipped, never reported as errors.
pub fn parse_manifest_dependencies(manifest: &str) -> Vec<DependencyRecord> {
    let mut records = Vec::new();

    for section in split_sections(manifest) {
        if !is_dependency_section(&section.name) {
            continue;
        }

        for line in section.body.lines() {
            if let Some((key, value)) = key_value(line) {
                records.push(DependencyRecord::from_requirement(
                    key,
                    interpret_requirement(value),
                ));
            }
        }
    }

    records
}

fn split_sections(manifest: &str) -> Vec<ManifestSection> {
    let mut sections = Vec::new();
    let mut current: Option<ManifestSection> = None;

    for raw_line in manifest.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = section_header(line) {
            if let Some(section) = current.take() {
                sections.push(section);
            }
            current = Some(ManifestSection {
                name: name.to_string(),
                body: String::new(),
            });
            continue;
        }

        // Text before the first header belongs to no section
        if let Some(section) = current.as_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        }
    }

    if let Some(section) = current {
        sections.push(section);
    }

    sections
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']')
}

fn is_dependency_section(name: &str) -> bool {
    name == "dependencies" || name.starts_with("dependencies.")
}

fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    let key_ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !key_ok || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Interpret a dependency value: quoted literal, inline table with a
/// `version` entry, or the `"unknown"` sentinel for everything else
fn interpret_requirement(value: &str) -> String {
    if let Some(literal) = quoted_literal(value) {
        return literal.to_string();
    }

    if value.starts_with('{') && value.ends_with('}') {
        let body = &value[1..value.len() - 1];
        for item in body.split(',') {
            if let Some((key, item_value)) = item.split_once('=') {
                if key.trim() == "version" {
                    if let Some(literal) = quoted_literal(item_value.trim()) {
                        return literal.to_string();
                    }
                }
            }
        }
    }

    UNKNOWN_REQUIREMENT.to_string()
}

fn quoted_literal(value: &str) -> Option<&str> {
    let inner = value.strip_prefix('"')?.strip_suffix('"')?;
    if inner.contains('"') {
        return None;
    }
    Some(inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tar::Builder;
    use tempfile::TempDir;

    /// Build a gzipped tarball from (path, content) pairs; paths ending in
    /// '/' become directory entries
    fn gzipped_tarball(entries: &[(&str, &str)]) -> Vec<u8> {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(enc);

        for (path, content) in entries {
            let mut header = tar::Header::new_gnu();
            if path.ends_with('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            } else {
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, content.as_bytes())
                    .unwrap();
            }
        }

        builder.into_inner().unwrap().finish().unwrap()
    }

    fn empty_tarball() -> Vec<u8> {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let builder = Builder::new(enc);
        builder.into_inner().unwrap().finish().unwrap()
    }

    /// Leftover spool files in a directory, by the "archive-" name prefix
    fn spool_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("archive-"))
            .collect()
    }

    const SIMPLE_MANIFEST: &str = "[package]\n\
        name = \"demo\"\n\
        version = \"1.0.0\"\n\
        \n\
        [dependencies]\n\
        serde = \"1.0\"\n\
        libc = { version = \"0.2\", default-features = false }\n";

    // ============================================================================
    // extract_manifest_dependencies tests
    // ============================================================================

    #[test]
    fn test_extract_from_valid_archive() {
        let archive = gzipped_tarball(&[
            ("demo-1.0.0/", ""),
            ("demo-1.0.0/Cargo.toml", SIMPLE_MANIFEST),
            ("demo-1.0.0/src/lib.rs", "pub fn demo() {}\n"),
        ]);

        let scratch = TempDir::new().unwrap();
        let deps = extract_manifest_dependencies(&archive, scratch.path()).unwrap();

        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "serde");
        assert_eq!(deps[0].requirement, "1.0");
        assert_eq!(deps[1].name, "libc");
        assert_eq!(deps[1].requirement, "0.2");

        // The unpacked tree is in place and the spool file is gone
        assert!(scratch.path().join("demo-1.0.0/src/lib.rs").exists());
        assert!(spool_files(scratch.path()).is_empty());
    }

    #[test]
    fn test_extract_without_directory_entries() {
        // Many tarballs carry no explicit directory entries; parents are
        // created on demand
        let archive = gzipped_tarball(&[("demo-0.1.0/Cargo.toml", SIMPLE_MANIFEST)]);

        let scratch = TempDir::new().unwrap();
        let deps = extract_manifest_dependencies(&archive, scratch.path()).unwrap();

        assert_eq!(deps.len(), 2);
    }

    #[test]
    fn test_extract_empty_archive() {
        let scratch = TempDir::new().unwrap();
        let err = extract_manifest_dependencies(&empty_tarball(), scratch.path()).unwrap_err();

        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains("archive is empty"));
        assert!(spool_files(scratch.path()).is_empty());
    }

    #[test]
    fn test_extract_corrupt_archive() {
        let scratch = TempDir::new().unwrap();
        let err =
            extract_manifest_dependencies(b"definitely not gzip", scratch.path()).unwrap_err();

        assert!(matches!(err, Error::Extraction(_)));
        assert!(err.to_string().contains("failed to unpack archive"));
        assert!(spool_files(scratch.path()).is_empty());
    }

    #[test]
    fn test_extract_top_level_files_only() {
        let archive = gzipped_tarball(&[("README.md", "plain file, no package root\n")]);

        let scratch = TempDir::new().unwrap();
        let err = extract_manifest_dependencies(&archive, scratch.path()).unwrap_err();

        assert!(err.to_string().contains("manifest not found"));
    }

    #[test]
    fn test_extract_root_without_manifest() {
        let archive = gzipped_tarball(&[
            ("demo-1.0.0/", ""),
            ("demo-1.0.0/README.md", "no manifest here\n"),
        ]);

        let scratch = TempDir::new().unwrap();
        let err = extract_manifest_dependencies(&archive, scratch.path()).unwrap_err();

        assert!(err.to_string().contains("manifest not found"));
        assert!(spool_files(scratch.path()).is_empty());
    }

    #[test]
    fn test_extract_first_directory_wins() {
        let second = "[dependencies]\nrand = \"0.8\"\n";
        let archive = gzipped_tarball(&[
            ("zzz-2.0.0/Cargo.toml", second),
            ("aaa-1.0.0/Cargo.toml", SIMPLE_MANIFEST),
        ]);

        let scratch = TempDir::new().unwrap();
        let deps = extract_manifest_dependencies(&archive, scratch.path()).unwrap();

        // Name order decides the package root, not archive order
        assert_eq!(deps[0].name, "serde");
    }

    #[test]
    fn test_extract_skips_link_entries() {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(enc);

        let mut header = tar::Header::new_gnu();
        header.set_size(SIMPLE_MANIFEST.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                "demo-1.0.0/Cargo.toml",
                SIMPLE_MANIFEST.as_bytes(),
            )
            .unwrap();

        let mut link = tar::Header::new_gnu();
        link.set_entry_type(tar::EntryType::Symlink);
        link.set_size(0);
        link.set_mode(0o777);
        link.set_cksum();
        builder
            .append_link(&mut link, "demo-1.0.0/evil", "/etc/passwd")
            .unwrap();

        let archive = builder.into_inner().unwrap().finish().unwrap();

        let scratch = TempDir::new().unwrap();
        let deps = extract_manifest_dependencies(&archive, scratch.path()).unwrap();

        assert_eq!(deps.len(), 2);
        assert!(!scratch.path().join("demo-1.0.0/evil").exists());
    }

    #[test]
    fn test_extract_skips_escaping_entries() {
        let enc = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = Builder::new(enc);

        let mut header = tar::Header::new_gnu();
        header.set_size(SIMPLE_MANIFEST.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                "demo-1.0.0/Cargo.toml",
                SIMPLE_MANIFEST.as_bytes(),
            )
            .unwrap();

        // set_path rejects "..", so write the raw name bytes directly to
        // forge a traversal entry the way a hostile archive would
        let mut evil = tar::Header::new_gnu();
        let name = b"../evil.txt";
        evil.as_old_mut().name[..name.len()].copy_from_slice(name);
        evil.set_size(6);
        evil.set_mode(0o644);
        evil.set_cksum();
        builder.append(&evil, &b"gotcha"[..]).unwrap();

        let archive = builder.into_inner().unwrap().finish().unwrap();

        let outer = TempDir::new().unwrap();
        let scratch = outer.path().join("scratch");
        fs::create_dir(&scratch).unwrap();

        let deps = extract_manifest_dependencies(&archive, &scratch).unwrap();

        assert_eq!(deps.len(), 2);
        assert!(!outer.path().join("evil.txt").exists());
    }

    // ============================================================================
    // parse_manifest_dependencies tests
    // ============================================================================

    #[test]
    fn test_parse_quoted_requirement() {
        let deps = parse_manifest_dependencies("[dependencies]\nserde = \"1.0\"\n");
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "serde");
        assert_eq!(deps[0].requirement, "1.0");
    }

    #[test]
    fn test_parse_inline_table_with_version() {
        let deps = parse_manifest_dependencies(
            "[dependencies]\ntokio = { version = \"1.38\", features = [\"full\"] }\n",
        );
        assert_eq!(deps[0].requirement, "1.38");
    }

    #[test]
    fn test_parse_inline_table_without_version() {
        let deps =
            parse_manifest_dependencies("[dependencies]\nlocal = { path = \"../local\" }\n");
        assert_eq!(deps[0].requirement, UNKNOWN_REQUIREMENT);
    }

    #[test]
    fn test_parse_git_dependency() {
        let deps = parse_manifest_dependencies(
            "[dependencies]\nfoo = { git = \"https://github.com/x/y\" }\n",
        );
        assert_eq!(deps[0].name, "foo");
        assert_eq!(deps[0].requirement, UNKNOWN_REQUIREMENT);
    }

    #[test]
    fn test_parse_unquoted_scalar() {
        let deps = parse_manifest_dependencies("[dependencies]\nweird = 1.0\n");
        assert_eq!(deps[0].requirement, UNKNOWN_REQUIREMENT);
    }

    #[test]
    fn test_parse_comments() {
        let deps = parse_manifest_dependencies(
            "# top comment\n[dependencies]\nserde = \"1.0\" # trailing\n# full-line comment\n",
        );
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].requirement, "1.0");
    }

    #[test]
    fn test_parse_non_dependency_sections_ignored() {
        let manifest = "[package]\n\
            name = \"demo\"\n\
            [dev-dependencies]\n\
            criterion = \"0.5\"\n\
            [build-dependencies]\n\
            cc = \"1.0\"\n\
            [dependencies]\n\
            serde = \"1.0\"\n";

        let deps = parse_manifest_dependencies(manifest);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "serde");
    }

    #[test]
    fn test_parse_dotted_dependency_section() {
        // [dependencies.X] bodies are scanned as plain key = value records
        let manifest = "[dependencies.extra]\nversion = \"2.0\"\noptional = true\n";

        let deps = parse_manifest_dependencies(manifest);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].name, "version");
        assert_eq!(deps[0].requirement, "2.0");
        assert_eq!(deps[1].name, "optional");
        assert_eq!(deps[1].requirement, UNKNOWN_REQUIREMENT);
    }

    #[test]
    fn test_parse_duplicates_preserved() {
        let manifest = "[dependencies]\n\
            serde = \"1.0\"\n\
            [dependencies]\n\
            serde = \"2.0\"\n";

        let deps = parse_manifest_dependencies(manifest);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].requirement, "1.0");
        assert_eq!(deps[1].requirement, "2.0");
    }

    #[test]
    fn test_parse_declaration_order() {
        let manifest = "[dependencies]\nzlib = \"1\"\nalpha = \"2\"\nmiddle = \"3\"\n";

        let names: Vec<String> = parse_manifest_dependencies(manifest)
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["zlib", "alpha", "middle"]);
    }

    #[test]
    fn test_parse_malformed_lines_skipped() {
        let manifest = "[dependencies]\n\
            = \"1.0\"\n\
            bad key = \"1.0\"\n\
            no-equals-sign\n\
            empty-value =\n\
            fine = \"1.0\"\n";

        let deps = parse_manifest_dependencies(manifest);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "fine");
    }

    #[test]
    fn test_parse_empty_manifest() {
        assert!(parse_manifest_dependencies("").is_empty());
        assert!(parse_manifest_dependencies("[dependencies]\n").is_empty());
    }
}
