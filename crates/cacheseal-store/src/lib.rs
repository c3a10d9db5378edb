//! Digesting, manifest patching, verification, and version injection for cacheseal.
//!
//! This crate provides the file-facing layer: SHA-384 digests (`digest_file`),
//! the embedded integrity manifest locator/patcher (`embed`), the shared
//! comparison primitive (`compare_entry`), the self-verifying `update_hashes`,
//! the read-only `verify_hashes` gate, and `inject_version` for placeholder
//! substitution. All rewrites go through an atomic temp-file-and-rename.

pub mod compare;
pub mod digest;
pub mod embed;
pub mod inject;
pub mod update;
pub mod verify;

pub use compare::{compare_entry, compare_manifests, Finding};
pub use digest::{digest_bytes, digest_file};
pub use embed::{extract, locate, patch, render, IntegrityManifest};
pub use inject::{inject_version, InjectOutcome, InjectReport, TargetOutcome};
pub use update::{update_hashes, ArtifactRecord, UpdateReport};
pub use verify::{verify_hashes, ArtifactCheck, CheckStatus, VerifyReport};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Replace `dest` with `content` via a temp file in the same directory, so a
/// crash never leaves a half-written artifact behind.
pub(crate) fn write_atomic(dest: &Path, content: &str) -> Result<(), StoreError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(dest) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Read a text file, mapping a missing path to `FileNotFound`.
pub(crate) fn read_text(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::FileNotFound(path.to_path_buf())
        } else {
            StoreError::Io(e)
        }
    })
}

fn format_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("manifest block '{0} = {{ ... }}' not found in host artifact")]
    ManifestNotFound(String),
    #[error("manifest block '{marker}' found {count} times in host artifact, expected once")]
    ManifestAmbiguous { marker: String, count: usize },
    #[error("duplicate key in embedded manifest: {0}")]
    DuplicateEntry(String),
    #[error("malformed embedded manifest near '{0}'")]
    MalformedManifest(String),
    #[error("invalid manifest pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("written manifest does not match computed digests: {}", format_findings(.0))]
    WriteVerificationMismatch(Vec<Finding>),
}
