//! Configuration and identifiers for the cacheseal integrity pipeline.
//!
//! This crate defines the schema layer: the TOML pipeline configuration
//! (`ConfigFile` on disk, `Config` once validated and resolved), the package
//! manifest version reader, and the `CacheKey` / `Digest` newtypes shared by
//! every other crate.

pub mod config;
pub mod package;
pub mod types;

pub use config::{
    load_config, parse_config_str, Artifact, ArtifactEntry, Config, ConfigFile, ReleaseSection,
    VersionTarget, CONFIG_FILE, DEFAULT_COMMIT_MESSAGE, DEFAULT_MARKER, DEFAULT_VCS_BACKEND,
    VERSION_TEMPLATE,
};
pub use package::{parse_version_str, read_version};
pub use types::{CacheKey, Digest, DIGEST_HEX_LEN};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unsupported config_version: {0}, expected 1")]
    UnsupportedVersion(u32),
    #[error("config declares no artifacts")]
    NoArtifacts,
    #[error("duplicate cache key: {0}")]
    DuplicateKey(String),
    #[error("invalid cache key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },
    #[error("invalid manifest marker '{0}': expected an identifier")]
    InvalidMarker(String),
    #[error("empty placeholder for version target {}", .0.display())]
    EmptyPlaceholder(PathBuf),
    #[error("release.branch requires release.remote")]
    BranchWithoutRemote,
    #[error("failed to read package manifest {}: {source}", path.display())]
    PackageRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse package manifest: {0}")]
    PackageParse(#[from] serde_json::Error),
    #[error("package manifest has no version field")]
    MissingVersion,
    #[error("package manifest version is empty")]
    EmptyVersion,
}
