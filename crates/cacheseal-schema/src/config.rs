use crate::package::read_version;
use crate::types::CacheKey;
use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "cacheseal.toml";

/// Template expanded with the package version in cache keys and commit messages.
pub const VERSION_TEMPLATE: &str = "{version}";

pub const DEFAULT_MARKER: &str = "RESOURCE_INTEGRITY";
pub const DEFAULT_PACKAGE_MANIFEST: &str = "package.json";
pub const DEFAULT_COMMIT_MESSAGE: &str = "chore(release): v{version}";
pub const DEFAULT_VCS_BACKEND: &str = "git";

/// On-disk shape of `cacheseal.toml`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub config_version: u32,
    #[serde(default = "default_package_manifest")]
    pub package_manifest: PathBuf,
    pub host_artifact: PathBuf,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
    #[serde(default)]
    pub version_targets: Vec<VersionTarget>,
    #[serde(default)]
    pub release: ReleaseSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ArtifactEntry {
    pub key: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VersionTarget {
    pub path: PathBuf,
    pub placeholder: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ReleaseSection {
    #[serde(default = "default_vcs_backend")]
    pub backend: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    #[serde(default)]
    pub stage: Vec<PathBuf>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl Default for ReleaseSection {
    fn default() -> Self {
        Self {
            backend: default_vcs_backend(),
            commit_message: default_commit_message(),
            stage: Vec::new(),
            remote: None,
            branch: None,
        }
    }
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_owned()
}

fn default_package_manifest() -> PathBuf {
    PathBuf::from(DEFAULT_PACKAGE_MANIFEST)
}

fn default_vcs_backend() -> String {
    DEFAULT_VCS_BACKEND.to_owned()
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_owned()
}

/// A tracked artifact with its cache key fully expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub key: CacheKey,
    pub path: PathBuf,
}

/// Validated configuration with every path resolved against the config
/// file's directory. Shared by every command, so update and verify always
/// see the same artifact list.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub package_manifest: PathBuf,
    pub host_artifact: PathBuf,
    pub marker: String,
    pub artifacts: Vec<Artifact>,
    pub version_targets: Vec<VersionTarget>,
    pub release: ReleaseSection,
}

impl ConfigFile {
    /// Structural checks that do not need the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.config_version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.config_version));
        }
        if !is_identifier(&self.marker) {
            return Err(ConfigError::InvalidMarker(self.marker.clone()));
        }
        if self.artifacts.is_empty() {
            return Err(ConfigError::NoArtifacts);
        }
        for target in &self.version_targets {
            if target.placeholder.is_empty() {
                return Err(ConfigError::EmptyPlaceholder(target.path.clone()));
            }
        }
        if self.release.branch.is_some() && self.release.remote.is_none() {
            return Err(ConfigError::BranchWithoutRemote);
        }
        Ok(())
    }

    fn needs_version(&self) -> bool {
        self.artifacts
            .iter()
            .any(|a| a.key.contains(VERSION_TEMPLATE))
    }

    /// Validate, expand `{version}` in keys, and anchor relative paths at `root`.
    ///
    /// The package manifest is only read when some key uses the template.
    pub fn resolve(self, root: &Path) -> Result<Config, ConfigError> {
        self.validate()?;

        let package_manifest = root.join(&self.package_manifest);
        let version = if self.needs_version() {
            Some(read_version(&package_manifest)?)
        } else {
            None
        };

        let mut seen = HashSet::new();
        let mut artifacts = Vec::with_capacity(self.artifacts.len());
        for entry in self.artifacts {
            let key = match &version {
                Some(v) => CacheKey::new(entry.key.replace(VERSION_TEMPLATE, v)),
                None => CacheKey::new(entry.key),
            };
            if key.is_empty() {
                return Err(ConfigError::InvalidKey {
                    key: key.into_inner(),
                    reason: "cache key must not be empty".to_owned(),
                });
            }
            if let Some(c) = key.invalid_char() {
                return Err(ConfigError::InvalidKey {
                    key: key.into_inner(),
                    reason: format!("cache key must not contain {c:?}"),
                });
            }
            if !seen.insert(key.clone()) {
                return Err(ConfigError::DuplicateKey(key.into_inner()));
            }
            artifacts.push(Artifact {
                key,
                path: root.join(entry.path),
            });
        }

        let version_targets = self
            .version_targets
            .into_iter()
            .map(|t| VersionTarget {
                path: root.join(t.path),
                placeholder: t.placeholder,
            })
            .collect();

        let mut release = self.release;
        release.stage = release.stage.into_iter().map(|p| root.join(p)).collect();

        Ok(Config {
            root: root.to_path_buf(),
            package_manifest,
            host_artifact: root.join(self.host_artifact),
            marker: self.marker,
            artifacts,
            version_targets,
            release,
        })
    }
}

impl Config {
    /// Files handed to the version-control stage step.
    ///
    /// An explicit `release.stage` list wins; otherwise every version target
    /// plus the host artifact, without duplicates.
    pub fn stage_paths(&self) -> Vec<PathBuf> {
        if !self.release.stage.is_empty() {
            return self.release.stage.clone();
        }
        let mut paths: Vec<PathBuf> = Vec::new();
        let candidates = self
            .version_targets
            .iter()
            .map(|t| &t.path)
            .chain(std::iter::once(&self.host_artifact));
        for path in candidates {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    pub fn commit_message(&self, version: &str) -> String {
        self.release
            .commit_message
            .replace(VERSION_TEMPLATE, version)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub fn parse_config_str(input: &str) -> Result<ConfigFile, ConfigError> {
    Ok(toml::from_str(input)?)
}

/// Load, validate, and resolve the configuration at `path`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let file = parse_config_str(&content)?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let root = std::path::absolute(parent).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.resolve(&root)
}
