use crate::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// The subset of `package.json` this tool reads. Every other field is ignored.
#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    version: Option<String>,
}

/// Parse the release version out of a package manifest's JSON text.
pub fn parse_version_str(input: &str) -> Result<String, ConfigError> {
    let manifest: PackageManifest = serde_json::from_str(input)?;
    let version = manifest.version.ok_or(ConfigError::MissingVersion)?;
    let version = version.trim();
    if version.is_empty() {
        return Err(ConfigError::EmptyVersion);
    }
    Ok(version.to_owned())
}

/// Read the release version from the package manifest at `path`.
pub fn read_version(path: &Path) -> Result<String, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::PackageRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_version_str(&content)
}
