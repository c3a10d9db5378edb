use crate::compare::compare_manifests;
use crate::digest::digest_file;
use crate::embed::{extract, patch, IntegrityManifest};
use crate::{read_text, write_atomic, StoreError};
use cacheseal_schema::{Artifact, CacheKey, Digest};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A freshly computed digest for one tracked artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub key: CacheKey,
    pub path: PathBuf,
    pub digest: Digest,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    /// Entries written to the host artifact, in configuration order.
    pub records: Vec<ArtifactRecord>,
    /// Keys left out because their artifact does not exist.
    pub skipped: Vec<CacheKey>,
    /// False when the host artifact already held exactly this manifest.
    pub rewritten: bool,
}

/// Recompute every artifact digest, rewrite the manifest embedded in `host`,
/// and confirm the rewrite by reading it back from disk.
///
/// Missing artifacts are skipped with a warning. The self-check compares the
/// re-extracted manifest against the computed digests; any difference fails
/// with `WriteVerificationMismatch` naming every offending key.
pub fn update_hashes(
    host: &Path,
    marker: &str,
    artifacts: &[Artifact],
) -> Result<UpdateReport, StoreError> {
    let mut report = UpdateReport::default();
    let mut manifest = IntegrityManifest::new();

    for artifact in artifacts {
        if !artifact.path.exists() {
            tracing::warn!(
                "artifact for {} not found at {}, omitting from manifest",
                artifact.key,
                artifact.path.display()
            );
            report.skipped.push(artifact.key.clone());
            continue;
        }
        let digest = digest_file(&artifact.path)?;
        manifest.insert(artifact.key.clone(), digest.clone());
        report.records.push(ArtifactRecord {
            key: artifact.key.clone(),
            path: artifact.path.clone(),
            digest,
        });
    }

    let original = read_text(host)?;
    let patched = patch(&original, marker, &manifest)?;
    if patched == original {
        tracing::debug!("{} already up to date", host.display());
    } else {
        write_atomic(host, &patched)?;
        report.rewritten = true;
        tracing::info!(
            "wrote {} digests to {}",
            manifest.len(),
            host.display()
        );
    }

    let landed = read_text(host)?;
    let embedded = extract(&landed, marker)?;
    let findings = compare_manifests(&manifest, &embedded, true);
    if !findings.is_empty() {
        return Err(StoreError::WriteVerificationMismatch(findings));
    }

    Ok(report)
}
