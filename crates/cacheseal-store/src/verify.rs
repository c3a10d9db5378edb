use crate::compare::{compare_entry, Finding};
use crate::digest::digest_file;
use crate::embed::extract;
use crate::{read_text, StoreError};
use cacheseal_schema::{Artifact, CacheKey, Digest};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
}

/// Outcome for one tracked artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactCheck {
    pub key: CacheKey,
    pub path: PathBuf,
    pub status: CheckStatus,
    pub computed: Option<Digest>,
    pub finding: Option<Finding>,
}

#[derive(Debug, Default, Serialize)]
pub struct VerifyReport {
    pub checks: Vec<ArtifactCheck>,
    /// Keys embedded in the host artifact that no configured artifact names.
    pub untracked: Vec<CacheKey>,
}

impl VerifyReport {
    pub fn passed(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status == CheckStatus::Pass)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.checks.len() - self.passed()
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.checks.iter().filter_map(|c| c.finding.as_ref())
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }
}

/// Recompute every artifact digest and compare it with the manifest already
/// embedded in `host`. Never writes anything.
///
/// Unlike [`update_hashes`](crate::update_hashes), a missing artifact is a
/// finding: the deployment being checked is supposed to be complete. All
/// findings are collected before returning. Only a missing or unparseable
/// manifest block, or an I/O error other than a missing artifact, aborts
/// the pass.
pub fn verify_hashes(
    host: &Path,
    marker: &str,
    artifacts: &[Artifact],
) -> Result<VerifyReport, StoreError> {
    let embedded = extract(&read_text(host)?, marker)?;
    let mut report = VerifyReport::default();

    for artifact in artifacts {
        let (computed, finding) = match digest_file(&artifact.path) {
            Ok(digest) => {
                let finding = compare_entry(&artifact.key, embedded.get(&artifact.key), &digest);
                (Some(digest), finding)
            }
            Err(StoreError::FileNotFound(path)) => (
                None,
                Some(Finding::MissingArtifact {
                    key: artifact.key.clone(),
                    path,
                }),
            ),
            Err(e) => return Err(e),
        };

        let status = if finding.is_some() {
            CheckStatus::Fail
        } else {
            CheckStatus::Pass
        };
        report.checks.push(ArtifactCheck {
            key: artifact.key.clone(),
            path: artifact.path.clone(),
            status,
            computed,
            finding,
        });
    }

    for key in embedded.keys() {
        if !artifacts.iter().any(|a| a.key == *key) {
            tracing::warn!("embedded manifest entry {key} is not a tracked artifact");
            report.untracked.push(key.clone());
        }
    }

    Ok(report)
}
