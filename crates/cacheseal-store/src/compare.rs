//! The single definition of "this embedded digest matches".
//!
//! Both the updater's self-check and the standalone verifier go through
//! [`compare_entry`], so the two can never disagree on what a match is.

use crate::embed::IntegrityManifest;
use cacheseal_schema::{CacheKey, Digest};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// A single integrity problem, named by cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    /// The tracked artifact does not exist on disk.
    MissingArtifact { key: CacheKey, path: PathBuf },
    /// The embedded manifest has no entry for the key.
    MissingEntry { key: CacheKey },
    /// The embedded digest differs from the freshly computed one.
    DigestMismatch {
        key: CacheKey,
        recorded: Digest,
        computed: Digest,
    },
    /// The embedded manifest holds a key that was not written.
    UnexpectedEntry { key: CacheKey },
}

impl Finding {
    pub fn key(&self) -> &CacheKey {
        match self {
            Self::MissingArtifact { key, .. }
            | Self::MissingEntry { key }
            | Self::DigestMismatch { key, .. }
            | Self::UnexpectedEntry { key } => key,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingArtifact { key, path } => {
                write!(f, "{key}: artifact missing at {}", path.display())
            }
            Self::MissingEntry { key } => write!(f, "{key}: no entry in embedded manifest"),
            Self::DigestMismatch {
                key,
                recorded,
                computed,
            } => write!(
                f,
                "{key}: digest mismatch (manifest {recorded}, actual {computed})"
            ),
            Self::UnexpectedEntry { key } => write!(f, "{key}: unexpected entry in manifest"),
        }
    }
}

/// Compare one recorded digest with the digest just computed for `key`.
///
/// Equality is exact string equality on the hex text.
pub fn compare_entry(key: &CacheKey, recorded: Option<&Digest>, computed: &Digest) -> Option<Finding> {
    match recorded {
        None => Some(Finding::MissingEntry { key: key.clone() }),
        Some(r) if r.as_str() == computed.as_str() => None,
        Some(r) => Some(Finding::DigestMismatch {
            key: key.clone(),
            recorded: r.clone(),
            computed: computed.clone(),
        }),
    }
}

/// Compare every expected entry against an embedded manifest.
///
/// With `strict`, keys present in `embedded` but absent from `expected`
/// are findings too.
pub fn compare_manifests(
    expected: &IntegrityManifest,
    embedded: &IntegrityManifest,
    strict: bool,
) -> Vec<Finding> {
    let mut findings: Vec<Finding> = expected
        .entries()
        .iter()
        .filter_map(|(key, digest)| compare_entry(key, embedded.get(key), digest))
        .collect();
    if strict {
        findings.extend(
            embedded
                .keys()
                .filter(|k| expected.get(k).is_none())
                .map(|k| Finding::UnexpectedEntry { key: k.clone() }),
        );
    }
    findings
}
