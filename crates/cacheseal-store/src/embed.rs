//! Locating, rendering, and parsing the integrity manifest embedded in the
//! host artifact.
//!
//! The manifest is a literal block of the form
//!
//! ```text
//! RESOURCE_INTEGRITY = {
//!     "/dist/bundle.js?v=1.0.0": "<96 hex digits>",
//!     "/dist/app.css?v=1.0.0": "<96 hex digits>"
//! }
//! ```
//!
//! Cache keys never contain braces or quotes, so the block is delimited by
//! the first `}` after the opening marker and needs no balanced matching.
//! Everything outside the matched span is left byte-for-byte untouched.

use crate::StoreError;
use cacheseal_schema::{CacheKey, Digest};
use regex::Regex;
use serde::Serialize;
use std::ops::Range;
use std::sync::LazyLock;

static ENTRY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?:"(?P<kd>[^"'\r\n]*)"|'(?P<ks>[^"'\r\n]*)')"#,
        r#"\s*:\s*"#,
        r#"(?:"(?P<vd>[^"'\r\n]*)"|'(?P<vs>[^"'\r\n]*)')"#,
    ))
    .expect("valid entry pattern")
});

const INDENT: &str = "    ";

/// Ordered mapping from cache key to digest, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityManifest {
    entries: Vec<(CacheKey, Digest)>,
}

impl IntegrityManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns `false` and leaves the manifest unchanged if
    /// the key is already present.
    pub fn insert(&mut self, key: CacheKey, digest: Digest) -> bool {
        if self.get(&key).is_some() {
            return false;
        }
        self.entries.push((key, digest));
        true
    }

    pub fn get(&self, key: &str) -> Option<&Digest> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, d)| d)
    }

    pub fn entries(&self) -> &[(CacheKey, Digest)] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn block_regex(marker: &str) -> Result<Regex, StoreError> {
    Ok(Regex::new(&format!(
        r"{}\s*=\s*\{{[^{{}}]*\}}",
        regex::escape(marker)
    ))?)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Find the byte range of the manifest block, from the marker through the
/// closing brace.
///
/// Fails with `ManifestNotFound` when there is no block and with
/// `ManifestAmbiguous` when there is more than one.
pub fn locate(host: &str, marker: &str) -> Result<Range<usize>, StoreError> {
    let re = block_regex(marker)?;
    let bytes = host.as_bytes();
    let spans: Vec<Range<usize>> = re
        .find_iter(host)
        .filter(|m| m.start() == 0 || !is_ident_byte(bytes[m.start() - 1]))
        .map(|m| m.range())
        .collect();

    match spans.len() {
        0 => Err(StoreError::ManifestNotFound(marker.to_owned())),
        1 => Ok(spans[0].clone()),
        n => Err(StoreError::ManifestAmbiguous {
            marker: marker.to_owned(),
            count: n,
        }),
    }
}

/// Serialize a manifest block: one `"key": "digest"` pair per line so that
/// history diffs stay reviewable.
pub fn render(marker: &str, manifest: &IntegrityManifest) -> String {
    if manifest.is_empty() {
        return format!("{marker} = {{}}");
    }
    let body = manifest
        .entries()
        .iter()
        .map(|(key, digest)| format!("{INDENT}\"{key}\": \"{digest}\""))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{marker} = {{\n{body}\n}}")
}

/// Replace the whole manifest block in `host` with a freshly rendered one.
pub fn patch(host: &str, marker: &str, manifest: &IntegrityManifest) -> Result<String, StoreError> {
    let span = locate(host, marker)?;
    let rendered = render(marker, manifest);
    let mut out = String::with_capacity(host.len() - span.len() + rendered.len());
    out.push_str(&host[..span.start]);
    out.push_str(&rendered);
    out.push_str(&host[span.end..]);
    Ok(out)
}

/// Parse the embedded manifest block back into ordered entries.
///
/// Anything inside the braces other than entries, commas, and whitespace
/// is rejected, as are repeated keys.
pub fn extract(host: &str, marker: &str) -> Result<IntegrityManifest, StoreError> {
    let span = locate(host, marker)?;
    let block = &host[span];
    let open = block.find('{').map_or(0, |i| i + 1);
    let body = &block[open..block.len() - 1];

    let mut manifest = IntegrityManifest::new();
    let mut cursor = 0;
    for caps in ENTRY_REGEX.captures_iter(body) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        check_separator(&body[cursor..whole.start])?;
        cursor = whole.end;

        let quoted = |double: &str, single: &str| {
            caps.name(double)
                .or_else(|| caps.name(single))
                .map_or("", |m| m.as_str())
        };
        let key = CacheKey::new(quoted("kd", "ks"));
        let digest = Digest::new(quoted("vd", "vs"));
        if !manifest.insert(key.clone(), digest) {
            return Err(StoreError::DuplicateEntry(key.into_inner()));
        }
    }
    check_separator(&body[cursor..])?;
    Ok(manifest)
}

fn check_separator(text: &str) -> Result<(), StoreError> {
    if text.chars().all(|c| c.is_whitespace() || c == ',') {
        Ok(())
    } else {
        Err(StoreError::MalformedManifest(text.trim().to_owned()))
    }
}
