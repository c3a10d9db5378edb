use crate::StoreError;
use cacheseal_schema::Digest;
use sha2::{Digest as _, Sha384};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// SHA-384 of `data`, lowercase hex.
///
/// The same function authors and audits the embedded manifest, so both
/// directions always agree on the algorithm.
pub fn digest_bytes(data: &[u8]) -> Digest {
    Digest::new(hex::encode(Sha384::digest(data)))
}

/// Digest a file's full contents, read as one buffer.
pub fn digest_file(path: &Path) -> Result<Digest, StoreError> {
    let data = fs::read(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            StoreError::FileNotFound(path.to_path_buf())
        } else {
            StoreError::Io(e)
        }
    })?;
    let digest = digest_bytes(&data);
    tracing::debug!("digest {} = {digest}", path.display());
    Ok(digest)
}
