//! Cache controller: one verified artifact per save directory.
//!
//! `load` never fails. A missing, unreadable, corrupt or stale artifact is a
//! miss and the caller rebuilds.

use crate::artifact::{decode_artifact, decode_header, encode_artifact, write_atomic};
use crate::signature::compute_signature;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tabgraph_schema::{DataError, Result};

/// File name of the constructed-graph artifact inside a save directory.
pub const GRAPH_CACHE_FILE: &str = "graphs.cbor";

#[derive(Debug, Clone)]
pub struct CacheController {
    path: PathBuf,
}

impl CacheController {
    /// Controller for the graph artifact in `save_dir`.
    pub fn new(save_dir: &Path) -> Self {
        Self::at(save_dir.join(GRAPH_CACHE_FILE))
    }

    /// Controller for an artifact at an explicit path.
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn signature<P: AsRef<Path>>(
        manifest_path: &Path,
        raw_files: &[P],
        hash_key: &[String],
    ) -> Result<String> {
        compute_signature(manifest_path, raw_files, hash_key)
    }

    /// Cached value for `signature`, or `None` on any kind of miss.
    pub fn load<T: DeserializeOwned>(&self, signature: &str) -> Option<T> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no cache artifact");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "cache artifact unreadable");
                return None;
            }
        };

        match decode_header(&bytes) {
            Ok((header, _)) if header.signature != signature => {
                tracing::debug!(
                    path = %self.path.display(),
                    cached = %header.signature,
                    current = %signature,
                    "cache artifact is stale"
                );
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt cache artifact");
                return None;
            }
        }

        match decode_artifact::<T>(&bytes) {
            Ok((_, value)) => Some(value),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt cache artifact");
                None
            }
        }
    }

    /// Atomically replace the artifact with `value` under `signature`.
    pub fn store<T: Serialize>(&self, signature: &str, value: &T) -> Result<()> {
        let bytes = encode_artifact(signature, value).map_err(|e| {
            DataError::io(
                &self.path,
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()),
            )
        })?;
        write_atomic(&self.path, &bytes)?;
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "stored cache artifact");
        Ok(())
    }

    /// True when an artifact exists and was built from `signature`.
    pub fn has(&self, signature: &str) -> bool {
        std::fs::read(&self.path)
            .ok()
            .and_then(|bytes| decode_header(&bytes).ok())
            .is_some_and(|(header, _)| header.signature == signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit_then_stale() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheController::new(dir.path());
        assert_eq!(cache.load::<Vec<i64>>("sha256:a"), None);

        cache.store("sha256:a", &vec![1_i64, 2]).unwrap();
        assert!(cache.has("sha256:a"));
        assert_eq!(cache.load::<Vec<i64>>("sha256:a"), Some(vec![1, 2]));
        assert_eq!(cache.load::<Vec<i64>>("sha256:b"), None);
        assert!(!cache.has("sha256:b"));
    }

    #[test]
    fn corrupt_artifact_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheController::new(dir.path());
        std::fs::write(cache.path(), b"garbage").unwrap();
        assert_eq!(cache.load::<Vec<i64>>("sha256:a"), None);

        cache.store("sha256:a", &vec![1_i64]).unwrap();
        assert_eq!(cache.load::<String>("sha256:a"), None);
    }
}
