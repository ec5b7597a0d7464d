//! Content signatures over a manifest and the tables it references.
//!
//! A signature is a SHA-256 over file *contents*, so a copied dataset keeps
//! its signature and any edited byte changes it. Every component is length
//! prefixed.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use tabgraph_schema::{DataError, Result};

pub const SIGNATURE_PREFIX: &str = "sha256:";

/// Signature of `manifest_path`, each of `raw_files` (in the order given) and
/// the caller's `hash_key` strings.
///
/// Raw files are named relative to the manifest's directory when possible.
pub fn compute_signature<P: AsRef<Path>>(
    manifest_path: &Path,
    raw_files: &[P],
    hash_key: &[String],
) -> Result<String> {
    let mut hasher = Sha256::new();
    let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));

    hash_file(&mut hasher, manifest_path)?;
    for file in raw_files {
        let file = file.as_ref();
        let name = file.strip_prefix(base).unwrap_or(file);
        hash_bytes(&mut hasher, name.to_string_lossy().as_bytes());
        hash_file(&mut hasher, file)?;
    }

    hasher.update((hash_key.len() as u64).to_le_bytes());
    for key in hash_key {
        hash_bytes(&mut hasher, key.as_bytes());
    }

    Ok(format!("{SIGNATURE_PREFIX}{:x}", hasher.finalize()))
}

fn hash_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn hash_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| DataError::io(path, e))?;
    let len = file.metadata().map_err(|e| DataError::io(path, e))?.len();
    hasher.update(len.to_le_bytes());
    std::io::copy(&mut file, hasher).map_err(|e| DataError::io(path, e))?;
    Ok(())
}
