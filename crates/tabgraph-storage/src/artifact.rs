//! Verified artifact format: CBOR header + CBOR payload.
//!
//! ```text
//! [ header (CBOR) ][ payload (CBOR) ]
//! header = { magic, version, signature, content_length, content_checksum }
//! ```
//!
//! The header names the input signature the payload was built from and
//! carries a SHA-256 of the payload bytes. Any mismatch on read is an
//! [`ArtifactError`]; callers decide whether that is fatal.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Write;
use std::path::Path;
use tabgraph_schema::{DataError, Result};
use tempfile::NamedTempFile;

/// Magic bytes for Tabgraph cache artifacts
pub const MAGIC: [u8; 4] = *b"TGCA";

/// Current format version (semantic versioning packed)
pub const FORMAT_VERSION: u32 = 0x00_01_00_00; // 1.0.0

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub signature: String,
    pub content_length: u64,
    pub content_checksum: [u8; 32],
}

impl ArtifactHeader {
    pub fn new(signature: &str, content: &[u8]) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            signature: signature.to_string(),
            content_length: content.len() as u64,
            content_checksum: sha256(content),
        }
    }

    pub fn verify(&self) -> std::result::Result<(), ArtifactError> {
        if self.magic != MAGIC {
            return Err(ArtifactError::InvalidMagic);
        }
        if !is_version_compatible(self.version, FORMAT_VERSION) {
            return Err(ArtifactError::IncompatibleVersion {
                file_version: self.version,
                reader_version: FORMAT_VERSION,
            });
        }
        Ok(())
    }

    pub fn verify_content(&self, content: &[u8]) -> std::result::Result<(), ArtifactError> {
        if content.len() as u64 != self.content_length {
            return Err(ArtifactError::ContentLengthMismatch {
                expected: self.content_length,
                actual: content.len() as u64,
            });
        }
        if sha256(content) != self.content_checksum {
            return Err(ArtifactError::ChecksumMismatch);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("invalid magic bytes")]
    InvalidMagic,

    #[error("incompatible version: file {file_version:#x}, reader {reader_version:#x}")]
    IncompatibleVersion { file_version: u32, reader_version: u32 },

    #[error("content length mismatch: expected {expected}, got {actual}")]
    ContentLengthMismatch { expected: u64, actual: u64 },

    #[error("content checksum mismatch")]
    ChecksumMismatch,

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Same major version, and the reader knows at least the file's minor version.
fn is_version_compatible(file_version: u32, reader_version: u32) -> bool {
    let major = |v: u32| (v >> 24) & 0xFF;
    let minor = |v: u32| (v >> 16) & 0xFF;
    major(file_version) == major(reader_version) && minor(reader_version) >= minor(file_version)
}

pub fn encode_artifact<T: Serialize>(
    signature: &str,
    payload: &T,
) -> std::result::Result<Vec<u8>, ArtifactError> {
    let mut content = Vec::new();
    ciborium::into_writer(payload, &mut content).map_err(|e| ArtifactError::Encode(e.to_string()))?;

    let header = ArtifactHeader::new(signature, &content);
    let mut output = Vec::with_capacity(content.len() + 128);
    ciborium::into_writer(&header, &mut output).map_err(|e| ArtifactError::Encode(e.to_string()))?;
    output.extend_from_slice(&content);
    Ok(output)
}

/// Decode and verify only the header, returning it with the payload offset.
pub fn decode_header(data: &[u8]) -> std::result::Result<(ArtifactHeader, usize), ArtifactError> {
    let mut cursor = std::io::Cursor::new(data);
    let header: ArtifactHeader =
        ciborium::from_reader(&mut cursor).map_err(|e| ArtifactError::Decode(e.to_string()))?;
    header.verify()?;
    Ok((header, cursor.position() as usize))
}

pub fn decode_artifact<T: DeserializeOwned>(
    data: &[u8],
) -> std::result::Result<(ArtifactHeader, T), ArtifactError> {
    let (header, offset) = decode_header(data)?;
    let content = &data[offset..];
    header.verify_content(content)?;
    let value: T = ciborium::from_reader(content).map_err(|e| ArtifactError::Decode(e.to_string()))?;
    Ok((header, value))
}

/// Write `bytes` to `path` through a temp file in the same directory, so a
/// reader sees either the old file or the complete new one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|e| DataError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| DataError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| DataError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| DataError::io(path, e))?;
    tmp.persist(path).map_err(|e| DataError::io(path, e.error))?;
    Ok(())
}
