//! Archive extraction for downloaded datasets.

use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use tabgraph_schema::{DataError, Result};
use tempfile::NamedTempFile;

/// Extract `archive` into `dest_dir`, returning the extracted path.
///
/// Only gzip single-file archives (`*.gz`) are supported; the output keeps the
/// archive name minus `.gz`. With `overwrite == false` an existing output is
/// left as is.
pub fn extract_archive(archive: &Path, dest_dir: &Path, overwrite: bool) -> Result<PathBuf> {
    let is_gz = archive.extension().is_some_and(|ext| ext == "gz");
    let stem = archive.file_stem().filter(|_| is_gz).ok_or_else(|| {
        DataError::io(
            archive,
            std::io::Error::new(std::io::ErrorKind::Unsupported, "unsupported archive format"),
        )
    })?;
    let out = dest_dir.join(stem);

    if out.exists() && !overwrite {
        tracing::info!(path = %out.display(), "already extracted, skipping");
        return Ok(out);
    }

    std::fs::create_dir_all(dest_dir).map_err(|e| DataError::io(dest_dir, e))?;
    let file = std::fs::File::open(archive).map_err(|e| DataError::io(archive, e))?;
    let mut decoder = GzDecoder::new(file);
    let mut tmp = NamedTempFile::new_in(dest_dir).map_err(|e| DataError::io(dest_dir, e))?;

    std::io::copy(&mut decoder, &mut tmp).map_err(|e| DataError::io(archive, e))?;
    tmp.persist(&out).map_err(|e| DataError::io(&out, e.error))?;

    tracing::info!(archive = %archive.display(), path = %out.display(), "extracted archive");
    Ok(out)
}
