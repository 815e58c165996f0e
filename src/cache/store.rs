//! Cache file I/O.
//!
//! Reads never fail: a missing or unreadable cache is the empty document.
//! Writes go to a temp file in the cache folder which is fsynced and then
//! renamed over `cache.json`, so readers see either the old or the new
//! document in full.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::CACHE_FILE_NAME;
use crate::types::CacheDocument;

/// Errors raised while persisting the cache.
#[derive(Debug, Error)]
pub enum CacheWriteError {
    /// The cache folder could not be created.
    #[error("cannot create cache folder {path}: {source}")]
    CreateDir {
        /// Folder path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// The document could not be serialized.
    #[error("cannot serialize cache document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the temp file failed.
    #[error("cannot write cache temp file in {path}: {source}")]
    Write {
        /// Folder path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Renaming the temp file over the cache file failed.
    #[error("cannot replace cache file {path}: {source}")]
    Persist {
        /// Cache file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

/// Path of the cache file inside `folder`.
pub fn cache_file(folder: &Path) -> PathBuf {
    folder.join(CACHE_FILE_NAME)
}

/// Read the cache document in `folder`, or the empty document.
pub fn read_cache(folder: &Path) -> CacheDocument {
    let path = cache_file(folder);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(cache = %path.display(), error = %e, "no readable cache");
            return CacheDocument::empty();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(cache = %path.display(), error = %e, "cache is not a valid document");
            CacheDocument::empty()
        }
    }
}

/// Atomically replace the cache document in `folder`, creating the folder
/// when needed.
pub fn write_cache(folder: &Path, doc: &CacheDocument) -> Result<(), CacheWriteError> {
    fs::create_dir_all(folder).map_err(|source| CacheWriteError::CreateDir {
        path: folder.to_path_buf(),
        source,
    })?;

    let bytes = serde_json::to_vec(doc)?;
    let write_err = |source| CacheWriteError::Write {
        path: folder.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(folder).map_err(write_err)?;
    tmp.write_all(&bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    let target = cache_file(folder);
    tmp.persist(&target).map_err(|e| CacheWriteError::Persist {
        path: target.clone(),
        source: e.error,
    })?;

    tracing::debug!(cache = %target.display(), bytes = bytes.len(), "cache written");
    Ok(())
}
