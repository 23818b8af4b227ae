//! Name-keyed artifact cache.
//!
//! Caching is an optimization: [`CacheStore::save`] never fails, it reports problems as warnings
//! and moves on. The cached copy is an independent replica and is not kept in sync with anything.

#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use posture_types::ids;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to create cache directory {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize artifact for {path}: {source}")]
    Serialize {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStore {
    dir: Utf8PathBuf,
    enabled: bool,
}

impl CacheStore {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            enabled: true,
        }
    }

    /// A store whose saves are no-ops.
    pub fn disabled() -> Self {
        Self {
            dir: Utf8PathBuf::new(),
            enabled: false,
        }
    }

    /// Store rooted at [`default_cache_dir`].
    pub fn at_default_location() -> Self {
        Self::new(default_cache_dir())
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Location of `file_name` inside the cache directory.
    pub fn default_path(&self, file_name: &str) -> Utf8PathBuf {
        self.dir.join(file_name)
    }

    /// Persist `artifact` as `<name>.json`, logging a warning on failure.
    ///
    /// Names that are not a single path segment are refused so nothing lands outside the cache
    /// directory.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, artifact: &T) {
        if !self.enabled {
            return;
        }
        if !ids::is_safe_artifact_name(name) {
            tracing::warn!(name, dir = %self.dir, "refusing to cache artifact with unsafe name");
            return;
        }
        let path = self.default_path(&ids::cache_file_name(name));
        match save_in_file(artifact, &path) {
            Ok(()) => tracing::debug!(file = %path, "cached policy artifact"),
            Err(err) => tracing::warn!(file = %path, error = %err, "failed to cache file"),
        }
    }
}

/// `$POSTURE_CACHE_DIR`, else `~/.posture`, else `.posture` in the working directory.
pub fn default_cache_dir() -> Utf8PathBuf {
    if let Ok(dir) = std::env::var(ids::ENV_CACHE_DIR)
        && !dir.trim().is_empty()
    {
        return Utf8PathBuf::from(dir);
    }
    dirs::home_dir()
        .and_then(|home| Utf8PathBuf::from_path_buf(home).ok())
        .map(|home| home.join(ids::DEFAULT_CACHE_DIR_NAME))
        .unwrap_or_else(|| Utf8PathBuf::from(ids::DEFAULT_CACHE_DIR_NAME))
}

/// Serialize `artifact` as pretty JSON and write it to `path`, creating parent directories.
pub fn save_in_file<T: Serialize + ?Sized>(artifact: &T, path: &Utf8Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut data = serde_json::to_vec_pretty(artifact).map_err(|source| CacheError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    data.push(b'\n');

    std::fs::write(path, data).map_err(|source| CacheError::Write {
        path: path.to_path_buf(),
        source,
    })
}
