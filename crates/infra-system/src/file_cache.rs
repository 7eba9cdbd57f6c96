// File-backed calendar cache
// One JSON document per source: <dir>/<sha256(url)>.json
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use inkstat_core::domain::CacheEntry;
use inkstat_core::port::{CacheError, CalendarCache};

/// Stable content-hash key for a source identifier
pub fn cache_key(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

pub struct FileCalendarCache {
    dir: PathBuf,
}

impl FileCalendarCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, source: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(source)))
    }
}

impl CalendarCache for FileCalendarCache {
    fn load(&self, source: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(source);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry = serde_json::from_str(&raw).map_err(|e| CacheError::Corrupt {
            source_id: source.to_string(),
            reason: e.to_string(),
        })?;
        debug!(source = %source, path = %path.display(), "Cache entry loaded");
        Ok(Some(entry))
    }

    fn store(&self, source: &str, entry: &CacheEntry) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(source);
        let tmp = path.with_extension("json.tmp");

        let body = serde_json::to_vec(entry).map_err(|e| CacheError::Corrupt {
            source_id: source.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;
        debug!(source = %source, path = %path.display(), "Cache entry stored");
        Ok(())
    }
}
