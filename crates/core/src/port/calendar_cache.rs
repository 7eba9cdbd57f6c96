// Calendar Cache Port - one age-stamped entry per calendar source

use thiserror::Error;

use crate::domain::CacheEntry;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache entry for {source_id} is corrupt: {reason}")]
    Corrupt { source_id: String, reason: String },

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keyed by source identifier; implementations derive their own storage key
pub trait CalendarCache: Send + Sync {
    /// `Ok(None)` when nothing has been stored for `source`
    fn load(&self, source: &str) -> Result<Option<CacheEntry>, CacheError>;

    fn store(&self, source: &str, entry: &CacheEntry) -> Result<(), CacheError>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryCalendarCache {
        entries: Mutex<HashMap<String, CacheEntry>>,
        corrupt: Mutex<Vec<String>>,
    }

    impl MemoryCalendarCache {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, source: &str, entry: CacheEntry) {
            self.entries.lock().unwrap().insert(source.to_string(), entry);
        }

        pub fn mark_corrupt(&self, source: &str) {
            self.corrupt.lock().unwrap().push(source.to_string());
        }

        pub fn get(&self, source: &str) -> Option<CacheEntry> {
            self.entries.lock().unwrap().get(source).cloned()
        }
    }

    impl CalendarCache for MemoryCalendarCache {
        fn load(&self, source: &str) -> Result<Option<CacheEntry>, CacheError> {
            if self.corrupt.lock().unwrap().iter().any(|s| s == source) {
                return Err(CacheError::Corrupt {
                    source_id: source.to_string(),
                    reason: "expected value at line 1 column 1".to_string(),
                });
            }
            Ok(self.get(source))
        }

        fn store(&self, source: &str, entry: &CacheEntry) -> Result<(), CacheError> {
            self.corrupt.lock().unwrap().retain(|s| s != source);
            self.insert(source, entry.clone());
            Ok(())
        }
    }
}
