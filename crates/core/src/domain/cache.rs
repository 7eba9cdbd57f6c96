// Cache Entry - one per calendar source, stored as `{"time": .., "cached_calendar": ..}`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default freshness window for cached calendar payloads (15 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// A cached payload with the UNIX time (seconds) it was stored at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub time: f64,
    #[serde(default)]
    pub cached_calendar: Option<String>,
}

impl CacheEntry {
    pub fn new(stored_at: DateTime<Utc>, payload: Option<String>) -> Self {
        Self {
            time: unix_seconds(stored_at),
            cached_calendar: payload,
        }
    }

    /// Fresh iff `time + ttl > now`
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.time + ttl.as_secs_f64() > unix_seconds(now)
    }

    /// Payload usable as a stale fallback (present and non-empty)
    pub fn payload(&self) -> Option<&str> {
        self.cached_calendar.as_deref().filter(|s| !s.is_empty())
    }
}

fn unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 1000.0
}
