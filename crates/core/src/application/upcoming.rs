//! Upcoming Event Service - cached multi-source fetch and global event selection
//!
//! Per source:
//! - fresh cache hit (`time + ttl > now`): served without a fetch
//! - otherwise fetched; success is stored as `{time: now, payload}`
//! - fetch failure falls back to the stored payload, stale or not
//! - a corrupt cache entry is treated as a miss
//!
//! Selection runs over the events of every source that produced a payload.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{select_upcoming, CacheEntry, CalendarEvent, EventHandoff, UpcomingEvent};
use crate::port::{CalendarCache, CalendarParser, FeedFetcher, TimeProvider};

/// A source identifier with the payload obtained for it, if any
#[derive(Debug, Clone)]
pub struct SourcePayload {
    pub url: String,
    pub payload: Option<String>,
}

pub struct UpcomingEventService {
    fetcher: Arc<dyn FeedFetcher>,
    cache: Option<Arc<dyn CalendarCache>>,
    parser: Arc<dyn CalendarParser>,
    time_provider: Arc<dyn TimeProvider>,
    ttl: Duration,
}

impl UpcomingEventService {
    /// `cache: None` disables both cache reads and writes
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        cache: Option<Arc<dyn CalendarCache>>,
        parser: Arc<dyn CalendarParser>,
        time_provider: Arc<dyn TimeProvider>,
        ttl: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache,
            parser,
            time_provider,
            ttl,
        }
    }

    fn cached_entry(&self, url: &str) -> Option<CacheEntry> {
        let cache = self.cache.as_ref()?;
        match cache.load(url) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(source = %url, error = %e, "Ignoring unusable cache entry");
                None
            }
        }
    }

    /// Payload for one source, or `None` if it contributes nothing
    pub async fn load_source(&self, url: &str) -> Option<String> {
        let now = self.time_provider.now();
        let cached = self.cached_entry(url);

        if let Some(entry) = &cached {
            if entry.is_fresh(now, self.ttl) {
                if let Some(payload) = entry.payload() {
                    info!(source = %url, "Using fresh cached calendar");
                    return Some(payload.to_string());
                }
            }
        }

        match self.fetcher.fetch(url).await {
            Ok(body) => {
                if let Some(cache) = &self.cache {
                    let entry = CacheEntry::new(now, Some(body.clone()));
                    if let Err(e) = cache.store(url, &entry) {
                        warn!(source = %url, error = %e, "Failed to store calendar in cache");
                    }
                }
                info!(source = %url, bytes = body.len(), "Downloaded calendar");
                Some(body)
            }
            Err(e) => {
                let fallback = cached.and_then(|entry| entry.payload().map(str::to_string));
                warn!(
                    source = %url,
                    error = %e,
                    stale_fallback = fallback.is_some(),
                    "Calendar download failed"
                );
                fallback
            }
        }
    }

    /// Sources are visited one at a time, in order
    pub async fn load_sources(&self, urls: &[String]) -> Vec<SourcePayload> {
        let mut out = Vec::with_capacity(urls.len());
        for url in urls {
            let payload = self.load_source(url).await;
            out.push(SourcePayload {
                url: url.clone(),
                payload,
            });
        }
        out
    }

    /// Events from every payload whose start falls in `[anchor, anchor + window)`
    pub fn collect_events(
        &self,
        sources: &[SourcePayload],
        anchor: DateTime<Utc>,
        window: chrono::Duration,
    ) -> Vec<CalendarEvent> {
        let mut events = Vec::new();
        for source in sources {
            let Some(payload) = &source.payload else {
                debug!(source = %source.url, "Source contributed no payload");
                continue;
            };
            match self.parser.parse(payload, anchor, anchor + window) {
                Ok(parsed) => {
                    for event in &parsed {
                        if event.all_day {
                            info!(
                                source = %source.url,
                                date = %event.start.format("%Y-%m-%d"),
                                summary = %event.summary,
                                "All-day event (not eligible as upcoming)"
                            );
                        } else {
                            debug!(
                                source = %source.url,
                                start = %event.start,
                                summary = %event.summary,
                                "Event in window"
                            );
                        }
                    }
                    events.extend(parsed);
                }
                Err(e) => warn!(source = %source.url, error = %e, "Skipping unparseable calendar"),
            }
        }
        events
    }

    pub fn select(
        &self,
        sources: &[SourcePayload],
        anchor: DateTime<Utc>,
        window: chrono::Duration,
    ) -> Option<UpcomingEvent> {
        let events = self.collect_events(sources, anchor, window);
        select_upcoming(&events, anchor, window)
    }

    /// Fetch every source and reduce to the hand-off document
    pub async fn upcoming(
        &self,
        urls: &[String],
        anchor: DateTime<Utc>,
        window: chrono::Duration,
    ) -> EventHandoff {
        let sources = self.load_sources(urls).await;
        let upcoming = self.select(&sources, anchor, window);
        info!(anchor = %anchor, upcoming = ?upcoming, "Upcoming event selected");
        upcoming.into()
    }
}
