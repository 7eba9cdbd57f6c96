// Calendar Parser Port - extracts event occurrences from a feed payload

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::CalendarEvent;

#[derive(Error, Debug)]
#[error("Calendar payload could not be parsed: {0}")]
pub struct CalendarParseError(pub String);

pub trait CalendarParser: Send + Sync {
    /// Events whose start falls in `[window_start, window_end)`
    fn parse(
        &self,
        payload: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarParseError>;
}

pub mod mocks {
    use super::*;
    use std::collections::HashMap;

    /// Maps a payload string to a fixed event list
    #[derive(Default)]
    pub struct TableCalendarParser {
        table: HashMap<String, Vec<CalendarEvent>>,
    }

    impl TableCalendarParser {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_events(mut self, payload: impl Into<String>, events: Vec<CalendarEvent>) -> Self {
            self.table.insert(payload.into(), events);
            self
        }
    }

    impl CalendarParser for TableCalendarParser {
        fn parse(
            &self,
            payload: &str,
            window_start: DateTime<Utc>,
            window_end: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>, CalendarParseError> {
            let events = self
                .table
                .get(payload)
                .ok_or_else(|| CalendarParseError(format!("unknown payload {payload:?}")))?;
            Ok(events
                .iter()
                .filter(|e| e.start >= window_start && e.start < window_end)
                .cloned()
                .collect())
        }
    }
}
