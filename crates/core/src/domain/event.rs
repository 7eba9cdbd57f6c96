// Calendar events and the upcoming-event hand-off document

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Summary written when no source yields an upcoming event
pub const NO_EVENT_SUMMARY: &str = "none";

/// One event occurrence parsed from a calendar source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub all_day: bool,
}

/// The soonest event at or after the anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpcomingEvent {
    pub summary: String,
    /// Non-negative offset from the anchor to the event start
    pub delta: Duration,
}

/// `{"summary": .., "delta": ..}` as exchanged through the hand-off file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventHandoff {
    pub summary: String,
    pub delta: String,
}

impl EventHandoff {
    /// Empty placeholder used when the hand-off file is missing or unreadable
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Document for "no upcoming event in the window"
    pub fn none() -> Self {
        Self {
            summary: NO_EVENT_SUMMARY.to_string(),
            delta: String::new(),
        }
    }
}

impl From<Option<UpcomingEvent>> for EventHandoff {
    fn from(upcoming: Option<UpcomingEvent>) -> Self {
        match upcoming {
            Some(event) => Self {
                summary: event.summary,
                delta: format_delta(event.delta),
            },
            None => Self::none(),
        }
    }
}

/// Pick the event with the smallest non-negative delta, globally across
/// every source. All-day events never qualify; only deltas strictly shorter
/// than `window` count; on ties the first-seen event wins.
pub fn select_upcoming<'a>(
    events: impl IntoIterator<Item = &'a CalendarEvent>,
    anchor: DateTime<Utc>,
    window: Duration,
) -> Option<UpcomingEvent> {
    let mut best: Option<(&CalendarEvent, Duration)> = None;
    for event in events {
        if event.all_day {
            continue;
        }
        let delta = event.start - anchor;
        if delta < Duration::zero() || delta >= window {
            continue;
        }
        let closer = match &best {
            Some((_, best_delta)) => delta < *best_delta,
            None => true,
        };
        if closer {
            best = Some((event, delta));
        }
    }
    best.map(|(event, delta)| UpcomingEvent {
        summary: event.summary.clone(),
        delta,
    })
}

/// `H:MM:SS`, sub-second precision dropped
pub fn format_delta(delta: Duration) -> String {
    let total = delta.num_seconds().max(0);
    format!(
        "{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
