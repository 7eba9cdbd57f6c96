// iCalendar parser adapter
// Extracts VEVENT summary and start; RRULE series are expanded over the
// window, minus EXDATE and RECURRENCE-ID overrides
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::IcalEvent;
use ical::property::Property;
use ical::IcalParser;
use rrule::{RRuleSet, Tz as RRuleTz};
use tracing::{debug, warn};

use inkstat_core::domain::CalendarEvent;
use inkstat_core::port::{CalendarParseError, CalendarParser};

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";
const DATE_FORMAT: &str = "%Y%m%d";
const UNTITLED: &str = "(untitled)";
/// Occurrences taken from one series per window
const MAX_OCCURRENCES: u16 = 512;

#[derive(Debug, Default, Clone, Copy)]
pub struct IcalCalendarParser;

impl IcalCalendarParser {
    pub fn new() -> Self {
        Self
    }
}

fn property<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a Property> {
    event
        .properties
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

fn param<'a>(prop: &'a Property, name: &str) -> Option<&'a str> {
    prop.params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

fn unescape(text: &str) -> String {
    text.replace("\\n", " ")
        .replace("\\N", " ")
        .replace("\\,", ",")
        .replace("\\;", ";")
        .replace("\\\\", "\\")
}

/// Start instant and all-day flag of a DTSTART property
fn event_start(prop: &Property) -> Option<(DateTime<Utc>, bool)> {
    let value = prop.value.as_deref()?.trim();

    let is_date = param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && !value.contains('T'));
    if is_date {
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT).ok()?;
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some((local_to_utc(midnight)?, true));
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let naive = NaiveDateTime::parse_from_str(utc, DATE_TIME_FORMAT).ok()?;
        return Some((Utc.from_utc_datetime(&naive), false));
    }

    let naive = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).ok()?;
    let start = match param(prop, "TZID").map(|tzid| (tzid, tzid.parse::<Tz>())) {
        Some((_, Ok(tz))) => tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|t| t.with_timezone(&Utc))?,
        Some((tzid, Err(_))) => {
            warn!(tzid, "Unknown TZID; treating start as local time");
            local_to_utc(naive)?
        }
        None => local_to_utc(naive)?,
    };
    Some((start, false))
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

/// Every instant listed by the EXDATE properties (comma-separated values)
fn excluded_starts(event: &IcalEvent) -> Vec<DateTime<Utc>> {
    event
        .properties
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case("EXDATE"))
        .flat_map(|p| {
            let values = p.value.as_deref().unwrap_or_default();
            values
                .split(',')
                .filter_map(|value| {
                    let single = Property {
                        name: p.name.clone(),
                        params: p.params.clone(),
                        value: Some(value.trim().to_string()),
                    };
                    event_start(&single).map(|(at, _)| at)
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// DTSTART line for the rule engine: keeps a known TZID so wall-clock times
/// survive DST changes, otherwise the resolved UTC instant
fn rule_dtstart(dtstart: &Property, first: DateTime<Utc>) -> String {
    let value = dtstart.value.as_deref().unwrap_or_default().trim();
    match param(dtstart, "TZID") {
        Some(tzid) if value.contains('T') && tzid.parse::<Tz>().is_ok() => {
            format!("DTSTART;TZID={tzid}:{value}")
        }
        _ => format!("DTSTART:{}", first.format("%Y%m%dT%H%M%SZ")),
    }
}

/// Starts of `event` that may touch the window. A plain event has one; a
/// series is expanded from its RRULE
fn occurrences(
    event: &IcalEvent,
    dtstart: &Property,
    first: DateTime<Utc>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    let Some(rule) = property(event, "RRULE").and_then(|p| p.value.as_deref()) else {
        return vec![first];
    };
    let source = format!("{}\nRRULE:{}", rule_dtstart(dtstart, first), rule.trim());
    let set: RRuleSet = match source.parse() {
        Ok(set) => set,
        Err(e) => {
            warn!(rule, error = %e, "Unusable RRULE; keeping the first occurrence only");
            return vec![first];
        }
    };

    // a day early so all-day occurrences overlapping the window are kept
    let result = set
        .after((window_start - Duration::days(1)).with_timezone(&RRuleTz::UTC))
        .before(window_end.with_timezone(&RRuleTz::UTC))
        .all(MAX_OCCURRENCES);
    if result.limited {
        debug!(rule, "Recurrence expansion hit the occurrence limit");
    }
    result
        .dates
        .into_iter()
        .map(|at| at.with_timezone(&Utc))
        .collect()
}

fn in_window(
    start: DateTime<Utc>,
    all_day: bool,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> bool {
    if all_day {
        // the whole day overlaps the window
        start < window_end && start + Duration::days(1) > window_start
    } else {
        start >= window_start && start < window_end
    }
}

impl CalendarParser for IcalCalendarParser {
    fn parse(
        &self,
        payload: &str,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, CalendarParseError> {
        if !payload.contains("BEGIN:VCALENDAR") {
            return Err(CalendarParseError("no VCALENDAR block".to_string()));
        }

        let mut events = Vec::new();
        for calendar in IcalParser::new(payload.as_bytes()) {
            let calendar = calendar.map_err(|e| CalendarParseError(e.to_string()))?;

            // (UID, original start) of every occurrence replaced by its own VEVENT
            let overridden: Vec<(String, DateTime<Utc>)> = calendar
                .events
                .iter()
                .filter_map(|event| {
                    let uid = property(event, "UID")?.value.clone()?;
                    let (at, _) = property(event, "RECURRENCE-ID").and_then(event_start)?;
                    Some((uid.trim().to_string(), at))
                })
                .collect();

            for event in &calendar.events {
                let summary = property(event, "SUMMARY")
                    .and_then(|p| p.value.as_deref())
                    .map(|v| unescape(v.trim()))
                    .unwrap_or_else(|| UNTITLED.to_string());

                let Some(dtstart) = property(event, "DTSTART") else {
                    debug!(summary = %summary, "Event without DTSTART skipped");
                    continue;
                };
                let Some((first, all_day)) = event_start(dtstart) else {
                    debug!(summary = %summary, "Event with unreadable DTSTART skipped");
                    continue;
                };

                let uid = property(event, "UID")
                    .and_then(|p| p.value.as_deref())
                    .map(str::trim);
                let is_series = property(event, "RRULE").is_some();
                let mut skipped = excluded_starts(event);
                if is_series {
                    skipped.extend(
                        overridden
                            .iter()
                            .filter(|(id, _)| Some(id.as_str()) == uid)
                            .map(|(_, at)| *at),
                    );
                }

                for start in occurrences(event, dtstart, first, window_start, window_end) {
                    if skipped.contains(&start)
                        || !in_window(start, all_day, window_start, window_end)
                    {
                        continue;
                    }
                    events.push(CalendarEvent {
                        summary: summary.clone(),
                        start,
                        all_day,
                    });
                }
            }
        }
        Ok(events)
    }
}
