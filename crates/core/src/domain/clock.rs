// Clock readouts for the configured timezones

use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use std::str::FromStr;
use std::time::Duration;

use super::error::{DomainError, Result};

/// Format of the primary (large) readout
pub const PRIMARY_TIME_FORMAT: &str = "%H:%M:%S";

/// Format of each secondary (small) readout
pub const SECONDARY_TIME_FORMAT: &str = "%H";

/// A timezone the panel shows; `local` means the host's zone
#[derive(Debug, Clone, PartialEq)]
pub enum Zone {
    Local,
    Named(Tz),
}

impl Zone {
    pub fn format(&self, at: DateTime<Utc>, fmt: &str) -> String {
        match self {
            Zone::Local => at.with_timezone(&Local).format(fmt).to_string(),
            Zone::Named(tz) => at.with_timezone(tz).format(fmt).to_string(),
        }
    }
}

impl FromStr for Zone {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        name.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| DomainError::UnknownTimezone(name.to_string()))
    }
}

/// Primary zone plus the secondary zones, in display order
#[derive(Debug, Clone)]
pub struct ClockSet {
    pub primary: Zone,
    pub secondary: Vec<Zone>,
}

impl ClockSet {
    /// Parse a comma-separated list; the first entry is the primary zone
    pub fn parse(list: &str) -> Result<Self> {
        let mut zones = list
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(Zone::from_str)
            .collect::<Result<Vec<_>>>()?;
        if zones.is_empty() {
            return Err(DomainError::ValidationError(
                "at least one timezone is required".to_string(),
            ));
        }
        let primary = zones.remove(0);
        Ok(Self {
            primary,
            secondary: zones,
        })
    }

    /// Readouts for `now + lead`, so the text matches the moment the panel
    /// finishes refreshing.
    pub fn readouts(&self, now: DateTime<Utc>, lead: Duration) -> (String, Vec<String>) {
        let shown_at = now + chrono::Duration::from_std(lead).unwrap_or_else(|_| chrono::Duration::zero());
        let primary = self.primary.format(shown_at, PRIMARY_TIME_FORMAT);
        let secondary = self
            .secondary
            .iter()
            .map(|z| z.format(shown_at, SECONDARY_TIME_FORMAT))
            .collect();
        (primary, secondary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_list() {
        let set = ClockSet::parse("local, America/New_York,Europe/Paris").unwrap();
        assert_eq!(set.primary, Zone::Local);
        assert_eq!(set.secondary.len(), 2);
    }

    #[test]
    fn test_unknown_zone_rejected() {
        assert!(matches!(
            ClockSet::parse("Mars/Olympus"),
            Err(DomainError::UnknownTimezone(_))
        ));
        assert!(ClockSet::parse(" , ").is_err());
    }

    #[test]
    fn test_readouts_include_lead() {
        let set = ClockSet::parse("Europe/Paris,America/New_York").unwrap();
        // 2024-01-15 11:59:50 UTC; Paris is UTC+1 in January
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 11, 59, 50).unwrap();

        let (primary, secondary) = set.readouts(now, Duration::from_secs(15));
        assert_eq!(primary, "13:00:05");
        assert_eq!(secondary, vec!["07".to_string()]);

        let (primary, _) = set.readouts(now, Duration::ZERO);
        assert_eq!(primary, "12:59:50");
    }
}
