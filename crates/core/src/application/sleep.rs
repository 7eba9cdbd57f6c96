// Sleep policy - holds the target period despite variable render time
use std::time::Duration;

use crate::application::constants::{SLEEP_FLOOR, SLEEP_SAFETY_MARGIN};
use crate::domain::DomainError;

/// `sleep = max(floor, period - render - margin)`
///
/// # Example
/// ```text
/// let policy = SleepPolicy::new(Duration::from_secs(60));
/// policy.sleep_after(Duration::from_secs(12)); // 38s
/// policy.sleep_after(Duration::from_secs(55)); // 10s (floor)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepPolicy {
    pub period: Duration,
    pub margin: Duration,
    pub floor: Duration,
}

impl SleepPolicy {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            margin: SLEEP_SAFETY_MARGIN,
            floor: SLEEP_FLOOR,
        }
    }

    /// Period given in (possibly fractional) minutes
    pub fn from_minutes(minutes: f64) -> Result<Self, DomainError> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(DomainError::ValidationError(format!(
                "cycle must be a positive number of minutes, got {minutes}"
            )));
        }
        let period = Duration::try_from_secs_f64(minutes * 60.0).map_err(|_| {
            DomainError::ValidationError(format!("cycle of {minutes} minutes is out of range"))
        })?;
        Ok(Self::new(period))
    }

    pub fn sleep_after(&self, render: Duration) -> Duration {
        sleep_duration(self.period, render, self.margin, self.floor)
    }
}

/// Saturates at zero before the floor applies, so an overlong render never underflows
pub fn sleep_duration(period: Duration, render: Duration, margin: Duration, floor: Duration) -> Duration {
    period.saturating_sub(render).saturating_sub(margin).max(floor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_minus_render_and_margin() {
        let policy = SleepPolicy::from_minutes(1.0).unwrap();
        assert_eq!(policy.sleep_after(Duration::from_secs(12)), Duration::from_secs(38));
        assert_eq!(
            policy.sleep_after(Duration::from_millis(2500)),
            Duration::from_millis(47_500)
        );
    }

    #[test]
    fn test_floor_applies() {
        let policy = SleepPolicy::from_minutes(1.0).unwrap();
        // 60 - 45 - 10 = 5 < 10
        assert_eq!(policy.sleep_after(Duration::from_secs(45)), SLEEP_FLOOR);
        // render longer than the period
        assert_eq!(policy.sleep_after(Duration::from_secs(300)), SLEEP_FLOOR);
        // exactly at the floor
        assert_eq!(policy.sleep_after(Duration::from_secs(40)), SLEEP_FLOOR);
    }

    #[test]
    fn test_fractional_minutes() {
        let policy = SleepPolicy::from_minutes(0.5).unwrap();
        assert_eq!(policy.sleep_after(Duration::from_secs(5)), Duration::from_secs(15));
    }

    #[test]
    fn test_unrepresentable_cycle_rejected() {
        assert!(SleepPolicy::from_minutes(1e300).is_err());
        assert!(SleepPolicy::from_minutes(f64::INFINITY).is_err());
        assert!(SleepPolicy::from_minutes(f64::NAN).is_err());
        assert!(SleepPolicy::from_minutes(0.0).is_err());
        assert!(SleepPolicy::from_minutes(-2.0).is_err());
    }
}
