//! Working hours and booking policy
//!
//! The policy is parsed once at startup from [`bk_core::BookingConfig`] and
//! shared immutably afterwards.

use std::collections::HashMap;

use chrono::{Duration, NaiveTime, Weekday};
use chrono_tz::Tz;

use bk_core::{BookingConfig, Error as CoreError};

/// A single open interval within a working day, in local time-of-day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenInterval {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Per-weekday open intervals
#[derive(Debug, Clone, Default)]
pub struct WorkingHoursPolicy {
    hours: HashMap<Weekday, Vec<OpenInterval>>,
}

impl WorkingHoursPolicy {
    /// Open intervals for a weekday, empty when the day is closed
    pub fn open_intervals(&self, weekday: Weekday) -> &[OpenInterval] {
        self.hours.get(&weekday).map(Vec::as_slice).unwrap_or(&[])
    }

    fn from_config(hours: &HashMap<String, Vec<String>>) -> bk_core::Result<Self> {
        let mut parsed = HashMap::new();

        for (day, intervals) in hours {
            let weekday = parse_weekday(day)?;
            let mut open: Vec<OpenInterval> = intervals
                .iter()
                .map(|s| parse_interval(s))
                .collect::<bk_core::Result<_>>()?;
            open.sort_by_key(|i| i.start);

            for pair in open.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(CoreError::Config(format!(
                        "Overlapping working hours on {}: {:?} and {:?}",
                        day, pair[0], pair[1]
                    )));
                }
            }

            parsed.insert(weekday, open);
        }

        Ok(Self { hours: parsed })
    }
}

/// Complete booking policy: working hours plus slotting rules
#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Bookable slot length
    pub slot_minutes: u32,
    /// How many months ahead bookings are accepted
    pub horizon_months: u32,
    /// Minimum lead time before a slot can start
    pub min_lead: Duration,
    /// Timezone the working hours are expressed in
    pub timezone: Tz,
    /// Per-weekday open intervals
    pub hours: WorkingHoursPolicy,
}

impl BookingPolicy {
    /// Build the policy from raw configuration, validating every field
    pub fn from_config(config: &BookingConfig) -> bk_core::Result<Self> {
        if config.slot_minutes == 0 {
            return Err(CoreError::Config("slot_minutes must be positive".to_string()));
        }

        let timezone: Tz = config
            .timezone
            .parse()
            .map_err(|_| CoreError::Config(format!("Unknown timezone: {}", config.timezone)))?;

        Ok(Self {
            slot_minutes: config.slot_minutes,
            horizon_months: config.horizon_months,
            min_lead: Duration::hours(i64::from(config.min_lead_hours)),
            timezone,
            hours: WorkingHoursPolicy::from_config(&config.hours)?,
        })
    }

    /// Slot length as a chrono duration
    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }
}

fn parse_weekday(day: &str) -> bk_core::Result<Weekday> {
    match day.to_ascii_lowercase().as_str() {
        "mon" => Ok(Weekday::Mon),
        "tue" => Ok(Weekday::Tue),
        "wed" => Ok(Weekday::Wed),
        "thu" => Ok(Weekday::Thu),
        "fri" => Ok(Weekday::Fri),
        "sat" => Ok(Weekday::Sat),
        "sun" => Ok(Weekday::Sun),
        other => Err(CoreError::Config(format!("Unknown weekday: {}", other))),
    }
}

/// Parse an "HH:MM-HH:MM" interval string
fn parse_interval(s: &str) -> bk_core::Result<OpenInterval> {
    let (start_str, end_str) = s
        .split_once('-')
        .ok_or_else(|| CoreError::Config(format!("Invalid interval: {}", s)))?;

    let start = NaiveTime::parse_from_str(start_str.trim(), "%H:%M")
        .map_err(|_| CoreError::Config(format!("Invalid time: {}", start_str)))?;
    let end = NaiveTime::parse_from_str(end_str.trim(), "%H:%M")
        .map_err(|_| CoreError::Config(format!("Invalid time: {}", end_str)))?;

    if start >= end {
        return Err(CoreError::Config(format!(
            "Interval start must precede end: {}",
            s
        )));
    }

    Ok(OpenInterval { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_interval() {
        let interval = parse_interval("09:00-17:00").unwrap();
        assert_eq!(interval.start, time(9, 0));
        assert_eq!(interval.end, time(17, 0));
    }

    #[test]
    fn test_parse_interval_rejects_inverted() {
        assert!(parse_interval("17:00-09:00").is_err());
        assert!(parse_interval("09:00").is_err());
        assert!(parse_interval("9am-5pm").is_err());
    }

    #[test]
    fn test_policy_from_default_config() {
        let policy = BookingPolicy::from_config(&BookingConfig::default()).unwrap();
        assert_eq!(policy.slot_minutes, 60);
        assert_eq!(policy.timezone, chrono_tz::UTC);
        assert_eq!(policy.hours.open_intervals(Weekday::Mon).len(), 1);
        assert!(policy.hours.open_intervals(Weekday::Sat).is_empty());
    }

    #[test]
    fn test_policy_rejects_unknown_timezone() {
        let mut config = BookingConfig::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(BookingPolicy::from_config(&config).is_err());
    }

    #[test]
    fn test_policy_rejects_overlapping_hours() {
        let mut config = BookingConfig::default();
        config.hours.insert(
            "mon".to_string(),
            vec!["09:00-12:00".to_string(), "11:00-17:00".to_string()],
        );
        assert!(BookingPolicy::from_config(&config).is_err());
    }

    #[test]
    fn test_policy_rejects_zero_slot() {
        let mut config = BookingConfig::default();
        config.slot_minutes = 0;
        assert!(BookingPolicy::from_config(&config).is_err());
    }
}
