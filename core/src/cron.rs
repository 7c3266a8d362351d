//! A minimal 5-field cron matcher (`minute hour day-of-month month
//! day-of-week`), supporting `*`, single values, comma lists, and `*/step`.
//! No external cron crate in this corpus covers the scheduler's narrow
//! need (blackout windows, scheduled multiplier events) without pulling in
//! a timezone-aware scheduling engine this service doesn't otherwise need;
//! see DESIGN.md.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronError(pub String);

impl std::fmt::Display for CronError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid cron expression: {}", self.0)
    }
}

impl std::error::Error for CronError {}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    values: Vec<u32>,
}

impl Field {
    fn parse(raw: &str, min: u32, max: u32) -> Result<Self, CronError> {
        if raw == "*" {
            return Ok(Self { values: (min..=max).collect() });
        }
        let mut values = Vec::new();
        for part in raw.split(',') {
            if let Some(step_expr) = part.strip_prefix("*/") {
                let step: u32 = step_expr.parse().map_err(|_| CronError(raw.to_string()))?;
                if step == 0 {
                    return Err(CronError(raw.to_string()));
                }
                values.extend((min..=max).step_by(step as usize));
            } else {
                let value: u32 = part.parse().map_err(|_| CronError(raw.to_string()))?;
                if value < min || value > max {
                    return Err(CronError(raw.to_string()));
                }
                values.push(value);
            }
        }
        values.sort_unstable();
        values.dedup();
        Ok(Self { values })
    }

    fn matches(&self, value: u32) -> bool {
        self.values.contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    minute: Field,
    hour: Field,
    day_of_month: Field,
    month: Field,
    day_of_week: Field,
}

impl CronSchedule {
    pub fn parse(expr: &str) -> Result<Self, CronError> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(CronError(expr.to_string()));
        }
        Ok(Self {
            minute: Field::parse(parts[0], 0, 59)?,
            hour: Field::parse(parts[1], 0, 23)?,
            day_of_month: Field::parse(parts[2], 1, 31)?,
            month: Field::parse(parts[3], 1, 12)?,
            day_of_week: Field::parse(parts[4], 0, 6)?,
        })
    }

    fn matches(&self, at: DateTime<Utc>) -> bool {
        self.minute.matches(at.minute())
            && self.hour.matches(at.hour())
            && self.day_of_month.matches(at.day())
            && self.month.matches(at.month())
            && self.day_of_week.matches(at.weekday().num_days_from_sunday())
    }

    /// The most recent minute boundary at or before `now` that matches,
    /// scanning back up to one year.
    pub fn previous_fire(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut cursor = now.with_second(0).and_then(|t| t.with_nanosecond(0))?;
        for _ in 0..(366 * 24 * 60) {
            if self.matches(cursor) {
                return Some(cursor);
            }
            cursor -= Duration::minutes(1);
        }
        None
    }

    /// The next minute boundary at or after `now` that matches, scanning
    /// forward up to one year.
    pub fn next_fire(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut cursor = now.with_second(0).and_then(|t| t.with_nanosecond(0))?;
        for _ in 0..(366 * 24 * 60) {
            if self.matches(cursor) {
                return Some(cursor);
            }
            cursor += Duration::minutes(1);
        }
        None
    }
}

/// Convenience for callers that only have the raw expression string.
pub fn previous_fire(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    CronSchedule::parse(expr).ok()?.previous_fire(now)
}

pub fn next_fire(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    CronSchedule::parse(expr).ok()?.next_fire(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn every_hour_on_the_hour() {
        let schedule = CronSchedule::parse("0 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 14, 30, 0).unwrap();
        let prev = schedule.previous_fire(now).unwrap();
        assert_eq!(prev, Utc.with_ymd_and_hms(2026, 1, 1, 14, 0, 0).unwrap());
        let next = schedule.next_fire(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 15, 0, 0).unwrap());
    }

    #[test]
    fn step_expression_every_15_minutes() {
        let schedule = CronSchedule::parse("*/15 * * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 14, 22, 0).unwrap();
        assert_eq!(schedule.previous_fire(now).unwrap().minute(), 15);
        assert_eq!(schedule.next_fire(now).unwrap().minute(), 30);
    }

    #[test]
    fn rejects_malformed_expression() {
        assert!(CronSchedule::parse("not a cron").is_err());
        assert!(CronSchedule::parse("60 * * * *").is_err());
    }

    #[test]
    fn exact_match_returns_itself() {
        let schedule = CronSchedule::parse("30 14 * * *").unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 14, 30, 0).unwrap();
        assert_eq!(schedule.previous_fire(now), Some(now));
        assert_eq!(schedule.next_fire(now), Some(now));
    }
}
