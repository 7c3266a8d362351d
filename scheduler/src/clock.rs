//! Restart-robust periodic waits (spec.md §4.5): "any sleep's wake target
//! is recomputed from the current clock after each sleep" — never compute
//! a target once at loop top and sleep in a fixed-period `interval`, which
//! would drift a missed wake into a burst of spurious awards after a long
//! pause (e.g. the process being suspended).

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::time::Duration;

/// Sleeps until the next occurrence of `hour_utc:00:00`, recomputing from
/// the clock read immediately before sleeping.
pub async fn sleep_until_hour_utc(hour_utc: u32) {
    let now = Utc::now();
    let target = next_occurrence_of_hour(now, hour_utc);
    sleep_until(target).await;
}

/// Sleeps until the next occurrence of `weekday` (0=Sunday per chrono's
/// `Weekday::num_days_from_sunday`) at `hour_utc:00:00`.
pub async fn sleep_until_weekday_hour_utc(weekday: u32, hour_utc: u32) {
    let now = Utc::now();
    let mut target = next_occurrence_of_hour(now, hour_utc);
    while target.weekday().num_days_from_sunday() != weekday {
        target += chrono::Duration::days(1);
    }
    sleep_until(target).await;
}

fn next_occurrence_of_hour(now: DateTime<Utc>, hour_utc: u32) -> DateTime<Utc> {
    let today_at_hour = now.date_naive().and_hms_opt(hour_utc.min(23), 0, 0).expect("valid hour").and_utc();
    if today_at_hour > now {
        today_at_hour
    } else {
        today_at_hour + chrono::Duration::days(1)
    }
}

async fn sleep_until(target: DateTime<Utc>) {
    let now = Utc::now();
    let remaining = (target - now).to_std().unwrap_or(Duration::ZERO);
    tokio::time::sleep(remaining).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_occurrence_rolls_to_tomorrow_if_hour_passed() {
        let now = Utc::now().date_naive().and_hms_opt(23, 0, 0).unwrap().and_utc();
        let target = next_occurrence_of_hour(now, 1);
        assert!(target > now);
        assert_eq!(target.hour(), 1);
    }

    #[test]
    fn next_occurrence_same_day_if_hour_not_yet_reached() {
        let now = Utc::now().date_naive().and_hms_opt(1, 0, 0).unwrap().and_utc();
        let target = next_occurrence_of_hour(now, 5);
        assert_eq!(target.date_naive(), now.date_naive());
        assert_eq!(target.hour(), 5);
    }
}
