//! Per-user command rate limiting (spec.md §4.7): a rolling 60-second
//! window, same shape as the announcer's per-channel limiter but keyed by
//! user instead of channel.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

const WINDOW_SECONDS: i64 = 60;

#[derive(Debug, Default)]
pub struct UserRateLimiter {
    hits: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl UserRateLimiter {
    pub fn allow(&mut self, user: &str, max_per_window: usize, now: DateTime<Utc>) -> bool {
        let window = self.hits.entry(user.to_string()).or_default();
        while let Some(front) = window.front() {
            if (now - *front).num_seconds() >= WINDOW_SECONDS {
                window.pop_front();
            } else {
                break;
            }
        }
        if window.len() >= max_per_window {
            return false;
        }
        window.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_cap_then_rejects() {
        let mut limiter = UserRateLimiter::default();
        let now = Utc::now();
        for _ in 0..5 {
            assert!(limiter.allow("alice", 5, now));
        }
        assert!(!limiter.allow("alice", 5, now));
    }

    #[test]
    fn window_slides_after_sixty_seconds() {
        let mut limiter = UserRateLimiter::default();
        let now = Utc::now();
        for _ in 0..5 {
            assert!(limiter.allow("alice", 5, now));
        }
        let later = now + chrono::Duration::seconds(61);
        assert!(limiter.allow("alice", 5, later));
    }

    #[test]
    fn users_are_independent() {
        let mut limiter = UserRateLimiter::default();
        let now = Utc::now();
        assert!(limiter.allow("alice", 1, now));
        assert!(!limiter.allow("alice", 1, now));
        assert!(limiter.allow("bob", 1, now));
    }
}
