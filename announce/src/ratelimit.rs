//! Per-channel rolling 60-second rate limiter (spec.md §4.6: "≤ N
//! messages/minute per channel; excess is dropped with a warning").

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
pub struct ChannelRateLimiter {
    hits: HashMap<String, VecDeque<DateTime<Utc>>>,
}

impl ChannelRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one send attempt for `channel` and returns whether it's
    /// allowed under `max_per_minute`.
    pub fn allow(&mut self, channel: &str, max_per_minute: u32, now: DateTime<Utc>) -> bool {
        let window = self.hits.entry(channel.to_string()).or_default();
        while window.front().is_some_and(|t| (now - *t).num_seconds() >= 60) {
            window.pop_front();
        }
        if window.len() as u32 >= max_per_minute {
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
        let mut limiter = ChannelRateLimiter::new();
        let now = Utc::now();
        for _ in 0..3 {
            assert!(limiter.allow("c1", 3, now));
        }
        assert!(!limiter.allow("c1", 3, now));
    }

    #[test]
    fn window_slides_after_sixty_seconds() {
        let mut limiter = ChannelRateLimiter::new();
        let now = Utc::now();
        assert!(limiter.allow("c1", 1, now));
        assert!(!limiter.allow("c1", 1, now));
        assert!(limiter.allow("c1", 1, now + chrono::Duration::seconds(61)));
    }
}
