//! Content-hash dedup for announcements (spec.md §4.6): a `(channel,
//! renderedMessage)` pair seen within `dedup_window_seconds` is rejected.
//! A simple FNV-1a hash keeps the ring free of string storage.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

fn fnv1a(channel: &str, message: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in channel.as_bytes().iter().chain(&[0u8]).chain(message.as_bytes()) {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[derive(Debug, Default)]
pub struct DedupRing {
    seen: HashMap<u64, DateTime<Utc>>,
}

impl DedupRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this `(channel, message)` was already seen within
    /// `window_seconds` of `now`, and records it either way so the next
    /// call observes the freshest timestamp.
    pub fn is_duplicate(&mut self, channel: &str, message: &str, window_seconds: i64, now: DateTime<Utc>) -> bool {
        let key = fnv1a(channel, message);
        let duplicate = self.seen.get(&key).is_some_and(|seen_at| (now - *seen_at).num_seconds() < window_seconds);
        self.seen.insert(key, now);
        self.prune(window_seconds, now);
        duplicate
    }

    fn prune(&mut self, window_seconds: i64, now: DateTime<Utc>) {
        self.seen.retain(|_, seen_at| (now - *seen_at).num_seconds() < window_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_within_window_is_duplicate() {
        let mut ring = DedupRing::new();
        let now = Utc::now();
        assert!(!ring.is_duplicate("c1", "hello", 300, now));
        assert!(ring.is_duplicate("c1", "hello", 300, now + chrono::Duration::seconds(10)));
    }

    #[test]
    fn repeat_after_window_is_not_duplicate() {
        let mut ring = DedupRing::new();
        let now = Utc::now();
        assert!(!ring.is_duplicate("c1", "hello", 60, now));
        assert!(!ring.is_duplicate("c1", "hello", 60, now + chrono::Duration::seconds(61)));
    }

    #[test]
    fn different_channels_are_independent() {
        let mut ring = DedupRing::new();
        let now = Utc::now();
        assert!(!ring.is_duplicate("c1", "hello", 300, now));
        assert!(!ring.is_duplicate("c2", "hello", 300, now));
    }
}
