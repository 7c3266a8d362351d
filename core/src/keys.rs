//! Named key structs, replacing the source's tuple/string-concatenation
//! keys (design notes §9: "avoid string-concatenation keys — they hide
//! shape bugs").

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one (user, channel) account — the grain of every balance,
/// session, and per-user cooldown in the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct AccountKey {
    pub username: String,
    pub channel: String,
}

impl AccountKey {
    pub fn new(username: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            channel: channel.into(),
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.channel)
    }
}

/// (user, channel, trigger) — the grain of the fractional accumulator and
/// trigger cooldowns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct TriggerKey {
    pub username: String,
    pub channel: String,
    pub trigger: String,
}

impl TriggerKey {
    pub fn new(username: impl Into<String>, channel: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            channel: channel.into(),
            trigger: trigger.into(),
        }
    }
}

/// (user, channel, date) — the grain of `DailyActivity` rollups and the
/// in-memory per-user emote set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DailyKey {
    pub username: String,
    pub channel: String,
    pub date: NaiveDate,
}

impl DailyKey {
    pub fn new(username: impl Into<String>, channel: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            username: username.into(),
            channel: channel.into(),
            date,
        }
    }
}

/// (channel, trigger, date) — the grain of `TriggerAnalytics`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct AnalyticsKey {
    pub channel: String,
    pub trigger: String,
    pub date: NaiveDate,
}

/// Case-insensitive username normalisation, used everywhere a username is
/// compared or used as a map key so callers can't accidentally bypass the
/// ignored-user gate via casing.
pub fn normalize_username(username: &str) -> String {
    username.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_key_display() {
        let key = AccountKey::new("Alice", "c1");
        assert_eq!(key.to_string(), "Alice@c1");
    }

    #[test]
    fn normalize_is_case_insensitive() {
        assert_eq!(normalize_username("Alice"), normalize_username("ALICE"));
    }
}
