//! In-memory per-channel state the earning engine needs beyond the
//! ledger: the last message seen (for `conversation_starter` and
//! `laugh_received`), the currently-playing media (for the `content.*`
//! triggers), recently-arrived users awaiting a greeting, and the
//! per-(user, date) emote set (spec.md §4.3, §5).

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct LastMessage {
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MediaState {
    pub media_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub first_after_claimed: bool,
    pub present_at_start: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct ChannelState {
    pub last_message: Option<LastMessage>,
    pub current_media: Option<MediaState>,
    pub previous_media: Option<MediaState>,
    /// user -> arrival time; removed once greeted or once stale.
    pub recent_arrivals: HashMap<String, DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct EngineState {
    pub channels: HashMap<String, ChannelState>,
    /// (user, channel, date) emote set, pruned whenever a new date is
    /// observed for that (user, channel) to bound memory.
    pub emote_dates: HashMap<(String, String), (NaiveDate, HashSet<String>)>,
}

impl EngineState {
    pub fn channel_mut(&mut self, channel: &str) -> &mut ChannelState {
        self.channels.entry(channel.to_string()).or_default()
    }

    /// Records newly-seen emote tokens for `(user, channel)` on `date`,
    /// pruning the set if `date` differs from what's stored. Returns the
    /// resulting set's cardinality (what gets persisted).
    pub fn record_emotes(&mut self, user: &str, channel: &str, date: NaiveDate, tokens: &[&str]) -> usize {
        let key = (user.to_string(), channel.to_string());
        let entry = self.emote_dates.entry(key).or_insert_with(|| (date, HashSet::new()));
        if entry.0 != date {
            *entry = (date, HashSet::new());
        }
        for token in tokens {
            entry.1.insert((*token).to_string());
        }
        entry.1.len()
    }

    pub fn note_arrival(&mut self, channel: &str, user: &str, now: DateTime<Utc>) {
        self.channel_mut(channel).recent_arrivals.insert(user.to_string(), now);
    }

    /// Scans `text` for any recently-arrived username and, if found,
    /// consumes that arrival's slot (first greeter wins), returning the
    /// greeted username.
    pub fn try_consume_greeting(&mut self, channel: &str, text: &str) -> Option<String> {
        let state = self.channel_mut(channel);
        let greeted = state
            .recent_arrivals
            .keys()
            .find(|name| text.to_lowercase().contains(&name.to_lowercase()))
            .cloned();
        if let Some(name) = &greeted {
            state.recent_arrivals.remove(name);
        }
        greeted
    }
}
