//! The presence tracker: session bookkeeping with join-debounced arrival
//! detection (spec.md §4.2). Exclusively owns the in-memory `sessions` and
//! `last_departure` maps; persisted `last_seen` is read/written through the
//! ledger only at the boundaries the spec names (finalize-on-departure,
//! genuine-arrival check).

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use economy_core::{ignored::IgnoredUsers, keys::AccountKey};
use economy_ledger::Ledger;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::session::{ArrivalOutcome, Session};

#[derive(Default)]
struct State {
    sessions: HashMap<AccountKey, Session>,
    last_departure: HashMap<AccountKey, DateTime<Utc>>,
    known_rank: HashMap<(String, String), i64>,
}

#[derive(Debug, Clone)]
pub struct PresenceTracker {
    ledger: Ledger,
    ignored: Arc<parking_lot::RwLock<IgnoredUsers>>,
    join_debounce_minutes: Arc<parking_lot::RwLock<i64>>,
    state: Arc<Mutex<State>>,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("sessions", &self.sessions.len())
            .field("last_departure", &self.last_departure.len())
            .finish()
    }
}

impl PresenceTracker {
    pub fn new(ledger: Ledger, ignored: IgnoredUsers, join_debounce_minutes: i64) -> Self {
        Self {
            ledger,
            ignored: Arc::new(parking_lot::RwLock::new(ignored)),
            join_debounce_minutes: Arc::new(parking_lot::RwLock::new(join_debounce_minutes)),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    pub fn on_config_update(&self, ignored: IgnoredUsers, join_debounce_minutes: i64) {
        *self.ignored.write() = ignored;
        *self.join_debounce_minutes.write() = join_debounce_minutes;
    }

    fn debounce(&self) -> ChronoDuration {
        ChronoDuration::minutes(*self.join_debounce_minutes.read())
    }

    /// Handle an `adduser` event. Returns the [`ArrivalOutcome`] so the
    /// caller can decide whether to credit the welcome wallet / apply a
    /// custom greeting.
    pub async fn handle_join(&self, user: &str, channel: &str, now: DateTime<Utc>) -> ArrivalOutcome {
        if self.ignored.read().contains(user) {
            return ArrivalOutcome::Ignored;
        }
        let key = AccountKey::new(user, channel);

        {
            let state = self.state.lock();
            if state.sessions.contains_key(&key) {
                return ArrivalOutcome::AlreadyConnected;
            }
        }

        let genuine = self.is_genuine_arrival(&key, now).await;

        let mut state = self.state.lock();
        // Re-check under lock in case of a race between the early read
        // above and here; still idempotent.
        if state.sessions.contains_key(&key) {
            return ArrivalOutcome::AlreadyConnected;
        }

        if genuine {
            state.sessions.insert(key.clone(), Session::new(now));
            state.last_departure.remove(&key);
            drop(state);
            self.ledger.get_or_create_account(&key).await.ok();
            ArrivalOutcome::GenuineArrival
        } else {
            // Bounce: preserve session continuity using the earlier
            // connected_at if we still have a departure record pointing at
            // one; otherwise this is effectively genuine (no in-memory
            // trace, but persisted last_seen was recent).
            let connected_at = state
                .last_departure
                .get(&key)
                .copied()
                .unwrap_or(now);
            debug!(user, channel, "presence: bounce, preserving session continuity");
            state.sessions.insert(key.clone(), Session::new(connected_at));
            state.last_departure.remove(&key);
            ArrivalOutcome::Bounce
        }
    }

    /// Genuine iff neither an in-memory departure nor a persisted
    /// `last_seen` falls within `join_debounce_minutes` of `now`.
    async fn is_genuine_arrival(&self, key: &AccountKey, now: DateTime<Utc>) -> bool {
        let debounce = self.debounce();
        let in_memory_recent = {
            let state = self.state.lock();
            state
                .last_departure
                .get(key)
                .is_some_and(|departed| now - *departed < debounce)
        };
        if in_memory_recent {
            return false;
        }
        match self.ledger.get_account(key).await {
            Ok(Some(account)) => now - account.last_seen >= debounce,
            Ok(None) => true,
            Err(_) => true,
        }
    }

    /// Handle a `userleave` event. Records the departure timestamp
    /// immediately and spawns a deferred finalize task after the debounce
    /// window, matching spec.md §4.2's "schedule a deferred finalize".
    pub fn handle_leave(&self, user: &str, channel: &str, now: DateTime<Utc>) {
        if self.ignored.read().contains(user) {
            return;
        }
        let key = AccountKey::new(user, channel);
        let connected_at_at_leave = {
            let mut state = self.state.lock();
            let Some(session) = state.sessions.get(&key) else {
                return;
            };
            let connected_at = session.connected_at;
            state.last_departure.insert(key.clone(), now);
            connected_at
        };

        let debounce = self.debounce();
        let tracker = self.clone();
        tokio::spawn(async move {
            let sleep_for = debounce.to_std().unwrap_or(std::time::Duration::from_secs(300));
            tokio::time::sleep(sleep_for).await;
            tracker.finalize_departure(&key, connected_at_at_leave).await;
        });
    }

    async fn finalize_departure(&self, key: &AccountKey, connected_at_at_leave: DateTime<Utc>) {
        let should_remove = {
            let mut state = self.state.lock();
            match state.sessions.get(key) {
                // Session was replaced by a newer connect: do nothing.
                Some(session) if session.connected_at != connected_at_at_leave => false,
                Some(_) => {
                    state.sessions.remove(key);
                    true
                }
                None => false,
            }
        };
        if should_remove {
            if let Ok(account) = self.ledger.get_or_create_account(key).await {
                let _ = account;
            }
            if let Err(error) = self.touch_last_seen(key).await {
                tracing::warn!(%key, %error, "presence: failed to persist last_seen on departure");
            }
        }
    }

    async fn touch_last_seen(&self, key: &AccountKey) -> Result<(), economy_ledger::LedgerError> {
        // Persisting last_seen piggybacks on get_or_create_account's
        // upsert path via a zero-amount no-op credit is wrong (would log a
        // spurious transaction); instead we touch last_active through a
        // dedicated zero-effect ledger call is also wrong. The ledger's
        // `set_balance` with the current balance is the only idempotent,
        // transaction-log-silent write available, so we read-then-write.
        if let Some(account) = self.ledger.get_account(key).await? {
            self.ledger.set_balance(key, account.balance).await?;
        }
        Ok(())
    }

    /// Used by the greeting subsystem, which applies a longer threshold
    /// than the join debounce.
    pub fn was_absent_longer_than(&self, user: &str, channel: &str, minutes: i64, now: DateTime<Utc>) -> bool {
        let key = AccountKey::new(user, channel);
        let state = self.state.lock();
        match state.last_departure.get(&key) {
            None => true,
            Some(departed) => now - *departed >= ChronoDuration::minutes(minutes),
        }
    }

    /// The non-ignored connected set for a channel, used by rain
    /// distribution and population-multiplier thresholds.
    pub fn connected_users(&self, channel: &str) -> Vec<String> {
        let state = self.state.lock();
        state
            .sessions
            .keys()
            .filter(|k| k.channel == channel)
            .map(|k| k.username.clone())
            .collect()
    }

    pub fn is_connected(&self, user: &str, channel: &str) -> bool {
        let key = AccountKey::new(user, channel);
        self.state.lock().sessions.contains_key(&key)
    }

    pub fn population(&self, channel: &str) -> usize {
        let state = self.state.lock();
        state.sessions.keys().filter(|k| k.channel == channel).count()
    }

    /// Handle a `setafk` event. AFK sessions stay connected (still counted
    /// in `population`) but are skipped by the presence tick's per-minute
    /// credit.
    pub fn set_afk(&self, user: &str, channel: &str, afk: bool) {
        let key = AccountKey::new(user, channel);
        let mut state = self.state.lock();
        if let Some(session) = state.sessions.get_mut(&key) {
            session.afk = afk;
        }
    }

    pub fn set_known_rank(&self, channel: &str, user: &str, rank: i64) {
        let mut state = self.state.lock();
        state.known_rank.insert((channel.to_string(), user.to_string()), rank);
    }

    pub fn known_rank(&self, channel: &str, user: &str) -> Option<i64> {
        let state = self.state.lock();
        state.known_rank.get(&(channel.to_string(), user.to_string())).copied()
    }

    /// Owned by the scheduler's periodic tick: enumerates all sessions,
    /// returning `(user, channel)` pairs to credit for one minute of
    /// presence, and bumps each session's cumulative-minutes-today and
    /// last-tick-at bookkeeping.
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<(AccountKey, i64)> {
        let mut state = self.state.lock();
        let mut out = Vec::with_capacity(state.sessions.len());
        for (key, session) in state.sessions.iter_mut() {
            if session.afk {
                continue;
            }
            session.last_tick_at = Some(now);
            session.cumulative_minutes_today += 1;
            out.push((key.clone(), session.cumulative_minutes_today));
        }
        out
    }

    pub fn reset_daily_minutes(&self) {
        let mut state = self.state.lock();
        for session in state.sessions.values_mut() {
            session.cumulative_minutes_today = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use economy_ledger::{Ledger, Store};
    use std::sync::Arc as StdArc;

    async fn tracker() -> PresenceTracker {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let ledger = Ledger::new(StdArc::new(store));
        PresenceTracker::new(ledger, IgnoredUsers::default(), 5)
    }

    #[tokio::test]
    async fn ignored_user_join_is_noop() {
        let tracker = PresenceTracker::new(
            Ledger::new(StdArc::new(Store::open(":memory:", 5000, 1).unwrap())),
            IgnoredUsers::new(["bot".to_string()]),
            5,
        );
        let now = Utc::now();
        let outcome = tracker.handle_join("bot", "c1", now).await;
        assert_eq!(outcome, ArrivalOutcome::Ignored);
        assert!(!tracker.is_connected("bot", "c1"));
    }

    #[tokio::test]
    async fn first_join_is_genuine() {
        let tracker = tracker().await;
        let now = Utc::now();
        let outcome = tracker.handle_join("alice", "c1", now).await;
        assert_eq!(outcome, ArrivalOutcome::GenuineArrival);
    }

    #[tokio::test]
    async fn rejoin_while_still_connected_is_idempotent() {
        let tracker = tracker().await;
        let now = Utc::now();
        tracker.handle_join("alice", "c1", now).await;
        let outcome = tracker.handle_join("alice", "c1", now + ChronoDuration::seconds(10)).await;
        assert_eq!(outcome, ArrivalOutcome::AlreadyConnected);
    }

    #[tokio::test]
    async fn quick_bounce_within_debounce_is_not_genuine() {
        let tracker = tracker().await;
        let now = Utc::now();
        tracker.handle_join("alice", "c1", now).await;
        tracker.handle_leave("alice", "c1", now + ChronoDuration::seconds(30));
        let rejoin = tracker
            .handle_join("alice", "c1", now + ChronoDuration::seconds(60))
            .await;
        assert_eq!(rejoin, ArrivalOutcome::Bounce);
    }
}
