//! The cooperative heist game (spec.md §4.4): a join window collects
//! participants (each debited on join), and a single Bernoulli draw at
//! window close decides whether everyone is paid `wager × payoutMultiplier`
//! or nothing. Gated behind `gambling.heist.enabled` (default `false` in
//! [`HeistConfig`] — see DESIGN.md for why this ships disabled by default).

use chrono::{DateTime, Utc};
use economy_core::config::HeistConfig;
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::Ledger;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::SpendError;

#[derive(Debug, Clone)]
struct OpenHeist {
    opened_at: DateTime<Utc>,
    participants: HashMap<String, i64>,
}

#[derive(Debug)]
pub struct HeistEngine {
    ledger: Ledger,
    open: Mutex<HashMap<String, OpenHeist>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeistResult {
    pub success: bool,
    pub payouts: Vec<(String, i64)>,
}

impl HeistEngine {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            open: Mutex::new(HashMap::new()),
        }
    }

    fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Opens a join window for `channel` if none is open, or joins the
    /// existing one. Debits `wager` immediately.
    pub async fn join(&self, config: &HeistConfig, channel: &str, username: &str, wager: i64, now: DateTime<Utc>) -> Result<(), SpendError> {
        if !config.enabled {
            return Err(UserFacingError::Validation("heists are not active in this channel".to_string()).into());
        }
        if wager <= 0 {
            return Err(UserFacingError::Validation("wager must be positive".to_string()).into());
        }

        let already_open = {
            let mut open = self.open.lock();
            let entry = open.entry(channel.to_string()).or_insert_with(|| OpenHeist {
                opened_at: now,
                participants: HashMap::new(),
            });
            let still_open = (now - entry.opened_at).num_seconds() < config.join_window_seconds;
            if !still_open {
                *entry = OpenHeist { opened_at: now, participants: HashMap::new() };
            }
            entry.participants.contains_key(username)
        };
        if already_open {
            return Err(UserFacingError::Validation("you've already joined this heist".to_string()).into());
        }

        let key = AccountKey::new(username, channel);
        crate::pipeline::require_spendable_account(self.ledger(), &key).await?;
        let debited = self.ledger().atomic_debit(&key, wager, "gamble", "gambling.heist_join", "joined a heist").await?;
        if !debited {
            return Err(UserFacingError::InsufficientFunds.into());
        }

        self.open.lock().get_mut(channel).expect("just inserted").participants.insert(username.to_string(), wager);
        Ok(())
    }

    /// True once `now` is past the join window for a channel with an open
    /// heist; the caller (scheduler) resolves it at that point.
    pub fn is_ready_to_resolve(&self, config: &HeistConfig, channel: &str, now: DateTime<Utc>) -> bool {
        self.open
            .lock()
            .get(channel)
            .is_some_and(|h| !h.participants.is_empty() && (now - h.opened_at).num_seconds() >= config.join_window_seconds)
    }

    pub async fn resolve(&self, config: &HeistConfig, channel: &str) -> Result<HeistResult, SpendError> {
        let participants = {
            let mut open = self.open.lock();
            open.remove(channel).map(|h| h.participants).unwrap_or_default()
        };
        let success = rand::random::<f64>() < config.success_probability;
        let mut payouts = Vec::new();
        if success {
            for (username, wager) in &participants {
                let payout = (*wager as f64 * config.payout_multiplier).round() as i64;
                let key = AccountKey::new(username.as_str(), channel);
                self.ledger()
                    .credit(&key, payout, "gamble", "gambling.heist_payout", "heist succeeded", None, None)
                    .await?;
                payouts.push((username.clone(), payout));
            }
        }
        Ok(HeistResult { success, payouts })
    }
}
