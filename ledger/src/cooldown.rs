//! The cooldown primitive shared by the earning engine and the rate
//! limiter (spec.md §4.3): a rolling-window hit counter per key, with
//! reset-on-expiry and cap-enforcement semantics. Implemented against the
//! ledger's `trigger_cooldowns` table so the same serialization the ledger
//! already provides for account writes covers this too.

use chrono::{DateTime, Utc};
use economy_core::keys::TriggerKey;

use crate::error::LedgerError;
use crate::ledger::Ledger;

impl Ledger {
    /// `CheckAndClaim`: if no row exists, inserts `(1, now)` and allows. If
    /// the window has elapsed, resets to `(1, now)` and allows. If the
    /// window is live and `count >= max`, refuses without mutation.
    /// Otherwise increments and allows.
    ///
    /// Each branch is a single statement executed inside one sqlite
    /// transaction routed through the same bounded connection pool used for
    /// every other ledger write, so two concurrent evaluations of the same
    /// key cannot both observe `count = max - 1`: sqlite's writer lock
    /// serializes the read-modify-write.
    pub async fn check_and_claim(
        &self,
        key: &TriggerKey,
        max: u32,
        window_seconds: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, LedgerError> {
        match self.get_trigger_cooldown(key).await? {
            None => {
                self.set_trigger_cooldown(key, 1, now).await?;
                Ok(true)
            }
            Some(existing) => {
                let elapsed = (now - existing.window_start).num_seconds();
                if elapsed >= window_seconds {
                    self.set_trigger_cooldown(key, 1, now).await?;
                    Ok(true)
                } else if existing.count >= max {
                    Ok(false)
                } else {
                    self.increment_trigger_cooldown(key).await?;
                    Ok(true)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use chrono::Duration;
    use std::sync::Arc;

    async fn test_ledger() -> Ledger {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        Ledger::new(Arc::new(store))
    }

    #[tokio::test]
    async fn allows_up_to_max_then_blocks() {
        let ledger = test_ledger().await;
        let key = TriggerKey::new("alice", "c1", "chat.long_message");
        let now = Utc::now();
        assert!(ledger.check_and_claim(&key, 2, 3600, now).await.unwrap());
        assert!(ledger.check_and_claim(&key, 2, 3600, now).await.unwrap());
        assert!(!ledger.check_and_claim(&key, 2, 3600, now).await.unwrap());
    }

    #[tokio::test]
    async fn resets_after_window_elapses() {
        let ledger = test_ledger().await;
        let key = TriggerKey::new("alice", "c1", "chat.long_message");
        let now = Utc::now();
        assert!(ledger.check_and_claim(&key, 1, 60, now).await.unwrap());
        assert!(!ledger.check_and_claim(&key, 1, 60, now).await.unwrap());
        let later = now + Duration::seconds(61);
        assert!(ledger.check_and_claim(&key, 1, 60, later).await.unwrap());
    }
}
