//! Peer-to-peer tipping (spec.md §4.4): a straight debit-then-credit
//! bounded by `[min_amount, max_amount]`, logged to
//! [`economy_ledger::TipRepo`] alongside the usual transaction pair.

use economy_core::config::TippingConfig;
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::{Ledger, Tip, TipRepo};

use crate::error::SpendError;

#[derive(Debug)]
pub struct TipEngine {
    ledger: Ledger,
    repo: TipRepo,
}

impl TipEngine {
    pub fn new(ledger: Ledger, repo: TipRepo) -> Self {
        Self { ledger, repo }
    }

    pub async fn tip(&self, config: &TippingConfig, channel: &str, sender: &str, recipient: &str, amount: i64) -> Result<(), SpendError> {
        if !config.enabled {
            return Err(UserFacingError::Validation("tipping is not active in this channel".to_string()).into());
        }
        if sender.eq_ignore_ascii_case(recipient) {
            return Err(UserFacingError::Validation("you can't tip yourself".to_string()).into());
        }
        if amount < config.min_amount || amount > config.max_amount {
            return Err(UserFacingError::Validation(format!(
                "tip must be between {} and {} Z",
                config.min_amount, config.max_amount
            ))
            .into());
        }

        let sender_key = AccountKey::new(sender, channel);
        crate::pipeline::require_spendable_account(&self.ledger, &sender_key).await?;
        let debited = self.ledger.atomic_debit(&sender_key, amount, "spend", "tip.sent", recipient).await?;
        if !debited {
            return Err(UserFacingError::InsufficientFunds.into());
        }

        let recipient_key = AccountKey::new(recipient, channel);
        self.ledger
            .credit(&recipient_key, amount, "earn", "tip.received", sender, Some(sender), None)
            .await?;
        self.repo.record(channel, sender, recipient, amount).await?;
        Ok(())
    }

    pub async fn recent_for_user(&self, channel: &str, username: &str, limit: i64) -> Result<Vec<Tip>, SpendError> {
        self.repo.recent_for_user(channel, username, limit).await.map_err(Into::into)
    }
}
