//! The bounty lifecycle (spec.md §4.4): creation debits the creator, a
//! claim credits the winner in full, and expiry refunds the creator a
//! configured percentage. All transitions go through
//! [`economy_ledger::BountyRepo`]'s conditional updates.

use chrono::{DateTime, Utc};
use economy_core::config::BountiesConfig;
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::{Bounty, BountyRepo, Ledger};

use crate::error::SpendError;

#[derive(Debug)]
pub struct BountyEngine {
    ledger: Ledger,
    repo: BountyRepo,
}

impl BountyEngine {
    pub fn new(ledger: Ledger, repo: BountyRepo) -> Self {
        Self { ledger, repo }
    }

    pub async fn create(
        &self,
        config: &BountiesConfig,
        channel: &str,
        creator: &str,
        amount: i64,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<i64, SpendError> {
        if !config.enabled {
            return Err(UserFacingError::Validation("bounties are not active in this channel".to_string()).into());
        }
        if amount <= 0 {
            return Err(UserFacingError::Validation("bounty amount must be positive".to_string()).into());
        }
        let key = AccountKey::new(creator, channel);
        crate::pipeline::require_spendable_account(&self.ledger, &key).await?;
        let debited = self.ledger.atomic_debit(&key, amount, "spend", "bounty.create", "posted a bounty").await?;
        if !debited {
            return Err(UserFacingError::InsufficientFunds.into());
        }
        let expires_at = now + chrono::Duration::hours(config.default_expiry_hours);
        let id = self.repo.create(channel, creator, amount, description, expires_at).await?;
        Ok(id)
    }

    pub async fn claim(&self, id: i64, channel: &str, claimant: &str) -> Result<Bounty, SpendError> {
        let Some(bounty) = self.repo.get(id).await? else {
            return Err(UserFacingError::NotFound("that bounty".to_string()).into());
        };
        if bounty.channel != channel {
            return Err(UserFacingError::NotFound("that bounty".to_string()).into());
        }
        if !self.repo.claim(id, claimant).await? {
            return Err(UserFacingError::Validation("that bounty is no longer open".to_string()).into());
        }
        let key = AccountKey::new(claimant, channel);
        self.ledger
            .credit(&key, bounty.amount, "earn", "bounty.claimed", "claimed a bounty", Some(&bounty.creator), None)
            .await?;
        self.repo.get(id).await?.ok_or_else(|| UserFacingError::NotFound("that bounty".to_string()).into())
    }

    pub async fn cancel(&self, id: i64, channel: &str, creator: &str) -> Result<(), SpendError> {
        let Some(bounty) = self.repo.get(id).await? else {
            return Err(UserFacingError::NotFound("that bounty".to_string()).into());
        };
        if !self.repo.cancel(id, channel, creator).await? {
            return Err(UserFacingError::Validation("that bounty can't be cancelled".to_string()).into());
        }
        let key = AccountKey::new(creator, channel);
        self.ledger
            .credit(&key, bounty.amount, "refund", "bounty.cancelled", "cancelled your bounty", None, None)
            .await?;
        Ok(())
    }

    /// Called by the scheduler's hourly bounty-expiry sweep.
    pub async fn expire_due(&self, config: &BountiesConfig, channel: &str, now: DateTime<Utc>) -> Result<usize, SpendError> {
        let mut expired = 0;
        for bounty in self.repo.list_expired(now).await? {
            if bounty.channel != channel {
                continue;
            }
            if self.repo.expire(bounty.id).await? {
                let refund = ((bounty.amount as f64) * config.expiry_refund_percent / 100.0).round() as i64;
                if refund > 0 {
                    let key = AccountKey::new(&bounty.creator, channel);
                    self.ledger
                        .credit(&key, refund, "refund", "bounty.expired", "your bounty expired unclaimed", None, None)
                        .await?;
                }
                expired += 1;
            }
        }
        Ok(expired)
    }
}
