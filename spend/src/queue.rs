//! `spend.queue`/`playnext`/`forcenow` (spec.md §4.4, scenario E): resolve
//! a queue tier, apply the rank discount, debit, then ask the collaborator
//! to queue the media. A failed `AddMedia` call refunds the debit in full.

use chrono::Utc;
use economy_core::config::{RanksConfig, SpendingConfig};
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::Ledger;
use std::sync::Arc;

use crate::error::SpendError;
use crate::pipeline::{self, QueueCollaborator};

#[derive(Debug)]
pub struct QueueEngine {
    ledger: Ledger,
    collaborator: Arc<dyn QueueCollaborator>,
}

impl QueueEngine {
    pub fn new(ledger: Ledger, collaborator: Arc<dyn QueueCollaborator>) -> Self {
        Self { ledger, collaborator }
    }

    /// Queues `media_id` under `tier_id`. `play_next` and `force_now` select
    /// between `queue` (append), `playnext` (front of queue), and `forcenow`
    /// (immediate play) — all resolve to the same debit/refund pipeline,
    /// differing only in the collaborator call.
    pub async fn enqueue(
        &self,
        spending: &SpendingConfig,
        ranks: &RanksConfig,
        channel: &str,
        username: &str,
        tier_id: &str,
        media_id: &str,
        play_next: bool,
    ) -> Result<i64, SpendError> {
        let Some(tier) = spending.queue_tiers.iter().find(|t| t.id == tier_id) else {
            return Err(UserFacingError::NotFound("that queue tier".to_string()).into());
        };

        let key = AccountKey::new(username, channel);
        pipeline::require_spendable_account(&self.ledger, &key).await?;

        let now = Utc::now();
        if pipeline::in_blackout_window(&spending.blackout_crons, now) {
            return Err(UserFacingError::BlockedByBlackout.into());
        }

        let Some(account) = self.ledger.get_account(&key).await? else {
            return Err(UserFacingError::NotFound("your account".to_string()).into());
        };
        if !pipeline::meets_min_account_age(account.first_seen, now, spending.min_account_age_seconds) {
            return Err(UserFacingError::Validation("your account is too new to queue media".to_string()).into());
        }

        let ordinal = pipeline::rank_ordinal(&ranks.tiers, account.lifetime_earned);
        if ordinal < tier.min_rank {
            return Err(UserFacingError::Validation("your rank is too low for that queue tier".to_string()).into());
        }

        let discount = pipeline::rank_discount_fraction(&ranks.tiers, spending.spend_discount_per_rank, account.lifetime_earned);
        let cost = pipeline::discounted_cost(tier.cost, discount);

        let channel = channel.to_string();
        let media_id = media_id.to_string();
        let collaborator = self.collaborator.clone();
        pipeline::debit_then(
            &self.ledger,
            &key,
            cost,
            "spend.queue",
            tier_id,
            "refund.queue_failed",
            "media couldn't be queued",
            move || {
                let collaborator = collaborator.clone();
                async move { collaborator.add_media(&channel, &media_id, play_next).await }
            },
        )
        .await?;
        Ok(cost)
    }
}
