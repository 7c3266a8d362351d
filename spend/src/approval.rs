//! Admin-gated purchases that defer their side effect (spec.md §4.4):
//! force-play and channel-GIF requests debit the requester immediately but
//! only reach the queue once an admin approves them through the dispatcher.
//! Rejection refunds in full.

use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::{ApprovalRepo, Ledger, PendingApproval};
use std::sync::Arc;

use crate::error::SpendError;
use crate::pipeline::QueueCollaborator;

#[derive(Debug)]
pub struct ApprovalEngine {
    ledger: Ledger,
    repo: ApprovalRepo,
    collaborator: Arc<dyn QueueCollaborator>,
}

impl ApprovalEngine {
    pub fn new(ledger: Ledger, repo: ApprovalRepo, collaborator: Arc<dyn QueueCollaborator>) -> Self {
        Self { ledger, repo, collaborator }
    }

    /// Debits `cost` and opens a pending request. `payload` is the media id
    /// the collaborator will be asked to queue once approved.
    pub async fn request(&self, username: &str, channel: &str, kind: &str, cost: i64, payload: &str) -> Result<i64, SpendError> {
        if cost <= 0 {
            return Err(UserFacingError::Validation("cost must be positive".to_string()).into());
        }
        let key = AccountKey::new(username, channel);
        crate::pipeline::require_spendable_account(&self.ledger, &key).await?;
        let debited = self.ledger.atomic_debit(&key, cost, "spend", "approval.request", kind).await?;
        if !debited {
            return Err(UserFacingError::InsufficientFunds.into());
        }
        self.repo.create(username, channel, kind, cost, payload).await.map_err(Into::into)
    }

    /// Approves the request and plays the media it paid for.
    pub async fn approve(&self, id: i64, play_next: bool) -> Result<PendingApproval, SpendError> {
        let Some(approval) = self.repo.get(id).await? else {
            return Err(UserFacingError::NotFound("that request".to_string()).into());
        };
        if !self.repo.approve(id).await? {
            return Err(UserFacingError::Validation("that request is no longer pending".to_string()).into());
        }
        if let Err(err) = self.collaborator.add_media(&approval.channel, &approval.payload, play_next).await {
            let key = AccountKey::new(&approval.username, &approval.channel);
            self.ledger
                .credit(&key, approval.cost, "refund", "approval.collaborator_failed", "request couldn't be queued", None, None)
                .await?;
            return Err(err);
        }
        self.repo.get(id).await?.ok_or_else(|| UserFacingError::NotFound("that request".to_string()).into())
    }

    pub async fn reject(&self, id: i64) -> Result<(), SpendError> {
        let Some(approval) = self.repo.get(id).await? else {
            return Err(UserFacingError::NotFound("that request".to_string()).into());
        };
        if !self.repo.reject(id).await? {
            return Err(UserFacingError::Validation("that request is no longer pending".to_string()).into());
        }
        let key = AccountKey::new(&approval.username, &approval.channel);
        self.ledger
            .credit(&key, approval.cost, "refund", "approval.rejected", "your request was rejected", None, None)
            .await?;
        Ok(())
    }

    pub async fn list_pending(&self, channel: &str) -> Result<Vec<PendingApproval>, SpendError> {
        self.repo.list_pending(channel).await.map_err(Into::into)
    }
}
