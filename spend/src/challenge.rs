//! The challenge (duel) state machine (spec.md §4.4): initiator debit is
//! escrowed, target is invited, and resolution pays the winner `2 × wager
//! × (1 − rake_percent)`. A background sweep (driven by the scheduler)
//! expires stale invitations and refunds the initiator.

use chrono::{DateTime, Utc};
use economy_core::config::ChallengeConfig;
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::{Challenge, ChallengeRepo, Ledger};

use crate::error::SpendError;

#[derive(Debug, Clone, PartialEq)]
pub struct DuelResolution {
    pub winner: String,
    pub loser: String,
    pub payout: i64,
}

#[derive(Debug)]
pub struct ChallengeEngine {
    ledger: Ledger,
    repo: ChallengeRepo,
}

impl ChallengeEngine {
    pub fn new(ledger: Ledger, repo: ChallengeRepo) -> Self {
        Self { ledger, repo }
    }

    /// Escrows the initiator's wager and opens the invitation.
    pub async fn issue(
        &self,
        config: &ChallengeConfig,
        channel: &str,
        initiator: &str,
        target: &str,
        wager: i64,
        now: DateTime<Utc>,
    ) -> Result<i64, SpendError> {
        if wager <= 0 {
            return Err(UserFacingError::Validation("wager must be positive".to_string()).into());
        }
        let key = AccountKey::new(initiator, channel);
        crate::pipeline::require_spendable_account(&self.ledger, &key).await?;
        let debited = self
            .ledger
            .atomic_debit(&key, wager, "gamble", "gambling.challenge_escrow", "challenge issued")
            .await?;
        if !debited {
            return Err(UserFacingError::InsufficientFunds.into());
        }
        let expires_at = now + chrono::Duration::seconds(config.timeout_seconds);
        let id = self.repo.create(channel, initiator, target, wager, expires_at).await?;
        Ok(id)
    }

    /// The target accepts: debits the target's matching wager and resolves
    /// a single Bernoulli-free coin flip (50/50, the duel itself has no
    /// configurable bias beyond the rake) to decide the winner.
    pub async fn accept(&self, config: &ChallengeConfig, id: i64, channel: &str, accepting_user: &str) -> Result<DuelResolution, SpendError> {
        let Some(challenge) = self.repo.get(id).await? else {
            return Err(UserFacingError::NotFound("that challenge".to_string()).into());
        };
        if challenge.channel != channel || challenge.target != accepting_user {
            return Err(UserFacingError::NotFound("that challenge".to_string()).into());
        }
        if !self.repo.accept(id).await? {
            return Err(UserFacingError::Validation("that challenge is no longer pending".to_string()).into());
        }

        let target_key = AccountKey::new(&challenge.target, channel);
        let debited = self
            .ledger
            .atomic_debit(&target_key, challenge.wager, "gamble", "gambling.challenge_escrow", "challenge accepted")
            .await?;
        if !debited {
            // target can't cover it; refund the initiator and treat as declined.
            self.refund_initiator(&challenge, channel).await?;
            return Err(UserFacingError::InsufficientFunds.into());
        }

        self.resolve(config, &challenge, channel).await
    }

    pub async fn decline(&self, id: i64, channel: &str, declining_user: &str) -> Result<(), SpendError> {
        let Some(challenge) = self.repo.get(id).await? else {
            return Err(UserFacingError::NotFound("that challenge".to_string()).into());
        };
        if challenge.channel != channel || challenge.target != declining_user {
            return Err(UserFacingError::NotFound("that challenge".to_string()).into());
        }
        if !self.repo.decline(id).await? {
            return Err(UserFacingError::Validation("that challenge is no longer pending".to_string()).into());
        }
        self.refund_initiator(&challenge, channel).await
    }

    /// Called by the scheduler's expiry sweep.
    pub async fn expire_stale(&self, now: DateTime<Utc>) -> Result<usize, SpendError> {
        let stale = self.repo.list_expired(now).await?;
        let mut expired = 0;
        for challenge in stale {
            if self.repo.expire(challenge.id).await? {
                self.refund_initiator(&challenge, &challenge.channel.clone()).await?;
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn refund_initiator(&self, challenge: &Challenge, channel: &str) -> Result<(), SpendError> {
        let key = AccountKey::new(&challenge.initiator, channel);
        self.ledger
            .credit(&key, challenge.wager, "refund", "gambling.challenge_refund", "challenge not accepted", None, None)
            .await?;
        Ok(())
    }

    async fn resolve(&self, config: &ChallengeConfig, challenge: &Challenge, channel: &str) -> Result<DuelResolution, SpendError> {
        let initiator_wins = rand::random::<bool>();
        let (winner, loser) = if initiator_wins {
            (challenge.initiator.clone(), challenge.target.clone())
        } else {
            (challenge.target.clone(), challenge.initiator.clone())
        };
        let payout = ((2 * challenge.wager) as f64 * (1.0 - config.rake_percent / 100.0)).round() as i64;
        let winner_key = AccountKey::new(&winner, channel);
        self.ledger
            .credit(&winner_key, payout, "gamble", "gambling.challenge_payout", "won a challenge", Some(&loser), None)
            .await?;
        Ok(DuelResolution { winner, loser, payout })
    }
}
