//! The shared spending validation pipeline (spec.md §4.4): account-exists
//! → not-banned → amount-valid → type-specific precondition → rank
//! discount → AtomicDebit → side effect → refund-on-failure. Every
//! concrete spend (queue, tip, vanity) is a thin wrapper around
//! [`debit_with_discount`] plus its own precondition and side effect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use economy_core::config::RankTier;
use economy_core::error::UserFacingError;
use economy_core::keys::AccountKey;
use economy_ledger::Ledger;

use crate::error::SpendError;

/// The outbound collaborator spend needs for `spend.queue`: add a resolved
/// media item to the channel's playback queue. Implemented by the broker
/// layer; spend only depends on the trait, not the transport.
#[async_trait]
pub trait QueueCollaborator: Send + Sync {
    async fn add_media(&self, channel: &str, media_id: &str, play_next: bool) -> Result<(), SpendError>;
}

/// Resolves the fractional spend discount for an account's lifetime
/// earnings against the rank tier table. A tier's own `discount_percent`
/// wins when set; otherwise the discount is the tier's 1-based ordinal
/// position times `spend_discount_per_rank` (see DESIGN.md — this
/// reconciles the ranks table's per-tier field with the worked example in
/// spec.md §8 Scenario E, which derives discount from rank-tier-index ×
/// a flat per-rank step).
pub fn rank_discount_fraction(tiers: &[RankTier], spend_discount_per_rank: f64, lifetime_earned: i64) -> f64 {
    let (ordinal, discount_percent) = rank_ordinal_and_discount(tiers, lifetime_earned);
    let fraction = if discount_percent > 0.0 {
        discount_percent / 100.0
    } else {
        ordinal as f64 * spend_discount_per_rank
    };
    fraction.clamp(0.0, 0.95)
}

/// The account's 1-based position in the tier table ordered by
/// `min_lifetime_earned`, `0` if no tier is met. Used both for the
/// discount fallback above and for `min_rank`-gated queue tiers.
pub fn rank_ordinal(tiers: &[RankTier], lifetime_earned: i64) -> i64 {
    rank_ordinal_and_discount(tiers, lifetime_earned).0 as i64
}

fn rank_ordinal_and_discount(tiers: &[RankTier], lifetime_earned: i64) -> (usize, f64) {
    let mut sorted: Vec<&RankTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_lifetime_earned);

    let mut ordinal = 0usize;
    let mut discount_percent = 0.0_f64;
    for (i, tier) in sorted.iter().enumerate() {
        if lifetime_earned >= tier.min_lifetime_earned {
            ordinal = i + 1;
            discount_percent = tier.discount_percent;
        }
    }
    (ordinal, discount_percent)
}

/// Applies the rank discount to `base_cost`, floored at 1 Z.
pub fn discounted_cost(base_cost: i64, discount_fraction: f64) -> i64 {
    let discounted = (base_cost as f64) * (1.0 - discount_fraction);
    discounted.round().max(1.0) as i64
}

/// Runs the shared preamble: the account must exist and not be banned.
/// Callers check type-specific preconditions (amount range, cooldown,
/// blackout, min rank/account age) before calling this.
pub async fn require_spendable_account(ledger: &Ledger, key: &AccountKey) -> Result<(), SpendError> {
    if ledger.is_banned(key).await? {
        return Err(UserFacingError::BlockedByBan.into());
    }
    Ok(())
}

/// Debits `amount` and, if the side effect fails, issues a refund credit
/// under `refund_trigger` with an audit-trail reason. Returns the side
/// effect's result on success.
pub async fn debit_then<F, Fut, T>(
    ledger: &Ledger,
    key: &AccountKey,
    amount: i64,
    debit_trigger: &str,
    debit_reason: &str,
    refund_trigger: &str,
    refund_reason: &str,
    side_effect: F,
) -> Result<T, SpendError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, SpendError>>,
{
    let debited = ledger.atomic_debit(key, amount, "spend", debit_trigger, debit_reason).await?;
    if !debited {
        return Err(UserFacingError::InsufficientFunds.into());
    }

    match side_effect().await {
        Ok(value) => Ok(value),
        Err(err) => {
            ledger
                .credit(key, amount, "refund", refund_trigger, refund_reason, None, None)
                .await?;
            Err(err)
        }
    }
}

/// `spend.queue`'s blackout-window check: inside a window iff the cron
/// expression's previous firing is `≤ duration` ago.
pub fn in_blackout_window(windows: &[economy_core::config::BlackoutWindow], now: DateTime<Utc>) -> bool {
    windows.iter().any(|w| {
        economy_core::cron::previous_fire(&w.cron, now)
            .map(|prev| (now - prev).num_minutes() <= w.duration_minutes)
            .unwrap_or(false)
    })
}

/// Account age gate for `min_account_age_seconds`.
pub fn meets_min_account_age(first_seen: DateTime<Utc>, now: DateTime<Utc>, min_seconds: i64) -> bool {
    (now - first_seen).num_seconds() >= min_seconds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(label: &str, min: i64, discount_percent: f64) -> RankTier {
        RankTier {
            label: label.to_string(),
            min_lifetime_earned: min,
            discount_percent,
            extra_queue_slots: 0,
            rain_bonus_percent: 0.0,
        }
    }

    #[test]
    fn scenario_e_discount_matches_worked_example() {
        // rank-tier 5 (ordinal 5), spend_discount_per_rank = 0.02 -> 0.10
        let tiers: Vec<RankTier> = (1..=5).map(|i| tier(&format!("tier{i}"), i as i64 * 100, 0.0)).collect();
        let discount = rank_discount_fraction(&tiers, 0.02, 500);
        assert!((discount - 0.10).abs() < 1e-9);
        assert_eq!(discounted_cost(500, discount), 450);
    }

    #[test]
    fn explicit_tier_discount_percent_wins() {
        let tiers = vec![tier("vip", 0, 25.0)];
        let discount = rank_discount_fraction(&tiers, 0.02, 100);
        assert!((discount - 0.25).abs() < 1e-9);
    }

    #[test]
    fn no_qualifying_tier_is_no_discount() {
        let tiers = vec![tier("vip", 1000, 25.0)];
        assert_eq!(rank_discount_fraction(&tiers, 0.02, 100), 0.0);
    }
}
