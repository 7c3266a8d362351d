//! Rank resolution and achievement bookkeeping. Ranks are derived purely
//! from `lifetime_earned` against the configured tier table (spec.md
//! glossary: "Rank — a named tier derived from lifetime earned"), so no
//! separate rank table is needed; achievements are a narrow grant/list
//! table hung off the account the way spec.md §3 describes for
//! narrowly-purposed progression tables.

use chrono::Utc;
use economy_core::config::RankTier;
use economy_core::keys::AccountKey;
use rusqlite::params;
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ProgressionRepo {
    store: Arc<Store>,
}

impl ProgressionRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Resolve the rank label + discount/perks for a given lifetime-earned
    /// total, by walking the tier table from highest threshold down.
    pub fn resolve_rank<'a>(tiers: &'a [RankTier], lifetime_earned: i64) -> Option<&'a RankTier> {
        tiers
            .iter()
            .filter(|t| lifetime_earned >= t.min_lifetime_earned)
            .max_by_key(|t| t.min_lifetime_earned)
    }

    /// Grants an achievement if not already held. Returns `true` if newly
    /// granted.
    pub async fn grant_achievement(
        &self,
        key: &AccountKey,
        achievement_id: &str,
    ) -> Result<bool, LedgerError> {
        let key = key.clone();
        let achievement_id = achievement_id.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "INSERT INTO achievements (username, channel, achievement_id, earned_at)
                     VALUES (?1, ?2, ?3, ?4) ON CONFLICT(username, channel, achievement_id) DO NOTHING",
                    params![key.username, key.channel, achievement_id, now],
                )?;
                Ok(affected == 1)
            })
            .await
    }

    pub async fn has_achievement(
        &self,
        key: &AccountKey,
        achievement_id: &str,
    ) -> Result<bool, LedgerError> {
        let key = key.clone();
        let achievement_id = achievement_id.to_string();
        self.store
            .with_conn(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM achievements WHERE username = ?1 AND channel = ?2 AND achievement_id = ?3",
                    params![key.username, key.channel, achievement_id],
                    |r| r.get(0),
                )?;
                Ok(count > 0)
            })
            .await
    }

    pub async fn list_achievements(&self, key: &AccountKey) -> Result<Vec<String>, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT achievement_id FROM achievements WHERE username = ?1 AND channel = ?2 ORDER BY earned_at",
                )?;
                let rows = stmt.query_map(params![key.username, key.channel], |r| r.get(0))?;
                rows.collect()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(label: &str, min: i64) -> RankTier {
        RankTier {
            label: label.to_string(),
            min_lifetime_earned: min,
            discount_percent: 0.0,
            extra_queue_slots: 0,
            rain_bonus_percent: 0.0,
        }
    }

    #[test]
    fn resolve_rank_picks_highest_qualifying_tier() {
        let tiers = vec![tier("newcomer", 0), tier("regular", 100), tier("vip", 1000)];
        assert_eq!(
            ProgressionRepo::resolve_rank(&tiers, 500).unwrap().label,
            "regular"
        );
        assert_eq!(
            ProgressionRepo::resolve_rank(&tiers, 1500).unwrap().label,
            "vip"
        );
        assert_eq!(
            ProgressionRepo::resolve_rank(&tiers, 0).unwrap().label,
            "newcomer"
        );
    }
}
