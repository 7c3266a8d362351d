//! The `pending_challenges` table (spec.md §4.4): a duel escrow with
//! `{pending, accepted, declined, expired}` states, resolved either by the
//! target's response or by the scheduler's stale-row expiry sweep.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    pub id: i64,
    pub channel: String,
    pub initiator: String,
    pub target: String,
    pub wager: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

fn row_to_challenge(row: &rusqlite::Row<'_>) -> rusqlite::Result<Challenge> {
    Ok(Challenge {
        id: row.get("id")?,
        channel: row.get("channel")?,
        initiator: row.get("initiator")?,
        target: row.get("target")?,
        wager: row.get("wager")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
        resolved_at: row.get("resolved_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct ChallengeRepo {
    store: Arc<Store>,
}

impl ChallengeRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        channel: &str,
        initiator: &str,
        target: &str,
        wager: i64,
        expires_at: DateTime<Utc>,
    ) -> Result<i64, LedgerError> {
        let channel = channel.to_string();
        let initiator = initiator.to_string();
        let target = target.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO pending_challenges (channel, initiator, target, wager, status, created_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6)",
                    params![channel, initiator, target, wager, now, expires_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Challenge>, LedgerError> {
        self.store
            .with_conn(move |conn| {
                conn.query_row("SELECT * FROM pending_challenges WHERE id = ?1", params![id], row_to_challenge)
                    .optional()
            })
            .await
    }

    /// The latest pending challenge addressed to `target` in `channel`, if
    /// any (`accept`/`decline` act on "your" outstanding challenge without
    /// needing an id).
    pub async fn latest_pending_for_target(&self, channel: &str, target: &str) -> Result<Option<Challenge>, LedgerError> {
        let channel = channel.to_string();
        let target = target.to_string();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT * FROM pending_challenges WHERE channel = ?1 AND target = ?2 AND status = 'pending'
                     ORDER BY created_at DESC LIMIT 1",
                    params![channel, target],
                    row_to_challenge,
                )
                .optional()
            })
            .await
    }

    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Challenge>, LedgerError> {
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM pending_challenges WHERE status = 'pending' AND expires_at < ?1",
                )?;
                let rows = stmt.query_map(params![now], row_to_challenge)?;
                rows.collect()
            })
            .await
    }

    pub async fn accept(&self, id: i64) -> Result<bool, LedgerError> {
        self.transition(id, "accepted").await
    }

    pub async fn decline(&self, id: i64) -> Result<bool, LedgerError> {
        self.transition(id, "declined").await
    }

    pub async fn expire(&self, id: i64) -> Result<bool, LedgerError> {
        self.transition(id, "expired").await
    }

    async fn transition(&self, id: i64, new_status: &str) -> Result<bool, LedgerError> {
        let new_status = new_status.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "UPDATE pending_challenges SET status = ?1, resolved_at = ?2 WHERE id = ?3 AND status = 'pending'",
                    params![new_status, now, id],
                )?;
                Ok(affected == 1)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> ChallengeRepo {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        ChallengeRepo::new(Arc::new(store))
    }

    #[tokio::test]
    async fn accept_then_decline_is_a_no_op() {
        let repo = test_repo().await;
        let id = repo.create("c1", "alice", "bob", 50, Utc::now() + chrono::Duration::seconds(120)).await.unwrap();
        assert!(repo.accept(id).await.unwrap());
        assert!(!repo.decline(id).await.unwrap());
    }

    #[tokio::test]
    async fn expiry_sweep_finds_stale_rows() {
        let repo = test_repo().await;
        repo.create("c1", "alice", "bob", 50, Utc::now() - chrono::Duration::seconds(1)).await.unwrap();
        let expired = repo.list_expired(Utc::now()).await.unwrap();
        assert_eq!(expired.len(), 1);
    }
}
