//! The `bounties` table (spec.md §4.4): `{open, claimed, expired,
//! cancelled}` lifecycle. Every transition is a conditional `UPDATE ...
//! WHERE status = '<expected>'`, so a race between e.g. a claim and an
//! expiry sweep can only let one side win.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct Bounty {
    pub id: i64,
    pub channel: String,
    pub creator: String,
    pub amount: i64,
    pub description: String,
    pub status: String,
    pub claimant: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

fn row_to_bounty(row: &rusqlite::Row<'_>) -> rusqlite::Result<Bounty> {
    Ok(Bounty {
        id: row.get("id")?,
        channel: row.get("channel")?,
        creator: row.get("creator")?,
        amount: row.get("amount")?,
        description: row.get("description")?,
        status: row.get("status")?,
        claimant: row.get("claimant")?,
        created_at: row.get("created_at")?,
        expires_at: row.get("expires_at")?,
        resolved_at: row.get("resolved_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct BountyRepo {
    store: Arc<Store>,
}

impl BountyRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        channel: &str,
        creator: &str,
        amount: i64,
        description: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<i64, LedgerError> {
        let channel = channel.to_string();
        let creator = creator.to_string();
        let description = description.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO bounties (channel, creator, amount, description, status, created_at, expires_at)
                     VALUES (?1, ?2, ?3, ?4, 'open', ?5, ?6)",
                    params![channel, creator, amount, description, now, expires_at],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Bounty>, LedgerError> {
        self.store
            .with_conn(move |conn| {
                conn.query_row("SELECT * FROM bounties WHERE id = ?1", params![id], row_to_bounty)
                    .optional()
            })
            .await
    }

    pub async fn list_open(&self, channel: &str) -> Result<Vec<Bounty>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM bounties WHERE channel = ?1 AND status = 'open' ORDER BY created_at",
                )?;
                let rows = stmt.query_map(params![channel], row_to_bounty)?;
                rows.collect()
            })
            .await
    }

    pub async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Bounty>, LedgerError> {
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM bounties WHERE status = 'open' AND expires_at < ?1",
                )?;
                let rows = stmt.query_map(params![now], row_to_bounty)?;
                rows.collect()
            })
            .await
    }

    /// Claims an open bounty for `claimant`. Returns `true` if this call
    /// won the transition (status was still `open`).
    pub async fn claim(&self, id: i64, claimant: &str) -> Result<bool, LedgerError> {
        let claimant = claimant.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "UPDATE bounties SET status = 'claimed', claimant = ?1, resolved_at = ?2
                     WHERE id = ?3 AND status = 'open'",
                    params![claimant, now, id],
                )?;
                Ok(affected == 1)
            })
            .await
    }

    /// Expires an open bounty. Returns `true` if this call won the
    /// transition.
    pub async fn expire(&self, id: i64) -> Result<bool, LedgerError> {
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "UPDATE bounties SET status = 'expired', resolved_at = ?1 WHERE id = ?2 AND status = 'open'",
                    params![now, id],
                )?;
                Ok(affected == 1)
            })
            .await
    }

    /// Cancels an open bounty (creator-initiated). Returns `true` if this
    /// call won the transition.
    pub async fn cancel(&self, id: i64, channel: &str, creator: &str) -> Result<bool, LedgerError> {
        let channel = channel.to_string();
        let creator = creator.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "UPDATE bounties SET status = 'cancelled', resolved_at = ?1
                     WHERE id = ?2 AND channel = ?3 AND creator = ?4 AND status = 'open'",
                    params![now, id, channel, creator],
                )?;
                Ok(affected == 1)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> BountyRepo {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        BountyRepo::new(Arc::new(store))
    }

    #[tokio::test]
    async fn claim_is_idempotent_under_race() {
        let repo = test_repo().await;
        let id = repo
            .create("c1", "alice", 100, "find the cat", Utc::now() + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert!(repo.claim(id, "bob").await.unwrap());
        assert!(!repo.claim(id, "carol").await.unwrap());
        let bounty = repo.get(id).await.unwrap().unwrap();
        assert_eq!(bounty.claimant, Some("bob".to_string()));
    }

    #[tokio::test]
    async fn expiry_only_fires_once() {
        let repo = test_repo().await;
        let id = repo.create("c1", "alice", 100, "desc", Utc::now() - chrono::Duration::hours(1)).await.unwrap();
        assert!(repo.expire(id).await.unwrap());
        assert!(!repo.expire(id).await.unwrap());
    }
}
