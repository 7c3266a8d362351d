//! The `pending_approvals` table (spec.md §4.4): channel GIFs and
//! force-play requests that debit up front and defer their side effect
//! until an admin resolves them `{pending, approved, rejected}`.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingApproval {
    pub id: i64,
    pub username: String,
    pub channel: String,
    pub kind: String,
    pub cost: i64,
    pub payload: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

fn row_to_approval(row: &rusqlite::Row<'_>) -> rusqlite::Result<PendingApproval> {
    Ok(PendingApproval {
        id: row.get("id")?,
        username: row.get("username")?,
        channel: row.get("channel")?,
        kind: row.get("kind")?,
        cost: row.get("cost")?,
        payload: row.get("payload")?,
        status: row.get("status")?,
        created_at: row.get("created_at")?,
        resolved_at: row.get("resolved_at")?,
    })
}

#[derive(Debug, Clone)]
pub struct ApprovalRepo {
    store: Arc<Store>,
}

impl ApprovalRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        username: &str,
        channel: &str,
        kind: &str,
        cost: i64,
        payload: &str,
    ) -> Result<i64, LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        let kind = kind.to_string();
        let payload = payload.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO pending_approvals (username, channel, kind, cost, payload, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
                    params![username, channel, kind, cost, payload, now],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    pub async fn get(&self, id: i64) -> Result<Option<PendingApproval>, LedgerError> {
        self.store
            .with_conn(move |conn| {
                conn.query_row("SELECT * FROM pending_approvals WHERE id = ?1", params![id], row_to_approval)
                    .optional()
            })
            .await
    }

    pub async fn list_pending(&self, channel: &str) -> Result<Vec<PendingApproval>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM pending_approvals WHERE channel = ?1 AND status = 'pending' ORDER BY created_at",
                )?;
                let rows = stmt.query_map(params![channel], row_to_approval)?;
                rows.collect()
            })
            .await
    }

    /// Approves a pending request. Returns `true` if this call won the
    /// transition (caller then executes the deferred side effect).
    pub async fn approve(&self, id: i64) -> Result<bool, LedgerError> {
        self.transition(id, "approved").await
    }

    /// Rejects a pending request. Returns `true` if this call won the
    /// transition (caller then issues the refund).
    pub async fn reject(&self, id: i64) -> Result<bool, LedgerError> {
        self.transition(id, "rejected").await
    }

    async fn transition(&self, id: i64, new_status: &str) -> Result<bool, LedgerError> {
        let new_status = new_status.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "UPDATE pending_approvals SET status = ?1, resolved_at = ?2 WHERE id = ?3 AND status = 'pending'",
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

    #[tokio::test]
    async fn reject_after_approve_is_a_no_op() {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let repo = ApprovalRepo::new(Arc::new(store));
        let id = repo.create("alice", "c1", "gif", 50, "{}").await.unwrap();
        assert!(repo.approve(id).await.unwrap());
        assert!(!repo.reject(id).await.unwrap());
    }
}
