//! The `tip_history` table: an append-only log of `spend.tip` transfers,
//! separate from the generic `transactions` log so `history`/admin views
//! can show tip pairs without reconstructing them from two rows.

use chrono::{DateTime, Utc};
use rusqlite::params;
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq)]
pub struct Tip {
    pub id: i64,
    pub channel: String,
    pub sender: String,
    pub recipient: String,
    pub amount: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TipRepo {
    store: Arc<Store>,
}

impl TipRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn record(&self, channel: &str, sender: &str, recipient: &str, amount: i64) -> Result<(), LedgerError> {
        let channel = channel.to_string();
        let sender = sender.to_string();
        let recipient = recipient.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO tip_history (channel, sender, recipient, amount, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![channel, sender, recipient, amount, now],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn recent_for_user(&self, channel: &str, username: &str, limit: i64) -> Result<Vec<Tip>, LedgerError> {
        let channel = channel.to_string();
        let username = username.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, channel, sender, recipient, amount, timestamp FROM tip_history
                     WHERE channel = ?1 AND (sender = ?2 OR recipient = ?2)
                     ORDER BY timestamp DESC LIMIT ?3",
                )?;
                let rows = stmt.query_map(params![channel, username, limit], |row| {
                    Ok(Tip {
                        id: row.get(0)?,
                        channel: row.get(1)?,
                        sender: row.get(2)?,
                        recipient: row.get(3)?,
                        amount: row.get(4)?,
                        timestamp: row.get(5)?,
                    })
                })?;
                rows.collect()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_lists_tips() {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let repo = TipRepo::new(Arc::new(store));
        repo.record("c1", "alice", "bob", 50).await.unwrap();
        let tips = repo.recent_for_user("c1", "bob", 10).await.unwrap();
        assert_eq!(tips.len(), 1);
        assert_eq!(tips[0].amount, 50);
    }
}
