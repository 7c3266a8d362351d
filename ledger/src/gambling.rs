//! The `gambling_stats` table (spec.md §4.4): per-`(user, channel, game)`
//! lifetime plays/wagered/won, used by the `gambling`/`stats` PM command
//! and the admin `econ:gambling` view.

use rusqlite::params;
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamblingStats {
    pub plays: i64,
    pub wagered: i64,
    pub won: i64,
}

#[derive(Debug, Clone)]
pub struct GamblingStatsRepo {
    store: Arc<Store>,
}

impl GamblingStatsRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Records one play of `game` by `(username, channel)`: wager staked
    /// and, if any, amount won back (0 on a loss).
    pub async fn record_play(&self, username: &str, channel: &str, game: &str, wagered: i64, won: i64) -> Result<(), LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        let game = game.to_string();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO gambling_stats (username, channel, game, plays, wagered, won)
                     VALUES (?1, ?2, ?3, 1, ?4, ?5)
                     ON CONFLICT(username, channel, game) DO UPDATE SET
                        plays = plays + 1,
                        wagered = wagered + excluded.wagered,
                        won = won + excluded.won",
                    params![username, channel, game, wagered, won],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn get(&self, username: &str, channel: &str, game: &str) -> Result<GamblingStats, LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        let game = game.to_string();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT plays, wagered, won FROM gambling_stats WHERE username = ?1 AND channel = ?2 AND game = ?3",
                    params![username, channel, game],
                    |row| {
                        Ok(GamblingStats {
                            plays: row.get(0)?,
                            wagered: row.get(1)?,
                            won: row.get(2)?,
                        })
                    },
                )
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(GamblingStats::default()),
                    other => Err(other),
                })
            })
            .await
    }

    pub async fn list_for_user(&self, username: &str, channel: &str) -> Result<Vec<(String, GamblingStats)>, LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT game, plays, wagered, won FROM gambling_stats WHERE username = ?1 AND channel = ?2",
                )?;
                let rows = stmt.query_map(params![username, channel], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        GamblingStats {
                            plays: row.get(1)?,
                            wagered: row.get(2)?,
                            won: row.get(3)?,
                        },
                    ))
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
    async fn accumulates_across_plays() {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let repo = GamblingStatsRepo::new(Arc::new(store));
        repo.record_play("alice", "c1", "slot", 10, 0).await.unwrap();
        repo.record_play("alice", "c1", "slot", 10, 20).await.unwrap();
        let stats = repo.get("alice", "c1", "slot").await.unwrap();
        assert_eq!(stats, GamblingStats { plays: 2, wagered: 20, won: 20 });
    }

    #[tokio::test]
    async fn unknown_combination_is_zeroed() {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let repo = GamblingStatsRepo::new(Arc::new(store));
        let stats = repo.get("nobody", "c1", "slot").await.unwrap();
        assert_eq!(stats, GamblingStats::default());
    }
}
