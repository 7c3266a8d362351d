//! The `streaks` and `hourly_milestones` tables (spec.md §4.5): the
//! scheduler's end-of-day streak roll-over and the presence tick's
//! cumulative-minutes milestone bonuses.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::error::LedgerError;
use crate::store::Store;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Streak {
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_qualifying_date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct StreakRepo {
    store: Arc<Store>,
}

impl StreakRepo {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, username: &str, channel: &str) -> Result<Streak, LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT current_streak, longest_streak, last_qualifying_date FROM streaks
                     WHERE username = ?1 AND channel = ?2",
                    params![username, channel],
                    |row| {
                        let date_str: Option<String> = row.get(2)?;
                        Ok(Streak {
                            current_streak: row.get(0)?,
                            longest_streak: row.get(1)?,
                            last_qualifying_date: date_str.and_then(|s| s.parse().ok()),
                        })
                    },
                )
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(Streak::default()),
                    other => Err(other),
                })
            })
            .await
    }

    /// Extends or restarts the streak for `(username, channel)` on `date`,
    /// given whether `date - 1 day` also qualified. Returns the new
    /// `current_streak`.
    pub async fn extend(&self, username: &str, channel: &str, date: NaiveDate, continued: bool) -> Result<i64, LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let existing: Option<(i64, i64)> = conn
                    .query_row(
                        "SELECT current_streak, longest_streak FROM streaks WHERE username = ?1 AND channel = ?2",
                        params![username, channel],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;
                let (previous_current, previous_longest) = existing.unwrap_or((0, 0));
                let new_current = if continued { previous_current + 1 } else { 1 };
                let new_longest = previous_longest.max(new_current);
                conn.execute(
                    "INSERT INTO streaks (username, channel, current_streak, longest_streak, last_qualifying_date)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(username, channel) DO UPDATE SET
                        current_streak = excluded.current_streak,
                        longest_streak = excluded.longest_streak,
                        last_qualifying_date = excluded.last_qualifying_date",
                    params![username, channel, new_current, new_longest, date.to_string()],
                )?;
                Ok(new_current)
            })
            .await
    }

    /// Records an hourly-presence milestone for `(username, channel, date)`.
    /// Returns `true` if this was a newly-crossed milestone (caller should
    /// award the bonus).
    pub async fn mark_milestone(&self, username: &str, channel: &str, date: NaiveDate, hours: i64) -> Result<bool, LedgerError> {
        let username = username.to_string();
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let affected = conn.execute(
                    "INSERT INTO hourly_milestones (username, channel, date, milestone_hours)
                     VALUES (?1, ?2, ?3, ?4) ON CONFLICT(username, channel, date, milestone_hours) DO NOTHING",
                    params![username, channel, date.to_string(), hours],
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
    async fn streak_extends_then_restarts() {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let repo = StreakRepo::new(Arc::new(store));
        let d1: NaiveDate = "2026-01-01".parse().unwrap();
        let d2: NaiveDate = "2026-01-02".parse().unwrap();
        assert_eq!(repo.extend("alice", "c1", d1, false).await.unwrap(), 1);
        assert_eq!(repo.extend("alice", "c1", d2, true).await.unwrap(), 2);
        let d4: NaiveDate = "2026-01-04".parse().unwrap();
        assert_eq!(repo.extend("alice", "c1", d4, false).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn milestone_fires_once_per_day() {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        let repo = StreakRepo::new(Arc::new(store));
        let date: NaiveDate = "2026-01-01".parse().unwrap();
        assert!(repo.mark_milestone("alice", "c1", date, 1).await.unwrap());
        assert!(!repo.mark_milestone("alice", "c1", date, 1).await.unwrap());
    }
}
