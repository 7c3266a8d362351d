//! The ledger: durable accounts, the append-only transaction log, daily
//! activity rollups, trigger cooldowns/analytics, snapshots, and aggregate
//! read queries (spec.md §4.1). This is the only code in the service
//! permitted to write `accounts` or `transactions`.

use chrono::{DateTime, NaiveDate, Utc};
use economy_core::keys::{AccountKey, AnalyticsKey, DailyKey, TriggerKey};
use rusqlite::{params, OptionalExtension};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::LedgerError;
use crate::models::{
    Account, DailyActivity, EconomySnapshot, LeaderboardEntry, RankRow, Transaction,
    TriggerAnalytics, TriggerCooldown,
};
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Ledger {
    store: Arc<Store>,
}

fn row_to_account(row: &rusqlite::Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        username: row.get("username")?,
        channel: row.get("channel")?,
        balance: row.get("balance")?,
        lifetime_earned: row.get("lifetime_earned")?,
        lifetime_spent: row.get("lifetime_spent")?,
        lifetime_gambled: row.get("lifetime_gambled")?,
        rank_label: row.get("rank_label")?,
        economy_banned: row.get::<_, i64>("economy_banned")? != 0,
        first_seen: row.get("first_seen")?,
        last_seen: row.get("last_seen")?,
        last_active: row.get("last_active")?,
        chat_color: row.get("chat_color")?,
        custom_greeting: row.get("custom_greeting")?,
        currency_name: row.get("currency_name")?,
    })
}

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    let metadata_str: Option<String> = row.get("metadata")?;
    Ok(Transaction {
        id: row.get("id")?,
        username: row.get("username")?,
        channel: row.get("channel")?,
        amount: row.get("amount")?,
        tx_type: row.get("tx_type")?,
        trigger: row.get("trigger_id")?,
        reason: row.get("reason")?,
        related_user: row.get("related_user")?,
        metadata: metadata_str.and_then(|s| serde_json::from_str(&s).ok()),
        timestamp: row.get("timestamp")?,
    })
}

impl Ledger {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Idempotent account creation: creates with zero balance and the
    /// default rank label if absent, otherwise returns the existing row.
    #[instrument(skip(self))]
    pub async fn get_or_create_account(&self, key: &AccountKey) -> Result<Account, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO accounts (username, channel, balance, lifetime_earned, lifetime_spent, lifetime_gambled, rank_label, economy_banned, first_seen, last_seen, last_active)
                     VALUES (?1, ?2, 0, 0, 0, 0, 'newcomer', 0, ?3, ?3, ?3)
                     ON CONFLICT(username, channel) DO NOTHING",
                    params![key.username, key.channel, now],
                )?;
                conn.query_row(
                    "SELECT * FROM accounts WHERE username = ?1 AND channel = ?2",
                    params![key.username, key.channel],
                    row_to_account,
                )
            })
            .await
    }

    pub async fn get_account(&self, key: &AccountKey) -> Result<Option<Account>, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT * FROM accounts WHERE username = ?1 AND channel = ?2",
                    params![key.username, key.channel],
                    row_to_account,
                )
                .optional()
            })
            .await
    }

    /// Credits `amount` (must be > 0) to the account, creating it if
    /// needed, and logs the transaction — all in one committed
    /// transaction. Returns the new balance.
    #[instrument(skip(self, metadata))]
    #[allow(clippy::too_many_arguments)]
    pub async fn credit(
        &self,
        key: &AccountKey,
        amount: i64,
        tx_type: &str,
        trigger: &str,
        reason: &str,
        related_user: Option<&str>,
        metadata: Option<serde_json::Value>,
    ) -> Result<i64, LedgerError> {
        assert!(amount > 0, "credit amount must be positive");
        let key = key.clone();
        let tx_type = tx_type.to_string();
        let trigger = trigger.to_string();
        let reason = reason.to_string();
        let related_user = related_user.map(str::to_string);
        let metadata_str = metadata.map(|v| v.to_string());
        self.store
            .with_conn(move |conn| {
                let mut conn = conn;
                let tx = conn.transaction()?;
                let now = Utc::now();
                tx.execute(
                    "INSERT INTO accounts (username, channel, balance, lifetime_earned, lifetime_spent, lifetime_gambled, rank_label, economy_banned, first_seen, last_seen, last_active)
                     VALUES (?1, ?2, 0, 0, 0, 0, 'newcomer', 0, ?3, ?3, ?3)
                     ON CONFLICT(username, channel) DO NOTHING",
                    params![key.username, key.channel, now],
                )?;
                tx.execute(
                    "UPDATE accounts SET balance = balance + ?1, lifetime_earned = lifetime_earned + ?1, last_active = ?2
                     WHERE username = ?3 AND channel = ?4",
                    params![amount, now, key.username, key.channel],
                )?;
                tx.execute(
                    "INSERT INTO transactions (username, channel, amount, tx_type, trigger_id, reason, related_user, metadata, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![key.username, key.channel, amount, tx_type, trigger, reason, related_user, metadata_str, now],
                )?;
                let new_balance: i64 = tx.query_row(
                    "SELECT balance FROM accounts WHERE username = ?1 AND channel = ?2",
                    params![key.username, key.channel],
                    |r| r.get(0),
                )?;
                tx.commit()?;
                Ok(new_balance)
            })
            .await
    }

    /// The critical primitive: `UPDATE ... WHERE balance >= amount`,
    /// inspecting the affected-row count in the same transaction. Zero
    /// rows affected means insufficient funds: the whole transaction rolls
    /// back (via drop) and `false` is returned with no transaction row
    /// inserted. Exactly one row affected commits the debit and the
    /// transaction row together.
    #[instrument(skip(self))]
    pub async fn atomic_debit(
        &self,
        key: &AccountKey,
        amount: i64,
        tx_type: &str,
        trigger: &str,
        reason: &str,
    ) -> Result<bool, LedgerError> {
        assert!(amount > 0, "debit amount must be positive");
        let key = key.clone();
        let tx_type = tx_type.to_string();
        let trigger = trigger.to_string();
        let reason = reason.to_string();
        self.store
            .with_conn(move |conn| {
                let mut conn = conn;
                let tx = conn.transaction()?;
                let now = Utc::now();
                let affected = tx.execute(
                    "UPDATE accounts SET balance = balance - ?1, lifetime_spent = lifetime_spent + ?1, last_active = ?2
                     WHERE username = ?3 AND channel = ?4 AND balance >= ?1",
                    params![amount, now, key.username, key.channel],
                )?;
                if affected == 0 {
                    // Rolled back implicitly on drop; no transaction row.
                    debug!(user = %key.username, channel = %key.channel, amount, "atomic_debit: insufficient funds");
                    return Ok(false);
                }
                tx.execute(
                    "INSERT INTO transactions (username, channel, amount, tx_type, trigger_id, reason, related_user, metadata, timestamp)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7)",
                    params![key.username, key.channel, -amount, tx_type, trigger, reason, now],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await
    }

    /// Resolves one gambling play atomically: debits `wager` (requires
    /// `balance >= wager`), crediting `payout` back in the same
    /// transaction if the play won. Both sides count against
    /// `lifetime_gambled` rather than `lifetime_spent`/`lifetime_earned`,
    /// since a gambling return isn't "spending" or "earning" (spec.md
    /// §4.4). Returns `false` with no effect if the wager can't be
    /// covered.
    pub async fn resolve_gamble(&self, key: &AccountKey, game: &str, wager: i64, payout: i64) -> Result<bool, LedgerError> {
        assert!(wager > 0, "wager must be positive");
        assert!(payout >= 0, "payout must not be negative");
        let key = key.clone();
        let game = game.to_string();
        self.store
            .with_conn(move |conn| {
                let mut conn = conn;
                let tx = conn.transaction()?;
                let now = Utc::now();
                let affected = tx.execute(
                    "UPDATE accounts SET balance = balance - ?1, lifetime_gambled = lifetime_gambled + ?1, last_active = ?2
                     WHERE username = ?3 AND channel = ?4 AND balance >= ?1",
                    params![wager, now, key.username, key.channel],
                )?;
                if affected == 0 {
                    return Ok(false);
                }
                tx.execute(
                    "INSERT INTO transactions (username, channel, amount, tx_type, trigger_id, reason, related_user, metadata, timestamp)
                     VALUES (?1, ?2, ?3, 'gamble', ?4, 'wager', NULL, NULL, ?5)",
                    params![key.username, key.channel, -wager, game, now],
                )?;
                if payout > 0 {
                    tx.execute(
                        "UPDATE accounts SET balance = balance + ?1 WHERE username = ?2 AND channel = ?3",
                        params![payout, key.username, key.channel],
                    )?;
                    tx.execute(
                        "INSERT INTO transactions (username, channel, amount, tx_type, trigger_id, reason, related_user, metadata, timestamp)
                         VALUES (?1, ?2, ?3, 'gamble', ?4, 'payout', NULL, NULL, ?5)",
                        params![key.username, key.channel, payout, game, now],
                    )?;
                }
                tx.commit()?;
                Ok(true)
            })
            .await
    }

    /// Batch-credits many `(user, channel, amount)` presence-tick rewards
    /// in one committed transaction, avoiding one round trip per session.
    /// Must remain atomic with the daily-activity minute/Z-earned update
    /// that the caller performs in the same call.
    #[instrument(skip(self, credits))]
    pub async fn batch_credit_presence(
        &self,
        credits: Vec<(AccountKey, i64, NaiveDate)>,
        trigger: &str,
    ) -> Result<(), LedgerError> {
        let trigger = trigger.to_string();
        self.store
            .with_conn(move |conn| {
                let mut conn = conn;
                let tx = conn.transaction()?;
                let now = Utc::now();
                for (key, amount, date) in &credits {
                    if *amount <= 0 {
                        continue;
                    }
                    tx.execute(
                        "INSERT INTO accounts (username, channel, balance, lifetime_earned, lifetime_spent, lifetime_gambled, rank_label, economy_banned, first_seen, last_seen, last_active)
                         VALUES (?1, ?2, 0, 0, 0, 0, 'newcomer', 0, ?3, ?3, ?3)
                         ON CONFLICT(username, channel) DO NOTHING",
                        params![key.username, key.channel, now],
                    )?;
                    tx.execute(
                        "UPDATE accounts SET balance = balance + ?1, lifetime_earned = lifetime_earned + ?1, last_active = ?2
                         WHERE username = ?3 AND channel = ?4",
                        params![amount, now, key.username, key.channel],
                    )?;
                    tx.execute(
                        "INSERT INTO transactions (username, channel, amount, tx_type, trigger_id, reason, related_user, metadata, timestamp)
                         VALUES (?1, ?2, ?3, 'earn', ?4, 'presence tick', NULL, NULL, ?5)",
                        params![key.username, key.channel, amount, trigger, now],
                    )?;
                    tx.execute(
                        "INSERT INTO daily_activity (username, channel, date, minutes_present, z_earned)
                         VALUES (?1, ?2, ?3, 1, ?4)
                         ON CONFLICT(username, channel, date) DO UPDATE SET
                            minutes_present = minutes_present + 1,
                            z_earned = z_earned + excluded.z_earned",
                        params![key.username, key.channel, date.to_string(), amount],
                    )?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    /// Upserts a daily-activity counter by `delta`. `field` must be one of
    /// the known counter column names; an unknown field is a programmer
    /// error and panics rather than silently no-op'ing.
    #[instrument(skip(self))]
    pub async fn increment_daily_activity(
        &self,
        key: &DailyKey,
        field: DailyActivityField,
        delta: i64,
    ) -> Result<(), LedgerError> {
        let key = key.clone();
        let column = field.column();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO daily_activity (username, channel, date, {column})
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(username, channel, date) DO UPDATE SET {column} = {column} + excluded.{column}"
                    ),
                    params![key.username, key.channel, key.date.to_string(), delta],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn mark_first_message_claimed(&self, key: &DailyKey) -> Result<bool, LedgerError> {
        self.set_daily_latch(key, "first_message_claimed").await
    }

    pub async fn mark_free_spin_used(&self, key: &DailyKey) -> Result<bool, LedgerError> {
        self.set_daily_latch(key, "free_spin_used").await
    }

    /// Sets a boolean latch column if not already set, returning `true` if
    /// this call was the one that set it (i.e. the caller should proceed),
    /// `false` if it was already set.
    async fn set_daily_latch(&self, key: &DailyKey, column: &str) -> Result<bool, LedgerError> {
        let key = key.clone();
        let column = column.to_string();
        self.store
            .with_conn(move |conn| {
                let mut conn = conn;
                let tx = conn.transaction()?;
                tx.execute(
                    &format!(
                        "INSERT INTO daily_activity (username, channel, date, {column})
                         VALUES (?1, ?2, ?3, 1)
                         ON CONFLICT(username, channel, date) DO NOTHING"
                    ),
                    params![key.username, key.channel, key.date.to_string()],
                )?;
                let affected = tx.execute(
                    &format!(
                        "UPDATE daily_activity SET {column} = 1
                         WHERE username = ?1 AND channel = ?2 AND date = ?3 AND {column} = 0"
                    ),
                    params![key.username, key.channel, key.date.to_string()],
                )?;
                tx.commit()?;
                Ok(affected == 1)
            })
            .await
    }

    pub async fn get_daily_activity(&self, key: &DailyKey) -> Result<DailyActivity, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT * FROM daily_activity WHERE username = ?1 AND channel = ?2 AND date = ?3",
                    params![key.username, key.channel, key.date.to_string()],
                    row_to_daily_activity,
                )
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(DailyActivity {
                        username: key.username.clone(),
                        channel: key.channel.clone(),
                        date: key.date,
                        ..Default::default()
                    }),
                    other => Err(other),
                })
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_trigger_cooldown(
        &self,
        key: &TriggerKey,
    ) -> Result<Option<TriggerCooldown>, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT * FROM trigger_cooldowns WHERE username = ?1 AND channel = ?2 AND trigger_id = ?3",
                    params![key.username, key.channel, key.trigger],
                    row_to_cooldown,
                )
                .optional()
            })
            .await
    }

    pub async fn set_trigger_cooldown(
        &self,
        key: &TriggerKey,
        count: u32,
        window_start: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO trigger_cooldowns (username, channel, trigger_id, count, window_start)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(username, channel, trigger_id) DO UPDATE SET count = excluded.count, window_start = excluded.window_start",
                    params![key.username, key.channel, key.trigger, count, window_start],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn increment_trigger_cooldown(&self, key: &TriggerKey) -> Result<(), LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE trigger_cooldowns SET count = count + 1 WHERE username = ?1 AND channel = ?2 AND trigger_id = ?3",
                    params![key.username, key.channel, key.trigger],
                )?;
                Ok(())
            })
            .await
    }

    /// Upsert `(+1 hit, +1 approx-unique-user, +amount)`. The unique-user
    /// count is documented as approximate (spec.md §9 open question): this
    /// always increments by 1 on every hit rather than tracking a distinct
    /// set, matching the committed-to-approximate resolution in DESIGN.md.
    #[instrument(skip(self))]
    pub async fn record_trigger_analytics(
        &self,
        key: &AnalyticsKey,
        amount_awarded: i64,
    ) -> Result<(), LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "INSERT INTO trigger_analytics (channel, trigger_id, date, hit_count, approx_unique_users, total_awarded)
                     VALUES (?1, ?2, ?3, 1, 1, ?4)
                     ON CONFLICT(channel, trigger_id, date) DO UPDATE SET
                        hit_count = hit_count + 1,
                        approx_unique_users = approx_unique_users + 1,
                        total_awarded = total_awarded + excluded.total_awarded",
                    params![key.channel, key.trigger, key.date.to_string(), amount_awarded],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn get_trigger_analytics(
        &self,
        key: &AnalyticsKey,
    ) -> Result<Option<TriggerAnalytics>, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT * FROM trigger_analytics WHERE channel = ?1 AND trigger_id = ?2 AND date = ?3",
                    params![key.channel, key.trigger, key.date.to_string()],
                    row_to_analytics,
                )
                .optional()
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn write_snapshot(&self, channel: &str) -> Result<EconomySnapshot, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut conn = conn;
                let tx = conn.transaction()?;
                let now = Utc::now();
                let total_circulation: i64 = tx.query_row(
                    "SELECT COALESCE(SUM(balance), 0) FROM accounts WHERE channel = ?1",
                    params![channel],
                    |r| r.get(0),
                )?;
                let total_accounts: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM accounts WHERE channel = ?1",
                    params![channel],
                    |r| r.get(0),
                )?;
                let balances: Vec<i64> = {
                    let mut stmt = tx.prepare(
                        "SELECT balance FROM accounts WHERE channel = ?1 ORDER BY balance",
                    )?;
                    let rows = stmt.query_map(params![channel], |r| r.get::<_, i64>(0))?;
                    rows.collect::<Result<_, _>>()?
                };
                let median_balance = median(&balances);
                let active_users: i64 = tx.query_row(
                    "SELECT COUNT(*) FROM accounts WHERE channel = ?1 AND last_active >= ?2",
                    params![channel, now - chrono::Duration::hours(24)],
                    |r| r.get(0),
                )?;
                tx.execute(
                    "INSERT INTO economy_snapshots (channel, taken_at, total_circulation, median_balance, active_users, total_accounts)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![channel, now, total_circulation, median_balance, active_users, total_accounts],
                )?;
                let id = tx.last_insert_rowid();
                tx.commit()?;
                Ok(EconomySnapshot {
                    id,
                    channel,
                    taken_at: now,
                    total_circulation,
                    median_balance,
                    active_users,
                    total_accounts,
                })
            })
            .await
    }

    pub async fn get_latest_snapshot(
        &self,
        channel: &str,
    ) -> Result<Option<EconomySnapshot>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT * FROM economy_snapshots WHERE channel = ?1 ORDER BY taken_at DESC LIMIT 1",
                    params![channel],
                    row_to_snapshot,
                )
                .optional()
            })
            .await
    }

    pub async fn get_snapshot_history(
        &self,
        channel: &str,
        days: i64,
    ) -> Result<Vec<EconomySnapshot>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let since = Utc::now() - chrono::Duration::days(days);
                let mut stmt = conn.prepare(
                    "SELECT * FROM economy_snapshots WHERE channel = ?1 AND taken_at >= ?2 ORDER BY taken_at ASC",
                )?;
                let rows = stmt.query_map(params![channel, since], row_to_snapshot)?;
                rows.collect()
            })
            .await
    }

    // ---- Aggregate / read-only queries. Failures here degrade to
    // empty/null results where semantically safe (spec.md §4.1 failure
    // semantics), so callers get `Result` but all-empty is itself a valid
    // (if uninteresting) answer rather than a crash.

    pub async fn total_circulation(&self, channel: &str) -> Result<i64, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT COALESCE(SUM(balance), 0) FROM accounts WHERE channel = ?1",
                    params![channel],
                    |r| r.get(0),
                )
            })
            .await
    }

    pub async fn median_balance(&self, channel: &str) -> Result<i64, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT balance FROM accounts WHERE channel = ?1 ORDER BY balance")?;
                let rows = stmt.query_map(params![channel], |r| r.get::<_, i64>(0))?;
                let balances: Vec<i64> = rows.collect::<Result<_, _>>()?;
                Ok(median(&balances))
            })
            .await
    }

    pub async fn top_by_balance(
        &self,
        channel: &str,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        self.top_by("balance", channel, limit).await
    }

    pub async fn top_by_lifetime_earned(
        &self,
        channel: &str,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        self.top_by("lifetime_earned", channel, limit).await
    }

    async fn top_by(
        &self,
        column: &str,
        channel: &str,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        let channel = channel.to_string();
        let column = column.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT username, {column} AS value FROM accounts WHERE channel = ?1 ORDER BY {column} DESC LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![channel, limit], |r| {
                    Ok(LeaderboardEntry {
                        username: r.get(0)?,
                        value: r.get(1)?,
                    })
                })?;
                rows.collect()
            })
            .await
    }

    /// Daily earners/spenders over a recent date range, derived from
    /// `daily_activity` rather than the transaction log (cheaper, and
    /// matches the "daily totals" aggregate named in spec.md §4.1).
    pub async fn top_earners_over_days(
        &self,
        channel: &str,
        days: i64,
        limit: i64,
    ) -> Result<Vec<LeaderboardEntry>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let since = (Utc::now() - chrono::Duration::days(days)).date_naive();
                let mut stmt = conn.prepare(
                    "SELECT username, SUM(z_earned) AS value FROM daily_activity
                     WHERE channel = ?1 AND date >= ?2
                     GROUP BY username ORDER BY value DESC LIMIT ?3",
                )?;
                let rows = stmt.query_map(params![channel, since.to_string(), limit], |r| {
                    Ok(LeaderboardEntry {
                        username: r.get(0)?,
                        value: r.get::<_, i64>(1)?,
                    })
                })?;
                rows.collect()
            })
            .await
    }

    pub async fn rank_distribution(&self, channel: &str) -> Result<Vec<RankRow>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT rank_label, COUNT(*) FROM accounts WHERE channel = ?1 GROUP BY rank_label",
                )?;
                let rows = stmt.query_map(params![channel], |r| {
                    Ok(RankRow {
                        rank_label: r.get(0)?,
                        count: r.get(1)?,
                    })
                })?;
                rows.collect()
            })
            .await
    }

    /// Usernames whose `daily_activity` row for `date` met the streak
    /// qualifying bar (spec.md §4.5 streak roll-over).
    pub async fn list_qualifying_users(
        &self,
        channel: &str,
        date: chrono::NaiveDate,
        min_minutes_present: i64,
    ) -> Result<Vec<String>, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT username FROM daily_activity
                     WHERE channel = ?1 AND date = ?2 AND minutes_present >= ?3",
                )?;
                let rows = stmt.query_map(params![channel, date.to_string(), min_minutes_present], |r| r.get(0))?;
                rows.collect()
            })
            .await
    }

    pub async fn active_economy_users_today(&self, channel: &str) -> Result<i64, LedgerError> {
        let channel = channel.to_string();
        self.store
            .with_conn(move |conn| {
                let today = Utc::now().date_naive();
                conn.query_row(
                    "SELECT COUNT(*) FROM daily_activity WHERE channel = ?1 AND date = ?2
                     AND (messages_sent > 0 OR minutes_present > 0)",
                    params![channel, today.to_string()],
                    |r| r.get(0),
                )
            })
            .await
    }

    pub async fn is_banned(&self, key: &AccountKey) -> Result<bool, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                conn.query_row(
                    "SELECT economy_banned FROM accounts WHERE username = ?1 AND channel = ?2",
                    params![key.username, key.channel],
                    |r| r.get::<_, i64>(0),
                )
                .optional()
                .map(|v| v.map(|b| b != 0).unwrap_or(false))
            })
            .await
    }

    pub async fn set_banned(&self, key: &AccountKey, banned: bool) -> Result<(), LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO accounts (username, channel, balance, lifetime_earned, lifetime_spent, lifetime_gambled, rank_label, economy_banned, first_seen, last_seen, last_active)
                     VALUES (?1, ?2, 0, 0, 0, 0, 'newcomer', ?3, ?4, ?4, ?4)
                     ON CONFLICT(username, channel) DO UPDATE SET economy_banned = excluded.economy_banned",
                    params![key.username, key.channel, banned as i64, now],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn set_rank_label(&self, key: &AccountKey, label: &str) -> Result<(), LedgerError> {
        let key = key.clone();
        let label = label.to_string();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE accounts SET rank_label = ?1 WHERE username = ?2 AND channel = ?3",
                    params![label, key.username, key.channel],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn set_balance(&self, key: &AccountKey, balance: i64) -> Result<(), LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                conn.execute(
                    "INSERT INTO accounts (username, channel, balance, lifetime_earned, lifetime_spent, lifetime_gambled, rank_label, economy_banned, first_seen, last_seen, last_active)
                     VALUES (?1, ?2, ?3, 0, 0, 0, 'newcomer', 0, ?4, ?4, ?4)
                     ON CONFLICT(username, channel) DO UPDATE SET balance = excluded.balance",
                    params![key.username, key.channel, balance, now],
                )?;
                Ok(())
            })
            .await
    }

    pub async fn set_cosmetic(
        &self,
        key: &AccountKey,
        field: CosmeticField,
        value: Option<String>,
    ) -> Result<(), LedgerError> {
        let key = key.clone();
        let column = field.column();
        self.store
            .with_conn(move |conn| {
                conn.execute(
                    &format!("UPDATE accounts SET {column} = ?1 WHERE username = ?2 AND channel = ?3"),
                    params![value, key.username, key.channel],
                )?;
                Ok(())
            })
            .await
    }

    /// Records a one-shot vanity purchase. Returns `true` if this call was
    /// the first purchase (caller should apply the effect), `false` if
    /// already purchased.
    pub async fn record_vanity_purchase(
        &self,
        key: &AccountKey,
        item_id: &str,
    ) -> Result<bool, LedgerError> {
        let key = key.clone();
        let item_id = item_id.to_string();
        self.store
            .with_conn(move |conn| {
                let now = Utc::now();
                let affected = conn.execute(
                    "INSERT INTO vanity_purchases (username, channel, item_id, purchased_at)
                     VALUES (?1, ?2, ?3, ?4) ON CONFLICT(username, channel, item_id) DO NOTHING",
                    params![key.username, key.channel, item_id, now],
                )?;
                Ok(affected == 1)
            })
            .await
    }

    pub async fn list_transactions(
        &self,
        key: &AccountKey,
        limit: i64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let key = key.clone();
        self.store
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT * FROM transactions WHERE username = ?1 AND channel = ?2 ORDER BY timestamp DESC LIMIT ?3",
                )?;
                let rows = stmt.query_map(params![key.username, key.channel, limit], row_to_transaction)?;
                rows.collect()
            })
            .await
    }

    /// Clamps any account with a negative balance back to zero. Ordinary
    /// `atomic_debit` calls never let balance go negative; this is a safety
    /// net against drift from direct `set_balance` admin writes or future
    /// bugs. Returns the number of accounts clamped.
    pub async fn clamp_negative_balances(&self) -> Result<u64, LedgerError> {
        self.store
            .with_conn(move |conn| {
                let affected = conn.execute("UPDATE accounts SET balance = 0 WHERE balance < 0", [])?;
                Ok(affected as u64)
            })
            .await
    }

    /// Deletes transactions older than `transaction_days` (if set) and
    /// snapshots older than `snapshot_days`. Returns `(transactions_deleted,
    /// snapshots_deleted)`.
    pub async fn prune_old_data(&self, transaction_days: Option<i64>, snapshot_days: i64) -> Result<(u64, u64), LedgerError> {
        self.store
            .with_conn(move |conn| {
                let mut transactions_deleted = 0u64;
                if let Some(days) = transaction_days {
                    let cutoff = Utc::now() - chrono::Duration::days(days);
                    transactions_deleted =
                        conn.execute("DELETE FROM transactions WHERE timestamp < ?1", params![cutoff])? as u64;
                }
                let snapshot_cutoff = Utc::now() - chrono::Duration::days(snapshot_days);
                let snapshots_deleted =
                    conn.execute("DELETE FROM economy_snapshots WHERE taken_at < ?1", params![snapshot_cutoff])? as u64;
                Ok((transactions_deleted, snapshots_deleted))
            })
            .await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyActivityField {
    MinutesPresent,
    MinutesActive,
    MessagesSent,
    LongMessages,
    GifsSent,
    UniqueEmotes,
    KudosGiven,
    KudosReceived,
    LaughsReceived,
    BotInteractions,
    ZEarned,
    ZSpent,
    ZGambled,
}

impl DailyActivityField {
    fn column(self) -> &'static str {
        match self {
            DailyActivityField::MinutesPresent => "minutes_present",
            DailyActivityField::MinutesActive => "minutes_active",
            DailyActivityField::MessagesSent => "messages_sent",
            DailyActivityField::LongMessages => "long_messages",
            DailyActivityField::GifsSent => "gifs_sent",
            DailyActivityField::UniqueEmotes => "unique_emotes",
            DailyActivityField::KudosGiven => "kudos_given",
            DailyActivityField::KudosReceived => "kudos_received",
            DailyActivityField::LaughsReceived => "laughs_received",
            DailyActivityField::BotInteractions => "bot_interactions",
            DailyActivityField::ZEarned => "z_earned",
            DailyActivityField::ZSpent => "z_spent",
            DailyActivityField::ZGambled => "z_gambled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CosmeticField {
    ChatColor,
    CustomGreeting,
    CurrencyName,
}

impl CosmeticField {
    fn column(self) -> &'static str {
        match self {
            CosmeticField::ChatColor => "chat_color",
            CosmeticField::CustomGreeting => "custom_greeting",
            CosmeticField::CurrencyName => "currency_name",
        }
    }
}

fn median(sorted_ascending: &[i64]) -> i64 {
    if sorted_ascending.is_empty() {
        return 0;
    }
    let mid = sorted_ascending.len() / 2;
    if sorted_ascending.len() % 2 == 0 {
        (sorted_ascending[mid - 1] + sorted_ascending[mid]) / 2
    } else {
        sorted_ascending[mid]
    }
}

fn row_to_daily_activity(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailyActivity> {
    Ok(DailyActivity {
        username: row.get("username")?,
        channel: row.get("channel")?,
        date: row.get::<_, String>("date")?.parse().unwrap_or_default(),
        minutes_present: row.get("minutes_present")?,
        minutes_active: row.get("minutes_active")?,
        messages_sent: row.get("messages_sent")?,
        long_messages: row.get("long_messages")?,
        gifs_sent: row.get("gifs_sent")?,
        unique_emotes: row.get("unique_emotes")?,
        kudos_given: row.get("kudos_given")?,
        kudos_received: row.get("kudos_received")?,
        laughs_received: row.get("laughs_received")?,
        bot_interactions: row.get("bot_interactions")?,
        z_earned: row.get("z_earned")?,
        z_spent: row.get("z_spent")?,
        z_gambled: row.get("z_gambled")?,
        first_message_claimed: row.get::<_, i64>("first_message_claimed")? != 0,
        free_spin_used: row.get::<_, i64>("free_spin_used")? != 0,
    })
}

fn row_to_cooldown(row: &rusqlite::Row<'_>) -> rusqlite::Result<TriggerCooldown> {
    Ok(TriggerCooldown {
        username: row.get("username")?,
        channel: row.get("channel")?,
        trigger: row.get("trigger_id")?,
        count: row.get::<_, i64>("count")? as u32,
        window_start: row.get("window_start")?,
    })
}

fn row_to_analytics(row: &rusqlite::Row<'_>) -> rusqlite::Result<TriggerAnalytics> {
    Ok(TriggerAnalytics {
        channel: row.get("channel")?,
        trigger: row.get("trigger_id")?,
        date: row.get::<_, String>("date")?.parse().unwrap_or_default(),
        hit_count: row.get("hit_count")?,
        approx_unique_users: row.get("approx_unique_users")?,
        total_awarded: row.get("total_awarded")?,
    })
}

fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<EconomySnapshot> {
    Ok(EconomySnapshot {
        id: row.get("id")?,
        channel: row.get("channel")?,
        taken_at: row.get("taken_at")?,
        total_circulation: row.get("total_circulation")?,
        median_balance: row.get("median_balance")?,
        active_users: row.get("active_users")?,
        total_accounts: row.get("total_accounts")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    async fn test_ledger() -> Ledger {
        let store = Store::open(":memory:", 5000, 1).unwrap();
        Ledger::new(Arc::new(store))
    }

    #[tokio::test]
    async fn credit_creates_account_and_logs_transaction() {
        let ledger = test_ledger().await;
        let key = AccountKey::new("alice", "c1");
        let balance = ledger
            .credit(&key, 100, "welcome_wallet", "onboarding.welcome", "welcome", None, None)
            .await
            .unwrap();
        assert_eq!(balance, 100);
        let account = ledger.get_account(&key).await.unwrap().unwrap();
        assert_eq!(account.balance, 100);
        assert_eq!(account.lifetime_earned, 100);
        let txs = ledger.list_transactions(&key, 10).await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, 100);
    }

    #[tokio::test]
    async fn atomic_debit_refuses_when_insufficient_and_leaves_no_transaction() {
        let ledger = test_ledger().await;
        let key = AccountKey::new("alice", "c1");
        ledger
            .credit(&key, 50, "earn", "presence.base", "tick", None, None)
            .await
            .unwrap();
        let ok = ledger
            .atomic_debit(&key, 100, "spend.queue", "spend.queue", "queue media")
            .await
            .unwrap();
        assert!(!ok);
        let account = ledger.get_account(&key).await.unwrap().unwrap();
        assert_eq!(account.balance, 50, "balance must be unchanged on refusal");
        let txs = ledger.list_transactions(&key, 10).await.unwrap();
        assert_eq!(txs.len(), 1, "no transaction row for a failed debit");
    }

    #[tokio::test]
    async fn atomic_debit_never_drives_balance_negative_under_concurrency() {
        let ledger = test_ledger().await;
        let key = AccountKey::new("alice", "c1");
        ledger
            .credit(&key, 100, "earn", "presence.base", "tick", None, None)
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..10 {
            let ledger = ledger.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                ledger
                    .atomic_debit(&key, 20, "spend.queue", "spend.queue", "queue media")
                    .await
                    .unwrap()
            }));
        }
        let mut accepted = 0;
        for h in handles {
            if h.await.unwrap() {
                accepted += 1;
            }
        }
        assert_eq!(accepted, 5, "exactly enough debits to exhaust the balance are accepted");
        let account = ledger.get_account(&key).await.unwrap().unwrap();
        assert_eq!(account.balance, 0);
        assert!(account.balance >= 0);
        let txs = ledger.list_transactions(&key, 100).await.unwrap();
        let debit_count = txs.iter().filter(|t| t.amount == -20).count();
        assert_eq!(debit_count, 5, "one transaction row per accepted debit");
    }

    #[tokio::test]
    async fn daily_latch_fires_only_once() {
        let ledger = test_ledger().await;
        let key = DailyKey::new("alice", "c1", Utc::now().date_naive());
        assert!(ledger.mark_first_message_claimed(&key).await.unwrap());
        assert!(!ledger.mark_first_message_claimed(&key).await.unwrap());
    }

    #[tokio::test]
    async fn banned_flag_round_trips() {
        let ledger = test_ledger().await;
        let key = AccountKey::new("alice", "c1");
        assert!(!ledger.is_banned(&key).await.unwrap());
        ledger.set_banned(&key, true).await.unwrap();
        assert!(ledger.is_banned(&key).await.unwrap());
    }
}
