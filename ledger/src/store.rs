//! Storage substrate: a single SQLite file, write-ahead logging, a
//! configurable busy timeout, and a connection-per-operation discipline
//! serialized through a bounded `r2d2` pool (spec.md §4.1). All tables
//! named in spec.md §6's persistence layout are migrated here at startup
//! with idempotent `CREATE TABLE IF NOT EXISTS` / `CREATE INDEX IF NOT
//! EXISTS` statements, even the ones owned by other subsystems — this
//! keeps a single source of schema truth for the one database file.

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;

use crate::error::LedgerError;

pub type Pool = r2d2::Pool<SqliteConnectionManager>;

#[derive(Debug, Clone)]
pub struct Store {
    pub pool: Pool,
}

impl Store {
    pub fn open(path: &str, busy_timeout_ms: u64, pool_size: usize) -> Result<Self, LedgerError> {
        let manager = SqliteConnectionManager::file(path).with_init(move |conn| {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
            conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
            Ok(())
        });
        let pool = r2d2::Pool::builder()
            .max_size(pool_size as u32)
            .build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), LedgerError> {
        let conn = self.pool.get()?;
        run_migrations(&conn)?;
        Ok(())
    }

    /// Run a blocking closure against a pooled connection on the blocking
    /// thread pool, so async callers never block the executor on SQLite
    /// I/O.
    pub async fn with_conn<F, R>(&self, f: F) -> Result<R, LedgerError>
    where
        F: FnOnce(&Connection) -> Result<R, rusqlite::Error> + Send + 'static,
        R: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            f(&conn).map_err(LedgerError::from)
        })
        .await?
    }
}

pub fn run_migrations(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0,
            lifetime_earned INTEGER NOT NULL DEFAULT 0,
            lifetime_spent INTEGER NOT NULL DEFAULT 0,
            lifetime_gambled INTEGER NOT NULL DEFAULT 0,
            rank_label TEXT NOT NULL DEFAULT 'newcomer',
            economy_banned INTEGER NOT NULL DEFAULT 0,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            last_active TEXT NOT NULL,
            chat_color TEXT,
            custom_greeting TEXT,
            currency_name TEXT,
            PRIMARY KEY (username, channel),
            CHECK (balance >= 0)
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            amount INTEGER NOT NULL,
            tx_type TEXT NOT NULL,
            trigger_id TEXT NOT NULL,
            reason TEXT NOT NULL,
            related_user TEXT,
            metadata TEXT,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_transactions_account
            ON transactions (username, channel, timestamp);

        CREATE TABLE IF NOT EXISTS daily_activity (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            date TEXT NOT NULL,
            minutes_present INTEGER NOT NULL DEFAULT 0,
            minutes_active INTEGER NOT NULL DEFAULT 0,
            messages_sent INTEGER NOT NULL DEFAULT 0,
            long_messages INTEGER NOT NULL DEFAULT 0,
            gifs_sent INTEGER NOT NULL DEFAULT 0,
            unique_emotes INTEGER NOT NULL DEFAULT 0,
            kudos_given INTEGER NOT NULL DEFAULT 0,
            kudos_received INTEGER NOT NULL DEFAULT 0,
            laughs_received INTEGER NOT NULL DEFAULT 0,
            bot_interactions INTEGER NOT NULL DEFAULT 0,
            z_earned INTEGER NOT NULL DEFAULT 0,
            z_spent INTEGER NOT NULL DEFAULT 0,
            z_gambled INTEGER NOT NULL DEFAULT 0,
            first_message_claimed INTEGER NOT NULL DEFAULT 0,
            free_spin_used INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (username, channel, date)
        );

        CREATE TABLE IF NOT EXISTS trigger_cooldowns (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            trigger_id TEXT NOT NULL,
            count INTEGER NOT NULL DEFAULT 0,
            window_start TEXT NOT NULL,
            PRIMARY KEY (username, channel, trigger_id)
        );

        CREATE TABLE IF NOT EXISTS trigger_analytics (
            channel TEXT NOT NULL,
            trigger_id TEXT NOT NULL,
            date TEXT NOT NULL,
            hit_count INTEGER NOT NULL DEFAULT 0,
            approx_unique_users INTEGER NOT NULL DEFAULT 0,
            total_awarded INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (channel, trigger_id, date)
        );

        CREATE TABLE IF NOT EXISTS economy_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel TEXT NOT NULL,
            taken_at TEXT NOT NULL,
            total_circulation INTEGER NOT NULL,
            median_balance INTEGER NOT NULL,
            active_users INTEGER NOT NULL,
            total_accounts INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_snapshots_channel ON economy_snapshots (channel, taken_at);

        CREATE TABLE IF NOT EXISTS vanity_purchases (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            item_id TEXT NOT NULL,
            purchased_at TEXT NOT NULL,
            PRIMARY KEY (username, channel, item_id)
        );

        CREATE TABLE IF NOT EXISTS streaks (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            current_streak INTEGER NOT NULL DEFAULT 0,
            longest_streak INTEGER NOT NULL DEFAULT 0,
            last_qualifying_date TEXT,
            PRIMARY KEY (username, channel)
        );

        CREATE TABLE IF NOT EXISTS hourly_milestones (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            date TEXT NOT NULL,
            milestone_hours INTEGER NOT NULL,
            PRIMARY KEY (username, channel, date, milestone_hours)
        );

        CREATE TABLE IF NOT EXISTS achievements (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            achievement_id TEXT NOT NULL,
            earned_at TEXT NOT NULL,
            PRIMARY KEY (username, channel, achievement_id)
        );

        CREATE TABLE IF NOT EXISTS pending_approvals (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            kind TEXT NOT NULL,
            cost INTEGER NOT NULL,
            payload TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            resolved_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_pending_approvals_status ON pending_approvals (channel, status);

        CREATE TABLE IF NOT EXISTS bounties (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel TEXT NOT NULL,
            creator TEXT NOT NULL,
            amount INTEGER NOT NULL,
            description TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open',
            claimant TEXT,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            resolved_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_bounties_status ON bounties (channel, status, expires_at);

        CREATE TABLE IF NOT EXISTS gambling_stats (
            username TEXT NOT NULL,
            channel TEXT NOT NULL,
            game TEXT NOT NULL,
            plays INTEGER NOT NULL DEFAULT 0,
            wagered INTEGER NOT NULL DEFAULT 0,
            won INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (username, channel, game)
        );

        CREATE TABLE IF NOT EXISTS tip_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel TEXT NOT NULL,
            sender TEXT NOT NULL,
            recipient TEXT NOT NULL,
            amount INTEGER NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS pending_challenges (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            channel TEXT NOT NULL,
            initiator TEXT NOT NULL,
            target TEXT NOT NULL,
            wager INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            resolved_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_challenges_status ON pending_challenges (channel, status, expires_at);
        "#,
    )
}
