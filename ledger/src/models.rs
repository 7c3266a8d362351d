//! Row types for the tables the ledger exclusively owns (spec.md §3):
//! `Account`, `Transaction`, `DailyActivity`, `TriggerCooldown`,
//! `TriggerAnalytics`, `EconomySnapshot`, plus the banned-user and
//! vanity-purchase side tables that hang directly off `Account`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Account {
    pub username: String,
    pub channel: String,
    pub balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
    pub lifetime_gambled: i64,
    pub rank_label: String,
    pub economy_banned: bool,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
    pub chat_color: Option<String>,
    pub custom_greeting: Option<String>,
    pub currency_name: Option<String>,
}

impl Account {
    pub fn new(username: &str, channel: &str, now: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            channel: channel.to_string(),
            balance: 0,
            lifetime_earned: 0,
            lifetime_spent: 0,
            lifetime_gambled: 0,
            rank_label: "newcomer".to_string(),
            economy_banned: false,
            first_seen: now,
            last_seen: now,
            last_active: now,
            chat_color: None,
            custom_greeting: None,
            currency_name: None,
        }
    }
}

/// Signed ledger entry. Positive `amount` is a credit, negative is a debit.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Transaction {
    pub id: i64,
    pub username: String,
    pub channel: String,
    pub amount: i64,
    pub tx_type: String,
    pub trigger: String,
    pub reason: String,
    pub related_user: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DailyActivity {
    pub username: String,
    pub channel: String,
    pub date: NaiveDate,
    pub minutes_present: i64,
    pub minutes_active: i64,
    pub messages_sent: i64,
    pub long_messages: i64,
    pub gifs_sent: i64,
    pub unique_emotes: i64,
    pub kudos_given: i64,
    pub kudos_received: i64,
    pub laughs_received: i64,
    pub bot_interactions: i64,
    pub z_earned: i64,
    pub z_spent: i64,
    pub z_gambled: i64,
    pub first_message_claimed: bool,
    pub free_spin_used: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TriggerCooldown {
    pub username: String,
    pub channel: String,
    pub trigger: String,
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TriggerAnalytics {
    pub channel: String,
    pub trigger: String,
    pub date: NaiveDate,
    pub hit_count: i64,
    pub approx_unique_users: i64,
    pub total_awarded: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EconomySnapshot {
    pub id: i64,
    pub channel: String,
    pub taken_at: DateTime<Utc>,
    pub total_circulation: i64,
    pub median_balance: i64,
    pub active_users: i64,
    pub total_accounts: i64,
}

/// One row per (username, channel, vanity_item_id) purchase — enforces the
/// "one award per (user, item)" semantics for one-shot vanity cosmetics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VanityPurchase {
    pub username: String,
    pub channel: String,
    pub item_id: String,
    pub purchased_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RankRow {
    pub rank_label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub value: i64,
}
