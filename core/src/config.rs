//! Configuration tree and hot-reload support.
//!
//! [`EconomyConfig`] mirrors every top-level section named in the external
//! interfaces section of the spec. It is deserialized from YAML after
//! `${VAR}` / `${VAR:-default}` environment expansion (`expand_env`) and
//! validated (`validate`) before being placed behind the hot-reloadable
//! [`ConfigHandle`].

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("io error: {0}")]
    Io(String),
}

/// Expand `${VAR}` and `${VAR:-default}` occurrences in `input` using the
/// process environment. Unknown variables with no default expand to the
/// empty string, matching common shell-style semantics.
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            if let Some(close) = input[i + 2..].find('}') {
                let inner = &input[i + 2..i + 2 + close];
                let (name, default) = match inner.find(":-") {
                    Some(idx) => (&inner[..idx], Some(&inner[idx + 2..])),
                    None => (inner, None),
                };
                let value = std::env::var(name).ok();
                match (value, default) {
                    (Some(v), _) => out.push_str(&v),
                    (None, Some(d)) => out.push_str(d),
                    (None, None) => {}
                }
                i += 2 + close + 1;
                continue;
            }
        }
        out.push(bytes[i] as char);
        i += 1;
    }
    out
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NatsConfig {
    pub url: String,
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_subject_prefix() -> String {
    "economy".to_string()
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default)]
    pub request_reply_subject: Option<String>,
}

fn default_log_format() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_pool_size() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_name")]
    pub name: String,
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,
}

fn default_currency_name() -> String {
    "Z".to_string()
}
fn default_currency_symbol() -> String {
    "Z".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OnboardingConfig {
    #[serde(default)]
    pub welcome_wallet: i64,
    #[serde(default)]
    pub custom_greeting_enabled: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PresenceConfig {
    #[serde(default = "default_join_debounce_minutes")]
    pub join_debounce_minutes: i64,
    #[serde(default = "default_greeting_absence_minutes")]
    pub greeting_absence_minutes: i64,
    #[serde(default = "default_base_rate")]
    pub base_rate_per_minute: i64,
    #[serde(default)]
    pub night_watch_hours: HashSet<u32>,
    #[serde(default)]
    pub night_watch_bonus: i64,
    #[serde(default = "default_min_presence_minutes")]
    pub min_presence_minutes_for_streak: i64,
    /// Bonus credited when a session's cumulative minutes-present-today
    /// crosses one of the 1h/3h/6h/12h/24h thresholds.
    #[serde(default)]
    pub hourly_milestone_bonus: i64,
}

fn default_join_debounce_minutes() -> i64 {
    5
}
fn default_greeting_absence_minutes() -> i64 {
    30
}
fn default_base_rate() -> i64 {
    1
}
fn default_min_presence_minutes() -> i64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreaksConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub daily_bonus: i64,
    #[serde(default)]
    pub milestone_7_bonus: i64,
    #[serde(default)]
    pub milestone_30_bonus: i64,
}

/// Shared shape for the chat/content/social trigger catalogs — each entry
/// names one trigger from the catalog in spec.md §4.3.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TriggerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub reward: f64,
    #[serde(default)]
    pub max_per_window: u32,
    #[serde(default)]
    pub window_seconds: i64,
    #[serde(default)]
    pub min_chars: usize,
    #[serde(default)]
    pub params: HashMap<String, serde_json::Value>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reward: 0.0,
            max_per_window: u32::MAX,
            window_seconds: 3600,
            min_chars: 0,
            params: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatTriggersConfig {
    #[serde(default)]
    pub long_message: TriggerConfig,
    #[serde(default)]
    pub first_message_of_day: TriggerConfig,
    #[serde(default)]
    pub conversation_starter: TriggerConfig,
    #[serde(default)]
    pub laugh_received: TriggerConfig,
    #[serde(default)]
    pub kudos_received: TriggerConfig,
    #[serde(default = "default_true")]
    pub kudos_self_excluded: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentTriggersConfig {
    #[serde(default)]
    pub first_after_media_change: TriggerConfig,
    #[serde(default)]
    pub comment_during_media: TriggerConfig,
    #[serde(default)]
    pub like_current: TriggerConfig,
    #[serde(default)]
    pub survived_full_media: TriggerConfig,
    #[serde(default)]
    pub min_presence_percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SocialTriggersConfig {
    #[serde(default)]
    pub greeted_newcomer: TriggerConfig,
    #[serde(default)]
    pub mentioned_by_other: TriggerConfig,
    #[serde(default)]
    pub bot_interaction: TriggerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AchievementDef {
    pub id: String,
    pub name: String,
    pub condition_type: String,
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub reward: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompetitionDef {
    pub id: String,
    #[serde(default = "default_competition_kind")]
    pub condition_type: String, // "daily_threshold" | "daily_top"
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub reward: i64,
    #[serde(default)]
    pub percentage_of_earnings: Option<f64>,
}

fn default_competition_kind() -> String {
    "daily_top".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DailyCompetitionsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_eval_hour")]
    pub evaluate_hour_utc: u32,
    #[serde(default)]
    pub competitions: Vec<CompetitionDef>,
}

fn default_eval_hour() -> u32 {
    0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduledMultiplierDef {
    pub id: String,
    pub cron: String,
    pub duration_minutes: i64,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MultipliersConfig {
    #[serde(default)]
    pub off_peak_hours: HashSet<u32>,
    #[serde(default)]
    pub off_peak_multiplier: f64,
    #[serde(default)]
    pub population_thresholds: Vec<(u32, f64)>,
    #[serde(default)]
    pub holiday_multiplier: f64,
    #[serde(default)]
    pub holiday_dates: Vec<String>,
    #[serde(default)]
    pub scheduled: Vec<ScheduledMultiplierDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RainConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rain_mean")]
    pub mean_interval_seconds: i64,
    #[serde(default)]
    pub min_amount: i64,
    #[serde(default)]
    pub max_amount: i64,
}

fn default_rain_mean() -> i64 {
    3600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpendingTierConfig {
    pub id: String,
    pub cost: i64,
    #[serde(default)]
    pub min_rank: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SpendingConfig {
    #[serde(default)]
    pub queue_tiers: Vec<SpendingTierConfig>,
    #[serde(default)]
    pub spend_discount_per_rank: f64,
    #[serde(default)]
    pub blackout_crons: Vec<BlackoutWindow>,
    #[serde(default)]
    pub min_account_age_seconds: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlackoutWindow {
    pub cron: String,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediaCmsConfig {
    pub base_url: String,
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VanityItemDef {
    pub id: String,
    pub kind: String, // "chat_color" | "greeting" | "currency_name"
    pub cost: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VanityShopConfig {
    #[serde(default)]
    pub items: Vec<VanityItemDef>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RankTier {
    pub label: String,
    pub min_lifetime_earned: i64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub extra_queue_slots: u32,
    #[serde(default)]
    pub rain_bonus_percent: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RanksConfig {
    #[serde(default)]
    pub tiers: Vec<RankTier>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CytubePromotionConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub owner_level: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotSymbol {
    pub symbols: String,
    pub multiplier: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SlotConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub entries: Vec<SlotSymbol>,
    #[serde(default)]
    pub announce_threshold: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CoinFlipConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub win_probability: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChallengeConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub rake_percent: f64,
    #[serde(default = "default_challenge_timeout")]
    pub timeout_seconds: i64,
}

fn default_challenge_timeout() -> i64 {
    120
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HeistConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub join_window_seconds: i64,
    #[serde(default)]
    pub payout_multiplier: f64,
    #[serde(default)]
    pub success_probability: f64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GamblingConfig {
    #[serde(default)]
    pub slot: SlotConfig,
    #[serde(default)]
    pub coin_flip: CoinFlipConfig,
    #[serde(default)]
    pub challenge: ChallengeConfig,
    #[serde(default)]
    pub heist: HeistConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TippingConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_amount: i64,
    #[serde(default)]
    pub max_amount: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BalanceMaintenanceConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default)]
    pub transaction_days: Option<i64>,
    #[serde(default)]
    pub snapshot_days: i64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnnouncementsConfig {
    #[serde(default)]
    pub templates: HashMap<String, String>,
    #[serde(default = "default_dedup_window")]
    pub dedup_window_seconds: i64,
    #[serde(default = "default_batch_delay")]
    pub batch_delay_ms: i64,
    #[serde(default = "default_rate_per_minute")]
    pub rate_per_minute: u32,
}

fn default_dedup_window() -> i64 {
    300
}
fn default_batch_delay() -> i64 {
    2_000
}
fn default_rate_per_minute() -> u32 {
    20
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub owner_level: i64,
    #[serde(default)]
    pub commands: HashSet<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

fn default_metrics_port() -> u16 {
    28286
}
fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub admin_digest_enabled: bool,
    #[serde(default)]
    pub admin_digest_weekday_utc: u32,
    #[serde(default)]
    pub admin_digest_hour_utc: u32,
    #[serde(default)]
    pub user_digest_enabled: bool,
    #[serde(default)]
    pub user_digest_hour_utc: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BountiesConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub expiry_refund_percent: f64,
    #[serde(default)]
    pub default_expiry_hours: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EconomyConfig {
    pub nats: NatsConfig,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    pub bot: BotConfig,
    #[serde(default)]
    pub ignored_users: HashSet<String>,
    #[serde(default)]
    pub onboarding: OnboardingConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub streaks: StreaksConfig,
    #[serde(default)]
    pub chat_triggers: ChatTriggersConfig,
    #[serde(default)]
    pub content_triggers: ContentTriggersConfig,
    #[serde(default)]
    pub social_triggers: SocialTriggersConfig,
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
    #[serde(default)]
    pub daily_competitions: DailyCompetitionsConfig,
    #[serde(default)]
    pub multipliers: MultipliersConfig,
    #[serde(default)]
    pub rain: RainConfig,
    #[serde(default)]
    pub spending: SpendingConfig,
    #[serde(default)]
    pub mediacms: Option<MediaCmsConfig>,
    #[serde(default)]
    pub vanity_shop: VanityShopConfig,
    #[serde(default)]
    pub ranks: RanksConfig,
    #[serde(default)]
    pub cytube_promotion: CytubePromotionConfig,
    #[serde(default)]
    pub gambling: GamblingConfig,
    #[serde(default)]
    pub tipping: TippingConfig,
    #[serde(default)]
    pub balance_maintenance: BalanceMaintenanceConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub announcements: AnnouncementsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub bounties: BountiesConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            request_reply_subject: None,
        }
    }
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            welcome_wallet: 0,
            custom_greeting_enabled: false,
        }
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            join_debounce_minutes: default_join_debounce_minutes(),
            greeting_absence_minutes: default_greeting_absence_minutes(),
            base_rate_per_minute: default_base_rate(),
            night_watch_hours: HashSet::new(),
            night_watch_bonus: 0,
            min_presence_minutes_for_streak: default_min_presence_minutes(),
            hourly_milestone_bonus: 0,
        }
    }
}

impl Default for StreaksConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            daily_bonus: 0,
            milestone_7_bonus: 0,
            milestone_30_bonus: 0,
        }
    }
}

impl Default for RainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mean_interval_seconds: default_rain_mean(),
            min_amount: 0,
            max_amount: 0,
        }
    }
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            name: default_currency_name(),
            symbol: default_currency_symbol(),
        }
    }
}

impl EconomyConfig {
    /// Parse YAML text after environment expansion.
    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env(raw);
        let cfg: EconomyConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a file path, expanding env vars and validating.
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_yaml_str(&raw)
    }

    /// Enforce cross-field invariants that serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.is_empty() {
            return Err(ConfigError::Validation("database.path is empty".into()));
        }
        if self.gambling.slot.enabled {
            let sum: f64 = self.gambling.slot.entries.iter().map(|e| e.probability).sum();
            if sum > 1.0 + 1e-9 {
                return Err(ConfigError::Validation(format!(
                    "gambling.slot probabilities sum to {sum} > 1.0"
                )));
            }
        }
        if self.gambling.coin_flip.enabled
            && !(0.0..1.0).contains(&self.gambling.coin_flip.win_probability)
        {
            return Err(ConfigError::Validation(
                "gambling.coin_flip.win_probability must be in [0, 1)".into(),
            ));
        }
        if self.bounties.expiry_refund_percent < 0.0 || self.bounties.expiry_refund_percent > 100.0
        {
            return Err(ConfigError::Validation(
                "bounties.expiry_refund_percent must be within [0, 100]".into(),
            ));
        }
        for tier in &self.spending.queue_tiers {
            if tier.cost < 0 {
                return Err(ConfigError::Validation(format!(
                    "spending tier {} has negative cost",
                    tier.id
                )));
            }
        }
        Ok(())
    }
}

/// Hot-reloadable handle to the active config. Reads take a lock-free clone
/// of the `Arc`; writes (reload) swap the pointer under a short-held write
/// lock, matching the "lock-free snapshot semantics" pattern used elsewhere
/// in the service for the multiplier engine's slots.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<parking_lot::RwLock<Arc<EconomyConfig>>>,
}

impl ConfigHandle {
    pub fn new(initial: EconomyConfig) -> Self {
        Self {
            inner: Arc::new(parking_lot::RwLock::new(Arc::new(initial))),
        }
    }

    pub fn current(&self) -> Arc<EconomyConfig> {
        self.inner.read().clone()
    }

    /// Atomically swap in a new config. Returns the previous config on
    /// success so callers can diff against it if needed.
    pub fn swap(&self, new_config: EconomyConfig) -> Arc<EconomyConfig> {
        let new_arc = Arc::new(new_config);
        let mut guard = self.inner.write();
        std::mem::replace(&mut *guard, new_arc)
    }
}

/// Implemented by every component that caches derived config state, called
/// under the config swap during a `reload` command.
pub trait OnConfigUpdate {
    fn on_config_update(&self, new_config: &EconomyConfig);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_substitutes_and_defaults() {
        std::env::set_var("ECONOMY_TEST_VAR", "hello");
        assert_eq!(expand_env("value: ${ECONOMY_TEST_VAR}"), "value: hello");
        assert_eq!(
            expand_env("value: ${ECONOMY_TEST_MISSING:-fallback}"),
            "value: fallback"
        );
        assert_eq!(expand_env("value: ${ECONOMY_TEST_MISSING_NO_DEFAULT}"), "value: ");
    }

    #[test]
    fn validate_rejects_slot_probability_over_one() {
        let mut cfg = minimal_config();
        cfg.gambling.slot.enabled = true;
        cfg.gambling.slot.entries = vec![
            SlotSymbol {
                symbols: "777".into(),
                multiplier: 10.0,
                probability: 0.6,
            },
            SlotSymbol {
                symbols: "bar".into(),
                multiplier: 2.0,
                probability: 0.6,
            },
        ];
        assert!(cfg.validate().is_err());
    }

    fn minimal_config() -> EconomyConfig {
        EconomyConfig {
            nats: NatsConfig {
                url: "nats://localhost:4222".into(),
                subject_prefix: "economy".into(),
                request_timeout_ms: 10_000,
            },
            channels: vec!["c1".into()],
            service: ServiceConfig::default(),
            database: DatabaseConfig {
                path: ":memory:".into(),
                busy_timeout_ms: 5000,
                pool_size: 4,
            },
            currency: CurrencyConfig::default(),
            bot: BotConfig {
                username: "bot".into(),
            },
            ignored_users: HashSet::new(),
            onboarding: OnboardingConfig::default(),
            presence: PresenceConfig::default(),
            streaks: StreaksConfig::default(),
            chat_triggers: ChatTriggersConfig::default(),
            content_triggers: ContentTriggersConfig::default(),
            social_triggers: SocialTriggersConfig::default(),
            achievements: vec![],
            daily_competitions: DailyCompetitionsConfig {
                enabled: false,
                evaluate_hour_utc: 0,
                competitions: vec![],
            },
            multipliers: MultipliersConfig::default(),
            rain: RainConfig::default(),
            spending: SpendingConfig::default(),
            mediacms: None,
            vanity_shop: VanityShopConfig::default(),
            ranks: RanksConfig::default(),
            cytube_promotion: CytubePromotionConfig::default(),
            gambling: GamblingConfig::default(),
            tipping: TippingConfig::default(),
            balance_maintenance: BalanceMaintenanceConfig::default(),
            retention: RetentionConfig::default(),
            announcements: AnnouncementsConfig::default(),
            admin: AdminConfig::default(),
            metrics: MetricsConfig::default(),
            digest: DigestConfig::default(),
            bounties: BountiesConfig::default(),
        }
    }
}
