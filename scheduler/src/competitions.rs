//! Daily competitions (spec.md §4.5): evaluated once a day at
//! `evaluate_hour_utc`, each competition is either a threshold (everyone
//! who earned at least `threshold` today gets `reward`) or a single winner
//! (the top earner gets `reward`, or a percentage of what they earned).

use chrono::Utc;
use economy_core::config::ConfigHandle;
use economy_core::keys::AccountKey;
use economy_ledger::Ledger;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{instrument, warn};

use crate::clock;
use economy_announce::Announcer;

pub struct CompetitionsTask {
    config: ConfigHandle,
    ledger: Ledger,
    announcer: Announcer,
    last_evaluated: Mutex<HashMap<String, chrono::NaiveDate>>,
}

impl CompetitionsTask {
    pub fn new(config: ConfigHandle, ledger: Ledger, announcer: Announcer) -> Self {
        Self { config, ledger, announcer, last_evaluated: Mutex::new(HashMap::new()) }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            let hour = self.config.current().daily_competitions.evaluate_hour_utc;
            tokio::select! {
                _ = clock::sleep_until_hour_utc(hour) => {
                    if let Err(error) = self.evaluate().await {
                        warn!(%error, "competition evaluation failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    #[instrument(skip(self))]
    async fn evaluate(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();
        if !config.daily_competitions.enabled {
            return Ok(());
        }
        let today = Utc::now().date_naive();

        for channel in &config.channels {
            {
                let mut last = self.last_evaluated.lock();
                if last.get(channel) == Some(&today) {
                    continue;
                }
                last.insert(channel.clone(), today);
            }

            for competition in &config.daily_competitions.competitions {
                match competition.condition_type.as_str() {
                    "daily_threshold" => {
                        let earners = self.ledger.top_earners_over_days(channel, 0, i64::MAX).await?;
                        for entry in earners.iter().filter(|e| e.value >= competition.threshold) {
                            self.reward_winner(channel, &entry.username, competition.reward).await?;
                        }
                    }
                    "daily_top" => {
                        let top = self.ledger.top_earners_over_days(channel, 0, 1).await?;
                        if let Some(winner) = top.into_iter().next() {
                            let reward = match competition.percentage_of_earnings {
                                Some(pct) => ((winner.value as f64) * pct).round() as i64,
                                None => competition.reward,
                            };
                            self.reward_winner(channel, &winner.username, reward).await?;
                        }
                    }
                    other => {
                        warn!(condition_type = other, id = %competition.id, "unknown competition condition_type");
                    }
                }
            }
        }
        Ok(())
    }

    async fn reward_winner(&self, channel: &str, username: &str, reward: i64) -> Result<(), economy_ledger::LedgerError> {
        if reward <= 0 {
            return Ok(());
        }
        let key = AccountKey::new(username.to_string(), channel.to_string());
        self.ledger
            .credit(&key, reward, "earn", "competition", "daily competition reward", None, None)
            .await?;
        self.announcer.announce(
            channel,
            "competition_winner",
            HashMap::from([("username".to_string(), username.to_string()), ("reward".to_string(), reward.to_string())]),
        );
        Ok(())
    }
}
