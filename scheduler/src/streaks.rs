//! Daily streak roll-over (spec.md §4.5): once a day, shortly after
//! midnight UTC, walk yesterday's qualifying users per channel and extend
//! or restart their streak, awarding the daily bonus plus the 7/30-day
//! milestone bonuses on the days they land.

use chrono::Utc;
use economy_core::config::ConfigHandle;
use economy_ledger::{Ledger, StreakRepo};
use tracing::{instrument, warn};

use crate::clock;

pub struct StreakRolloverTask {
    config: ConfigHandle,
    ledger: Ledger,
    streaks: StreakRepo,
}

impl StreakRolloverTask {
    pub fn new(config: ConfigHandle, ledger: Ledger, streaks: StreakRepo) -> Self {
        Self { config, ledger, streaks }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            tokio::select! {
                _ = clock::sleep_until_hour_utc(0) => {
                    if let Err(error) = self.roll_over().await {
                        warn!(%error, "streak roll-over failed");
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
    async fn roll_over(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();
        if !config.streaks.enabled {
            return Ok(());
        }
        let yesterday = (Utc::now() - chrono::Duration::days(1)).date_naive();
        let day_before = yesterday - chrono::Duration::days(1);

        for channel in &config.channels {
            let qualifying = self
                .ledger
                .list_qualifying_users(channel, yesterday, config.presence.min_presence_minutes_for_streak)
                .await?;

            for username in qualifying {
                let previous = self.streaks.get(&username, channel).await?;
                let continued = previous.last_qualifying_date == Some(day_before);
                let new_streak = self.streaks.extend(&username, channel, yesterday, continued).await?;

                let key = economy_core::keys::AccountKey::new(username.clone(), channel.clone());
                if config.streaks.daily_bonus > 0 {
                    self.ledger
                        .credit(&key, config.streaks.daily_bonus, "earn", "streak.daily", "daily streak bonus", None, None)
                        .await?;
                }
                if new_streak == 7 && config.streaks.milestone_7_bonus > 0 {
                    self.ledger
                        .credit(&key, config.streaks.milestone_7_bonus, "earn", "streak.milestone_7", "7-day streak milestone", None, None)
                        .await?;
                } else if new_streak == 30 && config.streaks.milestone_30_bonus > 0 {
                    self.ledger
                        .credit(&key, config.streaks.milestone_30_bonus, "earn", "streak.milestone_30", "30-day streak milestone", None, None)
                        .await?;
                }
            }
        }
        Ok(())
    }
}
