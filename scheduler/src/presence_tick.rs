//! The presence tick (spec.md §4.5): every 60s, credit one minute of
//! presence (plus night-watch bonus) to every connected session, apply the
//! multiplier stack, batch-commit through the ledger, and award
//! hourly-milestone bonuses (1h/3h/6h/12h/24h of cumulative minutes today).

use chrono::{DateTime, Timelike, Utc};
use economy_core::config::ConfigHandle;
use economy_core::keys::AccountKey;
use economy_earning::MultiplierEngine;
use economy_ledger::{Ledger, StreakRepo};
use economy_presence::PresenceTracker;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

const HOURLY_MILESTONES_MINUTES: [i64; 5] = [60, 180, 360, 720, 1440];

pub struct PresenceTickTask {
    config: ConfigHandle,
    ledger: Ledger,
    presence: Arc<PresenceTracker>,
    multiplier: Arc<MultiplierEngine>,
    streaks: StreakRepo,
}

impl PresenceTickTask {
    pub fn new(config: ConfigHandle, ledger: Ledger, presence: Arc<PresenceTracker>, multiplier: Arc<MultiplierEngine>, streaks: StreakRepo) -> Self {
        Self { config, ledger, presence, multiplier, streaks }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.tick(Utc::now()).await {
                        warn!(%error, "presence tick failed");
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
    async fn tick(&self, now: DateTime<Utc>) -> Result<(), economy_ledger::LedgerError> {
        let presence_config = &self.config.current().presence;
        let ticked = self.presence.tick(now);
        if ticked.is_empty() {
            return Ok(());
        }

        let mut credits = Vec::with_capacity(ticked.len());
        let mut milestones: Vec<(AccountKey, i64)> = Vec::new();

        for (key, cumulative_minutes) in &ticked {
            let population = self.presence.population(&key.channel);
            let mut base = presence_config.base_rate_per_minute;
            if presence_config.night_watch_hours.contains(&now.hour()) {
                base += presence_config.night_watch_bonus;
            }
            let (amount, _sources) = self.multiplier.apply(base, &key.channel, population, now);
            credits.push((key.clone(), amount, now.date_naive()));

            if HOURLY_MILESTONES_MINUTES.contains(cumulative_minutes) {
                milestones.push((key.clone(), cumulative_minutes / 60));
            }
        }

        self.ledger.batch_credit_presence(credits, "presence.tick").await?;

        for (key, hours) in milestones {
            let newly_crossed = self.streaks.mark_milestone(&key.username, &key.channel, now.date_naive(), hours).await?;
            if newly_crossed && presence_config.hourly_milestone_bonus > 0 {
                self.ledger
                    .credit(&key, presence_config.hourly_milestone_bonus, "earn", "presence.hourly_milestone", "hourly presence milestone", None, None)
                    .await?;
            }
        }
        Ok(())
    }
}
