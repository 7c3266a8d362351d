//! Cron-scheduled multiplier windows (spec.md §4.3, §4.5): every minute,
//! check each configured `scheduled` entry's cron expression against the
//! current minute boundary; on a match, activate the scheduled multiplier
//! slot for `duration_minutes` and announce it.

use chrono::{Timelike, Utc};
use economy_core::config::ConfigHandle;
use economy_core::cron;
use economy_earning::MultiplierEngine;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use economy_announce::Announcer;

pub struct CronEventsTask {
    config: ConfigHandle,
    multiplier: Arc<MultiplierEngine>,
    announcer: Announcer,
}

impl CronEventsTask {
    pub fn new(config: ConfigHandle, multiplier: Arc<MultiplierEngine>, announcer: Announcer) -> Self {
        Self { config, multiplier, announcer }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.check_all();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    fn check_all(&self) {
        let config = self.config.current();
        let now = Utc::now();
        let minute = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);

        for entry in &config.multipliers.scheduled {
            let fires_now = match cron::previous_fire(&entry.cron, now) {
                Some(fire) => fire == minute,
                None => {
                    warn!(cron = %entry.cron, id = %entry.id, "invalid scheduled multiplier cron");
                    continue;
                }
            };
            if !fires_now {
                continue;
            }

            let expires_at = now + chrono::Duration::minutes(entry.duration_minutes);
            for channel in &config.channels {
                self.multiplier.activate_scheduled(channel, entry.id.clone(), entry.multiplier, expires_at);
                self.announcer.announce(
                    channel,
                    "scheduled_multiplier",
                    std::collections::HashMap::from([
                        ("id".to_string(), entry.id.clone()),
                        ("multiplier".to_string(), entry.multiplier.to_string()),
                        ("duration_minutes".to_string(), entry.duration_minutes.to_string()),
                    ]),
                );
            }
        }
    }
}
