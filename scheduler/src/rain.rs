//! "Make it rain" (spec.md §4.5): at a randomized interval around
//! `mean_interval_seconds`, split a random amount between everyone
//! currently connected to a channel, PM each recipient their share, and
//! post a public announcement.

use economy_core::collaborator::PmSender;
use economy_core::config::ConfigHandle;
use economy_core::keys::AccountKey;
use economy_ledger::Ledger;
use economy_presence::PresenceTracker;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

use economy_announce::Announcer;

pub struct RainTask {
    config: ConfigHandle,
    ledger: Ledger,
    presence: Arc<PresenceTracker>,
    pm: Arc<dyn PmSender>,
    announcer: Announcer,
}

impl RainTask {
    pub fn new(config: ConfigHandle, ledger: Ledger, presence: Arc<PresenceTracker>, pm: Arc<dyn PmSender>, announcer: Announcer) -> Self {
        Self { config, ledger, presence, pm, announcer }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            let mean_seconds = self.config.current().rain.mean_interval_seconds.max(1) as f64;
            let jitter = rand::rng().random_range(-0.3..=0.3);
            let wait = Duration::from_secs_f64((mean_seconds * (1.0 + jitter)).max(1.0));

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    if let Err(error) = self.rain_once().await {
                        warn!(%error, "rain tick failed");
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
    async fn rain_once(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();
        if !config.rain.enabled {
            return Ok(());
        }

        for channel in &config.channels {
            let recipients = self.presence.connected_users(channel);
            if recipients.is_empty() {
                continue;
            }

            let total = rand::rng().random_range(config.rain.min_amount..=config.rain.max_amount.max(config.rain.min_amount));
            let share = total / recipients.len() as i64;
            if share <= 0 {
                continue;
            }

            for username in &recipients {
                let key = AccountKey::new(username.clone(), channel.clone());
                self.ledger
                    .credit(&key, share, "earn", "rain", "channel rain", None, None)
                    .await?;

                if let Err(error) = self.pm.send_pm(channel, username, &format!("it's raining! you received {share}")).await {
                    warn!(%error, %username, "rain pm failed");
                }
            }

            self.announcer.announce(
                channel,
                "rain",
                std::collections::HashMap::from([
                    ("amount".to_string(), total.to_string()),
                    ("recipients".to_string(), recipients.len().to_string()),
                ]),
            );
        }
        Ok(())
    }
}
