//! Bounty expiry sweep (spec.md §4.4): once an hour, refund and close out
//! any bounty past its `expires_at` in every configured channel.

use chrono::Utc;
use economy_core::config::ConfigHandle;
use economy_spend::BountyEngine;
use std::time::Duration;
use tracing::{instrument, warn};

pub struct BountyExpiryTask {
    config: ConfigHandle,
    bounties: BountyEngine,
}

impl BountyExpiryTask {
    pub fn new(config: ConfigHandle, bounties: BountyEngine) -> Self {
        Self { config, bounties }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.sweep().await {
                        warn!(%error, "bounty expiry sweep failed");
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
    async fn sweep(&self) -> Result<(), economy_spend::SpendError> {
        let config = self.config.current();
        if !config.bounties.enabled {
            return Ok(());
        }
        let now = Utc::now();
        for channel in &config.channels {
            let expired = self.bounties.expire_due(&config.bounties, channel, now).await?;
            if expired > 0 {
                tracing::info!(channel, expired, "expired bounties refunded");
            }
        }
        Ok(())
    }
}
