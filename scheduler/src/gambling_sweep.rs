//! Gambling cleanup sweep (spec.md §4.4): every 30 seconds, expire stale
//! challenge invitations (refunding the initiator) and resolve any heist
//! whose join window has closed.

use chrono::Utc;
use economy_announce::Announcer;
use economy_core::config::ConfigHandle;
use economy_spend::{ChallengeEngine, HeistEngine};
use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

pub struct GamblingSweepTask {
    config: ConfigHandle,
    challenge: ChallengeEngine,
    heist: Arc<HeistEngine>,
    announcer: Announcer,
}

impl GamblingSweepTask {
    pub fn new(config: ConfigHandle, challenge: ChallengeEngine, heist: Arc<HeistEngine>, announcer: Announcer) -> Self {
        Self { config, challenge, heist, announcer }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.sweep().await {
                        warn!(%error, "gambling sweep failed");
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
        let now = Utc::now();

        let expired = self.challenge.expire_stale(now).await?;
        if expired > 0 {
            tracing::info!(expired, "expired stale challenges refunded");
        }

        if !config.gambling.heist.enabled {
            return Ok(());
        }
        for channel in &config.channels {
            if self.heist.is_ready_to_resolve(&config.gambling.heist, channel, now) {
                let result = self.heist.resolve(&config.gambling.heist, channel).await?;
                self.announcer.announce(
                    channel,
                    if result.success { "heist_success" } else { "heist_failure" },
                    [("participants".to_string(), result.payouts.len().to_string())].into(),
                );
            }
        }
        Ok(())
    }
}
