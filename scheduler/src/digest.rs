//! Admin and user digests (spec.md §4.5): assemble summary text from
//! aggregate ledger queries and PM it out on a schedule. The admin digest
//! goes to connected users whose known rank meets `admin.owner_level`; the
//! user digest goes to everyone currently connected.

use economy_core::collaborator::PmSender;
use economy_core::config::ConfigHandle;
use economy_core::keys::AccountKey;
use economy_ledger::Ledger;
use economy_presence::PresenceTracker;
use std::sync::Arc;
use tracing::{instrument, warn};

use crate::clock;

pub struct DigestTask {
    config: ConfigHandle,
    ledger: Ledger,
    presence: Arc<PresenceTracker>,
    pm: Arc<dyn PmSender>,
}

impl DigestTask {
    pub fn new(config: ConfigHandle, ledger: Ledger, presence: Arc<PresenceTracker>, pm: Arc<dyn PmSender>) -> Self {
        Self { config, ledger, presence, pm }
    }

    pub async fn run_admin(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            let digest = self.config.current().digest.clone();
            tokio::select! {
                _ = clock::sleep_until_weekday_hour_utc(digest.admin_digest_weekday_utc, digest.admin_digest_hour_utc) => {
                    if let Err(error) = self.send_admin_digest().await {
                        warn!(%error, "admin digest failed");
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

    pub async fn run_user(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        loop {
            let hour = self.config.current().digest.user_digest_hour_utc;
            tokio::select! {
                _ = clock::sleep_until_hour_utc(hour) => {
                    if let Err(error) = self.send_user_digest().await {
                        warn!(%error, "user digest failed");
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
    async fn send_admin_digest(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();
        if !config.digest.admin_digest_enabled {
            return Ok(());
        }
        for channel in &config.channels {
            let circulation = self.ledger.total_circulation(channel).await?;
            let median = self.ledger.median_balance(channel).await?;
            let active_today = self.ledger.active_economy_users_today(channel).await?;
            let text = format!(
                "weekly digest for {channel}: circulation={circulation} median_balance={median} active_today={active_today}"
            );

            for user in self.presence.connected_users(channel) {
                if self.presence.known_rank(channel, &user).unwrap_or(0) >= config.admin.owner_level {
                    if let Err(error) = self.pm.send_pm(channel, &user, &text).await {
                        warn!(%error, %user, "admin digest pm failed");
                    }
                }
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn send_user_digest(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();
        if !config.digest.user_digest_enabled {
            return Ok(());
        }
        for channel in &config.channels {
            for user in self.presence.connected_users(channel) {
                let key = AccountKey::new(user.clone(), channel.clone());
                let Some(account) = self.ledger.get_account(&key).await? else {
                    continue;
                };
                let text = format!(
                    "your balance is {} (lifetime earned {})",
                    account.balance, account.lifetime_earned
                );
                if let Err(error) = self.pm.send_pm(channel, &user, &text).await {
                    warn!(%error, %user, "user digest pm failed");
                }
            }
        }
        Ok(())
    }
}
