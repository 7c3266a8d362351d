//! Data retention and balance maintenance (spec.md §6 `retention`,
//! `balance_maintenance` config sections). Runs once every 6 hours: prunes
//! old transactions/snapshots per the configured windows, and, if enabled,
//! clamps any account balance that drifted negative back to zero.

use economy_core::config::ConfigHandle;
use economy_ledger::Ledger;
use std::time::Duration;
use tracing::{instrument, warn};

pub struct RetentionTask {
    config: ConfigHandle,
    ledger: Ledger,
}

impl RetentionTask {
    pub fn new(config: ConfigHandle, ledger: Ledger) -> Self {
        Self { config, ledger }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(6 * 60 * 60));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.sweep().await {
                        warn!(%error, "retention sweep failed");
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
    async fn sweep(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();

        let (transactions_deleted, snapshots_deleted) = self
            .ledger
            .prune_old_data(config.retention.transaction_days, config.retention.snapshot_days)
            .await?;
        if transactions_deleted > 0 || snapshots_deleted > 0 {
            tracing::info!(transactions_deleted, snapshots_deleted, "retention sweep pruned old rows");
        }

        if config.balance_maintenance.enabled {
            let clamped = self.ledger.clamp_negative_balances().await?;
            if clamped > 0 {
                tracing::warn!(clamped, "balance maintenance clamped negative balances to zero");
            }
        }

        Ok(())
    }
}
