//! Periodic economy snapshots (spec.md §4.5, §7): every 6 hours, write a
//! circulation/participation snapshot per channel for the admin digest and
//! the `economy.snapshot` request/reply handler to read back from.

use economy_core::config::ConfigHandle;
use economy_ledger::Ledger;
use std::time::Duration;
use tracing::{instrument, warn};

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(6 * 3600);

pub struct SnapshotTask {
    config: ConfigHandle,
    ledger: Ledger,
}

impl SnapshotTask {
    pub fn new(config: ConfigHandle, ledger: Ledger) -> Self {
        Self { config, ledger }
    }

    pub async fn run(self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(SNAPSHOT_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(error) = self.write_all().await {
                        warn!(%error, "snapshot write failed");
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
    async fn write_all(&self) -> Result<(), economy_ledger::LedgerError> {
        let config = self.config.current();
        for channel in &config.channels {
            self.ledger.write_snapshot(channel).await?;
        }
        Ok(())
    }
}
