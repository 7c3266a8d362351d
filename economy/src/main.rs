//! The Z-Economy service entry point: loads config, opens storage, wires
//! every subsystem crate together, and runs until a shutdown signal.

mod router;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use economy_announce::Announcer;
use economy_broker::{BrokerClient, MediaCatalogClient, Metrics, NullEventSource, NullTransport};
use economy_core::collaborator::{ChatSender, PmSender};
use economy_core::config::{ConfigHandle, EconomyConfig};
use economy_core::events::EconomyEvent;
use economy_core::ignored::IgnoredUsers;
use economy_core::logging;
use economy_core::shutdown::{AsyncShutdown, Shutdown as ShutdownSignal};
use economy_dispatch::{Dispatcher, DispatchContext, ReloadTargets};
use economy_earning::{EarningEngine, MultiplierEngine};
use economy_ledger::{ApprovalRepo, BountyRepo, ChallengeRepo, GamblingStatsRepo, Ledger, ProgressionRepo, Store, StreakRepo, TipRepo};
use economy_presence::PresenceTracker;
use economy_scheduler::{Scheduler, SchedulerDeps};
use economy_spend::{ApprovalEngine, BountyEngine, ChallengeEngine, HeistEngine, QueueEngine, TipEngine, VanityEngine};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "economy", about = "Channel-engagement currency service")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, default_value = "economy.yaml")]
    config: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match EconomyConfig::load_from_path(&cli.config) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("config error: {error}");
            return ExitCode::from(1);
        }
    };

    logging::init_from_format(&config.service.log_format);

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("failed to start async runtime: {error}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::from(0),
        Err(code) => ExitCode::from(code),
    }
}

async fn run(config: EconomyConfig) -> Result<(), u8> {
    let store = Store::open(&config.database.path, config.database.busy_timeout_ms, config.database.pool_size)
        .map(Arc::new)
        .map_err(|error| {
            error!(%error, "failed to open storage");
            2
        })?;

    let ledger = Ledger::new(store.clone());
    let approval_repo = ApprovalRepo::new(store.clone());
    let bounty_repo = BountyRepo::new(store.clone());
    let challenge_repo = ChallengeRepo::new(store.clone());
    let gambling_stats = GamblingStatsRepo::new(store.clone());
    let progression = ProgressionRepo::new(store.clone());
    let streaks = StreakRepo::new(store.clone());
    let tip_repo = TipRepo::new(store.clone());

    let config_handle = ConfigHandle::new(config);
    let current = config_handle.current();

    let ignored = IgnoredUsers::new(current.ignored_users.iter().cloned());
    let presence = Arc::new(PresenceTracker::new(ledger.clone(), ignored, current.presence.join_debounce_minutes));
    let multiplier = Arc::new(MultiplierEngine::new(current.multipliers.clone()));
    let earning = Arc::new(EarningEngine::new(ledger.clone(), presence.clone(), config_handle.clone(), multiplier.clone()));

    let transport: Arc<dyn economy_broker::Transport> = Arc::new(NullTransport);
    let broker = Arc::new(BrokerClient::new(transport, &current.nats));
    let pm: Arc<dyn PmSender> = broker.clone();
    let chat: Arc<dyn ChatSender> = broker.clone();

    let media = Arc::new(match &current.mediacms {
        Some(mediacms) => MediaCatalogClient::new(mediacms.base_url.clone(), Duration::from_millis(mediacms.timeout_ms)).map_err(|error| {
            error!(%error, "failed to construct media catalog client");
            2
        })?,
        None => MediaCatalogClient::new("http://localhost", Duration::from_secs(10)).map_err(|_| 2u8)?,
    });

    let metrics = Arc::new(Metrics::new());
    let metrics_handle = economy_broker::metrics::spawn(metrics.clone(), &current.metrics);

    let (announcer, announcer_handle) = Announcer::spawn(config_handle.clone(), chat.clone());

    let queue = Arc::new(QueueEngine::new(ledger.clone(), broker.clone()));
    let tip = Arc::new(TipEngine::new(ledger.clone(), tip_repo.clone()));
    let vanity = Arc::new(VanityEngine::new(ledger.clone()));
    let approval = Arc::new(ApprovalEngine::new(ledger.clone(), approval_repo.clone(), broker.clone()));
    let bounty = Arc::new(BountyEngine::new(ledger.clone(), bounty_repo.clone()));
    let challenge = Arc::new(ChallengeEngine::new(ledger.clone(), challenge_repo.clone()));
    let heist = Arc::new(HeistEngine::new(ledger.clone()));

    let dispatch_ctx = DispatchContext {
        config: config_handle.clone(),
        ledger: ledger.clone(),
        presence: presence.clone(),
        multiplier: multiplier.clone(),
        progression: progression.clone(),
        gambling_stats: gambling_stats.clone(),
        streaks: streaks.clone(),
        tip_repo: tip_repo.clone(),
        bounty_repo: bounty_repo.clone(),
        challenge_repo: challenge_repo.clone(),
        approval_repo: approval_repo.clone(),
        queue,
        tip,
        vanity,
        approval,
        bounty,
        challenge,
        heist,
        announcer: announcer.clone(),
        pm: pm.clone(),
        broker: broker.clone(),
        media,
    };
    let reload_targets = ReloadTargets {
        config: config_handle.clone(),
        earning: earning.clone(),
        multiplier: multiplier.clone(),
        presence: presence.clone(),
    };
    let dispatcher = Arc::new(Dispatcher::new(dispatch_ctx, reload_targets));

    let mut scheduler = Scheduler::spawn(SchedulerDeps {
        config: config_handle.clone(),
        ledger: ledger.clone(),
        presence: presence.clone(),
        multiplier: multiplier.clone(),
        streaks: streaks.clone(),
        bounty_repo: bounty_repo.clone(),
        challenge_repo: challenge_repo.clone(),
        announcer: announcer.clone(),
        pm: pm.clone(),
    });

    let event_source: Arc<dyn economy_broker::EventSource> = Arc::new(NullEventSource);
    let mut inbound = event_source.subscribe().await;

    let router_deps = router::RouterDeps {
        config: config_handle.clone(),
        ledger: ledger.clone(),
        presence: presence.clone(),
        earning: earning.clone(),
        dispatcher: dispatcher.clone(),
        announcer: announcer.clone(),
        pm: pm.clone(),
        metrics: metrics.clone(),
    };

    let (merged_tx, merged_rx) = tokio::sync::mpsc::unbounded_channel();
    let forward_tx = merged_tx.clone();
    let forward_handle = tokio::spawn(async move {
        while let Some(event) = inbound.recv().await {
            if forward_tx.send(event).is_err() {
                break;
            }
        }
    });

    let router_handle = tokio::spawn(router::run(router_deps, merged_rx));

    info!("economy service started");
    if let Err(error) = tokio::signal::ctrl_c().await {
        error!(%error, "failed to install ctrl-c handler");
    }
    info!("shutdown signal received, draining");

    let _ = merged_tx.send(EconomyEvent::Shutdown(ShutdownSignal));
    let _ = router_handle.await;
    forward_handle.abort();

    scheduler.shutdown().await;
    drop(announcer);
    let _ = announcer_handle.await;
    metrics_handle.abort();

    Ok(())
}
