#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]

//! # economy-scheduler
//!
//! The background tasks named in spec.md §4.5: the presence tick, streak
//! roll-over, rain, cron-scheduled multiplier windows, bounty expiry,
//! daily competitions, periodic snapshots, and the admin/user digests.
//! Each runs as its own long-lived `tokio` task rather than spawning
//! per-event (spec.md §5's "coroutine-heavy scheduling" guidance), and
//! every sleep is restart-robust (see [`clock`]).

pub mod bounties;
pub mod clock;
pub mod competitions;
pub mod cron_events;
pub mod digest;
pub mod error;
pub mod gambling_sweep;
pub mod presence_tick;
pub mod rain;
pub mod retention;
pub mod snapshots;
pub mod streaks;

use std::sync::Arc;

use economy_announce::Announcer;
use economy_core::collaborator::PmSender;
use economy_core::config::ConfigHandle;
use economy_core::shutdown::AsyncShutdown;
use economy_earning::MultiplierEngine;
use economy_ledger::{BountyRepo, ChallengeRepo, Ledger, StreakRepo};
use economy_presence::PresenceTracker;
use economy_spend::{BountyEngine, ChallengeEngine, HeistEngine};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub use error::SchedulerError;

/// Everything the scheduler needs to construct its tasks that doesn't
/// already live behind a trait object.
pub struct SchedulerDeps {
    pub config: ConfigHandle,
    pub ledger: Ledger,
    pub presence: Arc<PresenceTracker>,
    pub multiplier: Arc<MultiplierEngine>,
    pub streaks: StreakRepo,
    pub bounty_repo: BountyRepo,
    pub challenge_repo: ChallengeRepo,
    pub announcer: Announcer,
    pub pm: Arc<dyn PmSender>,
}

/// Owns the `JoinHandle`s for every scheduler task and the shutdown signal
/// that drains them.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler").field("tasks", &self.handles.len()).finish()
    }
}

impl Scheduler {
    pub fn spawn(deps: SchedulerDeps) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::new();

        let presence_tick = presence_tick::PresenceTickTask::new(
            deps.config.clone(),
            deps.ledger.clone(),
            deps.presence.clone(),
            deps.multiplier.clone(),
            deps.streaks.clone(),
        );
        handles.push(tokio::spawn(presence_tick.run(shutdown_rx.clone())));

        let streak_rollover = streaks::StreakRolloverTask::new(deps.config.clone(), deps.ledger.clone(), deps.streaks.clone());
        handles.push(tokio::spawn(streak_rollover.run(shutdown_rx.clone())));

        let rain_task = rain::RainTask::new(
            deps.config.clone(),
            deps.ledger.clone(),
            deps.presence.clone(),
            deps.pm.clone(),
            deps.announcer.clone(),
        );
        handles.push(tokio::spawn(rain_task.run(shutdown_rx.clone())));

        let cron_events = cron_events::CronEventsTask::new(deps.config.clone(), deps.multiplier.clone(), deps.announcer.clone());
        handles.push(tokio::spawn(cron_events.run(shutdown_rx.clone())));

        let bounty_engine = BountyEngine::new(deps.ledger.clone(), deps.bounty_repo.clone());
        let bounty_task = bounties::BountyExpiryTask::new(deps.config.clone(), bounty_engine);
        handles.push(tokio::spawn(bounty_task.run(shutdown_rx.clone())));

        let competitions = competitions::CompetitionsTask::new(deps.config.clone(), deps.ledger.clone(), deps.announcer.clone());
        handles.push(tokio::spawn(competitions.run(shutdown_rx.clone())));

        let snapshots = snapshots::SnapshotTask::new(deps.config.clone(), deps.ledger.clone());
        handles.push(tokio::spawn(snapshots.run(shutdown_rx.clone())));

        let challenge_engine = ChallengeEngine::new(deps.ledger.clone(), deps.challenge_repo.clone());
        let heist_engine = Arc::new(HeistEngine::new(deps.ledger.clone()));
        let gambling_sweep = gambling_sweep::GamblingSweepTask::new(deps.config.clone(), challenge_engine, heist_engine, deps.announcer.clone());
        handles.push(tokio::spawn(gambling_sweep.run(shutdown_rx.clone())));

        let retention = retention::RetentionTask::new(deps.config.clone(), deps.ledger.clone());
        handles.push(tokio::spawn(retention.run(shutdown_rx.clone())));

        let digest = Arc::new(digest::DigestTask::new(deps.config.clone(), deps.ledger.clone(), deps.presence.clone(), deps.pm.clone()));
        handles.push(tokio::spawn(digest.clone().run_admin(shutdown_rx.clone())));
        handles.push(tokio::spawn(digest.run_user(shutdown_rx)));

        Self { shutdown_tx, handles }
    }
}

impl AsyncShutdown for Scheduler {
    type Result = ();

    async fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}
