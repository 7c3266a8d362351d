//! Bundles every cross-crate dependency a command handler needs. One
//! struct so handlers take `&DispatchContext` instead of six separate
//! arguments.

use std::sync::Arc;

use economy_announce::Announcer;
use economy_broker::{BrokerClient, MediaCatalogClient};
use economy_core::collaborator::PmSender;
use economy_core::config::ConfigHandle;
use economy_earning::MultiplierEngine;
use economy_ledger::{ApprovalRepo, BountyRepo, ChallengeRepo, GamblingStatsRepo, Ledger, ProgressionRepo, StreakRepo, TipRepo};
use economy_presence::PresenceTracker;
use economy_spend::{ApprovalEngine, BountyEngine, ChallengeEngine, HeistEngine, QueueEngine, TipEngine, VanityEngine};

#[derive(Clone)]
pub struct DispatchContext {
    pub config: ConfigHandle,
    pub ledger: Ledger,
    pub presence: Arc<PresenceTracker>,
    pub multiplier: Arc<MultiplierEngine>,
    pub progression: ProgressionRepo,
    pub gambling_stats: GamblingStatsRepo,
    pub streaks: StreakRepo,
    pub tip_repo: TipRepo,
    pub bounty_repo: BountyRepo,
    pub challenge_repo: ChallengeRepo,
    pub approval_repo: ApprovalRepo,
    pub queue: Arc<QueueEngine>,
    pub tip: Arc<TipEngine>,
    pub vanity: Arc<VanityEngine>,
    pub approval: Arc<ApprovalEngine>,
    pub bounty: Arc<BountyEngine>,
    pub challenge: Arc<ChallengeEngine>,
    pub heist: Arc<HeistEngine>,
    pub announcer: Announcer,
    pub pm: Arc<dyn PmSender>,
    pub broker: Arc<BrokerClient>,
    pub media: Arc<MediaCatalogClient>,
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext").finish_non_exhaustive()
    }
}
