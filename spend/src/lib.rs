#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]

//! # economy-spend
//!
//! Everything that debits a balance (spec.md §4.4): the queue, tipping,
//! the vanity shop, admin-gated approvals, bounties, and the gambling
//! catalog (slot, coin flip, challenge duels, the cooperative heist).
//! Every spend goes through the shared pipeline in [`pipeline`]: account
//! exists and isn't banned, type-specific precondition, rank discount
//! where relevant, an atomic debit, then a side effect that refunds on
//! failure.

pub mod approval;
pub mod bounty;
pub mod challenge;
pub mod error;
pub mod gambling;
pub mod heist;
pub mod pipeline;
pub mod queue;
pub mod tip;
pub mod vanity;

pub use approval::ApprovalEngine;
pub use bounty::BountyEngine;
pub use challenge::{ChallengeEngine, DuelResolution};
pub use error::SpendError;
pub use gambling::{flip_coin, draw_slot, slot_house_edge, validate_slot_config, CoinFlipOutcome, SlotOutcome};
pub use heist::{HeistEngine, HeistResult};
pub use pipeline::QueueCollaborator;
pub use queue::QueueEngine;
pub use tip::TipEngine;
pub use vanity::VanityEngine;
