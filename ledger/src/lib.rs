#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

//! # economy-ledger
//!
//! Durable accounts, the append-only transaction log, daily activity
//! rollups, trigger cooldowns/analytics, and economy snapshots — the only
//! crate permitted to write `accounts` and `transactions` (spec.md §3, §4.1).
//!
//! Storage substrate: a single SQLite file with WAL, a configurable busy
//! timeout, and connection-per-operation access serialized through a
//! bounded `r2d2` pool, matching spec.md's "connection-per-operation
//! discipline serialized through a bounded worker pool".

pub mod approval;
pub mod bounty;
pub mod challenge;
pub mod cooldown;
pub mod error;
pub mod gambling;
pub mod ledger;
pub mod models;
pub mod progression;
pub mod store;
pub mod streak;
pub mod tip;

pub use approval::{ApprovalRepo, PendingApproval};
pub use bounty::{Bounty, BountyRepo};
pub use challenge::{Challenge, ChallengeRepo};
pub use error::LedgerError;
pub use gambling::{GamblingStats, GamblingStatsRepo};
pub use ledger::{CosmeticField, DailyActivityField, Ledger};
pub use progression::ProgressionRepo;
pub use store::Store;
pub use streak::{Streak, StreakRepo};
pub use tip::{Tip, TipRepo};
