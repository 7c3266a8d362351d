#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]

//! # economy-earning
//!
//! Evaluates the chat/content/social trigger catalog (spec.md §4.3) against
//! incoming events, applies the stacked multiplier, truncates through the
//! per-trigger fractional accumulator, and records transactions, analytics,
//! and daily activity counters through [`economy_ledger::Ledger`].

pub mod accumulator;
pub mod detect;
pub mod engine;
pub mod error;
pub mod multiplier;
pub mod outcome;
pub mod state;

pub use accumulator::FractionalAccumulator;
pub use engine::EarningEngine;
pub use error::EarningError;
pub use multiplier::{ActiveWindow, MultiplierEngine, MultiplierSource};
pub use outcome::{EarningSummary, TriggerOutcome};
