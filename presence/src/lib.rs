#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]

//! # economy-presence
//!
//! Tracks who is connected to which channel, with join-debounced arrival
//! detection distinguishing a genuine arrival from a bounce (spec.md
//! §4.2). Owns no database tables of its own; reads and writes `accounts`
//! only at the boundaries the spec names, through [`economy_ledger::Ledger`].

pub mod session;
pub mod tracker;

pub use session::{ArrivalOutcome, Session};
pub use tracker::PresenceTracker;
