#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # economy-core
//!
//! Shared foundation for the Z-Economy service: configuration (including
//! hot-reload), error taxonomy, logging initialisers, graceful-shutdown
//! traits, inbound event shapes, and the named key structs used across the
//! ledger, presence, earning, spend, scheduler, dispatch, and announce
//! crates.
//!
//! This crate has no knowledge of the broker wire protocol or storage
//! engine; it defines the vocabulary every other crate shares.

pub mod collaborator;
pub mod config;
pub mod cron;
pub mod error;
pub mod events;
pub mod ignored;
pub mod keys;
pub mod logging;
pub mod shutdown;

pub use collaborator::{ChatSender, PmSender};
pub use config::{ConfigHandle, EconomyConfig, OnConfigUpdate};
pub use error::{EconomyError, UserFacingError};
pub use events::EconomyEvent;
pub use ignored::IgnoredUsers;
