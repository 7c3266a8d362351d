#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]

//! # economy-announce
//!
//! The outbound announcement queue (spec.md §4.6): template rendering,
//! content-hash dedup, a short batching delay, and a per-channel rate
//! limiter sit between every producer (scheduler, dispatcher) and the
//! single chat-collaborator consumer.

pub mod dedup;
pub mod error;
pub mod queue;
pub mod ratelimit;
pub mod template;

pub use dedup::DedupRing;
pub use error::AnnounceError;
pub use queue::Announcer;
pub use ratelimit::ChannelRateLimiter;
