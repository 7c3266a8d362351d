#![forbid(unsafe_code)]
#![warn(unused, clippy::unused_self, missing_debug_implementations, rust_2018_idioms)]

//! # economy-broker
//!
//! The external-collaborator boundary named in spec.md §6. The actual
//! message-broker wire protocol, and hand-rolling the Prometheus text
//! exposition format, are both explicitly out of scope (spec.md §1) —
//! this crate provides the [`Transport`] trait as that boundary, a JSON
//! envelope layer over it ([`BrokerClient`]) implementing the shared
//! [`PmSender`]/[`ChatSender`]/`QueueCollaborator` traits, the media
//! catalog HTTP client, and metrics registration via `prometheus`.

pub mod client;
pub mod error;
pub mod events;
pub mod media;
pub mod metrics;
pub mod transport;

pub use client::{BrokerClient, QueuePosition};
pub use error::BrokerError;
pub use events::{EventSource, NullEventSource};
pub use media::{MediaCatalogClient, MediaResult};
pub use metrics::Metrics;
pub use transport::{NullTransport, Transport};
