//! Shutdown management.
//!
//! Mirrors the synchronous/asynchronous shutdown split used across the
//! workspace: components that can tear down immediately implement
//! [`SyncShutdown`], components that must drain outstanding work (flush a
//! queue, finish a storage transaction) implement [`AsyncShutdown`].

use serde::{Deserialize, Serialize};
use std::future::Future;

/// Components that can shut down synchronously.
pub trait SyncShutdown {
    type Result;
    fn shutdown(&mut self) -> Self::Result;
}

/// Components that must perform async work during shutdown (flush queues,
/// finish in-flight storage writes) implement this instead.
pub trait AsyncShutdown {
    type Result;
    fn shutdown(&mut self) -> impl Future<Output = Self::Result> + Send;
}

/// Shutdown signal that can be sent through an event stream to trigger a
/// graceful stop of the whole service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize)]
pub struct Shutdown;
