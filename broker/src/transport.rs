//! The wire-level boundary (spec.md §1, §6: "the broker client library
//! itself... treated as an external collaborator with named interfaces
//! only"). Nothing upstream of [`crate::client::BrokerClient`] depends on
//! a concrete messaging stack; swapping `Transport` implementations
//! (NATS, an in-process test double, whatever the deployment uses) never
//! touches `PmSender`/`ChatSender`/`QueueCollaborator`.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::BrokerError;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn publish(&self, subject: &str, payload: serde_json::Value) -> Result<(), BrokerError>;

    async fn request(
        &self,
        subject: &str,
        payload: serde_json::Value,
        timeout: Duration,
    ) -> Result<serde_json::Value, BrokerError>;
}

/// A `Transport` with nothing on the other end: logs every call at debug
/// level and reports a timeout for requests. Lets the service start up and
/// run its own scheduled/earning logic without a live broker connection,
/// e.g. for local development; production deployments supply a real
/// NATS-backed `Transport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn publish(&self, subject: &str, payload: serde_json::Value) -> Result<(), BrokerError> {
        tracing::debug!(subject, %payload, "null transport dropped publish");
        Ok(())
    }

    async fn request(&self, subject: &str, payload: serde_json::Value, _timeout: Duration) -> Result<serde_json::Value, BrokerError> {
        tracing::debug!(subject, %payload, "null transport has no reply");
        Err(BrokerError::Timeout)
    }
}
