//! Inbound event ingestion boundary (spec.md §6's event stream table).
//! Like [`crate::transport::Transport`], the concrete subscription
//! mechanism (a NATS subscriber, a websocket, whatever the deployment
//! uses) is an external collaborator with a named interface only; nothing
//! upstream of this trait depends on a specific wire protocol.

use async_trait::async_trait;
use economy_core::events::EconomyEvent;
use tokio::sync::mpsc;

/// Delivers the broker's inbound event stream as an `EconomyEvent` channel.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self) -> mpsc::UnboundedReceiver<EconomyEvent>;
}

/// An `EventSource` with nothing upstream: the returned receiver never
/// yields. Lets the service start up and run its scheduled/admin surface
/// without a live event feed, e.g. for local development; production
/// deployments supply a real subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSource;

#[async_trait]
impl EventSource for NullEventSource {
    async fn subscribe(&self) -> mpsc::UnboundedReceiver<EconomyEvent> {
        let (_tx, rx) = mpsc::unbounded_channel();
        rx
    }
}
