//! Outbound collaborator traits shared by the scheduler, dispatcher, and
//! announcer (spec.md §6 "Broker outbound"). The broker crate provides the
//! concrete implementation; everything upstream depends only on these
//! traits so it can be exercised without a live connection.

use async_trait::async_trait;

use crate::error::EconomyError;

/// `SendPM(channel, user, text) -> correlationId`.
#[async_trait]
pub trait PmSender: Send + Sync {
    async fn send_pm(&self, channel: &str, user: &str, text: &str) -> Result<String, EconomyError>;
}

/// `SendChat(channel, text) -> correlationId`.
#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send_chat(&self, channel: &str, text: &str) -> Result<String, EconomyError>;
}
