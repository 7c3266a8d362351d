//! Broker outbound calls (spec.md §6): `SendPM`, `SendChat`, `AddMedia`,
//! `SetChannelRank`, `KvGet`/`KvPut`, `Request`. Each is a thin subject +
//! JSON envelope built over [`Transport`], wired into the rest of the
//! workspace through the [`PmSender`], [`ChatSender`], and
//! [`QueueCollaborator`] traits.

use async_trait::async_trait;
use economy_core::collaborator::{ChatSender, PmSender};
use economy_core::config::NatsConfig;
use economy_core::error::EconomyError;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::transport::Transport;

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A monotonic correlation id; no need for a UUID dependency for
/// in-process request tracing.
fn correlation_id() -> String {
    let n = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("economy-{n:016x}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePosition {
    End,
    Next,
}

impl QueuePosition {
    fn as_str(self) -> &'static str {
        match self {
            QueuePosition::End => "end",
            QueuePosition::Next => "next",
        }
    }
}

#[derive(Clone)]
pub struct BrokerClient {
    transport: Arc<dyn Transport>,
    subject_prefix: String,
    request_timeout: Duration,
}

impl std::fmt::Debug for BrokerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerClient").field("subject_prefix", &self.subject_prefix).finish()
    }
}

impl BrokerClient {
    pub fn new(transport: Arc<dyn Transport>, config: &NatsConfig) -> Self {
        Self {
            transport,
            subject_prefix: config.subject_prefix.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    fn subject(&self, suffix: &str) -> String {
        format!("{}.{}", self.subject_prefix, suffix)
    }

    pub async fn add_media(&self, channel: &str, media_id: &str, position: QueuePosition, temp: bool) -> Result<(), EconomyError> {
        self.transport
            .publish(
                &self.subject("add_media"),
                json!({
                    "channel": channel,
                    "mediaType": "yt",
                    "mediaId": media_id,
                    "position": position.as_str(),
                    "temp": temp,
                }),
            )
            .await
            .map_err(Into::into)
    }

    pub async fn set_channel_rank(&self, channel: &str, user: &str, level: i64, check_rank: bool, timeout_ms: u64) -> Result<(), EconomyError> {
        self.transport
            .publish(
                &self.subject("set_channel_rank"),
                json!({
                    "channel": channel,
                    "user": user,
                    "level": level,
                    "checkRank": check_rank,
                    "timeout": timeout_ms,
                }),
            )
            .await
            .map_err(Into::into)
    }

    pub async fn kv_get(&self, bucket: &str, key: &str) -> Result<Option<serde_json::Value>, EconomyError> {
        let response = self
            .transport
            .request(&self.subject("kv_get"), json!({"bucket": bucket, "key": key}), self.request_timeout)
            .await?;
        Ok(response.get("value").cloned())
    }

    pub async fn kv_put(&self, bucket: &str, key: &str, value: serde_json::Value) -> Result<(), EconomyError> {
        self.transport
            .publish(&self.subject("kv_put"), json!({"bucket": bucket, "key": key, "value": value}))
            .await
            .map_err(Into::into)
    }

    /// Cross-service request/reply (e.g. alias resolution) on an
    /// arbitrary subject, bypassing this client's own prefix.
    pub async fn request(&self, subject: &str, payload: serde_json::Value) -> Result<serde_json::Value, EconomyError> {
        self.transport.request(subject, payload, self.request_timeout).await.map_err(Into::into)
    }
}

#[async_trait]
impl PmSender for BrokerClient {
    async fn send_pm(&self, channel: &str, user: &str, text: &str) -> Result<String, EconomyError> {
        let id = correlation_id();
        self.transport
            .publish(&self.subject("send_pm"), json!({"channel": channel, "user": user, "text": text, "correlationId": id}))
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl ChatSender for BrokerClient {
    async fn send_chat(&self, channel: &str, text: &str) -> Result<String, EconomyError> {
        let id = correlation_id();
        self.transport
            .publish(&self.subject("send_chat"), json!({"channel": channel, "text": text, "correlationId": id}))
            .await?;
        Ok(id)
    }
}

#[async_trait]
impl economy_spend::QueueCollaborator for BrokerClient {
    async fn add_media(&self, channel: &str, media_id: &str, play_next: bool) -> Result<(), economy_spend::SpendError> {
        let position = if play_next { QueuePosition::Next } else { QueuePosition::End };
        BrokerClient::add_media(self, channel, media_id, position, false).await.map_err(|error| {
            tracing::warn!(%error, "add_media collaborator call failed");
            economy_core::error::UserFacingError::Collaborator.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BrokerError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingTransport {
        published: Mutex<Vec<(String, serde_json::Value)>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn publish(&self, subject: &str, payload: serde_json::Value) -> Result<(), BrokerError> {
            self.published.lock().push((subject.to_string(), payload));
            Ok(())
        }

        async fn request(&self, _subject: &str, _payload: serde_json::Value, _timeout: Duration) -> Result<serde_json::Value, BrokerError> {
            Ok(json!({"value": null}))
        }
    }

    fn config() -> NatsConfig {
        NatsConfig {
            url: "nats://localhost:4222".to_string(),
            subject_prefix: "economy".to_string(),
            request_timeout_ms: 2000,
        }
    }

    #[tokio::test]
    async fn send_pm_publishes_with_correlation_id() {
        let transport = Arc::new(RecordingTransport::default());
        let client = BrokerClient::new(transport.clone(), &config());
        let id = client.send_pm("c1", "alice", "hi").await.unwrap();
        assert!(!id.is_empty());
        let published = transport.published.lock();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "economy.send_pm");
    }

    #[tokio::test]
    async fn add_media_uses_requested_position() {
        let transport = Arc::new(RecordingTransport::default());
        let client = BrokerClient::new(transport.clone(), &config());
        client.add_media("c1", "abc123", QueuePosition::Next, false).await.unwrap();
        let published = transport.published.lock();
        assert_eq!(published[0].1["position"], "next");
    }
}
