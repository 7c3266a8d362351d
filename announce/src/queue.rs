//! The announcer's single-consumer outbound queue (spec.md §4.6): many
//! producers call [`Announcer::announce`], which renders the template and
//! hands the result to the flush loop — the only task that touches the
//! dedup ring, the rate limiter, or the chat collaborator.

use economy_core::collaborator::ChatSender;
use economy_core::config::ConfigHandle;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::dedup::DedupRing;
use crate::ratelimit::ChannelRateLimiter;
use crate::template;

struct PendingAnnouncement {
    channel: String,
    message: String,
}

#[derive(Debug, Clone)]
pub struct Announcer {
    config: ConfigHandle,
    tx: mpsc::UnboundedSender<PendingAnnouncement>,
}

impl Announcer {
    /// Spawns the flush loop and returns a handle plus its join handle. The
    /// join handle is owned by the caller (the orchestrator), which awaits
    /// it during shutdown to drain pending messages up to a deadline.
    pub fn spawn(config: ConfigHandle, chat: Arc<dyn ChatSender>) -> (Self, tokio::task::JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let loop_config = config.clone();
        let handle = tokio::spawn(flush_loop(loop_config, chat, rx));
        (Self { config, tx }, handle)
    }

    /// Renders `template_key` against `vars` and enqueues it for the next
    /// batch flush. A missing template key or a closed queue both drop the
    /// announcement silently (already warned by the renderer / by the
    /// flush loop having exited).
    pub fn announce(&self, channel: &str, template_key: &str, vars: HashMap<String, String>) {
        let config = self.config.current();
        let Some(message) = template::render(&config.announcements.templates, template_key, &vars) else {
            return;
        };
        let _ = self.tx.send(PendingAnnouncement { channel: channel.to_string(), message });
    }
}

async fn flush_loop(config: ConfigHandle, chat: Arc<dyn ChatSender>, mut rx: mpsc::UnboundedReceiver<PendingAnnouncement>) {
    let mut dedup = DedupRing::new();
    let mut limiter = ChannelRateLimiter::new();
    let mut batch: Vec<PendingAnnouncement> = Vec::new();

    loop {
        let batch_delay = Duration::from_millis(config.current().announcements.batch_delay_ms.max(0) as u64);
        let deadline = tokio::time::sleep(batch_delay);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    match maybe {
                        Some(item) => batch.push(item),
                        None => {
                            drain(&mut batch, &config, &mut dedup, &mut limiter, chat.as_ref()).await;
                            return;
                        }
                    }
                }
                _ = &mut deadline => break,
            }
        }
        drain(&mut batch, &config, &mut dedup, &mut limiter, chat.as_ref()).await;
    }
}

async fn drain(
    batch: &mut Vec<PendingAnnouncement>,
    config: &ConfigHandle,
    dedup: &mut DedupRing,
    limiter: &mut ChannelRateLimiter,
    chat: &dyn ChatSender,
) {
    if batch.is_empty() {
        return;
    }
    let cfg = config.current();
    let now = chrono::Utc::now();

    // Coalesce exact (channel, message) repeats within this batch first.
    let mut seen_in_batch: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
    for item in batch.drain(..) {
        let batch_key = (item.channel.clone(), item.message.clone());
        if !seen_in_batch.insert(batch_key) {
            continue;
        }
        if dedup.is_duplicate(&item.channel, &item.message, cfg.announcements.dedup_window_seconds, now) {
            continue;
        }
        if !limiter.allow(&item.channel, cfg.announcements.rate_per_minute, now) {
            warn!(channel = %item.channel, "announce: rate limit exceeded, dropping announcement");
            continue;
        }
        if let Err(error) = chat.send_chat(&item.channel, &item.message).await {
            warn!(channel = %item.channel, %error, "announce: chat send failed");
        } else {
            info!(channel = %item.channel, "announce: sent");
        }
    }
}
