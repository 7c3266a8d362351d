//! Per-channel event routing (spec.md §5's single-writer-per-channel
//! discipline): a single intake task reads the broker's inbound event
//! stream and fans each event out to a dedicated task for its channel,
//! spawned lazily on first use. Events for the same channel are always
//! handled by the same task, in delivery order; events across channels
//! run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use economy_core::events::EconomyEvent;
use economy_core::keys::AccountKey;
use economy_core::shutdown::Shutdown;
use economy_earning::EarningEngine;
use economy_ledger::Ledger;
use economy_presence::{ArrivalOutcome, PresenceTracker};
use tokio::sync::mpsc;
use tracing::{instrument, warn};

use economy_announce::Announcer;
use economy_broker::Metrics;
use economy_core::collaborator::PmSender;
use economy_core::config::ConfigHandle;
use economy_dispatch::Dispatcher;

/// Everything a per-channel writer task needs to process its events.
#[derive(Clone)]
pub struct RouterDeps {
    pub config: ConfigHandle,
    pub ledger: Ledger,
    pub presence: Arc<PresenceTracker>,
    pub earning: Arc<EarningEngine>,
    pub dispatcher: Arc<Dispatcher>,
    pub announcer: Announcer,
    pub pm: Arc<dyn PmSender>,
    pub metrics: Arc<Metrics>,
}

fn event_kind(event: &EconomyEvent) -> &'static str {
    match event {
        EconomyEvent::ChatMsg(_) => "chatmsg",
        EconomyEvent::Pm(_) => "pm",
        EconomyEvent::AddUser(_) => "adduser",
        EconomyEvent::UserLeave(_) => "userleave",
        EconomyEvent::ChangeMedia(_) => "changemedia",
        EconomyEvent::SetAfk(_) => "setafk",
        EconomyEvent::Shutdown(_) => "shutdown",
    }
}

struct ChannelTask {
    tx: mpsc::UnboundedSender<EconomyEvent>,
    handle: tokio::task::JoinHandle<()>,
}

/// Reads from `inbound` until it closes or a `Shutdown` event arrives,
/// dispatching to per-channel tasks spawned on demand. Returns once every
/// per-channel task has drained and exited.
pub async fn run(deps: RouterDeps, mut inbound: mpsc::UnboundedReceiver<EconomyEvent>) {
    let mut channels: HashMap<String, ChannelTask> = HashMap::new();

    while let Some(event) = inbound.recv().await {
        if event.is_terminal() {
            for (_, task) in channels.drain() {
                let _ = task.tx.send(EconomyEvent::Shutdown(Shutdown));
                let _ = task.handle.await;
            }
            return;
        }

        let Some(channel) = event.channel() else { continue };
        let channel = channel.to_string();
        if !channels.contains_key(&channel) {
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = tokio::spawn(channel_writer(deps.clone(), channel.clone(), rx));
            channels.insert(channel.clone(), ChannelTask { tx, handle });
        }
        let _ = channels[&channel].tx.send(event);
    }

    for (_, task) in channels.drain() {
        drop(task.tx);
        let _ = task.handle.await;
    }
}

async fn channel_writer(deps: RouterDeps, channel: String, mut rx: mpsc::UnboundedReceiver<EconomyEvent>) {
    while let Some(event) = rx.recv().await {
        if event.is_terminal() {
            return;
        }
        deps.metrics.events_processed_total.with_label_values(&[event_kind(&event)]).inc();
        if let Err(error) = handle_event(&deps, &event).await {
            warn!(%channel, %error, "event handler failed");
        }
    }
}

#[instrument(skip(deps, event), fields(channel))]
async fn handle_event(deps: &RouterDeps, event: &EconomyEvent) -> Result<(), economy_core::error::EconomyError> {
    match event {
        EconomyEvent::ChatMsg(msg) => {
            let summary = deps
                .earning
                .handle_chat_message(msg)
                .await
                .map_err(|e| economy_core::error::EconomyError::Storage(e.to_string()))?;
            for outcome in &summary.results {
                if outcome.amount_credited > 0 {
                    deps.metrics.trigger_hits_total.with_label_values(&[&outcome.trigger]).inc();
                    deps.metrics.z_earned_total.with_label_values(&[&outcome.trigger]).inc_by(outcome.amount_credited as f64);
                }
                tracing::debug!(trigger = outcome.trigger, credited = outcome.amount_credited, "trigger evaluated");
            }
            if msg.username.eq_ignore_ascii_case(&deps.config.current().bot.username) {
                let _ = deps.earning.record_bot_interaction(&msg.channel, msg.timestamp).await;
            }
        }
        EconomyEvent::Pm(pm_event) => {
            deps.dispatcher.handle_pm(pm_event.clone()).await;
        }
        EconomyEvent::AddUser(add) => {
            let key = AccountKey::new(&add.username, &add.channel);
            let existed_before = deps
                .ledger
                .get_account(&key)
                .await
                .map_err(|e| economy_core::error::EconomyError::Storage(e.to_string()))?
                .is_some();
            let now = Utc::now();
            let outcome = deps.presence.handle_join(&add.username, &add.channel, now).await;
            if outcome == ArrivalOutcome::GenuineArrival {
                deps.earning.note_arrival(&add.channel, &add.username, now);
                let onboarding = deps.config.current().onboarding.clone();
                if !existed_before && onboarding.welcome_wallet > 0 {
                    deps.ledger
                        .credit(&key, onboarding.welcome_wallet, "earn", "onboarding.welcome_wallet", "welcome to the channel", None, None)
                        .await
                        .map_err(|e| economy_core::error::EconomyError::Storage(e.to_string()))?;
                }
                if onboarding.custom_greeting_enabled {
                    if let Ok(Some(account)) = deps.ledger.get_account(&key).await {
                        if let Some(greeting) = account.custom_greeting {
                            let _ = deps.pm.send_pm(&add.channel, &add.username, &greeting).await;
                        }
                    }
                }
            }
        }
        EconomyEvent::UserLeave(leave) => {
            deps.presence.handle_leave(&leave.username, &leave.channel, Utc::now());
        }
        EconomyEvent::ChangeMedia(change) => {
            let outcomes = deps
                .earning
                .handle_media_change(change)
                .await
                .map_err(|e| economy_core::error::EconomyError::Storage(e.to_string()))?;
            if !outcomes.is_empty() {
                tracing::debug!(count = outcomes.len(), "survived_full_media awards");
            }
            deps.announcer.announce(
                &change.channel,
                "media_change",
                [("title".to_string(), change.title.clone())].into(),
            );
        }
        EconomyEvent::SetAfk(afk) => {
            deps.presence.set_afk(&afk.username, &afk.channel, afk.afk);
        }
        EconomyEvent::Shutdown(_) => {}
    }
    Ok(())
}
