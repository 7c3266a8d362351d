//! Inbound event shapes consumed from the broker firehose (spec.md §6),
//! plus the orchestrator-level envelope that ties them to shutdown and
//! admin-command signals — the `EngineEvent` pattern from the ancestor
//! trading engine, generalised to chat/presence events instead of market
//! data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shutdown::Shutdown;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatMsgEvent {
    pub username: String,
    pub channel: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PmEvent {
    pub username: String,
    pub channel: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub rank: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AddUserEvent {
    pub username: String,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserLeaveEvent {
    pub username: String,
    pub channel: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChangeMediaEvent {
    pub channel: String,
    pub title: String,
    pub media_id: String,
    pub duration_seconds: i64,
    pub uid: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SetAfkEvent {
    pub username: String,
    pub channel: String,
    pub afk: bool,
}

/// The full set of broker-delivered event kinds, plus the internal
/// shutdown signal. Exactly one `(channel)`-scoped writer task processes
/// these in delivery order per spec.md §5's single-writer-per-channel
/// discipline.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum EconomyEvent {
    ChatMsg(ChatMsgEvent),
    Pm(PmEvent),
    AddUser(AddUserEvent),
    UserLeave(UserLeaveEvent),
    ChangeMedia(ChangeMediaEvent),
    SetAfk(SetAfkEvent),
    Shutdown(Shutdown),
}

impl EconomyEvent {
    /// The channel this event pertains to, used to route onto the
    /// channel-scoped writer task. `Shutdown` has no channel affinity.
    pub fn channel(&self) -> Option<&str> {
        match self {
            EconomyEvent::ChatMsg(e) => Some(&e.channel),
            EconomyEvent::Pm(e) => Some(&e.channel),
            EconomyEvent::AddUser(e) => Some(&e.channel),
            EconomyEvent::UserLeave(e) => Some(&e.channel),
            EconomyEvent::ChangeMedia(e) => Some(&e.channel),
            EconomyEvent::SetAfk(e) => Some(&e.channel),
            EconomyEvent::Shutdown(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EconomyEvent::Shutdown(_))
    }
}
