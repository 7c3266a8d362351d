//! The command registry (spec.md §4.7/§6): one function per PM command,
//! dispatched by name from [`crate::dispatcher::Dispatcher`]. `user` holds
//! the commands any connected user can run; `admin` holds the ones gated
//! behind `cytube_rank >= admin.owner_level`.

pub mod admin;
pub mod user;

/// What a command handler replies with. A PM is always sent back to the
/// invoking user; `chat` is set for the handful of commands that also
/// announce to the channel (e.g. a challenge result).
#[derive(Debug, Clone, Default)]
pub struct CommandReply {
    pub pm: String,
    pub chat: Option<String>,
}

impl CommandReply {
    pub fn pm(text: impl Into<String>) -> Self {
        Self { pm: text.into(), chat: None }
    }

    pub fn pm_and_chat(pm: impl Into<String>, chat: impl Into<String>) -> Self {
        Self { pm: pm.into(), chat: Some(chat.into()) }
    }
}

/// The fully parsed invocation a handler receives.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub channel: String,
    pub username: String,
    pub cytube_rank: i64,
    pub args: Vec<String>,
}
