//! Central error types for the Z-Economy service.
//!
//! [`EconomyError`] aggregates subsystem errors the way the orchestrator
//! needs to see them (for logging and for deciding whether a failure is
//! fatal at startup). [`UserFacingError`] is the taxonomy from the error
//! handling design: every failure that can reach a PM reply is mapped into
//! one of these variants so the dispatcher can render a safe message
//! without leaking internals.

use thiserror::Error;

/// Aggregate error type threaded through the orchestrator.
#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("collaborator error: {0}")]
    Collaborator(String),

    #[error("join error: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for EconomyError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Join(format!("{value:?}"))
    }
}

/// The user-facing error taxonomy from the design's error-handling section.
/// Every branch renders to a short string suitable for a PM reply; nothing
/// here carries internal detail (query text, stack traces, file paths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFacingError {
    Validation(String),
    InsufficientFunds,
    BlockedByCap,
    BlockedByCooldown,
    BlockedByBlackout,
    BlockedByBan,
    NotFound(String),
    Collaborator,
    Storage,
    Config(String),
}

impl UserFacingError {
    /// Render a short PM-safe message. Cosmetic wording of individual
    /// command replies is intentionally out of scope; this is the
    /// generic fallback text used whenever a command doesn't supply its
    /// own more specific phrasing.
    pub fn user_message(&self) -> String {
        match self {
            UserFacingError::Validation(msg) => msg.clone(),
            UserFacingError::InsufficientFunds => "you don't have enough Z for that.".to_string(),
            UserFacingError::BlockedByCap => "that's capped out for now, try again later.".to_string(),
            UserFacingError::BlockedByCooldown => "slow down, that's still on cooldown.".to_string(),
            UserFacingError::BlockedByBlackout => "queueing is closed right now.".to_string(),
            UserFacingError::BlockedByBan => "you're currently suspended from the economy.".to_string(),
            UserFacingError::NotFound(what) => format!("couldn't find {what}."),
            UserFacingError::Collaborator => "something went wrong talking to an external service, you've been refunded.".to_string(),
            UserFacingError::Storage => "something went wrong, please try again.".to_string(),
            UserFacingError::Config(msg) => format!("config error: {msg}"),
        }
    }
}

/// Runs a fallible event-handler body, logging and swallowing any error so
/// the caller (the per-channel writer task) never unwinds. Mirrors the
/// "blanket error handler" from the design notes.
#[macro_export]
macro_rules! run_isolated {
    ($ctx:expr, $body:expr) => {{
        match $body {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!(context = $ctx, error = %e, "isolated task failed");
                None
            }
        }
    }};
}
