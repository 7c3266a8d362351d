use chrono::{DateTime, Utc};

/// An in-progress presence session for one (user, channel).
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub connected_at: DateTime<Utc>,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub cumulative_minutes_today: i64,
    pub afk: bool,
}

impl Session {
    pub fn new(connected_at: DateTime<Utc>) -> Self {
        Self {
            connected_at,
            last_tick_at: None,
            cumulative_minutes_today: 0,
            afk: false,
        }
    }
}

/// Outcome of a join event, consumed by downstream handlers (welcome
/// wallet, custom greeting) to decide whether to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// The user is configured out of the economy entirely; no session was
    /// created.
    Ignored,
    /// A session already existed for this (user, channel); idempotent, no
    /// side effects.
    AlreadyConnected,
    /// A genuine arrival: no departure record (in-memory or persisted)
    /// within `join_debounce_minutes`. Welcome wallet / greeting may fire.
    GenuineArrival,
    /// A bounce: departure was within the debounce window, so this join is
    /// treated as session continuation, not a new arrival.
    Bounce,
}
