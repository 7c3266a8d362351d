//! The per-event evaluation summary (spec.md §4.3): `{trigger,
//! amountCredited, blockedBy}` tuples returned so callers (metrics,
//! dispatcher, tests) can observe what happened without re-querying the
//! ledger.

#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub trigger: String,
    pub amount_credited: i64,
    pub blocked_by: Option<String>,
}

impl TriggerOutcome {
    pub fn fired(trigger: impl Into<String>, amount_credited: i64) -> Self {
        Self {
            trigger: trigger.into(),
            amount_credited,
            blocked_by: None,
        }
    }

    pub fn blocked(trigger: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            amount_credited: 0,
            blocked_by: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EarningSummary {
    pub results: Vec<TriggerOutcome>,
}

impl EarningSummary {
    pub fn total_credited(&self) -> i64 {
        self.results.iter().map(|r| r.amount_credited).sum()
    }
}
