use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("ledger error: {0}")]
    Ledger(#[from] economy_ledger::LedgerError),
    #[error("spend error: {0}")]
    Spend(#[from] economy_spend::SpendError),
}
