use thiserror::Error;

#[derive(Debug, Error)]
pub enum EarningError {
    #[error("ledger error: {0}")]
    Ledger(#[from] economy_ledger::LedgerError),
}
