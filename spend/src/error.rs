use economy_core::error::UserFacingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpendError {
    #[error("ledger error: {0}")]
    Ledger(#[from] economy_ledger::LedgerError),

    #[error("rejected: {0:?}")]
    Rejected(#[from] UserFacingError),
}

impl SpendError {
    pub fn user_message(&self) -> String {
        match self {
            SpendError::Ledger(_) => UserFacingError::Storage.user_message(),
            SpendError::Rejected(reason) => reason.user_message(),
        }
    }
}
