use economy_core::error::UserFacingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("ledger error: {0}")]
    Ledger(#[from] economy_ledger::LedgerError),
    #[error("spend error: {0}")]
    Spend(#[from] economy_spend::SpendError),
    #[error("config error: {0}")]
    Config(String),
}

impl DispatchError {
    /// Renders a PM-safe message, same convention as
    /// [`economy_spend::SpendError::user_message`].
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::Ledger(_) => UserFacingError::Storage.user_message(),
            DispatchError::Spend(error) => error.user_message(),
            DispatchError::Config(msg) => msg.clone(),
        }
    }
}
