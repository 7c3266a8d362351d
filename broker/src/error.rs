use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("media catalog returned not found")]
    NotFound,
    #[error("media catalog request failed: {0}")]
    MediaCatalog(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<BrokerError> for economy_core::error::EconomyError {
    fn from(error: BrokerError) -> Self {
        economy_core::error::EconomyError::Collaborator(error.to_string())
    }
}

impl From<BrokerError> for economy_spend::SpendError {
    fn from(error: BrokerError) -> Self {
        tracing::warn!(%error, "collaborator call failed");
        economy_core::error::UserFacingError::Collaborator.into()
    }
}
