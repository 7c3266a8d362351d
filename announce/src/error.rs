use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("collaborator error: {0}")]
    Collaborator(#[from] economy_core::error::EconomyError),
}
