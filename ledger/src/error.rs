use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("blocking task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
