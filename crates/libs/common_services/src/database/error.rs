use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A batch could not be applied. Nothing from it was written.
    #[error("Commit failed: {0}")]
    CommitFailed(sqlx::Error),

    #[error("Database error: {0}")]
    Query(sqlx::Error),

    /// A batch referenced a pin that has been deleted. Nothing from it was written.
    #[error("Pin {0} no longer exists")]
    PinMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Query(err)
    }
}
