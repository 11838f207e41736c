use crate::database::StoreError;
use crate::flickr_client::NetworkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlbumError {
    #[error("Photo search failed: {0}")]
    Network(#[from] NetworkError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Pin not found: {0}")]
    PinNotFound(String),
}

impl AlbumError {
    /// The search never reached the remote or the connection broke.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(err) if err.is_transport())
    }

    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Network(err) if err.is_decode())
    }
}
