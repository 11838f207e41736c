use crate::database::{Photo, Pin};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::warn;

/// A committed change to persisted entities.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    PinInserted(Pin),
    PinDeleted { pin_id: String },
    PhotoInserted(Photo),
    PhotoDeleted(Photo),
}

impl StoreChange {
    #[must_use]
    pub fn pin_id(&self) -> &str {
        match self {
            Self::PinInserted(pin) => &pin.id,
            Self::PinDeleted { pin_id } => pin_id,
            Self::PhotoInserted(photo) | Self::PhotoDeleted(photo) => &photo.pin_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeFilter {
    All,
    /// Changes to this pin and its photos.
    Pin(String),
}

impl ChangeFilter {
    #[must_use]
    pub fn matches(&self, change: &StoreChange) -> bool {
        match self {
            Self::All => true,
            Self::Pin(pin_id) => change.pin_id() == pin_id,
        }
    }
}

/// Receives committed changes matching a filter, in commit order.
pub struct StoreSubscription {
    receiver: broadcast::Receiver<Arc<StoreChange>>,
    filter: ChangeFilter,
}

impl StoreSubscription {
    pub(crate) const fn new(
        receiver: broadcast::Receiver<Arc<StoreChange>>,
        filter: ChangeFilter,
    ) -> Self {
        Self { receiver, filter }
    }

    /// Waits for the next matching change. `None` once the store is gone.
    pub async fn recv(&mut self) -> Option<Arc<StoreChange>> {
        loop {
            match self.receiver.recv().await {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Store subscriber lagged, skipped {skipped} changes.");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next matching change that is already queued, if any.
    pub fn try_recv(&mut self) -> Option<Arc<StoreChange>> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) if self.filter.matches(&change) => return Some(change),
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!("Store subscriber lagged, skipped {skipped} changes.");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Everything currently queued that matches.
    pub fn drain(&mut self) -> Vec<Arc<StoreChange>> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
