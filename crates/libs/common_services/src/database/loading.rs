use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Pins with a refresh in flight. Shared by every clone of the owning [`crate::database::Store`].
#[derive(Debug, Clone, Default)]
pub struct LoadingPins {
    pins: Arc<Mutex<HashSet<String>>>,
}

impl LoadingPins {
    #[must_use]
    pub fn contains(&self, pin_id: &str) -> bool {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(pin_id)
    }

    /// Marks the pin as loading. `None` if it already is.
    #[must_use]
    pub fn claim(&self, pin_id: &str) -> Option<LoadingClaim> {
        let inserted = self
            .pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pin_id.to_owned());
        inserted.then(|| LoadingClaim {
            pins: Arc::clone(&self.pins),
            pin_id: pin_id.to_owned(),
        })
    }
}

/// Keeps a pin marked as loading until dropped, whatever way the refresh ends.
#[derive(Debug)]
pub struct LoadingClaim {
    pins: Arc<Mutex<HashSet<String>>>,
    pin_id: String,
}

impl LoadingClaim {
    #[must_use]
    pub fn pin_id(&self) -> &str {
        &self.pin_id
    }
}

impl Drop for LoadingClaim {
    fn drop(&mut self) {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.pin_id);
    }
}
