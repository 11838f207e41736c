use crate::database::{MapRegion, Pin, Store, StoreBatch, StoreError};
use tracing::{info, instrument};

/// Creates and persists a pin with an empty album.
#[instrument(skip(store))]
pub async fn create_pin(store: &Store, latitude: f64, longitude: f64) -> Result<Pin, StoreError> {
    let pin = Pin::new(latitude, longitude);
    let mut batch = StoreBatch::new();
    batch.insert_pin(pin.clone());
    store.save(batch).await?;
    info!(pin_id = %pin.id, "Pin created.");
    Ok(pin)
}

#[instrument(skip(store))]
pub async fn find_pin(store: &Store, pin_id: &str) -> Result<Option<Pin>, StoreError> {
    store.find_pin(pin_id).await
}

/// All pins, in the order the map restores them.
#[instrument(skip(store))]
pub async fn list_pins(store: &Store) -> Result<Vec<Pin>, StoreError> {
    store.list_pins().await
}

/// Deletes the pin, its photos and their cached images. Returns whether the pin existed.
#[instrument(skip(store))]
pub async fn delete_pin(store: &Store, pin_id: &str) -> Result<bool, StoreError> {
    let mut batch = StoreBatch::new();
    batch.delete_pin(pin_id);
    let summary = store.save(batch).await?;
    let deleted = !summary.deleted_pins.is_empty();
    if deleted {
        info!(photos = summary.deleted_photos.len(), "Pin deleted.");
    }
    Ok(deleted)
}

#[instrument(skip(store))]
pub async fn save_map_region(store: &Store, region: &MapRegion) -> Result<(), StoreError> {
    store.save_map_region(region).await
}

#[instrument(skip(store))]
pub async fn load_map_region(store: &Store) -> Result<Option<MapRegion>, StoreError> {
    store.load_map_region().await
}
