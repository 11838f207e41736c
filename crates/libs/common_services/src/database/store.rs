use crate::database::{ChangeFilter, StoreChange, StoreSubscription};
use crate::database::{LoadingClaim, LoadingPins};
use crate::database::{
    MapRegion, MapRegionStore, NewPhoto, Photo, PhotoFilter, PhotoSort, PhotoStore, Pin,
    PinStore, StoreError, get_db_pool,
};
use crate::image_cache::ImageCache;
use app_state::StorageSettings;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, instrument, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
enum PendingOp {
    InsertPin(Pin),
    DeletePin(String),
    SetLastPhotoCount { pin_id: String, count: i64 },
    InsertPhoto(NewPhoto),
    DeletePhoto(i64),
    DeletePhotosForPin(String),
}

/// Pending writes that [`Store::save`] commits together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreBatch {
    ops: Vec<PendingOp>,
}

impl StoreBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn insert_pin(&mut self, pin: Pin) -> &mut Self {
        self.ops.push(PendingOp::InsertPin(pin));
        self
    }

    /// Deletes the pin and all of its photos.
    pub fn delete_pin(&mut self, pin_id: impl Into<String>) -> &mut Self {
        self.ops.push(PendingOp::DeletePin(pin_id.into()));
        self
    }

    /// Aborts the batch with [`StoreError::PinMissing`] if the pin is gone by commit time.
    pub fn set_last_photo_count(&mut self, pin_id: impl Into<String>, count: i64) -> &mut Self {
        self.ops.push(PendingOp::SetLastPhotoCount {
            pin_id: pin_id.into(),
            count,
        });
        self
    }

    /// Aborts the batch with [`StoreError::PinMissing`] if the owning pin is gone by commit time.
    /// Skipped when the pin already has a photo with the same cache key.
    pub fn insert_photo(&mut self, photo: NewPhoto) -> &mut Self {
        self.ops.push(PendingOp::InsertPhoto(photo));
        self
    }

    pub fn delete_photo(&mut self, photo_id: i64) -> &mut Self {
        self.ops.push(PendingOp::DeletePhoto(photo_id));
        self
    }

    pub fn delete_photos_for_pin(&mut self, pin_id: impl Into<String>) -> &mut Self {
        self.ops.push(PendingOp::DeletePhotosForPin(pin_id.into()));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub inserted_pins: usize,
    pub inserted_photos: Vec<Photo>,
    /// Inserts skipped because the pin already had the cache key.
    pub skipped_photos: usize,
    pub deleted_photos: Vec<Photo>,
    pub deleted_pins: Vec<String>,
}

/// Durable store for pins and photos.
///
/// All writes go through [`Store::save`], which holds a single writer lock for the duration of
/// one transaction. Committed changes are broadcast to subscribers after the commit, and the
/// cached images of deleted photos are evicted once no photo references them.
///
/// Clones share the writer lock, the subscribers and the set of loading pins.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    image_cache: ImageCache,
    writer: Arc<Mutex<()>>,
    changes: broadcast::Sender<Arc<StoreChange>>,
    loading: LoadingPins,
}

impl Store {
    pub async fn connect(
        settings: &StorageSettings,
        image_cache: ImageCache,
    ) -> Result<Self, StoreError> {
        let pool = get_db_pool(settings).await?;
        Ok(Self::new(pool, image_cache))
    }

    /// Expects the schema to be applied already.
    #[must_use]
    pub fn new(pool: SqlitePool, image_cache: ImageCache) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            pool,
            image_cache,
            writer: Arc::new(Mutex::new(())),
            changes,
            loading: LoadingPins::default(),
        }
    }

    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[must_use]
    pub const fn image_cache(&self) -> &ImageCache {
        &self.image_cache
    }

    #[must_use]
    pub fn is_loading(&self, pin_id: &str) -> bool {
        self.loading.contains(pin_id)
    }

    /// Marks the pin as loading until the claim is dropped. `None` if a refresh already holds it.
    #[must_use]
    pub fn claim_loading(&self, pin_id: &str) -> Option<LoadingClaim> {
        self.loading.claim(pin_id)
    }

    /// Changes committed after this call that match `filter`.
    #[must_use]
    pub fn subscribe(&self, filter: ChangeFilter) -> StoreSubscription {
        StoreSubscription::new(self.changes.subscribe(), filter)
    }

    //================================================================================
    // Reads
    //================================================================================

    pub async fn query_photos(
        &self,
        filter: &PhotoFilter,
        sort: PhotoSort,
    ) -> Result<Vec<Photo>, StoreError> {
        PhotoStore::list(&self.pool, filter, sort).await
    }

    /// A pin's photos sorted by title.
    pub async fn photos_for_pin(&self, pin_id: &str) -> Result<Vec<Photo>, StoreError> {
        self.query_photos(&PhotoFilter::ForPin(pin_id.to_owned()), PhotoSort::TitleAscending)
            .await
    }

    pub async fn photo_count(&self, pin_id: &str) -> Result<i64, StoreError> {
        PhotoStore::count_for_pin(&self.pool, pin_id).await
    }

    pub async fn find_pin(&self, pin_id: &str) -> Result<Option<Pin>, StoreError> {
        PinStore::find_by_id(&self.pool, pin_id).await
    }

    pub async fn list_pins(&self) -> Result<Vec<Pin>, StoreError> {
        PinStore::list_all(&self.pool).await
    }

    pub async fn load_map_region(&self) -> Result<Option<MapRegion>, StoreError> {
        MapRegionStore::load(&self.pool).await
    }

    //================================================================================
    // Writes
    //================================================================================

    /// Commits every pending operation in `batch` inside one transaction.
    ///
    /// # Errors
    ///
    /// * [`StoreError::PinMissing`] when the batch updates or adds photos to a deleted pin.
    /// * [`StoreError::CommitFailed`] for any other database failure.
    ///
    /// On error nothing from the batch is written and no change is broadcast.
    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    pub async fn save(&self, batch: StoreBatch) -> Result<CommitSummary, StoreError> {
        if batch.is_empty() {
            return Ok(CommitSummary::default());
        }
        let _writer = self.writer.lock().await;

        let mut tx = self.pool.begin().await.map_err(StoreError::CommitFailed)?;
        let mut summary = CommitSummary::default();
        let mut changes = Vec::with_capacity(batch.len());
        for op in batch.ops {
            if let Err(err) = apply(&mut tx, op, &mut summary, &mut changes).await {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback failed: {rollback_err}");
                }
                return Err(into_commit_error(err));
            }
        }
        tx.commit().await.map_err(StoreError::CommitFailed)?;

        debug!(
            inserted = summary.inserted_photos.len(),
            skipped = summary.skipped_photos,
            deleted = summary.deleted_photos.len(),
            "Batch committed."
        );

        // Checked under the writer lock, so no insert can re-reference a key in between.
        let mut checked = HashSet::new();
        for photo in &summary.deleted_photos {
            if checked.insert(photo.cache_key.as_str()) {
                self.evict_unreferenced(&photo.cache_key).await;
            }
        }
        for change in changes {
            // No subscribers is not an error.
            let _ = self.changes.send(Arc::new(change));
        }

        Ok(summary)
    }

    /// Writes fetched image bytes to the cache, unless the photo was deleted meanwhile.
    ///
    /// The bytes are staged outside the writer lock; only the existence check and the rename
    /// run under it. Returns whether the bytes were published. Cache failures are logged and
    /// reported as `false`.
    #[instrument(skip(self, photo, bytes), fields(photo_id = photo.id, key = %photo.cache_key))]
    pub async fn write_back_image(&self, photo: &Photo, bytes: &[u8]) -> Result<bool, StoreError> {
        let staged = match self.image_cache.stage(bytes).await {
            Ok(staged) => staged,
            Err(err) => {
                warn!("Could not stage image: {err}");
                return Ok(false);
            }
        };

        // Deletes evict under the same lock.
        let _writer = self.writer.lock().await;
        if !PhotoStore::exists(&self.pool, photo.id).await? {
            debug!("Photo was deleted before its image arrived, skipping write-back.");
            return Ok(false);
        }
        match self.image_cache.persist(staged, &photo.cache_key) {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!("Could not cache image: {err}");
                Ok(false)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn save_map_region(&self, region: &MapRegion) -> Result<(), StoreError> {
        let _writer = self.writer.lock().await;
        MapRegionStore::upsert(&self.pool, region).await?;
        info!("Map region saved.");
        Ok(())
    }

    /// Evicts the cached image for `key` unless a remaining photo, of any pin, still uses it.
    async fn evict_unreferenced(&self, key: &str) {
        let filter = PhotoFilter::CacheKey(key.to_owned());
        match PhotoStore::list(&self.pool, &filter, PhotoSort::Inserted).await {
            Ok(remaining) if remaining.is_empty() => self.image_cache.evict_logged(key).await,
            Ok(remaining) => {
                debug!(key, references = remaining.len(), "Image still referenced, keeping it.");
            }
            Err(err) => warn!("Could not check references of {key}, keeping image: {err}"),
        }
    }
}

async fn apply(
    conn: &mut SqliteConnection,
    op: PendingOp,
    summary: &mut CommitSummary,
    changes: &mut Vec<StoreChange>,
) -> Result<(), StoreError> {
    match op {
        PendingOp::InsertPin(pin) => {
            PinStore::insert(&mut *conn, &pin).await?;
            summary.inserted_pins += 1;
            changes.push(StoreChange::PinInserted(pin));
        }
        PendingOp::DeletePin(pin_id) => {
            let photos = PhotoStore::delete_for_pin(&mut *conn, &pin_id).await?;
            record_deleted_photos(photos, summary, changes);
            if PinStore::delete(&mut *conn, &pin_id).await? > 0 {
                summary.deleted_pins.push(pin_id.clone());
                changes.push(StoreChange::PinDeleted { pin_id });
            }
        }
        PendingOp::SetLastPhotoCount { pin_id, count } => {
            if PinStore::set_last_photo_count(&mut *conn, &pin_id, count).await? == 0 {
                return Err(StoreError::PinMissing(pin_id));
            }
        }
        PendingOp::InsertPhoto(photo) => {
            if !PinStore::exists(&mut *conn, &photo.pin_id).await? {
                return Err(StoreError::PinMissing(photo.pin_id));
            }
            match PhotoStore::insert(&mut *conn, &photo).await? {
                Some(inserted) => {
                    changes.push(StoreChange::PhotoInserted(inserted.clone()));
                    summary.inserted_photos.push(inserted);
                }
                None => summary.skipped_photos += 1,
            }
        }
        PendingOp::DeletePhoto(photo_id) => {
            if let Some(photo) = PhotoStore::delete_returning(&mut *conn, photo_id).await? {
                record_deleted_photos(vec![photo], summary, changes);
            }
        }
        PendingOp::DeletePhotosForPin(pin_id) => {
            let photos = PhotoStore::delete_for_pin(&mut *conn, &pin_id).await?;
            record_deleted_photos(photos, summary, changes);
        }
    }
    Ok(())
}

fn record_deleted_photos(
    photos: Vec<Photo>,
    summary: &mut CommitSummary,
    changes: &mut Vec<StoreChange>,
) {
    for photo in photos {
        changes.push(StoreChange::PhotoDeleted(photo.clone()));
        summary.deleted_photos.push(photo);
    }
}

fn into_commit_error(err: StoreError) -> StoreError {
    match err {
        StoreError::Query(err) => StoreError::CommitFailed(err),
        other => other,
    }
}
