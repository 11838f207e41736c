use crate::api::album::error::AlbumError;
use crate::api::album::interfaces::{
    DEFAULT_PAGE_SIZE, DEFAULT_PREFETCH_CONCURRENCY, RefreshOutcome,
};
use crate::database::{LoadingClaim, NewPhoto, Photo, Pin, Store, StoreBatch, StoreError};
use crate::flickr_client::{PhotoSource, SearchQuery};
use crate::geo_box::BoundingBox;
use app_state::{AppSettings, GeoSettings};
use bon::bon;
use futures_util::StreamExt;
use futures_util::stream;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Populates and refreshes pin albums from a [`PhotoSource`].
///
/// At most one refresh runs per pin, across every loader built over clones of the same
/// [`Store`]; refreshes of different pins are independent.
#[derive(Clone)]
pub struct PinPhotoLoader {
    store: Store,
    source: Arc<dyn PhotoSource>,
    page_size: u32,
    geo: Option<GeoSettings>,
    prefetch_concurrency: usize,
    rng: Arc<Mutex<fastrand::Rng>>,
}

#[bon]
impl PinPhotoLoader {
    #[builder]
    pub fn new(
        #[builder(start_fn)] store: Store,
        #[builder(start_fn)] source: Arc<dyn PhotoSource>,
        #[builder(default = DEFAULT_PAGE_SIZE)] page_size: u32,
        // Bounding box extent, one degree each way when unset.
        geo: Option<GeoSettings>,
        // Makes the page choice sequence reproducible.
        seed: Option<u64>,
        #[builder(default = DEFAULT_PREFETCH_CONCURRENCY)] prefetch_concurrency: usize,
    ) -> Self {
        let rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            store,
            source,
            page_size: page_size.max(1),
            geo,
            prefetch_concurrency: prefetch_concurrency.max(1),
            rng: Arc::new(Mutex::new(rng)),
        }
    }
}

impl PinPhotoLoader {
    #[must_use]
    pub fn from_settings(store: Store, source: Arc<dyn PhotoSource>, settings: &AppSettings) -> Self {
        Self::builder(store, source)
            .page_size(settings.flickr.per_page)
            .geo(settings.geo)
            .build()
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn is_loading(&self, pin_id: &str) -> bool {
        self.store.is_loading(pin_id)
    }

    /// Fetches one random page of photos for the pin and adds the ones its album does not have yet.
    ///
    /// Returns [`RefreshOutcome::AlreadyLoading`] without touching the network if a refresh for
    /// this pin is already running.
    ///
    /// # Errors
    ///
    /// * [`AlbumError::PinNotFound`] if the pin does not exist when the refresh starts.
    /// * [`AlbumError::Network`] when the search fails. Nothing is written.
    /// * [`AlbumError::Store`] when the commit fails. Nothing is written.
    #[instrument(skip(self))]
    pub async fn refresh(&self, pin_id: &str) -> Result<RefreshOutcome, AlbumError> {
        let Some(_guard) = self.try_start(pin_id) else {
            debug!("Refresh already in flight.");
            return Ok(RefreshOutcome::AlreadyLoading);
        };
        let pin = self.require_pin(pin_id).await?;
        self.load_page(&pin).await
    }

    /// Replaces the album: deletes every photo of the pin, then loads a fresh random page.
    ///
    /// The deletion and the load run under the same loading claim, so a concurrent refresh cannot
    /// slip in between them.
    #[instrument(skip(self))]
    pub async fn new_collection(&self, pin_id: &str) -> Result<RefreshOutcome, AlbumError> {
        let Some(_guard) = self.try_start(pin_id) else {
            debug!("Refresh already in flight, keeping current collection.");
            return Ok(RefreshOutcome::AlreadyLoading);
        };
        let pin = self.require_pin(pin_id).await?;

        let mut batch = StoreBatch::new();
        batch.delete_photos_for_pin(&pin.id);
        let summary = self.store.save(batch).await?;
        info!(
            removed = summary.deleted_photos.len(),
            "Cleared album for new collection."
        );

        self.load_page(&pin).await
    }

    /// The current album sorted by title. An empty album of an idle pin is refreshed first.
    #[instrument(skip(self))]
    pub async fn ensure_album(&self, pin_id: &str) -> Result<Vec<Photo>, AlbumError> {
        let photos = self.photos_for_pin(pin_id).await?;
        if !photos.is_empty() || self.is_loading(pin_id) {
            return Ok(photos);
        }
        match self.refresh(pin_id).await? {
            RefreshOutcome::Loaded { .. } | RefreshOutcome::AlreadyLoading => {
                Ok(self.photos_for_pin(pin_id).await?)
            }
            RefreshOutcome::PinDeleted => Err(AlbumError::PinNotFound(pin_id.to_owned())),
        }
    }

    pub async fn photos_for_pin(&self, pin_id: &str) -> Result<Vec<Photo>, AlbumError> {
        Ok(self.store.photos_for_pin(pin_id).await?)
    }

    /// Deletes the given photos in one commit and evicts their cached images.
    ///
    /// Photos that are already gone are skipped. Returns how many were deleted.
    #[instrument(skip(self, photos), fields(count = photos.len()))]
    pub async fn delete_photos(&self, photos: &[Photo]) -> Result<usize, AlbumError> {
        let mut batch = StoreBatch::new();
        for photo in photos {
            batch.delete_photo(photo.id);
        }
        let summary = self.store.save(batch).await?;
        Ok(summary.deleted_photos.len())
    }

    /// Deletes every photo of the pin. The pin itself stays.
    #[instrument(skip(self))]
    pub async fn clear_album(&self, pin_id: &str) -> Result<usize, AlbumError> {
        let mut batch = StoreBatch::new();
        batch.delete_photos_for_pin(pin_id);
        let summary = self.store.save(batch).await?;
        Ok(summary.deleted_photos.len())
    }

    /// Image bytes for display. Served from the cache, otherwise downloaded and written back.
    ///
    /// Failures are logged and yield `None`; the photo is then shown without an image.
    #[instrument(skip(self, photo), fields(photo_id = photo.id, key = %photo.cache_key))]
    pub async fn image_for_photo(&self, photo: &Photo) -> Option<Vec<u8>> {
        match self.store.image_cache().get(&photo.cache_key).await {
            Ok(Some(bytes)) => {
                debug!("Image cache hit.");
                return Some(bytes);
            }
            Ok(None) => debug!("Image cache miss."),
            Err(err) => warn!("Image cache read failed, fetching instead: {err}"),
        }

        let bytes = match self.source.fetch_image(&photo.remote_url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(url = %photo.remote_url, "Image download failed: {err}");
                return None;
            }
        };
        if let Err(err) = self.store.write_back_image(photo, &bytes).await {
            warn!("Image write-back failed: {err}");
        }
        Some(bytes)
    }

    /// Downloads every image of the pin's album that is not cached yet.
    ///
    /// Returns how many images were written to the cache.
    #[instrument(skip(self))]
    pub async fn warm_album(&self, pin_id: &str) -> Result<usize, AlbumError> {
        let photos = self.photos_for_pin(pin_id).await?;
        let cache = self.store.image_cache();

        let mut missing = Vec::with_capacity(photos.len());
        for photo in photos {
            if !cache.contains(&photo.cache_key).await {
                missing.push(photo);
            }
        }
        if missing.is_empty() {
            return Ok(0);
        }

        let written = stream::iter(missing)
            .map(|photo| async move { self.download(&photo).await })
            .buffer_unordered(self.prefetch_concurrency)
            .filter(|written| std::future::ready(*written))
            .count()
            .await;
        info!(written, "Album warmed.");
        Ok(written)
    }

    async fn download(&self, photo: &Photo) -> bool {
        let bytes = match self.source.fetch_image(&photo.remote_url).await {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(url = %photo.remote_url, "Image download failed: {err}");
                return false;
            }
        };
        match self.store.write_back_image(photo, &bytes).await {
            Ok(written) => written,
            Err(err) => {
                warn!("Image write-back failed: {err}");
                false
            }
        }
    }

    async fn require_pin(&self, pin_id: &str) -> Result<Pin, AlbumError> {
        self.store
            .find_pin(pin_id)
            .await?
            .ok_or_else(|| AlbumError::PinNotFound(pin_id.to_owned()))
    }

    /// Runs one search and commits its results. The caller holds the loading claim.
    async fn load_page(&self, pin: &Pin) -> Result<RefreshOutcome, AlbumError> {
        let pages = page_count(pin.last_photo_count, self.page_size);
        let page = self.pick_page(pages);
        let bbox = self.bounding_box(pin);
        info!(pin_id = %pin.id, page, pages, %bbox, "Searching photos.");

        let response = self
            .source
            .search(&SearchQuery {
                bbox: bbox.to_string(),
                page,
                per_page: self.page_size,
            })
            .await?;

        let mut batch = StoreBatch::new();
        batch.set_last_photo_count(&pin.id, i64::try_from(response.total).unwrap_or(i64::MAX));
        for entry in response.photos {
            batch.insert_photo(NewPhoto {
                pin_id: pin.id.clone(),
                title: entry.title,
                remote_url: entry.url,
                cache_key: entry.id,
            });
        }

        match self.store.save(batch).await {
            Ok(summary) => {
                let inserted = summary.inserted_photos.len();
                info!(
                    inserted,
                    already_present = summary.skipped_photos,
                    total = response.total,
                    "Photos loaded."
                );
                Ok(RefreshOutcome::Loaded {
                    inserted,
                    page,
                    total: response.total,
                })
            }
            Err(StoreError::PinMissing(_)) => {
                warn!(pin_id = %pin.id, "Pin was deleted during refresh, dropping results.");
                Ok(RefreshOutcome::PinDeleted)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn bounding_box(&self, pin: &Pin) -> BoundingBox {
        self.geo.as_ref().map_or_else(
            || pin.bounding_box(),
            |geo| BoundingBox::from_settings(pin.latitude, pin.longitude, geo),
        )
    }

    fn pick_page(&self, pages: u32) -> u32 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .u32(1..=pages)
    }

    fn try_start(&self, pin_id: &str) -> Option<LoadingClaim> {
        self.store.claim_loading(pin_id)
    }
}

/// Number of result pages to draw from, never less than one.
#[must_use]
pub fn page_count(last_photo_count: i64, page_size: u32) -> u32 {
    let pages = last_photo_count.max(0) as u64 / u64::from(page_size.max(1));
    u32::try_from(pages).unwrap_or(u32::MAX).max(1)
}
