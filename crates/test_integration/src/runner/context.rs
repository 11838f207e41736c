use crate::runner::fake_flickr::{FakeFlickr, SEARCH_PATH};
use crate::test_constants::{PAGE_SIZE, SEED};
use crate::test_helpers::StubSource;
use app_state::{AppSettings, load_settings_from_path};
use color_eyre::Result;
use common_services::api::album::PinPhotoLoader;
use common_services::database::Store;
use common_services::flickr_client::PhotoSource;
use common_services::image_cache::ImageCache;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::info;

/// Shared environment for the integration suite.
pub struct TestContext {
    pub settings: AppSettings,
    pub store: Store,
    pub flickr: FakeFlickr,
    // Kept alive until the suite ends.
    _data_dir: TempDir,
}

impl TestContext {
    /// Loads the test settings, points storage at a temp dir and starts the fake search server.
    pub async fn new() -> Result<Self> {
        info!("Setting up test environment...");

        let settings_path =
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/settings.yaml");
        let mut settings = load_settings_from_path(&settings_path)?;

        let data_dir = TempDir::new()?;
        settings.storage.database_url =
            format!("sqlite://{}", data_dir.path().join("pins.db").display());
        settings.storage.image_cache_folder = data_dir.path().join("images");

        let flickr = FakeFlickr::start().await?;
        settings.flickr.base_url = flickr.url(SEARCH_PATH);

        let image_cache = ImageCache::open(&settings.storage.image_cache_folder).await?;
        let store = Store::connect(&settings.storage, image_cache).await?;

        info!("Test environment is ready.");
        Ok(Self {
            settings,
            store,
            flickr,
            _data_dir: data_dir,
        })
    }

    /// A loader over the shared store, fed by `source`, with a fixed seed.
    #[must_use]
    pub fn loader(&self, source: &Arc<StubSource>) -> PinPhotoLoader {
        let source: Arc<dyn PhotoSource> = source.clone();
        PinPhotoLoader::builder(self.store.clone(), source)
            .page_size(PAGE_SIZE)
            .seed(SEED)
            .build()
    }

    #[must_use]
    pub fn cache(&self) -> &ImageCache {
        self.store.image_cache()
    }
}
