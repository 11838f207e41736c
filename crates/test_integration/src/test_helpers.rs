use crate::runner::context::TestContext;
use crate::test_constants::WAIT_SECS;
use async_trait::async_trait;
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use common_services::api::pins::create_pin;
use common_services::database::{NewPhoto, Photo, Pin, StoreBatch};
use common_services::flickr_client::{
    NetworkError, PhotoEntry, PhotoSource, SearchQuery, SearchResponse,
};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tokio::time::timeout;

/// Scripted [`PhotoSource`] that records what it is asked.
pub struct StubSource {
    response: Mutex<Result<SearchResponse, NetworkError>>,
    images: Mutex<HashMap<String, Vec<u8>>>,
    queries: Mutex<Vec<SearchQuery>>,
    searches: AtomicUsize,
    image_fetches: AtomicUsize,
    gated: bool,
    gate: Semaphore,
    search_started: Notify,
}

impl StubSource {
    #[must_use]
    pub fn returning(response: SearchResponse) -> Self {
        Self {
            response: Mutex::new(Ok(response)),
            images: Mutex::new(HashMap::new()),
            queries: Mutex::new(Vec::new()),
            searches: AtomicUsize::new(0),
            image_fetches: AtomicUsize::new(0),
            gated: false,
            gate: Semaphore::new(0),
            search_started: Notify::new(),
        }
    }

    #[must_use]
    pub fn failing(error: NetworkError) -> Self {
        let stub = Self::returning(SearchResponse::default());
        stub.set_response(Err(error));
        stub
    }

    /// Searches block until [`StubSource::open_gate`] is called.
    #[must_use]
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    /// Serves bytes for every photo url in the scripted response.
    #[must_use]
    pub fn with_images(self) -> Self {
        let urls: Vec<String> = match &*self.lock_response() {
            Ok(response) => response.photos.iter().map(|p| p.url.clone()).collect(),
            Err(_) => Vec::new(),
        };
        {
            let mut images = self.images.lock().unwrap_or_else(PoisonError::into_inner);
            for url in urls {
                let bytes = image_for_url(&url);
                images.insert(url, bytes);
            }
        }
        self
    }

    pub fn set_response(&self, response: Result<SearchResponse, NetworkError>) {
        *self.lock_response() = response;
    }

    pub fn open_gate(&self) {
        self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn image_fetches(&self) -> usize {
        self.image_fetches.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Waits until at least `count` searches have reached the stub.
    pub async fn wait_for_searches(&self, count: usize) -> Result<()> {
        timeout(Duration::from_secs(WAIT_SECS), async {
            while self.searches() < count {
                self.search_started.notified().await;
            }
        })
        .await
        .wrap_err_with(|| format!("Timed out waiting for {count} searches"))
    }

    fn lock_response(&self) -> std::sync::MutexGuard<'_, Result<SearchResponse, NetworkError>> {
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PhotoSource for StubSource {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, NetworkError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.search_started.notify_one();

        if self.gated {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| NetworkError::Transport(e.to_string()))?;
            permit.forget();
        }
        self.lock_response().clone()
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        self.image_fetches.fetch_add(1, Ordering::SeqCst);
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .cloned()
            .ok_or_else(|| NetworkError::Status {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            })
    }
}

/// `count` entries with keys `{tag}-00`, `{tag}-01`, ... and titles in reverse key order.
#[must_use]
pub fn photo_page(tag: &str, count: usize, total: u64) -> SearchResponse {
    let photos = (0..count)
        .map(|i| PhotoEntry {
            id: format!("{tag}-{i:02}"),
            title: format!("Photo {:02}", count - i),
            url: format!("https://img.test/{tag}/{i:02}_m.jpg"),
        })
        .collect();
    SearchResponse { total, photos }
}

#[must_use]
pub fn image_for_url(url: &str) -> Vec<u8> {
    format!("bytes:{url}").into_bytes()
}

pub async fn new_pin(context: &TestContext, latitude: f64, longitude: f64) -> Result<Pin> {
    Ok(create_pin(&context.store, latitude, longitude).await?)
}

/// Puts photos straight into the store, bypassing the loader.
pub async fn seed_photos(context: &TestContext, pin: &Pin, keys: &[&str]) -> Result<Vec<Photo>> {
    let mut batch = StoreBatch::new();
    for key in keys {
        batch.insert_photo(NewPhoto {
            pin_id: pin.id.clone(),
            title: format!("Seeded {key}"),
            remote_url: format!("https://img.test/seeded/{key}.jpg"),
            cache_key: (*key).to_owned(),
        });
    }
    Ok(context.store.save(batch).await?.inserted_photos)
}

pub async fn photo_count(context: &TestContext, pin: &Pin) -> Result<usize> {
    let count = context.store.photo_count(&pin.id).await?;
    usize::try_from(count).map_err(|e| eyre!("Negative photo count: {e}"))
}
