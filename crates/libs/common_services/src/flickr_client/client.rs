use super::error::NetworkError;
use super::interfaces::{SearchQuery, SearchResponse, parse_search_response};
use app_state::FlickrSettings;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const SAFE_SEARCH: &str = "1";
const JSON_FORMAT: &str = "json";
const NO_JSON_CALLBACK: &str = "1";

/// Client for the remote bounding-box photo search and for raw image downloads.
#[derive(Clone)]
pub struct FlickrClient {
    http_client: Client,
    base_url: Url,
    api_key: String,
    search_method: String,
    extras: String,
}

impl FlickrClient {
    /// Build a client with its own connection pool and the configured request timeout.
    pub fn from_settings(settings: &FlickrSettings) -> Result<Self, NetworkError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Self::new(http_client, settings)
    }

    pub fn new(http_client: Client, settings: &FlickrSettings) -> Result<Self, NetworkError> {
        Ok(Self {
            http_client,
            base_url: settings.base_url.parse()?,
            api_key: settings.api_key.clone(),
            search_method: settings.search_method.clone(),
            extras: settings.extras.clone(),
        })
    }

    /// Full search url, with every parameter percent-encoded.
    #[must_use]
    pub fn search_url(&self, query: &SearchQuery) -> Url {
        let page = query.page.to_string();
        let per_page = query.per_page.to_string();
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("method", &self.search_method)
            .append_pair("api_key", &self.api_key)
            .append_pair("extras", &self.extras)
            .append_pair("safe_search", SAFE_SEARCH)
            .append_pair("format", JSON_FORMAT)
            .append_pair("nojsoncallback", NO_JSON_CALLBACK)
            .append_pair("bbox", &query.bbox)
            .append_pair("page", &page)
            .append_pair("per_page", &per_page);
        url
    }

    /// Run one page of a bounding-box search.
    #[instrument(skip(self), fields(bbox = %query.bbox, page = query.page))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, NetworkError> {
        let response = self.http_client.get(self.search_url(query)).send().await?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await?;
        let parsed = parse_search_response(&body)?;
        debug!(
            total = parsed.total,
            received = parsed.photos.len(),
            "Search finished"
        );
        Ok(parsed)
    }

    /// Download the raw bytes behind a photo url.
    #[instrument(skip(self))]
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        let url: Url = url.parse()?;
        let response = self.http_client.get(url).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

async fn ensure_success(response: Response) -> Result<Response, NetworkError> {
    if response.status().is_success() {
        return Ok(response);
    }
    Err(NetworkError::Status {
        status: response.status(),
        body: response.text().await.unwrap_or_default(),
    })
}
