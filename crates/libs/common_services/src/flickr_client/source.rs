use super::client::FlickrClient;
use super::error::NetworkError;
use super::interfaces::{SearchQuery, SearchResponse};
use async_trait::async_trait;

/// Where album photos come from. Implemented by [`FlickrClient`]; tests swap in stubs.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, NetworkError>;

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, NetworkError>;
}

#[async_trait]
impl PhotoSource for FlickrClient {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, NetworkError> {
        Self::search(self, query).await
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
        Self::fetch_image(self, url).await
    }
}
