use crate::core::{CrawlerConfig, FetchError};
use crate::HttpResponse;
use async_trait::async_trait;
use url::Url;

/// Retrieves one page per call. No retry and no caching; a transport failure or a
/// non-success status comes back as a [`FetchError`] for the caller to handle.
///
/// The response is turned into a [`crate::parser::Document`] by the caller, outside
/// any await point, since parsed documents are not `Send`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, config: &CrawlerConfig) -> Result<HttpResponse, FetchError>;
}
