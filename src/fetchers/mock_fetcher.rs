use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use super::Fetcher;
use crate::core::{CrawlerConfig, FetchError};
use crate::HttpResponse;

#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

/// In-memory fetcher serving fixed pages keyed by URL. Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockFetcher {
    pages: Arc<HashMap<String, MockResponse>>,
    requested: Arc<RwLock<Vec<Url>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: impl Into<String>) -> Self {
        self.with_response(url, 200, body)
    }

    pub fn with_response(mut self, url: &str, status: u16, body: impl Into<String>) -> Self {
        let mut pages = (*self.pages).clone();
        pages.insert(
            url.to_string(),
            MockResponse {
                status,
                body: body.into(),
            },
        );
        self.pages = Arc::new(pages);
        self
    }

    /// URLs fetched so far, in request order. Shared between clones.
    pub fn requested(&self) -> Vec<Url> {
        self.requested.read().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url, _config: &CrawlerConfig) -> Result<HttpResponse, FetchError> {
        self.requested.write().push(url.clone());

        let response = match self.pages.get(url.as_str()) {
            Some(page) => HttpResponse::new(url.clone(), page.status, page.body.clone()),
            None => HttpResponse::new(url.clone(), 404, "Not Found"),
        };

        if !response.is_success() {
            return Err(FetchError::Status {
                url: response.url,
                status: response.status,
            });
        }
        Ok(response)
    }
}
