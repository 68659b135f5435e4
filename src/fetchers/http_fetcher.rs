use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::{header, Client, ClientBuilder};
use std::collections::HashMap;
use thiserror::Error;
use url::Url;

use super::Fetcher;
use crate::core::{CrawlerConfig, FetchError};
use crate::HttpResponse;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum HttpFetcherError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, HttpFetcherError> {
        let client = ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    fn extract_headers(response: &reqwest::Response) -> HashMap<String, String> {
        response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|val| (k.to_string(), val.to_string())))
            .collect()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, config: &CrawlerConfig) -> Result<HttpResponse, FetchError> {
        debug!("Fetching URL: {}", url);

        let mut req = self.client.get(url.clone());

        for (key, value) in &config.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(cookies) = config.cookie_header() {
            req = req.header(header::COOKIE, cookies);
        }

        let timestamp = Utc::now();
        let response = req.send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let headers = Self::extract_headers(&response);

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: final_url,
                status,
            });
        }

        let raw_body = response.bytes().await?;
        let body = String::from_utf8_lossy(&raw_body).into_owned();

        debug!(
            "Received response: status={}, body_length={}",
            status,
            raw_body.len()
        );

        Ok(HttpResponse {
            url: final_url,
            status,
            headers,
            body,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> Result<(HttpFetcher, MockServer), HttpFetcherError> {
        let server = MockServer::start().await;
        let fetcher = HttpFetcher::new()?;
        Ok((fetcher, server))
    }

    #[tokio::test]
    async fn test_get_request() {
        let (fetcher, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/list"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html><body>ok</body></html>", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri())
            .unwrap()
            .join("/list")
            .unwrap();
        let response = fetcher
            .fetch(&url, &CrawlerConfig::default())
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "<html><body>ok</body></html>");
        assert_eq!(
            response.headers.get("content-type").map(String::as_str),
            Some("text/html")
        );
    }

    #[tokio::test]
    async fn test_cookies_are_sent() {
        let (fetcher, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/private"))
            .and(header("cookie", "session=abc; user=rinku"))
            .respond_with(ResponseTemplate::new(200).set_body_string("welcome"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri())
            .unwrap()
            .join("/private")
            .unwrap();
        let config = CrawlerConfig::default()
            .with_cookie("user", "rinku")
            .with_cookie("session", "abc");
        let response = fetcher.fetch(&url, &config).await.unwrap();

        assert_eq!(response.body, "welcome");
    }

    #[tokio::test]
    async fn test_error_status_is_a_fetch_error() {
        let (fetcher, mock_server) = setup().await.unwrap();

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri())
            .unwrap()
            .join("/missing")
            .unwrap();
        let result = fetcher.fetch(&url, &CrawlerConfig::default()).await;

        match result {
            Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected status error, got {:?}", other.map(|r| r.status)),
        }
    }

    #[tokio::test]
    async fn test_config_headers_override_defaults() {
        let (fetcher, mock_server) = setup().await.unwrap();
        let custom_ua = "CustomBot/1.0";

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("user-agent", custom_ua))
            .and(header("accept-language", "zh-CN"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let url = Url::parse(&mock_server.uri()).unwrap();
        let config = CrawlerConfig::default()
            .with_headers(vec![("user-agent", custom_ua), ("accept-language", "zh-CN")]);
        let response = fetcher.fetch(&url, &config).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
    }
}
