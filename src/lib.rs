pub mod actors;
pub mod core;
pub mod fetchers;
pub mod http;
pub mod parser;
pub mod segment;
pub mod stats;

pub use crate::core::{
    extract, extract_selectors, Batch, Crawler, CrawlerConfig, DownloadError, FetchError, Page,
    ScraperError, ScraperResult,
};
pub use actors::{
    Actor, Download, DownloaderConfig, FileDownload, FileDownloader, MediaDownloader,
    MediaOptions, ObjectDownloader,
};
pub use fetchers::{Fetcher, HttpFetcher};
pub use http::HttpResponse;
pub use parser::{Document, Element, Extractor, ExtractorSpec};
pub use stats::StatsTracker;
