mod config;
mod crawler;
mod errors;

pub use config::{CrawlerConfig, DEFAULT_PAGINATION};
pub use crawler::{extract, extract_selectors, Batch, Crawler, Page};
pub use errors::{DownloadError, FetchError, ScraperError, ScraperResult};
