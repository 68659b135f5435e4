use thiserror::Error;
use url::Url;

/// Failure to retrieve a page. Never contained by the crawler.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { url: Url, status: u16 },
}

/// Failure of a single download, or of a whole bulk download.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("No file name in URL: {0}")]
    MissingFileName(String),

    #[error("{0} is already being written by another worker")]
    InProgress(String),

    #[error("`download` is not implemented for {0}")]
    Unimplemented(String),

    #[error("{name} bulk download failed: {message}")]
    Bulk { name: String, message: String },

    #[error("Download task failed: {0}")]
    Join(String),
}

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid selector `{selector}`: {message}")]
    ExtractorConfig { selector: String, message: String },

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),
}

pub type ScraperResult<T> = Result<T, ScraperError>;
