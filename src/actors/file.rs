use async_trait::async_trait;
use futures::StreamExt;
use log::{debug, warn};
use parking_lot::Mutex;
use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::base::DownloaderConfig;
use super::object::{Download, ObjectDownloader};
use crate::core::DownloadError;
use crate::fetchers::http_fetcher::DEFAULT_USER_AGENT;
use crate::parser::Extractor;

/// Plain GET, body streamed into `<dir>/<last path segment>`.
///
/// Two URLs of one batch sharing a last segment would write the same file. While a
/// target is being written, any other URL aiming at it fails with
/// [`DownloadError::InProgress`] instead of interleaving with it.
#[derive(Clone)]
pub struct FileDownload {
    client: Client,
    writing: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Holds a target path in the in-progress set until dropped.
struct WriteSlot {
    writing: Arc<Mutex<HashSet<PathBuf>>>,
    target: PathBuf,
}

impl WriteSlot {
    fn claim(writing: &Arc<Mutex<HashSet<PathBuf>>>, target: PathBuf) -> Option<Self> {
        if !writing.lock().insert(target.clone()) {
            return None;
        }
        Some(Self {
            writing: Arc::clone(writing),
            target,
        })
    }
}

impl Drop for WriteSlot {
    fn drop(&mut self) {
        self.writing.lock().remove(&self.target);
    }
}

pub type FileDownloader = ObjectDownloader<FileDownload>;

impl FileDownload {
    pub fn new() -> Result<Self, DownloadError> {
        let client = ClientBuilder::new()
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            writing: Arc::default(),
        }
    }

    /// Trailing path segment of `url`, if it names something.
    pub fn file_name(url: &Url) -> Option<String> {
        url.path_segments()?
            .filter(|segment| !segment.is_empty())
            .last()
            .map(str::to_string)
    }
}

#[async_trait]
impl Download for FileDownload {
    async fn download(&self, url: &str, dir: &Path) -> Result<u64, DownloadError> {
        let parsed = Url::parse(url)?;
        let name =
            Self::file_name(&parsed).ok_or_else(|| DownloadError::MissingFileName(url.to_string()))?;

        let target = dir.join(&name);
        let Some(_slot) = WriteSlot::claim(&self.writing, target.clone()) else {
            warn!("{} collides with a download still writing {}", url, target.display());
            return Err(DownloadError::InProgress(target.display().to_string()));
        };

        let response = self.client.get(parsed).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut file = File::create(&target).await?;
        let mut body = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!("Wrote {} bytes to {}", written, target.display());
        Ok(written)
    }
}

impl ObjectDownloader<FileDownload> {
    /// File downloader with a default HTTP client.
    pub fn files(
        extractor: Extractor<String>,
        config: DownloaderConfig,
    ) -> Result<Self, DownloadError> {
        Self::new(extractor, FileDownload::new()?, config)
    }
}
