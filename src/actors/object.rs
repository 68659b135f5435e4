use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

use super::base::{default_name, DownloaderBase, DownloaderConfig};
use super::Actor;
use crate::core::DownloadError;
use crate::parser::{Document, Extractor};
use crate::stats::{FailureRecord, StatsTracker};

/// How a single URL ends up on disk.
#[async_trait]
pub trait Download: Send + Sync + 'static {
    /// Downloads `url` into `dir` and returns the number of bytes written.
    async fn download(&self, url: &str, dir: &Path) -> Result<u64, DownloadError> {
        let _ = (url, dir);
        Err(DownloadError::Unimplemented(default_name::<Self>()))
    }
}

/// One unit of work inside a `consume` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub index: usize,
    pub total: usize,
    pub url: String,
}

impl DownloadTask {
    /// `[downloader] File [03/12] `: one-based position, zero-padded to the width of `total`.
    pub fn prefix(&self, name: &str) -> String {
        let width = self.total.to_string().len();
        format!(
            "[downloader] {} [{:0width$}/{}] ",
            name,
            self.index + 1,
            self.total,
            width = width
        )
    }
}

/// Actor downloading each pending URL through a bounded pool of workers.
/// A failing or panicking item is logged and counted; it never stops the batch.
pub struct ObjectDownloader<D: Download> {
    base: DownloaderBase,
    strategy: Arc<D>,
    workers: usize,
    stats: StatsTracker,
}

impl<D: Download> ObjectDownloader<D> {
    pub fn new(
        extractor: Extractor<String>,
        strategy: D,
        config: DownloaderConfig,
    ) -> Result<Self, DownloadError> {
        let base = DownloaderBase::new(extractor, &config, default_name::<D>())?;

        Ok(Self {
            base,
            strategy: Arc::new(strategy),
            workers: config.workers.max(1),
            stats: StatsTracker::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.base.path()
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn strategy(&self) -> &D {
        &self.strategy
    }

    pub fn stats(&self) -> StatsTracker {
        self.stats.clone()
    }

    async fn run_task(
        task: DownloadTask,
        name: Arc<str>,
        dir: Arc<Path>,
        strategy: Arc<D>,
        stats: StatsTracker,
    ) {
        let prefix = task.prefix(&name);
        info!("{}consume {}", prefix, task.url);

        let url = task.url.clone();
        let handle = tokio::spawn(async move { strategy.download(&url, &dir).await });
        let outcome = match handle.await {
            Ok(result) => result,
            Err(e) => Err(DownloadError::Join(e.to_string())),
        };

        match outcome {
            Ok(bytes) => {
                stats.record_success(bytes);
                info!("{}Done", prefix);
            }
            Err(e) => {
                error!("{}ERROR:\n{}", prefix, e);
                stats.record_failure(FailureRecord {
                    index: task.index,
                    total: task.total,
                    url: task.url,
                    message: e.to_string(),
                });
            }
        }
    }
}

#[async_trait]
impl<D: Download> Actor for ObjectDownloader<D> {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn feed(&mut self, document: &Document) -> &mut dyn Actor {
        self.base.feed(document);
        self
    }

    fn pending(&self) -> &[String] {
        self.base.pending()
    }

    async fn consume(&mut self) {
        let urls = self.base.take_pending();
        let total = urls.len();
        self.stats.record_batch(total);

        let name: Arc<str> = Arc::from(self.base.name());
        let dir: Arc<Path> = Arc::from(self.base.path());

        stream::iter(urls.into_iter().enumerate())
            .map(|(index, url)| {
                Self::run_task(
                    DownloadTask { index, total, url },
                    Arc::clone(&name),
                    Arc::clone(&dir),
                    Arc::clone(&self.strategy),
                    self.stats.clone(),
                )
            })
            .buffer_unordered(self.workers)
            .collect::<Vec<()>>()
            .await;
    }
}
