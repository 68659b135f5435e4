use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::DownloadError;
use crate::parser::{Document, Extractor};

pub const DEFAULT_WORKERS: usize = 10;

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub workers: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            name: None,
            path: None,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl DownloaderConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Size of the download pool. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Lower-cased name with an `s` appended: `File` downloads into `files`.
    pub fn default_path(name: &str) -> PathBuf {
        PathBuf::from(format!("{}s", name.to_lowercase()))
    }
}

/// Display name derived from a strategy type: `FileDownload` becomes `File`.
pub fn default_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    let short = base.rsplit("::").next().unwrap_or(base);

    let trimmed = short
        .strip_suffix("Downloader")
        .or_else(|| short.strip_suffix("Download"))
        .unwrap_or(short);

    if trimmed.is_empty() {
        short.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Name, output directory and pending URLs shared by every downloader actor.
pub struct DownloaderBase {
    name: String,
    path: PathBuf,
    extractor: Extractor<String>,
    pending: Vec<String>,
}

impl DownloaderBase {
    /// Creates the output directory if it does not exist yet.
    pub fn new(
        extractor: Extractor<String>,
        config: &DownloaderConfig,
        default_name: String,
    ) -> Result<Self, DownloadError> {
        let name = config.name.clone().unwrap_or(default_name);
        let path = config
            .path
            .clone()
            .unwrap_or_else(|| DownloaderConfig::default_path(&name));

        fs::create_dir_all(&path)?;
        debug!("{} writes into {}", name, path.display());

        Ok(Self {
            name,
            path,
            extractor,
            pending: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn feed(&mut self, document: &Document) {
        if let Some(url) = self.extractor.extract(document) {
            self.pending.push(url);
        }
    }

    /// Empties the buffer, handing its URLs to the caller.
    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }
}
