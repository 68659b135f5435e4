use async_trait::async_trait;
use log::{debug, error, info};
use std::process::Stdio;
use tokio::process::Command;

use super::base::{default_name, DownloaderBase, DownloaderConfig};
use super::Actor;
use crate::core::DownloadError;
use crate::parser::{Document, Extractor};
use crate::stats::{FailureRecord, StatsTracker};

pub const DEFAULT_MEDIA_PROGRAM: &str = "yt-dlp";
pub const DEFAULT_MEDIA_FORMAT: &str = "bestaudio/best";

#[derive(Debug, Clone)]
pub struct MediaOptions {
    pub program: String,
    pub format: String,
    /// Defaults to `<output dir>/%(title)s.%(ext)s`.
    pub output_template: Option<String>,
    /// Silences the external tool's own output.
    pub quiet: bool,
    pub extra_args: Vec<String>,
}

impl Default for MediaOptions {
    fn default() -> Self {
        Self {
            program: DEFAULT_MEDIA_PROGRAM.to_string(),
            format: DEFAULT_MEDIA_FORMAT.to_string(),
            output_template: None,
            quiet: true,
            extra_args: Vec::new(),
        }
    }
}

impl MediaOptions {
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.output_template = Some(template.into());
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }
}

/// Hands the whole batch to an external media downloader in one call.
///
/// Unlike [`super::ObjectDownloader`] there is no per-item isolation: if the tool
/// fails, the batch is reported once as a single failure.
pub struct MediaDownloader {
    base: DownloaderBase,
    options: MediaOptions,
    stats: StatsTracker,
}

impl MediaDownloader {
    pub fn new(
        extractor: Extractor<String>,
        options: MediaOptions,
        config: DownloaderConfig,
    ) -> Result<Self, DownloadError> {
        let base = DownloaderBase::new(extractor, &config, default_name::<Self>())?;

        Ok(Self {
            base,
            options,
            stats: StatsTracker::new(),
        })
    }

    pub fn options(&self) -> &MediaOptions {
        &self.options
    }

    pub fn stats(&self) -> StatsTracker {
        self.stats.clone()
    }

    pub fn command_args(&self, urls: &[String]) -> Vec<String> {
        let template = self.options.output_template.clone().unwrap_or_else(|| {
            self.base
                .path()
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .into_owned()
        });

        let mut args = Vec::new();
        if self.options.quiet {
            args.push("--quiet".to_string());
            args.push("--no-warnings".to_string());
        }
        args.push("-f".to_string());
        args.push(self.options.format.clone());
        args.push("-o".to_string());
        args.push(template);
        args.extend(self.options.extra_args.iter().cloned());
        args.extend(urls.iter().cloned());
        args
    }

    async fn run_bulk(&self, urls: &[String]) -> Result<(), DownloadError> {
        let args = self.command_args(urls);
        debug!("Running {} {:?}", self.options.program, args);

        let output = Command::new(&self.options.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DownloadError::Bulk {
                name: self.base.name().to_string(),
                message: format!("failed to start {}: {}", self.options.program, e),
            })?;

        if !output.status.success() {
            return Err(DownloadError::Bulk {
                name: self.base.name().to_string(),
                message: format!(
                    "{} exited with {}: {}",
                    self.options.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Actor for MediaDownloader {
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
        let name = self.base.name().to_string();
        info!("[batch_downloader] {} {} objects consumed.", name, urls.len());
        self.stats.record_batch(urls.len());

        if urls.is_empty() {
            info!("[batch_downloader] {} Done", name);
            return;
        }

        match self.run_bulk(&urls).await {
            Ok(()) => {
                for _ in &urls {
                    self.stats.record_success(0);
                }
                info!("[batch_downloader] {} Done", name);
            }
            Err(e) => {
                error!("[batch_downloader] {} ERROR:\n{}", name, e);
                self.stats.record_failure(FailureRecord {
                    index: 0,
                    total: urls.len(),
                    url: urls.join(" "),
                    message: e.to_string(),
                });
            }
        }
    }
}
