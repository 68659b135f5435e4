mod actor;
mod base;
pub mod file;
pub mod media;
pub mod object;

pub use actor::Actor;
pub use base::{default_name, DownloaderBase, DownloaderConfig, DEFAULT_WORKERS};
pub use file::{FileDownload, FileDownloader};
pub use media::{MediaDownloader, MediaOptions};
pub use object::{Download, DownloadTask, ObjectDownloader};
