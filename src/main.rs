use clap::Parser;
use futures::StreamExt;
use pagescrape::actors::DEFAULT_WORKERS;
use pagescrape::core::DEFAULT_PAGINATION;
use pagescrape::{
    Crawler, CrawlerConfig, DownloaderConfig, Element, Extractor, FileDownloader, HttpFetcher,
    MediaDownloader, MediaOptions, StatsTracker,
};
use serde_json::json;
use std::path::PathBuf;
use url::Url;

/// Walk a paginated listing, print what the extractors find and download linked files.
#[derive(Parser, Debug)]
#[command(name = "pagescrape", version)]
struct Cli {
    /// First listing page.
    url: Url,

    /// Selector of the link to the next listing page.
    #[arg(long)]
    next: Option<String>,

    /// Selector whose matches are printed for every page. Repeatable.
    #[arg(short, long = "extract")]
    extract: Vec<String>,

    /// Selector of a link to download as a plain file, one per page.
    #[arg(long)]
    files: Option<String>,

    /// Selector of a link handed to the media downloader, one per page.
    #[arg(long)]
    media: Option<String>,

    /// Parent directory for downloads (defaults to `files/` and `medias/` here).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pages per batch; downloads run at the end of each batch.
    #[arg(long, default_value_t = DEFAULT_PAGINATION)]
    pagination: usize,

    /// Concurrent file downloads.
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    workers: usize,

    /// Cookie sent with every page request, as NAME=VALUE. Repeatable.
    #[arg(long = "cookie", value_parser = parse_cookie)]
    cookies: Vec<(String, String)>,

    /// Stop after this many batches.
    #[arg(long)]
    max_batches: Option<usize>,

    #[arg(short, long)]
    verbose: bool,
}

fn parse_cookie(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{}`", raw)),
    }
}

fn downloader_config(cli: &Cli, folder: &str) -> DownloaderConfig {
    let config = DownloaderConfig::default().with_workers(cli.workers);
    match &cli.out {
        Some(out) => config.with_path(out.join(folder)),
        None => config,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    };
    env_logger::builder()
        .filter_level(default_level)
        .filter_module("selectors", log::LevelFilter::Warn)
        .filter_module("html5ever", log::LevelFilter::Error)
        .parse_default_env()
        .init();

    let config = CrawlerConfig::default()
        .with_pagination(cli.pagination)
        .with_cookies(cli.cookies.clone())
        .with_verbose(cli.verbose);

    let fetcher = HttpFetcher::new()?;
    let mut crawler =
        Crawler::<Vec<Element>>::new(Box::new(fetcher), cli.url.clone()).with_config(config);

    if let Some(next) = &cli.next {
        crawler = crawler.with_next_link(next)?;
    }
    for css in &cli.extract {
        crawler = crawler.with_selector(css.as_str())?;
    }

    let mut trackers: Vec<(String, StatsTracker)> = Vec::new();

    if let Some(css) = &cli.files {
        let downloader =
            FileDownloader::files(Extractor::href(css)?, downloader_config(&cli, "files"))?;
        trackers.push(("File".to_string(), downloader.stats()));
        crawler = crawler.with_actor(downloader);
    }

    if let Some(css) = &cli.media {
        let downloader = MediaDownloader::new(
            Extractor::href(css)?,
            MediaOptions::default(),
            downloader_config(&cli, "medias"),
        )?;
        trackers.push(("Media".to_string(), downloader.stats()));
        crawler = crawler.with_actor(downloader);
    }

    let mut batches = Box::pin(crawler.into_stream());
    let mut seen = 0;

    while let Some(batch) = batches.next().await {
        let batch = batch?;
        for page in &batch.pages {
            println!(
                "{}",
                serde_json::to_string(&json!({
                    "url": page.url.as_str(),
                    "infos": page.infos,
                }))?
            );
        }

        seen += 1;
        if cli.max_batches.is_some_and(|max| seen >= max) {
            break;
        }
    }

    for (name, tracker) in trackers {
        tracker.finish();
        tracker.print_summary(&name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie() {
        assert_eq!(
            parse_cookie("session=abc=def").unwrap(),
            ("session".to_string(), "abc=def".to_string())
        );
        assert!(parse_cookie("novalue").is_err());
        assert!(parse_cookie("=x").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "pagescrape",
            "https://example.com/list",
            "--next",
            "a.next",
            "-e",
            "h1",
            "-e",
            "table tr:nth-child(2)",
            "--cookie",
            "session=abc",
        ])
        .unwrap();

        assert_eq!(cli.extract.len(), 2);
        assert_eq!(cli.pagination, 10);
        assert_eq!(cli.workers, 10);
        assert_eq!(cli.cookies, vec![("session".to_string(), "abc".to_string())]);
    }
}
