use futures::stream::{self, Stream};
use log::{debug, info};
use url::Url;

use super::{CrawlerConfig, ScraperResult};
use crate::actors::Actor;
use crate::fetchers::Fetcher;
use crate::parser::{normalize, Document, Element, Extractor, ExtractorSpec};
use crate::HttpResponse;

/// What one page yielded.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub url: Url,
    /// Extractor results in registration order, absent ones left out.
    pub infos: Vec<T>,
    pub next_url: Option<Url>,
}

/// Pages walked by one `next_batch` call, in visiting order.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub pages: Vec<Page<T>>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn info_lists(&self) -> Vec<&[T]> {
        self.pages.iter().map(|page| page.infos.as_slice()).collect()
    }

    pub fn into_info_lists(self) -> Vec<Vec<T>> {
        self.pages.into_iter().map(|page| page.infos).collect()
    }
}

/// Walks a chain of listing pages.
///
/// Each page is fetched, every extractor runs on it, every actor is fed, and the
/// next-url rule picks the following page. Pages are grouped into batches of
/// `pagination` pages; actors are consumed once at the end of each batch.
///
/// The crawler is exhausted once the next-url rule yields nothing (or there is no
/// such rule). A rule that keeps pointing back at the same page never exhausts the
/// crawl, so callers walking such sites must bound the number of batches themselves.
///
/// A fetch error propagates out of `next_batch` as is: the cursor stays on the page
/// that failed and actors already fed during that batch keep their pending URLs.
pub struct Crawler<T = Vec<Element>> {
    fetcher: Box<dyn Fetcher>,
    current: Option<Url>,
    next_url: Option<Extractor<Url>>,
    extractors: Vec<Extractor<T>>,
    actors: Vec<Box<dyn Actor>>,
    config: CrawlerConfig,
}

impl<T: Send + 'static> Crawler<T> {
    pub fn new(fetcher: Box<dyn Fetcher>, seed: Url) -> Self {
        Self {
            fetcher,
            current: Some(seed),
            next_url: None,
            extractors: Vec::new(),
            actors: Vec::new(),
            config: CrawlerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CrawlerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_next_url(mut self, extractor: Extractor<Url>) -> Self {
        self.next_url = Some(extractor);
        self
    }

    /// Follows the first link matching `css` from page to page.
    pub fn with_next_link(self, css: &str) -> ScraperResult<Self> {
        Ok(self.with_next_url(Extractor::link(css)?))
    }

    pub fn with_extractor(mut self, extractor: Extractor<T>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn with_extractors(mut self, extractors: impl IntoIterator<Item = Extractor<T>>) -> Self {
        self.extractors.extend(extractors);
        self
    }

    pub fn with_actor(mut self, actor: impl Actor + 'static) -> Self {
        self.actors.push(Box::new(actor));
        self
    }

    pub fn with_boxed_actor(mut self, actor: Box<dyn Actor>) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    pub fn actors(&self) -> &[Box<dyn Actor>] {
        &self.actors
    }

    /// Runs one page through extractors, actors and the next-url rule. The parsed
    /// document never outlives this call.
    fn process(&mut self, url: Url, response: &HttpResponse) -> Page<T> {
        let document = Document::from_response(response);

        let infos = self
            .extractors
            .iter()
            .filter_map(|extractor| extractor.extract(&document))
            .collect();

        for actor in self.actors.iter_mut() {
            actor.feed(&document);
        }

        let next_url = self
            .next_url
            .as_ref()
            .and_then(|extractor| extractor.extract(&document));

        Page {
            url,
            infos,
            next_url,
        }
    }

    async fn visit(&mut self, url: Url) -> ScraperResult<Page<T>> {
        if self.config.verbose {
            info!("[scrapper] {}", url);
        } else {
            debug!("[scrapper] {}", url);
        }

        let response = self.fetcher.fetch(&url, &self.config).await?;
        Ok(self.process(url, &response))
    }

    async fn consume_actors(&mut self) {
        for actor in self.actors.iter_mut() {
            debug!("Consuming actor {}", actor.name());
            actor.consume().await;
        }
    }

    /// Fetches the page under the cursor and moves the cursor to the next one.
    /// Returns `None` once exhausted.
    pub async fn step(&mut self) -> ScraperResult<Option<Page<T>>> {
        let Some(url) = self.current.clone() else {
            return Ok(None);
        };

        let page = self.visit(url).await?;
        self.current = page.next_url.clone();
        Ok(Some(page))
    }

    /// Up to `pagination` steps, then one `consume` per actor in registration order.
    /// Returns `None` when the crawler was already exhausted.
    pub async fn next_batch(&mut self) -> ScraperResult<Option<Batch<T>>> {
        if self.is_exhausted() {
            return Ok(None);
        }

        let pagination = self.config.pagination.max(1);
        let mut pages = Vec::with_capacity(pagination);
        for _ in 0..pagination {
            match self.step().await? {
                Some(page) => pages.push(page),
                None => break,
            }
        }

        debug!(
            "Batch of {} pages done, consuming {} actors",
            pages.len(),
            self.actors.len()
        );
        self.consume_actors().await;

        Ok(Some(Batch { pages }))
    }

    /// Walks the crawl to its end.
    pub async fn run(&mut self) -> ScraperResult<Vec<Batch<T>>> {
        let mut batches = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            batches.push(batch);
        }
        Ok(batches)
    }

    /// One fetch/extract/feed cycle on `url` (the cursor's page when `None`), then
    /// every actor is consumed. The cursor is left where it was.
    pub async fn page(&mut self, url: Option<Url>) -> ScraperResult<Option<Page<T>>> {
        let Some(url) = url.or_else(|| self.current.clone()) else {
            return Ok(None);
        };

        let page = self.visit(url).await?;
        self.consume_actors().await;
        Ok(Some(page))
    }

    /// The crawl as a lazy stream of batches. It ends when the crawler is exhausted,
    /// or right after yielding the first error.
    pub fn into_stream(self) -> impl Stream<Item = ScraperResult<Batch<T>>> + Send {
        stream::unfold(Some(self), |state| async move {
            let mut crawler = state?;
            match crawler.next_batch().await {
                Ok(Some(batch)) => Some((Ok(batch), Some(crawler))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl Crawler<Vec<Element>> {
    /// Adds a selector (or an already built extractor) as an info extractor.
    /// Selectors are compiled here, so a malformed one fails immediately.
    pub fn with_selector(self, spec: impl Into<ExtractorSpec>) -> ScraperResult<Self> {
        Ok(self.with_extractor(normalize(spec)?))
    }
}

/// Infos of a single page, without batching or a next-url rule.
pub async fn extract<T: Send + 'static>(
    fetcher: Box<dyn Fetcher>,
    url: Url,
    extractors: Vec<Extractor<T>>,
    config: CrawlerConfig,
) -> ScraperResult<Vec<T>> {
    let mut crawler = Crawler::new(fetcher, url)
        .with_config(config)
        .with_extractors(extractors);

    Ok(crawler
        .page(None)
        .await?
        .map(|page| page.infos)
        .unwrap_or_default())
}

/// [`extract`] for selector strings; each selector yields its list of matches.
pub async fn extract_selectors(
    fetcher: Box<dyn Fetcher>,
    url: Url,
    selectors: &[&str],
    config: CrawlerConfig,
) -> ScraperResult<Vec<Vec<Element>>> {
    let extractors = selectors
        .iter()
        .map(|css| normalize(*css))
        .collect::<ScraperResult<Vec<_>>>()?;

    extract(fetcher, url, extractors, config).await
}
