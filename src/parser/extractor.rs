use scraper::Selector;
use std::fmt;
use std::sync::Arc;
use url::Url;

use super::{Document, Element};
use crate::{ScraperError, ScraperResult};

pub type ExtractFn<T> = dyn Fn(&Document) -> Option<T> + Send + Sync;

/// A rule pulling zero-or-one value out of a [`Document`].
///
/// Selector-based extractors are compiled once, when built, so a malformed selector
/// fails before the first page is fetched.
pub struct Extractor<T> {
    func: Arc<ExtractFn<T>>,
    selector: Option<String>,
}

impl<T> Clone for Extractor<T> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            selector: self.selector.clone(),
        }
    }
}

impl<T> fmt::Debug for Extractor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            Some(selector) => write!(f, "Extractor({:?})", selector),
            None => f.write_str("Extractor(<fn>)"),
        }
    }
}

impl<T: 'static> Extractor<T> {
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&Document) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            selector: None,
        }
    }

    pub fn extract(&self, document: &Document) -> Option<T> {
        (self.func)(document)
    }

    /// Selector text after rewriting, when built from a selector.
    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// Chains a further step; `None` from either step is absent.
    pub fn map<U, F>(self, func: F) -> Extractor<U>
    where
        U: 'static,
        F: Fn(T) -> Option<U> + Send + Sync + 'static,
    {
        let inner = self.func;
        Extractor {
            func: Arc::new(move |document: &Document| inner(document).and_then(&func)),
            selector: self.selector,
        }
    }

    fn compiled<F>(css: &str, func: F) -> ScraperResult<Self>
    where
        F: Fn(&Document, &Selector) -> Option<T> + Send + Sync + 'static,
    {
        let rewritten = rewrite_selector(css);
        let selector = Selector::parse(&rewritten).map_err(|e| ScraperError::ExtractorConfig {
            selector: css.to_string(),
            message: format!("{:?}", e),
        })?;

        Ok(Self {
            func: Arc::new(move |document: &Document| func(document, &selector)),
            selector: Some(rewritten),
        })
    }
}

impl Extractor<Vec<Element>> {
    /// All matches of `css`; an empty list (not absent) when nothing matches.
    pub fn css(css: &str) -> ScraperResult<Self> {
        Self::compiled(css, |document, selector| Some(document.select(selector)))
    }
}

impl Extractor<String> {
    /// Trimmed text of the first match.
    pub fn text(css: &str) -> ScraperResult<Self> {
        Self::compiled(css, |document, selector| {
            document
                .html()
                .select(selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .filter(|text| !text.is_empty())
        })
    }

    /// Value of `attr` on the first match carrying it.
    pub fn attr(css: &str, attr: &str) -> ScraperResult<Self> {
        let attr = attr.to_string();
        Self::compiled(css, move |document, selector| {
            document
                .html()
                .select(selector)
                .find_map(|element| element.value().attr(&attr).map(str::to_string))
        })
    }

    /// `href` of the first match, made absolute against the page URL.
    pub fn href(css: &str) -> ScraperResult<Self> {
        Ok(Extractor::<Url>::link(css)?.map(|url| Some(url.to_string())))
    }
}

impl Extractor<Url> {
    /// First matching link, resolved against the page URL. Usable as a next-url rule.
    pub fn link(css: &str) -> ScraperResult<Self> {
        Self::compiled(css, |document, selector| {
            document
                .html()
                .select(selector)
                .find_map(|element| element.value().attr("href"))
                .and_then(|href| document.resolve(href))
        })
    }
}

/// `nth-child` is rewritten to `nth-of-type`, matching the behaviour callers rely on
/// when they paste selectors copied from browser dev tools.
pub fn rewrite_selector(css: &str) -> String {
    css.replace("nth-child", "nth-of-type")
}

/// Either a selector string or an already-built extractor.
#[derive(Debug, Clone)]
pub enum ExtractorSpec {
    Selector(String),
    Function(Extractor<Vec<Element>>),
}

impl From<&str> for ExtractorSpec {
    fn from(css: &str) -> Self {
        Self::Selector(css.to_string())
    }
}

impl From<String> for ExtractorSpec {
    fn from(css: String) -> Self {
        Self::Selector(css)
    }
}

impl From<Extractor<Vec<Element>>> for ExtractorSpec {
    fn from(extractor: Extractor<Vec<Element>>) -> Self {
        Self::Function(extractor)
    }
}

/// Turns a selector or an extractor into the functional form. Extractors are returned unchanged.
pub fn normalize(spec: impl Into<ExtractorSpec>) -> ScraperResult<Extractor<Vec<Element>>> {
    match spec.into() {
        ExtractorSpec::Selector(css) => Extractor::css(&css),
        ExtractorSpec::Function(extractor) => Ok(extractor),
    }
}
