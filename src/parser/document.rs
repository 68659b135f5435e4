use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

use crate::HttpResponse;

/// One fetched page, parsed. Lives for a single fetch/extract/feed cycle.
pub struct Document {
    url: Url,
    html: Html,
}

impl Document {
    pub fn parse(url: Url, body: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(body),
        }
    }

    pub fn from_response(response: &HttpResponse) -> Self {
        Self::parse(response.url.clone(), &response.body)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Owned snapshots of every element matching `selector`, in document order.
    pub fn select(&self, selector: &Selector) -> Vec<Element> {
        self.html.select(selector).map(Element::from).collect()
    }

    /// Resolves a possibly relative link against the page URL.
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.url.join(href.trim()).ok()
    }
}

/// A matched node copied out of its [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    pub text: String,
    pub html: String,
    pub attrs: BTreeMap<String, String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

impl<'a> From<ElementRef<'a>> for Element {
    fn from(element: ElementRef<'a>) -> Self {
        Self {
            name: element.value().name().to_string(),
            text: element.text().collect::<String>(),
            html: element.inner_html(),
            attrs: element
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
