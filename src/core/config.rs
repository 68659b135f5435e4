use std::collections::BTreeMap;

pub const DEFAULT_PAGINATION: usize = 10;

/// Per-crawler settings. Cookies and headers are read-only for the whole crawl.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub cookies: BTreeMap<String, String>,
    pub headers: Vec<(String, String)>,
    pub pagination: usize,
    pub verbose: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            cookies: BTreeMap::new(),
            headers: Vec::new(),
            pagination: DEFAULT_PAGINATION,
            verbose: false,
        }
    }
}

impl CrawlerConfig {
    /// Number of pages walked per batch. Zero is treated as one.
    pub fn with_pagination(mut self, pagination: usize) -> Self {
        self.pagination = pagination.max(1);
        self
    }

    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    pub fn with_cookies<I, K, V>(mut self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cookies
            .extend(cookies.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_headers(mut self, headers: Vec<(&str, &str)>) -> Self {
        self.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Value of the `Cookie` header, if any cookie is configured.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }

        Some(
            self.cookies
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.pagination, 10);
        assert!(config.cookies.is_empty());
        assert!(config.cookie_header().is_none());
    }

    #[test]
    fn test_pagination_is_at_least_one() {
        assert_eq!(CrawlerConfig::default().with_pagination(0).pagination, 1);
        assert_eq!(CrawlerConfig::default().with_pagination(3).pagination, 3);
    }

    #[test]
    fn test_cookie_header() {
        let config = CrawlerConfig::default()
            .with_cookie("session", "abc")
            .with_cookies([("lang", "zh")]);
        assert_eq!(config.cookie_header().as_deref(), Some("lang=zh; session=abc"));
    }
}
