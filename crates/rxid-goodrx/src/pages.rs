//! Page automation boundary.
//!
//! A [`PageFetcher`] is whatever drives the browser: it navigates to a URL,
//! waits for a selector to render, and hands back the extracted payload as
//! JSON text. The catalog never touches the DOM itself.

use std::collections::HashMap;
use std::sync::Mutex;

use rxid_core::CatalogError;
use thiserror::Error;
use url::Url;

/// Page automation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    #[error("Selector never appeared: {0}")]
    MissingSelector(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page load timed out: {0}")]
    Timeout(String),

    #[error("Unreadable page payload: {0}")]
    Payload(String),

    #[error("Invalid page URL: {0}")]
    InvalidUrl(String),
}

pub type PageResult<T> = Result<T, PageError>;

impl From<serde_json::Error> for PageError {
    fn from(e: serde_json::Error) -> Self {
        PageError::Payload(e.to_string())
    }
}

impl From<url::ParseError> for PageError {
    fn from(e: url::ParseError) -> Self {
        PageError::InvalidUrl(e.to_string())
    }
}

impl PageError {
    /// Map onto the catalog error vocabulary for `subject` (a drug name or coupon path).
    pub fn into_catalog_error(self, subject: &str) -> CatalogError {
        match self {
            PageError::MissingSelector(_) => CatalogError::NotFound(subject.to_string()),
            PageError::Timeout(detail) => CatalogError::Timeout(format!("{}: {}", subject, detail)),
            other => CatalogError::Lookup(format!("{}: {}", subject, other)),
        }
    }
}

/// What to pull out of a page once it has rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Inner HTML of the first element matching the selector, itself JSON.
    ElementJson(&'static str),
    /// Every `.price-row` as `{name, price, href}` objects.
    PriceRows,
    /// A global on `window`, serialized as JSON.
    WindowValue(&'static str),
}

/// One page visit.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub url: Url,
    /// Selector that signals the page is ready
    pub wait_for: &'static str,
    pub extract: Extraction,
}

/// Drives a page and returns the extracted payload as JSON text.
///
/// Implementations own their browser, tabs and timeouts. A selector that
/// never shows up must surface as [`PageError::MissingSelector`] so callers
/// can tell "no such drug" apart from infrastructure failures.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, query: &PageQuery) -> PageResult<String>;
}

/// Canned pages keyed by URL, for tests and offline runs.
///
/// Unknown URLs behave like a page where the ready selector never appears.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    pages: HashMap<String, PageResult<String>>,
    visited: Mutex<Vec<PageQuery>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `payload` for `url`.
    pub fn with_page(mut self, url: &str, payload: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), Ok(payload.into()));
        self
    }

    /// Fail every visit to `url` with `error`.
    pub fn with_failure(mut self, url: &str, error: PageError) -> Self {
        self.pages.insert(url.to_string(), Err(error));
        self
    }

    /// Queries seen so far, in order.
    pub fn visited(&self) -> Vec<PageQuery> {
        self.visited
            .lock()
            .map(|visited| visited.clone())
            .unwrap_or_default()
    }
}

impl PageFetcher for FixtureFetcher {
    fn fetch(&self, query: &PageQuery) -> PageResult<String> {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(query.clone());
        }

        match self.pages.get(query.url.as_str()) {
            Some(page) => page.clone(),
            None => Err(PageError::MissingSelector(query.wait_for.to_string())),
        }
    }
}
