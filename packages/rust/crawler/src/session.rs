//! Page sources and the scoped session that owns one for a pipeline run.
//!
//! [`PageSource`] is the navigation half of the page capability: given a URL
//! it returns the document HTML. [`HttpPageSource`] is the production source.
//! A [`Session`] wraps a source for exactly one run and guarantees that
//! [`PageSource::close`] is called once, on success and on every error path.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};
use url::Url;

use cardtrack_shared::{CardtrackError, Result};

use crate::page::Page;

/// User-Agent string for page requests.
const USER_AGENT: &str = concat!("cardtrack/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// PageSource
// ---------------------------------------------------------------------------

/// Something that can load a page by URL.
pub trait PageSource {
    /// Navigate to `url` and return the document HTML.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String>> + Send;

    /// Release whatever the source holds. Called once by [`Session`].
    fn close(&mut self) {}

    /// Human-readable source name for tracing.
    fn name(&self) -> &str;
}

/// Plain HTTP page source.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()
            .map_err(|e| CardtrackError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| CardtrackError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CardtrackError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| CardtrackError::Network(format!("{url}: body read failed: {e}")))
    }

    fn name(&self) -> &str {
        "http"
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One page source, held for the duration of a single run.
pub struct Session<S: PageSource> {
    source: S,
    closed: bool,
}

impl<S: PageSource> Session<S> {
    pub fn open(source: S) -> Self {
        info!(source = source.name(), "session opened");
        Self {
            source,
            closed: false,
        }
    }

    /// Fetch and parse the page at `url`.
    pub async fn page(&self, url: &Url) -> Result<Page> {
        let html = self.source.fetch(url).await?;
        Ok(Page::parse(url.clone(), &html))
    }

    /// Close the session now instead of at drop.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.source.close();
            info!(source = self.source.name(), "session closed");
        }
    }
}

impl<S: PageSource> Drop for Session<S> {
    fn drop(&mut self) {
        self.release();
    }
}
