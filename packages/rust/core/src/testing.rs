//! In-memory page source and fixtures for pipeline tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use url::Url;

use cardtrack_crawler::PageSource;
use cardtrack_shared::{CardtrackError, Record, Result};

/// Serves canned HTML keyed by URL (fragment ignored) and records every fetch.
#[derive(Clone, Default)]
pub struct FakeSource {
    pages: HashMap<String, String>,
    pub fetched: Arc<Mutex<Vec<String>>>,
    pub closes: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(key(url), html.into());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl PageSource for FakeSource {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let k = key(url.as_str());
        if let Ok(mut fetched) = self.fetched.lock() {
            fetched.push(k.clone());
        }
        self.pages
            .get(&k)
            .cloned()
            .ok_or_else(|| CardtrackError::Network(format!("{k}: HTTP 404 Not Found")))
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn key(url: &str) -> String {
    url.split('#').next().unwrap_or(url).to_string()
}

/// Fresh scratch directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cardtrack-{tag}-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

pub fn record(name: &str, expansion: &str) -> Record {
    Record {
        name: name.into(),
        expansion: expansion.into(),
        min_price: "0,02 €".into(),
        availability_count: "100".into(),
        rarity: "Common".into(),
        detail_url: format!("https://shop.test/en/Pokemon/Products/Singles/{expansion}/{name}"),
        expansion_release_date: "1 January 2024".into(),
    }
}
