//! End-to-end `add` pipeline: expansion → catalog crawl → append-merge → dataset.

use std::ops::Range;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument};

use cardtrack_crawler::{CatalogCrawler, CrawlProgress, PageSource, Session};
use cardtrack_shared::{CrawlConfig, Result};
use cardtrack_storage::DatasetStore;

/// Configuration for the `add_expansions` pipeline.
#[derive(Debug, Clone)]
pub struct AddExpansionConfig {
    /// Persisted dataset the new rows are merged into.
    pub dataset_path: PathBuf,
    /// Crawl configuration.
    pub crawl: CrawlConfig,
}

/// Result of merging one expansion.
#[derive(Debug, Clone)]
pub struct AddExpansionResult {
    pub expansion: String,
    /// Indices assigned to the new rows.
    pub indices: Range<usize>,
    /// Dataset size after the merge.
    pub total_rows: usize,
    pub elapsed: Duration,
}

impl AddExpansionResult {
    pub fn rows_added(&self) -> usize {
        self.indices.len()
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each catalog page or secondary page is processed.
    fn step(&self, current: usize, total: usize, detail: &str);
    /// Called when the pipeline completes.
    fn done(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn step(&self, _current: usize, _total: usize, _detail: &str) {}
    fn done(&self) {}
}

/// Crawl and merge each expansion in order.
///
/// One session serves the whole invocation and is released on every exit
/// path. Each expansion is its own load/append/save transaction: a failure
/// while crawling expansion `k` leaves the dataset exactly as the merge of
/// expansion `k - 1` wrote it.
#[instrument(skip_all, fields(expansions = expansions.len()))]
pub async fn add_expansions<S: PageSource>(
    config: &AddExpansionConfig,
    expansions: &[String],
    source: S,
    progress: &dyn ProgressReporter,
) -> Result<Vec<AddExpansionResult>> {
    let session = Session::open(source);
    let crawler = CatalogCrawler::new(config.crawl.clone());
    let store = DatasetStore::new(&config.dataset_path);

    let mut results = Vec::with_capacity(expansions.len());
    for expansion in expansions {
        let result = add_expansion(&crawler, &session, &store, expansion, progress).await?;
        results.push(result);
    }

    session.close();
    progress.done();
    Ok(results)
}

/// Crawl one expansion and append its rows to the dataset.
async fn add_expansion<S: PageSource>(
    crawler: &CatalogCrawler,
    session: &Session<S>,
    store: &DatasetStore,
    expansion: &str,
    progress: &dyn ProgressReporter,
) -> Result<AddExpansionResult> {
    let start = Instant::now();

    // Load first so a malformed dataset fails before any fetch.
    progress.phase(&format!("Loading dataset for {expansion}"));
    let mut dataset = store.load()?;
    let existing = dataset.len();

    progress.phase(&format!("Crawling {expansion}"));
    let crawl_progress = PipelineCrawlProgress { inner: progress };
    let records = crawler.crawl(session, expansion, &crawl_progress).await?;

    progress.phase(&format!("Merging {expansion}"));
    let indices = dataset.append(&records)?;
    store.save(&dataset)?;

    let result = AddExpansionResult {
        expansion: expansion.to_string(),
        indices,
        total_rows: dataset.len(),
        elapsed: start.elapsed(),
    };

    info!(
        expansion,
        existing_rows = existing,
        rows_added = result.rows_added(),
        total_rows = result.total_rows,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "expansion merged"
    );

    Ok(result)
}

// ---------------------------------------------------------------------------
// Crawl progress adapter
// ---------------------------------------------------------------------------

/// Adapts a `ProgressReporter` to the crawler's `CrawlProgress` interface.
struct PipelineCrawlProgress<'a> {
    inner: &'a dyn ProgressReporter,
}

impl CrawlProgress for PipelineCrawlProgress<'_> {
    fn pages_resolved(&self, expansion: &str, pages: u32) {
        self.inner
            .phase(&format!("Crawling {expansion} ({pages} pages)"));
    }

    fn page_done(&self, page: u32, pages: u32, rows: usize) {
        self.inner
            .step(page as usize, pages as usize, &format!("{rows} rows"));
    }
}
