//! Enrichment passes: patch secondary attributes onto existing dataset rows.
//!
//! For each requested index the row's lookup keys come from the working
//! subset, the secondary page is fetched (one at a time, throttled), and the
//! pass's columns are written onto that row. The dataset is saved once at the
//! end; a failure anywhere leaves the file as it was.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument};
use url::Url;

use cardtrack_crawler::{EnrichmentAdapter, PageSource, Session, Throttle, adapter_for};
use cardtrack_shared::{CardtrackError, EnrichConfig, EnrichmentKind, Result};
use cardtrack_storage::{Dataset, DatasetStore, WorkingSubset};

use crate::pipeline::ProgressReporter;

/// Configuration for one enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichmentRun {
    pub kind: EnrichmentKind,
    pub dataset_path: PathBuf,
    pub working_subset_path: PathBuf,
    pub config: EnrichConfig,
}

/// Summary of a completed enrichment run.
#[derive(Debug, Clone)]
pub struct EnrichmentReport {
    pub kind: EnrichmentKind,
    /// Indices patched, in processing order.
    pub enriched: Vec<usize>,
    pub elapsed: Duration,
}

/// Load, enrich `indices`, save.
///
/// Every index is resolved against the working subset and the dataset before
/// the first fetch. A single unknown index fails the whole batch with
/// [`CardtrackError::LookupMiss`] and nothing is fetched or written.
#[instrument(skip_all, fields(kind = %run.kind, indices = indices.len()))]
pub async fn run_enrichment<S: PageSource>(
    run: &EnrichmentRun,
    indices: &[usize],
    source: S,
    progress: &dyn ProgressReporter,
) -> Result<EnrichmentReport> {
    let start = Instant::now();
    let session = Session::open(source);

    progress.phase("Loading dataset");
    let store = DatasetStore::new(&run.dataset_path);
    let subset = WorkingSubset::load(&run.working_subset_path)?;
    let mut dataset = store.load()?;

    let adapter = adapter_for(run.kind, &run.config);
    let throttle = Throttle::new(run.config.delay);

    let enriched = enrich_dataset(
        &mut dataset,
        &subset,
        adapter.as_ref(),
        &session,
        &throttle,
        indices,
        progress,
    )
    .await?;
    session.close();

    progress.phase("Saving dataset");
    store.save(&dataset)?;

    let report = EnrichmentReport {
        kind: run.kind,
        enriched,
        elapsed: start.elapsed(),
    };
    progress.done();

    info!(
        kind = %report.kind,
        rows = report.enriched.len(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "enrichment completed"
    );
    Ok(report)
}

/// Enrich `indices` of an in-memory dataset.
///
/// Each row is patched only once all of its fields have been extracted, so a
/// row is never left half-written.
pub async fn enrich_dataset<S: PageSource>(
    dataset: &mut Dataset,
    subset: &WorkingSubset,
    adapter: &dyn EnrichmentAdapter,
    session: &Session<S>,
    throttle: &Throttle,
    indices: &[usize],
    progress: &dyn ProgressReporter,
) -> Result<Vec<usize>> {
    let targets = resolve_targets(dataset, subset, adapter, indices)?;
    let total = targets.len();
    progress.phase(&format!("Enriching {} ({total} rows)", adapter.kind()));

    for (i, (index, url)) in targets.iter().enumerate() {
        throttle.pause().await;
        let fields = {
            let page = session.page(url).await?;
            adapter.extract(&page)?
        };
        debug!(index, ?fields, "row enriched");
        dataset.patch(*index, &fields)?;
        progress.step(i + 1, total, &format!("index {index}"));
    }

    Ok(targets.into_iter().map(|(index, _)| index).collect())
}

/// Map every index to its secondary-page URL, failing on the first unknown one.
fn resolve_targets(
    dataset: &Dataset,
    subset: &WorkingSubset,
    adapter: &dyn EnrichmentAdapter,
    indices: &[usize],
) -> Result<Vec<(usize, Url)>> {
    indices
        .iter()
        .map(|&index| {
            let row = subset.lookup(index)?;
            if index >= dataset.len() {
                return Err(CardtrackError::validation(format!(
                    "working subset index {index} is beyond the dataset ({} rows)",
                    dataset.len()
                )));
            }
            Ok((index, adapter.page_url(row)?))
        })
        .collect()
}
