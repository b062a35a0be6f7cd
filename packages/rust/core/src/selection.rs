//! Choosing which rows an enrichment pass still has to visit.

use tracing::debug;

use cardtrack_shared::{EnrichmentKind, Result, complement, intersect, split};
use cardtrack_storage::{Dataset, WorkingSubset};

/// Working-subset indices whose `kind` marker column is still empty.
///
/// Indices beyond the dataset are dropped, duplicates keep their first
/// occurrence, and the subset's order is preserved.
pub fn pending_indices(
    dataset: &Dataset,
    subset: &WorkingSubset,
    kind: EnrichmentKind,
) -> Vec<usize> {
    let mut candidates = subset.indices();
    let mut seen = Vec::with_capacity(candidates.len());
    candidates.retain(|i| {
        if seen.contains(i) {
            false
        } else {
            seen.push(*i);
            true
        }
    });

    let present: Vec<usize> = (0..dataset.len()).collect();
    let in_dataset = intersect(&candidates, &present);
    let filled = dataset.filled_indices(kind.marker_column());
    let pending = complement(&in_dataset, &filled);

    debug!(
        kind = %kind,
        subset = candidates.len(),
        filled = filled.len(),
        pending = pending.len(),
        "pending rows selected"
    );
    pending
}

/// [`pending_indices`] split into batches of `size`.
pub fn pending_batches(
    dataset: &Dataset,
    subset: &WorkingSubset,
    kind: EnrichmentKind,
    size: usize,
) -> Result<Vec<Vec<usize>>> {
    split(&pending_indices(dataset, subset, kind), size)
}
