//! CSV-backed storage for the card dataset.
//!
//! [`DatasetStore`] owns the persisted, append-only [`Dataset`]. Callers run
//! scoped transactions: `load`, mutate in memory with [`Dataset::append`] or
//! [`Dataset::patch`], then `save` once. A row's position is its durable index.
//!
//! [`WorkingSubset`] is the read-only lookup table that maps a dataset index to
//! the keys enrichment passes need.

mod dataset;
mod working;

pub use dataset::{Dataset, DatasetStore};
pub use working::{WorkingRow, WorkingSubset};
