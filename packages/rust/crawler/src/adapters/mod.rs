//! Enrichment page adapters.
//!
//! Each adapter knows where the secondary page for a working-subset row lives
//! and how to read the target columns off it. Adapters are pure: fetching and
//! throttling belong to the caller.

mod prices;
mod tournaments;

use url::Url;

use cardtrack_shared::{EnrichConfig, EnrichmentKind, Result};
use cardtrack_storage::WorkingRow;

use crate::page::Page;

pub use prices::PriceTrendAdapter;
pub use tournaments::TournamentUsageAdapter;

/// Column/value pairs read from one secondary page.
pub type Fields = Vec<(&'static str, String)>;

/// Trait for one enrichment source.
pub trait EnrichmentAdapter: Send + Sync {
    /// The pass this adapter serves.
    fn kind(&self) -> EnrichmentKind;

    /// URL of the secondary page for `row`.
    fn page_url(&self, row: &WorkingRow) -> Result<Url>;

    /// Read this pass's columns from the fetched page.
    fn extract(&self, page: &Page) -> Result<Fields>;
}

/// Build the adapter for `kind`.
pub fn adapter_for(kind: EnrichmentKind, config: &EnrichConfig) -> Box<dyn EnrichmentAdapter> {
    match kind {
        EnrichmentKind::Tournaments => Box::new(TournamentUsageAdapter::new(
            config.tournaments_base.clone(),
            config.tournaments_query.clone(),
        )),
        EnrichmentKind::Prices => Box::new(PriceTrendAdapter),
    }
}
