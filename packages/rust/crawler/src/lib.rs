//! Page fetching, catalog traversal, and enrichment page adapters.
//!
//! This crate provides:
//! - [`session`] — the [`PageSource`] capability, its HTTP implementation, and the scoped [`Session`]
//! - [`page`] — element lookup, text and attribute extraction on a fetched [`Page`]
//! - [`catalog`] — sequential, throttled traversal of an expansion's listing pages
//! - [`adapters`] — per-pass readers for the tournament and price pages
//! - [`throttle`] — the randomized pause enforced before every fetch

pub mod adapters;
pub mod catalog;
pub mod page;
pub mod session;
pub mod throttle;

pub use adapters::{
    EnrichmentAdapter, Fields, PriceTrendAdapter, TournamentUsageAdapter, adapter_for,
};
pub use catalog::{
    CatalogCrawler, CatalogSelectors, CrawlProgress, SilentCrawlProgress, parse_page_count,
};
pub use page::Page;
pub use session::{HttpPageSource, PageSource, Session};
pub use throttle::Throttle;
