//! Shared types, error model, and configuration for cardtrack.
//!
//! This crate is the foundation depended on by all other cardtrack crates.
//! It provides:
//! - [`CardtrackError`] — the unified error type
//! - Domain types ([`Record`], [`EnrichmentKind`], column names)
//! - Row identity helpers ([`normalize_code`], [`intersect`], [`complement`]) and [`split`]
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`EnrichConfig`], config loading)

pub mod batch;
pub mod config;
pub mod error;
pub mod identity;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use batch::{DEFAULT_BATCH_SIZE, split};
pub use config::{
    AppConfig, BatchConfig, CatalogConfig, CrawlConfig, DelayRange, EnrichConfig, HttpConfig,
    PathsConfig, RateLimitConfig, TournamentsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, parse_base_url,
};
pub use error::{CardtrackError, Result};
pub use identity::{complement, intersect, normalize_code};
pub use types::{BASE_COLUMNS, EnrichmentKind, Record, columns};
