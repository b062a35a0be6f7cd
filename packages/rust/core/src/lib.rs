//! Pipeline orchestration for cardtrack.
//!
//! This crate ties the crawler and the dataset store together into the
//! end-to-end workflows: crawl-and-merge of new expansions
//! ([`pipeline::add_expansions`]) and the enrichment passes
//! ([`enrichment::run_enrichment`]), plus the selection of rows that still
//! need enriching ([`selection`]).

pub mod enrichment;
pub mod pipeline;
pub mod selection;

#[cfg(test)]
pub(crate) mod testing;
