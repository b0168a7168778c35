//! This is intended to serve as a binary crate.
//!
//! Fetches an XML sitemap, probes every listed page with a timed GET,
//! and reports latency statistics. Please see README for more information.
pub mod probe;
pub mod report;
pub mod schedule;
pub mod sitemap;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to obtain a usable URL list from the sitemap.
///
/// All variants are fatal to the run: no probes are attempted.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("sitemap request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("sitemap request returned {0}")]
    Status(StatusCode),
    #[error("sitemap is not valid XML: {0}")]
    Parse(#[from] roxmltree::Error),
}
