//! Network adapters and probes for the Utflykt pipeline.
//!
//! Responsibilities:
//! - Validate outbound links with bounded concurrency.
//! - Enrich records from their websites' OpenGraph metadata.
//! - Adapt open-data feeds, Overpass API queries, calendar feeds, and
//!   bounded municipal crawls into candidate place records.
//!
//! Boundaries:
//! - Domain rules live in `utflykt-core`; this crate only produces and
//!   annotates records.
//! - Every adapter fails soft: a dead feed yields an error value the
//!   orchestrator logs, never a panic or an aborted run.

use std::time::Duration;

use thiserror::Error;

pub mod crawl;
pub mod dataset;
pub mod enrich;
pub mod events;
pub mod linkcheck;
pub mod overpass;

pub use crawl::{CrawlLimits, MunicipalCrawler};
pub use dataset::DatasetSource;
pub use enrich::OpenGraphEnricher;
pub use events::{Event, fetch_events};
pub use linkcheck::LinkChecker;
pub use overpass::OverpassSource;

/// Identifying user agent sent with every outbound request.
pub const USER_AGENT: &str = "UtflyktBot/0.1 (+https://github.com/leynos/utflykt)";

/// Default per-request timeout for adapter and probe traffic.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Failure while constructing the shared HTTP client.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    /// The underlying client builder rejected its configuration.
    #[error("failed to build HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// Build the HTTP client shared by adapters and probes.
///
/// Redirects are followed transparently (the client's default policy);
/// each request carries its own timeout so a stalled server can only hold
/// one concurrency slot.
pub fn build_client() -> Result<reqwest::Client, ClientBuildError> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?;
    Ok(client)
}
