//! Collaborator traits implemented by network adapters.
//!
//! Sources and enrichers fail soft by contract: an error is a value the
//! orchestrator logs and absorbs, never a reason to abort the run. Keeping
//! the failure in the signature makes each degraded batch observable
//! instead of silently swallowed.

use async_trait::async_trait;
use thiserror::Error;

use crate::place::Place;

/// Failure while fetching or decoding one source's candidate stream.
///
/// Transport details stay behind a message so this crate does not depend on
/// any HTTP client; adapters attach the failing URL for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The upstream resource could not be retrieved.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Resource that was requested.
        url: String,
        /// Transport-level failure description.
        message: String,
    },
    /// The payload was retrieved but could not be decoded.
    #[error("failed to decode payload from {url}: {message}")]
    Decode {
        /// Resource whose payload failed to decode.
        url: String,
        /// Decoder failure description.
        message: String,
    },
}

/// Failure while enriching a single record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichError {
    /// The record's page could not be retrieved.
    #[error("failed to fetch {url}: {message}")]
    Fetch {
        /// Page that was requested.
        url: String,
        /// Transport-level failure description.
        message: String,
    },
}

/// A named source adapter producing candidate place records.
///
/// Every record must populate at least one of `name` / `link`, and records
/// lacking usable coordinates are omitted where coordinates are required
/// downstream.
#[async_trait]
pub trait PlaceSource: Send + Sync {
    /// Short source name used in reports and provenance.
    fn name(&self) -> &str;

    /// Fetch the candidate stream.
    ///
    /// Errors describe one failed batch; they never cascade beyond this
    /// source.
    async fn fetch(&self) -> Result<Vec<Place>, SourceError>;
}

/// Best-effort per-record enrichment over the record's link.
///
/// Implementations must not overwrite already-populated scalar fields.
#[async_trait]
pub trait Enricher: Send + Sync {
    /// Enrich `place` in place.
    ///
    /// Returns whether a page was actually fetched, so the caller can
    /// account the enrichment budget; records without a link return
    /// `Ok(false)`.
    async fn enrich(&self, place: &mut Place) -> Result<bool, EnrichError>;
}
