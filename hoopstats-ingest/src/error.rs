//! Error types for hoopstats-ingest
//!
//! Tier failures ([`SourceError`]) are recovered inside the record fetcher;
//! only [`FetchError::MandatoryFieldMissing`] escapes a fetch call.

use thiserror::Error;

/// Failure of a single upstream request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("Bad status: {0}")]
    BadStatus(u16),

    /// Body could not be decoded into the expected shape
    #[error("Malformed body: {0}")]
    MalformedBody(String),
}

/// Identity resolution and disambiguation errors
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The listing could not be fetched (distinct from zero matches)
    #[error("Listing fetch failed: {0}")]
    Source(#[from] SourceError),

    #[error("No players match '{0}'")]
    NoCandidates(String),

    #[error("{count} players match '{query}'; choose one explicitly")]
    AmbiguousCandidates { query: String, count: usize },

    #[error("Selection {index} is out of range (1..={count})")]
    InvalidSelection { index: usize, count: usize },
}

/// Record cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Payload kind {actual} does not match requested kind {requested}")]
    KindMismatch {
        requested: &'static str,
        actual: &'static str,
    },
}

/// Fatal record fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every tier was exhausted without supplying a mandatory field
    #[error("Mandatory field '{field}' missing for '{identifier}' after all tiers")]
    MandatoryFieldMissing {
        identifier: String,
        field: &'static str,
    },
}

/// Name-to-record errors, surfaced by [`Ingest`](crate::Ingest)
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
