//! Record sources (fetch tiers)
//!
//! Each tier implements [`RecordSource`] and is injected into the
//! [`RecordFetcher`](crate::record_fetcher::RecordFetcher) in any order; the
//! fetcher sorts them by [`SourceKind`] precedence.
//!
//! # Tiers
//! 1. **structured** - stats API (`commonplayerinfo`, `playercareerstats`)
//! 2. **page** - rendered profile page through the field extractor
//! 3. **static_table** - hand-curated values for a small allow-list
//!
//! A tier reports "nothing for this identifier" as `Ok(None)` and transport
//! or decoding problems as `Err`; the fetcher treats both as "no data" and
//! moves on.

pub mod page;
pub mod static_table;
pub mod structured;

pub use page::PageExtraction;
pub use static_table::StaticTable;
pub use structured::StructuredEndpoint;

use crate::error::SourceError;
use crate::types::{CanonicalRecord, SourceKind, StatSeries};
use async_trait::async_trait;

/// One fetch tier
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Tier identity, used for precedence and provenance
    fn kind(&self) -> SourceKind;

    /// Detail record for `identifier`, attributed to [`kind`](Self::kind)
    async fn fetch_record(&self, identifier: &str) -> Result<Option<CanonicalRecord>, SourceError>;

    /// Per-season rows for `identifier`
    ///
    /// Tiers that never carry series data return `Ok(None)`.
    async fn fetch_series(&self, identifier: &str) -> Result<Option<StatSeries>, SourceError>;
}
