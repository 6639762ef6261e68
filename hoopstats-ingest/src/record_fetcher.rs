//! Record Fetcher
//!
//! Resolved identifier → canonical record and stat series, walking the
//! fetch tiers in precedence order and folding each tier's result through
//! [`RecordMerger`].
//!
//! # Per-call flow
//! ```text
//! cache lookup ─hit─▶ done
//!      │miss / refresh
//!      ▼
//! StructuredApi ─▶ merge ─▶ RenderedPage? ─▶ merge ─▶ FallbackTable? ─▶ merge
//!      │
//!      ▼
//! display name present? ──no──▶ MandatoryFieldMissing
//!      │yes
//!      ▼
//! fill Unknown gaps ─▶ cache put ─▶ done
//! ```
//!
//! Only results carrying structured API data are written to disk. Records
//! and series built from the page or the static table are cached for the
//! current process only.
//!
//! The first tier always runs. A later tier runs only while the record has
//! no display name or no stat value yet. A tier that fails is logged and
//! skipped; it never fails the call.

use crate::error::FetchError;
use crate::fields::{DISPLAY_NAME, OPTIONAL_FIELDS, STAT_COLUMNS};
use crate::record_cache::{CachePayload, RecordCache, RecordKind};
use crate::record_merger::RecordMerger;
use crate::source_client::DocumentSource;
use crate::sources::{PageExtraction, RecordSource, StaticTable, StructuredEndpoint};
use crate::types::{CanonicalRecord, SourceKind, StatSeries};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether a fetch may be answered from the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Use a cached entry when one exists
    #[default]
    UseCache,
    /// Ignore cached entries, fetch, and replace them
    Refresh,
}

pub struct RecordFetcher {
    /// Tiers, most trusted first
    sources: Vec<Arc<dyn RecordSource>>,
    cache: Arc<RecordCache>,
}

impl RecordFetcher {
    /// Fetcher over explicit tiers; they are ordered by precedence here
    pub fn new(mut sources: Vec<Arc<dyn RecordSource>>, cache: Arc<RecordCache>) -> Self {
        sources.sort_by_key(|source| source.kind());
        Self { sources, cache }
    }

    /// Structured API, rendered page and built-in fallback table over one client
    ///
    /// With `persist_raw` the network tiers keep upstream payloads under the
    /// cache's `raw/` directory.
    pub fn with_default_tiers(
        client: Arc<dyn DocumentSource>,
        cache: Arc<RecordCache>,
        persist_raw: bool,
    ) -> Self {
        let mut structured = StructuredEndpoint::new(Arc::clone(&client));
        let mut page = PageExtraction::new(client);
        if persist_raw {
            structured = structured.with_raw_store(Arc::clone(&cache));
            page = page.with_raw_store(Arc::clone(&cache));
        }

        let sources: Vec<Arc<dyn RecordSource>> = vec![
            Arc::new(structured),
            Arc::new(page),
            Arc::new(StaticTable::builtin()),
        ];
        Self::new(sources, cache)
    }

    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    pub async fn fetch_record(&self, identifier: &str) -> Result<CanonicalRecord, FetchError> {
        self.fetch_record_with(identifier, CachePolicy::UseCache).await
    }

    /// Fetch and merge the detail record for `identifier`
    ///
    /// Fails only when no tier supplied a display name. Optional fields no
    /// tier supplied come back `Unknown`.
    pub async fn fetch_record_with(
        &self,
        identifier: &str,
        policy: CachePolicy,
    ) -> Result<CanonicalRecord, FetchError> {
        if policy == CachePolicy::UseCache {
            if let Some(entry) = self.cache.get(identifier, RecordKind::Record).await {
                if let CachePayload::Record(record) = entry.payload {
                    info!(identifier = %identifier, stored_at = %entry.stored_at, "Record served from cache");
                    return Ok(record);
                }
            }
        }

        let mut merged: Option<CanonicalRecord> = None;

        for source in &self.sources {
            let tier = source.kind();

            if !needs_another_tier(merged.as_ref()) {
                debug!(identifier = %identifier, tier = %tier, "Record complete, skipping remaining tiers");
                break;
            }

            match source.fetch_record(identifier).await {
                Ok(Some(record)) => {
                    merged = Some(RecordMerger::merge(merged, &record, tier));
                }
                Ok(None) => {
                    debug!(identifier = %identifier, tier = %tier, "Tier had no data");
                }
                Err(e) => {
                    warn!(identifier = %identifier, tier = %tier, error = %e, "Tier failed, falling through");
                }
            }
        }

        let mut record = merged.unwrap_or_else(|| CanonicalRecord::new(identifier));

        if record.display_name().is_none() {
            warn!(identifier = %identifier, "All tiers exhausted without a display name");
            return Err(FetchError::MandatoryFieldMissing {
                identifier: identifier.to_string(),
                field: DISPLAY_NAME,
            });
        }

        for field in OPTIONAL_FIELDS {
            record.mark_unknown(field);
        }

        let unknown = record
            .attributes()
            .values()
            .filter(|value| !value.is_known())
            .count();
        info!(
            identifier = %identifier,
            display_name = record.display_name().unwrap_or_default(),
            fields = record.attributes().len(),
            unknown = unknown,
            "Record fetched"
        );

        let durable = record
            .provenance()
            .values()
            .any(|source| *source == Some(SourceKind::StructuredApi));
        self.store(
            identifier,
            RecordKind::Record,
            CachePayload::Record(record.clone()),
            durable,
        )
        .await;
        Ok(record)
    }

    pub async fn fetch_series(&self, identifier: &str) -> StatSeries {
        self.fetch_series_with(identifier, CachePolicy::UseCache).await
    }

    /// Per-season rows from the first tier that has any
    ///
    /// When no tier has rows the result is an empty series, which is not
    /// cached.
    pub async fn fetch_series_with(&self, identifier: &str, policy: CachePolicy) -> StatSeries {
        if policy == CachePolicy::UseCache {
            if let Some(entry) = self.cache.get(identifier, RecordKind::Series).await {
                if let CachePayload::Series(series) = entry.payload {
                    info!(identifier = %identifier, stored_at = %entry.stored_at, "Series served from cache");
                    return series;
                }
            }
        }

        for source in &self.sources {
            let tier = source.kind();
            match source.fetch_series(identifier).await {
                Ok(Some(series)) if !series.is_empty() => {
                    info!(identifier = %identifier, tier = %tier, seasons = series.len(), "Series fetched");
                    self.store(
                        identifier,
                        RecordKind::Series,
                        CachePayload::Series(series.clone()),
                        tier == SourceKind::StructuredApi,
                    )
                    .await;
                    return series;
                }
                Ok(_) => {
                    debug!(identifier = %identifier, tier = %tier, "Tier had no series");
                }
                Err(e) => {
                    warn!(identifier = %identifier, tier = %tier, error = %e, "Tier failed, falling through");
                }
            }
        }

        info!(identifier = %identifier, "No tier produced a series");
        StatSeries::new(identifier)
    }

    /// Cache a result. Only `durable` results reach disk; the rest are
    /// held for this process so a later run asks upstream again.
    async fn store(&self, identifier: &str, kind: RecordKind, payload: CachePayload, durable: bool) {
        let result = if durable {
            self.cache.put(identifier, kind, payload).await
        } else {
            debug!(identifier = %identifier, kind = kind.as_str(), "No structured data, not persisting");
            self.cache.remember(identifier, kind, payload).await
        };
        if let Err(e) = result {
            warn!(identifier = %identifier, kind = kind.as_str(), error = %e, "Cache write failed");
        }
    }
}

/// A later tier is worth a request while the mandatory display name or all
/// stat data is still missing
fn needs_another_tier(merged: Option<&CanonicalRecord>) -> bool {
    let Some(record) = merged else {
        return true;
    };
    let has_stats = STAT_COLUMNS
        .iter()
        .any(|(_, field)| record.number(field).is_some());
    record.display_name().is_none() || !has_stats
}
