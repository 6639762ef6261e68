//! hoopstats-ingest library interface
//!
//! Player identity resolution and record normalization:
//! free-text name → stable identifier → tiered fetch → merged canonical
//! record, plus side-by-side comparison of two records.

pub mod comparison;
pub mod config;
pub mod error;
pub mod fields;
pub mod identity_resolver;
pub mod page_extractor;
pub mod record_cache;
pub mod record_fetcher;
pub mod record_merger;
pub mod source_client;
pub mod sources;
pub mod tabular;
pub mod types;

pub use crate::comparison::{ComparisonAssembler, ComparisonTable, SeriesTrend};
pub use crate::config::{ConfigOverrides, IngestConfig};
pub use crate::error::{CacheError, FetchError, PipelineError, ResolveError, SourceError};
pub use crate::identity_resolver::IdentityResolver;
pub use crate::record_cache::RecordCache;
pub use crate::record_fetcher::{CachePolicy, RecordFetcher};
pub use crate::record_merger::RecordMerger;
pub use crate::source_client::{DocumentSource, SourceClient};
pub use crate::types::{
    AttributeValue, Candidate, CanonicalRecord, Disambiguation, Identity, SourceKind, StatSeries,
};

use std::sync::Arc;
use tracing::info;

/// Resolver and fetcher wired over one paced client and one cache
pub struct Ingest {
    resolver: IdentityResolver,
    fetcher: RecordFetcher,
}

impl Ingest {
    /// Wire the default tiers from configuration
    pub fn from_config(config: &IngestConfig) -> hoopstats_common::Result<Self> {
        let client: Arc<dyn DocumentSource> = Arc::new(SourceClient::new(config)?);
        let cache = Arc::new(RecordCache::new(config.cache_directory.clone()));

        info!(
            cache_directory = %config.cache_directory.display(),
            persist_raw = config.persist_raw,
            "Ingest pipeline ready"
        );

        Ok(Self::with_parts(
            IdentityResolver::new(Arc::clone(&client), config.season.clone()),
            RecordFetcher::with_default_tiers(client, cache, config.persist_raw),
        ))
    }

    pub fn with_parts(resolver: IdentityResolver, fetcher: RecordFetcher) -> Self {
        Self { resolver, fetcher }
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn fetcher(&self) -> &RecordFetcher {
        &self.fetcher
    }

    /// All candidates for `query`
    pub async fn search(&self, query: &str) -> Result<Identity, SourceError> {
        self.resolver.resolve(query).await
    }

    /// Resolve `query`, pick a candidate by `policy`, and fetch its record
    pub async fn fetch_by_name(
        &self,
        query: &str,
        policy: Disambiguation,
        cache_policy: CachePolicy,
    ) -> Result<CanonicalRecord, PipelineError> {
        let identity = self.resolver.resolve(query).await.map_err(ResolveError::from)?;
        let candidate = identity.select(policy)?;
        info!(
            query = %query,
            identifier = %candidate.identifier,
            display_name = %candidate.display_name,
            "Candidate selected"
        );
        Ok(self
            .fetcher
            .fetch_record_with(&candidate.identifier, cache_policy)
            .await?)
    }
}
