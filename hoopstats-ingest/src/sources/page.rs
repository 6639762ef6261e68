//! Rendered profile page tier
//!
//! Fetches `player/{id}/profile` and runs it through the page extractor:
//! the display name via the strategy chain, plus whatever `key: value` info
//! pairs the summary lines carry. Pages carry no season rows.

use super::RecordSource;
use crate::error::SourceError;
use crate::fields::{normalize_key, DISPLAY_NAME};
use crate::page_extractor::{extract_from, info_pairs_from, FieldSpec, ParsedPage};
use crate::record_cache::RecordCache;
use crate::source_client::{DocumentSource, Endpoint};
use crate::types::{AttributeValue, CanonicalRecord, SourceKind, StatSeries};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PageExtraction {
    source: Arc<dyn DocumentSource>,
    raw_store: Option<Arc<RecordCache>>,
}

impl PageExtraction {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            raw_store: None,
        }
    }

    pub fn with_raw_store(mut self, cache: Arc<RecordCache>) -> Self {
        self.raw_store = Some(cache);
        self
    }
}

pub fn profile_path(identifier: &str) -> String {
    format!("player/{}/profile", identifier)
}

#[async_trait]
impl RecordSource for PageExtraction {
    fn kind(&self) -> SourceKind {
        SourceKind::RenderedPage
    }

    async fn fetch_record(&self, identifier: &str) -> Result<Option<CanonicalRecord>, SourceError> {
        let endpoint = Endpoint::page(profile_path(identifier)).about(identifier);
        let document = self.source.fetch(&endpoint, &[]).await?;
        let markup = document
            .as_markup()
            .ok_or_else(|| SourceError::MalformedBody("profile page returned JSON".to_string()))?;

        if let Some(store) = &self.raw_store {
            if let Err(e) = store.put_raw(identifier, "profile.html", markup.as_bytes()).await {
                warn!(identifier = %identifier, error = %e, "Failed to persist raw page");
            }
        }

        let record = record_from_markup(identifier, markup);
        if record.is_empty() {
            debug!(identifier = %identifier, "Profile page yielded no fields");
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn fetch_series(&self, _identifier: &str) -> Result<Option<StatSeries>, SourceError> {
        Ok(None)
    }
}

/// Extract a page-tier record from profile markup
///
/// Parsing stays inside this synchronous call; the parsed tree is not `Send`.
pub fn record_from_markup(identifier: &str, markup: &str) -> CanonicalRecord {
    let page = ParsedPage::parse(markup);
    let mut record = CanonicalRecord::new(identifier);

    for (key, value) in info_pairs_from(&page) {
        let field = normalize_key(&key);
        if field == DISPLAY_NAME {
            continue;
        }
        record.set(field, AttributeValue::from_text(&value), Some(SourceKind::RenderedPage));
    }

    if let Some(name) = extract_from(&page, &FieldSpec::display_name(identifier)) {
        record.set(DISPLAY_NAME, AttributeValue::Text(name), Some(SourceKind::RenderedPage));
    }

    record
}
