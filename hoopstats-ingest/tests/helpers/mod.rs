//! Test Helper Utilities
//!
//! Shared fakes and fixtures for hoopstats-ingest integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use hoopstats_ingest::error::SourceError;
use hoopstats_ingest::source_client::{DocumentSource, Endpoint};
use hoopstats_ingest::sources::RecordSource;
use hoopstats_ingest::types::{
    AttributeValue, CanonicalRecord, Payload, RawDocument, SourceKind, StatSeries,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ============================================================================
// Fake document source
// ============================================================================

/// One recorded request
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub identifier: String,
    pub params: Vec<(String, String)>,
}

/// In-memory [`DocumentSource`]
///
/// Responses are looked up by `path:identifier` first, then by `path`.
/// Unknown paths answer `BadStatus(404)`.
#[derive(Default)]
pub struct FakeDocumentSource {
    responses: HashMap<String, Result<Payload, SourceError>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeDocumentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, path: &str, value: Value) -> Self {
        self.responses
            .insert(path.to_string(), Ok(Payload::Structured(value)));
        self
    }

    pub fn with_json_for(mut self, path: &str, identifier: &str, value: Value) -> Self {
        self.responses.insert(
            format!("{}:{}", path, identifier),
            Ok(Payload::Structured(value)),
        );
        self
    }

    pub fn with_markup_for(mut self, path: &str, identifier: &str, markup: &str) -> Self {
        self.responses.insert(
            format!("{}:{}", path, identifier),
            Ok(Payload::Markup(markup.to_string())),
        );
        self
    }

    pub fn with_failure(mut self, path: &str, error: SourceError) -> Self {
        self.responses.insert(path.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentSource for FakeDocumentSource {
    async fn fetch(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
    ) -> Result<RawDocument, SourceError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: endpoint.path.clone(),
            identifier: endpoint.identifier.clone(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let keyed = format!("{}:{}", endpoint.path, endpoint.identifier);
        let response = self
            .responses
            .get(&keyed)
            .or_else(|| self.responses.get(&endpoint.path))
            .cloned()
            .unwrap_or(Err(SourceError::BadStatus(404)))?;

        Ok(RawDocument {
            source_kind: endpoint.source_kind(),
            identifier: endpoint.identifier.clone(),
            payload: response,
            fetched_at: Utc::now(),
        })
    }
}

/// Source standing in for an unreachable network
pub struct OfflineSource;

#[async_trait]
impl DocumentSource for OfflineSource {
    async fn fetch(
        &self,
        _endpoint: &Endpoint,
        _params: &[(&str, &str)],
    ) -> Result<RawDocument, SourceError> {
        Err(SourceError::Network("connection refused".to_string()))
    }
}

// ============================================================================
// Fake record source
// ============================================================================

/// Scripted [`RecordSource`] that counts its calls
pub struct FakeRecordSource {
    kind: SourceKind,
    record: Result<Option<CanonicalRecord>, SourceError>,
    series: Result<Option<StatSeries>, SourceError>,
    record_calls: AtomicUsize,
    series_calls: AtomicUsize,
}

impl FakeRecordSource {
    /// Tier with no data for anything
    pub fn empty(kind: SourceKind) -> Self {
        Self {
            kind,
            record: Ok(None),
            series: Ok(None),
            record_calls: AtomicUsize::new(0),
            series_calls: AtomicUsize::new(0),
        }
    }

    /// Tier whose every call fails
    pub fn failing(kind: SourceKind, error: SourceError) -> Self {
        Self {
            record: Err(error.clone()),
            series: Err(error),
            ..Self::empty(kind)
        }
    }

    pub fn with_record(mut self, record: CanonicalRecord) -> Self {
        self.record = Ok(Some(record));
        self
    }

    pub fn with_series(mut self, series: StatSeries) -> Self {
        self.series = Ok(Some(series));
        self
    }

    pub fn record_calls(&self) -> usize {
        self.record_calls.load(Ordering::SeqCst)
    }

    pub fn series_calls(&self) -> usize {
        self.series_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for FakeRecordSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_record(&self, _identifier: &str) -> Result<Option<CanonicalRecord>, SourceError> {
        self.record_calls.fetch_add(1, Ordering::SeqCst);
        self.record.clone()
    }

    async fn fetch_series(&self, _identifier: &str) -> Result<Option<StatSeries>, SourceError> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        self.series.clone()
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// Record attributed to `kind` with the given name (if any) and numbers
pub fn tier_record(
    kind: SourceKind,
    identifier: &str,
    display_name: Option<&str>,
    numbers: &[(&str, f64)],
) -> CanonicalRecord {
    let record = match display_name {
        Some(name) => CanonicalRecord::new(identifier).with(
            "display_name",
            AttributeValue::Text(name.to_string()),
            kind,
        ),
        None => CanonicalRecord::new(identifier),
    };
    numbers.iter().fold(record, |record, (field, value)| {
        record.with(*field, AttributeValue::Number(*value), kind)
    })
}

/// `commonallplayers` payload
pub fn listing_json() -> Value {
    json!({
        "resultSets": [{
            "name": "CommonAllPlayers",
            "headers": ["PERSON_ID", "DISPLAY_LAST_COMMA_FIRST", "DISPLAY_FIRST_LAST", "TEAM_ABBREVIATION"],
            "rowSet": [
                [201939, "Curry, Stephen", "Stephen Curry", "GSW"],
                [2544, "James, LeBron", "LeBron James", "LAL"],
                [201142, "Durant, Kevin", "Kevin Durant", "PHX"],
                [201935, "Harden, James", "James Harden", "LAC"]
            ]
        }]
    })
}

/// `commonplayerinfo` payload
pub fn profile_json(identifier: u64, display_name: &str, team: &str) -> Value {
    json!({
        "resultSets": [{
            "name": "CommonPlayerInfo",
            "headers": ["PERSON_ID", "DISPLAY_FIRST_LAST", "TEAM_NAME", "POSITION", "HEIGHT"],
            "rowSet": [[identifier, display_name, team, "Forward", "6-9"]]
        }]
    })
}

/// `playercareerstats` payload with one career row and the given seasons
pub fn career_json(identifier: u64, points: f64, seasons: &[(&str, &str, f64)]) -> Value {
    let season_rows: Vec<Value> = seasons
        .iter()
        .map(|(season, team, pts)| json!([identifier, season, team, 70, pts, 0.5]))
        .collect();

    json!({
        "resultSets": [
            {
                "name": "SeasonTotalsRegularSeason",
                "headers": ["PLAYER_ID", "SEASON_ID", "TEAM_ABBREVIATION", "GP", "PTS", "FG_PCT"],
                "rowSet": season_rows
            },
            {
                "name": "CareerTotalsRegularSeason",
                "headers": ["PLAYER_ID", "GP", "PTS", "AST", "REB", "STL", "BLK", "FG_PCT", "FG3_PCT", "FT_PCT"],
                "rowSet": [[identifier, 1000, points, 7.0, 7.0, 1.2, 0.9, 0.5, 0.35, 0.75]]
            }
        ]
    })
}

/// Rendered profile page in the known layout
pub fn profile_markup(display_name: &str) -> String {
    format!(
        r#"<html><head><title>{name} | NBA.com</title></head><body>
        <h1 class="PlayerSummary_playerNameText__K7ZXO">{name}</h1>
        <p class="PlayerSummary_playerInfoText__JrK0r">HEIGHT: 6'9" | WEIGHT: 250lb | COUNTRY: USA</p>
        </body></html>"#,
        name = display_name
    )
}
