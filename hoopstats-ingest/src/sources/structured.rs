//! Structured stats API tier
//!
//! Authoritative source. The detail record combines two calls:
//! - `commonplayerinfo` for profile fields (display name, team, position, ...)
//! - `playercareerstats` (PerMode=PerGame) for career per-game averages
//!
//! Either call may fail on its own; the tier returns whatever the other one
//! produced and only errors when both fail.
//!
//! Season rows come from the `SeasonTotalsRegularSeason` result set. A player
//! traded mid-season has one row per team plus a combined `TOT` row for that
//! season; the combined row is kept.

use super::RecordSource;
use crate::error::SourceError;
use crate::fields::{profile_field, stat_field};
use crate::record_cache::RecordCache;
use crate::source_client::{DocumentSource, Endpoint};
use crate::tabular::{cell_as_f64, Row, TabularResponse};
use crate::types::{AttributeValue, CanonicalRecord, SourceKind, StatRow, StatSeries};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

const PROFILE_PATH: &str = "commonplayerinfo";
const PROFILE_RESULT_SET: &str = "CommonPlayerInfo";

const CAREER_PATH: &str = "playercareerstats";
const CAREER_TOTALS_SET: &str = "CareerTotalsRegularSeason";
const SEASON_TOTALS_SET: &str = "SeasonTotalsRegularSeason";

const SEASON_COLUMN: &str = "SEASON_ID";
const TEAM_COLUMN: &str = "TEAM_ABBREVIATION";
/// Team abbreviation of the combined row for a traded player's season
const COMBINED_TEAM: &str = "TOT";

pub struct StructuredEndpoint {
    source: Arc<dyn DocumentSource>,
    raw_store: Option<Arc<RecordCache>>,
}

impl StructuredEndpoint {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            raw_store: None,
        }
    }

    /// Persist every decoded payload under the cache's raw directory
    pub fn with_raw_store(mut self, cache: Arc<RecordCache>) -> Self {
        self.raw_store = Some(cache);
        self
    }

    async fn fetch_table(
        &self,
        path: &str,
        identifier: &str,
        params: &[(&str, &str)],
        raw_label: &str,
    ) -> Result<TabularResponse, SourceError> {
        let endpoint = Endpoint::api(path).about(identifier);
        let document = self.source.fetch(&endpoint, params).await?;
        let json = document.as_json().ok_or_else(|| {
            SourceError::MalformedBody(format!("{} returned markup", path))
        })?;

        if let Some(store) = &self.raw_store {
            match serde_json::to_vec_pretty(json) {
                Ok(bytes) => {
                    if let Err(e) = store.put_raw(identifier, raw_label, &bytes).await {
                        warn!(identifier = %identifier, error = %e, "Failed to persist raw payload");
                    }
                }
                Err(e) => warn!(identifier = %identifier, error = %e, "Failed to encode raw payload"),
            }
        }

        TabularResponse::from_value(json)
    }

    async fn fetch_profile(&self, identifier: &str) -> Result<TabularResponse, SourceError> {
        self.fetch_table(
            PROFILE_PATH,
            identifier,
            &[("PlayerID", identifier)],
            "info_raw.json",
        )
        .await
    }

    async fn fetch_career(&self, identifier: &str) -> Result<TabularResponse, SourceError> {
        self.fetch_table(
            CAREER_PATH,
            identifier,
            &[("PlayerID", identifier), ("PerMode", "PerGame")],
            "stats_raw.json",
        )
        .await
    }
}

#[async_trait]
impl RecordSource for StructuredEndpoint {
    fn kind(&self) -> SourceKind {
        SourceKind::StructuredApi
    }

    async fn fetch_record(&self, identifier: &str) -> Result<Option<CanonicalRecord>, SourceError> {
        let profile = self.fetch_profile(identifier).await;
        let career = self.fetch_career(identifier).await;

        let mut record = CanonicalRecord::new(identifier);

        let profile_error = match profile {
            Ok(tabular) => {
                if let Some(row) = tabular
                    .result_set_or_first(PROFILE_RESULT_SET)
                    .and_then(|set| set.first_row())
                {
                    apply_profile_row(&mut record, &row);
                }
                None
            }
            Err(e) => {
                debug!(identifier = %identifier, error = %e, "Profile call failed");
                Some(e)
            }
        };

        match career {
            Ok(tabular) => {
                if let Some(row) = tabular
                    .result_set(CAREER_TOTALS_SET)
                    .and_then(|set| set.first_row())
                {
                    apply_stat_row(&mut record, &row);
                }
            }
            Err(e) => {
                debug!(identifier = %identifier, error = %e, "Career stats call failed");
                if let Some(profile_error) = profile_error {
                    return Err(profile_error);
                }
            }
        }

        if record.is_empty() {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn fetch_series(&self, identifier: &str) -> Result<Option<StatSeries>, SourceError> {
        let tabular = self.fetch_career(identifier).await?;
        let rows = tabular
            .result_set(SEASON_TOTALS_SET)
            .map(|set| set.rows())
            .unwrap_or_default();

        let series = series_from_rows(identifier, &rows);
        if series.is_empty() {
            return Ok(None);
        }
        Ok(Some(series))
    }
}

fn apply_profile_row(record: &mut CanonicalRecord, row: &Row) {
    for (column, value) in row {
        if let Some(field) = profile_field(column) {
            record.set(field, AttributeValue::from_json(value), Some(SourceKind::StructuredApi));
        }
    }
}

fn apply_stat_row(record: &mut CanonicalRecord, row: &Row) {
    for (column, value) in row {
        if let Some(field) = stat_field(column) {
            let value = cell_as_f64(value)
                .map(AttributeValue::Number)
                .unwrap_or(AttributeValue::Unknown);
            record.set(field, value, Some(SourceKind::StructuredApi));
        }
    }
}

/// Build a season series, preferring the combined row when a season repeats
pub fn series_from_rows(identifier: &str, rows: &[Row]) -> StatSeries {
    let mut by_season: BTreeMap<String, (StatRow, bool)> = BTreeMap::new();

    for row in rows {
        let Some(season) = row
            .get(SEASON_COLUMN)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            continue;
        };

        let combined = row
            .get(TEAM_COLUMN)
            .and_then(|v| v.as_str())
            .map(|team| team.trim() == COMBINED_TEAM)
            .unwrap_or(false);

        let stat_row = row.iter().fold(StatRow::new(season), |acc, (column, value)| {
            match (stat_field(column), cell_as_f64(value)) {
                (Some(field), Some(number)) => acc.with_metric(field, number),
                _ => acc,
            }
        });

        match by_season.get(season) {
            None => {
                by_season.insert(season.to_string(), (stat_row, combined));
            }
            Some((_, false)) if combined => {
                by_season.insert(season.to_string(), (stat_row, combined));
            }
            Some(_) => {}
        }
    }

    StatSeries::from_rows(identifier, by_season.into_values().map(|(row, _)| row))
}
