//! Identity Resolver
//!
//! Maps a free-text player name to candidate identifiers using the
//! structured player listing.
//!
//! # Matching rule
//! A listing entry matches when its display name contains the query as a
//! case-insensitive substring. Candidates keep listing order; there is no
//! similarity ranking and no automatic selection. Choosing among several
//! candidates is the caller's job (see [`Identity::select`]).

use crate::error::SourceError;
use crate::source_client::{DocumentSource, Endpoint};
use crate::tabular::{cell_as_identifier, Row, TabularResponse};
use crate::types::{Candidate, Identity};
use std::sync::Arc;
use tracing::{debug, info};

const LISTING_PATH: &str = "commonallplayers";
const LISTING_RESULT_SET: &str = "CommonAllPlayers";

const NAME_COLUMN: &str = "DISPLAY_FIRST_LAST";
const ID_COLUMN: &str = "PERSON_ID";
const TEAM_COLUMN: &str = "TEAM_ABBREVIATION";

pub struct IdentityResolver {
    source: Arc<dyn DocumentSource>,
    season: String,
}

impl IdentityResolver {
    pub fn new(source: Arc<dyn DocumentSource>, season: impl Into<String>) -> Self {
        Self {
            source,
            season: season.into(),
        }
    }

    /// Resolve `query` against the full listing
    ///
    /// A blank query yields zero candidates without touching the network.
    /// A listing fetch failure is returned as an error, never as zero matches.
    pub async fn resolve(&self, query: &str) -> Result<Identity, SourceError> {
        let query = query.trim();
        if query.is_empty() {
            debug!("Blank query, returning no candidates");
            return Ok(Identity::new(query, Vec::new()));
        }

        let rows = self.fetch_listing().await?;
        let candidates = match_candidates(query, &rows);

        info!(
            query = %query,
            listing_size = rows.len(),
            candidates = candidates.len(),
            "Resolved player query"
        );

        Ok(Identity::new(query, candidates))
    }

    async fn fetch_listing(&self) -> Result<Vec<Row>, SourceError> {
        let endpoint = Endpoint::api(LISTING_PATH);
        let params = [
            ("LeagueID", "00"),
            ("Season", self.season.as_str()),
            ("IsOnlyCurrentSeason", "1"),
        ];

        let document = self.source.fetch(&endpoint, &params).await?;
        let json = document.as_json().ok_or_else(|| {
            SourceError::MalformedBody("listing endpoint returned markup".to_string())
        })?;

        let tabular = TabularResponse::from_value(json)?;
        let set = tabular
            .result_set_or_first(LISTING_RESULT_SET)
            .ok_or_else(|| SourceError::MalformedBody("listing has no result sets".to_string()))?;

        Ok(set.rows())
    }
}

/// Filter listing rows to those whose display name contains `query`
/// (case-insensitive), preserving row order
///
/// Rows without a name or identifier are skipped.
pub fn match_candidates(query: &str, rows: &[Row]) -> Vec<Candidate> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    rows.iter()
        .filter_map(|row| {
            let name = row.get(NAME_COLUMN)?.as_str()?.trim();
            if !name.to_lowercase().contains(&needle) {
                return None;
            }
            let identifier = row.get(ID_COLUMN).and_then(cell_as_identifier)?;
            let team = row
                .get(TEAM_COLUMN)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);

            Some(Candidate {
                display_name: name.to_string(),
                identifier,
                team,
            })
        })
        .collect()
}
