//! Static fallback table
//!
//! Hand-curated values for a small allow-list of well-known identifiers, for
//! offline runs or when both network tiers come back empty. Never consulted
//! for identifiers outside the table.
//!
//! Values are keyed by upstream column name (`PTS`, `FG_PCT`, ...) and mapped
//! through the field catalog like the structured tier's rows.

use super::RecordSource;
use crate::error::SourceError;
use crate::fields::{stat_field, DISPLAY_NAME};
use crate::types::{AttributeValue, CanonicalRecord, SourceKind, StatRow, StatSeries};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

type Columns = &'static [(&'static str, f64)];

const DEFAULT_NAMES: &[(&str, &str)] = &[
    ("2544", "LeBron James"),
    ("201142", "Kevin Durant"),
    ("203999", "Nikola Jokic"),
    ("201939", "Stephen Curry"),
    ("203954", "Joel Embiid"),
    ("1629029", "Luka Doncic"),
    ("203076", "Anthony Davis"),
    ("201935", "James Harden"),
    ("1628369", "Jayson Tatum"),
    ("1627736", "Jamal Murray"),
    ("203081", "Damian Lillard"),
    ("203507", "Giannis Antetokounmpo"),
    ("1627783", "Jaylen Brown"),
    ("202681", "Kyrie Irving"),
    ("1628983", "Shai Gilgeous-Alexander"),
];

/// Career regular-season per-game averages
const CAREER_TOTALS: &[(&str, Columns)] = &[
    (
        "2544",
        &[
            ("GP", 1421.0),
            ("PTS", 27.2),
            ("AST", 7.3),
            ("REB", 7.5),
            ("STL", 1.5),
            ("BLK", 0.8),
            ("FG_PCT", 0.504),
            ("FG3_PCT", 0.345),
            ("FT_PCT", 0.735),
        ],
    ),
    (
        "201142",
        &[
            ("GP", 1004.0),
            ("PTS", 27.3),
            ("AST", 4.3),
            ("REB", 7.1),
            ("STL", 1.1),
            ("BLK", 1.1),
            ("FG_PCT", 0.496),
            ("FG3_PCT", 0.385),
            ("FT_PCT", 0.883),
        ],
    ),
];

/// Selected regular seasons
const SEASON_TOTALS: &[(&str, &[(&str, Columns)])] = &[
    (
        "2544",
        &[
            ("2003-04", &[("GP", 79.0), ("PTS", 20.9), ("AST", 5.9), ("REB", 5.5), ("STL", 1.6), ("BLK", 0.7)]),
            ("2008-09", &[("GP", 81.0), ("PTS", 28.4), ("AST", 7.2), ("REB", 7.6), ("STL", 1.7), ("BLK", 1.1)]),
            ("2012-13", &[("GP", 76.0), ("PTS", 26.8), ("AST", 7.3), ("REB", 8.0), ("STL", 1.7), ("BLK", 0.9)]),
            ("2017-18", &[("GP", 82.0), ("PTS", 27.5), ("AST", 9.1), ("REB", 8.6), ("STL", 1.4), ("BLK", 0.9)]),
            ("2022-23", &[("GP", 55.0), ("PTS", 28.9), ("AST", 6.8), ("REB", 8.3), ("STL", 0.9), ("BLK", 0.6)]),
        ],
    ),
    (
        "201142",
        &[
            ("2007-08", &[("GP", 80.0), ("PTS", 20.3), ("AST", 2.4), ("REB", 4.4), ("STL", 1.0), ("BLK", 0.9)]),
            ("2009-10", &[("GP", 82.0), ("PTS", 30.1), ("AST", 2.8), ("REB", 7.6), ("STL", 1.4), ("BLK", 1.0)]),
            ("2013-14", &[("GP", 81.0), ("PTS", 32.0), ("AST", 5.5), ("REB", 7.4), ("STL", 1.3), ("BLK", 0.7)]),
            ("2017-18", &[("GP", 68.0), ("PTS", 26.4), ("AST", 5.4), ("REB", 6.8), ("STL", 0.7), ("BLK", 1.8)]),
            ("2022-23", &[("GP", 47.0), ("PTS", 29.1), ("AST", 5.0), ("REB", 6.7), ("STL", 0.7), ("BLK", 1.4)]),
        ],
    ),
];

/// In-memory fallback tier
#[derive(Debug, Clone, Default)]
pub struct StaticTable {
    records: HashMap<String, CanonicalRecord>,
    series: HashMap<String, StatSeries>,
}

impl StaticTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the curated names, career lines and seasons
    pub fn builtin() -> Self {
        let mut table = DEFAULT_NAMES
            .iter()
            .fold(Self::new(), |table, (id, name)| table.with_name(*id, *name));

        for (id, columns) in CAREER_TOTALS {
            table = table.with_career(*id, columns);
        }

        for (id, seasons) in SEASON_TOTALS {
            let rows = seasons.iter().map(|(label, columns)| stat_row(label, columns));
            table = table.with_seasons(*id, rows);
        }

        table
    }

    pub fn with_name(mut self, identifier: impl Into<String>, display_name: &str) -> Self {
        let identifier = identifier.into();
        self.record_mut(&identifier).set(
            DISPLAY_NAME,
            AttributeValue::Text(display_name.to_string()),
            Some(SourceKind::FallbackTable),
        );
        self
    }

    /// Career values keyed by upstream column name
    pub fn with_career(mut self, identifier: impl Into<String>, columns: &[(&str, f64)]) -> Self {
        let identifier = identifier.into();
        let record = self.record_mut(&identifier);
        for (column, value) in columns {
            match stat_field(column) {
                Some(field) => {
                    record.set(field, AttributeValue::Number(*value), Some(SourceKind::FallbackTable))
                }
                None => warn!(column = %column, "Unknown column in fallback table, skipped"),
            }
        }
        self
    }

    pub fn with_seasons(
        mut self,
        identifier: impl Into<String>,
        rows: impl IntoIterator<Item = StatRow>,
    ) -> Self {
        let identifier = identifier.into();
        let series = StatSeries::from_rows(identifier.clone(), rows);
        self.series.insert(identifier, series);
        self
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.records.contains_key(identifier) || self.series.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.series.is_empty()
    }

    fn record_mut(&mut self, identifier: &str) -> &mut CanonicalRecord {
        self.records
            .entry(identifier.to_string())
            .or_insert_with(|| CanonicalRecord::new(identifier))
    }
}

fn stat_row(label: &str, columns: &[(&str, f64)]) -> StatRow {
    columns
        .iter()
        .filter_map(|(column, value)| stat_field(column).map(|field| (field, *value)))
        .fold(StatRow::new(label), |row, (field, value)| row.with_metric(field, value))
}

#[async_trait]
impl RecordSource for StaticTable {
    fn kind(&self) -> SourceKind {
        SourceKind::FallbackTable
    }

    async fn fetch_record(&self, identifier: &str) -> Result<Option<CanonicalRecord>, SourceError> {
        Ok(self.records.get(identifier).cloned())
    }

    async fn fetch_series(&self, identifier: &str) -> Result<Option<StatSeries>, SourceError> {
        Ok(self.series.get(identifier).cloned())
    }
}
