//! Stats API tabular payload
//!
//! The API answers with named result sets of column headers plus positional
//! rows:
//!
//! ```text
//! {"resultSets": [{"name": "CareerTotalsRegularSeason",
//!                  "headers": ["PLAYER_ID", "GP", "PTS"],
//!                  "rowSet": [[2544, 1421, 27.2]]}]}
//! ```
//!
//! Rows are flattened into column→value maps keyed by header name.

use crate::error::SourceError;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One flattened row
pub type Row = BTreeMap<String, Value>;

#[derive(Debug, Clone, Deserialize)]
pub struct TabularResponse {
    #[serde(rename = "resultSets")]
    pub result_sets: Vec<ResultSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultSet {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub row_set: Vec<Vec<Value>>,
}

impl TabularResponse {
    /// Decode a structured payload; a missing `resultSets` is a malformed body
    pub fn from_value(value: &Value) -> Result<Self, SourceError> {
        serde_json::from_value(value.clone())
            .map_err(|e| SourceError::MalformedBody(format!("tabular payload: {}", e)))
    }

    pub fn result_set(&self, name: &str) -> Option<&ResultSet> {
        self.result_sets.iter().find(|set| set.name == name)
    }

    /// Named result set, or the first one when the name is absent
    pub fn result_set_or_first(&self, name: &str) -> Option<&ResultSet> {
        self.result_set(name).or_else(|| self.result_sets.first())
    }
}

impl ResultSet {
    /// Flatten rows into column→value maps.
    /// Short rows simply lack the trailing columns.
    pub fn rows(&self) -> Vec<Row> {
        self.row_set
            .iter()
            .map(|cells| {
                self.headers
                    .iter()
                    .zip(cells.iter())
                    .map(|(header, cell)| (header.clone(), cell.clone()))
                    .collect()
            })
            .collect()
    }

    pub fn first_row(&self) -> Option<Row> {
        self.rows().into_iter().next()
    }
}

/// Render a cell as an identifier string (ids arrive as numbers or strings)
pub fn cell_as_identifier(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Numeric cell; numeric strings are accepted, non-finite values are not
pub fn cell_as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}
