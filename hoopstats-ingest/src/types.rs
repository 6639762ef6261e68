//! Core types shared by the resolution and normalization pipeline
//!
//! - [`SourceKind`]: the fetch tiers, in precedence order
//! - [`RawDocument`]: one fetched upstream resource
//! - [`CanonicalRecord`]: merged, source-agnostic player record
//! - [`StatSeries`]: per-season metric rows
//! - [`Identity`]: candidates produced by name resolution

use crate::error::ResolveError;
use crate::fields::DISPLAY_NAME;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Sources
// ============================================================================

/// Data source tier
///
/// Declaration order is precedence order: earlier variants are more trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Structured stats API (authoritative)
    StructuredApi,
    /// Rendered profile page run through the field extractor
    RenderedPage,
    /// Hand-curated static table for a small allow-list of identifiers
    FallbackTable,
}

impl SourceKind {
    /// Precedence rank; 0 is the most trusted tier
    pub fn precedence(self) -> u8 {
        match self {
            SourceKind::StructuredApi => 0,
            SourceKind::RenderedPage => 1,
            SourceKind::FallbackTable => 2,
        }
    }

    /// True when `self` is strictly more trusted than `other`
    pub fn outranks(self, other: SourceKind) -> bool {
        self.precedence() < other.precedence()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::StructuredApi => write!(f, "StructuredApi"),
            SourceKind::RenderedPage => write!(f, "RenderedPage"),
            SourceKind::FallbackTable => write!(f, "FallbackTable"),
        }
    }
}

/// Body of a fetched document
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Parsed JSON tree from the stats API
    Structured(serde_json::Value),
    /// Raw page markup
    Markup(String),
}

/// One fetched upstream resource. Never persisted beyond the raw audit copy.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub source_kind: SourceKind,
    /// Entity the document is about, or the endpoint path for listings
    pub identifier: String,
    pub payload: Payload,
    pub fetched_at: DateTime<Utc>,
}

impl RawDocument {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match &self.payload {
            Payload::Structured(value) => Some(value),
            Payload::Markup(_) => None,
        }
    }

    pub fn as_markup(&self) -> Option<&str> {
        match &self.payload {
            Payload::Markup(text) => Some(text),
            Payload::Structured(_) => None,
        }
    }
}

// ============================================================================
// Canonical record
// ============================================================================

/// Attribute value; `Unknown` marks a field no tier could supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Number(f64),
    Text(String),
    Unknown,
}

impl AttributeValue {
    pub fn is_known(&self) -> bool {
        !matches!(self, AttributeValue::Unknown)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert an upstream JSON cell
    ///
    /// Nulls, blank strings and the `N/A` placeholder become `Unknown`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(AttributeValue::Number)
                .unwrap_or(AttributeValue::Unknown),
            serde_json::Value::String(s) => Self::from_text(s),
            serde_json::Value::Bool(b) => AttributeValue::Text(b.to_string()),
            _ => AttributeValue::Unknown,
        }
    }

    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
            AttributeValue::Unknown
        } else {
            AttributeValue::Text(trimmed.to_string())
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => write!(f, "{}", s),
            AttributeValue::Unknown => write!(f, "unknown"),
        }
    }
}

/// Merged, source-agnostic player record handed to reporting consumers
///
/// Every attribute has a provenance entry (`None` for `Unknown` values).
/// The display name is stored as the `display_name` attribute so it follows
/// the same precedence rules as every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct CanonicalRecord {
    identifier: String,
    attributes: BTreeMap<String, AttributeValue>,
    provenance: BTreeMap<String, Option<SourceKind>>,
}

/// On-disk shape of [`CanonicalRecord`], normalized on load
#[derive(Deserialize)]
struct StoredRecord {
    identifier: String,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    provenance: BTreeMap<String, Option<SourceKind>>,
}

impl From<StoredRecord> for CanonicalRecord {
    /// Provenance is rebuilt per attribute: entries without an attribute are
    /// dropped, attributes without an entry get `None`.
    fn from(stored: StoredRecord) -> Self {
        let StoredRecord {
            identifier,
            attributes,
            provenance,
        } = stored;

        let mut record = CanonicalRecord::new(identifier);
        for (field, value) in attributes {
            let source = provenance.get(&field).copied().flatten();
            record.set(field, value, source);
        }
        record
    }
}

impl CanonicalRecord {
    /// Empty record for `identifier`
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            attributes: BTreeMap::new(),
            provenance: BTreeMap::new(),
        }
    }

    /// Builder form of [`set`](Self::set) for records produced by one source
    pub fn with(mut self, field: impl Into<String>, value: AttributeValue, source: SourceKind) -> Self {
        self.set(field, value, Some(source));
        self
    }

    /// Write a field and its provenance together
    ///
    /// `Unknown` values always carry `None` provenance.
    pub fn set(
        &mut self,
        field: impl Into<String>,
        value: AttributeValue,
        source: Option<SourceKind>,
    ) {
        let field = field.into();
        let source = if value.is_known() { source } else { None };
        self.provenance.insert(field.clone(), source);
        self.attributes.insert(field, value);
    }

    /// Insert `Unknown` for a field that has no entry yet
    pub fn mark_unknown(&mut self, field: &str) {
        if !self.attributes.contains_key(field) {
            self.set(field, AttributeValue::Unknown, None);
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> Option<&str> {
        self.attributes.get(DISPLAY_NAME).and_then(AttributeValue::as_text)
    }

    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.attributes.get(field)
    }

    /// Numeric value of `field`, `None` when missing, unknown or textual
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(AttributeValue::as_number)
    }

    /// Tier that supplied the current value of `field`
    pub fn source_of(&self, field: &str) -> Option<SourceKind> {
        self.provenance.get(field).copied().flatten()
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn provenance(&self) -> &BTreeMap<String, Option<SourceKind>> {
        &self.provenance
    }

    /// True when no attribute holds a known value
    pub fn is_empty(&self) -> bool {
        !self.attributes.values().any(AttributeValue::is_known)
    }
}

// ============================================================================
// Stat series
// ============================================================================

/// Metrics for one period (season)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub period_label: String,
    pub metrics: BTreeMap<String, f64>,
}

impl StatRow {
    pub fn new(period_label: impl Into<String>) -> Self {
        Self {
            period_label: period_label.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }
}

/// Per-period rows, ascending by period label, labels unique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredSeries")]
pub struct StatSeries {
    identifier: String,
    rows: Vec<StatRow>,
}

/// On-disk shape of [`StatSeries`]; rows are re-sorted on load
#[derive(Deserialize)]
struct StoredSeries {
    identifier: String,
    #[serde(default)]
    rows: Vec<StatRow>,
}

impl From<StoredSeries> for StatSeries {
    fn from(stored: StoredSeries) -> Self {
        StatSeries::from_rows(stored.identifier, stored.rows)
    }
}

impl StatSeries {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            rows: Vec::new(),
        }
    }

    /// Build a series, sorting by period label.
    /// When a label repeats, the first row given for it is kept.
    pub fn from_rows(identifier: impl Into<String>, rows: impl IntoIterator<Item = StatRow>) -> Self {
        let mut rows: Vec<StatRow> = rows.into_iter().collect();
        rows.sort_by(|a, b| a.period_label.cmp(&b.period_label));
        rows.dedup_by(|later, earlier| later.period_label == earlier.period_label);
        Self {
            identifier: identifier.into(),
            rows,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn rows(&self) -> &[StatRow] {
        &self.rows
    }

    pub fn get(&self, period_label: &str) -> Option<&StatRow> {
        self.rows
            .binary_search_by(|row| row.period_label.as_str().cmp(period_label))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// `(period_label, value)` for every row that carries `metric`
    pub fn metric(&self, metric: &str) -> Vec<(&str, f64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                row.metrics
                    .get(metric)
                    .map(|v| (row.period_label.as_str(), *v))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ============================================================================
// Identity
// ============================================================================

/// One listing entry matching a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub display_name: String,
    pub identifier: String,
    /// Team abbreviation from the listing, when present
    pub team: Option<String>,
}

/// Caller policy for choosing among candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disambiguation {
    /// Exactly one candidate must match
    RequireUnique,
    /// Take the first candidate in listing order
    FirstMatch,
    /// 1-based position in the candidate list
    Index(usize),
}

/// Result of resolving a free-text query. Candidates keep listing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    query: String,
    candidates: Vec<Candidate>,
}

impl Identity {
    pub fn new(query: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            query: query.into(),
            candidates,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Apply a caller-chosen disambiguation policy
    pub fn select(&self, policy: Disambiguation) -> Result<&Candidate, ResolveError> {
        if self.candidates.is_empty() {
            return Err(ResolveError::NoCandidates(self.query.clone()));
        }

        match policy {
            Disambiguation::RequireUnique if self.candidates.len() > 1 => {
                Err(ResolveError::AmbiguousCandidates {
                    query: self.query.clone(),
                    count: self.candidates.len(),
                })
            }
            Disambiguation::RequireUnique | Disambiguation::FirstMatch => Ok(&self.candidates[0]),
            Disambiguation::Index(index) => index
                .checked_sub(1)
                .and_then(|i| self.candidates.get(i))
                .ok_or(ResolveError::InvalidSelection {
                    index,
                    count: self.candidates.len(),
                }),
        }
    }
}
