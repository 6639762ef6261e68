//! Comparison Assembler
//!
//! Aligns two canonical records metric by metric for side-by-side display.
//!
//! - Output order is the caller's metric order; repeats are dropped.
//! - A side that lacks a metric (missing, `Unknown` or textual) shows as
//!   `None` so consumers can render "unknown", while the delta treats it as 0.
//! - `delta = left - right`.
//! - Percentage metrics (by name, see [`crate::fields::is_percentage`]) are
//!   reported ×100 with unit `Percent`.

use crate::fields::is_percentage;
use crate::types::{CanonicalRecord, StatSeries};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricUnit {
    Native,
    Percent,
}

impl MetricUnit {
    pub fn for_metric(metric: &str) -> Self {
        if is_percentage(metric) {
            MetricUnit::Percent
        } else {
            MetricUnit::Native
        }
    }

    fn scale(self, value: f64) -> f64 {
        match self {
            MetricUnit::Native => value,
            MetricUnit::Percent => value * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub metric: String,
    pub unit: MetricUnit,
    /// `None` renders as "unknown"
    pub left: Option<f64>,
    pub right: Option<f64>,
    /// Missing sides count as 0
    pub delta: f64,
}

impl ComparisonRow {
    pub fn has_unknown(&self) -> bool {
        self.left.is_none() || self.right.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparedPlayer {
    pub identifier: String,
    pub display_name: Option<String>,
}

impl ComparedPlayer {
    fn of(record: &CanonicalRecord) -> Self {
        Self {
            identifier: record.identifier().to_string(),
            display_name: record.display_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub left: ComparedPlayer,
    pub right: ComparedPlayer,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    pub fn row(&self, metric: &str) -> Option<&ComparisonRow> {
        self.rows.iter().find(|row| row.metric == metric)
    }
}

/// One period of a two-player trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period_label: String,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTrend {
    pub metric: String,
    pub unit: MetricUnit,
    pub left_identifier: String,
    pub right_identifier: String,
    /// Union of both sides' periods, ascending
    pub points: Vec<TrendPoint>,
}

pub struct ComparisonAssembler;

impl ComparisonAssembler {
    /// Compare `left` and `right` on `metrics`, in the order given
    pub fn compare<S: AsRef<str>>(
        left: &CanonicalRecord,
        right: &CanonicalRecord,
        metrics: &[S],
    ) -> ComparisonTable {
        let mut seen = HashSet::new();
        let rows = metrics
            .iter()
            .map(|metric| metric.as_ref())
            .filter(|metric| seen.insert(*metric))
            .map(|metric| {
                let unit = MetricUnit::for_metric(metric);
                let l = left.number(metric).map(|v| unit.scale(v));
                let r = right.number(metric).map(|v| unit.scale(v));
                ComparisonRow {
                    metric: metric.to_string(),
                    unit,
                    left: l,
                    right: r,
                    delta: l.unwrap_or(0.0) - r.unwrap_or(0.0),
                }
            })
            .collect();

        ComparisonTable {
            left: ComparedPlayer::of(left),
            right: ComparedPlayer::of(right),
            rows,
        }
    }

    /// Align two series on period label for one metric
    pub fn compare_series(left: &StatSeries, right: &StatSeries, metric: &str) -> SeriesTrend {
        let unit = MetricUnit::for_metric(metric);
        let value = |series: &StatSeries, label: &str| {
            series
                .get(label)
                .and_then(|row| row.metrics.get(metric))
                .map(|v| unit.scale(*v))
        };

        let labels: BTreeSet<&str> = left
            .rows()
            .iter()
            .chain(right.rows())
            .map(|row| row.period_label.as_str())
            .collect();

        let points = labels
            .into_iter()
            .map(|label| TrendPoint {
                period_label: label.to_string(),
                left: value(left, label),
                right: value(right, label),
            })
            .collect();

        SeriesTrend {
            metric: metric.to_string(),
            unit,
            left_identifier: left.identifier().to_string(),
            right_identifier: right.identifier().to_string(),
            points,
        }
    }
}

/// Display form of a compared value
pub fn render_value(value: Option<f64>, unit: MetricUnit) -> String {
    match (value, unit) {
        (None, _) => "unknown".to_string(),
        (Some(v), MetricUnit::Native) => format!("{:.1}", v),
        (Some(v), MetricUnit::Percent) => format!("{:.1}%", v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AttributeValue, SourceKind, StatRow};

    fn player(id: &str, name: &str, metrics: &[(&str, f64)]) -> CanonicalRecord {
        metrics.iter().fold(
            CanonicalRecord::new(id).with(
                "display_name",
                AttributeValue::Text(name.to_string()),
                SourceKind::StructuredApi,
            ),
            |record, (metric, value)| {
                record.with(*metric, AttributeValue::Number(*value), SourceKind::StructuredApi)
            },
        )
    }

    #[test]
    fn test_order_follows_caller() {
        let a = player("1", "A", &[("points_per_game", 20.0), ("blocks", 1.0)]);
        let b = player("2", "B", &[("points_per_game", 25.0), ("blocks", 0.5)]);

        let forward = ComparisonAssembler::compare(&a, &b, &["points_per_game", "blocks"]);
        let reverse = ComparisonAssembler::compare(&a, &b, &["blocks", "points_per_game"]);

        let names = |t: &ComparisonTable| t.rows.iter().map(|r| r.metric.clone()).collect::<Vec<_>>();
        assert_eq!(names(&forward), vec!["points_per_game", "blocks"]);
        assert_eq!(names(&reverse), vec!["blocks", "points_per_game"]);
        assert_eq!(forward.row("points_per_game").unwrap().delta, -5.0);
    }

    #[test]
    fn test_duplicate_metrics_dropped() {
        let a = player("1", "A", &[("blocks", 1.0)]);
        let table = ComparisonAssembler::compare(&a, &a, &["blocks", "steals", "blocks"]);
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_missing_side_is_unknown_with_zero_delta() {
        let a = player("1", "A", &[("steals", 1.5)]);
        let mut b = player("2", "B", &[]);
        b.mark_unknown("steals");

        let table = ComparisonAssembler::compare(&a, &b, &["steals"]);
        let row = table.row("steals").unwrap();
        assert_eq!(row.left, Some(1.5));
        assert_eq!(row.right, None);
        assert_eq!(row.delta, 1.5);
        assert!(row.has_unknown());
        assert_eq!(render_value(row.right, row.unit), "unknown");
    }

    #[test]
    fn test_percentage_scaled() {
        let a = player("1", "A", &[("field_goal_pct", 0.504)]);
        let b = player("2", "B", &[("field_goal_pct", 0.496)]);

        let row = ComparisonAssembler::compare(&a, &b, &["field_goal_pct"]).rows[0].clone();
        assert_eq!(row.unit, MetricUnit::Percent);
        assert!((row.left.unwrap() - 50.4).abs() < 1e-9);
        assert!((row.delta - 0.8).abs() < 1e-9);
        assert_eq!(render_value(row.left, row.unit), "50.4%");
    }

    #[test]
    fn test_series_alignment() {
        let left = StatSeries::from_rows(
            "2544",
            vec![
                StatRow::new("2003-04").with_metric("points_per_game", 20.9),
                StatRow::new("2017-18").with_metric("points_per_game", 27.5),
            ],
        );
        let right = StatSeries::from_rows(
            "201142",
            vec![
                StatRow::new("2007-08").with_metric("points_per_game", 20.3),
                StatRow::new("2017-18").with_metric("points_per_game", 26.4),
            ],
        );

        let trend = ComparisonAssembler::compare_series(&left, &right, "points_per_game");
        let labels: Vec<&str> = trend.points.iter().map(|p| p.period_label.as_str()).collect();
        assert_eq!(labels, vec!["2003-04", "2007-08", "2017-18"]);
        assert_eq!(trend.points[0].right, None);
        assert_eq!(trend.points[1].left, None);
        assert_eq!(trend.points[2].left, Some(27.5));
        assert_eq!(trend.points[2].right, Some(26.4));
    }
}
