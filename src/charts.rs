// Builders only select, sort and label tables; statistics are computed in
// aggregate.rs and transform.rs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ReportError;
use crate::table::DataTable;
use crate::types::{DiversitySummary, GroupSummary, MaintenanceTrendPoint, Row, SegmentCountEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Scatter,
    Histogram,
    Treemap,
    Line,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::Bar,
        ChartKind::Scatter,
        ChartKind::Histogram,
        ChartKind::Treemap,
        ChartKind::Line,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Scatter => "scatter",
            ChartKind::Histogram => "histogram",
            ChartKind::Treemap => "treemap",
            ChartKind::Line => "line",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ChartKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| ReportError::UnsupportedChart {
                kind: s.to_string(),
            })
    }
}

/// Upper bound on histogram bins accepted from configuration or a spec.
pub const MAX_HISTOGRAM_BINS: usize = 1_000;

/// Histogram bar height: raw counts, or counts scaled so the bars integrate
/// to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistNorm {
    Count,
    #[default]
    Density,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub title: String,
    pub data: DataTable,
    pub x: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hover_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histnorm: Option<HistNorm>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl ChartSpec {
    pub fn new(kind: ChartKind, title: &str, data: DataTable, x: &str) -> Self {
        ChartSpec {
            kind,
            title: title.to_string(),
            data,
            x: x.to_string(),
            y: None,
            color: None,
            hover_fields: Vec::new(),
            bins: None,
            histnorm: None,
            path: Vec::new(),
            values: None,
            labels: BTreeMap::new(),
        }
    }

    pub fn y(mut self, column: &str) -> Self {
        self.y = Some(column.to_string());
        self
    }

    pub fn color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }

    pub fn hover(mut self, column: &str) -> Self {
        self.hover_fields.push(column.to_string());
        self
    }

    pub fn bins(mut self, bins: usize, norm: HistNorm) -> Self {
        self.bins = Some(bins);
        self.histnorm = Some(norm);
        self
    }

    pub fn path(mut self, levels: &[&str], values: &str) -> Self {
        self.path = levels.iter().map(|l| l.to_string()).collect();
        self.values = Some(values.to_string());
        self
    }

    pub fn label(mut self, column: &str, text: &str) -> Self {
        self.labels.insert(column.to_string(), text.to_string());
        self
    }

    /// Display name for a column: its label if one was given, else the
    /// column name itself.
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.get(column).map_or(column, String::as_str)
    }

    /// Every column this chart reads from its data table.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.x.as_str()];
        cols.extend(self.y.as_deref());
        cols.extend(self.color.as_deref());
        cols.extend(self.values.as_deref());
        cols.extend(self.hover_fields.iter().map(String::as_str));
        cols.extend(self.path.iter().map(String::as_str));
        cols
    }
}

fn descending(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

pub fn summary_table(summary: &[GroupSummary]) -> DataTable {
    DataTable::from_records(summary)
}

pub fn avg_iri_bar(summary: &[GroupSummary]) -> ChartSpec {
    let mut sorted = summary.to_vec();
    sorted.sort_by(|a, b| descending(a.avg_iri, b.avg_iri));
    ChartSpec::new(
        ChartKind::Bar,
        "Average IRI by Road Type",
        DataTable::from_records(&sorted),
        "road_type",
    )
    .y("avg_iri")
    .label("road_type", "Road Type")
    .label("avg_iri", "Average IRI (m/km)")
}

pub fn avg_pci_bar(summary: &[GroupSummary]) -> ChartSpec {
    let mut sorted = summary.to_vec();
    sorted.sort_by(|a, b| descending(a.avg_pci, b.avg_pci));
    ChartSpec::new(
        ChartKind::Bar,
        "Average PCI by Road Type",
        DataTable::from_records(&sorted),
        "road_type",
    )
    .y("avg_pci")
    .label("road_type", "Road Type")
    .label("avg_pci", "Average PCI")
}

pub fn pci_vs_iri_scatter(rows: &[Row]) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Scatter,
        "PCI vs. IRI by Road Type",
        DataTable::from_records(rows),
        "pci",
    )
    .y("iri")
    .color("road_type")
    .hover("segment_id")
    .label("pci", "PCI (0–100)")
    .label("iri", "IRI (m/km)")
}

pub fn rutting_histogram(rows: &[Row], bins: usize, norm: HistNorm) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Histogram,
        "Distribution of Rutting Values",
        DataTable::from_records(rows),
        "rutting",
    )
    .bins(bins, norm)
    .label("rutting", "Rutting (mm)")
}

pub fn asphalt_diversity_bar(diversity: &[DiversitySummary]) -> ChartSpec {
    let mut sorted = diversity.to_vec();
    sorted.sort_by(|a, b| b.unique_asphalt_types.cmp(&a.unique_asphalt_types));
    ChartSpec::new(
        ChartKind::Bar,
        "Unique Asphalt Types by Road Type",
        DataTable::from_records(&sorted),
        "road_type",
    )
    .y("unique_asphalt_types")
    .label("road_type", "Road Type")
}

pub fn segment_treemap(entries: &[SegmentCountEntry]) -> ChartSpec {
    ChartSpec::new(
        ChartKind::Treemap,
        "Segment Counts by Road Type",
        DataTable::from_records(entries),
        "road_type",
    )
    .path(&["road_type", "segment_id"], "count")
}

/// Consumes the trend sequence; it cannot be replayed afterwards.
pub fn maintenance_trend_line<I>(trend: I) -> ChartSpec
where
    I: IntoIterator<Item = MaintenanceTrendPoint>,
{
    let points: Vec<MaintenanceTrendPoint> = trend.into_iter().collect();
    ChartSpec::new(
        ChartKind::Line,
        "PCI Trend Over Last Maintenance Dates",
        DataTable::from_records(&points),
        "last_maintenance",
    )
    .y("pci")
    .label("last_maintenance", "Last Maintenance")
    .label("pci", "PCI")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn summary() -> Vec<GroupSummary> {
        vec![
            GroupSummary {
                road_type: "Local".to_string(),
                avg_iri: None,
                avg_pci: Some(40.0),
                segment_count: 1,
            },
            GroupSummary {
                road_type: "Primary".to_string(),
                avg_iri: Some(3.0),
                avg_pci: Some(70.0),
                segment_count: 2,
            },
            GroupSummary {
                road_type: "Secondary".to_string(),
                avg_iri: Some(6.0),
                avg_pci: Some(50.0),
                segment_count: 1,
            },
        ]
    }

    fn x_values(spec: &ChartSpec) -> Vec<String> {
        spec.data
            .column(&spec.x)
            .unwrap()
            .map(|c| c.to_string())
            .collect()
    }

    #[test]
    fn iri_bar_sorts_descending_with_missing_last() {
        let spec = avg_iri_bar(&summary());
        assert_eq!(spec.kind, ChartKind::Bar);
        assert_eq!(x_values(&spec), vec!["Secondary", "Primary", "Local"]);
        assert_eq!(spec.y.as_deref(), Some("avg_iri"));
    }

    #[test]
    fn pci_bar_sorts_descending_and_keeps_values() {
        let input = summary();
        let spec = avg_pci_bar(&input);
        assert_eq!(x_values(&spec), vec!["Primary", "Secondary", "Local"]);
        let pci: Vec<_> = spec.data.column("avg_pci").unwrap().cloned().collect();
        assert_eq!(
            pci,
            vec![Cell::Number(70.0), Cell::Number(50.0), Cell::Number(40.0)]
        );
        assert_eq!(input[0].road_type, "Local", "input is not reordered");
    }

    #[test]
    fn every_referenced_column_exists() {
        let rows = vec![crate::aggregate::tests::row(2, "Primary", "S1", Some(1.0), Some(2.0))];
        let specs = vec![
            avg_iri_bar(&summary()),
            avg_pci_bar(&summary()),
            pci_vs_iri_scatter(&rows),
            rutting_histogram(&rows, 10, HistNorm::Density),
            asphalt_diversity_bar(&[]),
            segment_treemap(&[]),
            maintenance_trend_line(Vec::new()),
        ];
        for spec in &specs {
            for col in spec.referenced_columns() {
                assert!(
                    spec.data.column_index(col).is_some(),
                    "{} references missing column {}",
                    spec.title,
                    col
                );
            }
        }
    }

    #[test]
    fn chart_kind_parses_known_names_only() {
        assert_eq!("Treemap".parse::<ChartKind>().unwrap(), ChartKind::Treemap);
        assert_eq!(" line ".parse::<ChartKind>().unwrap(), ChartKind::Line);
        let err = "pie".parse::<ChartKind>().unwrap_err();
        assert!(matches!(err, ReportError::UnsupportedChart { kind } if kind == "pie"));
    }

    #[test]
    fn spec_serializes_type_and_skips_unset_fields() {
        let spec = rutting_histogram(&[], 10, HistNorm::Count);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "histogram");
        assert_eq!(json["bins"], 10);
        assert_eq!(json["histnorm"], "count");
        assert!(json.get("color").is_none());
        assert!(json.get("path").is_none());
        assert_eq!(spec.label_for("rutting"), "Rutting (mm)");
        assert_eq!(spec.label_for("segment_id"), "segment_id");
    }
}
