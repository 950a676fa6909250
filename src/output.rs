use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::{debug, info};

use crate::charts::{ChartKind, ChartSpec, HistNorm, MAX_HISTOGRAM_BINS};
use crate::config::OutputConfig;
use crate::error::{ReportError, Result};
use crate::reports::Report;
use crate::table::{Cell, DataTable};
use crate::util::format_number;

pub trait Presenter {
    fn text(&mut self, markdown: &str) -> Result<()>;

    fn table(&mut self, table: &DataTable, title: Option<&str>) -> Result<()>;

    fn chart(&mut self, chart: &ChartSpec) -> Result<()>;

    fn supports(&self, _kind: ChartKind) -> bool {
        true
    }
}

fn render_error(chart: &ChartSpec, message: String) -> ReportError {
    ReportError::Render {
        chart: chart.title.clone(),
        message,
    }
}

fn check_columns(chart: &ChartSpec) -> Result<()> {
    for col in chart.referenced_columns() {
        if chart.data.column_index(col).is_none() {
            return Err(render_error(chart, format!("no column named `{}`", col)));
        }
    }
    Ok(())
}

fn markdown_table<I>(columns: &[String], rows: I) -> String
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut builder = Builder::default();
    builder.push_record(columns.iter().cloned());
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub struct ConsolePresenter<W: Write> {
    out: W,
    preview_rows: usize,
    bar_width: usize,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, config: &OutputConfig) -> Self {
        Self {
            out,
            preview_rows: config.preview_rows,
            bar_width: config.bar_width,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn bar(&self, value: f64, max: f64) -> String {
        if max <= 0.0 || value <= 0.0 {
            return String::new();
        }
        let len = ((value / max) * self.bar_width as f64).round() as usize;
        "█".repeat(len.max(1))
    }

    fn draw_bars(&mut self, labels: &[String], values: &[Option<f64>]) -> Result<()> {
        let max = values.iter().flatten().copied().fold(0.0_f64, f64::max);
        let pad = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        for (label, value) in labels.iter().zip(values) {
            let rendered = match value {
                Some(v) => format!("{} {}", self.bar(*v, max), format_number(*v, 2)),
                None => "n/a".to_string(),
            };
            writeln!(self.out, "{:<pad$} | {}", label, rendered, pad = pad)?;
        }
        Ok(())
    }

    fn bar_chart(&mut self, chart: &ChartSpec) -> Result<()> {
        let y = chart
            .y
            .as_deref()
            .ok_or_else(|| render_error(chart, "bar chart needs a y column".to_string()))?;
        let labels: Vec<String> = column_cells(chart, &chart.x).map(|c| c.to_string()).collect();
        let values: Vec<Option<f64>> = column_cells(chart, y).map(Cell::as_f64).collect();
        self.draw_bars(&labels, &values)
    }

    fn histogram(&mut self, chart: &ChartSpec) -> Result<()> {
        let bins = chart.bins.unwrap_or(10).max(1);
        if bins > MAX_HISTOGRAM_BINS {
            return Err(render_error(
                chart,
                format!("{} bins exceeds the limit of {}", bins, MAX_HISTOGRAM_BINS),
            ));
        }
        let values: Vec<f64> = column_cells(chart, &chart.x).filter_map(Cell::as_f64).collect();
        if values.is_empty() {
            writeln!(self.out, "(no data)")?;
            return Ok(());
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

        let mut counts = vec![0usize; bins];
        for v in &values {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let n = values.len() as f64;
        let labels: Vec<String> = (0..bins)
            .map(|i| {
                let lo = min + width * i as f64;
                format!("{} – {}", format_number(lo, 2), format_number(lo + width, 2))
            })
            .collect();
        let heights: Vec<Option<f64>> = counts
            .iter()
            .map(|c| match chart.histnorm {
                Some(HistNorm::Density) => Some(*c as f64 / (n * width)),
                Some(HistNorm::Count) | None => Some(*c as f64),
            })
            .collect();
        self.draw_bars(&labels, &heights)
    }

    fn treemap(&mut self, chart: &ChartSpec) -> Result<()> {
        let (Some(parent_col), Some(child_col), Some(value_col)) =
            (chart.path.first(), chart.path.get(1), chart.values.as_ref())
        else {
            return Err(render_error(
                chart,
                "treemap needs a two-level path and a values column".to_string(),
            ));
        };
        let parents = column_cells(chart, parent_col);
        let children = column_cells(chart, child_col);
        let values = column_cells(chart, value_col);

        let mut tree: BTreeMap<String, (f64, Vec<(String, f64)>)> = BTreeMap::new();
        for ((parent, child), value) in parents.zip(children).zip(values) {
            let v = value.as_f64().unwrap_or(0.0);
            let node = tree.entry(parent.to_string()).or_default();
            node.0 += v;
            node.1.push((child.to_string(), v));
        }
        for (parent, (total, kids)) in &tree {
            writeln!(self.out, "{} ({})", parent, format_number(*total, 0))?;
            for (child, v) in kids.iter().take(self.preview_rows) {
                writeln!(self.out, "  └ {}: {}", child, format_number(*v, 0))?;
            }
            if kids.len() > self.preview_rows {
                writeln!(self.out, "  … {} more", kids.len() - self.preview_rows)?;
            }
        }
        Ok(())
    }

    fn point_preview(&mut self, chart: &ChartSpec) -> Result<()> {
        let mut cols: Vec<&str> = vec![chart.x.as_str()];
        cols.extend(chart.y.as_deref());
        cols.extend(chart.color.as_deref());
        cols.extend(chart.hover_fields.iter().map(String::as_str));
        let idx: Vec<usize> = cols
            .iter()
            .filter_map(|c| chart.data.column_index(c))
            .collect();
        let header: Vec<String> = cols.iter().map(|c| chart.label_for(c).to_string()).collect();
        let rows = chart
            .data
            .rows
            .iter()
            .take(self.preview_rows)
            .map(|row| idx.iter().map(|i| row[*i].to_string()).collect::<Vec<_>>());

        if chart.data.is_empty() {
            writeln!(self.out, "(no points)")?;
            return Ok(());
        }
        writeln!(self.out, "{}", markdown_table(&header, rows))?;
        if chart.data.len() > self.preview_rows {
            writeln!(self.out, "… {} more points", chart.data.len() - self.preview_rows)?;
        }
        Ok(())
    }
}

fn column_cells<'a>(chart: &'a ChartSpec, name: &str) -> impl Iterator<Item = &'a Cell> + 'a {
    // Columns are validated by `check_columns` before any drawing happens.
    let idx = chart.data.column_index(name).unwrap_or(0);
    chart.data.rows.iter().map(move |row| &row[idx])
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn text(&mut self, markdown: &str) -> Result<()> {
        writeln!(self.out, "{}\n", markdown)?;
        Ok(())
    }

    fn table(&mut self, table: &DataTable, title: Option<&str>) -> Result<()> {
        if let Some(title) = title {
            writeln!(self.out, "{}\n", title)?;
        }
        if table.is_empty() {
            writeln!(self.out, "(no rows)\n")?;
            return Ok(());
        }
        let rows = table
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect::<Vec<_>>());
        writeln!(self.out, "{}\n", markdown_table(&table.columns, rows))?;
        Ok(())
    }

    fn chart(&mut self, chart: &ChartSpec) -> Result<()> {
        check_columns(chart)?;
        writeln!(self.out, "## {}\n", chart.title)?;
        let axes = match chart.y.as_deref() {
            Some(y) => format!("{} by {}", chart.label_for(y), chart.label_for(&chart.x)),
            None => chart.label_for(&chart.x).to_string(),
        };
        writeln!(self.out, "[{}] {}", chart.kind, axes)?;
        match chart.kind {
            ChartKind::Bar => self.bar_chart(chart)?,
            ChartKind::Histogram => self.histogram(chart)?,
            ChartKind::Treemap => self.treemap(chart)?,
            ChartKind::Scatter | ChartKind::Line => self.point_preview(chart)?,
        }
        writeln!(self.out)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "item", rename_all = "lowercase")]
pub enum PresentedItem {
    Text { markdown: String },
    Table { title: Option<String>, table: DataTable },
    Chart { chart: ChartSpec },
}

/// Collects presented items; [`JsonPresenter::finish`] writes them out.
#[derive(Debug, Default)]
pub struct JsonPresenter {
    items: Vec<PresentedItem>,
}

impl JsonPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[PresentedItem] {
        &self.items
    }

    pub fn finish(&self, path: &Path) -> Result<()> {
        write_json(path, &self.items)?;
        info!(path = %path.display(), items = self.items.len(), "Wrote report document");
        Ok(())
    }
}

impl Presenter for JsonPresenter {
    fn text(&mut self, markdown: &str) -> Result<()> {
        self.items.push(PresentedItem::Text {
            markdown: markdown.to_string(),
        });
        Ok(())
    }

    fn table(&mut self, table: &DataTable, title: Option<&str>) -> Result<()> {
        self.items.push(PresentedItem::Table {
            title: title.map(str::to_string),
            table: table.clone(),
        });
        Ok(())
    }

    fn chart(&mut self, chart: &ChartSpec) -> Result<()> {
        check_columns(chart)?;
        self.items.push(PresentedItem::Chart {
            chart: chart.clone(),
        });
        Ok(())
    }
}

fn plain(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(v) => v.to_string(),
        Cell::Count(n) => n.to_string(),
        Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        Cell::Missing => String::new(),
    }
}

pub fn write_csv(path: &Path, table: &DataTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(plain))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write the summary tables of `report` as CSV files under `dir`.
pub fn export_tables(dir: &Path, report: &Report) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let tables = [
        ("group_summary.csv", report.summary_table()),
        ("asphalt_diversity.csv", DataTable::from_records(&report.diversity)),
        ("segment_counts.csv", DataTable::from_records(&report.segments)),
    ];
    let mut written = Vec::new();
    for (name, table) in tables {
        let path = dir.join(name);
        write_csv(&path, &table)?;
        debug!(path = %path.display(), rows = table.len(), "Exported table");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts;
    use crate::types::{GroupSummary, Row, SegmentCountEntry};

    fn console() -> ConsolePresenter<Vec<u8>> {
        ConsolePresenter::new(Vec::new(), &OutputConfig::default())
    }

    fn rendered(p: ConsolePresenter<Vec<u8>>) -> String {
        String::from_utf8(p.into_inner()).unwrap()
    }

    fn summary() -> Vec<GroupSummary> {
        vec![
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

    #[test]
    fn console_renders_markdown_table_with_title() {
        let mut p = console();
        p.table(&charts::summary_table(&summary()), Some("Averages")).unwrap();
        let out = rendered(p);
        assert!(out.starts_with("Averages\n"));
        assert!(out.contains("| road_type |"));
        assert!(out.contains("| Secondary |"));
    }

    #[test]
    fn console_bar_chart_scales_to_longest_bar() {
        let mut p = console();
        p.chart(&charts::avg_iri_bar(&summary())).unwrap();
        let out = rendered(p);
        let secondary = out.lines().find(|l| l.starts_with("Secondary")).unwrap();
        let primary = out.lines().find(|l| l.starts_with("Primary")).unwrap();
        assert_eq!(secondary.matches('█').count(), 40);
        assert_eq!(primary.matches('█').count(), 20);
        assert!(out.contains("[bar] Average IRI (m/km) by Road Type"));
    }

    fn rutted(values: &[f64]) -> Vec<Row> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut r = crate::aggregate::tests::row(i as u64 + 2, "Primary", "S", None, None);
                r.rutting = Some(*v);
                r
            })
            .collect()
    }

    #[test]
    fn console_histogram_uses_configured_bins() {
        let rows = rutted(&[0.0, 0.5, 1.5, 3.0, 10.0]);
        let mut p = console();
        p.chart(&charts::rutting_histogram(&rows, 5, HistNorm::Density)).unwrap();
        let out = rendered(p);
        let bars = out.lines().filter(|l| l.contains(" | ")).count();
        assert_eq!(bars, 5);
        // 3 of 5 values fall in the first bin of width 2: 3 / (5 * 2).
        assert!(out.lines().any(|l| l.starts_with("0.00 – 2.00") && l.ends_with("0.30")));
    }

    #[test]
    fn console_histogram_count_norm_shows_raw_counts() {
        let rows = rutted(&[0.0, 0.5, 1.5, 3.0, 10.0]);
        let mut p = console();
        p.chart(&charts::rutting_histogram(&rows, 5, HistNorm::Count)).unwrap();
        let out = rendered(p);
        assert!(out.lines().any(|l| l.starts_with("0.00 – 2.00") && l.ends_with("3.00")));
        assert!(out.lines().any(|l| l.starts_with("8.00 – 10.00") && l.ends_with("1.00")));
    }

    #[test]
    fn oversized_histogram_is_a_render_error() {
        let rows = rutted(&[1.0, 2.0]);
        let mut p = console();
        let err = p
            .chart(&charts::rutting_histogram(&rows, usize::MAX, HistNorm::Density))
            .unwrap_err();
        assert!(matches!(err, ReportError::Render { .. }));
    }

    #[test]
    fn console_treemap_totals_children() {
        let entries = vec![
            SegmentCountEntry {
                road_type: "Primary".to_string(),
                segment_id: "S1".to_string(),
                count: 2,
            },
            SegmentCountEntry {
                road_type: "Primary".to_string(),
                segment_id: "S2".to_string(),
                count: 1,
            },
        ];
        let mut p = console();
        p.chart(&charts::segment_treemap(&entries)).unwrap();
        let out = rendered(p);
        assert!(out.contains("Primary (3)"));
        assert!(out.contains("  └ S1: 2"));
    }

    #[test]
    fn chart_with_unknown_column_is_a_render_error() {
        let mut spec = charts::avg_iri_bar(&summary());
        spec.y = Some("avg_rutting".to_string());
        let err = console().chart(&spec).unwrap_err();
        assert!(matches!(err, ReportError::Render { .. }));
        let err = JsonPresenter::new().chart(&spec).unwrap_err();
        assert!(matches!(err, ReportError::Render { .. }));
    }

    #[test]
    fn json_presenter_keeps_call_order() {
        let mut p = JsonPresenter::new();
        p.text("# Heading").unwrap();
        p.chart(&charts::avg_pci_bar(&summary())).unwrap();
        p.table(&charts::summary_table(&summary()), None).unwrap();

        let json = serde_json::to_value(p.items()).unwrap();
        assert_eq!(json[0]["item"], "text");
        assert_eq!(json[1]["item"], "chart");
        assert_eq!(json[1]["chart"]["type"], "bar");
        assert_eq!(json[2]["item"], "table");
        assert!(json[2]["title"].is_null());
    }

    #[test]
    fn write_csv_uses_plain_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let mut groups = summary();
        groups[0].avg_pci = None;
        write_csv(&path, &charts::summary_table(&groups)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "road_type,avg_iri,avg_pci,segment_count");
        assert_eq!(lines[1], "Primary,3,,2");
        assert_eq!(lines[2], "Secondary,6,50,1");
    }
}
