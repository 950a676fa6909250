use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{diversity_by_road_type, segment_counts, summarize_by_road_type};
use crate::charts::{self, ChartSpec};
use crate::config::Config;
use crate::error::{ReportError, Result};
use crate::findings::{derive_findings, to_markdown};
use crate::output::Presenter;
use crate::table::DataTable;
use crate::transform::build_maintenance_trend;
use crate::types::{DiversitySummary, Finding, GroupSummary, MaintenanceTrendPoint, Row, SegmentCountEntry};

pub const SUMMARY_TITLE: &str = "Average IRI & PCI by Road Type";

/// Everything one run produces from an immutable row set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub summary: Vec<GroupSummary>,
    pub diversity: Vec<DiversitySummary>,
    pub segments: Vec<SegmentCountEntry>,
    pub findings: Vec<Finding>,
    pub charts: Vec<ChartSpec>,
}

impl Report {
    pub fn build(rows: &[Row], config: &Config) -> Result<Self> {
        let summary = summarize_by_road_type(rows)?;
        let diversity = diversity_by_road_type(rows)?;
        let segments = segment_counts(rows)?;
        let trend: Vec<MaintenanceTrendPoint> =
            build_maintenance_trend(rows, &config.input.date_format).collect();
        info!(
            groups = summary.len(),
            segments = segments.len(),
            dated = trend.len(),
            "Aggregated pavement segments"
        );

        let findings = derive_findings(
            &summary,
            &diversity,
            rows,
            &trend,
            config.charts.rutting_threshold_mm,
        );

        let charts = vec![
            charts::avg_iri_bar(&summary),
            charts::avg_pci_bar(&summary),
            charts::pci_vs_iri_scatter(rows),
            charts::rutting_histogram(
                rows,
                config.charts.histogram_bins,
                config.charts.histogram_norm,
            ),
            charts::asphalt_diversity_bar(&diversity),
            charts::segment_treemap(&segments),
            charts::maintenance_trend_line(trend),
        ];

        Ok(Report {
            summary,
            diversity,
            segments,
            findings,
            charts,
        })
    }

    pub fn summary_table(&self) -> DataTable {
        charts::summary_table(&self.summary)
    }

    /// Hand every item to `presenter` in display order. Charts whose kind the
    /// configuration excludes are skipped; charts the presenter cannot draw
    /// abort the run.
    pub fn present<P: Presenter + ?Sized>(&self, presenter: &mut P, config: &Config) -> Result<()> {
        presenter.text("# Pavement Condition Summary")?;
        presenter.table(&self.summary_table(), Some(SUMMARY_TITLE))?;

        for chart in self.charts.iter().filter(|c| config.wants(c.kind)) {
            if !presenter.supports(chart.kind) {
                return Err(ReportError::UnsupportedChart {
                    kind: chart.kind.to_string(),
                });
            }
            debug!(kind = %chart.kind, title = %chart.title, "Presenting chart");
            presenter.chart(chart)?;
        }

        presenter.text("# Pavement Condition Analysis")?;
        presenter.text("## Summary of Findings")?;
        presenter.text(&to_markdown(&self.findings))?;
        Ok(())
    }
}
