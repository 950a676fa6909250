use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::charts::{ChartKind, HistNorm, MAX_HISTOGRAM_BINS};
use crate::error::{ReportError, Result};
use crate::transform::DEFAULT_DATE_FORMAT;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub charts: ChartsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV file with one row per pavement segment.
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// `chrono` format string for the `Last Maintenance` column.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            date_format: default_date_format(),
        }
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("data/sample.csv")
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// `density` scales bars to integrate to one; `count` shows raw counts.
    #[serde(default)]
    pub histogram_norm: HistNorm,

    /// Rutting depth above which a segment counts as distressed.
    #[serde(default = "default_rutting_threshold")]
    pub rutting_threshold_mm: f64,

    /// Chart kinds to present; empty means all.
    #[serde(default)]
    pub kinds: Vec<ChartKind>,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
            histogram_norm: HistNorm::default(),
            rutting_threshold_mm: default_rutting_threshold(),
            kinds: Vec::new(),
        }
    }
}

fn default_histogram_bins() -> usize {
    10
}

fn default_rutting_threshold() -> f64 {
    4.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Rows shown when the console previews a scatter or line chart.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,

    /// Width in characters of the longest console bar.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
            bar_width: default_bar_width(),
        }
    }
}

fn default_preview_rows() -> usize {
    10
}

fn default_bar_width() -> usize {
    40
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| ReportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.charts.histogram_bins == 0 || self.charts.histogram_bins > MAX_HISTOGRAM_BINS {
            return Err(ReportError::Config(format!(
                "charts.histogram_bins must be between 1 and {}",
                MAX_HISTOGRAM_BINS
            )));
        }
        if !self.charts.rutting_threshold_mm.is_finite() || self.charts.rutting_threshold_mm < 0.0 {
            return Err(ReportError::Config(
                "charts.rutting_threshold_mm must be a non-negative number".to_string(),
            ));
        }
        if self.output.bar_width == 0 {
            return Err(ReportError::Config(
                "output.bar_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether charts of `kind` should be presented.
    pub fn wants(&self, kind: ChartKind) -> bool {
        self.charts.kinds.is_empty() || self.charts.kinds.contains(&kind)
    }

    pub fn default_toml() -> String {
        r#"# pavement_report configuration

[input]
path = "data/sample.csv"
date_format = "%Y-%m-%d"

[charts]
# Between 1 and 1000
histogram_bins = 10
# "density" or "count"
histogram_norm = "density"
rutting_threshold_mm = 4.0
# Empty list presents every chart. Known kinds: bar, scatter, histogram, treemap, line
kinds = []

[output]
preview_rows = 10
bar_width = 40
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_round_trips_to_defaults() {
        let config = Config::from_toml_str(&Config::default_toml()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml_str(
            "[charts]\nhistogram_bins = 20\nkinds = [\"bar\", \"line\"]\n",
        )
        .unwrap();
        assert_eq!(config.charts.histogram_bins, 20);
        assert_eq!(config.input.date_format, "%Y-%m-%d");
        assert!(config.wants(ChartKind::Line));
        assert!(!config.wants(ChartKind::Treemap));
        assert!(Config::default().wants(ChartKind::Treemap));
    }

    #[test]
    fn rejects_out_of_range_bins_and_unknown_kinds() {
        let err = Config::from_toml_str("[charts]\nhistogram_bins = 0\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
        let err = Config::from_toml_str("[charts]\nhistogram_bins = 1001\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(msg) if msg.contains("1000")));
        assert!(Config::from_toml_str("[charts]\nhistogram_bins = 1000\n").is_ok());
        let err = Config::from_toml_str("[charts]\nkinds = [\"pie\"]\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn histogram_norm_is_read_from_charts_table() {
        assert_eq!(Config::default().charts.histogram_norm, HistNorm::Density);
        let config = Config::from_toml_str("[charts]\nhistogram_norm = \"count\"\n").unwrap();
        assert_eq!(config.charts.histogram_norm, HistNorm::Count);
        let err = Config::from_toml_str("[charts]\nhistogram_norm = \"percent\"\n").unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }
}
