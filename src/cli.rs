use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

use pavement_report::charts::ChartKind;
use pavement_report::{Config, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown text and text-mode charts on stdout
    Console,
    /// Ordered list of text, table and chart items as a JSON document
    Json,
}

/// Summarize road pavement condition by road type
///
/// Examples:
///   pavement_report data/sample.csv
///   pavement_report data/sample.csv --chart bar --chart line
///   pavement_report --format json --output report.json --export-dir tables/
///   pavement_report --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file of pavement segments (overrides the config file)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE", env = "PAVEMENT_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
    pub format: OutputFormat,

    /// Where the JSON document is written when --format json is used
    #[arg(short, long, value_name = "FILE", default_value = "pavement_report.json")]
    pub output: PathBuf,

    /// Also write the summary tables as CSV files into this directory
    #[arg(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Only present charts of this kind (repeatable): bar, scatter, histogram, treemap, line
    #[arg(long = "chart", value_name = "KIND")]
    pub charts: Vec<String>,

    /// Date format of the Last Maintenance column
    #[arg(long, value_name = "FORMAT")]
    pub date_format: Option<String>,

    /// Number of histogram bins for rutting (1 to 1000)
    #[arg(long, value_name = "COUNT")]
    pub bins: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Write a default pavement_report.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }

    /// Apply command-line overrides on top of the file configuration.
    pub fn merge_into(&self, config: &mut Config) -> Result<()> {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(fmt) = &self.date_format {
            config.input.date_format = fmt.clone();
        }
        if let Some(bins) = self.bins {
            config.charts.histogram_bins = bins;
        }
        if !self.charts.is_empty() {
            config.charts.kinds = self
                .charts
                .iter()
                .map(|k| k.parse::<ChartKind>())
                .collect::<Result<Vec<_>>>()?;
        }
        config.validate()
    }
}
