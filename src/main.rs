// Entry point: load the segment CSV once, build the report, hand it to the
// chosen presenter and optionally export the summary tables.
mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Args, OutputFormat};
use pavement_report::loader;
use pavement_report::output::{export_tables, ConsolePresenter, JsonPresenter};
use pavement_report::util::format_int;
use pavement_report::{Config, Report};

const DEFAULT_CONFIG: &str = "pavement_report.toml";

fn main() {
    let args = Args::parse();

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);

    if let Err(e) = run(args) {
        error!("Report failed: {:#}", e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over --verbose/--quiet when set.
fn init_logging(args: &Args) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG);
    if path.exists() {
        bail!("{} already exists; edit it or remove it first", DEFAULT_CONFIG);
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG))?;
    println!("Created {} with default settings.", DEFAULT_CONFIG);
    Ok(())
}

fn load_config(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => Some(path.as_path()),
        None => Some(Path::new(DEFAULT_CONFIG)).filter(|p| p.exists()),
    };
    let mut config = match path {
        Some(path) => {
            info!(path = %path.display(), "Using configuration file");
            Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => Config::default(),
    };
    args.merge_into(&mut config)?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    let (rows, load_report) = loader::load_rows(&config.input.path)
        .with_context(|| format!("Failed to load {}", config.input.path.display()))?;
    if rows.is_empty() {
        bail!("{} contains no segment rows", config.input.path.display());
    }
    info!(
        "Processing dataset... ({} rows loaded, {} without a maintenance date)",
        format_int(load_report.total_rows),
        format_int(load_report.missing_dates)
    );
    if load_report.missing_rutting > 0 {
        warn!(
            "{} rows have no rutting value and are left out of the histogram",
            format_int(load_report.missing_rutting)
        );
    }

    let report = Report::build(&rows, &config)?;

    match args.format {
        OutputFormat::Console => {
            let stdout = io::stdout();
            let mut presenter = ConsolePresenter::new(stdout.lock(), &config.output);
            report.present(&mut presenter, &config)?;
        }
        OutputFormat::Json => {
            let mut presenter = JsonPresenter::new();
            report.present(&mut presenter, &config)?;
            presenter.finish(&args.output)?;
        }
    }

    if let Some(dir) = &args.export_dir {
        let written = export_tables(dir, &report)
            .with_context(|| format!("Failed to export tables to {}", dir.display()))?;
        info!("Exported {} tables to {}", written.len(), dir.display());
    }
    Ok(())
}
