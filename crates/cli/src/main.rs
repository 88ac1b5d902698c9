//! Render predicted-vs-actual candlestick charts for every table pair found in
//! two SQLite databases.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use predchart_core::Config;
use predchart_ingestion::SqliteSource;
use predchart_render::{HtmlChartRenderer, PairStatus, Pipeline, PipelineReport};

#[derive(Debug, Parser)]
#[command(name = "predchart", version, about)]
struct Args {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database holding the actual price tables
    #[arg(long = "actual-db")]
    actual_db: Option<PathBuf>,

    /// Database holding the `*_predictions` tables
    #[arg(long = "predictions-db")]
    predictions_db: Option<PathBuf>,

    /// Directory receiving one HTML chart per pair
    #[arg(long = "output-dir")]
    output_dir: Option<PathBuf>,

    /// Print the run report as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

impl Args {
    fn into_config(self) -> Result<(Config, bool)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => Config::default(),
        };
        if let Some(path) = self.actual_db {
            config.sources.actual_db = path;
        }
        if let Some(path) = self.predictions_db {
            config.sources.predictions_db = path;
        }
        if let Some(dir) = self.output_dir {
            config.chart.output_dir = dir;
        }
        config.validate().context("invalid configuration")?;
        Ok((config, self.json))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_summary(report: &PipelineReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            PairStatus::Rendered { artifact, mode, .. } => {
                println!(
                    "{:<24} rendered  {:?} -> {}",
                    outcome.pair.actual,
                    mode,
                    artifact.display()
                );
            }
            PairStatus::Skipped { reason } => {
                println!("{:<24} skipped   {:?}", outcome.pair.actual, reason);
            }
            PairStatus::Failed { kind, message } => {
                println!("{:<24} failed    {:?}: {}", outcome.pair.actual, kind, message);
            }
        }
    }
    println!(
        "{} rendered, {} skipped, {} failed",
        report.rendered(),
        report.skipped(),
        report.failed()
    );
}

fn run(args: Args) -> Result<PipelineReport> {
    let (config, json) = args.into_config()?;

    let actual = SqliteSource::open(&config.sources.actual_db)
        .with_context(|| format!("opening {}", config.sources.actual_db.display()))?;
    let predicted = SqliteSource::open(&config.sources.predictions_db)
        .with_context(|| format!("opening {}", config.sources.predictions_db.display()))?;
    tracing::info!(
        actual = %config.sources.actual_db.display(),
        predicted = %config.sources.predictions_db.display(),
        output_dir = %config.chart.output_dir.display(),
        "opened databases"
    );

    let renderer = HtmlChartRenderer::new(config.chart.clone());
    let report = Pipeline::new(&config)
        .run(&actual, &predicted, &renderer)
        .context("listing actual tables")?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report);
    }
    Ok(report)
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(report) if report.failed() == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
