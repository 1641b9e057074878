//! Confluence CLI: replay recorded bars and inspect analyzer configuration.
//!
//! Commands:
//! - `replay`: feed a CSV of closed bars through the analyzer, write signals as JSON lines
//! - `config`: print the default (or a loaded) configuration as TOML
//! - `backfill`: print how many historical bars to fetch per resolution

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use confluence_core::{Analyzer, AnalyzerConfig, Bar, PassOutcome, Resolution};

#[derive(Parser)]
#[command(
    name = "confluence",
    about = "Confluence CLI: multi-timeframe market-structure analysis"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay closed bars from a CSV file through the analyzer.
    Replay {
        /// CSV with columns resolution, open_time, close_time, open, high, low,
        /// close, volume, trades, closed. Rows are fed in file order.
        #[arg(long)]
        bars: PathBuf,

        /// Path to a TOML config file. Defaults to the built-in tables.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write signals here as JSON lines instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the configuration as TOML.
    Config {
        /// Load and validate this file instead of printing the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the bar count a historical backfill should request per resolution.
    Backfill {
        /// Path to a TOML config file. Defaults to the built-in tables.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            bars,
            config,
            output,
        } => run_replay(&bars, config.as_deref(), output.as_deref()),
        Commands::Config { config } => run_config(config.as_deref()),
        Commands::Backfill { config } => run_backfill(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    match path {
        Some(path) => AnalyzerConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(AnalyzerConfig::default()),
    }
}

/// Per-run tallies reported once the replay finishes.
#[derive(Default)]
struct ReplaySummary {
    accepted: usize,
    rejected: usize,
    signals: usize,
    outcomes: BTreeMap<&'static str, usize>,
}

fn run_replay(bars_path: &Path, config_path: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let mut analyzer = Analyzer::new(config).context("building analyzer")?;
    tracing::info!(
        config_id = analyzer.config_id(),
        bars = %bars_path.display(),
        "starting replay"
    );

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut reader = csv::Reader::from_path(bars_path)
        .with_context(|| format!("opening {}", bars_path.display()))?;

    let mut summary = ReplaySummary::default();
    for (row, record) in reader.deserialize::<Bar>().enumerate() {
        let bar = record.with_context(|| format!("parsing CSV row {}", row + 1))?;
        let outcome = match analyzer.submit_bar(bar) {
            Ok(outcome) => outcome,
            Err(err) => {
                summary.rejected += 1;
                tracing::warn!(row = row + 1, error = %err, "bar rejected");
                continue;
            }
        };
        summary.accepted += 1;
        *summary.outcomes.entry(outcome.label()).or_default() += 1;
        tracing::debug!(
            row = row + 1,
            resolution = %bar.resolution,
            state = ?analyzer.state(),
            outcome = outcome.label(),
            "pass complete"
        );

        if let PassOutcome::Emitted(signal) = outcome {
            summary.signals += 1;
            tracing::info!(
                direction = ?signal.direction,
                score = signal.score,
                entry = signal.entry,
                stop_loss = signal.stop_loss,
                risk_reward = signal.risk_reward,
                "signal emitted"
            );
            serde_json::to_writer(&mut writer, &signal)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;

    tracing::info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        signals = summary.signals,
        outcomes = ?summary.outcomes,
        "replay finished"
    );
    Ok(())
}

fn run_config(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("# config id {}", config.fingerprint());
    print!("{}", config.to_toml_string()?);
    Ok(())
}

fn run_backfill(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{:<8} {:>8} {:>8}", "res", "capacity", "request");
    for resolution in Resolution::ALL {
        println!(
            "{:<8} {:>8} {:>8}",
            resolution.as_str(),
            config.resolution(resolution).capacity,
            config.required_bar_count(resolution)
        );
    }
    Ok(())
}
