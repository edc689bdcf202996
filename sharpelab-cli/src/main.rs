//! SharpeLab CLI — ingest prices, run the optimizer, export results.
//!
//! Commands:
//! - `run` — ingest from the configured source, optimize, write the result CSV
//! - `download` — fetch the universe from the remote API and save it as a
//!   tabular file for later offline runs
//! - `best` — print the highest-Sharpe entry of an existing result file

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sharpelab_core::data::{StdoutProgress, TabularSource};
use sharpelab_core::PortfolioResult;
use sharpelab_runner::{
    best_result, ingest, read_results, run_pipeline, MonteCarloOptimizer, PipelineConfig,
    PipelineSummary, SourceMode,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sharpelab",
    about = "SharpeLab CLI — price ingestion and portfolio Sharpe search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest prices, run the optimizer and write the result CSV.
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Result CSV path.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Number of random portfolios to score.
        #[arg(long)]
        simulations: Option<usize>,

        /// Tickers per portfolio.
        #[arg(long)]
        portfolio_size: Option<usize>,

        /// RNG seed for the optimizer.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Fetch the ticker universe from the remote API and save it as a tabular file.
    Download {
        #[command(flatten)]
        source: SourceArgs,

        /// Destination file (Date,<ticker>... layout).
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the best (maximum Sharpe) entry of a result file.
    Best {
        /// Result CSV written by `run`.
        #[arg(long, default_value = "data/output.csv")]
        results: PathBuf,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Price source: tabular or remote.
    #[arg(long)]
    mode: Option<SourceMode>,

    /// Tabular input file.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Start date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Alpha Vantage API key.
    #[arg(long, env = "ALPHAVANTAGE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl SourceArgs {
    /// Load the config file (or defaults) and apply flag overrides.
    fn resolve(self) -> Result<PipelineConfig> {
        let mut cfg = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(mode) = self.mode {
            cfg.source.mode = mode;
        }
        if let Some(input) = self.input {
            cfg.source.input_path = input;
        }
        if let Some(start) = self.start {
            cfg.source.start_date = start;
        }
        if let Some(end) = self.end {
            cfg.source.end_date = end;
        }
        if let Some(key) = self.api_key {
            cfg.source.api_key = Some(key);
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            output,
            simulations,
            portfolio_size,
            seed,
        } => {
            let mut cfg = source.resolve()?;
            if let Some(output) = output {
                cfg.output.path = output;
            }
            if let Some(n) = simulations {
                cfg.optimizer.simulations = n;
            }
            if let Some(n) = portfolio_size {
                cfg.optimizer.portfolio_size = n;
            }
            if let Some(seed) = seed {
                cfg.optimizer.seed = seed;
            }
            run_cmd(&cfg)
        }
        Commands::Download { source, output } => {
            let mut cfg = source.resolve()?;
            cfg.source.mode = SourceMode::Remote;
            download_cmd(&cfg, &output)
        }
        Commands::Best { results } => best_cmd(&results),
    }
}

fn run_cmd(cfg: &PipelineConfig) -> Result<()> {
    let optimizer = MonteCarloOptimizer::from_config(&cfg.optimizer);
    let summary = run_pipeline(cfg, &optimizer, &StdoutProgress).context("pipeline failed")?;
    print_summary(&summary);
    Ok(())
}

fn download_cmd(cfg: &PipelineConfig, output: &Path) -> Result<()> {
    let ingested = ingest(cfg, &StdoutProgress).context("download failed")?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    TabularSource::new()
        .save(output, &ingested.rows, &ingested.tickers)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!();
    println!(
        "Saved {} rows x {} tickers ({} to {}) to {}",
        ingested.rows.len(),
        ingested.tickers.len(),
        cfg.source.start_date,
        cfg.source.end_date,
        output.display()
    );
    Ok(())
}

fn best_cmd(path: &Path) -> Result<()> {
    let results =
        read_results(path).with_context(|| format!("failed to read {}", path.display()))?;
    match best_result(&results) {
        Some(best) => {
            println!("Results: {} ({} entries)", path.display(), results.len());
            print_portfolio(best);
        }
        None => println!("No results in {}", path.display()),
    }
    Ok(())
}

fn print_summary(summary: &PipelineSummary) {
    println!();
    println!("=== Pipeline Result ===");
    println!("Source:       {}", summary.mode);
    println!("Rows:         {}", summary.row_count);
    println!("Tickers:      {}", summary.tickers.len());
    println!("Dataset hash: {}", summary.dataset_hash);
    println!("Portfolios:   {}", summary.result_count);
    println!("Output:       {}", summary.output_path.display());
    for warn in &summary.data_quality_warnings {
        println!("WARNING: {warn}");
    }
    println!();
    match &summary.best {
        Some(best) => print_portfolio(best),
        None => println!("No scorable portfolio was produced."),
    }
}

fn print_portfolio(best: &PortfolioResult) {
    println!("Max Sharpe Ratio: {:.4}", best.sharpe);
    println!("{:<8} {:>8}", "Ticker", "Weight");
    println!("{}", "-".repeat(17));
    for (ticker, weight) in best.allocations() {
        println!("{:<8} {:>7.2}%", ticker, weight * 100.0);
    }
}
