//! Pipeline driver — source selection, optimizer invocation, result export.
//!
//! Entry points:
//! - `run_pipeline()`: validate config, ingest from the configured source,
//!   optimize, write results. Used by the CLI.
//! - `ingest()` / `ingest_remote()`: the ingestion half on its own. Used by
//!   the `download` command and by tests with a fake transport.
//! - `run_from_rows()`: the optimize-and-export half over pre-loaded rows.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use sharpelab_core::data::{
    coverage, AlphaVantageClient, CoverageReport, DataError, DownloadProgress, QuoteTransport,
    RemoteSource, TabularSource,
};
use sharpelab_core::{PortfolioResult, PriceRow};
use thiserror::Error;

use crate::config::{ConfigError, PipelineConfig, SourceMode};
use crate::export::{ExportError, ResultWriter};
use crate::optimizer::{OptimizeError, Optimizer};

/// Errors from a pipeline run. Every stage is fail-fast.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("optimizer error: {0}")]
    Optimize(#[from] OptimizeError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub mode: SourceMode,
    pub row_count: usize,
    /// Tickers handed to the optimizer, in order.
    pub tickers: Vec<String>,
    /// BLAKE3 over the ingested rows.
    pub dataset_hash: String,
    pub coverage: CoverageReport,
    pub data_quality_warnings: Vec<String>,
    pub result_count: usize,
    pub best: Option<PortfolioResult>,
    pub output_path: PathBuf,
}

/// Rows plus the ticker list they should be optimized over.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub rows: Vec<PriceRow>,
    pub tickers: Vec<String>,
}

/// Validate, ingest, optimize, and write results.
pub fn run_pipeline(
    config: &PipelineConfig,
    optimizer: &dyn Optimizer,
    progress: &dyn DownloadProgress,
) -> Result<PipelineSummary, RunError> {
    let ingested = ingest(config, progress)?;
    run_from_rows(config, ingested, optimizer)
}

/// Load rows from whichever source `config` selects.
pub fn ingest(
    config: &PipelineConfig,
    progress: &dyn DownloadProgress,
) -> Result<Ingested, RunError> {
    config.validate()?;

    match config.source.mode {
        SourceMode::Tabular => {
            let path = &config.source.input_path;
            tracing::info!(path = %path.display(), "loading tabular prices");
            let rows = TabularSource::new().load(path)?;
            let tickers = observed_tickers(&rows);
            Ok(Ingested { rows, tickers })
        }
        SourceMode::Remote => {
            let api_key = config.api_key().ok_or(ConfigError::MissingCredential)?;
            let client = AlphaVantageClient::with_options(
                api_key,
                config.source.base_url.as_str(),
                Duration::from_secs(config.source.timeout_secs),
            )?;
            ingest_remote(config, client, progress)
        }
    }
}

/// Remote ingestion of the configured universe over `transport`.
pub fn ingest_remote<T: QuoteTransport>(
    config: &PipelineConfig,
    transport: T,
    progress: &dyn DownloadProgress,
) -> Result<Ingested, RunError> {
    config.validate()?;

    let source = RemoteSource::new(transport, config.source.start_date, config.source.end_date);
    let tickers = config.universe.tickers.clone();
    tracing::info!(
        tickers = tickers.len(),
        start = %source.start(),
        end = %source.end(),
        "loading remote prices"
    );
    let rows = source.load_with_progress(tickers.as_slice(), progress)?;
    Ok(Ingested { rows, tickers })
}

/// Optimize pre-loaded rows and write the results to the configured output.
pub fn run_from_rows(
    config: &PipelineConfig,
    ingested: Ingested,
    optimizer: &dyn Optimizer,
) -> Result<PipelineSummary, RunError> {
    let Ingested { rows, tickers } = ingested;

    let report = coverage(&rows, &tickers);
    let warnings = quality_warnings(&report);
    for w in &warnings {
        tracing::warn!("{w}");
    }

    let hash = dataset_hash(&rows);
    tracing::info!(
        optimizer = optimizer.name(),
        rows = rows.len(),
        tickers = tickers.len(),
        dataset_hash = %hash,
        "optimizing"
    );
    let results = optimizer.optimize(&rows, &tickers)?;

    let output_path = config.output.path.clone();
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(ExportError::from)?;
    }
    ResultWriter::new().write(&output_path, &results)?;

    Ok(PipelineSummary {
        mode: config.source.mode,
        row_count: rows.len(),
        tickers,
        dataset_hash: hash,
        coverage: report,
        data_quality_warnings: warnings,
        result_count: results.len(),
        best: best_result(&results).cloned(),
        output_path,
    })
}

/// Highest-Sharpe result. Ties go to the earliest; NaN scores never win.
pub fn best_result(results: &[PortfolioResult]) -> Option<&PortfolioResult> {
    results
        .iter()
        .filter(|r| !r.sharpe.is_nan())
        .fold(None, |best, r| match best {
            Some(b) if b.sharpe >= r.sharpe => Some(b),
            _ => Some(r),
        })
}

/// Every ticker quoted on at least one row, sorted.
pub fn observed_tickers(rows: &[PriceRow]) -> Vec<String> {
    rows.iter()
        .flat_map(|r| r.prices.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Deterministic BLAKE3 hash over dates and prices, row order included.
pub fn dataset_hash(rows: &[PriceRow]) -> String {
    let mut hasher = blake3::Hasher::new();
    for row in rows {
        hasher.update(row.date.to_string().as_bytes());
        for (ticker, price) in &row.prices {
            hasher.update(ticker.as_bytes());
            hasher.update(&[0]);
            hasher.update(price.normalize().to_string().as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(b"\n");
    }
    hasher.finalize().to_hex().to_string()
}

fn quality_warnings(report: &CoverageReport) -> Vec<String> {
    let mut warnings = Vec::new();
    if report.row_count == 0 {
        warnings.push("no price rows were ingested".to_string());
        return warnings;
    }
    for ticker in report.missing() {
        warnings.push(format!("{ticker}: no prices in range"));
    }
    for ticker in report.partial() {
        let pct = report.by_ticker[ticker] * 100.0;
        warnings.push(format!("{ticker}: quoted on {pct:.1}% of rows"));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn result(sharpe: f64) -> PortfolioResult {
        PortfolioResult::new(vec!["AAA".into()], vec![1.0], sharpe)
    }

    fn row(date: &str, prices: &[(&str, &str)]) -> PriceRow {
        let mut r = PriceRow::new(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap());
        for (t, p) in prices {
            r.prices.insert(t.to_string(), p.parse().unwrap());
        }
        r
    }

    #[test]
    fn best_is_max_sharpe() {
        let results = vec![result(0.5), result(1.5), result(-2.0)];
        assert_eq!(best_result(&results).unwrap().sharpe, 1.5);
    }

    #[test]
    fn best_tie_goes_to_first() {
        let mut a = result(1.0);
        a.tickers = vec!["FIRST".into()];
        let mut b = result(1.0);
        b.tickers = vec!["SECOND".into()];
        let results = vec![result(0.1), a, b];
        assert_eq!(best_result(&results).unwrap().tickers, vec!["FIRST"]);
    }

    #[test]
    fn best_ignores_nan_and_handles_empty() {
        assert!(best_result(&[]).is_none());
        let results = vec![result(f64::NAN), result(-3.0)];
        assert_eq!(best_result(&results).unwrap().sharpe, -3.0);
    }

    #[test]
    fn best_handles_all_negative() {
        let results = vec![result(-5.0), result(-1.0), result(-2.0)];
        assert_eq!(best_result(&results).unwrap().sharpe, -1.0);
    }

    #[test]
    fn dataset_hash_is_deterministic_and_order_sensitive() {
        let a = vec![
            row("2024-01-01", &[("AAA", "1.0")]),
            row("2024-01-02", &[("AAA", "2.0")]),
        ];
        let b = vec![
            row("2024-01-02", &[("AAA", "2.0")]),
            row("2024-01-01", &[("AAA", "1.0")]),
        ];
        assert_eq!(dataset_hash(&a), dataset_hash(&a.clone()));
        assert_ne!(dataset_hash(&a), dataset_hash(&b));
        assert_eq!(dataset_hash(&a).len(), 64);
    }

    #[test]
    fn dataset_hash_ignores_trailing_zeros() {
        let a = vec![row("2024-01-01", &[("AAA", "1.0")])];
        let b = vec![row("2024-01-01", &[("AAA", "1.00")])];
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn observed_tickers_are_sorted_union() {
        let rows = vec![
            row("2024-01-01", &[("BBB", "1")]),
            row("2024-01-02", &[("AAA", "1")]),
        ];
        assert_eq!(observed_tickers(&rows), vec!["AAA", "BBB"]);
    }

    #[test]
    fn warnings_flag_missing_and_partial() {
        let rows = vec![
            row("2024-01-01", &[("AAA", "1")]),
            row("2024-01-02", &[("AAA", "1"), ("BBB", "1")]),
        ];
        let report = coverage(&rows, &["AAA", "BBB", "CCC"]);
        let warnings = quality_warnings(&report);
        assert_eq!(
            warnings,
            vec!["CCC: no prices in range", "BBB: quoted on 50.0% of rows"]
        );
    }
}
