//! Transport trait, progress reporting and structured error types.
//!
//! `QuoteTransport` abstracts over how a ticker's raw daily payload is fetched
//! so the remote source can be driven by a fake in tests.

use thiserror::Error;

/// Structured error types for data operations.
///
/// Every variant aborts the whole load it occurs in. Row-level gaps
/// (an unparseable price cell, a missing close field) are not errors;
/// they surface as absent tickers in the affected row.
#[derive(Debug, Error)]
pub enum DataError {
    /// A required field could not be read (e.g. a tabular date cell).
    #[error("parse error: {0}")]
    Parse(String),

    /// The provider reported an error, a rate limit, or a tier restriction.
    #[error("provider error for {symbol}: {message}")]
    Api { symbol: String, message: String },

    /// An expected structural element is missing from a provider payload.
    #[error("unexpected response format for {symbol}: {reason}")]
    Format { symbol: String, reason: String },

    /// The request itself failed (connection, timeout, non-success status).
    #[error("transport error for {symbol}: {reason}")]
    Transport { symbol: String, reason: String },

    #[error("HTTP client setup failed: {0}")]
    Client(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Fetches the raw daily-history payload for one ticker.
pub trait QuoteTransport {
    /// Human-readable name of this transport.
    fn name(&self) -> &str;

    /// Return the response body for `symbol`'s full daily history.
    fn fetch_daily(&self, symbol: &str) -> Result<String, DataError>;
}

/// Progress callback for multi-symbol loads.
pub trait DownloadProgress {
    /// Called before fetching a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called after a symbol's payload was merged, with the number of dates kept.
    fn on_complete(&self, _symbol: &str, _index: usize, _total: usize, _kept: usize) {}
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        println!("[{}/{}] Fetching data for {symbol}...", index + 1, total);
    }

    fn on_complete(&self, symbol: &str, _index: usize, _total: usize, kept: usize) {
        println!("  OK: {symbol} ({kept} days)");
    }
}

/// Progress reporter that discards every notification.
pub struct SilentProgress;

impl DownloadProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
}
