//! Remote price source: one fetch per ticker, merged into date-keyed rows.
//!
//! Tickers are fetched sequentially in input order. The first provider,
//! format, or transport error aborts the whole load and no rows are returned.
//! Entry-level gaps inside a payload are skipped silently.

use super::align::SeriesArena;
use super::alpha_vantage::{parse_daily_payload, AlphaVantageClient};
use super::provider::{DataError, DownloadProgress, QuoteTransport, SilentProgress};
use crate::domain::PriceRow;
use chrono::NaiveDate;

/// Loads daily closes for a ticker list over an inclusive date range.
pub struct RemoteSource<T> {
    transport: T,
    start: NaiveDate,
    end: NaiveDate,
}

impl RemoteSource<AlphaVantageClient> {
    /// Remote source backed by the public Alpha Vantage endpoint.
    pub fn alpha_vantage(
        api_key: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, DataError> {
        Ok(Self::new(AlphaVantageClient::new(api_key)?, start, end))
    }
}

impl<T: QuoteTransport> RemoteSource<T> {
    pub fn new(transport: T, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            transport,
            start,
            end,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Load every ticker and return one row per observed date, ascending.
    pub fn load<S: AsRef<str>>(&self, tickers: &[S]) -> Result<Vec<PriceRow>, DataError> {
        self.load_with_progress(tickers, &SilentProgress)
    }

    /// Like [`load`](Self::load), reporting each fetch to `progress`.
    pub fn load_with_progress<S: AsRef<str>>(
        &self,
        tickers: &[S],
        progress: &dyn DownloadProgress,
    ) -> Result<Vec<PriceRow>, DataError> {
        let total = tickers.len();
        let mut arena = SeriesArena::new();

        for (i, ticker) in tickers.iter().enumerate() {
            let symbol = ticker.as_ref();
            progress.on_start(symbol, i, total);
            tracing::info!(
                provider = self.transport.name(),
                symbol,
                index = i + 1,
                total,
                "fetching daily series"
            );

            let body = self.transport.fetch_daily(symbol)?;
            let parsed = parse_daily_payload(symbol, &body, self.start, self.end)?;
            if parsed.skipped > 0 {
                tracing::debug!(symbol, skipped = parsed.skipped, "dropped unusable entries");
            }

            let kept = parsed.closes.len();
            arena.extend(symbol, parsed.closes);
            progress.on_complete(symbol, i, total, kept);
        }

        Ok(arena.into_rows())
    }
}
