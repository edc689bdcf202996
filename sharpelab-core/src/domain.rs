//! Domain types shared by ingestion, the optimizer boundary and export.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One calendar date plus the closing price of every ticker quoted that day.
///
/// A row may be sparse: tickers without a quote on `date` are simply absent
/// from `prices`. Consumers must tolerate missing entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub prices: BTreeMap<String, Decimal>,
}

impl PriceRow {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            prices: BTreeMap::new(),
        }
    }

    pub fn with_prices(date: NaiveDate, prices: BTreeMap<String, Decimal>) -> Self {
        Self { date, prices }
    }

    /// Closing price for `ticker`, if quoted on this row's date.
    pub fn price(&self, ticker: &str) -> Option<Decimal> {
        self.prices.get(ticker).copied()
    }

    pub fn has(&self, ticker: &str) -> bool {
        self.prices.contains_key(ticker)
    }

    /// True if the row lacks at least one of `universe`.
    pub fn is_sparse<S: AsRef<str>>(&self, universe: &[S]) -> bool {
        universe.iter().any(|t| !self.has(t.as_ref()))
    }
}

/// One optimizer outcome: a weighted portfolio and its Sharpe score.
///
/// `tickers` and `weights` are paired by position. Their lengths are not
/// checked here; weight normalisation is the optimizer's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub tickers: Vec<String>,
    pub weights: Vec<f64>,
    pub sharpe: f64,
}

impl PortfolioResult {
    pub fn new(tickers: Vec<String>, weights: Vec<f64>, sharpe: f64) -> Self {
        Self {
            tickers,
            weights,
            sharpe,
        }
    }

    /// Ticker/weight pairs in portfolio order.
    pub fn allocations(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.tickers
            .iter()
            .map(|t| t.as_str())
            .zip(self.weights.iter().copied())
    }
}
