//! Per-ticker coverage diagnostics over a row set.

use crate::domain::PriceRow;
use std::collections::BTreeMap;

/// Fraction of rows (0.0..=1.0) that carry a price, per ticker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageReport {
    pub row_count: usize,
    pub by_ticker: BTreeMap<String, f64>,
}

impl CoverageReport {
    /// Tickers with no price on any row.
    pub fn missing(&self) -> Vec<&str> {
        self.by_ticker
            .iter()
            .filter(|(_, c)| **c == 0.0)
            .map(|(t, _)| t.as_str())
            .collect()
    }

    /// Tickers quoted on some but not all rows.
    pub fn partial(&self) -> Vec<&str> {
        self.by_ticker
            .iter()
            .filter(|(_, c)| **c > 0.0 && **c < 1.0)
            .map(|(t, _)| t.as_str())
            .collect()
    }
}

/// Compute coverage for `tickers` across `rows`.
pub fn coverage<S: AsRef<str>>(rows: &[PriceRow], tickers: &[S]) -> CoverageReport {
    let n = rows.len();
    let by_ticker = tickers
        .iter()
        .map(|t| {
            let t = t.as_ref();
            let present = rows.iter().filter(|r| r.has(t)).count();
            let frac = if n == 0 { 0.0 } else { present as f64 / n as f64 };
            (t.to_string(), frac)
        })
        .collect();

    CoverageReport {
        row_count: n,
        by_ticker,
    }
}
