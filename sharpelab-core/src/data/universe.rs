//! Ticker universe — the ordered symbol list a remote load requests.
//!
//! The default universe is the fixed 30-symbol Dow Jones Industrial Average
//! constituents list. A custom list can be supplied through configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Dow Jones Industrial Average constituents.
pub const DOW_JONES_30: [&str; 30] = [
    "UNH", "GS", "MSFT", "HD", "V", "SHW", "MCD", "CAT", "AMGN", "AXP", "TRV", "CRM", "IBM",
    "JPM", "AAPL", "HON", "AMZN", "PG", "BA", "JNJ", "CVX", "MMM", "NVDA", "WMT", "DIS", "MRK",
    "KO", "CSCO", "NKE", "VZ",
];

/// Ordered, duplicate-free ticker list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    pub tickers: Vec<String>,
}

impl Universe {
    pub fn new(tickers: Vec<String>) -> Self {
        Self { tickers }
    }

    pub fn dow_jones() -> Self {
        Self::new(DOW_JONES_30.iter().map(|t| t.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// First ticker that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.tickers
            .iter()
            .find(|t| !seen.insert(t.as_str()))
            .map(|t| t.as_str())
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::dow_jones()
    }
}
