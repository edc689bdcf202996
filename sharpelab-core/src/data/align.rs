//! Date-keyed merge arena for multi-ticker loads.
//!
//! Each ticker's quotes are inserted independently under their date. A date
//! seen for any ticker becomes one row carrying whichever tickers quoted it;
//! no placeholder is fabricated for the others.

use crate::domain::PriceRow;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Accumulates `date -> (ticker -> price)` across every ticker of one load.
#[derive(Debug, Default, Clone)]
pub struct SeriesArena {
    by_date: BTreeMap<NaiveDate, BTreeMap<String, Decimal>>,
}

impl SeriesArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite `ticker`'s price on `date`.
    pub fn insert(&mut self, date: NaiveDate, ticker: &str, price: Decimal) {
        self.by_date
            .entry(date)
            .or_default()
            .insert(ticker.to_string(), price);
    }

    /// Merge a whole ticker series.
    pub fn extend<I>(&mut self, ticker: &str, quotes: I)
    where
        I: IntoIterator<Item = (NaiveDate, Decimal)>,
    {
        for (date, price) in quotes {
            self.insert(date, ticker, price);
        }
    }

    /// Number of distinct dates observed so far.
    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }

    /// Convert into rows, one per distinct date, ascending by date.
    pub fn into_rows(self) -> Vec<PriceRow> {
        self.by_date
            .into_iter()
            .map(|(date, prices)| PriceRow::with_prices(date, prices))
            .collect()
    }
}
