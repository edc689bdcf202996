//! Tabular price source: a local delimited file with one date column and one
//! column per ticker.
//!
//! ```text
//! Date,AAPL,MSFT
//! 2024-01-02,185.64,370.87
//! 2024-01-03,,370.60
//! ```
//!
//! Rows come back in file order, duplicates included. An unparseable date
//! aborts the load; an unparseable price cell only drops that ticker from
//! that row.

use super::fields::{parse_date, parse_price};
use super::provider::DataError;
use crate::domain::PriceRow;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const DEFAULT_DATE_COLUMN: &str = "Date";

/// Reads and writes the `Date,<ticker>...` file layout.
#[derive(Debug, Clone)]
pub struct TabularSource {
    date_column: String,
}

impl TabularSource {
    pub fn new() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
        }
    }

    /// Use a different header name for the date column.
    pub fn with_date_column(mut self, name: impl Into<String>) -> Self {
        self.date_column = name.into();
        self
    }

    /// Load every data row of the file at `path`.
    pub fn load(&self, path: &Path) -> Result<Vec<PriceRow>, DataError> {
        let file = File::open(path)?;
        let rows = self.load_from_reader(file)?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "loaded tabular prices");
        Ok(rows)
    }

    /// Load rows from any reader carrying the tabular layout.
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<Vec<PriceRow>, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(DataError::Parse("missing header row".into()));
        }

        let date_idx = headers
            .iter()
            .position(|h| clean_header(h) == self.date_column)
            .ok_or_else(|| {
                DataError::Parse(format!("header has no `{}` column", self.date_column))
            })?;

        let tickers: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != date_idx)
            .map(|(i, h)| (i, clean_header(h).to_string()))
            .filter(|(_, h)| !h.is_empty())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let raw_date = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| {
                DataError::Parse(format!("line {line}: unparseable date {raw_date:?}"))
            })?;

            let mut row = PriceRow::new(date);
            for (idx, ticker) in &tickers {
                if let Some(price) = record.get(*idx).and_then(parse_price) {
                    row.prices.insert(ticker.clone(), price);
                }
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// Write `rows` to `path` in the tabular layout, overwriting any existing file.
    ///
    /// Columns follow `tickers`; a ticker absent from a row becomes an empty cell.
    pub fn save(&self, path: &Path, rows: &[PriceRow], tickers: &[String]) -> Result<(), DataError> {
        let file = File::create(path)?;
        self.write_to(file, rows, tickers)?;
        tracing::debug!(path = %path.display(), rows = rows.len(), "saved tabular prices");
        Ok(())
    }

    pub fn write_to<W: Write>(
        &self,
        writer: W,
        rows: &[PriceRow],
        tickers: &[String],
    ) -> Result<(), DataError> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(tickers.len() + 1);
        header.push(self.date_column.as_str());
        header.extend(tickers.iter().map(|t| t.as_str()));
        wtr.write_record(&header)?;

        for row in rows {
            let mut record = Vec::with_capacity(tickers.len() + 1);
            record.push(row.date.format("%Y-%m-%d").to_string());
            for ticker in tickers {
                record.push(row.price(ticker).map(|p| p.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for TabularSource {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_header(h: &str) -> &str {
    h.trim_start_matches('\u{feff}').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn load(text: &str) -> Result<Vec<PriceRow>, DataError> {
        TabularSource::new().load_from_reader(text.as_bytes())
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn px(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn blank_cells_are_omitted_per_row() {
        let rows = load("Date,AAA,BBB\n2024-01-01,10.5,\n2024-01-02,,20.0\n").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, d("2024-01-01"));
        assert_eq!(rows[0].prices.len(), 1);
        assert_eq!(rows[0].price("AAA"), Some(px("10.5")));
        assert_eq!(rows[1].date, d("2024-01-02"));
        assert_eq!(rows[1].prices.len(), 1);
        assert_eq!(rows[1].price("BBB"), Some(px("20.0")));
    }

    #[test]
    fn malformed_cell_does_not_touch_neighbours() {
        let rows = load("Date,AAA,BBB,CCC\n2024-01-01,1.0,oops,3.0\n").unwrap();
        assert_eq!(rows[0].price("AAA"), Some(px("1.0")));
        assert!(!rows[0].has("BBB"));
        assert_eq!(rows[0].price("CCC"), Some(px("3.0")));
    }

    #[test]
    fn bad_date_is_fatal() {
        let err = load("Date,AAA\n2024-01-01,1.0\nyesterday,2.0\n").unwrap_err();
        match err {
            DataError::Parse(msg) => assert!(msg.contains("yesterday"), "{msg}"),
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_date_column_is_fatal() {
        let err = load("Day,AAA\n2024-01-01,1.0\n").unwrap_err();
        assert!(matches!(err, DataError::Parse(_)));
    }

    #[test]
    fn duplicate_dates_are_kept_in_file_order() {
        let rows = load("Date,AAA\n2024-01-01,1.0\n2024-01-01,2.0\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price("AAA"), Some(px("1.0")));
        assert_eq!(rows[1].price("AAA"), Some(px("2.0")));
    }

    #[test]
    fn short_record_treats_missing_cells_as_absent() {
        let rows = load("Date,AAA,BBB\n2024-01-01,1.0\n").unwrap();
        assert_eq!(rows[0].prices.len(), 1);
    }

    #[test]
    fn custom_date_column() {
        let rows = TabularSource::new()
            .with_date_column("Day")
            .load_from_reader("Day,AAA\n2024-01-01,1.0\n".as_bytes())
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn write_then_load_preserves_sparsity() {
        let rows = load("Date,AAA,BBB\n2024-01-01,10.5,\n2024-01-02,,20.0\n").unwrap();
        let tickers = vec!["AAA".to_string(), "BBB".to_string()];

        let mut buf = Vec::new();
        TabularSource::new().write_to(&mut buf, &rows, &tickers).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Date,AAA,BBB\n"));

        assert_eq!(load(&text).unwrap(), rows);
    }
}
