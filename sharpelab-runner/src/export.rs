//! Result export — the fixed-layout portfolio CSV.
//!
//! Layout: `T1..Tn,W1..Wn,Sharpe` with `n` ticker slots and `n` weight slots.
//! `n` is 25 unless some result carries more tickers or weights, in which case
//! the whole file widens to fit. Shorter results are padded with empty cells
//! so every line has the header's field count and Sharpe is always last.
//!
//! No quoting is applied: tickers and numbers must not contain commas.

use csv::QuoteStyle;
use sharpelab_core::PortfolioResult;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

/// Minimum number of ticker (and weight) slots in the header.
pub const DEFAULT_SLOTS: usize = 25;

pub const SHARPE_COLUMN: &str = "Sharpe";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed result file at line {line}: {reason}")]
    Malformed { line: u64, reason: String },
}

/// Writes portfolio results in the `T*,W*,Sharpe` layout.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    min_slots: usize,
}

impl ResultWriter {
    pub fn new() -> Self {
        Self {
            min_slots: DEFAULT_SLOTS,
        }
    }

    /// Slot count used for `results`.
    pub fn slot_count(&self, results: &[PortfolioResult]) -> usize {
        results
            .iter()
            .map(|r| r.tickers.len().max(r.weights.len()))
            .fold(self.min_slots, usize::max)
    }

    /// Header fields for `slots` ticker/weight pairs.
    pub fn header(slots: usize) -> Vec<String> {
        (1..=slots)
            .map(|i| format!("T{i}"))
            .chain((1..=slots).map(|i| format!("W{i}")))
            .chain(std::iter::once(SHARPE_COLUMN.to_string()))
            .collect()
    }

    /// Write `results` to `path`, replacing any existing file.
    pub fn write(&self, path: &Path, results: &[PortfolioResult]) -> Result<(), ExportError> {
        let file = File::create(path)?;
        self.write_to(file, results)?;
        tracing::info!(path = %path.display(), results = results.len(), "wrote portfolio results");
        Ok(())
    }

    pub fn write_to<W: Write>(
        &self,
        writer: W,
        results: &[PortfolioResult],
    ) -> Result<(), ExportError> {
        let slots = self.slot_count(results);
        let mut wtr = csv::WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .from_writer(writer);

        wtr.write_record(Self::header(slots))?;

        for r in results {
            let mut record: Vec<String> = Vec::with_capacity(slots * 2 + 1);
            record.extend(padded(r.tickers.iter().cloned(), slots));
            record.extend(padded(r.weights.iter().map(|w| w.to_string()), slots));
            record.push(r.sharpe.to_string());
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for ResultWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn padded<I: Iterator<Item = String>>(cells: I, slots: usize) -> impl Iterator<Item = String> {
    cells.chain(std::iter::repeat(String::new())).take(slots)
}

/// Read a result file back. Empty padding cells are ignored.
pub fn read_results(path: &Path) -> Result<Vec<PortfolioResult>, ExportError> {
    read_results_from(File::open(path)?)
}

pub fn read_results_from<R: Read>(reader: R) -> Result<Vec<PortfolioResult>, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.iter().last() != Some(SHARPE_COLUMN) {
        return Err(ExportError::Malformed {
            line: 1,
            reason: format!("last header column must be '{SHARPE_COLUMN}'"),
        });
    }

    let mut results = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |reason: String| ExportError::Malformed { line, reason };

        if record.len() % 2 == 0 {
            return Err(malformed(format!(
                "expected an odd field count, got {}",
                record.len()
            )));
        }
        let slots = (record.len() - 1) / 2;

        let tickers: Vec<String> = record
            .iter()
            .take(slots)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        let weights = record
            .iter()
            .skip(slots)
            .take(slots)
            .filter(|c| !c.is_empty())
            .map(|c| {
                c.trim()
                    .parse::<f64>()
                    .map_err(|e| malformed(format!("weight {c:?}: {e}")))
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let raw_sharpe = record.get(record.len() - 1).unwrap_or("");
        let sharpe = raw_sharpe
            .trim()
            .parse::<f64>()
            .map_err(|e| malformed(format!("sharpe {raw_sharpe:?}: {e}")))?;

        results.push(PortfolioResult::new(tickers, weights, sharpe));
    }

    Ok(results)
}
