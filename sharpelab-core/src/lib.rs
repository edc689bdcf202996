//! SharpeLab Core — domain types and price ingestion.
//!
//! This crate turns two structurally different price sources into one
//! date-keyed row model:
//! - Domain types (`PriceRow`, `PortfolioResult`)
//! - Tabular source: a local `Date,<ticker>...` file
//! - Remote source: per-ticker daily history from the Alpha Vantage API
//! - Date-keyed merge arena shared by every ticker of a remote load
//! - Static ticker universe and per-ticker coverage diagnostics

pub mod data;
pub mod domain;

pub use domain::{PortfolioResult, PriceRow};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: rows and results can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<PriceRow>();
        require_sync::<PriceRow>();
        require_send::<PortfolioResult>();
        require_sync::<PortfolioResult>();
        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::SeriesArena>();
        require_sync::<data::SeriesArena>();
        require_send::<data::Universe>();
        require_sync::<data::Universe>();
    }
}
