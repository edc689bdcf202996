//! Optimizer boundary.
//!
//! The pipeline hands an ordered row set plus the ticker universe to an
//! [`Optimizer`] and gets back candidate portfolios. Rows may be sparse;
//! implementations must tolerate missing ticker entries.
//!
//! [`MonteCarloOptimizer`] is a random-weight search so the pipeline can run
//! end to end. Any other implementation can be plugged in.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use sharpelab_core::{PortfolioResult, PriceRow};
use thiserror::Error;

use crate::config::OptimizerConfig;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("no price rows to optimize over")]
    NoData,

    #[error("no ticker has at least two daily returns")]
    InsufficientHistory,
}

/// Turns a row set into scored candidate portfolios.
pub trait Optimizer {
    fn name(&self) -> &str;

    fn optimize(
        &self,
        rows: &[PriceRow],
        tickers: &[String],
    ) -> Result<Vec<PortfolioResult>, OptimizeError>;
}

/// Daily simple returns per ticker, aligned to row positions.
///
/// `returns[t][i]` is the return from row `i - 1` to row `i`, present only
/// when both rows quote the ticker at a positive price.
#[derive(Debug)]
struct ReturnTable {
    tickers: Vec<String>,
    returns: Vec<Vec<Option<f64>>>,
}

impl ReturnTable {
    fn build(rows: &[PriceRow], tickers: &[String]) -> Self {
        let mut kept = Vec::new();
        let mut returns = Vec::new();

        for ticker in tickers {
            let series: Vec<Option<f64>> = rows
                .iter()
                .map(|r| r.price(ticker).and_then(|p| p.to_f64()))
                .collect();

            let mut rets = vec![None; rows.len()];
            for i in 1..series.len() {
                if let (Some(prev), Some(cur)) = (series[i - 1], series[i]) {
                    if prev > 0.0 {
                        rets[i] = Some(cur / prev - 1.0);
                    }
                }
            }

            if rets.iter().flatten().count() >= 2 {
                kept.push(ticker.clone());
                returns.push(rets);
            } else {
                tracing::debug!(ticker = %ticker, "excluded: fewer than two daily returns");
            }
        }

        Self {
            tickers: kept,
            returns,
        }
    }

    fn means(&self) -> Vec<f64> {
        self.returns
            .iter()
            .map(|r| {
                let vals: Vec<f64> = r.iter().flatten().copied().collect();
                vals.iter().sum::<f64>() / vals.len() as f64
            })
            .collect()
    }

    /// Pairwise sample covariance over dates where both tickers have a return.
    fn covariance(&self, means: &[f64]) -> Vec<Vec<f64>> {
        let n = self.tickers.len();
        let mut cov = vec![vec![0.0; n]; n];
        for a in 0..n {
            for b in a..n {
                let pairs: Vec<(f64, f64)> = self.returns[a]
                    .iter()
                    .zip(&self.returns[b])
                    .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
                    .collect();
                if pairs.len() < 2 {
                    continue;
                }
                let sum: f64 = pairs
                    .iter()
                    .map(|(x, y)| (x - means[a]) * (y - means[b]))
                    .sum();
                let c = sum / (pairs.len() - 1) as f64;
                cov[a][b] = c;
                cov[b][a] = c;
            }
        }
        cov
    }
}

/// Random long-only weight search over random ticker subsets.
#[derive(Debug, Clone)]
pub struct MonteCarloOptimizer {
    pub simulations: usize,
    pub portfolio_size: usize,
    pub seed: u64,
    pub risk_free_rate: f64,
}

impl MonteCarloOptimizer {
    pub fn from_config(cfg: &OptimizerConfig) -> Self {
        Self {
            simulations: cfg.simulations,
            portfolio_size: cfg.portfolio_size,
            seed: cfg.seed,
            risk_free_rate: cfg.risk_free_rate,
        }
    }

    fn annualised_sharpe(
        &self,
        weights: &[f64],
        idx: &[usize],
        means: &[f64],
        cov: &[Vec<f64>],
    ) -> f64 {
        let mean: f64 = weights.iter().zip(idx).map(|(w, &i)| w * means[i]).sum();
        let mut var = 0.0;
        for (wa, &a) in weights.iter().zip(idx) {
            for (wb, &b) in weights.iter().zip(idx) {
                var += wa * wb * cov[a][b];
            }
        }
        if var <= 0.0 {
            return 0.0;
        }
        let annual_return = mean * TRADING_DAYS_PER_YEAR;
        let annual_vol = var.sqrt() * TRADING_DAYS_PER_YEAR.sqrt();
        (annual_return - self.risk_free_rate) / annual_vol
    }
}

impl Default for MonteCarloOptimizer {
    fn default() -> Self {
        Self::from_config(&OptimizerConfig::default())
    }
}

impl Optimizer for MonteCarloOptimizer {
    fn name(&self) -> &str {
        "monte_carlo"
    }

    fn optimize(
        &self,
        rows: &[PriceRow],
        tickers: &[String],
    ) -> Result<Vec<PortfolioResult>, OptimizeError> {
        if rows.is_empty() {
            return Err(OptimizeError::NoData);
        }

        let table = ReturnTable::build(rows, tickers);
        let k = table.tickers.len();
        if k == 0 {
            return Err(OptimizeError::InsufficientHistory);
        }

        let means = table.means();
        let cov = table.covariance(&means);
        let size = self.portfolio_size.min(k);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut results = Vec::with_capacity(self.simulations);

        for _ in 0..self.simulations {
            let mut idx = rand::seq::index::sample(&mut rng, k, size).into_vec();
            idx.sort_unstable();

            let raw: Vec<f64> = (0..size).map(|_| rng.gen::<f64>()).collect();
            let total: f64 = raw.iter().sum();
            let weights: Vec<f64> = if total > 0.0 {
                raw.iter().map(|w| w / total).collect()
            } else {
                vec![1.0 / size as f64; size]
            };

            let sharpe = self.annualised_sharpe(&weights, &idx, &means, &cov);
            results.push(PortfolioResult::new(
                idx.iter().map(|&i| table.tickers[i].clone()).collect(),
                weights,
                sharpe,
            ));
        }

        tracing::debug!(
            simulations = self.simulations,
            usable_tickers = k,
            portfolio_size = size,
            "monte carlo search complete"
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows(series: &[(&str, Vec<Option<&str>>)]) -> Vec<PriceRow> {
        let len = series[0].1.len();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..len)
            .map(|i| {
                let mut row = PriceRow::new(start + chrono::Duration::days(i as i64));
                for (ticker, prices) in series {
                    if let Some(p) = prices[i] {
                        row.prices.insert(ticker.to_string(), p.parse().unwrap());
                    }
                }
                row
            })
            .collect()
    }

    fn names(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    fn optimizer(simulations: usize, portfolio_size: usize) -> MonteCarloOptimizer {
        MonteCarloOptimizer {
            simulations,
            portfolio_size,
            seed: 7,
            risk_free_rate: 0.0,
        }
    }

    fn sample() -> Vec<PriceRow> {
        rows(&[
            ("AAA", vec![Some("10"), Some("10.5"), Some("10.2"), Some("10.8"), Some("11.0")]),
            ("BBB", vec![Some("20"), Some("19.5"), Some("20.4"), Some("20.1"), Some("20.9")]),
            ("CCC", vec![Some("5"), None, Some("5.2"), Some("5.1"), Some("5.3")]),
        ])
    }

    #[test]
    fn weights_are_normalised_and_paired() {
        let out = optimizer(50, 2)
            .optimize(&sample(), &names(&["AAA", "BBB", "CCC"]))
            .unwrap();

        assert_eq!(out.len(), 50);
        for r in &out {
            assert_eq!(r.tickers.len(), 2);
            assert_eq!(r.weights.len(), 2);
            let sum: f64 = r.weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(r.weights.iter().all(|w| *w >= 0.0));
            assert!(r.sharpe.is_finite());
        }
    }

    #[test]
    fn same_seed_same_results() {
        let a = optimizer(20, 3).optimize(&sample(), &names(&["AAA", "BBB", "CCC"])).unwrap();
        let b = optimizer(20, 3).optimize(&sample(), &names(&["AAA", "BBB", "CCC"])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn portfolio_size_capped_by_usable_tickers() {
        let out = optimizer(5, 25)
            .optimize(&sample(), &names(&["AAA", "BBB", "CCC", "ZZZ"]))
            .unwrap();
        // ZZZ has no prices at all
        for r in &out {
            assert_eq!(r.tickers, names(&["AAA", "BBB", "CCC"]));
        }
    }

    #[test]
    fn sparse_returns_skip_gaps() {
        let table = ReturnTable::build(&sample(), &names(&["CCC"]));
        let r = &table.returns[0];
        assert_eq!(r[0], None);
        assert_eq!(r[1], None);
        assert_eq!(r[2], None);
        assert!(r[3].is_some());
        assert!(r[4].is_some());
    }

    #[test]
    fn empty_rows_rejected() {
        let err = optimizer(5, 2).optimize(&[], &names(&["AAA"])).unwrap_err();
        assert!(matches!(err, OptimizeError::NoData));
    }

    #[test]
    fn too_little_history_rejected() {
        let short = rows(&[("AAA", vec![Some("1"), Some("2")])]);
        let err = optimizer(5, 2).optimize(&short, &names(&["AAA"])).unwrap_err();
        assert!(matches!(err, OptimizeError::InsufficientHistory));
    }
}
