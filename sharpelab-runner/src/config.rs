//! Serializable pipeline configuration.
//!
//! Loaded from a TOML file; every field has a default, so an empty file is a
//! valid tabular-mode config:
//!
//! ```toml
//! [source]
//! mode = "remote"
//! start_date = "2024-08-01"
//! end_date = "2024-12-31"
//! api_key = "..."
//!
//! [output]
//! path = "data/output.csv"
//!
//! [optimizer]
//! simulations = 10000
//! portfolio_size = 25
//! seed = 42
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sharpelab_core::data::alpha_vantage::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use sharpelab_core::data::Universe;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// Validation runs before any file or network I/O.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("remote mode requires a non-empty API key")]
    MissingCredential,

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("ticker universe is empty")]
    EmptyUniverse,

    #[error("ticker '{0}' appears more than once in the universe")]
    DuplicateTicker(String),

    #[error("optimizer.{0} must be greater than zero")]
    ZeroParameter(&'static str),

    #[error("unknown source mode '{0}' (expected 'tabular' or 'remote')")]
    UnknownMode(String),
}

/// Which price source feeds the pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    #[default]
    Tabular,
    Remote,
}

impl FromStr for SourceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tabular" | "csv" => Ok(Self::Tabular),
            "remote" | "api" => Ok(Self::Remote),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tabular => write!(f, "tabular"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub output: OutputConfig,
    pub optimizer: OptimizerConfig,
    pub universe: Universe,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub mode: SourceMode,
    /// Tabular input file.
    pub input_path: PathBuf,
    /// Inclusive range applied to remote payloads.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Tabular,
            input_path: PathBuf::from("data/close_prices.csv"),
            start_date: NaiveDate::from_ymd_opt(2024, 8, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/output.csv"),
        }
    }
}

/// Parameters for the bundled Monte Carlo optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub simulations: usize,
    pub portfolio_size: usize,
    pub seed: u64,
    /// Annual risk-free rate subtracted from the annualised return.
    pub risk_free_rate: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            simulations: 10_000,
            portfolio_size: 25,
            seed: 42,
            risk_free_rate: 0.0,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// The credential, if present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.source
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Check everything that can be checked without touching the filesystem
    /// or the network.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.start_date > self.source.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.source.start_date,
                end: self.source.end_date,
            });
        }

        if self.source.mode == SourceMode::Remote {
            if self.api_key().is_none() {
                return Err(ConfigError::MissingCredential);
            }
            if self.universe.is_empty() {
                return Err(ConfigError::EmptyUniverse);
            }
            if let Some(dup) = self.universe.first_duplicate() {
                return Err(ConfigError::DuplicateTicker(dup.to_string()));
            }
        }

        if self.optimizer.simulations == 0 {
            return Err(ConfigError::ZeroParameter("simulations"));
        }
        if self.optimizer.portfolio_size == 0 {
            return Err(ConfigError::ZeroParameter("portfolio_size"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote_config() -> PipelineConfig {
        let mut cfg = PipelineConfig::default();
        cfg.source.mode = SourceMode::Remote;
        cfg.source.api_key = Some("demo".into());
        cfg
    }

    #[test]
    fn empty_toml_is_default_tabular() {
        let cfg = PipelineConfig::from_toml("").unwrap();
        assert_eq!(cfg, PipelineConfig::default());
        assert_eq!(cfg.source.mode, SourceMode::Tabular);
        assert_eq!(cfg.universe.len(), 30);
        cfg.validate().unwrap();
    }

    #[test]
    fn parses_full_config() {
        let cfg = PipelineConfig::from_toml(
            r#"
            [source]
            mode = "remote"
            start_date = "2025-01-01"
            end_date = "2025-03-31"
            api_key = "KEY"

            [output]
            path = "out/results.csv"

            [optimizer]
            simulations = 500
            portfolio_size = 5
            seed = 7

            [universe]
            tickers = ["AAPL", "MSFT"]
            "#,
        )
        .unwrap();

        assert_eq!(cfg.source.mode, SourceMode::Remote);
        assert_eq!(cfg.source.start_date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.output.path, PathBuf::from("out/results.csv"));
        assert_eq!(cfg.optimizer.simulations, 500);
        assert_eq!(cfg.optimizer.risk_free_rate, 0.0);
        assert_eq!(cfg.universe.tickers, vec!["AAPL", "MSFT"]);
        cfg.validate().unwrap();
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(PipelineConfig::from_toml("[source]\nmode = \"ftp\"").is_err());
        assert!(matches!(
            "ftp".parse::<SourceMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
        assert_eq!("Remote".parse::<SourceMode>().unwrap(), SourceMode::Remote);
    }

    #[test]
    fn remote_requires_credential() {
        let mut cfg = remote_config();
        cfg.source.api_key = None;
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingCredential)));

        cfg.source.api_key = Some("   ".into());
        assert!(matches!(cfg.validate(), Err(ConfigError::MissingCredential)));
    }

    #[test]
    fn tabular_does_not_require_credential() {
        let cfg = PipelineConfig::default();
        assert!(cfg.api_key().is_none());
        cfg.validate().unwrap();
    }

    #[test]
    fn inverted_dates_rejected() {
        let mut cfg = remote_config();
        cfg.source.start_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        cfg.source.end_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn single_day_range_is_valid() {
        let mut cfg = remote_config();
        cfg.source.end_date = cfg.source.start_date;
        cfg.validate().unwrap();
    }

    #[test]
    fn universe_checks_in_remote_mode() {
        let mut cfg = remote_config();
        cfg.universe = Universe::new(vec![]);
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyUniverse)));

        cfg.universe = Universe::new(vec!["KO".into(), "KO".into()]);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::DuplicateTicker(ref t)) if t == "KO"
        ));
    }

    #[test]
    fn zero_optimizer_parameters_rejected() {
        let mut cfg = PipelineConfig::default();
        cfg.optimizer.simulations = 0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroParameter("simulations"))
        ));
    }
}
