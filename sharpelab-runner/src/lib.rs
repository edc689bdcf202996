//! SharpeLab Runner — pipeline orchestration on top of `sharpelab-core`.
//!
//! - TOML configuration with validation ahead of any I/O
//! - Optimizer boundary trait and a bundled Monte Carlo search
//! - Fixed-layout result export and read-back
//! - Pipeline driver: source selection, coverage diagnostics, dataset hash,
//!   best-result selection

pub mod config;
pub mod export;
pub mod optimizer;
pub mod pipeline;

pub use config::{ConfigError, OptimizerConfig, PipelineConfig, SourceConfig, SourceMode};
pub use export::{read_results, ExportError, ResultWriter, DEFAULT_SLOTS};
pub use optimizer::{MonteCarloOptimizer, OptimizeError, Optimizer};
pub use pipeline::{
    best_result, dataset_hash, ingest, ingest_remote, run_from_rows, run_pipeline, Ingested,
    PipelineSummary, RunError,
};
