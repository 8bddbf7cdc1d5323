// THEORY:
// This file is the main entry point for the `snow_vision` library crate. It
// exposes the classifier that decides, from one street-camera snapshot, whether
// snow is likely to block access to a bus stop.
//
// The public surface: `SnowPipeline` (and the `classify`
// shortcut) for single snapshots, `ParallelPipeline` for batches, the
// `ClassifierConfig` that tunes both, and the `ClassificationResult` they return.
// The pixel-level machinery lives in `core_modules` and is public for callers
// that want features or masks rather than a verdict.

pub mod config;
pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use config::{ClassifierConfig, ExtractorConfig, StatusRules};
pub use error::{ConfigError, ExtractionFailure, PoolError};
pub use parallel_pipeline::{ParallelPipeline, Snapshot};
pub use pipeline::{
    AnalysisMethod, BlockageLocation, ClassificationResult, Features, SnowPipeline, SnowStatus, classify,
};
