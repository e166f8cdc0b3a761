//! Core types, configuration, and error handling for driftwatch.
//!
//! This crate provides the shared foundation used by the other driftwatch crates:
//! - [`DriftError`]: unified error type using `thiserror`
//! - [`DriftConfig`]: configuration loaded from `config.toml`
//! - [`resolve`]: owner/repository extraction from a remote URL
//! - Shared types: [`RepositoryRef`], [`HostIdentity`], [`DivergenceReport`],
//!   [`ClassificationJudgment`], [`RiskLevel`], [`AnalysisOutcome`],
//!   [`UpdateStatus`], [`OutputFormat`]

mod config;
mod error;
mod identity;
mod types;

pub use config::{
    AdvisoryConfig, AdvisoryProvider, DriftConfig, GitHubConfig, PipelineConfig, ScanConfig,
    ScriptConfig,
};
pub use error::DriftError;
pub use identity::{normalize_remote_url, resolve, HOST_MARKER};
pub use types::{
    AnalysisOutcome, ClassificationJudgment, DivergenceReport, HostIdentity, Outcome,
    OutputFormat, RepositoryRef, RiskLevel, UpdateStatus,
};

/// A convenience `Result` type for driftwatch operations.
pub type Result<T> = std::result::Result<T, DriftError>;
