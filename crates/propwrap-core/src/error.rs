use thiserror::Error;

use crate::migrate::orchestrator::RunState;

/// Fatal errors at the engine's boundary. Candidates that do not fit and
/// call sites that cannot be resolved are never errors; they end up as
/// diagnostics in the run report.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Marker or wrapper name did not compile to a pattern
    #[error("Invalid name pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The orchestrator was asked to skip or repeat a phase
    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    PhaseOrder { from: RunState, to: RunState },

    #[error("Worker for compilation unit '{unit}' panicked")]
    WorkerPanicked { unit: String },
}

impl MigrationError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrationError>;
