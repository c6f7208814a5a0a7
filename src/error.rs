use thiserror::Error;

use crate::gemini::GeminiError;

/// Batch-level errors. All of these are fatal: they occur before any job is
/// dispatched and abort the run.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Error reading input directory {dir}: {source}")]
    InputDir {
        dir: String,
        source: std::io::Error,
    },

    #[error("Error creating output directory {dir}: {source}")]
    OutputDir {
        dir: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Why a single job failed. Per-job failures are counted and reported but
/// never abort the dispatch loop or other in-flight jobs.
#[derive(Debug, Error)]
pub enum JobFailure {
    #[error("generation failed: {0}")]
    Generate(#[from] GeminiError),

    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(std::time::Duration),

    #[error("model returned no content")]
    EmptyResponse,

    #[error("cancelled by shutdown signal")]
    Cancelled,

    #[error("failed to write output: {0}")]
    Write(std::io::Error),
}
