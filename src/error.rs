//! Engine error types.

use thiserror::Error;

/// Errors raised by campaign orchestration itself.
///
/// Individual probe failures are never errors; they are counted in the
/// samples they produce.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to build probe client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("benchmark worker failed: {0}")]
    Worker(String),
}
