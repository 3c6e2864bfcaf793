//! Error types for the spectral resynthesis core.

use std::fmt;

/// Errors that can occur while bringing the engine up.
///
/// Runtime parameter handling is total — out-of-range values are clamped,
/// never rejected — so construction is the only fallible surface.
#[derive(Debug)]
pub enum EngineError {
    /// A worker thread could not be spawned.
    WorkerSpawn(std::io::Error),
}

impl EngineError {
    pub(crate) fn worker_spawn(err: std::io::Error) -> Self {
        EngineError::WorkerSpawn(err)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::WorkerSpawn(err) => {
                write!(f, "failed to spawn worker thread: {}", err)
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::WorkerSpawn(err) => Some(err),
        }
    }
}
