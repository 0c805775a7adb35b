// src/error.rs

use thiserror::Error;

/// Errors surfaced by the probing core.
///
/// A noisy or inconclusive measurement is never an error: the heuristics always
/// fall back to an estimate. Only contract violations and resource or I/O
/// failures end up here.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("buffer size {0} is not a power of two")]
    NotPowerOfTwo(usize),

    #[error("stride must be positive")]
    InvalidStride,

    #[error("invalid size range [{min}, {max}]")]
    InvalidRange { min: usize, max: usize },

    #[error("could not allocate {size} bytes")]
    Allocation { size: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
