//! Error types for the TTS pipeline

use thiserror::Error;

use crate::quota::{DenyReason, QuotaKind};

pub type Result<T> = std::result::Result<T, TtsError>;

#[derive(Error, Debug)]
pub enum TtsError {
    /// A quota check denied the request before any provider call was made.
    #[error("{kind} quota exceeded: {reason}")]
    QuotaExceeded { kind: QuotaKind, reason: DenyReason },

    /// One or more segments are missing text or a voice assignment.
    /// Positions are 1-based script ordinals.
    #[error("invalid segments at positions {positions:?}: each needs non-empty text and a voice")]
    Validation { positions: Vec<usize> },

    /// The speech provider rejected or failed a request.
    #[error("provider error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    /// A usage-store read or write failed.
    #[error("store error: {0}")]
    Store(String),

    /// Audio concatenation failed or is unavailable.
    #[error("audio merge failed: {0}")]
    Merge(String),

    /// The archive fallback itself failed.
    #[error("archive failed: {0}")]
    Archive(String),

    /// Saving an uploaded voice sample failed; the provider was not contacted.
    #[error("failed to save voice sample: {0}")]
    Upload(String),

    /// An API key environment variable is not set.
    #[error("missing API key: set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
