//! Error taxonomy for the pipeline boundaries.
//!
//! Only the two external boundaries can actually fail: the annotation
//! adapter and handler execution. No-match and ambiguity are ordinary
//! control flow and never surface as errors.

use thiserror::Error;

/// Failure at the annotation adapter boundary. The pipeline reacts by
/// degrading to plain token-text matching, never by aborting the turn.
#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("annotation engine unavailable: {0}")]
    Unavailable(String),

    #[error("annotation failed: {0}")]
    Failed(String),
}

/// Failure inside a dispatched handler. Surfaced to the user as a failed
/// outcome; the pipeline stays healthy for the next turn.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

impl HandlerError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}
