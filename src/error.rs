//! Error types for the message view and ingestion loop.

use crate::types::MessageId;
use thiserror::Error;

/// Main error type for view, event, and ingestion operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Callback is already an observer of {event}")]
    DuplicateObserver { event: String },

    #[error("Callback is not an observer of {event}")]
    NotAnObserver { event: String },

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Observer failed: {0}")]
    Observer(String),

    #[error("Message source closed")]
    SourceClosed,

    #[error("Message source error: {0}")]
    Source(String),

    #[error("Ingestion thread panicked")]
    IngestPanicked,
}

/// Result type for view operations.
pub type Result<T> = std::result::Result<T, Error>;
