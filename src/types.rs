//! Shared error and result types for Signpost

use thiserror::Error;

/// Error types for Signpost operations
#[derive(Debug, Error)]
pub enum SignpostError {
    /// Remote content source unreachable or returned a bad envelope.
    /// Retried on the next refresh cycle; fatal only for the startup fetch.
    #[error("Content fetch failed: {0}")]
    Fetch(String),

    /// Source document was malformed; the previous generation stays current
    #[error("Catalog build failed: {0}")]
    Build(String),

    /// Folder id absent from the current generation (stale or unknown token)
    #[error("Folder not found: {0}")]
    NotFound(String),

    /// Action token does not carry the configured prefix
    #[error("Invalid action token: {0}")]
    InvalidToken(String),

    /// Membership store error
    #[error("Database error: {0}")]
    Database(String),

    /// Outgoing message could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// Configuration error detected at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (channel closed, lock poisoned, ...)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SignpostError {
    /// Whether the caller should answer with a "restart navigation" prompt
    /// instead of treating this as a failure.
    pub fn is_stale_navigation(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidToken(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, SignpostError>;
