//! Error taxonomy for sync operations.

use thiserror::Error;

use crate::gateway::{GatewayError, RetryClass};
use crate::store::StoreError;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the sync services.
///
/// Only the local-affecting variants cross the public boundary as `Err`;
/// remote failures are reported inside [`crate::sync::SyncOutcome`] so a
/// flaky network call cannot fail a user-facing action.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was missing; rejected before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// On-device storage is unavailable; the operation was aborted.
    #[error("local persistence failed: {0}")]
    LocalPersistence(#[from] StoreError),

    /// Network-level failure; the local copy stays authoritative and is
    /// retried on the next sync opportunity.
    #[error("remote transient failure: {0}")]
    RemoteTransient(String),

    /// The backend rejected the payload; the local copy is retained.
    #[error("remote rejected: {0}")]
    RemoteRejected(String),

    /// A stored row could not be (de)serialized.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Fold a gateway failure into the engine taxonomy: retryable failures
    /// are transient, everything else is a rejection.
    pub fn from_gateway(err: GatewayError) -> Self {
        match err.retry_class() {
            RetryClass::Retryable => Self::RemoteTransient(err.to_string()),
            RetryClass::Permanent | RetryClass::ReauthRequired => {
                Self::RemoteRejected(err.to_string())
            }
        }
    }

    /// True for failures that only affect the remote copy.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteTransient(_) | Self::RemoteRejected(_))
    }
}
