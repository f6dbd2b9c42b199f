//! Remote gateway contract and failure classification.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::EntityKind;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Retry policy classification for gateway failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Errors reported by the remote boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network/transport failure before the backend produced a status.
    #[error("transport error: {0}")]
    Transport(String),

    /// Application error reported by the backend.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request could not be built (missing data, bad token format).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                401 | 403 => RetryClass::ReauthRequired,
                408 | 409 | 423 | 425 | 429 => RetryClass::Retryable,
                500..=599 => RetryClass::Retryable,
                _ => RetryClass::Permanent,
            },
            Self::Transport(_) => RetryClass::Retryable,
            Self::InvalidRequest(_) => RetryClass::Permanent,
        }
    }

    /// Returns true when the backend reported the record as absent.
    /// Deleting an already-gone record is a recognized non-error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { status, message } => {
                *status == 404 || message.to_ascii_lowercase().contains("not found")
            }
            _ => false,
        }
    }
}

/// Exponential backoff in seconds with cap, keyed on consecutive failures.
pub fn backoff_seconds(consecutive_failures: i32) -> i64 {
    const MAX_EXPONENT: i32 = 8;
    const BASE_DELAY_SECONDS: i64 = 5;

    let capped = i64::from(consecutive_failures.clamp(0, MAX_EXPONENT));
    2_i64.pow(capped as u32) * BASE_DELAY_SECONDS
}

/// Request/response boundary to the authoritative backend.
///
/// The gateway never retries internally; retry policy belongs to the sync
/// engine. Conflict resolution on write is last-write-wins on `updated_at`,
/// enforced server-side.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Insert-or-update a batch of rows in one call.
    async fn upsert_many(&self, kind: EntityKind, rows: Vec<Value>) -> GatewayResult<Vec<Value>>;

    /// Delete one record by primary key.
    async fn delete_by_id(&self, kind: EntityKind, id: &str) -> GatewayResult<()>;

    /// Fetch one record by primary key, `None` when absent.
    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> GatewayResult<Option<Value>>;

    /// Fetch every record of `kind` owned by `user_id`.
    async fn fetch_all(&self, kind: EntityKind, user_id: &str) -> GatewayResult<Vec<Value>>;
}
