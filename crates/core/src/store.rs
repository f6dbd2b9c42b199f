//! Local store contract.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::EntityKind;

/// Failures of the on-device store. These are fatal for the operation that
/// hits them: if the device itself cannot record the entry, the caller must
/// know.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("storage io: {0}")]
    Io(String),

    /// A slot's contents could not be encoded or decoded.
    #[error("storage encoding: {0}")]
    Encoding(String),
}

/// Per-entity persistent slot holding the ordered record sequence for one
/// scope (an authenticated user or the reserved guest scope).
///
/// A missing slot loads as an empty sequence, never as an error. A single
/// `save` is all-or-nothing from the caller's point of view; callers that
/// race on the same kind serialize through the sync engine, the store makes
/// no cross-call guarantee.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Ordered rows currently held in the slot.
    async fn load(&self, scope: &str, kind: EntityKind) -> Result<Vec<Value>, StoreError>;

    /// Replace the slot contents with `rows`.
    async fn save(&self, scope: &str, kind: EntityKind, rows: Vec<Value>)
        -> Result<(), StoreError>;
}
