//! Domain models and the record contract shared by the sync services.

mod accounts;
mod asset;
mod category;
mod recurring;
mod transaction;

pub use accounts::*;
pub use asset::*;
pub use category::*;
pub use recurring::*;
pub use transaction::*;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Entity kinds persisted in the local store, mapped to the backend tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Transaction,
    RecurringTransaction,
    Asset,
    Category,
    Liability,
    Account,
}

impl EntityKind {
    /// Every locally persisted kind.
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Transaction,
        EntityKind::RecurringTransaction,
        EntityKind::Asset,
        EntityKind::Category,
        EntityKind::Liability,
        EntityKind::Account,
    ];

    /// Kinds pushed by the batch upload path. Recurring templates propagate
    /// through the add-record path instead of the batch enumeration.
    pub const UPLOAD_KINDS: [EntityKind; 5] = [
        EntityKind::Transaction,
        EntityKind::Asset,
        EntityKind::Category,
        EntityKind::Liability,
        EntityKind::Account,
    ];

    /// Backend table holding this kind.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "transactions",
            EntityKind::RecurringTransaction => "recurring_transactions",
            EntityKind::Asset => "assets",
            EntityKind::Category => "categories",
            EntityKind::Liability => "liabilities",
            EntityKind::Account => "accounts",
        }
    }
}

/// Contract every synced record satisfies.
///
/// Ties a typed model to its [`EntityKind`] and gives the engine uniform
/// access to the identity, tie-break timestamp, and required-field check.
pub trait SyncModel: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Stable unique identifier.
    fn id(&self) -> &str;

    /// Modification timestamp used as the last-write-wins tie-break.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Bump the modification timestamp before persisting a mutation.
    fn touch(&mut self);

    /// Required-field check run before any write.
    fn validate(&self) -> Result<()>;
}

pub(crate) fn require_field(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(crate::errors::Error::validation(format!(
            "{name} is required"
        )));
    }
    Ok(())
}
