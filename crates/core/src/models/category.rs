//! Spending/income categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{require_field, EntityKind, SyncModel, TransactionKind};
use crate::errors::Result;

/// A user-defined (or default) category transactions point at.
///
/// Category lifecycle is independent and explicit: deleting transactions
/// never removes the categories they referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub kind: TransactionKind,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncModel for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn validate(&self) -> Result<()> {
        require_field(&self.id, "category id")?;
        require_field(&self.user_id, "category user_id")?;
        require_field(&self.name, "category name")?;
        Ok(())
    }
}
