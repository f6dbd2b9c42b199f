//! Tracked assets (investments, property, cash-like holdings).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{require_field, EntityKind, SyncModel};
use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub asset_type: String,
    pub quantity: Decimal,
    pub cost_basis: Decimal,
    pub current_value: Decimal,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub bank_account_id: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncModel for Asset {
    const KIND: EntityKind = EntityKind::Asset;

    fn id(&self) -> &str {
        &self.id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        let now = Utc::now();
        self.last_updated = now;
        self.updated_at = now;
    }

    fn validate(&self) -> Result<()> {
        require_field(&self.id, "asset id")?;
        require_field(&self.user_id, "asset user_id")?;
        require_field(&self.name, "asset name")?;
        Ok(())
    }
}
