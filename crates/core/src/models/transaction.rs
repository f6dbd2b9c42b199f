//! Transaction records and their recurring linkage.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{require_field, EntityKind, RecurringFrequency, SyncModel};
use crate::errors::Result;

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

/// A concrete money movement, either entered by the user or materialized
/// from a recurring template.
///
/// A record with `parent_recurring_id` set references an existing or
/// historically-existing template; deleting the template never
/// cascade-deletes materialized children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_frequency: Option<RecurringFrequency>,
    #[serde(default)]
    pub recurring_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub parent_recurring_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncModel for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

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
        require_field(&self.id, "transaction id")?;
        require_field(&self.user_id, "transaction user_id")?;
        require_field(&self.account_id, "transaction account_id")?;
        require_field(&self.category_id, "transaction category_id")?;
        Ok(())
    }
}
