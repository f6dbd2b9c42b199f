//! Recurring transaction templates.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{require_field, EntityKind, SyncModel, Transaction, TransactionKind};
use crate::errors::{Error, Result};

/// Cadence of a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Template from which the generator materializes concrete transactions.
///
/// `next_execution_date` is always the earliest not-yet-materialized
/// occurrence, or `None` once the series is exhausted.
/// `current_occurrences` never decreases and never exceeds
/// `max_occurrences` when the cap is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub kind: TransactionKind,
    #[serde(default)]
    pub description: String,
    pub frequency: RecurringFrequency,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub next_execution_date: Option<NaiveDate>,
    pub is_active: bool,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
    #[serde(default)]
    pub current_occurrences: u32,
    /// Calendar day (1-31) the series anchors to; shorter months clamp to
    /// their own last day.
    pub original_target_day: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecurringTransaction {
    /// Fresh template starting at `start_date`, anchored to its calendar day.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: impl Into<String>,
        account_id: impl Into<String>,
        category_id: impl Into<String>,
        amount: Decimal,
        kind: TransactionKind,
        description: impl Into<String>,
        frequency: RecurringFrequency,
        start_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            account_id: account_id.into(),
            category_id: category_id.into(),
            amount,
            kind,
            description: description.into(),
            frequency,
            start_date,
            end_date: None,
            next_execution_date: Some(start_date),
            is_active: true,
            max_occurrences: None,
            current_occurrences: 0,
            original_target_day: start_date.day(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Concrete transaction for one due date, linked back to this template.
    pub fn materialize(&self, due: NaiveDate) -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            account_id: self.account_id.clone(),
            category_id: self.category_id.clone(),
            amount: self.amount,
            kind: self.kind,
            description: self.description.clone(),
            date: due,
            tags: None,
            is_recurring: false,
            recurring_frequency: None,
            recurring_end_date: None,
            parent_recurring_id: Some(self.id.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}

impl SyncModel for RecurringTransaction {
    const KIND: EntityKind = EntityKind::RecurringTransaction;

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
        require_field(&self.id, "template id")?;
        require_field(&self.user_id, "template user_id")?;
        require_field(&self.account_id, "template account_id")?;
        require_field(&self.category_id, "template category_id")?;
        if !(1..=31).contains(&self.original_target_day) {
            return Err(Error::validation("original_target_day must be 1-31"));
        }
        if let Some(max) = self.max_occurrences {
            if self.current_occurrences > max {
                return Err(Error::validation(
                    "current_occurrences exceeds max_occurrences",
                ));
            }
        }
        Ok(())
    }
}
