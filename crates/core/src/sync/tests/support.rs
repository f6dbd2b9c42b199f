//! In-memory store/gateway doubles and fixtures shared by the sync tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use crate::gateway::{GatewayError, GatewayResult, RemoteGateway};
use crate::models::{
    Category, EntityKind, RecurringFrequency, RecurringTransaction, Transaction, TransactionKind,
};
use crate::store::{LocalStore, StoreError};

/// Local store backed by a map, with a switch that simulates the device
/// storage becoming unavailable.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<HashMap<(String, EntityKind), Vec<Value>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, scope: &str, kind: EntityKind, rows: Vec<Value>) {
        self.slots
            .lock()
            .unwrap()
            .insert((scope.to_string(), kind), rows);
    }

    pub fn rows(&self, scope: &str, kind: EntityKind) -> Vec<Value> {
        self.slots
            .lock()
            .unwrap()
            .get(&(scope.to_string(), kind))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_fail_writes(&self, value: bool) {
        self.fail_writes.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl LocalStore for MemoryStore {
    async fn load(&self, scope: &str, kind: EntityKind) -> Result<Vec<Value>, StoreError> {
        Ok(self.rows(scope, kind))
    }

    async fn save(
        &self,
        scope: &str,
        kind: EntityKind,
        rows: Vec<Value>,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io("disk unavailable".to_string()));
        }
        self.seed(scope, kind, rows);
        Ok(())
    }
}

/// Scriptable remote double: per-kind failures, connectivity loss, and an
/// artificial response delay for timeout tests.
#[derive(Default)]
pub struct MockGateway {
    rows: Mutex<HashMap<EntityKind, Vec<Value>>>,
    fail_statuses: Mutex<HashMap<EntityKind, u16>>,
    offline: AtomicBool,
    delay: Mutex<Option<Duration>>,
    pub upsert_calls: Mutex<Vec<(EntityKind, usize)>>,
    pub delete_calls: Mutex<Vec<(EntityKind, String)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_remote(&self, kind: EntityKind, rows: Vec<Value>) {
        self.rows.lock().unwrap().insert(kind, rows);
    }

    pub fn remote_rows(&self, kind: EntityKind) -> Vec<Value> {
        self.rows
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    pub fn fail_kind(&self, kind: EntityKind, status: u16) {
        self.fail_statuses.lock().unwrap().insert(kind, status);
    }

    pub fn set_offline(&self, value: bool) {
        self.offline.store(value, Ordering::SeqCst);
    }

    pub fn set_delay(&self, value: Duration) {
        *self.delay.lock().unwrap() = Some(value);
    }

    pub fn upserted_kinds(&self) -> Vec<EntityKind> {
        self.upsert_calls
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, _)| *kind)
            .collect()
    }

    async fn gate(&self, kind: EntityKind) -> GatewayResult<()> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(GatewayError::transport("offline"));
        }
        if let Some(status) = self.fail_statuses.lock().unwrap().get(&kind) {
            return Err(GatewayError::api(*status, "scripted failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for MockGateway {
    async fn upsert_many(&self, kind: EntityKind, rows: Vec<Value>) -> GatewayResult<Vec<Value>> {
        self.gate(kind).await?;
        self.upsert_calls.lock().unwrap().push((kind, rows.len()));
        let mut stored = self.rows.lock().unwrap();
        let slot = stored.entry(kind).or_default();
        for row in &rows {
            let id = row.get("id").and_then(Value::as_str);
            match slot
                .iter_mut()
                .find(|existing| existing.get("id").and_then(Value::as_str) == id)
            {
                Some(existing) => *existing = row.clone(),
                None => slot.push(row.clone()),
            }
        }
        Ok(rows)
    }

    async fn delete_by_id(&self, kind: EntityKind, id: &str) -> GatewayResult<()> {
        self.gate(kind).await?;
        self.delete_calls
            .lock()
            .unwrap()
            .push((kind, id.to_string()));
        let mut stored = self.rows.lock().unwrap();
        let slot = stored.entry(kind).or_default();
        let before = slot.len();
        slot.retain(|row| row.get("id").and_then(Value::as_str) != Some(id));
        if slot.len() == before {
            return Err(GatewayError::api(404, "record not found"));
        }
        Ok(())
    }

    async fn fetch_by_id(&self, kind: EntityKind, id: &str) -> GatewayResult<Option<Value>> {
        self.gate(kind).await?;
        Ok(self
            .remote_rows(kind)
            .into_iter()
            .find(|row| row.get("id").and_then(Value::as_str) == Some(id)))
    }

    async fn fetch_all(&self, kind: EntityKind, _user_id: &str) -> GatewayResult<Vec<Value>> {
        self.gate(kind).await?;
        Ok(self.remote_rows(kind))
    }
}

pub fn sample_transaction(id: &str, user_id: &str) -> Transaction {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    Transaction {
        id: id.to_string(),
        user_id: user_id.to_string(),
        account_id: "acc-1".to_string(),
        category_id: "cat-1".to_string(),
        amount: dec!(-42.5),
        kind: TransactionKind::Expense,
        description: "groceries".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        tags: None,
        is_recurring: false,
        recurring_frequency: None,
        recurring_end_date: None,
        parent_recurring_id: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_category(id: &str, user_id: &str) -> Category {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    Category {
        id: id.to_string(),
        user_id: user_id.to_string(),
        name: "Groceries".to_string(),
        kind: TransactionKind::Expense,
        icon: "cart".to_string(),
        color: "#4caf50".to_string(),
        is_default: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn sample_template(
    id: &str,
    user_id: &str,
    frequency: RecurringFrequency,
    start: NaiveDate,
) -> RecurringTransaction {
    let mut template = RecurringTransaction::new(
        user_id,
        "acc-1",
        "cat-1",
        dec!(-1200.25),
        TransactionKind::Expense,
        "rent",
        frequency,
        start,
    );
    template.id = id.to_string();
    template
}

/// Raw slot row for tests that seed the store or gateway directly.
pub fn raw_row(id: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "user_id": "user-1",
        "updated_at": updated_at,
    })
}
