//! Local-first sync engine: local write first, then best-effort remote
//! propagation with verification.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, warn};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::errors::{Error, Result};
use crate::gateway::RemoteGateway;
use crate::models::{EntityKind, SyncModel};
use crate::session::SessionContext;
use crate::store::LocalStore;

/// Timeout for the low-latency single-record sync path.
pub const INSTANT_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-kind timeout for batch uploads, so one stalled kind cannot block the
/// remaining kinds from being attempted.
pub const BATCH_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// One recorded remote failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncIssue {
    /// Backend table the failure concerns.
    pub entity: String,
    /// Record id, when the failure is about a single record.
    pub id: Option<String>,
    pub message: String,
}

/// Result of a sync-facing operation.
///
/// `success` reports whether remote propagation completed; the local write
/// either already succeeded (the call returned `Ok`) or the whole operation
/// failed with an error. Remote failures land in `errors` instead of
/// propagating, so connectivity problems never crash a user-facing action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    pub errors: Vec<SyncIssue>,
}

impl SyncOutcome {
    /// Fully synced.
    pub fn ok() -> Self {
        Self {
            success: true,
            errors: Vec::new(),
        }
    }

    /// Locally durable, remotely pending.
    pub fn failed(issue: SyncIssue) -> Self {
        Self {
            success: false,
            errors: vec![issue],
        }
    }
}

pub(super) fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

/// Orchestrates "local write, then best-effort remote write" for every
/// entity kind. Operations against the same kind serialize their
/// load-modify-save cycle through a per-kind lock; different kinds proceed
/// concurrently.
pub struct SyncService {
    pub(super) store: Arc<dyn LocalStore>,
    pub(super) remote: Arc<dyn RemoteGateway>,
    kind_locks: [Mutex<()>; EntityKind::ALL.len()],
    instant_timeout: Duration,
    batch_timeout: Duration,
}

impl SyncService {
    pub fn new(store: Arc<dyn LocalStore>, remote: Arc<dyn RemoteGateway>) -> Self {
        Self {
            store,
            remote,
            kind_locks: std::array::from_fn(|_| Mutex::new(())),
            instant_timeout: INSTANT_SYNC_TIMEOUT,
            batch_timeout: BATCH_UPLOAD_TIMEOUT,
        }
    }

    /// Override the instant-sync timeout.
    pub fn with_instant_timeout(mut self, value: Duration) -> Self {
        self.instant_timeout = value;
        self
    }

    /// Override the per-kind batch upload timeout.
    pub fn with_batch_timeout(mut self, value: Duration) -> Self {
        self.batch_timeout = value;
        self
    }

    pub(super) fn kind_lock(&self, kind: EntityKind) -> &Mutex<()> {
        &self.kind_locks[kind as usize]
    }

    /// Replace-by-id or append, preserving sequence order.
    fn upsert_row(rows: &mut Vec<Value>, id: &str, row: Value) {
        match rows.iter_mut().find(|existing| row_id(existing) == Some(id)) {
            Some(slot) => *slot = row,
            None => rows.push(row),
        }
    }

    /// Durably record one row in the local slot. Must succeed before the
    /// caller's operation can return.
    pub(super) async fn write_local<T: SyncModel>(
        &self,
        ctx: &SessionContext,
        record: &T,
    ) -> Result<()> {
        let row = serde_json::to_value(record)?;
        let _guard = self.kind_lock(T::KIND).lock().await;
        let mut rows = self.store.load(ctx.scope(), T::KIND).await?;
        Self::upsert_row(&mut rows, record.id(), row);
        self.store.save(ctx.scope(), T::KIND, rows).await?;
        Ok(())
    }

    /// Typed view of one local slot.
    pub async fn load_records<T: SyncModel>(&self, ctx: &SessionContext) -> Result<Vec<T>> {
        let rows = {
            let _guard = self.kind_lock(T::KIND).lock().await;
            self.store.load(ctx.scope(), T::KIND).await?
        };
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(Error::from))
            .collect()
    }

    /// Push one record remotely, then read it back as a diagnostic. The
    /// local copy is never rolled back on failure; the divergence heals on
    /// the next sync opportunity.
    async fn propagate<T: SyncModel>(&self, record: &T) -> Result<()> {
        let row = serde_json::to_value(record)?;
        self.remote
            .upsert_many(T::KIND, vec![row])
            .await
            .map_err(Error::from_gateway)?;
        self.verify_remote(T::KIND, record.id(), record.updated_at())
            .await;
        Ok(())
    }

    /// Best-effort read-back after a write; the outcome is only logged,
    /// never a correctness gate.
    async fn verify_remote(&self, kind: EntityKind, id: &str, expected: DateTime<Utc>) {
        let table = kind.table_name();
        match self.remote.fetch_by_id(kind, id).await {
            Ok(Some(row)) => {
                let remote_ts = row
                    .get("updated_at")
                    .and_then(Value::as_str)
                    .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
                    .map(|value| value.with_timezone(&Utc));
                if remote_ts == Some(expected) {
                    debug!("verified {table} {id} after upsert");
                } else {
                    warn!("post-write verification mismatch for {table} {id}");
                }
            }
            Ok(None) => warn!("{table} {id} not visible after upsert"),
            Err(err) => debug!("verification fetch for {table} {id} failed: {err}"),
        }
    }

    fn deferred(kind: EntityKind, id: &str, err: Error) -> SyncOutcome {
        debug!(
            "remote propagation for {} {id} deferred: {err}",
            kind.table_name()
        );
        SyncOutcome::failed(SyncIssue {
            entity: kind.table_name().to_string(),
            id: Some(id.to_string()),
            message: err.to_string(),
        })
    }

    /// Validate, persist locally (the record is visible to the caller the
    /// moment this returns), then attempt remote propagation. Re-adding an
    /// existing id replaces it; the slot never holds duplicates.
    pub async fn add_record<T: SyncModel>(
        &self,
        ctx: &SessionContext,
        record: T,
    ) -> Result<SyncOutcome> {
        record.validate()?;
        self.write_local(ctx, &record).await?;
        match self.propagate(&record).await {
            Ok(()) => Ok(SyncOutcome::ok()),
            Err(err) => Ok(Self::deferred(T::KIND, record.id(), err)),
        }
    }

    /// Same contract as [`Self::add_record`] with the remote phase under a
    /// tight timeout; the caller is typically waiting on a UI affordance.
    /// A timeout reports `success: false` instead of raising.
    pub async fn sync_instantly<T: SyncModel>(
        &self,
        ctx: &SessionContext,
        record: T,
    ) -> Result<SyncOutcome> {
        record.validate()?;
        self.write_local(ctx, &record).await?;
        match timeout(self.instant_timeout, self.propagate(&record)).await {
            Ok(Ok(())) => Ok(SyncOutcome::ok()),
            Ok(Err(err)) => Ok(Self::deferred(T::KIND, record.id(), err)),
            Err(_) => Ok(Self::deferred(
                T::KIND,
                record.id(),
                Error::RemoteTransient("instant sync timed out".to_string()),
            )),
        }
    }

    /// Push every upload kind's full slot, one batch per kind, independent
    /// kinds concurrently. `success` is true only when every kind's batch
    /// succeeded; whichever kinds did succeed stay pushed, the rest are
    /// reported in `errors` with no rollback anywhere.
    pub async fn upload_all_data(&self, ctx: &SessionContext) -> Result<SyncOutcome> {
        let uploads = EntityKind::UPLOAD_KINDS
            .iter()
            .map(|kind| self.upload_kind(ctx, *kind));
        let mut errors = Vec::new();
        for result in join_all(uploads).await {
            if let Some(issue) = result? {
                errors.push(issue);
            }
        }
        Ok(SyncOutcome {
            success: errors.is_empty(),
            errors,
        })
    }

    /// Push one kind's slot as a single batch. Local failures abort the
    /// whole upload; remote failures come back as an issue.
    async fn upload_kind(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
    ) -> Result<Option<SyncIssue>> {
        let rows = {
            let _guard = self.kind_lock(kind).lock().await;
            self.store.load(ctx.scope(), kind).await?
        };
        if rows.is_empty() {
            return Ok(None);
        }

        let count = rows.len();
        let issue = |message: String| SyncIssue {
            entity: kind.table_name().to_string(),
            id: None,
            message,
        };
        match timeout(self.batch_timeout, self.remote.upsert_many(kind, rows)).await {
            Ok(Ok(_)) => {
                debug!("uploaded {count} {} rows", kind.table_name());
                Ok(None)
            }
            Ok(Err(err)) => Ok(Some(issue(Error::from_gateway(err).to_string()))),
            Err(_) => Ok(Some(issue("batch upload timed out".to_string()))),
        }
    }
}
