//! One-shot merge of locally-accumulated data with the remote set at
//! sign-in.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::DateTime;
use log::{debug, warn};
use serde_json::Value;

use super::engine::{row_id, SyncIssue, SyncOutcome, SyncService};
use crate::errors::Result;
use crate::models::EntityKind;
use crate::session::SessionContext;

/// Merges guest-scope and user-scope slots with the user's remote data set,
/// then pushes anything the remote has never seen.
///
/// Runs once per successful sign-in transition. An in-progress flag rejects
/// a concurrent second invocation outright: interleaving two merges over
/// the same slots could lose writes.
pub struct ReconcileCoordinator {
    engine: Arc<SyncService>,
    in_progress: AtomicBool,
}

impl ReconcileCoordinator {
    pub fn new(engine: Arc<SyncService>) -> Self {
        Self {
            engine,
            in_progress: AtomicBool::new(false),
        }
    }

    /// Fetch, merge (remote `updated_at` wins ties), persist, upload.
    pub async fn initialize_user_data(&self, user_id: &str) -> Result<SyncOutcome> {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            warn!("reconciliation for {user_id} already in progress");
            return Ok(SyncOutcome::failed(SyncIssue {
                entity: "session".to_string(),
                id: Some(user_id.to_string()),
                message: "reconciliation already in progress".to_string(),
            }));
        }

        let result = self.run(user_id).await;
        self.in_progress.store(false, Ordering::SeqCst);
        result
    }

    async fn run(&self, user_id: &str) -> Result<SyncOutcome> {
        let ctx = SessionContext::for_user(user_id);
        let guest = SessionContext::guest();
        let mut errors = Vec::new();

        for kind in EntityKind::ALL {
            let remote_rows = match self.engine.remote.fetch_all(kind, user_id).await {
                Ok(rows) => rows,
                Err(err) => {
                    // Merge proceeds with local data only; the remote copy
                    // heals through the upsert push below.
                    errors.push(SyncIssue {
                        entity: kind.table_name().to_string(),
                        id: None,
                        message: err.to_string(),
                    });
                    Vec::new()
                }
            };

            let _guard = self.engine.kind_lock(kind).lock().await;
            let local_rows = self.engine.store.load(ctx.scope(), kind).await?;
            let guest_rows = self.engine.store.load(guest.scope(), kind).await?;
            let had_guest_rows = !guest_rows.is_empty();

            let merged = merge_rows(remote_rows, local_rows, guest_rows);
            debug!("merged {} {} row(s)", merged.len(), kind.table_name());
            self.engine.store.save(ctx.scope(), kind, merged).await?;
            if had_guest_rows {
                // The guest slot has been absorbed into the user scope.
                self.engine
                    .store
                    .save(guest.scope(), kind, Vec::new())
                    .await?;
            }
        }

        let upload = self.engine.upload_all_data(&ctx).await?;
        errors.extend(upload.errors);
        Ok(SyncOutcome {
            success: errors.is_empty(),
            errors,
        })
    }
}

/// Merge rows by id, remote rows first so a duplicate only displaces them
/// with a strictly later `updated_at`. Sequence order is remote order, then
/// local-only rows, then guest-only rows.
fn merge_rows(remote: Vec<Value>, local: Vec<Value>, guest: Vec<Value>) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in remote.into_iter().chain(local).chain(guest) {
        let Some(id) = row_id(&row).map(str::to_string) else {
            continue;
        };
        match index.get(&id) {
            Some(&position) => {
                if row_wins(&row, &merged[position]) {
                    merged[position] = row;
                }
            }
            None => {
                index.insert(id, merged.len());
                merged.push(row);
            }
        }
    }
    merged
}

/// Whether the challenger's `updated_at` is strictly later than the
/// incumbent's. A row without a timestamp never displaces one that has it.
fn row_wins(challenger: &Value, incumbent: &Value) -> bool {
    let challenger_ts = challenger.get("updated_at").and_then(Value::as_str);
    let incumbent_ts = incumbent.get("updated_at").and_then(Value::as_str);
    match (challenger_ts, incumbent_ts) {
        (Some(challenger_ts), Some(incumbent_ts)) => later_timestamp(challenger_ts, incumbent_ts),
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Strict "later than" on RFC 3339 timestamps, comparing instants rather
/// than strings, with a lexicographic fallback for non-parseable values.
fn later_timestamp(challenger: &str, incumbent: &str) -> bool {
    let challenger_parsed =
        DateTime::parse_from_rfc3339(challenger).map(|value| value.timestamp_millis());
    let incumbent_parsed =
        DateTime::parse_from_rfc3339(incumbent).map(|value| value.timestamp_millis());

    if let (Ok(challenger_millis), Ok(incumbent_millis)) = (challenger_parsed, incumbent_parsed) {
        return challenger_millis > incumbent_millis;
    }
    challenger > incumbent
}
