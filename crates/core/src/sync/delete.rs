//! Delete coordination: local removal plus idempotent remote delete.

use log::debug;

use super::engine::{row_id, SyncIssue, SyncOutcome, SyncService};
use crate::errors::{Error, Result};
use crate::models::EntityKind;
use crate::session::SessionContext;

impl SyncService {
    /// Remove one record from the local slot, then best-effort delete it
    /// remotely.
    ///
    /// Deleting an id that exists nowhere is a no-op success. Only the
    /// `kind` slot is touched: deleting a transaction never reaches the
    /// category slot — categories stay addressable for every surviving
    /// referrer and are removed only by an explicit category delete.
    pub async fn delete_record(
        &self,
        ctx: &SessionContext,
        kind: EntityKind,
        id: &str,
    ) -> Result<SyncOutcome> {
        {
            let _guard = self.kind_lock(kind).lock().await;
            let mut rows = self.store.load(ctx.scope(), kind).await?;
            let before = rows.len();
            rows.retain(|row| row_id(row) != Some(id));
            if rows.len() != before {
                self.store.save(ctx.scope(), kind, rows).await?;
            } else {
                debug!("{} {id} not present locally", kind.table_name());
            }
        }

        match self.remote.delete_by_id(kind, id).await {
            Ok(()) => Ok(SyncOutcome::ok()),
            Err(err) if err.is_not_found() => {
                debug!("remote {} {id} already absent", kind.table_name());
                Ok(SyncOutcome::ok())
            }
            Err(err) => Ok(SyncOutcome::failed(SyncIssue {
                entity: kind.table_name().to_string(),
                id: Some(id.to_string()),
                message: Error::from_gateway(err).to_string(),
            })),
        }
    }
}
