//! File-backed implementation of the local store boundary.
//!
//! Each (scope, kind) slot is one JSON document under the data directory:
//! `<root>/<scope>/<table>.json`. Saves go through a temp file followed by
//! a rename, so a concurrent reader never observes a torn slot.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;
use serde_json::Value;
use tokio::fs;

use finsync_core::models::EntityKind;
use finsync_core::store::{LocalStore, StoreError};

fn io_err(err: std::io::Error) -> StoreError {
    StoreError::Io(err.to_string())
}

fn encoding_err(err: serde_json::Error) -> StoreError {
    StoreError::Encoding(err.to_string())
}

/// Scopes are user ids or the reserved guest scope; anything that is not
/// filename-safe maps to an underscore.
fn sanitize_scope(scope: &str) -> String {
    scope
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// On-device record store, one slot per entity kind per scope.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn slot_path(&self, scope: &str, kind: EntityKind) -> PathBuf {
        self.root
            .join(sanitize_scope(scope))
            .join(format!("{}.json", kind.table_name()))
    }
}

#[async_trait]
impl LocalStore for FileStore {
    async fn load(&self, scope: &str, kind: EntityKind) -> Result<Vec<Value>, StoreError> {
        let path = self.slot_path(scope, kind);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            // A slot that has never been written is an empty sequence.
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(io_err(err)),
        };
        serde_json::from_slice(&bytes).map_err(encoding_err)
    }

    async fn save(
        &self,
        scope: &str,
        kind: EntityKind,
        rows: Vec<Value>,
    ) -> Result<(), StoreError> {
        let path = self.slot_path(scope, kind);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let payload = serde_json::to_vec(&rows).map_err(encoding_err)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &payload).await.map_err(io_err)?;
        fs::rename(&tmp, &path).await.map_err(io_err)?;
        debug!("saved {} row(s) to {}", rows.len(), path.display());
        Ok(())
    }
}
