//! Session-scoped entry points for UI collaborators.

use std::sync::Arc;

use chrono::Utc;

use crate::errors::Result;
use crate::gateway::RemoteGateway;
use crate::models::{Asset, Category, EntityKind, Transaction};
use crate::session::SessionContext;
use crate::store::LocalStore;
use crate::sync::{ReconcileCoordinator, RecurringGenerator, SyncOutcome, SyncService};

/// One per session. Wires the engine, the recurring generator, and the
/// reconciliation coordinator over a shared store/gateway pair and threads
/// the session context into every call.
pub struct FinanceService {
    engine: Arc<SyncService>,
    generator: RecurringGenerator,
    reconciler: ReconcileCoordinator,
    session: SessionContext,
}

impl FinanceService {
    pub fn new(
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteGateway>,
        session: SessionContext,
    ) -> Self {
        let engine = Arc::new(SyncService::new(store, remote));
        Self {
            generator: RecurringGenerator::new(engine.clone()),
            reconciler: ReconcileCoordinator::new(engine.clone()),
            engine,
            session,
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Shared engine, for collaborators that need the generic operations.
    pub fn engine(&self) -> &Arc<SyncService> {
        &self.engine
    }

    /// Catch up recurring series before the first screen reads data.
    /// Returns the number of occurrences materialized.
    pub async fn initialize(&self) -> Result<usize> {
        self.generator
            .generate_due(&self.session, Utc::now().date_naive())
            .await
    }

    pub async fn add_transaction(&self, transaction: Transaction) -> Result<SyncOutcome> {
        self.engine.add_record(&self.session, transaction).await
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<SyncOutcome> {
        self.engine
            .delete_record(&self.session, EntityKind::Transaction, id)
            .await
    }

    /// Low-latency single-record path used right after a local mutation.
    pub async fn sync_transaction_instantly(&self, transaction: Transaction) -> Result<SyncOutcome> {
        self.engine.sync_instantly(&self.session, transaction).await
    }

    pub async fn add_asset(&self, asset: Asset) -> Result<SyncOutcome> {
        self.engine.add_record(&self.session, asset).await
    }

    pub async fn add_category(&self, category: Category) -> Result<SyncOutcome> {
        self.engine.add_record(&self.session, category).await
    }

    /// The explicit category lifecycle operation; nothing else ever removes
    /// a category.
    pub async fn delete_category(&self, id: &str) -> Result<SyncOutcome> {
        self.engine
            .delete_record(&self.session, EntityKind::Category, id)
            .await
    }

    /// The single sign-in handler: one-shot reconciliation of local data
    /// with the user's remote data set.
    pub async fn reload_user_data(&self, user_id: &str) -> Result<SyncOutcome> {
        self.reconciler.initialize_user_data(user_id).await
    }

    /// Push every local entity kind in per-kind batches.
    pub async fn upload_all_data(&self) -> Result<SyncOutcome> {
        self.engine.upload_all_data(&self.session).await
    }
}
