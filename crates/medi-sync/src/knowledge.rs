//! # Medicine Knowledge
//!
//! The single object UI collaborators hold: lookups through the facade,
//! catalog sync through the orchestrator.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         MedicineKnowledge                               │
//! │                                                                         │
//! │   Arc<CatalogStore> ──┬──► SearchEngine ──► LookupFacade ◄── remote     │
//! │                       │                                                 │
//! │                       └──► SyncOrchestrator ◄─────────────── remote     │
//! │                                                                         │
//! │   lookup / alternatives / by_id / by_indication / check_interactions   │
//! │   sync_all(progress) / cancel_sync()                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::info;

use medi_core::{CatalogStore, MedicineRecord, SearchEngine, SearchFilters, SyncResult};

use crate::config::SyncConfig;
use crate::error::{MediResult, SyncError};
use crate::facade::{InteractionCheck, LookupFacade, LookupResult};
use crate::orchestrator::{ProgressSink, SyncOrchestrator, SyncState};
use crate::remote::{RemoteCatalog, RestCatalogClient};
use crate::retry::Sleeper;

/// Entry point of the medicine knowledge core.
pub struct MedicineKnowledge {
    store: Arc<CatalogStore>,
    facade: LookupFacade,
    orchestrator: SyncOrchestrator,
    default_limit: usize,
    /// Token of the run in progress, if any.
    current_run: Mutex<Option<CancellationToken>>,
}

impl MedicineKnowledge {
    /// Starts a builder from a loaded configuration.
    pub fn builder(config: SyncConfig) -> MedicineKnowledgeBuilder {
        MedicineKnowledgeBuilder::new(config)
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn lookup(&self, query: &str, limit: usize) -> LookupResult {
        self.facade.lookup(query, limit).await
    }

    /// Lookup with the configured default limit.
    pub async fn search(&self, query: &str) -> LookupResult {
        self.facade.lookup(query, self.default_limit).await
    }

    pub async fn lookup_filtered(
        &self,
        query: &str,
        limit: usize,
        filters: &SearchFilters,
    ) -> LookupResult {
        self.facade.lookup_filtered(query, limit, filters).await
    }

    pub async fn alternatives(&self, generic_name: &str) -> LookupResult {
        self.facade.alternatives(generic_name).await
    }

    pub async fn by_id(&self, id: &str) -> Option<MedicineRecord> {
        self.facade.by_id(id).await.into_records().into_iter().next()
    }

    pub async fn by_indication(&self, term: &str) -> LookupResult {
        self.facade.by_indication(term).await
    }

    pub async fn check_interactions(&self, ids: &[String]) -> InteractionCheck {
        self.facade.check_interactions(ids).await
    }

    // =========================================================================
    // Sync
    // =========================================================================

    /// Pushes the whole catalog to the remote store.
    ///
    /// Fails with [`SyncError::AlreadyRunning`] if a sync is in progress.
    pub async fn sync_all(&self, progress: &dyn ProgressSink) -> MediResult<SyncResult> {
        let token = CancellationToken::new();

        // The slot is claimed and the token published under one lock, so
        // `cancel_sync` never sees a token that belongs to no run.
        let mut run = {
            let mut current = self.lock_run();
            let run = self.orchestrator.begin()?;
            *current = Some(token.clone());
            run
        };

        let result = run.execute(progress, token).await;

        // Cleared while `run` still holds the slot: a run started after this
        // one cannot have published its token yet.
        *self.lock_run() = None;
        drop(run);

        Ok(result)
    }

    /// Stops the running sync before its next batch. No-op when idle.
    pub fn cancel_sync(&self) {
        if let Some(token) = self.lock_run().as_ref() {
            info!("Cancelling catalog sync");
            token.cancel();
        }
    }

    pub fn sync_state(&self) -> SyncState {
        self.orchestrator.state()
    }

    fn lock_run(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current_run
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for [`MedicineKnowledge`].
pub struct MedicineKnowledgeBuilder {
    config: SyncConfig,
    store: Option<Arc<CatalogStore>>,
    remote: Option<Arc<dyn RemoteCatalog>>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl MedicineKnowledgeBuilder {
    pub fn new(config: SyncConfig) -> Self {
        MedicineKnowledgeBuilder {
            config,
            store: None,
            remote: None,
            sleeper: None,
        }
    }

    /// Uses this catalog instead of the bundled one.
    pub fn with_store(mut self, store: Arc<CatalogStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the remote catalog. Without one, a REST client is built from
    /// the `[remote]` config section.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteCatalog>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Sets the sleeper used for backoff and inter-batch delays.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Builds the knowledge core.
    pub fn build(self) -> MediResult<MedicineKnowledge> {
        self.config.validate()?;

        let store = match self.store {
            Some(store) => store,
            None => Arc::new(CatalogStore::bundled()?),
        };

        let remote = match self.remote {
            Some(remote) => remote,
            None => {
                let base_url = self.config.remote_url().ok_or_else(|| {
                    SyncError::InvalidConfig(
                        "Remote catalog required: set [remote] base_url or MEDI_REMOTE_URL".into(),
                    )
                })?;
                let api_key = self.config.remote.api_key.clone().unwrap_or_default();
                Arc::new(RestCatalogClient::new(
                    base_url,
                    api_key,
                    self.config.request_timeout(),
                )?) as Arc<dyn RemoteCatalog>
            }
        };

        let facade = LookupFacade::new(
            remote.clone(),
            SearchEngine::new(store.clone()),
            self.config.lookup.fallback_policy,
            self.config.request_timeout(),
        );

        let mut orchestrator =
            SyncOrchestrator::new(store.clone(), remote, self.config.sync_options());
        if let Some(sleeper) = self.sleeper {
            orchestrator = orchestrator.with_sleeper(sleeper);
        }

        info!(
            records = store.len(),
            policy = %self.config.lookup.fallback_policy,
            "Medicine knowledge ready"
        );

        Ok(MedicineKnowledge {
            store,
            facade,
            orchestrator,
            default_limit: self.config.lookup.default_limit,
            current_run: Mutex::new(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facade::Provenance;
    use crate::testing::{napa_ace_store, numbered_store, FakeRemote, GatedRemote, RecordingSleeper};
    use crate::NoOpSink;
    use medi_core::SyncProgress;

    fn knowledge(store: CatalogStore, remote: Arc<FakeRemote>) -> MedicineKnowledge {
        MedicineKnowledge::builder(SyncConfig::default())
            .with_store(Arc::new(store))
            .with_remote(remote)
            .with_sleeper(Arc::new(RecordingSleeper::default()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_without_remote_needs_url() {
        let err = MedicineKnowledge::builder(SyncConfig::default())
            .build()
            .err()
            .unwrap();
        assert!(err.is_config_error());

        let mut config = SyncConfig::default();
        config.remote.base_url = Some("https://catalog.example.org".into());
        let knowledge = MedicineKnowledge::builder(config).build().unwrap();
        assert_eq!(knowledge.store().len(), 24);
    }

    #[tokio::test]
    async fn test_sync_then_lookup_is_served_remotely() {
        let remote = Arc::new(FakeRemote::default());
        let knowledge = knowledge(napa_ace_store(), remote.clone());

        // Nothing synced yet: the remote has no rows, so lookups go local.
        let before = knowledge.search("napa").await;
        assert_eq!(before.provenance(), Some(Provenance::Local));

        let result = knowledge.sync_all(&NoOpSink).await.unwrap();
        assert!(result.success);
        assert_eq!(knowledge.sync_state(), SyncState::Completed);

        let after = knowledge.lookup("napa", 5).await;
        assert_eq!(after.provenance(), Some(Provenance::Remote));
        assert_eq!(knowledge.by_id("b").await.unwrap().brand_name, "Ace");
    }

    #[tokio::test]
    async fn test_cancel_sync_from_progress_callback() {
        let remote = Arc::new(FakeRemote::default());
        let knowledge = Arc::new(knowledge(numbered_store(200), remote.clone()));

        let handle = knowledge.clone();
        let sink = move |_: &SyncProgress| handle.cancel_sync();

        let result = knowledge.sync_all(&sink).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.total_processed, 50);
        assert_eq!(knowledge.sync_state(), SyncState::Failed);

        // Cancelling when idle does nothing.
        knowledge.cancel_sync();
    }

    #[tokio::test]
    async fn test_rejected_sync_leaves_active_run_cancellable() {
        let remote = Arc::new(GatedRemote::default());
        let knowledge = Arc::new(
            MedicineKnowledge::builder(SyncConfig::default())
                .with_store(Arc::new(numbered_store(200)))
                .with_remote(remote.clone())
                .with_sleeper(Arc::new(RecordingSleeper::default()))
                .build()
                .unwrap(),
        );

        let first = {
            let knowledge = knowledge.clone();
            tokio::spawn(async move { knowledge.sync_all(&NoOpSink).await })
        };
        remote.entered.notified().await;

        let second = knowledge.sync_all(&NoOpSink).await;
        assert!(matches!(second, Err(SyncError::AlreadyRunning)));

        // Must reach the first run, not the rejected one.
        knowledge.cancel_sync();
        remote.release.notify_one();

        let result = first.await.unwrap().unwrap();
        assert!(!result.success);
        assert_eq!(result.total_processed, 50);
        assert_eq!(knowledge.sync_state(), SyncState::Failed);

        // The finished run cleared its token: the next run is not pre-cancelled.
        let rerun = {
            let knowledge = knowledge.clone();
            tokio::spawn(async move { knowledge.sync_all(&NoOpSink).await })
        };
        for _ in 0..4 {
            remote.entered.notified().await;
            remote.release.notify_one();
        }
        let result = rerun.await.unwrap().unwrap();
        assert!(result.success);
        assert_eq!(result.total_processed, 200);
    }
}
