//! # Sync Orchestrator
//!
//! Pushes the bundled catalog to the canonical store in fixed-size batches.
//!
//! ## Run Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       SyncOrchestrator::run                             │
//! │                                                                         │
//! │  Idle/Completed/Failed ──run()──► Running ──► Completed (errors == 0)   │
//! │                                      │                                  │
//! │                                      ├──► Failed (errors > 0,           │
//! │                                      │            cancelled, bad opts)  │
//! │                                      │                                  │
//! │  run() while Running ──► Err(SyncError::AlreadyRunning)                 │
//! │                                                                         │
//! │  For each batch (strictly sequential, catalog order):                  │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │ 1. cancelled? → stop, top-level "sync cancelled" entry           │  │
//! │  │ 2. to_wire(record, now) for every record                         │  │
//! │  │ 3. upsert_batch with timeout, retried per RetryPolicy            │  │
//! │  │    exhausted → every record of the batch becomes an error entry  │  │
//! │  │ 4. progress(current = records attempted so far)                  │  │
//! │  │ 5. inter-batch delay (skipped after the last batch, cut short    │  │
//! │  │    by cancellation)                                              │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed batch never aborts the run. Only problems outside the batch loop
//! (invalid options) end it early, as a `SyncResult` with one top-level
//! error entry.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use medi_core::validation::{validate_batch_size, validate_max_attempts};
use medi_core::wire::to_wire;
use medi_core::{
    CatalogStore, RemoteMedicineRow, SyncErrorDetail, SyncProgress, SyncResult, DEFAULT_BATCH_SIZE,
};

use crate::error::{MediResult, SyncError};
use crate::remote::{with_timeout, RemoteCatalog};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};

/// Status text of a cancelled run.
pub const CANCELLED_MESSAGE: &str = "sync cancelled";

// =============================================================================
// Sync State
// =============================================================================

/// Lifecycle of the orchestrator's most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SyncState {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Failed = 3,
}

impl SyncState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SyncState::Running,
            2 => SyncState::Completed,
            3 => SyncState::Failed,
            _ => SyncState::Idle,
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncState::Idle => write!(f, "idle"),
            SyncState::Running => write!(f, "running"),
            SyncState::Completed => write!(f, "completed"),
            SyncState::Failed => write!(f, "failed"),
        }
    }
}

/// Marks the orchestrator as running for as long as it lives.
///
/// Dropping the guard (run finished, or the run future was dropped) stores
/// the final state, `Failed` unless [`RunGuard::complete`] was called.
struct RunGuard<'a> {
    state: &'a AtomicU8,
    outcome: SyncState,
}

impl<'a> RunGuard<'a> {
    fn acquire(state: &'a AtomicU8) -> MediResult<Self> {
        state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != SyncState::Running as u8).then_some(SyncState::Running as u8)
            })
            .map_err(|_| SyncError::AlreadyRunning)?;

        Ok(RunGuard {
            state,
            outcome: SyncState::Failed,
        })
    }

    fn complete(&mut self) {
        self.outcome = SyncState::Completed;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.store(self.outcome as u8, Ordering::SeqCst);
    }
}

// =============================================================================
// Progress Sink
// =============================================================================

/// Receives a snapshot after every batch. Fire-and-forget.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: &SyncProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(&SyncProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &SyncProgress) {
        self(progress)
    }
}

/// Progress sink that drops every event.
pub struct NoOpSink;

impl ProgressSink for NoOpSink {
    fn on_progress(&self, _progress: &SyncProgress) {}
}

// =============================================================================
// Options
// =============================================================================

/// Tunables of a sync run.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    /// Pause between batches, bounding load on the backend.
    pub inter_batch_delay: Duration,
    /// Deadline of each upsert attempt.
    pub request_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            inter_batch_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncOptions {
    pub fn validate(&self) -> MediResult<()> {
        validate_batch_size(self.batch_size)?;
        validate_max_attempts(self.retry.max_attempts)?;
        if self.request_timeout.is_zero() {
            return Err(SyncError::InvalidConfig(
                "request_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Batched, retrying, cancellable upload of the catalog.
pub struct SyncOrchestrator {
    store: Arc<CatalogStore>,
    remote: Arc<dyn RemoteCatalog>,
    options: SyncOptions,
    sleeper: Arc<dyn Sleeper>,
    state: AtomicU8,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<CatalogStore>, remote: Arc<dyn RemoteCatalog>, options: SyncOptions) -> Self {
        SyncOrchestrator {
            store,
            remote,
            options,
            sleeper: Arc::new(TokioSleeper),
            state: AtomicU8::new(SyncState::Idle as u8),
        }
    }

    /// Replaces the sleeper used for backoff and inter-batch delays.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// State of the current or most recent run.
    pub fn state(&self) -> SyncState {
        SyncState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == SyncState::Running
    }

    /// Runs one full sync.
    ///
    /// Returns `Err` only when another run is active; every other outcome,
    /// including total failure, is described by the returned [`SyncResult`].
    pub async fn run(
        &self,
        progress: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> MediResult<SyncResult> {
        let mut run = self.begin()?;
        Ok(run.execute(progress, cancel).await)
    }

    /// Claims the run slot without starting the upload.
    ///
    /// The slot stays taken until the returned [`SyncRun`] is dropped, so a
    /// caller can publish per-run state (a cancel handle) in between.
    pub fn begin(&self) -> MediResult<SyncRun<'_>> {
        Ok(SyncRun {
            orchestrator: self,
            guard: RunGuard::acquire(&self.state)?,
        })
    }
}

/// A run holding the orchestrator's slot.
pub struct SyncRun<'a> {
    orchestrator: &'a SyncOrchestrator,
    guard: RunGuard<'a>,
}

impl SyncRun<'_> {
    /// Uploads the whole catalog.
    pub async fn execute(&mut self, progress: &dyn ProgressSink, cancel: CancellationToken) -> SyncResult {
        let orch = self.orchestrator;
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        if let Err(e) = orch.options.validate() {
            error!(%run_id, error = %e, "Refusing to start sync");
            return SyncResult::run_failure(e.to_string(), elapsed_ms(started));
        }

        let records = orch.store.all();
        let total = records.len();
        let batch_size = orch.options.batch_size;
        let batch_count = total.div_ceil(batch_size);

        info!(%run_id, total, batch_size, batch_count, "Catalog sync started");

        let mut result = SyncResult::default();

        if total == 0 {
            progress.on_progress(&SyncProgress::new(0, 0, "Nothing to sync"));
        }

        for (index, batch) in records.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                warn!(%run_id, batch = index + 1, processed = result.total_processed, "Catalog sync cancelled");
                result.errors += 1;
                result.error_details.push(SyncErrorDetail::new(
                    SyncErrorDetail::RUN_LEVEL_ID,
                    CANCELLED_MESSAGE,
                ));
                result.duration_ms = elapsed_ms(started);
                return result;
            }

            let now = Utc::now();
            let rows: Vec<RemoteMedicineRow> = batch.iter().map(|r| to_wire(r, now)).collect();

            debug!(%run_id, batch = index + 1, size = rows.len(), "Upserting batch");

            let attempt = orch
                .options
                .retry
                .run(orch.sleeper.as_ref(), |_attempt| {
                    with_timeout(orch.options.request_timeout, orch.remote.upsert_batch(&rows))
                })
                .await;

            match attempt {
                Ok(outcome) => {
                    result.inserted += outcome.inserted;
                    result.updated += outcome.updated;
                }
                Err(exhausted) => {
                    error!(
                        %run_id,
                        batch = index + 1,
                        size = batch.len(),
                        attempts = exhausted.attempts,
                        error = %exhausted.last_error,
                        "Batch failed after all retries"
                    );
                    let message = exhausted.last_error.to_string();
                    result.errors += batch.len();
                    result
                        .error_details
                        .extend(batch.iter().map(|r| SyncErrorDetail::new(&r.id, &message)));
                }
            }

            result.total_processed += batch.len();
            progress.on_progress(&SyncProgress::new(
                result.total_processed,
                total,
                format!("Synced batch {}/{}", index + 1, batch_count),
            ));

            if index + 1 < batch_count {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(%run_id, batch = index + 1, "Cancellation cut the inter-batch delay short");
                    }
                    _ = orch.sleeper.sleep(orch.options.inter_batch_delay) => {}
                }
            }
        }

        result.success = result.errors == 0;
        result.duration_ms = elapsed_ms(started);

        if result.success {
            self.guard.complete();
        }

        info!(
            %run_id,
            total_processed = result.total_processed,
            inserted = result.inserted,
            updated = result.updated,
            errors = result.errors,
            duration_ms = result.duration_ms,
            "Catalog sync finished"
        );

        result
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::SqliteCatalog;
    use crate::testing::{numbered_store, FakeRemote, GatedRemote, RecordingSleeper};
    use medi_db::{Database, DbConfig};
    use std::sync::Mutex;

    fn options(batch_size: usize) -> SyncOptions {
        SyncOptions {
            batch_size,
            ..Default::default()
        }
    }

    fn orchestrator(
        records: usize,
        batch_size: usize,
        remote: Arc<dyn RemoteCatalog>,
    ) -> (SyncOrchestrator, Arc<RecordingSleeper>) {
        let sleeper = Arc::new(RecordingSleeper::default());
        let orch = SyncOrchestrator::new(Arc::new(numbered_store(records)), remote, options(batch_size))
            .with_sleeper(sleeper.clone());
        (orch, sleeper)
    }

    fn collecting_sink() -> (Arc<Mutex<Vec<SyncProgress>>>, impl ProgressSink) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink_events = events.clone();
        let sink = move |p: &SyncProgress| sink_events.lock().unwrap().push(p.clone());
        (events, sink)
    }

    #[tokio::test]
    async fn test_clean_run_reports_all_inserted() {
        let remote = Arc::new(FakeRemote::default());
        let (orch, sleeper) = orchestrator(120, 50, remote.clone());
        let (events, sink) = collecting_sink();

        let result = orch.run(&sink, CancellationToken::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.total_processed, 120);
        assert_eq!(result.inserted, 120);
        assert_eq!(result.errors, 0);
        assert_eq!(orch.state(), SyncState::Completed);
        assert_eq!(remote.rows.lock().unwrap().len(), 120);

        let events = events.lock().unwrap();
        let currents: Vec<usize> = events.iter().map(|e| e.current).collect();
        assert_eq!(currents, vec![50, 100, 120]);
        assert_eq!(events.last().unwrap().percentage, 100);

        // Two pauses between three batches, none after the last.
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(500), Duration::from_millis(500)]
        );
    }

    #[tokio::test]
    async fn test_one_failed_batch_is_contained() {
        let remote = Arc::new(FakeRemote::default().failing_batch("med-050", u32::MAX));
        let (orch, _) = orchestrator(150, 50, remote.clone());
        let (events, sink) = collecting_sink();

        let result = orch.run(&sink, CancellationToken::new()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.errors, 50);
        assert_eq!(result.inserted + result.errors, result.total_processed);
        assert_eq!(result.total_processed, 150);
        assert!(result.error_details.iter().all(|d| d.message.contains("med-050")));
        assert_eq!(result.error_details[0].id, "med-050");
        assert_eq!(result.error_details[49].id, "med-099");

        // The batch after the failing one still ran.
        assert_eq!(remote.calls_for("med-100"), 1);
        assert_eq!(remote.calls_for("med-050"), 3);
        assert_eq!(events.lock().unwrap().last().unwrap().percentage, 100);
        assert_eq!(orch.state(), SyncState::Failed);
    }

    #[tokio::test]
    async fn test_batch_recovering_on_third_attempt_is_not_an_error() {
        let remote = Arc::new(FakeRemote::default().failing_batch("med-000", 2));
        let (orch, sleeper) = orchestrator(10, 50, remote.clone());

        let result = orch.run(&NoOpSink, CancellationToken::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.inserted, 10);
        assert_eq!(remote.calls_for("med-000"), 3);
        // Backoff only; a single batch has no inter-batch pause.
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_batches() {
        let remote = Arc::new(FakeRemote::default());
        let (orch, _) = orchestrator(100, 25, remote.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        let sink = move |p: &SyncProgress| {
            if p.current >= 50 {
                trigger.cancel();
            }
        };

        let result = orch.run(&sink, cancel).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.total_processed, 50);
        assert_eq!(result.inserted, 50);
        assert_eq!(result.error_details.len(), 1);
        assert_eq!(result.error_details[0].id, SyncErrorDetail::RUN_LEVEL_ID);
        assert_eq!(result.error_details[0].message, CANCELLED_MESSAGE);
        assert_eq!(remote.upsert_calls.lock().unwrap().len(), 2);
        assert_eq!(orch.state(), SyncState::Failed);
    }

    /// Never wakes up: only cancellation can end the delay.
    struct StalledSleeper;

    #[async_trait::async_trait]
    impl Sleeper for StalledSleeper {
        async fn sleep(&self, _duration: Duration) {
            std::future::pending::<()>().await;
        }
    }

    #[tokio::test]
    async fn test_cancel_interrupts_inter_batch_delay() {
        let remote = Arc::new(FakeRemote::default());
        let orch = SyncOrchestrator::new(Arc::new(numbered_store(100)), remote.clone(), options(50))
            .with_sleeper(Arc::new(StalledSleeper));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(Duration::from_secs(5), orch.run(&NoOpSink, cancel))
            .await
            .expect("cancellation must end the inter-batch delay")
            .unwrap();

        assert_eq!(result.total_processed, 50);
        assert_eq!(result.error_details[0].message, CANCELLED_MESSAGE);
        assert_eq!(remote.upsert_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_the_run() {
        let remote = Arc::new(FakeRemote::default());
        let (orch, _) = orchestrator(10, 0, remote.clone());

        let result = orch.run(&NoOpSink, CancellationToken::new()).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.errors, 1);
        assert_eq!(result.error_details[0].id, "*");
        assert!(remote.upsert_calls.lock().unwrap().is_empty());
        assert_eq!(orch.state(), SyncState::Failed);
    }

    #[tokio::test]
    async fn test_empty_catalog_completes() {
        let store = CatalogStore::from_partitions(Vec::new()).unwrap();
        let orch = SyncOrchestrator::new(
            Arc::new(store),
            Arc::new(FakeRemote::default()),
            SyncOptions::default(),
        );
        let (events, sink) = collecting_sink();

        let result = orch.run(&sink, CancellationToken::new()).await.unwrap();

        assert!(result.success);
        assert_eq!(result.total_processed, 0);
        assert_eq!(events.lock().unwrap()[0].percentage, 100);
    }

    #[tokio::test]
    async fn test_second_run_is_rejected_while_running() {
        let remote = Arc::new(GatedRemote::default());
        let orch = Arc::new(
            SyncOrchestrator::new(Arc::new(numbered_store(5)), remote.clone(), options(50))
                .with_sleeper(Arc::new(RecordingSleeper::default())),
        );

        let first = {
            let orch = orch.clone();
            tokio::spawn(async move { orch.run(&NoOpSink, CancellationToken::new()).await })
        };

        remote.entered.notified().await;
        assert_eq!(orch.state(), SyncState::Running);

        let second = orch.run(&NoOpSink, CancellationToken::new()).await;
        assert!(matches!(second, Err(SyncError::AlreadyRunning)));

        remote.release.notify_one();
        let result = first.await.unwrap().unwrap();
        assert!(result.success);
        assert_eq!(orch.state(), SyncState::Completed);

        // Finished runs free the slot again.
        let rerun = orch.run(&NoOpSink, CancellationToken::new());
        remote.release.notify_one();
        assert!(rerun.await.unwrap().success);
    }

    #[tokio::test]
    async fn test_sync_twice_against_sqlite_is_idempotent() {
        let db = Arc::new(Database::new(DbConfig::in_memory()).await.unwrap());
        let remote = Arc::new(SqliteCatalog::new(db.clone()));
        let store = Arc::new(medi_core::CatalogStore::bundled().unwrap());
        let orch = SyncOrchestrator::new(store.clone(), remote.clone(), options(10))
            .with_sleeper(Arc::new(RecordingSleeper::default()));

        let first = orch.run(&NoOpSink, CancellationToken::new()).await.unwrap();
        assert!(first.success);
        assert_eq!(first.inserted, store.len());

        let second = orch.run(&NoOpSink, CancellationToken::new()).await.unwrap();
        assert!(second.success);
        assert_eq!(second.errors, 0);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, store.len());

        assert_eq!(db.medicines().count().await.unwrap(), store.len() as i64);
        for sampled in ["para-napa-500", "omep-seclo-20", "ors-orsaline-n"] {
            let row = remote.get_by_id(sampled).await.unwrap().unwrap();
            let local = store.by_id(sampled).unwrap();
            assert_eq!(medi_core::wire::from_wire(row), *local);
        }
    }
}
