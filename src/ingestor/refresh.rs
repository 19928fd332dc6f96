//! Truncate-and-reload of the whole sales store.
//!
//! `RefreshOrchestrator` performs one cycle. `RefreshService` owns the
//! orchestrator and decides how cycles are started: in the foreground, where
//! callers queue behind any running cycle, or detached, where a second
//! request while one is in flight is acknowledged without starting anything.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::batch_loader::BatchLoader;
use super::state_manager::RefreshStateManager;
use super::upsert::{RowWriter, SalesUpserter};
use crate::config::{defaults::DEFAULT_REFRESH_TIMEOUT, Config};
use crate::database::{sales, Database};
use crate::errors::{RefreshError, RefreshResult, TruncationError};
use crate::models::{LoadSummary, RefreshAck, RefreshState, RefreshStatus, RefreshTrigger};

pub struct RefreshOrchestrator<W = SalesUpserter> {
    database: Database,
    loader: BatchLoader<W>,
    source_path: PathBuf,
    refresh_timeout: Duration,
}

impl<W: RowWriter> RefreshOrchestrator<W> {
    pub fn new<P: Into<PathBuf>>(database: Database, loader: BatchLoader<W>, source_path: P) -> Self {
        Self {
            database,
            loader,
            source_path: source_path.into(),
            refresh_timeout: DEFAULT_REFRESH_TIMEOUT,
        }
    }

    pub fn with_refresh_timeout(mut self, refresh_timeout: Duration) -> Self {
        self.refresh_timeout = refresh_timeout;
        self
    }

    /// Empty all four sales tables in one unit of work. On failure nothing
    /// is removed.
    pub async fn truncate(&self) -> Result<(), TruncationError> {
        let mut tx = self
            .database
            .pool()
            .begin()
            .await
            .map_err(|e| TruncationError::new("begin", e))?;

        for table in sales::TRUNCATE_ORDER {
            match sales::truncate_table(&mut tx, table).await {
                Ok(deleted) => debug!("Truncated {} ({} rows)", table, deleted),
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        warn!("Rollback of truncation failed: {}", rollback_err);
                    }
                    return Err(TruncationError::new(table, e));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| TruncationError::new("commit", e))
    }

    /// Run one cycle for `run_id`, reporting every state change to `state`.
    pub async fn run(
        &self,
        state: &RefreshStateManager,
        run_id: Uuid,
    ) -> RefreshResult<LoadSummary> {
        info!(
            "Refresh {} started from {}",
            run_id,
            self.source_path.display()
        );

        let result = match tokio::time::timeout(self.refresh_timeout, self.cycle(state, run_id)).await
        {
            Ok(result) => result,
            Err(_) => Err(RefreshError::TimedOut(self.refresh_timeout)),
        };

        match &result {
            Ok(summary) => {
                info!(
                    "Refresh {} done: {} loaded, {} skipped",
                    run_id, summary.loaded, summary.skipped
                );
                state.complete(run_id, summary.clone()).await;
            }
            Err(e) => {
                error!("Refresh {} failed: {}", run_id, e);
                state.fail(run_id, e.to_string()).await;
            }
        }

        result
    }

    async fn cycle(
        &self,
        state: &RefreshStateManager,
        run_id: Uuid,
    ) -> RefreshResult<LoadSummary> {
        state.transition(run_id, RefreshState::Truncating).await;
        self.truncate().await?;

        state.transition(run_id, RefreshState::Loading).await;
        let summary = self.loader.load_path(&self.source_path).await.map_err(|e| {
            warn!("Store was emptied but the source could not be read; it stays empty until the next refresh");
            e
        })?;

        Ok(summary)
    }
}

/// Entry point for starting refreshes. Cheap to clone.
pub struct RefreshService<W = SalesUpserter> {
    orchestrator: Arc<RefreshOrchestrator<W>>,
    state_manager: RefreshStateManager,
    gate: Arc<Mutex<()>>,
}

impl<W> Clone for RefreshService<W> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: self.orchestrator.clone(),
            state_manager: self.state_manager.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl RefreshService {
    /// Service backed by the SQLite upserter and the configured source.
    pub fn new(database: Database, config: &Config) -> anyhow::Result<Self> {
        let loader = BatchLoader::new(SalesUpserter::new(database.pool()))
            .with_row_timeout(config.ingestion.row_timeout()?)
            .with_progress_interval(config.ingestion.progress_update_interval);

        let orchestrator = RefreshOrchestrator::new(database, loader, &config.source.csv_path)
            .with_refresh_timeout(config.ingestion.refresh_timeout()?);

        Ok(Self::from_orchestrator(orchestrator))
    }
}

impl<W: RowWriter + 'static> RefreshService<W> {
    pub fn from_orchestrator(orchestrator: RefreshOrchestrator<W>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            state_manager: RefreshStateManager::new(),
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// Run a refresh to completion, after any refresh already in flight.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> RefreshResult<LoadSummary> {
        let _guard = self.gate.lock().await;
        let run_id = self.state_manager.start(trigger).await;
        self.orchestrator.run(&self.state_manager, run_id).await
    }

    /// Start a manual refresh in the background and return at once.
    pub async fn trigger(&self) -> RefreshAck {
        let guard = match self.gate.clone().try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                let run_id = self
                    .state_manager
                    .current()
                    .await
                    .map(|progress| progress.run_id)
                    .unwrap_or_else(Uuid::nil);
                info!("Refresh requested while {} is running; not starting another", run_id);
                return RefreshAck::AlreadyRunning { run_id };
            }
        };

        let run_id = self.state_manager.start(RefreshTrigger::Manual).await;
        let orchestrator = self.orchestrator.clone();
        let state_manager = self.state_manager.clone();

        tokio::spawn(async move {
            let _guard = guard;
            // Outcome is recorded in the state manager.
            let _ = orchestrator.run(&state_manager, run_id).await;
        });

        RefreshAck::Started { run_id }
    }

    pub async fn status(&self) -> RefreshStatus {
        self.state_manager.status().await
    }
}
