use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::models::*;

pub type ProgressSender = broadcast::Sender<RefreshProgress>;
pub type ProgressReceiver = broadcast::Receiver<RefreshProgress>;

/// Tracks the most recent refresh run and broadcasts every change to it.
#[derive(Clone)]
pub struct RefreshStateManager {
    current: Arc<RwLock<Option<RefreshProgress>>>,
    progress_tx: ProgressSender,
}

impl RefreshStateManager {
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(64);
        Self {
            current: Arc::new(RwLock::new(None)),
            progress_tx,
        }
    }

    pub fn subscribe(&self) -> ProgressReceiver {
        self.progress_tx.subscribe()
    }

    /// Record a new run in the `Truncating` state, replacing the previous one.
    pub async fn start(&self, trigger: RefreshTrigger) -> Uuid {
        let now = Utc::now();
        let progress = RefreshProgress {
            run_id: Uuid::new_v4(),
            trigger,
            state: RefreshState::Truncating,
            started_at: now,
            updated_at: now,
            completed_at: None,
            summary: None,
            error: None,
        };
        let run_id = progress.run_id;

        {
            let mut current = self.current.write().await;
            *current = Some(progress.clone());
        }

        let _ = self.progress_tx.send(progress);
        run_id
    }

    pub async fn transition(&self, run_id: Uuid, state: RefreshState) {
        self.update(run_id, |progress| progress.state = state).await;
    }

    pub async fn complete(&self, run_id: Uuid, summary: LoadSummary) {
        self.update(run_id, |progress| {
            progress.state = RefreshState::Done;
            progress.summary = Some(summary);
        })
        .await;
    }

    pub async fn fail(&self, run_id: Uuid, error: String) {
        self.update(run_id, |progress| {
            progress.state = RefreshState::Failed;
            progress.error = Some(error);
        })
        .await;
    }

    pub async fn current(&self) -> Option<RefreshProgress> {
        self.current.read().await.clone()
    }

    pub async fn status(&self) -> RefreshStatus {
        let last_run = self.current().await;
        RefreshStatus {
            state: last_run
                .as_ref()
                .map(|progress| progress.state)
                .unwrap_or(RefreshState::Idle),
            last_run,
        }
    }

    // Updates for a run other than the current one are dropped.
    async fn update<F>(&self, run_id: Uuid, apply: F)
    where
        F: FnOnce(&mut RefreshProgress),
    {
        let updated = {
            let mut current = self.current.write().await;
            match current.as_mut() {
                Some(progress) if progress.run_id == run_id => {
                    apply(progress);
                    progress.updated_at = Utc::now();
                    if progress.state.is_terminal() {
                        progress.completed_at = Some(progress.updated_at);
                    }
                    Some(progress.clone())
                }
                _ => None,
            }
        };

        if let Some(progress) = updated {
            let _ = self.progress_tx.send(progress);
        }
    }
}

impl Default for RefreshStateManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_before_first_run() {
        let manager = RefreshStateManager::new();
        let status = manager.status().await;
        assert_eq!(status.state, RefreshState::Idle);
        assert!(status.last_run.is_none());
    }

    #[tokio::test]
    async fn test_run_lifecycle_is_broadcast() {
        let manager = RefreshStateManager::new();
        let mut rx = manager.subscribe();

        let run_id = manager.start(RefreshTrigger::Manual).await;
        manager.transition(run_id, RefreshState::Loading).await;
        manager
            .complete(
                run_id,
                LoadSummary {
                    rows: 2,
                    loaded: 2,
                    ..Default::default()
                },
            )
            .await;

        let states: Vec<RefreshState> = vec![
            rx.recv().await.unwrap().state,
            rx.recv().await.unwrap().state,
            rx.recv().await.unwrap().state,
        ];
        assert_eq!(
            states,
            vec![RefreshState::Truncating, RefreshState::Loading, RefreshState::Done]
        );

        let last = manager.current().await.unwrap();
        assert_eq!(last.run_id, run_id);
        assert!(last.completed_at.is_some());
        assert_eq!(last.summary.unwrap().loaded, 2);
    }

    #[tokio::test]
    async fn test_stale_run_updates_are_ignored() {
        let manager = RefreshStateManager::new();
        let old = manager.start(RefreshTrigger::Startup).await;
        let new = manager.start(RefreshTrigger::Manual).await;

        manager.fail(old, "late failure".to_string()).await;

        let status = manager.status().await;
        assert_eq!(status.state, RefreshState::Truncating);
        assert_eq!(status.last_run.unwrap().run_id, new);
    }
}
