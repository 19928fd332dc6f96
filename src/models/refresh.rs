use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::RowError;

/// Result of processing one non-header source row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Loaded { row: usize },
    Skipped { row: usize, reason: RowError },
}

impl RowOutcome {
    pub fn row(&self) -> usize {
        match self {
            RowOutcome::Loaded { row } | RowOutcome::Skipped { row, .. } => *row,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, RowOutcome::Loaded { .. })
    }
}

/// Loaded vs. skipped counts for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub rows: usize,
    pub loaded: usize,
    pub skipped: usize,
    pub validation_failures: usize,
    pub persistence_failures: usize,
    pub timeouts: usize,
    pub duration_ms: u64,
}

impl LoadSummary {
    pub fn record(&mut self, outcome: &RowOutcome) {
        self.rows += 1;
        match outcome {
            RowOutcome::Loaded { .. } => self.loaded += 1,
            RowOutcome::Skipped { reason, .. } => {
                self.skipped += 1;
                match reason {
                    RowError::Validation(_) => self.validation_failures += 1,
                    RowError::Persistence(_) => self.persistence_failures += 1,
                    RowError::TimedOut { .. } => self.timeouts += 1,
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Idle,
    Truncating,
    Loading,
    Done,
    Failed,
}

impl RefreshState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RefreshState::Done | RefreshState::Failed)
    }
}

/// What started a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshTrigger {
    Startup,
    Manual,
}

/// Latest known state of one refresh run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshProgress {
    pub run_id: Uuid,
    pub trigger: RefreshTrigger,
    pub state: RefreshState,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub summary: Option<LoadSummary>,
    pub error: Option<String>,
}

/// Acknowledgment returned by the detached refresh trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshAck {
    Started { run_id: Uuid },
    AlreadyRunning { run_id: Uuid },
}

/// Refresh status as reported over HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub state: RefreshState,
    pub last_run: Option<RefreshProgress>,
}
