use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::notify::Notifier;
use super::pipeline::{IngestionPipeline, PipelineError, RunReport, RunState, ShutdownSignal};
use super::storage::{JournalEntry, StoreError};

/// Outcome of handing a run's matches to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Nothing matched, so nothing was sent.
    Skipped,
    Delivered { count: usize },
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub finished_at: DateTime<Utc>,
    pub state: RunState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<RunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub notification: NotificationStatus,
}

/// Runs the pipeline, then notifies, and remembers the latest summary.
pub struct WatchService {
    pipeline: Arc<IngestionPipeline>,
    notifier: Arc<dyn Notifier>,
    shutdown: ShutdownSignal,
    latest: RwLock<Option<RunSummary>>,
    run_lock: Mutex<()>,
}

impl WatchService {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        notifier: Arc<dyn Notifier>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            pipeline,
            notifier,
            shutdown,
            latest: RwLock::new(None),
            run_lock: Mutex::new(()),
        }
    }

    pub fn pipeline(&self) -> &IngestionPipeline {
        &self.pipeline
    }

    /// Executes one run. A second caller arriving while a run is active is turned away
    /// rather than queued.
    pub async fn run_once(&self) -> Result<RunSummary, WatchServiceError> {
        let _running = self
            .run_lock
            .try_lock()
            .map_err(|_| WatchServiceError::RunInProgress)?;

        let report = match self.pipeline.run(&self.shutdown).await {
            Ok(report) => report,
            Err(err) => {
                let summary = RunSummary {
                    finished_at: Utc::now(),
                    state: RunState::Failed,
                    report: None,
                    error: Some(format!("{err} (while {})", err.failed_in().label())),
                    notification: NotificationStatus::Skipped,
                };
                *self.latest.write().await = Some(summary);
                return Err(err.into());
            }
        };

        // Seen-set is already persisted at this point; a delivery failure is only recorded.
        let notification = if report.matches.is_empty() {
            info!("no new matches, notification skipped");
            NotificationStatus::Skipped
        } else {
            match self.notifier.notify(&report.matches).await {
                Ok(()) => NotificationStatus::Delivered {
                    count: report.matches.len(),
                },
                Err(err) => {
                    warn!(error = %err, matches = report.matches.len(), "notification failed");
                    NotificationStatus::Failed {
                        error: err.to_string(),
                    }
                }
            }
        };

        let summary = RunSummary {
            finished_at: report.finished_at.unwrap_or_else(Utc::now),
            state: report.state,
            report: Some(report),
            error: None,
            notification,
        };
        *self.latest.write().await = Some(summary.clone());
        Ok(summary)
    }

    pub async fn latest(&self) -> Option<RunSummary> {
        self.latest.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    /// Most recent `limit` journal entries, oldest first.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<JournalEntry>, StoreError> {
        let mut entries = self.pipeline.journal().entries()?;
        if let Some(limit) = limit {
            let skip = entries.len().saturating_sub(limit);
            entries.drain(..skip);
        }
        Ok(entries)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WatchServiceError {
    #[error("a run is already in progress")]
    RunInProgress,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
