//! Background task runner
//!
//! Long running jobs (rescoring a whole contest) run on the tokio runtime.
//! Their status is kept in memory under a job id that clients poll.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::{constants::JOB_RETENTION_SECS, error::AppResult};

/// A participation that could not be rescored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RescoreFailure {
    pub participation_id: i64,
    pub error: String,
}

/// Outcome of rescoring a set of participations
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RescoreReport {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<RescoreFailure>,
}

impl RescoreReport {
    pub fn record_success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, participation_id: i64, error: String) {
        self.total += 1;
        self.failures.push(RescoreFailure {
            participation_id,
            error,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed { report: RescoreReport },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }
}

struct JobEntry {
    status: JobStatus,
    finished_at: Option<Instant>,
}

impl JobEntry {
    fn new(status: JobStatus) -> Self {
        let finished_at = status.is_finished().then(Instant::now);
        Self {
            status,
            finished_at,
        }
    }
}

/// Finished jobs stay pollable for the retention period, then are dropped
/// the next time a job is spawned.
#[derive(Clone)]
pub struct TaskRunner {
    jobs: Arc<DashMap<Uuid, JobEntry>>,
    retention: Duration,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::with_retention(Duration::from_secs(JOB_RETENTION_SECS))
    }
}

impl TaskRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            jobs: Arc::new(DashMap::new()),
            retention,
        }
    }

    fn prune_finished(&self) {
        let retention = self.retention;
        self.jobs.retain(|_, entry| {
            entry
                .finished_at
                .is_none_or(|finished| finished.elapsed() < retention)
        });
    }

    /// Run `job` in the background and return its id
    pub fn spawn<F>(&self, description: impl Into<String>, job: F) -> Uuid
    where
        F: Future<Output = AppResult<RescoreReport>> + Send + 'static,
    {
        self.prune_finished();

        let id = Uuid::new_v4();
        let description = description.into();
        self.jobs.insert(id, JobEntry::new(JobStatus::Pending));

        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            jobs.insert(id, JobEntry::new(JobStatus::Running));
            tracing::info!(job_id = %id, job = %description, "Background job started");

            let status = match job.await {
                Ok(report) => {
                    tracing::info!(
                        job_id = %id,
                        job = %description,
                        total = report.total,
                        failed = report.failures.len(),
                        "Background job finished"
                    );
                    JobStatus::Completed { report }
                }
                Err(e) => {
                    tracing::error!(job_id = %id, job = %description, error = %e, "Background job failed");
                    JobStatus::Failed {
                        message: e.to_string(),
                    }
                }
            };
            jobs.insert(id, JobEntry::new(status));
        });

        id
    }

    pub fn status(&self, id: &Uuid) -> Option<JobStatus> {
        self.jobs.get(id).map(|entry| entry.status.clone())
    }
}
