//! Background Job Runner
//!
//! A single worker task consumes jobs in FIFO order from an unbounded channel.
//! `enqueue` returns as soon as the job is queued; the caller never waits for
//! it. Jobs are not retried. Each job leaves a status record that can be read
//! back by id until it is pruned from the history.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::service::StudentService;
use crate::store::StoreError;

// == Job ==
/// Work item with its arguments captured at enqueue time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Job {
    /// Import every row of a CSV file
    ImportCsv { path: PathBuf },
    /// Delete all listed ids that exist
    DeleteStudents { ids: Vec<i64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Status record of one job
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub job: Job,
    pub status: JobStatus,
    /// Outcome summary or error message
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct JobHistory {
    records: HashMap<Uuid, JobRecord>,
    order: VecDeque<Uuid>,
    limit: usize,
}

impl JobHistory {
    fn insert(&mut self, record: JobRecord) {
        self.order.push_back(record.id);
        self.records.insert(record.id, record);

        // Oldest finished records go first; unfinished ones are never dropped
        while self.records.len() > self.limit {
            let position = self.order.iter().position(|id| {
                self.records
                    .get(id)
                    .map_or(true, |record| record.status.is_finished())
            });
            let Some(position) = position else { break };
            if let Some(id) = self.order.remove(position) {
                self.records.remove(&id);
            }
        }
    }

    fn remove(&mut self, id: &Uuid) {
        self.records.remove(id);
        self.order.retain(|queued| queued != id);
    }
}

type History = Arc<RwLock<JobHistory>>;

// == Job Runner ==
pub struct JobRunner {
    sender: Mutex<Option<mpsc::UnboundedSender<(Uuid, Job)>>>,
    history: History,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobRunner {
    /// Starts the worker task. Keeps status records for at most
    /// `history_limit` jobs.
    pub fn spawn(service: Arc<StudentService>, history_limit: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let history = Arc::new(RwLock::new(JobHistory {
            records: HashMap::new(),
            order: VecDeque::new(),
            limit: history_limit.max(1),
        }));

        let worker = tokio::spawn(run_worker(service, Arc::clone(&history), receiver));
        info!("Background job worker started");

        Self {
            sender: Mutex::new(Some(sender)),
            history,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queues `job` and returns its id without waiting for it to run.
    pub async fn enqueue(&self, job: Job) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.history.write().await.insert(JobRecord {
            id,
            job: job.clone(),
            status: JobStatus::Pending,
            detail: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        });

        let sent = {
            let sender = self
                .sender
                .lock()
                .map_err(|e| ApiError::Internal(format!("Lock poisoned: {}", e)))?;
            sender
                .as_ref()
                .map(|sender| sender.send((id, job)).is_ok())
                .unwrap_or(false)
        };

        if !sent {
            self.history.write().await.remove(&id);
            return Err(ApiError::Unavailable(
                "Background job runner is shut down".to_string(),
            ));
        }

        info!(job_id = %id, "Background job queued");
        Ok(id)
    }

    /// Returns the status record of job `id`, if still retained.
    pub async fn status(&self, id: &Uuid) -> Option<JobRecord> {
        self.history.read().await.records.get(id).cloned()
    }

    /// Stops accepting jobs and waits until every queued job has run.
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            Err(e) => {
                warn!("Job queue lock poisoned: {}", e);
                return;
            }
        };
        drop(sender);

        let worker = self.worker.lock().ok().and_then(|mut worker| worker.take());
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!("Job worker terminated abnormally: {}", e);
            }
        }
    }
}

async fn run_worker(
    service: Arc<StudentService>,
    history: History,
    mut receiver: mpsc::UnboundedReceiver<(Uuid, Job)>,
) {
    while let Some((id, job)) = receiver.recv().await {
        update_record(&history, &id, |record| {
            record.status = JobStatus::Running;
            record.started_at = Some(Utc::now());
        })
        .await;

        // Run in its own task so a panicking job does not take the worker down
        let task_service = Arc::clone(&service);
        let outcome = tokio::spawn(async move { execute(&task_service, job).await }).await;

        let (status, detail) = match outcome {
            Ok(Ok(summary)) => {
                info!(job_id = %id, "{}", summary);
                (JobStatus::Succeeded, summary)
            }
            Ok(Err(err)) => {
                error!(job_id = %id, error = %err, "Background job failed");
                (JobStatus::Failed, err.to_string())
            }
            Err(err) => {
                error!(job_id = %id, error = %err, "Background job panicked");
                (JobStatus::Failed, format!("Job aborted: {}", err))
            }
        };

        update_record(&history, &id, |record| {
            record.status = status;
            record.detail = Some(detail);
            record.finished_at = Some(Utc::now());
        })
        .await;
    }

    info!("Background job worker stopped");
}

async fn execute(service: &StudentService, job: Job) -> std::result::Result<String, StoreError> {
    match job {
        Job::ImportCsv { path } => {
            let inserted = service.import_csv(&path).await?;
            Ok(format!("Imported {} students from {}", inserted, path.display()))
        }
        Job::DeleteStudents { ids } => {
            let deleted = service.bulk_delete(&ids).await?;
            Ok(format!("Deleted {} of {} requested students", deleted, ids.len()))
        }
    }
}

async fn update_record(history: &History, id: &Uuid, f: impl FnOnce(&mut JobRecord)) {
    if let Some(record) = history.write().await.records.get_mut(id) {
        f(record);
    }
}
