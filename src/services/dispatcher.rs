//! Single-consumer job actor.
//!
//! A [`Dispatcher`] owns one tokio task that drains a bounded inbox
//! strictly in arrival order. Each job runs the full pipeline on the
//! blocking pool and its outcome is broadcast tagged with the job id, so
//! callers match responses to the requests they care about. The actor
//! keeps nothing between jobs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ditherkit_core::{ImageBuffer, RenderOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use utoipa::ToSchema;

/// Opaque correlation token. Never interpreted by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(String);

static NEXT_JOB: AtomicU64 = AtomicU64::new(1);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Process-unique id of the form `job-N`.
    pub fn generate() -> Self {
        Self(format!("job-{}", NEXT_JOB.fetch_add(1, Ordering::Relaxed)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One unit of work. The image and options are owned snapshots.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub job_id: JobId,
    pub image: ImageBuffer,
    pub options: RenderOptions,
}

impl JobRequest {
    /// A request with a generated id.
    pub fn new(image: ImageBuffer, options: RenderOptions) -> Self {
        Self {
            job_id: JobId::generate(),
            image,
            options,
        }
    }

    pub fn with_id(mut self, job_id: JobId) -> Self {
        self.job_id = job_id;
        self
    }
}

#[derive(Debug, Clone)]
pub enum JobResponse {
    Completed {
        job_id: JobId,
        image: Arc<ImageBuffer>,
    },
    Failed {
        job_id: JobId,
        error: String,
    },
}

impl JobResponse {
    pub fn job_id(&self) -> &JobId {
        match self {
            JobResponse::Completed { job_id, .. } | JobResponse::Failed { job_id, .. } => job_id,
        }
    }

    pub fn into_result(self) -> Result<Arc<ImageBuffer>, DispatchError> {
        match self {
            JobResponse::Completed { image, .. } => Ok(image),
            JobResponse::Failed { job_id, error } => Err(DispatchError::Failed {
                job_id,
                message: error,
            }),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("Dispatcher {0} is closed")]
    Closed(String),

    #[error("Job {job_id} failed: {message}")]
    Failed { job_id: JobId, message: String },

    /// The subscription fell behind and the response may have been among
    /// the dropped messages.
    #[error("Response for job {job_id} was lost ({skipped} responses skipped)")]
    Lost { job_id: JobId, skipped: u64 },
}

/// Handle to a running dispatcher task.
///
/// Dropping the handle closes the inbox; the task finishes the job in
/// flight and any queued ones, then exits.
pub struct Dispatcher {
    name: String,
    inbox: mpsc::Sender<JobRequest>,
    outbox: broadcast::Sender<JobResponse>,
}

impl Dispatcher {
    /// Start a dispatcher task on the current tokio runtime.
    pub fn spawn(name: impl Into<String>, queue_depth: usize) -> Self {
        let name = name.into();
        let queue_depth = queue_depth.max(1);
        let (inbox, rx) = mpsc::channel(queue_depth);
        let (outbox, _) = broadcast::channel(queue_depth.max(16));

        tokio::spawn(worker_loop(name.clone(), rx, outbox.clone()));

        Self {
            name,
            inbox,
            outbox,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job. Waits only for inbox capacity, never for the result.
    pub async fn submit(&self, request: JobRequest) -> Result<JobId, DispatchError> {
        let job_id = request.job_id.clone();
        tracing::debug!(
            dispatcher = %self.name,
            job_id = %job_id,
            width = request.image.width(),
            height = request.image.height(),
            "Job submitted"
        );
        self.inbox
            .send(request)
            .await
            .map_err(|_| DispatchError::Closed(self.name.clone()))?;
        Ok(job_id)
    }

    /// Receive every response published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<JobResponse> {
        self.outbox.subscribe()
    }

    /// Submit and wait for the response carrying the same id.
    pub async fn run(&self, request: JobRequest) -> Result<Arc<ImageBuffer>, DispatchError> {
        let mut responses = self.subscribe();
        let job_id = self.submit(request).await?;
        wait_for(&mut responses, &job_id, &self.name).await
    }
}

/// Wait on a subscription until the response for `job_id` arrives.
///
/// Fails with [`DispatchError::Lost`] when the subscription lagged, since
/// the awaited response cannot be told apart from the skipped ones.
pub async fn wait_for(
    responses: &mut broadcast::Receiver<JobResponse>,
    job_id: &JobId,
    dispatcher: &str,
) -> Result<Arc<ImageBuffer>, DispatchError> {
    loop {
        match responses.recv().await {
            Ok(response) if response.job_id() == job_id => return response.into_result(),
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(dispatcher, job_id = %job_id, skipped, "Response subscriber lagged");
                return Err(DispatchError::Lost {
                    job_id: job_id.clone(),
                    skipped,
                });
            }
            Err(broadcast::error::RecvError::Closed) => {
                return Err(DispatchError::Closed(dispatcher.to_string()))
            }
        }
    }
}

async fn worker_loop(
    name: String,
    mut inbox: mpsc::Receiver<JobRequest>,
    outbox: broadcast::Sender<JobResponse>,
) {
    tracing::debug!(dispatcher = %name, "Dispatcher started");

    while let Some(request) = inbox.recv().await {
        let job_id = request.job_id.clone();
        let started = Instant::now();

        let outcome = tokio::task::spawn_blocking(move || process(request)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(Ok(image)) => {
                tracing::info!(
                    dispatcher = %name,
                    job_id = %job_id,
                    width = image.width(),
                    height = image.height(),
                    elapsed_ms,
                    "Job completed"
                );
                JobResponse::Completed {
                    job_id,
                    image: Arc::new(image),
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(dispatcher = %name, job_id = %job_id, elapsed_ms, error = %e, "Job failed");
                JobResponse::Failed {
                    job_id,
                    error: e.to_string(),
                }
            }
            Err(e) => {
                tracing::error!(dispatcher = %name, job_id = %job_id, error = %e, "Job task aborted");
                let error = if e.is_panic() {
                    "internal error: job panicked".to_string()
                } else {
                    "internal error: job cancelled".to_string()
                };
                JobResponse::Failed { job_id, error }
            }
        };

        // No subscribers means nobody is waiting for this job any more.
        let _ = outbox.send(response);
    }

    tracing::debug!(dispatcher = %name, "Dispatcher stopped");
}

fn process(request: JobRequest) -> Result<ImageBuffer, ditherkit_core::PipelineError> {
    ditherkit_core::render(&request.image, &request.options)
}
