//! Full-resolution export.
//!
//! Exports never queue behind interactive preview work: every export gets
//! its own short-lived dispatcher. The job races a wall-clock timeout; on
//! expiry the caller gets an error and the job is abandoned, its result
//! dropped whenever it finishes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ditherkit_core::{resample::fit_long_edge, ImageBuffer, PipelineError, RenderOptions};
use futures_util::future::join_all;
use thiserror::Error;

use super::dispatcher::{DispatchError, Dispatcher, JobId, JobRequest};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export {job_id} timed out after {secs} seconds")]
    Timeout { job_id: JobId, secs: u64 },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Debug, Clone)]
pub struct ExportService {
    timeout: Duration,
    queue_depth: usize,
}

impl ExportService {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            queue_depth: 1,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Render one image at full resolution.
    pub async fn export(
        &self,
        image: ImageBuffer,
        options: RenderOptions,
        job_id: Option<JobId>,
    ) -> Result<Arc<ImageBuffer>, ExportError> {
        let job_id = job_id.unwrap_or_else(JobId::generate);
        let dispatcher = Dispatcher::spawn(format!("export-{job_id}"), self.queue_depth);
        let request = JobRequest::new(image, options).with_id(job_id.clone());
        let started = Instant::now();

        match tokio::time::timeout(self.timeout, dispatcher.run(request)).await {
            Ok(result) => {
                let image = result?;
                tracing::info!(
                    job_id = %job_id,
                    width = image.width(),
                    height = image.height(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Export finished"
                );
                Ok(image)
            }
            Err(_) => {
                tracing::warn!(
                    job_id = %job_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Export timed out, abandoning job"
                );
                Err(ExportError::Timeout {
                    job_id,
                    secs: self.timeout.as_secs(),
                })
            }
        }
    }

    /// Export several slots concurrently, each on its own dispatcher.
    ///
    /// With `long_edge`, sources are first reduced so their longer side
    /// does not exceed it. Results come back in input order.
    pub async fn export_slots(
        &self,
        slots: Vec<(String, ImageBuffer)>,
        options: &RenderOptions,
        long_edge: Option<usize>,
    ) -> Vec<(String, Result<Arc<ImageBuffer>, ExportError>)> {
        let exports = slots.into_iter().map(|(slot_id, image)| async move {
            let result = match long_edge.map(|edge| fit_long_edge(&image, edge)).transpose() {
                Ok(reduced) => {
                    self.export(reduced.unwrap_or(image), options.clone(), None)
                        .await
                }
                Err(e) => Err(e.into()),
            };
            (slot_id, result)
        });
        join_all(exports).await
    }
}
