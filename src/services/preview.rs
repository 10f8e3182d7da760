//! Debounced interactive preview.
//!
//! Every option change calls [`PreviewSession::request`]. Requests inside
//! the debounce window coalesce: only the newest one is submitted once
//! the window has passed quietly. Results are accepted only when they
//! carry the id of the most recently started job, so a slow earlier job
//! can never overwrite a newer preview.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ditherkit_core::{resample::fit_long_edge, ImageBuffer, RenderOptions};
use tokio::sync::watch;

use super::dispatcher::{wait_for, Dispatcher, JobId, JobRequest, JobResponse};

/// What the caller currently shows.
#[derive(Debug, Clone, Default)]
pub struct PreviewState {
    /// Id of the job whose outcome is reflected here
    pub job_id: Option<JobId>,
    /// Last good render. Kept when a later job fails.
    pub image: Option<Arc<ImageBuffer>>,
    /// Error of the latest job, cleared by the next success
    pub error: Option<String>,
    /// A request is waiting for its debounce window or its result
    pub pending: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct PreviewSession {
    inner: Arc<Inner>,
}

struct Inner {
    dispatcher: Arc<Dispatcher>,
    debounce: Duration,
    long_edge: usize,
    generation: AtomicU64,
    /// Newest started job and the request generation it came from
    latest: Mutex<Option<(JobId, u64)>>,
    state: watch::Sender<PreviewState>,
}

impl PreviewSession {
    pub fn new(dispatcher: Arc<Dispatcher>, debounce: Duration, long_edge: usize) -> Self {
        let (state, _) = watch::channel(PreviewState::default());
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                debounce,
                long_edge,
                generation: AtomicU64::new(0),
                latest: Mutex::new(None),
                state,
            }),
        }
    }

    /// Schedule a render of `image` with `options` after the debounce
    /// window. Returns the request's generation number.
    pub fn request(&self, image: ImageBuffer, options: RenderOptions) -> u64 {
        self.request_with_long_edge(image, options, None)
    }

    /// Like [`request`](Self::request) with a per-request preview resolution.
    pub fn request_with_long_edge(
        &self,
        image: ImageBuffer,
        options: RenderOptions,
        long_edge: Option<usize>,
    ) -> u64 {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|state| state.pending = true);

        let session = self.clone();
        let long_edge = long_edge.unwrap_or(self.inner.long_edge);
        tokio::spawn(async move {
            tokio::time::sleep(session.inner.debounce).await;
            if !session.is_current(generation) {
                tracing::trace!(generation, "Preview request superseded during debounce");
                return;
            }
            session.submit(generation, image, options, long_edge).await;
        });

        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }

    async fn submit(
        &self,
        generation: u64,
        image: ImageBuffer,
        options: RenderOptions,
        long_edge: usize,
    ) {
        let source = match fit_long_edge(&image, long_edge) {
            Ok(source) => source,
            Err(e) => {
                let request = JobRequest::new(image, options);
                let job_id = self.begin(&request, generation);
                self.deliver(JobResponse::Failed {
                    job_id,
                    error: e.to_string(),
                });
                return;
            }
        };

        let request = JobRequest::new(source, options);
        let job_id = self.begin(&request, generation);
        let dispatcher = &self.inner.dispatcher;
        let mut responses = dispatcher.subscribe();

        if let Err(e) = dispatcher.submit(request).await {
            self.deliver(JobResponse::Failed {
                job_id,
                error: e.to_string(),
            });
            return;
        }

        let response = match wait_for(&mut responses, &job_id, dispatcher.name()).await {
            Ok(image) => JobResponse::Completed { job_id, image },
            Err(e) => JobResponse::Failed {
                job_id,
                error: e.to_string(),
            },
        };
        self.deliver(response);
    }

    /// Mark `request` as the newest job. Any response for an earlier job
    /// is discarded from now on.
    pub fn begin_job(&self, request: &JobRequest) -> JobId {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.begin(request, generation)
    }

    fn begin(&self, request: &JobRequest, generation: u64) -> JobId {
        let job_id = request.job_id.clone();
        *self.latest() = Some((job_id.clone(), generation));
        job_id
    }

    /// The guard survives a panic elsewhere: the stored id is always whole.
    fn latest(&self) -> MutexGuard<'_, Option<(JobId, u64)>> {
        self.inner
            .latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a response if it belongs to the newest job.
    ///
    /// Returns `false` for stale responses, which leave the state alone.
    pub fn deliver(&self, response: JobResponse) -> bool {
        let started_generation = self
            .latest()
            .as_ref()
            .filter(|(id, _)| id == response.job_id())
            .map(|(_, generation)| *generation);
        let Some(started_generation) = started_generation else {
            tracing::debug!(job_id = %response.job_id(), "Discarding stale preview result");
            return false;
        };

        // Requests issued after this job started are still debouncing.
        let pending = self.inner.generation.load(Ordering::SeqCst) > started_generation;
        self.inner.state.send_modify(|state| {
            match response {
                JobResponse::Completed { job_id, image } => {
                    state.job_id = Some(job_id);
                    state.image = Some(image);
                    state.error = None;
                }
                JobResponse::Failed { job_id, error } => {
                    tracing::warn!(job_id = %job_id, %error, "Preview render failed");
                    state.job_id = Some(job_id);
                    state.error = Some(error);
                }
            }
            state.pending = pending;
            state.updated_at = Some(Utc::now());
        });
        true
    }

    pub fn state(&self) -> PreviewState {
        self.inner.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PreviewState> {
        self.inner.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PreviewSession {
        let dispatcher = Arc::new(Dispatcher::spawn("preview", 1));
        PreviewSession::new(dispatcher, Duration::from_millis(10), 64)
    }

    fn job(level: u8) -> JobRequest {
        let image = ImageBuffer::filled(2, 2, [level, level, level, 255]).unwrap();
        JobRequest::new(image, RenderOptions::default())
    }

    #[tokio::test]
    async fn test_stale_guard_survives_poisoned_lock() {
        let session = session();
        let older = session.begin_job(&job(0));

        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.latest.lock().unwrap();
            panic!("poison the latest-job lock");
        })
        .join();
        assert!(session.inner.latest.is_poisoned());

        let newer = session.begin_job(&job(255));
        let image = Arc::new(ImageBuffer::filled(2, 2, [255, 255, 255, 255]).unwrap());
        assert!(!session.deliver(JobResponse::Completed {
            job_id: older,
            image: image.clone(),
        }));
        assert!(session.deliver(JobResponse::Completed {
            job_id: newer.clone(),
            image,
        }));
        assert_eq!(session.state().job_id, Some(newer));
    }

    #[tokio::test]
    async fn test_pending_while_newer_request_waits() {
        let session = session();
        let started = session.begin_job(&job(0));
        session.request(
            ImageBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap(),
            RenderOptions::default(),
        );

        let image = Arc::new(ImageBuffer::filled(2, 2, [0, 0, 0, 255]).unwrap());
        assert!(session.deliver(JobResponse::Completed {
            job_id: started,
            image,
        }));
        assert!(session.state().pending);
    }
}
