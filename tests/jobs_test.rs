//! Tests for the job dispatcher, preview session and slot batch services.

mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::sync::Mutex;

use ditherkit::services::{
    batch, Dispatcher, JobId, JobRequest, JobResponse, PreviewSession, SlotBatch,
};
use ditherkit_core::{ColorMode, ImageBuffer, RenderOptions};
use common::fixtures;

fn mono() -> RenderOptions {
    RenderOptions::new().color_mode(ColorMode::Monochrome)
}

fn completed(job_id: &JobId, image: ImageBuffer) -> JobResponse {
    JobResponse::Completed {
        job_id: job_id.clone(),
        image: Arc::new(image),
    }
}

#[tokio::test]
async fn test_dispatcher_answers_in_submission_order() {
    let dispatcher = Dispatcher::spawn("test", 8);
    let mut responses = dispatcher.subscribe();

    let mut ids = Vec::new();
    for level in [10u8, 120, 240] {
        let request = JobRequest::new(fixtures::grey(8, 8, level), mono());
        ids.push(dispatcher.submit(request).await.unwrap());
    }

    let mut seen = Vec::new();
    while seen.len() < ids.len() {
        seen.push(responses.recv().await.unwrap().job_id().clone());
    }
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn test_dispatcher_reports_failure_with_job_id() {
    let dispatcher = Dispatcher::spawn("test", 1);
    let request = JobRequest::new(fixtures::grey(2, 2, 0), mono().point_size(0))
        .with_id(JobId::new("no-points"));

    let err = dispatcher.run(request).await.unwrap_err();

    match err {
        ditherkit::services::DispatchError::Failed { job_id, .. } => {
            assert_eq!(job_id.as_str(), "no-points")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_preview_discards_stale_result() {
    let dispatcher = Arc::new(Dispatcher::spawn("preview", 4));
    let session = PreviewSession::new(dispatcher, Duration::from_millis(50), 1024);

    let a = JobRequest::new(fixtures::grey(2, 2, 0), mono());
    let b = JobRequest::new(fixtures::grey(2, 2, 255), mono());
    let a_id = session.begin_job(&a);
    let b_id = session.begin_job(&b);

    assert!(session.deliver(completed(&b_id, fixtures::grey(2, 2, 255))));
    assert!(!session.deliver(completed(&a_id, fixtures::grey(2, 2, 0))));

    let state = session.state();
    assert_eq!(state.job_id, Some(b_id));
    assert_eq!(state.image.unwrap().pixel(0), [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_preview_failure_keeps_image() {
    let dispatcher = Arc::new(Dispatcher::spawn("preview", 4));
    let session = PreviewSession::new(dispatcher, Duration::from_millis(50), 1024);

    let ok = session.begin_job(&JobRequest::new(fixtures::grey(1, 1, 0), mono()));
    session.deliver(completed(&ok, fixtures::grey(1, 1, 0)));
    let failing = session.begin_job(&JobRequest::new(fixtures::grey(1, 1, 0), mono()));
    session.deliver(JobResponse::Failed {
        job_id: failing.clone(),
        error: "boom".to_string(),
    });

    let state = session.state();
    assert_eq!(state.job_id, Some(failing));
    assert_eq!(state.error.as_deref(), Some("boom"));
    assert!(state.image.is_some());
}

#[tokio::test]
async fn test_preview_debounce_coalesces_requests() {
    let dispatcher = Arc::new(Dispatcher::spawn("preview", 4));
    let session = PreviewSession::new(dispatcher, Duration::from_millis(80), 1024);
    let mut updates = session.subscribe();

    session.request(fixtures::grey(4, 4, 0), mono());
    session.request(fixtures::grey(4, 4, 0), mono());
    let last = session.request(fixtures::grey(4, 4, 255), mono());
    assert_eq!(last, 3);
    assert!(session.state().pending);

    let state = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            updates.changed().await.unwrap();
            let state = updates.borrow().clone();
            if state.image.is_some() {
                return state;
            }
        }
    })
    .await
    .unwrap();

    assert!(!state.pending);
    assert_eq!(state.image.unwrap().pixel(0), [255, 255, 255, 255]);
}

#[tokio::test]
async fn test_refresh_skips_replaced_source() {
    let dispatcher = Dispatcher::spawn("grid", 4);
    let slots = Mutex::new(SlotBatch::with_slots(["a", "b"]));
    {
        let mut guard = slots.lock().await;
        guard.set_source("a", fixtures::grey(4, 4, 0));
        guard.set_source("b", fixtures::grey(4, 4, 255));
    }

    let summary = batch::refresh(&slots, &dispatcher, &mono()).await;
    assert_eq!(summary.rendered, 2);

    // Second refresh with unchanged inputs has nothing to do.
    let summary = batch::refresh(&slots, &dispatcher, &mono()).await;
    assert_eq!(summary, batch::RefreshSummary::default());

    let guard = slots.lock().await;
    let b = guard.slot("b").unwrap();
    assert_eq!(b.processed_from(), b.source_fingerprint());
}
