//! Tests for POST /api/render and the health check.

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{fixtures, TestApp};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.get("/health").await;

    common::assert_ok(&response);
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn test_render_echoes_job_id() {
    let app = TestApp::new();
    let mut body = fixtures::render_body(&fixtures::gradient(32, 8), fixtures::mono_options());
    body["jobId"] = json!("client-42");

    let response = app.post_json("/api/render", &body).await;

    common::assert_ok(&response);
    let json: serde_json::Value = response.json();
    assert_eq!(json["jobId"], "client-42");
    assert_eq!(json["width"], 32);
    assert_eq!(json["height"], 8);

    let image = common::decode_image_field(&json);
    common::assert_only_colors(&image, &[fixtures::BLACK, fixtures::WHITE]);
}

#[tokio::test]
async fn test_render_generates_job_id_when_absent() {
    let app = TestApp::new();
    let body = fixtures::render_body(&fixtures::grey(4, 4, 128), json!({}));

    let response = app.post_json("/api/render", &body).await;

    common::assert_ok(&response);
    let json: serde_json::Value = response.json();
    let job_id = json["jobId"].as_str().unwrap();
    assert!(job_id.starts_with("job-"), "unexpected id {job_id}");
}

#[tokio::test]
async fn test_render_keeps_dimensions_with_point_size() {
    let app = TestApp::new();
    let options = json!({ "colorMode": "mono", "pointSize": 3 });
    let body = fixtures::render_body(&fixtures::gradient(10, 7), options);

    let response = app.post_json("/api/render", &body).await;

    common::assert_ok(&response);
    let image = common::decode_image_field(&response.json());
    assert_eq!((image.width(), image.height()), (10, 7));
}

#[tokio::test]
async fn test_render_accepts_data_url() {
    let app = TestApp::new();
    let payload = format!(
        "data:image/png;base64,{}",
        fixtures::base64(&fixtures::grey(3, 3, 10))
    );
    let body = json!({ "image": payload, "options": fixtures::mono_options() });

    let response = app.post_json("/api/render", &body).await;

    common::assert_ok(&response);
    let image = common::decode_image_field(&response.json());
    common::assert_only_colors(&image, &[fixtures::BLACK]);
}

#[tokio::test]
async fn test_render_threshold_with_custom_swatches() {
    let app = TestApp::new();
    let options = json!({
        "algorithm": "threshold",
        "colorMode": "duotone",
        "swatches": ["#102030", [250, 240, 230]],
    });
    let body = fixtures::render_body(&fixtures::gradient(16, 2), options);

    let response = app.post_json("/api/render", &body).await;

    common::assert_ok(&response);
    let image = common::decode_image_field(&response.json());
    common::assert_only_colors(&image, &[[0x10, 0x20, 0x30], [250, 240, 230]]);
    assert_eq!(&image.pixel_at(0, 0)[..3], &[0x10, 0x20, 0x30]);
    assert_eq!(&image.pixel_at(15, 1)[..3], &[250, 240, 230]);
}

#[tokio::test]
async fn test_render_unknown_algorithm_falls_back() {
    let app = TestApp::new();
    let options = json!({ "algorithm": "bayer-16", "colorMode": "mono" });
    let body = fixtures::render_body(&fixtures::gradient(8, 8), options);

    let response = app.post_json("/api/render", &body).await;

    common::assert_ok(&response);
}

#[tokio::test]
async fn test_failed_job_reports_job_id() {
    let app = TestApp::new();
    let body = json!({
        "image": fixtures::base64(&fixtures::grey(4, 4, 100)),
        "options": { "gamma": 0.0 },
        "jobId": "bad-gamma",
    });

    let response = app.post_json("/api/render", &body).await;

    common::assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    common::assert_json_status(&response, 422);
    let json: serde_json::Value = response.json();
    assert_eq!(json["jobId"], "bad-gamma");
    assert!(json["error"].as_str().unwrap().contains("gamma"));
}

#[tokio::test]
async fn test_empty_swatch_list_fails_the_job() {
    let app = TestApp::new();
    let options = json!({ "colorMode": "duotone", "swatches": [] });
    let body = fixtures::render_body(&fixtures::grey(2, 2, 100), options);

    let response = app.post_json("/api/render", &body).await;

    common::assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_dispatcher_survives_failed_job() {
    let app = TestApp::new();
    let bad = fixtures::render_body(&fixtures::grey(2, 2, 0), json!({ "gamma": -1.0 }));
    let good = fixtures::render_body(&fixtures::grey(2, 2, 0), fixtures::mono_options());

    let failed = app.post_json("/api/render", &bad).await;
    let ok = app.post_json("/api/render", &good).await;

    common::assert_status(&failed, StatusCode::UNPROCESSABLE_ENTITY);
    common::assert_ok(&ok);
}

#[tokio::test]
async fn test_bad_base64_is_rejected() {
    let app = TestApp::new();
    let body = json!({ "image": "not base64 at all!", "options": {} });

    let response = app.post_json("/api/render", &body).await;

    common::assert_status(&response, StatusCode::BAD_REQUEST);
    common::assert_json_status(&response, 400);
}

#[tokio::test]
async fn test_bad_swatch_is_rejected() {
    let app = TestApp::new();
    let options = json!({ "swatches": ["#zzzzzz", "#ffffff"] });
    let body = fixtures::render_body(&fixtures::grey(2, 2, 0), options);

    let response = app.post_json("/api/render", &body).await;

    common::assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_responses_are_not_cacheable() {
    let app = TestApp::new();
    let body = fixtures::render_body(&fixtures::grey(2, 2, 0), json!({}));

    let response = app.post_json("/api/render", &body).await;

    assert_eq!(response.header("cache-control"), Some("no-store"));
}

#[tokio::test]
async fn test_concurrent_renders_match_their_ids() {
    let app = TestApp::new();
    let dark = json!({
        "image": fixtures::base64(&fixtures::grey(6, 6, 5)),
        "options": fixtures::mono_options(),
        "jobId": "dark",
    });
    let light = json!({
        "image": fixtures::base64(&fixtures::grey(6, 6, 250)),
        "options": fixtures::mono_options(),
        "jobId": "light",
    });

    let (dark, light) = tokio::join!(
        app.post_json("/api/render", &dark),
        app.post_json("/api/render", &light)
    );

    let dark: serde_json::Value = dark.json();
    let light: serde_json::Value = light.json();
    assert_eq!(dark["jobId"], "dark");
    assert_eq!(light["jobId"], "light");
    common::assert_only_colors(&common::decode_image_field(&dark), &[fixtures::BLACK]);
    common::assert_only_colors(&common::decode_image_field(&light), &[fixtures::WHITE]);
}
