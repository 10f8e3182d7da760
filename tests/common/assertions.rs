//! Assertion helpers for tests.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use ditherkit::rendering::decode_base64_png;
use ditherkit_core::ImageBuffer;

use super::app::TestResponse;

/// Assert response has expected status code
pub fn assert_status(response: &TestResponse, expected: StatusCode) {
    assert_eq!(
        response.status, expected,
        "Expected status {}, got {}. Body: {}",
        expected,
        response.status,
        response.text()
    );
}

/// Assert response is OK (200)
pub fn assert_ok(response: &TestResponse) {
    assert_status(response, StatusCode::OK);
}

/// Assert response is a valid PNG image
pub fn assert_png(response: &TestResponse) {
    assert_ok(response);
    assert!(
        response.is_png(),
        "Expected PNG image, got {} bytes starting with {:?}",
        response.body.len(),
        &response.body[..8.min(response.body.len())]
    );

    assert_eq!(
        response.header("content-type"),
        Some("image/png"),
        "Expected Content-Type: image/png"
    );
}

/// Assert JSON error body has expected status field
pub fn assert_json_status(response: &TestResponse, expected_status: u16) {
    let json: serde_json::Value = response.json();
    assert_eq!(
        json["status"].as_u64(),
        Some(expected_status as u64),
        "Expected JSON status {}, got {:?}. Full response: {}",
        expected_status,
        json["status"],
        serde_json::to_string_pretty(&json).unwrap()
    );
}

/// Decode a base64 PNG field of a JSON response
pub fn decode_image_field(json: &serde_json::Value) -> ImageBuffer {
    let payload = json["image"]
        .as_str()
        .unwrap_or_else(|| panic!("Expected image field in {json}"));
    decode_base64_png(payload).expect("image field is not a valid PNG")
}

/// Assert every opaque pixel is one of `colors`
pub fn assert_only_colors(image: &ImageBuffer, colors: &[[u8; 3]]) {
    for index in 0..image.pixel_count() {
        let [r, g, b, a] = image.pixel(index);
        if a == 0 {
            continue;
        }
        assert!(
            colors.contains(&[r, g, b]),
            "Pixel {index} has colour {:?}, expected one of {:?}",
            [r, g, b],
            colors
        );
    }
}
