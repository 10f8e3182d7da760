//! Test fixtures: source images and option bodies.

use serde_json::json;

use ditherkit::rendering::encode_base64_png;
use ditherkit_core::ImageBuffer;

pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Solid opaque grey image
pub fn grey(width: usize, height: usize, level: u8) -> ImageBuffer {
    ImageBuffer::filled(width, height, [level, level, level, 255]).unwrap()
}

/// Horizontal black to white ramp
pub fn gradient(width: usize, height: usize) -> ImageBuffer {
    let mut data = Vec::with_capacity(width * height * 4);
    for _ in 0..height {
        for x in 0..width {
            let v = (x * 255 / width.saturating_sub(1).max(1)) as u8;
            data.extend_from_slice(&[v, v, v, 255]);
        }
    }
    ImageBuffer::new(width, height, data).unwrap()
}

/// Left half pure red, right half pure blue
pub fn red_blue(width: usize, height: usize) -> ImageBuffer {
    let mut data = Vec::with_capacity(width * height * 4);
    for _ in 0..height {
        for x in 0..width {
            if x < width / 2 {
                data.extend_from_slice(&[255, 0, 0, 255]);
            } else {
                data.extend_from_slice(&[0, 0, 255, 255]);
            }
        }
    }
    ImageBuffer::new(width, height, data).unwrap()
}

pub fn base64(image: &ImageBuffer) -> String {
    encode_base64_png(image).unwrap()
}

/// Mono Atkinson options as sent by a client
pub fn mono_options() -> serde_json::Value {
    json!({
        "algorithm": "atkinson",
        "colorMode": "mono",
    })
}

/// Render request body for `image` with `options`
pub fn render_body(image: &ImageBuffer, options: serde_json::Value) -> serde_json::Value {
    json!({
        "image": base64(image),
        "options": options,
    })
}
