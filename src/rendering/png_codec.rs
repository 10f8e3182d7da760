//! PNG decode/encode between wire bytes and RGBA buffers.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ditherkit_core::ImageBuffer;

use crate::error::RenderError;

/// Largest accepted source, in pixels (64 megapixels).
pub const MAX_PIXELS: usize = 64 * 1024 * 1024;

/// Decode a PNG of any colour type and bit depth into RGBA8.
///
/// Palette and low bit-depth images are expanded, 16-bit channels are
/// stripped to 8 bits, and missing alpha is filled with 255.
pub fn decode_png(bytes: &[u8]) -> Result<ImageBuffer, RenderError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| RenderError::PngDecode(e.to_string()))?;

    let (width, height) = {
        let info = reader.info();
        (info.width as usize, info.height as usize)
    };
    let pixels = width.saturating_mul(height);
    if pixels > MAX_PIXELS {
        return Err(RenderError::ImageTooLarge {
            pixels,
            max: MAX_PIXELS,
        });
    }

    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| RenderError::PngDecode(e.to_string()))?;
    buf.truncate(frame.buffer_size());

    if frame.bit_depth != png::BitDepth::Eight {
        return Err(RenderError::UnsupportedFormat(format!(
            "{:?} bit depth after expansion",
            frame.bit_depth
        )));
    }

    let rgba = match frame.color_type {
        png::ColorType::Rgba => buf,
        png::ColorType::Rgb => buf
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => buf
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => buf.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(RenderError::UnsupportedFormat(
                "indexed colour was not expanded".to_string(),
            ))
        }
    };

    Ok(ImageBuffer::new(width, height, rgba)?)
}

/// Encode an RGBA8 buffer as PNG.
pub fn encode_png(image: &ImageBuffer) -> Result<Vec<u8>, RenderError> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, image.width() as u32, image.height() as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Fast);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(image.data())
            .map_err(|e| RenderError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Decode a base64 PNG payload. A `data:image/png;base64,` prefix is accepted.
pub fn decode_base64_png(payload: &str) -> Result<ImageBuffer, RenderError> {
    let payload = payload.trim();
    let payload = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let bytes = STANDARD.decode(payload)?;
    decode_png(&bytes)
}

/// Encode a buffer as a base64 PNG payload without a data-URL prefix.
pub fn encode_base64_png(image: &ImageBuffer) -> Result<String, RenderError> {
    Ok(STANDARD.encode(encode_png(image)?))
}
