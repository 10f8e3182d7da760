pub mod png_codec;

pub use png_codec::{decode_base64_png, decode_png, encode_base64_png, encode_png, MAX_PIXELS};
