use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// IEC 61966-2-1 decode: encoded sRGB to linear light
fn decode(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

/// IEC 61966-2-1 encode: linear light to encoded sRGB
fn encode(linear: f64) -> f64 {
    if linear <= 0.0031308 {
        linear * 12.92
    } else {
        1.055 * linear.powf(1.0 / 2.4) - 0.055
    }
}

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("transfer_lut.rs");
    let mut file = File::create(&dest_path).unwrap();

    // One entry per 8-bit code value, so decoding a byte is a plain index.
    writeln!(file, "/// Linear light value for each 8-bit sRGB code value").unwrap();
    writeln!(file, "pub static BYTE_TO_LINEAR: [f32; 256] = [").unwrap();
    for i in 0..256 {
        if i > 0 && i % 8 == 0 {
            writeln!(file).unwrap();
        }
        write!(file, "    {:.9},", decode(i as f64 / 255.0) as f32).unwrap();
    }
    writeln!(file, "\n];").unwrap();
    writeln!(file).unwrap();

    writeln!(file, "/// Encoded sRGB value (0.0..=1.0) sampled at linear * 4095").unwrap();
    writeln!(file, "pub static LINEAR_TO_ENCODED: [f32; 4096] = [").unwrap();
    for i in 0..4096 {
        if i > 0 && i % 8 == 0 {
            writeln!(file).unwrap();
        }
        write!(file, "    {:.9},", encode(i as f64 / 4095.0) as f32).unwrap();
    }
    writeln!(file, "\n];").unwrap();

    println!("cargo::rerun-if-changed=build.rs");
}
