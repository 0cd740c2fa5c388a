//! Texture payload decode/encode.
//!
//! Decodes the block-compressed formats the game ships (ASTC, ETC, BCn)
//! to RGBA for PNG export, and re-encodes edited PNGs as plain RGBA32 for
//! import. Mobile builds use ASTC/ETC2, the DMM client uses DXT/BC7.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("unsupported texture format {0:?}")]
    Unsupported(TextureFormat),

    #[error("texture data too small: got {got}, expected {expected}")]
    DataTooSmall { got: usize, expected: usize },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG is {got_w}x{got_h}, texture slot is {want_w}x{want_h}")]
    DimensionMismatch {
        got_w: u32,
        got_h: u32,
        want_w: u32,
        want_h: u32,
    },
}

/// Unity `TextureFormat` values we can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgb24,
    Rgba32,
    Argb32,
    Bgra32,
    Dxt1,
    Dxt5,
    Bc7,
    EtcRgb4,
    Etc2Rgb,
    Etc2Rgba8,
    Astc4x4,
    Astc6x6,
    Unknown(i32),
}

/// `TextureFormat` id written on import (plain 8-bit RGBA)
pub const FORMAT_RGBA32: i32 = 4;

impl TextureFormat {
    pub fn from_id(id: i32) -> Self {
        match id {
            3 => TextureFormat::Rgb24,
            4 => TextureFormat::Rgba32,
            5 => TextureFormat::Argb32,
            14 => TextureFormat::Bgra32,
            10 => TextureFormat::Dxt1,
            12 => TextureFormat::Dxt5,
            25 => TextureFormat::Bc7,
            34 => TextureFormat::EtcRgb4,
            45 => TextureFormat::Etc2Rgb,
            47 => TextureFormat::Etc2Rgba8,
            48 | 54 => TextureFormat::Astc4x4,
            50 | 56 => TextureFormat::Astc6x6,
            other => TextureFormat::Unknown(other),
        }
    }

    /// Bytes per 4x4 block for block-compressed formats, or bytes per
    /// pixel for uncompressed ones
    pub fn bytes_per_unit(&self) -> usize {
        match self {
            TextureFormat::Dxt1 | TextureFormat::EtcRgb4 | TextureFormat::Etc2Rgb => 8,
            TextureFormat::Dxt5
            | TextureFormat::Bc7
            | TextureFormat::Etc2Rgba8
            | TextureFormat::Astc4x4 => 16,
            TextureFormat::Rgb24 => 3,
            TextureFormat::Rgba32 | TextureFormat::Argb32 | TextureFormat::Bgra32 => 4,
            // 6x6 ASTC blocks still take 16 bytes, but cover 36 pixels
            TextureFormat::Astc6x6 => 16,
            TextureFormat::Unknown(_) => 0,
        }
    }
}

/// Convert u32 pixel buffer (BGRA byte order) to u8 RGBA buffer
fn u32_to_u8_rgba(u32_buf: &[u32]) -> Vec<u8> {
    let mut result = Vec::with_capacity(u32_buf.len() * 4);
    for &pixel in u32_buf {
        let b = (pixel & 0xFF) as u8;
        let g = ((pixel >> 8) & 0xFF) as u8;
        let r = ((pixel >> 16) & 0xFF) as u8;
        let a = ((pixel >> 24) & 0xFF) as u8;
        result.push(r);
        result.push(g);
        result.push(b);
        result.push(a);
    }
    result
}

fn decode_blocks(
    format: TextureFormat,
    data: &[u8],
    w: usize,
    h: usize,
) -> Result<Vec<u32>, TextureError> {
    let mut output = vec![0u32; w * h];

    let result = match format {
        TextureFormat::Dxt1 => texture2ddecoder::decode_bc1(data, w, h, &mut output),
        TextureFormat::Dxt5 => texture2ddecoder::decode_bc3(data, w, h, &mut output),
        TextureFormat::Bc7 => texture2ddecoder::decode_bc7(data, w, h, &mut output),
        TextureFormat::EtcRgb4 => texture2ddecoder::decode_etc1(data, w, h, &mut output),
        TextureFormat::Etc2Rgb => texture2ddecoder::decode_etc2_rgb(data, w, h, &mut output),
        TextureFormat::Etc2Rgba8 => texture2ddecoder::decode_etc2_rgba8(data, w, h, &mut output),
        TextureFormat::Astc4x4 => texture2ddecoder::decode_astc_4_4(data, w, h, &mut output),
        TextureFormat::Astc6x6 => texture2ddecoder::decode_astc_6_6(data, w, h, &mut output),
        other => return Err(TextureError::Unsupported(other)),
    };

    result.map_err(|e| TextureError::Decode(e.to_string()))?;
    Ok(output)
}

/// Decode a texture payload to an RGBA8 pixel buffer
pub fn decode(
    format: TextureFormat,
    data: &[u8],
    width: u32,
    height: u32,
) -> Result<Vec<u8>, TextureError> {
    let w = width as usize;
    let h = height as usize;

    match format {
        TextureFormat::Rgba32 => {
            check_size(data, w * h * 4)?;
            Ok(data[..w * h * 4].to_vec())
        }
        TextureFormat::Rgb24 => {
            check_size(data, w * h * 3)?;
            let mut rgba = Vec::with_capacity(w * h * 4);
            for px in data[..w * h * 3].chunks_exact(3) {
                rgba.extend_from_slice(px);
                rgba.push(0xFF);
            }
            Ok(rgba)
        }
        TextureFormat::Argb32 => {
            check_size(data, w * h * 4)?;
            let mut rgba = Vec::with_capacity(w * h * 4);
            for px in data[..w * h * 4].chunks_exact(4) {
                rgba.extend_from_slice(&[px[1], px[2], px[3], px[0]]);
            }
            Ok(rgba)
        }
        TextureFormat::Bgra32 => {
            check_size(data, w * h * 4)?;
            let mut rgba = Vec::with_capacity(w * h * 4);
            for px in data[..w * h * 4].chunks_exact(4) {
                rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
            Ok(rgba)
        }
        _ => Ok(u32_to_u8_rgba(&decode_blocks(format, data, w, h)?)),
    }
}

fn check_size(data: &[u8], expected: usize) -> Result<(), TextureError> {
    if data.len() < expected {
        return Err(TextureError::DataTooSmall {
            got: data.len(),
            expected,
        });
    }
    Ok(())
}

/// Save an RGBA8 buffer as PNG
pub fn save_png(rgba: &[u8], width: u32, height: u32, path: &Path) -> Result<(), TextureError> {
    use image::{ImageBuffer, Rgba};

    let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_raw(width, height, rgba.to_vec())
        .ok_or_else(|| TextureError::Decode("RGBA buffer does not match dimensions".into()))?;
    img.save(path)?;
    Ok(())
}

/// Load a PNG as an RGBA8 buffer, enforcing the texture slot's dimensions
pub fn load_png(path: &Path, want_w: u32, want_h: u32) -> Result<Vec<u8>, TextureError> {
    let img = image::open(path)?.into_rgba8();
    let (got_w, got_h) = img.dimensions();

    if (got_w, got_h) != (want_w, want_h) {
        return Err(TextureError::DimensionMismatch {
            got_w,
            got_h,
            want_w,
            want_h,
        });
    }

    Ok(img.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ids() {
        assert_eq!(TextureFormat::from_id(4), TextureFormat::Rgba32);
        assert_eq!(TextureFormat::from_id(47), TextureFormat::Etc2Rgba8);
        assert_eq!(TextureFormat::from_id(54), TextureFormat::Astc4x4);
        assert_eq!(TextureFormat::from_id(999), TextureFormat::Unknown(999));
    }

    #[test]
    fn test_rgba32_passthrough() {
        let data = vec![0x10u8; 2 * 2 * 4];
        let rgba = decode(TextureFormat::Rgba32, &data, 2, 2).unwrap();
        assert_eq!(rgba, data);
    }

    #[test]
    fn test_rgb24_gains_alpha() {
        let data = vec![1u8, 2, 3, 4, 5, 6];
        let rgba = decode(TextureFormat::Rgb24, &data, 2, 1).unwrap();
        assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_bgra_swizzle() {
        let data = vec![10u8, 20, 30, 40];
        let rgba = decode(TextureFormat::Bgra32, &data, 1, 1).unwrap();
        assert_eq!(rgba, vec![30, 20, 10, 40]);
    }

    #[test]
    fn test_short_data_rejected() {
        let err = decode(TextureFormat::Rgba32, &[0u8; 3], 2, 2).unwrap_err();
        assert!(matches!(err, TextureError::DataTooSmall { .. }));
    }

    #[test]
    fn test_png_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");

        let rgba: Vec<u8> = (0..2 * 2 * 4).map(|i| i as u8 * 7).collect();
        save_png(&rgba, 2, 2, &path).unwrap();

        let loaded = load_png(&path, 2, 2).unwrap();
        assert_eq!(loaded, rgba);
    }

    #[test]
    fn test_png_dimension_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");

        save_png(&[0u8; 16], 2, 2, &path).unwrap();
        let err = load_png(&path, 4, 4).unwrap_err();
        assert!(matches!(err, TextureError::DimensionMismatch { .. }));
    }
}
