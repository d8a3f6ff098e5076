//! Pixel format conversion between NV21, RGB and JPEG.
//!
//! NV21 stores a full-resolution luma plane followed by one interleaved V/U
//! plane subsampled 2x2. Conversions use full-range BT.601 coefficients, the
//! same matrix JFIF uses, so an NV21 -> JPEG -> RGB trip does not shift levels.

use crate::errors::CameraError;
use image::{DynamicImage, ImageFormat, RgbImage};

/// Byte length of an NV21 buffer for the given dimensions.
pub fn nv21_len(width: u32, height: u32) -> usize {
    let luma = width as usize * height as usize;
    let chroma = width.div_ceil(2) as usize * height.div_ceil(2) as usize;
    luma + 2 * chroma
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Converts an NV21 buffer to an RGB image.
pub fn nv21_to_rgb(data: &[u8], width: u32, height: u32) -> Result<RgbImage, CameraError> {
    if width == 0 || height == 0 {
        return Err(CameraError::CaptureFailure(format!(
            "invalid frame dimensions {}x{}",
            width, height
        )));
    }
    let expected = nv21_len(width, height);
    if data.len() < expected {
        return Err(CameraError::CaptureFailure(format!(
            "NV21 buffer too short: {} bytes, expected {} for {}x{}",
            data.len(),
            expected,
            width,
            height
        )));
    }

    let w = width as usize;
    let h = height as usize;
    let chroma_stride = width.div_ceil(2) as usize * 2;
    let (luma, chroma) = data.split_at(w * h);
    let mut rgb = vec![0u8; w * h * 3];

    for y in 0..h {
        let chroma_row = (y / 2) * chroma_stride;
        for x in 0..w {
            let luma_value = luma[y * w + x] as i32;
            let vu = chroma_row + (x / 2) * 2;
            let v = chroma[vu] as i32 - 128;
            let u = chroma[vu + 1] as i32 - 128;

            let idx = (y * w + x) * 3;
            rgb[idx] = clamp_u8(luma_value + ((1436 * v) >> 10));
            rgb[idx + 1] = clamp_u8(luma_value - ((352 * u + 731 * v) >> 10));
            rgb[idx + 2] = clamp_u8(luma_value + ((1815 * u) >> 10));
        }
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| CameraError::CaptureFailure("failed to build RGB image".to_string()))
}

/// Converts an RGB image to NV21, averaging chroma over each 2x2 block.
pub fn rgb_to_nv21(image: &RgbImage) -> Vec<u8> {
    let (width, height) = image.dimensions();
    let w = width as usize;
    let h = height as usize;
    let chroma_w = width.div_ceil(2) as usize;
    let chroma_h = height.div_ceil(2) as usize;

    let mut out = vec![0u8; nv21_len(width, height)];
    let (luma, chroma) = out.split_at_mut(w * h);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (r, g, b) = (r as i32, g as i32, b as i32);
        luma[y as usize * w + x as usize] = clamp_u8((77 * r + 150 * g + 29 * b) >> 8);
    }

    for cy in 0..chroma_h {
        for cx in 0..chroma_w {
            let mut sum_u = 0i32;
            let mut sum_v = 0i32;
            let mut count = 0i32;
            for y in (cy * 2)..((cy * 2 + 2).min(h)) {
                for x in (cx * 2)..((cx * 2 + 2).min(w)) {
                    let [r, g, b] = image.get_pixel(x as u32, y as u32).0;
                    let (r, g, b) = (r as i32, g as i32, b as i32);
                    sum_u += ((-43 * r - 85 * g + 128 * b) >> 8) + 128;
                    sum_v += ((128 * r - 107 * g - 21 * b) >> 8) + 128;
                    count += 1;
                }
            }
            let idx = (cy * chroma_w + cx) * 2;
            chroma[idx] = clamp_u8(sum_v / count);
            chroma[idx + 1] = clamp_u8(sum_u / count);
        }
    }

    out
}

/// Encodes an RGB image as JPEG.
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, CameraError> {
    let mut out = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    DynamicImage::ImageRgb8(image.clone())
        .write_with_encoder(encoder)
        .map_err(|e| CameraError::CaptureFailure(format!("JPEG encoding failed: {}", e)))?;
    Ok(out)
}

/// Compresses a full NV21 frame to JPEG.
pub fn nv21_to_jpeg(
    data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, CameraError> {
    let rgb = nv21_to_rgb(data, width, height)?;
    encode_jpeg(&rgb, quality)
}

pub fn decode_jpeg(bytes: &[u8]) -> Result<RgbImage, CameraError> {
    if bytes.is_empty() {
        return Err(CameraError::CaptureFailure("empty JPEG buffer".to_string()));
    }
    image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map(|img| img.to_rgb8())
        .map_err(|e| CameraError::CaptureFailure(format!("JPEG decoding failed: {}", e)))
}

/// Rotates clockwise by a multiple of 90 degrees; other values round down.
pub fn rotate(image: &RgbImage, degrees: u32) -> RgbImage {
    match (degrees % 360) / 90 {
        1 => image::imageops::rotate90(image),
        2 => image::imageops::rotate180(image),
        3 => image::imageops::rotate270(image),
        _ => image.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_nv21(width: u32, height: u32, level: u8) -> Vec<u8> {
        let mut data = vec![128u8; nv21_len(width, height)];
        data[..(width * height) as usize].fill(level);
        data
    }

    #[test]
    fn test_nv21_len() {
        assert_eq!(nv21_len(4, 4), 24);
        assert_eq!(nv21_len(640, 480), 640 * 480 * 3 / 2);
        // odd dimensions round chroma up
        assert_eq!(nv21_len(3, 3), 9 + 2 * 4);
    }

    #[test]
    fn test_gray_nv21_to_rgb() {
        let data = gray_nv21(8, 6, 100);
        let rgb = nv21_to_rgb(&data, 8, 6).unwrap();
        assert_eq!(rgb.dimensions(), (8, 6));
        for pixel in rgb.pixels() {
            assert_eq!(pixel.0, [100, 100, 100]);
        }
    }

    #[test]
    fn test_short_buffer_rejected() {
        let result = nv21_to_rgb(&[0u8; 10], 8, 6);
        assert!(matches!(result, Err(CameraError::CaptureFailure(_))));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(nv21_to_rgb(&[], 0, 4).is_err());
    }

    #[test]
    fn test_rgb_to_nv21_primary_colors() {
        let red = RgbImage::from_pixel(4, 4, image::Rgb([255, 0, 0]));
        let nv21 = rgb_to_nv21(&red);
        assert_eq!(nv21.len(), nv21_len(4, 4));
        let back = nv21_to_rgb(&nv21, 4, 4).unwrap();
        let [r, g, b] = back.get_pixel(1, 1).0;
        assert!(r > 230, "red channel lost: {}", r);
        assert!(g < 25 && b < 25, "unexpected tint: {} {}", g, b);
    }

    #[test]
    fn test_nv21_jpeg_round_trip_keeps_dimensions() {
        let data = gray_nv21(64, 48, 180);
        let jpeg = nv21_to_jpeg(&data, 64, 48, 100).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        let decoded = decode_jpeg(&jpeg).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn test_rotate_swaps_dimensions() {
        let img = RgbImage::new(4, 2);
        assert_eq!(rotate(&img, 90).dimensions(), (2, 4));
        assert_eq!(rotate(&img, 180).dimensions(), (4, 2));
        assert_eq!(rotate(&img, 270).dimensions(), (2, 4));
        assert_eq!(rotate(&img, 0).dimensions(), (4, 2));
    }

    #[test]
    fn test_rotate_moves_pixels_clockwise() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        let rotated = rotate(&img, 90);
        // top-left pixel ends up top-right after a clockwise quarter turn
        assert_eq!(rotated.get_pixel(0, 0).0, [255, 0, 0]);
        let rotated = rotate(&img, 270);
        assert_eq!(rotated.get_pixel(0, 1).0, [255, 0, 0]);
    }

    #[test]
    fn test_decode_empty_jpeg_fails() {
        assert!(decode_jpeg(&[]).is_err());
    }
}
