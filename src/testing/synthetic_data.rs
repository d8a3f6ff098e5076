//! Synthetic frame data for offline testing
//!
//! Frames carry a gradient that shifts with the frame number, so consecutive
//! frames differ and rotations are observable.

use crate::codec;
use crate::types::{FrameBuffer, PixelLayout};
use image::{Rgb, RgbImage};

/// RGB gradient frame
pub fn synthetic_rgb_frame(frame_number: u64, width: u32, height: u32) -> RgbImage {
    let base = (frame_number % 256) as u8;
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            base.wrapping_add((x % 256) as u8),
            base.wrapping_add((y % 256) as u8),
            base.wrapping_add(((x + y) % 256) as u8),
        ])
    })
}

/// The same gradient encoded as NV21, the layout sensors hand out
pub fn synthetic_nv21_frame(frame_number: u64, width: u32, height: u32) -> FrameBuffer {
    let rgb = synthetic_rgb_frame(frame_number, width, height);
    FrameBuffer::new(width, height, PixelLayout::Nv21, codec::rgb_to_nv21(&rgb))
}

/// The gradient as a device-compressed JPEG frame
pub fn synthetic_jpeg_frame(frame_number: u64, width: u32, height: u32) -> FrameBuffer {
    let rgb = synthetic_rgb_frame(frame_number, width, height);
    let data = codec::encode_jpeg(&rgb, 90).unwrap_or_default();
    FrameBuffer::new(width, height, PixelLayout::Jpeg, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_nv21_frame_correct_size() {
        let frame = synthetic_nv21_frame(0, 320, 240);
        assert_eq!(frame.width, 320);
        assert_eq!(frame.height, 240);
        assert_eq!(frame.layout, PixelLayout::Nv21);
        assert_eq!(frame.data.len(), codec::nv21_len(320, 240));
    }

    #[test]
    fn test_synthetic_frames_differ() {
        let frame0 = synthetic_nv21_frame(0, 64, 48);
        let frame1 = synthetic_nv21_frame(40, 64, 48);
        assert_ne!(frame0.data, frame1.data);
    }

    #[test]
    fn test_synthetic_jpeg_frame_decodes() {
        let frame = synthetic_jpeg_frame(3, 64, 48);
        assert_eq!(frame.layout, PixelLayout::Jpeg);
        let decoded = codec::decode_jpeg(&frame.data).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }
}
