//! Still capture pipeline.
//!
//! Turns the frame a device hands back into the [`CaptureResult`] the
//! listener receives, in the encoding the session was configured with.

use crate::codec;
use crate::errors::CameraError;
use crate::orientation::upright_rotation;
use crate::types::{CaptureResult, FrameBuffer, PictureEncoding, PixelLayout};
use image::RgbImage;
use uuid::Uuid;

/// Quality of the intermediate JPEG used to build upright images
const UPRIGHT_JPEG_QUALITY: u8 = 100;

/// Converts a captured frame into a result.
///
/// `Compressed` passes device JPEG through untouched and compresses NV21 at
/// `jpeg_quality`. `RawPlanar` keeps NV21 bytes as the payload and also
/// produces an upright RGB image.
pub fn process_frame(
    frame: FrameBuffer,
    encoding: PictureEncoding,
    display_orientation: u32,
    jpeg_quality: u8,
    request_id: Uuid,
) -> Result<CaptureResult, CameraError> {
    if frame.is_empty() {
        return Err(CameraError::CaptureFailure(
            "device returned an empty buffer".to_string(),
        ));
    }
    if frame.width == 0 || frame.height == 0 {
        return Err(CameraError::CaptureFailure(format!(
            "invalid frame dimensions {}x{}",
            frame.width, frame.height
        )));
    }

    let FrameBuffer {
        width,
        height,
        layout,
        data,
        ..
    } = frame;

    let (width, height, data, image) = match (encoding, layout) {
        (PictureEncoding::Compressed, PixelLayout::Jpeg) => (width, height, data, None),
        (PictureEncoding::Compressed, PixelLayout::Nv21) => {
            let jpeg = codec::nv21_to_jpeg(&data, width, height, jpeg_quality)?;
            (width, height, jpeg, None)
        }
        (PictureEncoding::RawPlanar, PixelLayout::Nv21) => {
            let upright = upright_from_nv21(&data, width, height, display_orientation)?;
            (width, height, data, Some(upright))
        }
        (PictureEncoding::RawPlanar, PixelLayout::Jpeg) => {
            let decoded = codec::decode_jpeg(&data)?;
            let (width, height) = decoded.dimensions();
            let nv21 = codec::rgb_to_nv21(&decoded);
            let upright = codec::rotate(&decoded, upright_rotation(display_orientation));
            (width, height, nv21, Some(upright))
        }
    };

    log::debug!(
        "Processed capture {}: {}x{} {:?}, {} bytes",
        request_id,
        width,
        height,
        encoding,
        data.len()
    );

    Ok(CaptureResult {
        request_id,
        width,
        height,
        encoding,
        display_orientation,
        data,
        image,
        captured_at: chrono::Utc::now(),
    })
}

/// NV21 -> JPEG -> RGB, then rotated upright. The intermediate JPEG lives
/// only inside this call.
fn upright_from_nv21(
    nv21: &[u8],
    width: u32,
    height: u32,
    display_orientation: u32,
) -> Result<RgbImage, CameraError> {
    let decoded = {
        let jpeg = codec::nv21_to_jpeg(nv21, width, height, UPRIGHT_JPEG_QUALITY)?;
        codec::decode_jpeg(&jpeg)?
    };
    Ok(codec::rotate(&decoded, upright_rotation(display_orientation)))
}
