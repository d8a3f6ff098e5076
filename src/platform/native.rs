//! Hardware backend built on nokhwa.
//!
//! nokhwa exposes neither sensor mounting nor flash LEDs, so native devices
//! report a sensor orientation of 0 and no flash modes. Facing is guessed
//! from the device name; anything not labelled rear/back is treated as the
//! user-facing webcam.

use crate::codec;
use crate::errors::CameraError;
use crate::platform::{CameraBackend, CameraDevice};
use crate::types::{
    CameraFacing, DeviceInfo, FlashMode, FrameBuffer, PictureEncoding, PixelLayout, Size,
};
use image::RgbImage;
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
    Buffer, Camera,
};

/// Backend for the platform's native capture API.
#[derive(Debug, Default, Clone)]
pub struct NativeBackend;

impl NativeBackend {
    pub fn new() -> Self {
        Self
    }
}

fn facing_from_name(name: &str) -> CameraFacing {
    let lower = name.to_lowercase();
    if lower.contains("rear") || lower.contains("back") || lower.contains("world") {
        CameraFacing::Back
    } else {
        CameraFacing::Front
    }
}

fn map_nokhwa_error(context: &str, error: nokhwa::NokhwaError) -> CameraError {
    let message = format!("{}: {}", context, error);
    let lower = message.to_lowercase();
    if lower.contains("permission")
        || lower.contains("denied")
        || lower.contains("not authorized")
    {
        CameraError::PermissionDenied(message)
    } else {
        CameraError::DeviceUnavailable(message)
    }
}

impl CameraBackend for NativeBackend {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, CameraError> {
        let cameras = query(ApiBackend::Auto)
            .map_err(|e| map_nokhwa_error("Failed to query cameras", e))?;

        let devices = cameras
            .iter()
            .enumerate()
            .map(|(position, camera_info)| {
                let index = camera_info.index().as_index().unwrap_or(position as u32);
                let name = camera_info.human_name();
                let facing = facing_from_name(&name);
                DeviceInfo::new(index, name, facing)
            })
            .collect();

        Ok(devices)
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn CameraDevice>, CameraError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(device.index), requested)
            .map_err(|e| map_nokhwa_error("Failed to open camera", e))?;

        let mut sizes: Vec<Size> = camera
            .compatible_camera_formats()
            .map(|formats| {
                formats
                    .iter()
                    .map(|f| Size::new(f.resolution().width_x, f.resolution().height_y))
                    .collect()
            })
            .unwrap_or_else(|e| {
                log::warn!("Could not query formats for {}: {}", device.name, e);
                Vec::new()
            });
        sizes.sort_by_key(|s| std::cmp::Reverse(s.area()));
        sizes.dedup();

        log::info!(
            "Opened native camera {} ({}) with {} preview sizes",
            device.index,
            device.name,
            sizes.len()
        );

        Ok(Box::new(NativeDevice {
            camera,
            info: device.clone(),
            sizes,
            streaming: false,
        }))
    }
}

/// An open nokhwa camera.
pub struct NativeDevice {
    camera: Camera,
    info: DeviceInfo,
    sizes: Vec<Size>,
    streaming: bool,
}

impl NativeDevice {
    fn grab(&mut self) -> Result<Buffer, CameraError> {
        self.camera
            .frame()
            .map_err(|e| CameraError::CaptureFailure(format!("Failed to capture frame: {}", e)))
    }
}

fn buffer_to_nv21(buffer: &Buffer) -> Result<FrameBuffer, CameraError> {
    let decoded = buffer
        .decode_image::<RgbFormat>()
        .map_err(|e| CameraError::CaptureFailure(format!("Failed to decode frame: {}", e)))?;
    let (width, height) = (decoded.width(), decoded.height());
    let rgb = RgbImage::from_raw(width, height, decoded.into_raw())
        .ok_or_else(|| CameraError::CaptureFailure("frame size mismatch".to_string()))?;
    Ok(FrameBuffer::new(
        width,
        height,
        PixelLayout::Nv21,
        codec::rgb_to_nv21(&rgb),
    ))
}

impl CameraDevice for NativeDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn supported_preview_sizes(&self) -> Vec<Size> {
        self.sizes.clone()
    }

    fn set_preview_size(&mut self, size: Size) -> Result<(), CameraError> {
        if self.streaming {
            return Err(CameraError::invalid_state("cannot resize while streaming"));
        }
        self.camera
            .set_resolution(Resolution::new(size.width, size.height))
            .map_err(|e| map_nokhwa_error("Failed to set resolution", e))
    }

    fn set_display_orientation(&mut self, degrees: u32) {
        // Webcams have no hardware output rotation; the preview transform covers it.
        log::debug!("Native camera {} display orientation {}", self.info.index, degrees);
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        self.camera
            .open_stream()
            .map_err(|e| map_nokhwa_error("Failed to start stream", e))?;
        self.streaming = true;
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CameraError> {
        self.streaming = false;
        self.camera
            .stop_stream()
            .map_err(|e| map_nokhwa_error("Failed to stop stream", e))
    }

    fn next_preview_frame(&mut self) -> Result<Option<FrameBuffer>, CameraError> {
        if !self.streaming {
            return Ok(None);
        }
        let buffer = self.grab()?;
        buffer_to_nv21(&buffer).map(Some)
    }

    fn supported_flash_modes(&self) -> Vec<FlashMode> {
        Vec::new()
    }

    fn set_flash_mode(&mut self, mode: FlashMode) -> Result<(), CameraError> {
        Err(CameraError::Unsupported(format!(
            "flash mode {:?} not available on {}",
            mode, self.info.name
        )))
    }

    fn capture_still(&mut self, encoding: PictureEncoding) -> Result<FrameBuffer, CameraError> {
        if !self.streaming {
            return Err(CameraError::invalid_state("stream is not running"));
        }
        let buffer = self.grab()?;
        if encoding == PictureEncoding::Compressed
            && buffer.source_frame_format() == FrameFormat::MJPEG
        {
            let resolution = buffer.resolution();
            return Ok(FrameBuffer::new(
                resolution.width_x,
                resolution.height_y,
                PixelLayout::Jpeg,
                buffer.buffer().to_vec(),
            ));
        }
        buffer_to_nv21(&buffer)
    }

    fn close(&mut self) {
        if self.streaming {
            if let Err(e) = self.stop_preview() {
                log::warn!("Error stopping stream during close: {}", e);
            }
        }
        log::info!("Closed native camera {}", self.info.index);
    }
}
