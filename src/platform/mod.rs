//! Device driver seam.
//!
//! The session talks to hardware only through [`CameraBackend`] and
//! [`CameraDevice`]. Devices are opened and driven exclusively on the session's
//! worker thread, so [`CameraDevice`] does not need to be `Send`.

use crate::errors::CameraError;
use crate::types::{DeviceInfo, FlashMode, FrameBuffer, PictureEncoding, Size};

#[cfg(feature = "native")]
pub mod native;

#[cfg(feature = "native")]
pub use native::NativeBackend;

/// Enumerates and opens camera devices.
pub trait CameraBackend: Send + Sync {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, CameraError>;

    /// Opens `device` exclusively. Fails with `DeviceUnavailable` when the
    /// device is gone or held elsewhere, `PermissionDenied` when access is refused.
    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn CameraDevice>, CameraError>;
}

/// An open camera device.
pub trait CameraDevice {
    fn info(&self) -> &DeviceInfo;

    fn supported_preview_sizes(&self) -> Vec<Size>;

    /// Only valid while the preview is stopped
    fn set_preview_size(&mut self, size: Size) -> Result<(), CameraError>;

    /// Rotation the device should apply to its own preview output
    fn set_display_orientation(&mut self, degrees: u32);

    fn start_preview(&mut self) -> Result<(), CameraError>;

    fn stop_preview(&mut self) -> Result<(), CameraError>;

    /// Blocks for at most one frame period. `Ok(None)` means no frame was ready.
    fn next_preview_frame(&mut self) -> Result<Option<FrameBuffer>, CameraError>;

    /// Empty when the device has no flash hardware
    fn supported_flash_modes(&self) -> Vec<FlashMode>;

    fn set_flash_mode(&mut self, mode: FlashMode) -> Result<(), CameraError>;

    /// Produces one still frame. Devices that compress on their own may
    /// return JPEG when `encoding` is `Compressed`; everything else is NV21.
    fn capture_still(&mut self, encoding: PictureEncoding) -> Result<FrameBuffer, CameraError>;

    fn close(&mut self);
}

/// Finds the first enumerated device with the given facing.
pub fn find_by_facing(
    devices: &[DeviceInfo],
    facing: crate::types::CameraFacing,
) -> Option<&DeviceInfo> {
    devices.iter().find(|d| d.facing == facing)
}
