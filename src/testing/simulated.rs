//! Scriptable in-process camera backend.
//!
//! Serves synthetic frames so the session can be exercised without
//! hardware, and lets tests inject the failures real devices produce:
//! cameras held by another process, access denial, empty capture buffers,
//! slow captures.

use crate::errors::CameraError;
use crate::platform::{CameraBackend, CameraDevice};
use crate::testing::synthetic_data::{synthetic_jpeg_frame, synthetic_nv21_frame};
use crate::types::{
    CameraFacing, DeviceInfo, FlashMode, FrameBuffer, PictureEncoding, PixelLayout, Size,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One simulated camera.
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    pub info: DeviceInfo,
    pub preview_sizes: Vec<Size>,
    /// Compresses stills itself when asked for `Compressed`
    pub produces_jpeg: bool,
    /// Held by another process
    pub busy: bool,
    pub permission_denied: bool,
}

impl SimulatedCamera {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            info,
            preview_sizes: vec![
                Size::new(1280, 720),
                Size::new(640, 480),
                Size::new(320, 240),
            ],
            produces_jpeg: false,
            busy: false,
            permission_denied: false,
        }
    }

    pub fn with_preview_sizes(mut self, sizes: Vec<Size>) -> Self {
        self.preview_sizes = sizes;
        self
    }

    pub fn with_jpeg(mut self, produces_jpeg: bool) -> Self {
        self.produces_jpeg = produces_jpeg;
        self
    }

    pub fn busy(mut self) -> Self {
        self.busy = true;
        self
    }

    pub fn permission_denied(mut self) -> Self {
        self.permission_denied = true;
        self
    }
}

#[derive(Debug, Default)]
struct Script {
    empty_captures: usize,
    capture_delay: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    open_handles: AtomicUsize,
    max_open_handles: AtomicUsize,
    opens: AtomicUsize,
    preview_frames: AtomicUsize,
    captures: AtomicUsize,
}

/// Backend serving [`SimulatedCamera`]s.
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    cameras: Vec<SimulatedCamera>,
    frame_interval: Duration,
    script: Arc<Mutex<Script>>,
    counters: Arc<Counters>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    /// A backend with no cameras
    pub fn new() -> Self {
        Self {
            cameras: Vec::new(),
            frame_interval: Duration::from_millis(33),
            script: Arc::new(Mutex::new(Script::default())),
            counters: Arc::new(Counters::default()),
        }
    }

    /// A typical phone: back sensor at 90 degrees with flash, front sensor
    /// at 270 degrees without
    pub fn phone() -> Self {
        Self::new()
            .with_camera(SimulatedCamera::new(
                DeviceInfo::new(0, "Simulated back camera", CameraFacing::Back)
                    .with_sensor_orientation(90)
                    .with_flash(true),
            ))
            .with_camera(SimulatedCamera::new(
                DeviceInfo::new(1, "Simulated front camera", CameraFacing::Front)
                    .with_sensor_orientation(270),
            ))
    }

    pub fn with_camera(mut self, camera: SimulatedCamera) -> Self {
        self.cameras.push(camera);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    /// The next `count` still captures deliver a zero-length buffer
    pub fn inject_empty_captures(&self, count: usize) {
        if let Ok(mut script) = self.script.lock() {
            script.empty_captures += count;
        }
    }

    /// Every still capture sleeps this long before returning
    pub fn set_capture_delay(&self, delay: Duration) {
        if let Ok(mut script) = self.script.lock() {
            script.capture_delay = delay;
        }
    }

    /// Device handles currently open
    pub fn open_handles(&self) -> usize {
        self.counters.open_handles.load(Ordering::SeqCst)
    }

    /// Highest number of handles that were open at the same time
    pub fn max_open_handles(&self) -> usize {
        self.counters.max_open_handles.load(Ordering::SeqCst)
    }

    pub fn total_opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn preview_frames_served(&self) -> usize {
        self.counters.preview_frames.load(Ordering::SeqCst)
    }

    pub fn captures_served(&self) -> usize {
        self.counters.captures.load(Ordering::SeqCst)
    }
}

impl CameraBackend for SimulatedBackend {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, CameraError> {
        Ok(self.cameras.iter().map(|c| c.info.clone()).collect())
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn CameraDevice>, CameraError> {
        let camera = self
            .cameras
            .iter()
            .find(|c| c.info.index == device.index)
            .ok_or_else(|| {
                CameraError::DeviceUnavailable(format!("camera {} does not exist", device.index))
            })?;

        if camera.permission_denied {
            return Err(CameraError::PermissionDenied(format!(
                "access to camera {} denied",
                device.index
            )));
        }
        if camera.busy {
            return Err(CameraError::DeviceUnavailable(format!(
                "camera {} is held by another process",
                device.index
            )));
        }

        let open = self.counters.open_handles.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_open_handles.fetch_max(open, Ordering::SeqCst);
        self.counters.opens.fetch_add(1, Ordering::SeqCst);

        let preview_size = camera
            .preview_sizes
            .first()
            .copied()
            .unwrap_or(Size::new(640, 480));

        Ok(Box::new(SimulatedDevice {
            camera: camera.clone(),
            preview_size,
            display_orientation: 0,
            streaming: false,
            flash_mode: FlashMode::Off,
            frame_number: 0,
            frame_interval: self.frame_interval,
            script: self.script.clone(),
            counters: self.counters.clone(),
            closed: false,
        }))
    }
}

struct SimulatedDevice {
    camera: SimulatedCamera,
    preview_size: Size,
    display_orientation: u32,
    streaming: bool,
    flash_mode: FlashMode,
    frame_number: u64,
    frame_interval: Duration,
    script: Arc<Mutex<Script>>,
    counters: Arc<Counters>,
    closed: bool,
}

impl SimulatedDevice {
    fn release_handle(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.open_handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl CameraDevice for SimulatedDevice {
    fn info(&self) -> &DeviceInfo {
        &self.camera.info
    }

    fn supported_preview_sizes(&self) -> Vec<Size> {
        self.camera.preview_sizes.clone()
    }

    fn set_preview_size(&mut self, size: Size) -> Result<(), CameraError> {
        if self.streaming {
            return Err(CameraError::invalid_state("cannot resize while streaming"));
        }
        if size.is_empty() {
            return Err(CameraError::Unsupported(format!("preview size {}", size)));
        }
        self.preview_size = size;
        Ok(())
    }

    fn set_display_orientation(&mut self, degrees: u32) {
        self.display_orientation = degrees;
    }

    fn start_preview(&mut self) -> Result<(), CameraError> {
        self.streaming = true;
        Ok(())
    }

    fn stop_preview(&mut self) -> Result<(), CameraError> {
        self.streaming = false;
        Ok(())
    }

    fn next_preview_frame(&mut self) -> Result<Option<FrameBuffer>, CameraError> {
        std::thread::sleep(self.frame_interval);
        if !self.streaming {
            return Ok(None);
        }
        self.frame_number = self.frame_number.wrapping_add(1);
        self.counters.preview_frames.fetch_add(1, Ordering::SeqCst);
        let frame = synthetic_nv21_frame(
            self.frame_number,
            self.preview_size.width,
            self.preview_size.height,
        );
        Ok(Some(frame.with_display_orientation(self.display_orientation)))
    }

    fn supported_flash_modes(&self) -> Vec<FlashMode> {
        if self.camera.info.has_flash {
            vec![FlashMode::Off, FlashMode::On, FlashMode::Auto, FlashMode::Torch]
        } else {
            Vec::new()
        }
    }

    fn set_flash_mode(&mut self, mode: FlashMode) -> Result<(), CameraError> {
        if !self.supported_flash_modes().contains(&mode) {
            return Err(CameraError::Unsupported(format!("flash mode {:?}", mode)));
        }
        self.flash_mode = mode;
        Ok(())
    }

    fn capture_still(&mut self, encoding: PictureEncoding) -> Result<FrameBuffer, CameraError> {
        let (empty, delay) = match self.script.lock() {
            Ok(mut script) => {
                let empty = script.empty_captures > 0;
                if empty {
                    script.empty_captures -= 1;
                }
                (empty, script.capture_delay)
            }
            Err(_) => (false, Duration::ZERO),
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.counters.captures.fetch_add(1, Ordering::SeqCst);
        log::debug!(
            "Simulated capture on camera {} (flash {:?})",
            self.camera.info.index,
            self.flash_mode
        );

        let Size { width, height } = self.preview_size;
        if empty {
            return Ok(FrameBuffer::new(width, height, PixelLayout::Nv21, Vec::new()));
        }

        self.frame_number = self.frame_number.wrapping_add(1);
        if encoding == PictureEncoding::Compressed && self.camera.produces_jpeg {
            Ok(synthetic_jpeg_frame(self.frame_number, width, height))
        } else {
            Ok(synthetic_nv21_frame(self.frame_number, width, height))
        }
    }

    fn close(&mut self) {
        self.streaming = false;
        self.release_handle();
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.release_handle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_layout() {
        let backend = SimulatedBackend::phone();
        let devices = backend.enumerate().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].facing, CameraFacing::Back);
        assert!(devices[0].has_flash);
        assert_eq!(devices[1].sensor_orientation, 270);
    }

    #[test]
    fn test_open_close_tracks_handles() {
        let backend = SimulatedBackend::phone();
        let devices = backend.enumerate().unwrap();
        let mut device = backend.open(&devices[0]).unwrap();
        assert_eq!(backend.open_handles(), 1);
        device.close();
        assert_eq!(backend.open_handles(), 0);
        drop(device);
        assert_eq!(backend.open_handles(), 0);
        assert_eq!(backend.max_open_handles(), 1);
    }

    #[test]
    fn test_busy_and_denied() {
        let backend = SimulatedBackend::new()
            .with_camera(SimulatedCamera::new(DeviceInfo::new(0, "a", CameraFacing::Back)).busy())
            .with_camera(
                SimulatedCamera::new(DeviceInfo::new(1, "b", CameraFacing::Front))
                    .permission_denied(),
            );
        let devices = backend.enumerate().unwrap();
        assert!(matches!(
            backend.open(&devices[0]).err(),
            Some(CameraError::DeviceUnavailable(_))
        ));
        assert!(matches!(
            backend.open(&devices[1]).err(),
            Some(CameraError::PermissionDenied(_))
        ));
        assert_eq!(backend.open_handles(), 0);
    }

    #[test]
    fn test_injected_empty_capture() {
        let backend = SimulatedBackend::phone();
        let devices = backend.enumerate().unwrap();
        let mut device = backend.open(&devices[0]).unwrap();
        backend.inject_empty_captures(1);
        assert!(device.capture_still(PictureEncoding::RawPlanar).unwrap().is_empty());
        assert!(!device.capture_still(PictureEncoding::RawPlanar).unwrap().is_empty());
    }

    #[test]
    fn test_flash_support() {
        let backend = SimulatedBackend::phone();
        let devices = backend.enumerate().unwrap();
        let mut back = backend.open(&devices[0]).unwrap();
        assert!(back.set_flash_mode(FlashMode::Torch).is_ok());
        let mut front = backend.open(&devices[1]).unwrap();
        assert!(front.supported_flash_modes().is_empty());
        assert!(front.set_flash_mode(FlashMode::Torch).is_err());
    }
}
