//! Callback contract between the helper and its host.
//!
//! Every callback except [`CameraListener::on_preview_frame`] runs on the
//! host's UI context (see [`crate::dispatch`]). Preview frames are handed
//! out on the device worker thread and only borrowed for the duration of the
//! call.

use crate::errors::CameraError;
use crate::types::{CaptureResult, DeviceInfo, FrameBuffer};
use crossbeam_channel::{Receiver, Sender};

/// Host-implemented callbacks. All methods default to no-ops.
pub trait CameraListener: Send + Sync {
    fn on_camera_opened(
        &self,
        _device: &DeviceInfo,
        _display_orientation: u32,
        _is_mirrored: bool,
    ) {
    }

    /// Worker thread. The frame must not be retained past the call.
    fn on_preview_frame(&self, _frame: &FrameBuffer) {}

    fn on_camera_closed(&self) {}

    fn on_camera_error(&self, _error: &CameraError) {}

    fn on_configuration_changed(&self, _device: &DeviceInfo, _display_orientation: u32) {}

    fn on_picture_taken(&self, _result: CaptureResult) {}
}

/// Tagged form of the listener callbacks.
#[derive(Debug, Clone)]
pub enum CameraEvent {
    Opened {
        device: DeviceInfo,
        display_orientation: u32,
        is_mirrored: bool,
    },
    /// Owned copy of a preview frame
    PreviewFrame(FrameBuffer),
    Closed,
    Error(CameraError),
    ConfigurationChanged {
        device: DeviceInfo,
        display_orientation: u32,
    },
    PictureTaken(CaptureResult),
}

impl CameraEvent {
    /// Invokes the matching listener callback.
    pub fn dispatch(self, listener: &dyn CameraListener) {
        match self {
            CameraEvent::Opened {
                device,
                display_orientation,
                is_mirrored,
            } => listener.on_camera_opened(&device, display_orientation, is_mirrored),
            CameraEvent::PreviewFrame(frame) => listener.on_preview_frame(&frame),
            CameraEvent::Closed => listener.on_camera_closed(),
            CameraEvent::Error(error) => listener.on_camera_error(&error),
            CameraEvent::ConfigurationChanged {
                device,
                display_orientation,
            } => listener.on_configuration_changed(&device, display_orientation),
            CameraEvent::PictureTaken(result) => listener.on_picture_taken(result),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CameraEvent::Opened { .. } => "opened",
            CameraEvent::PreviewFrame(_) => "preview_frame",
            CameraEvent::Closed => "closed",
            CameraEvent::Error(_) => "error",
            CameraEvent::ConfigurationChanged { .. } => "configuration_changed",
            CameraEvent::PictureTaken(_) => "picture_taken",
        }
    }
}

/// Listener that forwards every callback into a channel as a [`CameraEvent`].
///
/// Preview frames are copied only when `forward_preview_frames` is set.
pub struct ChannelListener {
    sender: Sender<CameraEvent>,
    forward_preview_frames: bool,
}

impl ChannelListener {
    pub fn new() -> (Self, Receiver<CameraEvent>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (
            Self {
                sender,
                forward_preview_frames: false,
            },
            receiver,
        )
    }

    pub fn with_preview_frames(mut self, forward: bool) -> Self {
        self.forward_preview_frames = forward;
        self
    }

    fn send(&self, event: CameraEvent) {
        if self.sender.send(event).is_err() {
            log::debug!("Camera event receiver dropped");
        }
    }
}

impl CameraListener for ChannelListener {
    fn on_camera_opened(&self, device: &DeviceInfo, display_orientation: u32, is_mirrored: bool) {
        self.send(CameraEvent::Opened {
            device: device.clone(),
            display_orientation,
            is_mirrored,
        });
    }

    fn on_preview_frame(&self, frame: &FrameBuffer) {
        if self.forward_preview_frames {
            self.send(CameraEvent::PreviewFrame(frame.clone()));
        }
    }

    fn on_camera_closed(&self) {
        self.send(CameraEvent::Closed);
    }

    fn on_camera_error(&self, error: &CameraError) {
        self.send(CameraEvent::Error(error.clone()));
    }

    fn on_configuration_changed(&self, device: &DeviceInfo, display_orientation: u32) {
        self.send(CameraEvent::ConfigurationChanged {
            device: device.clone(),
            display_orientation,
        });
    }

    fn on_picture_taken(&self, result: CaptureResult) {
        self.send(CameraEvent::PictureTaken(result));
    }
}
