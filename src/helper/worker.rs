//! Device worker: the only thread that touches the camera device.

use crate::builder::CameraConfig;
use crate::capture;
use crate::errors::CameraError;
use crate::helper::state::{EventSink, SessionState, Shared};
use crate::listener::CameraEvent;
use crate::orientation;
use crate::platform::{find_by_facing, CameraBackend, CameraDevice};
use crate::preview::{choose_preview_size, compute_transform, PreviewSizeChoice};
use crate::types::{CameraFacing, DeviceInfo, FlashMode, Rotation, Size};
use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

pub(crate) type Reply<T> = oneshot::Sender<T>;

pub(crate) enum Command {
    Init { reply: Reply<Result<(), CameraError>> },
    Start { reply: Reply<Result<(), CameraError>> },
    Stop { reply: Reply<Result<(), CameraError>> },
    Switch,
    SetFlash { mode: FlashMode, reply: Reply<bool> },
    TakePicture { request_id: Uuid },
    UpdateRotation { rotation: Rotation },
    Release { reply: Option<Reply<()>> },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Init { .. } => "init",
            Command::Start { .. } => "start",
            Command::Stop { .. } => "stop",
            Command::Switch => "switch",
            Command::SetFlash { .. } => "set_flash",
            Command::TakePicture { .. } => "take_picture",
            Command::UpdateRotation { .. } => "update_rotation",
            Command::Release { .. } => "release",
        }
    }
}

pub(crate) struct Session {
    config: CameraConfig,
    backend: Arc<dyn CameraBackend>,
    shared: Arc<Shared>,
    events: EventSink,
    device: Option<Box<dyn CameraDevice>>,
    facing: CameraFacing,
    rotation: Rotation,
    preview_size: Size,
    display_orientation: u32,
    streaming: bool,
    ever_opened: bool,
}

impl Session {
    pub(crate) fn new(
        config: CameraConfig,
        backend: Arc<dyn CameraBackend>,
        shared: Arc<Shared>,
        events: EventSink,
    ) -> Self {
        Self {
            facing: config.camera_facing(),
            rotation: config.rotation(),
            preview_size: config.preview_size(),
            config,
            backend,
            shared,
            events,
            device: None,
            display_orientation: 0,
            streaming: false,
            ever_opened: false,
        }
    }

    /// Runs until released or until every handle to the helper is gone.
    pub(crate) fn run(mut self, commands: Receiver<Command>) {
        let idle_poll = Duration::from_millis(self.config.settings().preview.idle_poll_ms);
        let mut idle = false;

        log::info!("Camera worker started");
        loop {
            let received = if !self.streaming {
                commands.recv().ok()
            } else if idle {
                match commands.recv_timeout(idle_poll) {
                    Ok(command) => Some(command),
                    Err(RecvTimeoutError::Timeout) => {
                        idle = !self.pump_preview();
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => None,
                }
            } else {
                match commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => {
                        idle = !self.pump_preview();
                        continue;
                    }
                    Err(TryRecvError::Disconnected) => None,
                }
            };

            let Some(command) = received else {
                log::debug!("Command channel closed, shutting down worker");
                self.close_device();
                break;
            };

            idle = false;
            if self.handle(command).is_break() {
                break;
            }
        }
        log::info!("Camera worker stopped");
    }

    fn handle(&mut self, command: Command) -> ControlFlow<()> {
        log::debug!("Worker command: {}", command.name());
        match command {
            Command::Init { reply } => {
                let _ = reply.send(self.init());
            }
            Command::Start { reply } => {
                let _ = reply.send(self.start());
            }
            Command::Stop { reply } => {
                let _ = reply.send(self.stop());
            }
            Command::Switch => self.switch(),
            Command::SetFlash { mode, reply } => {
                let _ = reply.send(self.set_flash_mode(mode));
            }
            Command::TakePicture { request_id } => self.take_picture(request_id),
            Command::UpdateRotation { rotation } => self.update_rotation(rotation),
            Command::Release { reply } => {
                self.release();
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn init(&mut self) -> Result<(), CameraError> {
        if self.device.is_some() {
            return Err(CameraError::invalid_state("camera is already open"));
        }
        let facing = self.facing;
        self.open(facing)?;
        self.shared.set_state(SessionState::Opened);
        Ok(())
    }

    fn start(&mut self) -> Result<(), CameraError> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| CameraError::invalid_state("camera is not open"))?;
        if self.streaming {
            return Ok(());
        }
        device.start_preview()?;
        self.streaming = true;
        self.shared.set_state(SessionState::Previewing);
        log::info!("Preview started at {}", self.preview_size);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        if let Some(device) = self.device.as_mut() {
            if self.streaming {
                self.streaming = false;
                device.stop_preview()?;
                log::info!("Preview stopped");
            }
            self.shared.set_state(SessionState::Opened);
        }
        Ok(())
    }

    /// Opens the first device with `facing` and binds it to the preview.
    fn open(&mut self, facing: CameraFacing) -> Result<(), CameraError> {
        let devices = self.backend.enumerate()?;
        let info = find_by_facing(&devices, facing).cloned().ok_or_else(|| {
            CameraError::DeviceUnavailable(format!("no {} camera available", facing))
        })?;

        log::info!("Opening camera {} ({})", info.index, info.name);
        self.device = Some(self.backend.open(&info)?);
        self.facing = facing;
        self.ever_opened = true;

        let info = match self.bind() {
            Ok(info) => info,
            Err(e) => {
                self.close_device();
                return Err(e);
            }
        };
        self.events.post(CameraEvent::Opened {
            device: info,
            display_orientation: self.display_orientation,
            is_mirrored: self.config.mirror(),
        });
        Ok(())
    }

    /// Applies preview size, orientation and transform to a freshly opened,
    /// stopped device.
    fn bind(&mut self) -> Result<DeviceInfo, CameraError> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| CameraError::invalid_state("camera is not open"))?;
        let info = device.info().clone();

        let choice = choose_preview_size(
            &device.supported_preview_sizes(),
            self.config.preview_size(),
            self.config.specific_preview_size(),
            self.config.settings().preview.aspect_tolerance,
        );
        if let PreviewSizeChoice::Fallback { size, reason } = &choice {
            log::warn!("Preview size fallback to {}: {}", size, reason);
            self.events
                .error(CameraError::Unsupported(format!("{}, using {}", reason, size)));
        }
        let size = choice.size();
        device.set_preview_size(size)?;
        self.preview_size = size;

        self.display_orientation = self.apply_orientation(&info);
        self.shared
            .set_device(Some((info.clone(), self.display_orientation)));
        log::debug!(
            "Bound camera {} at {}, orientation {}",
            info.index,
            size,
            self.display_orientation
        );
        Ok(info)
    }

    /// Computes the orientation for `info`, pushes it to the device and
    /// the preview surface.
    fn apply_orientation(&mut self, info: &DeviceInfo) -> u32 {
        let degrees = orientation::display_orientation(
            info.sensor_orientation,
            info.facing,
            self.rotation,
            self.config.additional_rotation(),
        );
        if let Some(device) = self.device.as_mut() {
            device.set_display_orientation(degrees);
        }

        let surface = self.config.preview_surface();
        let measured = surface.size();
        let surface_size = if measured.is_empty() {
            self.config.preview_size()
        } else {
            measured
        };
        let transform =
            compute_transform(self.preview_size, surface_size, degrees, self.config.mirror());
        surface.set_transform(&transform);
        degrees
    }

    fn switch(&mut self) {
        if self.device.is_none() {
            self.events
                .error(CameraError::invalid_state("no open camera to switch from"));
            return;
        }

        let was_streaming = self.streaming;
        let previous = self.facing;
        let target = previous.opposite();
        log::info!("Switching camera from {} to {}", previous, target);

        self.close_device();
        self.shared.set_flash_mode(FlashMode::Off);

        match self.open(target) {
            Ok(()) => {
                if let Some(info) = self.shared.device() {
                    self.events.post(CameraEvent::ConfigurationChanged {
                        device: info,
                        display_orientation: self.display_orientation,
                    });
                }
            }
            Err(e) => {
                log::warn!("Failed to open {} camera: {}", target, e);
                self.events.error(e);
                if let Err(e) = self.open(previous) {
                    log::warn!("Failed to reopen {} camera: {}", previous, e);
                    self.events.error(e);
                    self.shared.set_state(SessionState::Uninitialized);
                    return;
                }
            }
        }

        if was_streaming {
            if let Err(e) = self.start() {
                log::warn!("Failed to restart preview after switch: {}", e);
                self.events.error(e);
                self.shared.set_state(SessionState::Opened);
            }
        } else {
            self.shared.set_state(SessionState::Opened);
        }
    }

    fn set_flash_mode(&mut self, mode: FlashMode) -> bool {
        let Some(device) = self.device.as_mut() else {
            return false;
        };
        if !device.supported_flash_modes().contains(&mode) {
            log::debug!("Flash mode {:?} not supported by camera", mode);
            return false;
        }
        match device.set_flash_mode(mode) {
            Ok(()) => {
                self.shared.set_flash_mode(mode);
                true
            }
            Err(e) => {
                log::warn!("Failed to set flash mode {:?}: {}", mode, e);
                false
            }
        }
    }

    fn take_picture(&mut self, request_id: Uuid) {
        let outcome = match self.device.as_mut() {
            Some(device) if self.streaming => {
                log::debug!("Capturing still {}", request_id);
                device
                    .capture_still(self.config.picture_encoding())
                    .and_then(|frame| {
                        capture::process_frame(
                            frame,
                            self.config.picture_encoding(),
                            self.display_orientation,
                            self.config.settings().capture.jpeg_quality,
                            request_id,
                        )
                    })
                    .map_err(|e| match e {
                        CameraError::CaptureFailure(_) => e,
                        other => CameraError::CaptureFailure(other.to_string()),
                    })
            }
            _ => Err(CameraError::invalid_state("preview is not running")),
        };

        if let Err(e) = &outcome {
            log::warn!("Capture {} failed: {}", request_id, e);
        }
        self.shared.finish_capture(self.streaming);
        self.events.capture_outcome(outcome);
    }

    fn update_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        let Some(info) = self.device.as_ref().map(|d| d.info().clone()) else {
            return;
        };
        self.display_orientation = self.apply_orientation(&info);
        self.shared.set_display_orientation(self.display_orientation);
        log::debug!(
            "Display rotation now {}, orientation {}",
            rotation.degrees(),
            self.display_orientation
        );
        self.events.post(CameraEvent::ConfigurationChanged {
            device: info,
            display_orientation: self.display_orientation,
        });
    }

    /// Delivers one preview frame. Returns `false` when none was ready.
    fn pump_preview(&mut self) -> bool {
        let Some(device) = self.device.as_mut() else {
            self.streaming = false;
            return false;
        };

        match device.next_preview_frame() {
            Ok(Some(mut frame)) => {
                frame.display_orientation = self.display_orientation;
                self.config.preview_surface().present(&frame);
                if !self.shared.is_released() {
                    self.events.listener().on_preview_frame(&frame);
                }
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("Preview stream failed: {}", e);
                self.streaming = false;
                if let Err(stop_err) = device.stop_preview() {
                    log::debug!("Stopping failed stream: {}", stop_err);
                }
                self.shared.set_state(SessionState::Opened);
                self.events.error(e);
                false
            }
        }
    }

    fn close_device(&mut self) {
        if let Some(mut device) = self.device.take() {
            if self.streaming {
                if let Err(e) = device.stop_preview() {
                    log::debug!("Stopping preview on close: {}", e);
                }
            }
            device.close();
            log::info!("Closed camera {}", device.info().index);
        }
        self.streaming = false;
        self.shared.set_device(None);
    }

    fn release(&mut self) {
        self.close_device();
        self.shared.set_state(SessionState::Closed);
        if self.ever_opened {
            self.events.post(CameraEvent::Closed);
        }
        log::info!("Camera helper released");
    }
}
