//! The camera helper.
//!
//! [`CameraHelper`] is the host-facing handle. It owns one worker thread
//! that opens and drives the device; every operation is a command on that
//! worker's queue, so operations run in the order they were issued.
//! Rejections that depend only on session state (capture already in
//! flight, switching with nothing open, anything after release) are
//! decided synchronously on the caller's thread.

mod state;
mod worker;

pub use state::SessionState;

use crate::builder::CameraConfig;
use crate::dispatch::{ui_channel, UiExecutor, UiLoop};
use crate::errors::CameraError;
use crate::platform::CameraBackend;
use crate::types::{DeviceInfo, FlashMode, Rotation};
use crossbeam_channel::Sender;
use state::{EventSink, Shared};
use std::sync::Arc;
use tokio::sync::oneshot;
use uuid::Uuid;
use worker::{Command, Reply, Session};

pub struct CameraHelper {
    shared: Arc<Shared>,
    commands: Sender<Command>,
}

impl CameraHelper {
    /// Creates a helper whose listener callbacks are posted to `ui`.
    ///
    /// Spawns the device worker but does not open anything; call
    /// [`CameraHelper::init`] for that.
    pub fn new(
        config: CameraConfig,
        backend: Arc<dyn CameraBackend>,
        ui: Arc<dyn UiExecutor>,
    ) -> Result<Self, CameraError> {
        let shared = Arc::new(Shared::new());
        let events = EventSink::new(ui, config.listener().clone(), shared.clone());
        let thread_name = config.settings().worker.thread_name.clone();
        let session_shared = shared.clone();

        let (commands, receiver) = crossbeam_channel::unbounded();
        std::thread::Builder::new()
            .name(thread_name)
            .spawn(move || Session::new(config, backend, session_shared, events).run(receiver))
            .map_err(|e| {
                CameraError::Configuration(format!("failed to spawn camera worker: {e}"))
            })?;

        Ok(Self { shared, commands })
    }

    /// Creates a helper together with the built-in UI queue. The host runs
    /// the returned [`UiLoop`] on its UI thread.
    pub fn with_ui_loop(
        config: CameraConfig,
        backend: Arc<dyn CameraBackend>,
    ) -> Result<(Self, UiLoop), CameraError> {
        let (dispatcher, ui_loop) = ui_channel();
        let helper = Self::new(config, backend, Arc::new(dispatcher))?;
        Ok((helper, ui_loop))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, CameraError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| CameraError::worker_gone())?;
        response.await.map_err(|_| CameraError::worker_gone())
    }

    fn ensure_not_released(&self) -> Result<(), CameraError> {
        if self.shared.is_released() {
            return Err(CameraError::released());
        }
        Ok(())
    }

    /// Opens the first camera with the configured facing and binds it to
    /// the preview surface. Fires `on_camera_opened` on success.
    pub async fn init(&self) -> Result<(), CameraError> {
        self.ensure_not_released()?;
        if self.shared.state() != SessionState::Uninitialized {
            return Err(CameraError::invalid_state("camera is already initialized"));
        }
        self.request(|reply| Command::Init { reply }).await?
    }

    /// Starts streaming to the preview surface. No-op when already streaming.
    pub async fn start(&self) -> Result<(), CameraError> {
        self.ensure_not_released()?;
        if self.shared.state() == SessionState::Uninitialized {
            return Err(CameraError::invalid_state("camera is not initialized"));
        }
        self.request(|reply| Command::Start { reply }).await?
    }

    /// Stops streaming but keeps the device open. No-op before `init`.
    pub async fn stop(&self) -> Result<(), CameraError> {
        self.ensure_not_released()?;
        if self.shared.state() == SessionState::Uninitialized {
            return Ok(());
        }
        self.request(|reply| Command::Stop { reply }).await?
    }

    /// Closes the device and ends the session. Fires `on_camera_closed`
    /// once; later calls do nothing.
    pub async fn release(&self) {
        if !self.shared.request_release() {
            return;
        }
        log::info!("Releasing camera helper");

        let (reply, response) = oneshot::channel();
        if self
            .commands
            .send(Command::Release { reply: Some(reply) })
            .is_ok()
        {
            // The worker exits right after this reply
            if response.await.is_err() {
                log::warn!("Camera worker exited before confirming release");
            }
        }
    }

    /// Swaps to the camera facing the other way. Completion is reported
    /// through `on_camera_opened` and `on_configuration_changed`, failure
    /// through `on_camera_error`.
    pub fn switch_camera(&self) -> Result<(), CameraError> {
        self.ensure_not_released()?;
        self.shared.with_state(|state| {
            if !state.has_session() {
                return Err(CameraError::invalid_state("no open camera session"));
            }
            self.commands
                .send(Command::Switch)
                .map_err(|_| CameraError::worker_gone())?;
            *state = SessionState::Switching;
            Ok(())
        })
    }

    /// Applies a flash mode. Returns whether it is now active; unsupported
    /// modes and closed sessions yield `false` without any callback.
    pub async fn set_flash_mode(&self, mode: FlashMode) -> bool {
        if self.shared.is_released() || !self.shared.state().has_session() {
            return false;
        }
        self.request(|reply| Command::SetFlash { mode, reply })
            .await
            .unwrap_or(false)
    }

    /// Requests a still capture and returns its request id. The result
    /// arrives through `on_picture_taken`, or `on_camera_error` when the
    /// capture fails.
    pub fn take_picture(&self) -> Result<Uuid, CameraError> {
        self.ensure_not_released()?;
        if self.shared.capture_in_flight() {
            return Err(CameraError::CaptureInProgress);
        }
        self.shared.with_state(|state| {
            match *state {
                SessionState::Previewing => {}
                SessionState::Capturing => return Err(CameraError::CaptureInProgress),
                SessionState::Switching => {
                    return Err(CameraError::invalid_state("camera switch in progress"))
                }
                _ => return Err(CameraError::invalid_state("preview is not running")),
            }
            if !self.shared.begin_capture() {
                return Err(CameraError::CaptureInProgress);
            }

            let request_id = Uuid::new_v4();
            if self
                .commands
                .send(Command::TakePicture { request_id })
                .is_err()
            {
                self.shared.end_capture();
                return Err(CameraError::worker_gone());
            }
            *state = SessionState::Capturing;
            log::debug!("Capture {} requested", request_id);
            Ok(request_id)
        })
    }

    /// Reports a new screen rotation. The orientation and preview transform
    /// are recomputed and `on_configuration_changed` fires.
    pub fn update_display_rotation(&self, rotation: Rotation) -> Result<(), CameraError> {
        self.ensure_not_released()?;
        self.commands
            .send(Command::UpdateRotation { rotation })
            .map_err(|_| CameraError::worker_gone())
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Flash mode currently active on the open device
    pub fn flash_mode(&self) -> FlashMode {
        self.shared.flash_mode()
    }

    /// Display orientation of the open device, `None` while nothing is open
    pub fn display_orientation(&self) -> Option<u32> {
        self.shared.display_orientation()
    }

    pub fn current_device(&self) -> Option<DeviceInfo> {
        self.shared.device()
    }
}

impl std::fmt::Debug for CameraHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraHelper")
            .field("state", &self.shared.state())
            .field("device", &self.shared.device())
            .field("flash_mode", &self.shared.flash_mode())
            .finish()
    }
}

impl Drop for CameraHelper {
    fn drop(&mut self) {
        if self.shared.request_release() {
            log::debug!("Camera helper dropped without release, closing device");
            let _ = self.commands.send(Command::Release { reply: None });
        }
    }
}
