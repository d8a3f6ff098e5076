//! State shared between the host-facing handle, the device worker and the
//! UI context.

use crate::dispatch::UiExecutor;
use crate::errors::CameraError;
use crate::listener::{CameraEvent, CameraListener};
use crate::types::{CaptureResult, DeviceInfo, FlashMode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle of a camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    Uninitialized,
    Opened,
    Previewing,
    Capturing,
    Switching,
    Closed,
}

impl SessionState {
    /// A device is open (or being swapped for another one)
    pub fn has_session(&self) -> bool {
        matches!(
            self,
            SessionState::Opened
                | SessionState::Previewing
                | SessionState::Capturing
                | SessionState::Switching
        )
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct Shared {
    state: Mutex<SessionState>,
    capture_in_flight: AtomicBool,
    release_requested: AtomicBool,
    closed_delivered: AtomicBool,
    flash_mode: Mutex<FlashMode>,
    display_orientation: Mutex<Option<u32>>,
    device: Mutex<Option<DeviceInfo>>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Uninitialized),
            capture_in_flight: AtomicBool::new(false),
            release_requested: AtomicBool::new(false),
            closed_delivered: AtomicBool::new(false),
            flash_mode: Mutex::new(FlashMode::Off),
            display_orientation: Mutex::new(None),
            device: Mutex::new(None),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Runs `f` with the state locked so a check and the transition it
    /// guards cannot interleave with another caller.
    pub(crate) fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = lock(&self.state);
        f(&mut state)
    }

    /// Worker-side transition. Never leaves `Closed`.
    pub(crate) fn set_state(&self, next: SessionState) {
        let mut state = lock(&self.state);
        if *state != SessionState::Closed {
            *state = next;
        }
    }

    /// Returns `true` for the first caller only.
    pub(crate) fn request_release(&self) -> bool {
        if self.release_requested.swap(true, Ordering::SeqCst) {
            return false;
        }
        *lock(&self.state) = SessionState::Closed;
        true
    }

    pub(crate) fn is_released(&self) -> bool {
        self.release_requested.load(Ordering::SeqCst)
    }

    pub(crate) fn capture_in_flight(&self) -> bool {
        self.capture_in_flight.load(Ordering::SeqCst)
    }

    /// Claims the single capture slot. `false` if it is already taken.
    pub(crate) fn begin_capture(&self) -> bool {
        self.capture_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Leaves `Capturing` once the worker is done with the device. Any
    /// other state set in the meantime is kept.
    pub(crate) fn finish_capture(&self, streaming: bool) {
        let mut state = lock(&self.state);
        if *state == SessionState::Capturing {
            *state = if streaming {
                SessionState::Previewing
            } else {
                SessionState::Opened
            };
        }
    }

    pub(crate) fn end_capture(&self) {
        self.capture_in_flight.store(false, Ordering::SeqCst);
    }

    pub(crate) fn flash_mode(&self) -> FlashMode {
        *lock(&self.flash_mode)
    }

    pub(crate) fn set_flash_mode(&self, mode: FlashMode) {
        *lock(&self.flash_mode) = mode;
    }

    pub(crate) fn display_orientation(&self) -> Option<u32> {
        *lock(&self.display_orientation)
    }

    pub(crate) fn device(&self) -> Option<DeviceInfo> {
        lock(&self.device).clone()
    }

    /// Publishes the bound device, or clears it when `None`
    pub(crate) fn set_device(&self, device: Option<(DeviceInfo, u32)>) {
        match device {
            Some((info, orientation)) => {
                *lock(&self.device) = Some(info);
                *lock(&self.display_orientation) = Some(orientation);
            }
            None => {
                *lock(&self.device) = None;
                *lock(&self.display_orientation) = None;
            }
        }
    }

    pub(crate) fn set_display_orientation(&self, orientation: u32) {
        *lock(&self.display_orientation) = Some(orientation);
    }
}

/// Posts listener callbacks to the UI context.
///
/// Once `on_camera_closed` has run, every later delivery is dropped.
#[derive(Clone)]
pub(crate) struct EventSink {
    ui: Arc<dyn UiExecutor>,
    listener: Arc<dyn CameraListener>,
    shared: Arc<Shared>,
}

impl EventSink {
    pub(crate) fn new(
        ui: Arc<dyn UiExecutor>,
        listener: Arc<dyn CameraListener>,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            ui,
            listener,
            shared,
        }
    }

    pub(crate) fn post(&self, event: CameraEvent) {
        log::debug!("Posting {} to UI", event.name());
        let listener = self.listener.clone();
        let shared = self.shared.clone();
        self.ui
            .post(Box::new(move || deliver(&shared, listener.as_ref(), event)));
    }

    pub(crate) fn error(&self, error: CameraError) {
        self.post(CameraEvent::Error(error));
    }

    /// Delivers a capture outcome and frees the capture slot on the UI
    /// context, before the listener sees the result.
    pub(crate) fn capture_outcome(&self, outcome: Result<CaptureResult, CameraError>) {
        let listener = self.listener.clone();
        let shared = self.shared.clone();
        self.ui.post(Box::new(move || {
            shared.end_capture();
            let event = match outcome {
                Ok(result) => CameraEvent::PictureTaken(result),
                Err(error) => CameraEvent::Error(error),
            };
            deliver(&shared, listener.as_ref(), event);
        }));
    }

    pub(crate) fn listener(&self) -> &dyn CameraListener {
        self.listener.as_ref()
    }
}

fn deliver(shared: &Shared, listener: &dyn CameraListener, event: CameraEvent) {
    if shared.closed_delivered.load(Ordering::SeqCst) {
        log::debug!("Dropping {} delivered after close", event.name());
        return;
    }
    if matches!(event, CameraEvent::Closed) {
        shared.closed_delivered.store(true, Ordering::SeqCst);
    }
    event.dispatch(listener);
}
