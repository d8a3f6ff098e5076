//! Shared fixtures for the helper integration tests

#![allow(dead_code)]

use camerahelper::testing::SimulatedBackend;
use camerahelper::{
    CameraConfig, CameraConfigBuilder, CameraEvent, CameraHelper, ChannelListener,
    OffscreenSurface, UiLoop,
};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;

pub const SURFACE_WIDTH: u32 = 480;
pub const SURFACE_HEIGHT: u32 = 640;

pub struct Harness {
    pub helper: CameraHelper,
    pub ui: UiLoop,
    pub events: Receiver<CameraEvent>,
    pub backend: SimulatedBackend,
    pub surface: Arc<OffscreenSurface>,
}

/// A fast simulated phone, portrait surface
pub fn phone() -> SimulatedBackend {
    SimulatedBackend::phone().with_frame_interval(Duration::from_millis(2))
}

pub fn harness(
    backend: SimulatedBackend,
    configure: impl FnOnce(CameraConfigBuilder) -> CameraConfigBuilder,
) -> Harness {
    let (listener, events) = ChannelListener::new();
    let surface = Arc::new(OffscreenSurface::new(SURFACE_WIDTH, SURFACE_HEIGHT));
    let builder = CameraConfig::builder()
        .preview_size(SURFACE_WIDTH, SURFACE_HEIGHT)
        .preview_on(surface.clone())
        .listener(Arc::new(listener));
    let config = configure(builder).build().expect("valid config");
    let (helper, ui) =
        CameraHelper::with_ui_loop(config, Arc::new(backend.clone())).expect("helper");
    Harness {
        helper,
        ui,
        events,
        backend,
        surface,
    }
}

impl Harness {
    /// Runs every queued UI task and returns what the listener saw
    pub fn drain(&mut self) -> Vec<CameraEvent> {
        self.ui.run_pending();
        self.events.try_iter().collect()
    }

    /// Drives the UI loop until an event matching `done` arrives. Returns
    /// everything seen up to and including it.
    pub async fn pump_until(&mut self, done: impl Fn(&CameraEvent) -> bool) -> Vec<CameraEvent> {
        let mut seen = Vec::new();
        loop {
            for event in self.events.try_iter() {
                let finished = done(&event);
                seen.push(event);
                if finished {
                    return seen;
                }
            }
            let ran = tokio::time::timeout(Duration::from_secs(10), self.ui.run_one())
                .await
                .expect("timed out waiting for camera event");
            assert!(ran, "UI loop closed while waiting, saw {:?}", names(&seen));
        }
    }

    /// Polls `check` until it holds
    pub async fn wait_for(&mut self, check: impl Fn(&Harness) -> bool) {
        for _ in 0..1000 {
            self.ui.run_pending();
            if check(self) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }
}

pub fn names(events: &[CameraEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.name()).collect()
}

pub fn count(events: &[CameraEvent], name: &str) -> usize {
    events.iter().filter(|e| e.name() == name).count()
}
