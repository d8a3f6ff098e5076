//! Still capture through the full helper

mod common;

use camerahelper::codec;
use camerahelper::testing::{SimulatedBackend, SimulatedCamera};
use camerahelper::{
    CameraConfig, CameraError, CameraEvent, CameraFacing, CameraHelper, CameraListener,
    CaptureResult, DeviceInfo, FrameBuffer, OffscreenSurface, PictureEncoding, SessionState,
};
use common::{count, harness, phone};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

#[tokio::test]
async fn test_compressed_capture() {
    let mut h = harness(phone(), |b| b);
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();

    let request_id = h.helper.take_picture().unwrap();
    let events = h.pump_until(|e| e.name() == "picture_taken").await;
    let Some(CameraEvent::PictureTaken(result)) = events.last() else {
        panic!("expected picture");
    };
    assert_eq!(result.request_id, request_id);
    assert_eq!(result.encoding, PictureEncoding::Compressed);
    assert_eq!((result.width, result.height), (640, 480));
    assert_eq!(result.display_orientation, 90);
    assert!(result.image.is_none());
    let decoded = codec::decode_jpeg(&result.data).unwrap();
    assert_eq!(decoded.dimensions(), (640, 480));

    assert_eq!(h.helper.state(), SessionState::Previewing);
    h.helper.release().await;
}

#[tokio::test]
async fn test_raw_planar_capture_is_upright() {
    let mut h = harness(phone(), |b| b.picture_encoding(PictureEncoding::RawPlanar));
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();

    h.helper.take_picture().unwrap();
    let events = h.pump_until(|e| e.name() == "picture_taken").await;
    let Some(CameraEvent::PictureTaken(result)) = events.last() else {
        panic!("expected picture");
    };
    assert_eq!(result.data.len(), codec::nv21_len(640, 480));
    // orientation 90 is undone by a 270 degree turn, swapping the sides
    assert_eq!(result.image.as_ref().unwrap().dimensions(), (480, 640));
    h.helper.release().await;
}

#[tokio::test]
async fn test_device_jpeg_passes_through() {
    let backend = SimulatedBackend::new()
        .with_frame_interval(Duration::from_millis(2))
        .with_camera(
            SimulatedCamera::new(DeviceInfo::new(0, "back", CameraFacing::Back)).with_jpeg(true),
        );
    let mut h = harness(backend, |b| b);
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();

    h.helper.take_picture().unwrap();
    let events = h.pump_until(|e| e.name() == "picture_taken").await;
    let Some(CameraEvent::PictureTaken(result)) = events.last() else {
        panic!("expected picture");
    };
    assert_eq!(&result.data[..2], &[0xFF, 0xD8]);
    h.helper.release().await;
}

#[tokio::test]
async fn test_second_capture_while_in_flight() {
    let mut h = harness(phone(), |b| b);
    h.backend.set_capture_delay(Duration::from_millis(50));
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();

    h.helper.take_picture().unwrap();
    assert!(matches!(
        h.helper.take_picture(),
        Err(CameraError::CaptureInProgress)
    ));

    let events = h.pump_until(|e| e.name() == "picture_taken").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    let later = h.drain();
    assert_eq!(count(&events, "picture_taken") + count(&later, "picture_taken"), 1);
    assert_eq!(count(&events, "error") + count(&later, "error"), 0);
    assert_eq!(h.backend.captures_served(), 1);

    // the slot is free again once the result was delivered
    h.helper.take_picture().unwrap();
    h.pump_until(|e| e.name() == "picture_taken").await;
    h.helper.release().await;
}

#[tokio::test]
async fn test_capture_requires_preview() {
    let h = harness(phone(), |b| b);
    assert!(matches!(
        h.helper.take_picture(),
        Err(CameraError::InvalidState(_))
    ));
    h.helper.init().await.unwrap();
    assert!(matches!(
        h.helper.take_picture(),
        Err(CameraError::InvalidState(_))
    ));
    h.helper.release().await;
}

#[tokio::test]
async fn test_empty_capture_reports_error() {
    let mut h = harness(phone(), |b| b);
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();
    h.backend.inject_empty_captures(1);

    h.helper.take_picture().unwrap();
    let events = h.pump_until(|e| e.name() == "error").await;
    assert!(matches!(
        events.last(),
        Some(CameraEvent::Error(CameraError::CaptureFailure(_)))
    ));
    assert_eq!(count(&events, "picture_taken"), 0);

    h.helper.take_picture().unwrap();
    h.pump_until(|e| e.name() == "picture_taken").await;
    h.helper.release().await;
}

#[tokio::test]
async fn test_capture_during_switch_is_rejected() {
    let mut h = harness(phone(), |b| b);
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();

    h.helper.switch_camera().unwrap();
    assert!(matches!(
        h.helper.take_picture(),
        Err(CameraError::InvalidState(_))
    ));
    h.pump_until(|e| e.name() == "configuration_changed").await;
    h.wait_for(|h| h.helper.state() == SessionState::Previewing).await;
    assert!(h.helper.take_picture().is_ok());
    h.pump_until(|e| e.name() == "picture_taken").await;
    h.helper.release().await;
}

#[tokio::test]
async fn test_release_after_capture_delivers_picture_then_closed() {
    let mut h = harness(phone(), |b| b);
    h.helper.init().await.unwrap();
    h.helper.start().await.unwrap();

    h.helper.take_picture().unwrap();
    h.helper.release().await;
    let events = h.drain();
    let tail: Vec<&str> = events.iter().rev().take(2).map(|e| e.name()).collect();
    assert_eq!(tail, vec!["closed", "picture_taken"]);
}

#[derive(Default)]
struct ThreadRecorder {
    picture_threads: Mutex<Vec<ThreadId>>,
    preview_thread_names: Mutex<Vec<Option<String>>>,
}

impl CameraListener for ThreadRecorder {
    fn on_preview_frame(&self, _frame: &FrameBuffer) {
        let name = std::thread::current().name().map(str::to_string);
        self.preview_thread_names.lock().unwrap().push(name);
    }

    fn on_picture_taken(&self, _result: CaptureResult) {
        self.picture_threads
            .lock()
            .unwrap()
            .push(std::thread::current().id());
    }
}

#[tokio::test]
async fn test_callbacks_run_on_expected_threads() {
    let recorder = Arc::new(ThreadRecorder::default());
    let config = CameraConfig::builder()
        .preview_size(480, 640)
        .preview_on(Arc::new(OffscreenSurface::new(480, 640)))
        .listener(recorder.clone())
        .build()
        .unwrap();
    let (helper, mut ui) = CameraHelper::with_ui_loop(config, Arc::new(phone())).unwrap();
    helper.init().await.unwrap();
    helper.start().await.unwrap();
    helper.take_picture().unwrap();

    let ui_thread = std::thread::current().id();
    for _ in 0..1000 {
        ui.run_pending();
        let pictured = !recorder.picture_threads.lock().unwrap().is_empty();
        let previewed = !recorder.preview_thread_names.lock().unwrap().is_empty();
        if pictured && previewed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    helper.release().await;

    assert_eq!(*recorder.picture_threads.lock().unwrap(), vec![ui_thread]);
    let preview_threads = recorder.preview_thread_names.lock().unwrap();
    assert!(!preview_threads.is_empty());
    assert!(preview_threads
        .iter()
        .all(|name| name.as_deref() == Some("camerahelper-device")));
}
