//! camerahelper: camera session helper
//!
//! This crate owns a camera device on a dedicated worker thread, binds it to
//! a live preview surface, keeps orientation and mirroring straight across
//! screen rotations and camera switches, and produces still captures in
//! either compressed (JPEG) or raw planar (NV21) form.
//!
//! # Features
//! - Open, preview, switch and release cameras by facing
//! - Preview size matching and center-crop transforms
//! - Still capture with upright decoding for raw captures
//! - Listener callbacks marshaled onto the host's UI context
//! - Synthetic backend for hosts and tests without hardware
//! - Real devices through `nokhwa` with the `native` feature
//!
//! # Usage
//! ```no_run
//! use camerahelper::testing::SimulatedBackend;
//! use camerahelper::{CameraConfig, CameraHelper, ChannelListener, OffscreenSurface};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), camerahelper::CameraError> {
//! let (listener, events) = ChannelListener::new();
//! let config = CameraConfig::builder()
//!     .preview_size(1080, 1920)
//!     .rotation(0)
//!     .preview_on(Arc::new(OffscreenSurface::new(1080, 1920)))
//!     .listener(Arc::new(listener))
//!     .build()?;
//!
//! let (helper, mut ui) = CameraHelper::with_ui_loop(config, Arc::new(SimulatedBackend::phone()))?;
//! helper.init().await?;
//! helper.start().await?;
//! helper.take_picture()?;
//!
//! // Listener callbacks run wherever the UI loop is driven
//! ui.run_one().await;
//! for event in events.try_iter() {
//!     println!("{}", event.name());
//! }
//! helper.release().await;
//! # Ok(())
//! # }
//! ```
pub mod builder;
pub mod capture;
pub mod codec;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod helper;
pub mod listener;
pub mod orientation;
pub mod platform;
pub mod preview;
pub mod types;

// Testing utilities - synthetic frames and a scriptable backend
pub mod testing;

// Re-exports for convenience
pub use builder::{CameraConfig, CameraConfigBuilder};
pub use config::HelperSettings;
pub use dispatch::{ui_channel, UiDispatcher, UiExecutor, UiLoop, UiTask};
pub use errors::{CameraError, ErrorKind};
pub use helper::{CameraHelper, SessionState};
pub use listener::{CameraEvent, CameraListener, ChannelListener};
pub use platform::{CameraBackend, CameraDevice};
pub use preview::{OffscreenSurface, PreviewSurface};
pub use types::{
    CameraFacing, CaptureResult, DeviceInfo, FlashMode, FrameBuffer, PictureEncoding,
    PixelLayout, PreviewTransform, Rotation, Size,
};

#[cfg(feature = "native")]
pub use platform::NativeBackend;

/// Initialize logging for the camera helper
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camerahelper=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        native_backend: cfg!(feature = "native"),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub native_backend: bool,
}
