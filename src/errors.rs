use thiserror::Error;

/// Errors raised by the camera helper.
///
/// Lifecycle and construction errors are returned directly from the
/// operation that caused them. Device failures that happen on the worker
/// thread are delivered through `CameraListener::on_camera_error` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),
    #[error("Permission denied error: {0}")]
    PermissionDenied(String),
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Capture already in progress")]
    CaptureInProgress,
    #[error("Capture error: {0}")]
    CaptureFailure(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Fieldless discriminant of [`CameraError`], handy for matching in hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    DeviceUnavailable,
    PermissionDenied,
    InvalidState,
    CaptureInProgress,
    CaptureFailure,
    Unsupported,
}

impl CameraError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CameraError::Configuration(_) => ErrorKind::Configuration,
            CameraError::DeviceUnavailable(_) => ErrorKind::DeviceUnavailable,
            CameraError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            CameraError::InvalidState(_) => ErrorKind::InvalidState,
            CameraError::CaptureInProgress => ErrorKind::CaptureInProgress,
            CameraError::CaptureFailure(_) => ErrorKind::CaptureFailure,
            CameraError::Unsupported(_) => ErrorKind::Unsupported,
        }
    }

    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        CameraError::InvalidState(message.into())
    }

    pub(crate) fn released() -> Self {
        CameraError::InvalidState("camera helper has been released".to_string())
    }

    pub(crate) fn worker_gone() -> Self {
        CameraError::InvalidState("device worker is not running".to_string())
    }
}
