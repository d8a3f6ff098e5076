#[cfg(test)]
mod error_tests {
    use camerahelper::errors::{CameraError, ErrorKind};
    use std::error::Error;

    #[test]
    fn test_camera_error_configuration() {
        let error = CameraError::Configuration("preview size is required".to_string());
        assert!(error.to_string().contains("Configuration error"));
        assert!(error.to_string().contains("preview size is required"));
    }

    #[test]
    fn test_camera_error_permission_denied() {
        let error = CameraError::PermissionDenied("Access denied".to_string());
        assert!(error.to_string().contains("Permission denied"));
        assert!(error.to_string().contains("Access denied"));
    }

    #[test]
    fn test_camera_error_capture() {
        let error = CameraError::CaptureFailure("Capture failed".to_string());
        assert_eq!(error.to_string(), "Capture error: Capture failed");
    }

    #[test]
    fn test_capture_in_progress_message() {
        assert_eq!(
            CameraError::CaptureInProgress.to_string(),
            "Capture already in progress"
        );
    }

    #[test]
    fn test_camera_error_debug_format() {
        let error = CameraError::DeviceUnavailable("Debug test".to_string());
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("DeviceUnavailable"));
        assert!(debug_str.contains("Debug test"));
    }

    #[test]
    fn test_camera_error_is_std_error() {
        let error = CameraError::InvalidState("Trait test".to_string());
        let std_error: &dyn Error = &error;
        assert!(std_error.source().is_none());
        assert!(std_error.to_string().contains("Invalid state"));
    }

    #[test]
    fn test_error_kinds() {
        let cases = vec![
            (CameraError::Configuration(String::new()), ErrorKind::Configuration),
            (CameraError::DeviceUnavailable(String::new()), ErrorKind::DeviceUnavailable),
            (CameraError::PermissionDenied(String::new()), ErrorKind::PermissionDenied),
            (CameraError::InvalidState(String::new()), ErrorKind::InvalidState),
            (CameraError::CaptureInProgress, ErrorKind::CaptureInProgress),
            (CameraError::CaptureFailure(String::new()), ErrorKind::CaptureFailure),
            (CameraError::Unsupported(String::new()), ErrorKind::Unsupported),
        ];
        for (error, kind) in cases {
            assert_eq!(error.kind(), kind);
        }
    }

    #[test]
    fn test_camera_error_clone_and_eq() {
        let error = CameraError::Unsupported("flash mode RedEye".to_string());
        assert_eq!(error.clone(), error);
        assert_ne!(error, CameraError::CaptureInProgress);
    }

    #[test]
    fn test_anyhow_conversion() {
        let result: anyhow::Result<()> =
            Err(CameraError::DeviceUnavailable("no front camera".to_string()).into());
        let err = result.unwrap_err();
        assert!(err.downcast_ref::<CameraError>().is_some());
    }
}
