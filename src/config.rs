//! Runtime settings for the camera helper
//!
//! Settings are the tunables a host may want to keep in a file: JPEG
//! quality, preview size matching tolerance, worker naming. Per-session
//! choices such as facing or rotation live in [`crate::builder::CameraConfig`].

use crate::errors::CameraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperSettings {
    pub capture: CaptureSettings,
    pub preview: PreviewSettings,
    pub worker: WorkerSettings,
}

/// Still capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// JPEG quality used when the pipeline compresses NV21 frames (1-100)
    pub jpeg_quality: u8,
}

/// Preview binding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSettings {
    /// Largest accepted difference between the short/long ratios of the
    /// target surface and the chosen preview size
    pub aspect_tolerance: f32,
    /// How long the worker waits for commands when the device has no
    /// preview frame ready, in milliseconds
    pub idle_poll_ms: u64,
}

/// Device worker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSettings {
    pub thread_name: String,
}

impl Default for HelperSettings {
    fn default() -> Self {
        Self {
            capture: CaptureSettings { jpeg_quality: 100 },
            preview: PreviewSettings {
                aspect_tolerance: 0.2,
                idle_poll_ms: 10,
            },
            worker: WorkerSettings {
                thread_name: "camerahelper-device".to_string(),
            },
        }
    }
}

impl HelperSettings {
    /// Load settings from a TOML file, falling back to defaults when the
    /// file does not exist
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Settings file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CameraError::Configuration(format!("Failed to read settings file: {}", e))
        })?;

        let settings: HelperSettings = toml::from_str(&contents).map_err(|e| {
            CameraError::Configuration(format!("Failed to parse settings file: {}", e))
        })?;

        settings.validate().map_err(CameraError::Configuration)?;

        log::info!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::Configuration(format!("Failed to create settings directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CameraError::Configuration(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CameraError::Configuration(format!("Failed to write settings file: {}", e))
        })?;

        log::info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("camerahelper.toml")
    }

    /// Load from the default location or use defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load settings, using defaults: {}", e);
            Self::default()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err("JPEG quality must be between 1 and 100".to_string());
        }
        if !(0.0..=1.0).contains(&self.preview.aspect_tolerance) {
            return Err("Aspect tolerance must be between 0.0 and 1.0".to_string());
        }
        if self.preview.idle_poll_ms == 0 || self.preview.idle_poll_ms > 1000 {
            return Err("Idle poll interval must be between 1 and 1000 ms".to_string());
        }
        if self.worker.thread_name.trim().is_empty() {
            return Err("Worker thread name must not be empty".to_string());
        }
        Ok(())
    }
}
