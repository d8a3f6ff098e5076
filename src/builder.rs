//! Immutable session configuration and its validating builder.

use crate::config::HelperSettings;
use crate::errors::CameraError;
use crate::listener::CameraListener;
use crate::preview::PreviewSurface;
use crate::types::{CameraFacing, PictureEncoding, Rotation, Size};
use std::sync::Arc;

/// Configuration for one [`crate::CameraHelper`].
///
/// Built once through [`CameraConfig::builder`]; every field is fixed for the
/// lifetime of the helper except the facing, which `switch_camera` flips at
/// runtime without touching this value.
#[derive(Clone)]
pub struct CameraConfig {
    preview_size: Size,
    rotation: Rotation,
    additional_rotation: i32,
    camera_facing: CameraFacing,
    mirror: bool,
    picture_encoding: PictureEncoding,
    specific_preview_size: Option<Size>,
    preview_surface: Arc<dyn PreviewSurface>,
    listener: Arc<dyn CameraListener>,
    settings: HelperSettings,
}

impl CameraConfig {
    pub fn builder() -> CameraConfigBuilder {
        CameraConfigBuilder::default()
    }

    pub fn preview_size(&self) -> Size {
        self.preview_size
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn additional_rotation(&self) -> i32 {
        self.additional_rotation
    }

    pub fn camera_facing(&self) -> CameraFacing {
        self.camera_facing
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    pub fn picture_encoding(&self) -> PictureEncoding {
        self.picture_encoding
    }

    pub fn specific_preview_size(&self) -> Option<Size> {
        self.specific_preview_size
    }

    pub fn preview_surface(&self) -> &Arc<dyn PreviewSurface> {
        &self.preview_surface
    }

    pub fn listener(&self) -> &Arc<dyn CameraListener> {
        &self.listener
    }

    pub fn settings(&self) -> &HelperSettings {
        &self.settings
    }
}

impl std::fmt::Debug for CameraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraConfig")
            .field("preview_size", &self.preview_size)
            .field("rotation", &self.rotation)
            .field("additional_rotation", &self.additional_rotation)
            .field("camera_facing", &self.camera_facing)
            .field("mirror", &self.mirror)
            .field("picture_encoding", &self.picture_encoding)
            .field("specific_preview_size", &self.specific_preview_size)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct CameraConfigBuilder {
    preview_size: Option<Size>,
    rotation_degrees: Option<u32>,
    additional_rotation: i32,
    camera_facing: Option<CameraFacing>,
    mirror: bool,
    picture_encoding: PictureEncoding,
    specific_preview_size: Option<Size>,
    preview_surface: Option<Arc<dyn PreviewSurface>>,
    listener: Option<Arc<dyn CameraListener>>,
    settings: Option<HelperSettings>,
}

impl CameraConfigBuilder {
    /// Measured size of the preview surface. Required and non-zero.
    pub fn preview_size(mut self, width: u32, height: u32) -> Self {
        self.preview_size = Some(Size::new(width, height));
        self
    }

    /// Screen rotation in degrees: 0, 90, 180 or 270
    pub fn rotation(mut self, degrees: u32) -> Self {
        self.rotation_degrees = Some(degrees);
        self
    }

    /// Extra rotation offset, truncated to whole quarter turns
    pub fn additional_rotation(mut self, degrees: i32) -> Self {
        self.additional_rotation = degrees;
        self
    }

    /// Facing to open on `init`. Defaults to the back camera.
    pub fn camera_facing(mut self, facing: CameraFacing) -> Self {
        self.camera_facing = Some(facing);
        self
    }

    pub fn mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn picture_encoding(mut self, encoding: PictureEncoding) -> Self {
        self.picture_encoding = encoding;
        self
    }

    /// Preview resolution to use verbatim when the device supports it
    pub fn specific_preview_size(mut self, width: u32, height: u32) -> Self {
        self.specific_preview_size = Some(Size::new(width, height));
        self
    }

    pub fn preview_on(mut self, surface: Arc<dyn PreviewSurface>) -> Self {
        self.preview_surface = Some(surface);
        self
    }

    pub fn listener(mut self, listener: Arc<dyn CameraListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn settings(mut self, settings: HelperSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<CameraConfig, CameraError> {
        let preview_size = self
            .preview_size
            .ok_or_else(|| CameraError::Configuration("preview size is required".to_string()))?;
        if preview_size.is_empty() {
            return Err(CameraError::Configuration(format!(
                "preview size must be non-zero, got {}",
                preview_size
            )));
        }

        let rotation = match self.rotation_degrees.unwrap_or(0) {
            degrees @ (0 | 90 | 180 | 270) => Rotation::from_degrees(degrees as i32),
            other => {
                return Err(CameraError::Configuration(format!(
                    "rotation must be 0, 90, 180 or 270 degrees, got {}",
                    other
                )))
            }
        };

        if let Some(specific) = self.specific_preview_size {
            if specific.is_empty() {
                return Err(CameraError::Configuration(
                    "specific preview size must be non-zero".to_string(),
                ));
            }
        }

        let preview_surface = self.preview_surface.ok_or_else(|| {
            CameraError::Configuration("preview surface is required".to_string())
        })?;
        let listener = self
            .listener
            .ok_or_else(|| CameraError::Configuration("listener is required".to_string()))?;

        let settings = self.settings.unwrap_or_default();
        settings.validate().map_err(CameraError::Configuration)?;

        Ok(CameraConfig {
            preview_size,
            rotation,
            additional_rotation: self.additional_rotation,
            camera_facing: self.camera_facing.unwrap_or(CameraFacing::Back),
            mirror: self.mirror,
            picture_encoding: self.picture_encoding,
            specific_preview_size: self.specific_preview_size,
            preview_surface,
            listener,
            settings,
        })
    }
}
