//! Plain data types shared by the session, the preview binder and the
//! capture pipeline.

use serde::{Deserialize, Serialize};

/// Which direction a camera sensor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraFacing {
    /// World-facing camera
    Back,
    /// User-facing camera
    Front,
}

impl CameraFacing {
    /// The other facing, used by `switch_camera`
    pub fn opposite(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFacing::Back => "back",
            CameraFacing::Front => "front",
        }
    }
}

impl std::fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlashMode {
    #[default]
    Off,
    /// Fires during still capture
    On,
    /// Device decides per capture
    Auto,
    /// LED stays on continuously
    Torch,
    RedEye,
}

/// Output encoding requested for still captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PictureEncoding {
    /// JPEG bytes
    #[default]
    Compressed,
    /// NV21 planar bytes, plus an upright decoded image
    RawPlanar,
}

/// Pixel layout of a buffer produced by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelLayout {
    /// Y plane followed by interleaved V/U at 4:2:0
    Nv21,
    /// Compressed by the device itself
    Jpeg,
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Same size with width and height exchanged
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Short side over long side, always in (0, 1]
    pub fn short_long_ratio(&self) -> f32 {
        let (short, long) = if self.width <= self.height {
            (self.width, self.height)
        } else {
            (self.height, self.width)
        };
        if long == 0 {
            return 0.0;
        }
        short as f32 / long as f32
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Screen rotation reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Rotation {
    /// Normalizes any degree value to the nearest lower quarter turn.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            1 => Rotation::Rotate90,
            2 => Rotation::Rotate180,
            3 => Rotation::Rotate270,
            _ => Rotation::Rotate0,
        }
    }

    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Rotate0 => 0,
            Rotation::Rotate90 => 90,
            Rotation::Rotate180 => 180,
            Rotation::Rotate270 => 270,
        }
    }
}

/// Description of an enumerated camera device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub index: u32,
    pub name: String,
    pub facing: CameraFacing,
    /// Clockwise rotation of the sensor relative to the device's natural orientation
    pub sensor_orientation: u32,
    pub has_flash: bool,
}

impl DeviceInfo {
    pub fn new(index: u32, name: impl Into<String>, facing: CameraFacing) -> Self {
        Self {
            index,
            name: name.into(),
            facing,
            sensor_orientation: 0,
            has_flash: false,
        }
    }

    pub fn with_sensor_orientation(mut self, degrees: u32) -> Self {
        self.sensor_orientation = degrees % 360;
        self
    }

    pub fn with_flash(mut self, has_flash: bool) -> Self {
        self.has_flash = has_flash;
        self
    }
}

/// Raw pixel data delivered by a device.
///
/// Preview frames are lent to listeners by reference; a listener that needs
/// the pixels after the callback returns has to copy them.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
    /// Display orientation in effect when the frame was produced
    pub display_orientation: u32,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32, layout: PixelLayout, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout,
            data,
            display_orientation: 0,
        }
    }

    pub fn with_display_orientation(mut self, degrees: u32) -> Self {
        self.display_orientation = degrees;
        self
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of a still capture, owned by the listener once delivered.
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub request_id: uuid::Uuid,
    pub width: u32,
    pub height: u32,
    pub encoding: PictureEncoding,
    pub display_orientation: u32,
    /// JPEG bytes for `Compressed`, NV21 bytes for `RawPlanar`
    pub data: Vec<u8>,
    /// Upright image, produced for `RawPlanar` captures
    pub image: Option<image::RgbImage>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

/// How the preview content must be drawn on its surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewTransform {
    pub preview_size: Size,
    pub surface_size: Size,
    pub rotation_degrees: u32,
    pub mirrored: bool,
    /// Horizontal scale; negative when mirrored
    pub scale_x: f32,
    pub scale_y: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facing_opposite() {
        assert_eq!(CameraFacing::Front.opposite(), CameraFacing::Back);
        assert_eq!(CameraFacing::Back.opposite(), CameraFacing::Front);
        assert_eq!(CameraFacing::Front.to_string(), "front");
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(0), Rotation::Rotate0);
        assert_eq!(Rotation::from_degrees(90), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees(135), Rotation::Rotate90);
        assert_eq!(Rotation::from_degrees(-90), Rotation::Rotate270);
        assert_eq!(Rotation::from_degrees(540), Rotation::Rotate180);
    }

    #[test]
    fn test_size_ratio() {
        assert_eq!(Size::new(640, 480).short_long_ratio(), 0.75);
        assert_eq!(Size::new(480, 640).short_long_ratio(), 0.75);
        assert_eq!(Size::new(0, 0).short_long_ratio(), 0.0);
        assert!(Size::new(0, 10).is_empty());
        assert_eq!(Size::new(3, 4).transposed(), Size::new(4, 3));
    }

    #[test]
    fn test_device_info_builder() {
        let info = DeviceInfo::new(1, "cam", CameraFacing::Front)
            .with_sensor_orientation(450)
            .with_flash(true);
        assert_eq!(info.sensor_orientation, 90);
        assert!(info.has_flash);
    }

    #[test]
    fn test_flash_mode_serialization() {
        let json = serde_json::to_string(&FlashMode::Torch).unwrap();
        assert!(json.contains("Torch"));
        let back: FlashMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FlashMode::Torch);
    }
}
