//! Display orientation math.
//!
//! The display orientation is the clockwise rotation to apply to
//! sensor-native pixels so they appear upright on the current screen.

use crate::types::{CameraFacing, Rotation};

/// Truncates an arbitrary offset to a whole number of quarter turns.
pub fn normalize_additional_rotation(additional: i32) -> i32 {
    (additional / 90) * 90
}

/// Computes the display orientation for a sensor.
///
/// Front cameras are mirrored by the sensor pipeline, so the rotation sign is
/// flipped for them. The result is always in `[0, 360)`.
pub fn display_orientation(
    sensor_orientation: u32,
    facing: CameraFacing,
    rotation: Rotation,
    additional_rotation: i32,
) -> u32 {
    let additional = normalize_additional_rotation(additional_rotation).rem_euclid(360);
    let degrees = rotation.degrees() as i32 + additional;
    let sensor = (sensor_orientation % 360) as i32;
    let result = match facing {
        CameraFacing::Front => {
            let r = (sensor + degrees).rem_euclid(360);
            (360 - r) % 360
        }
        CameraFacing::Back => (sensor - degrees).rem_euclid(360),
    };
    result as u32
}

/// Rotation to apply to a captured image so it comes out upright.
pub fn upright_rotation(display_orientation: u32) -> u32 {
    (360 - display_orientation % 360) % 360
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_camera_portrait() {
        // Typical phone back sensor mounted at 90 degrees
        assert_eq!(
            display_orientation(90, CameraFacing::Back, Rotation::Rotate0, 0),
            90
        );
        assert_eq!(
            display_orientation(90, CameraFacing::Back, Rotation::Rotate90, 0),
            0
        );
        assert_eq!(
            display_orientation(90, CameraFacing::Back, Rotation::Rotate270, 0),
            180
        );
    }

    #[test]
    fn test_front_camera_portrait() {
        assert_eq!(
            display_orientation(270, CameraFacing::Front, Rotation::Rotate0, 0),
            90
        );
        assert_eq!(
            display_orientation(270, CameraFacing::Front, Rotation::Rotate90, 0),
            0
        );
    }

    #[test]
    fn test_additional_rotation_is_truncated() {
        assert_eq!(normalize_additional_rotation(135), 90);
        assert_eq!(normalize_additional_rotation(-100), -90);
        assert_eq!(
            display_orientation(0, CameraFacing::Back, Rotation::Rotate0, 100),
            270
        );
        assert_eq!(
            display_orientation(0, CameraFacing::Back, Rotation::Rotate0, -450),
            90
        );
    }

    #[test]
    fn test_extreme_additional_rotation_does_not_overflow() {
        assert_eq!(
            display_orientation(90, CameraFacing::Back, Rotation::Rotate90, i32::MAX),
            270
        );
        assert_eq!(
            display_orientation(0, CameraFacing::Back, Rotation::Rotate0, i32::MIN),
            90
        );
        assert_eq!(
            display_orientation(270, CameraFacing::Front, Rotation::Rotate270, i32::MAX),
            90
        );
    }

    #[test]
    fn test_upright_rotation() {
        assert_eq!(upright_rotation(0), 0);
        assert_eq!(upright_rotation(90), 270);
        assert_eq!(upright_rotation(180), 180);
        assert_eq!(upright_rotation(270), 90);
    }
}
