//! Property-based tests for pixel conversion

use camerahelper::codec::{decode_jpeg, nv21_len, nv21_to_jpeg, nv21_to_rgb, rgb_to_nv21};
use camerahelper::testing::synthetic_rgb_frame;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// NV21 -> JPEG -> decode keeps the frame dimensions, odd sizes included
    #[test]
    fn jpeg_trip_preserves_dimensions(
        width in 1u32..96,
        height in 1u32..96,
        quality in 1u8..=100,
        frame in 0u64..256,
    ) {
        let nv21 = rgb_to_nv21(&synthetic_rgb_frame(frame, width, height));
        prop_assert_eq!(nv21.len(), nv21_len(width, height));

        let jpeg = nv21_to_jpeg(&nv21, width, height, quality).unwrap();
        let decoded = decode_jpeg(&jpeg).unwrap();
        prop_assert_eq!(decoded.dimensions(), (width, height));
    }

    /// Short buffers are rejected instead of read out of bounds
    #[test]
    fn short_buffers_rejected(width in 2u32..64, height in 2u32..64, missing in 1usize..16) {
        let len = nv21_len(width, height);
        let data = vec![128u8; len.saturating_sub(missing)];
        prop_assert!(nv21_to_rgb(&data, width, height).is_err());
    }
}
