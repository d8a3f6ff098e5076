//! Testing utilities
//!
//! Synthetic frames and a scriptable backend for exercising the helper
//! without camera hardware.

pub mod simulated;
pub mod synthetic_data;

pub use simulated::{SimulatedBackend, SimulatedCamera};
pub use synthetic_data::{synthetic_jpeg_frame, synthetic_nv21_frame, synthetic_rgb_frame};
