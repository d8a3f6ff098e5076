//! Preview binding: preview size selection and surface transform.

use crate::types::{FrameBuffer, PreviewTransform, Size};
use std::sync::Mutex;

/// A live rendering target for streamed frames.
pub trait PreviewSurface: Send + Sync {
    /// Measured size of the surface in pixels
    fn size(&self) -> Size;

    /// Called whenever the preview resolution, orientation or mirroring changes
    fn set_transform(&self, transform: &PreviewTransform);

    /// Called on the device worker for every streamed frame
    fn present(&self, _frame: &FrameBuffer) {}
}

/// Outcome of preview size selection.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewSizeChoice {
    /// A supported size close enough to the target
    Matched(Size),
    /// Nothing close enough; `size` is what the device will use anyway
    Fallback { size: Size, reason: String },
}

impl PreviewSizeChoice {
    pub fn size(&self) -> Size {
        match self {
            PreviewSizeChoice::Matched(size) => *size,
            PreviewSizeChoice::Fallback { size, .. } => *size,
        }
    }
}

/// Picks the supported preview size closest to `target`.
///
/// A `specific` size wins when the device supports it. Otherwise the size
/// with the nearest short/long aspect ratio is chosen, ties broken by the
/// nearest area. When even the best ratio is off by more than `tolerance`,
/// the smallest supported size is returned as a fallback.
pub fn choose_preview_size(
    supported: &[Size],
    target: Size,
    specific: Option<Size>,
    tolerance: f32,
) -> PreviewSizeChoice {
    if supported.is_empty() {
        return PreviewSizeChoice::Fallback {
            size: target,
            reason: "device reported no preview sizes".to_string(),
        };
    }

    if let Some(specific) = specific {
        if supported.contains(&specific) {
            return PreviewSizeChoice::Matched(specific);
        }
        log::debug!("Requested preview size {} not supported, matching by aspect", specific);
    }

    let target_ratio = target.short_long_ratio();
    let aspect_diff = |s: &Size| (s.short_long_ratio() - target_ratio).abs();
    let area_diff = |s: &Size| s.area().abs_diff(target.area());

    let best = supported
        .iter()
        .filter(|s| !s.is_empty())
        .min_by(|a, b| {
            aspect_diff(a)
                .total_cmp(&aspect_diff(b))
                .then_with(|| area_diff(a).cmp(&area_diff(b)))
        });

    match best {
        Some(best) if aspect_diff(best) <= tolerance => PreviewSizeChoice::Matched(*best),
        _ => {
            let smallest = supported
                .iter()
                .filter(|s| !s.is_empty())
                .min_by_key(|s| s.area())
                .copied()
                .unwrap_or(target);
            PreviewSizeChoice::Fallback {
                size: smallest,
                reason: format!("no supported preview size close to {}", target),
            }
        }
    }
}

/// Computes how the preview must be drawn so it fills the surface upright
/// without stretching. Overflowing content is center-cropped.
pub fn compute_transform(
    preview: Size,
    surface: Size,
    display_orientation: u32,
    mirrored: bool,
) -> PreviewTransform {
    let displayed = if display_orientation % 180 == 90 {
        preview.transposed()
    } else {
        preview
    };

    let (mut scale_x, scale_y) = if displayed.is_empty() || surface.is_empty() {
        (1.0, 1.0)
    } else {
        let content_aspect = displayed.width as f32 / displayed.height as f32;
        let surface_aspect = surface.width as f32 / surface.height as f32;
        if content_aspect > surface_aspect {
            (content_aspect / surface_aspect, 1.0)
        } else {
            (1.0, surface_aspect / content_aspect)
        }
    };
    if mirrored {
        scale_x = -scale_x;
    }

    PreviewTransform {
        preview_size: preview,
        surface_size: surface,
        rotation_degrees: display_orientation % 360,
        mirrored,
        scale_x,
        scale_y,
    }
}

/// Surface that renders nowhere but remembers what it was told.
///
/// Useful for headless hosts and tests.
#[derive(Debug)]
pub struct OffscreenSurface {
    size: Size,
    state: Mutex<OffscreenState>,
}

#[derive(Debug, Default)]
struct OffscreenState {
    transform: Option<PreviewTransform>,
    frames_presented: u64,
}

impl OffscreenSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            state: Mutex::new(OffscreenState::default()),
        }
    }

    pub fn transform(&self) -> Option<PreviewTransform> {
        self.state.lock().ok().and_then(|s| s.transform)
    }

    pub fn frames_presented(&self) -> u64 {
        self.state.lock().map(|s| s.frames_presented).unwrap_or(0)
    }
}

impl PreviewSurface for OffscreenSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn set_transform(&self, transform: &PreviewTransform) {
        if let Ok(mut state) = self.state.lock() {
            state.transform = Some(*transform);
        }
    }

    fn present(&self, _frame: &FrameBuffer) {
        if let Ok(mut state) = self.state.lock() {
            state.frames_presented = state.frames_presented.saturating_add(1);
        }
    }
}
