//! Anchor presets and capture-region geometry
//!
//! An anchor pairs the on-screen position of the grade indicator with the
//! display resolution it was measured at. The resolution drives a single
//! scale factor shared by the capture region and the template bank.

use serde::{Deserialize, Serialize};

/// Resolution the reference templates were cut at
pub const TEMPLATE_BASE_RESOLUTION: (u32, u32) = (3440, 1440);
/// Capture side length at the base resolution
pub const ROI_BASE_SIDE: u32 = 90;
/// Smallest capture side accepted after scaling
pub const ROI_MIN_SIDE: u32 = 20;
/// Lower bound for the resolution scale factor
pub const MIN_RESOLUTION_SCALE: f64 = 0.2;

/// Immutable calibration record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnchorPreset {
    pub label: &'static str,
    pub anchor: (i32, i32),
    pub resolution: (u32, u32),
}

const fn preset(label: &'static str, anchor: (i32, i32), resolution: (u32, u32)) -> AnchorPreset {
    AnchorPreset { label, anchor, resolution }
}

/// Built-in presets, ordered by resolution
pub const BUILTIN_PRESETS: [AnchorPreset; 23] = [
    preset("1024 x 768", (512, 712), (1024, 768)),
    preset("1152 x 864", (576, 801), (1152, 864)),
    preset("1280 x 720", (640, 668), (1280, 720)),
    preset("1280 x 768", (640, 712), (1280, 768)),
    preset("1280 x 800", (640, 742), (1280, 800)),
    preset("1280 x 960", (640, 890), (1280, 960)),
    preset("1280 x 1024", (640, 949), (1280, 1024)),
    preset("1360 x 768", (680, 712), (1360, 768)),
    preset("1366 x 768", (683, 712), (1366, 768)),
    preset("1440 x 900", (720, 834), (1440, 900)),
    preset("1440 x 1080", (720, 1001), (1440, 1080)),
    preset("1600 x 900", (800, 834), (1600, 900)),
    preset("1600 x 1024", (800, 949), (1600, 1024)),
    preset("1600 x 1200", (800, 1112), (1600, 1200)),
    preset("1680 x 1050", (840, 973), (1680, 1050)),
    preset("1920 x 1080", (960, 1001), (1920, 1080)),
    preset("1920 x 1200", (960, 1112), (1920, 1200)),
    preset("1920 x 1440", (960, 1335), (1920, 1440)),
    preset("2048 x 1536", (1024, 1424), (2048, 1536)),
    preset("2560 x 1440", (1280, 1335), (2560, 1440)),
    preset("2560 x 1600", (1280, 1483), (2560, 1600)),
    preset("3440 x 1440", (1720, 1335), (3440, 1440)),
    preset("3840 x 2160", (1920, 2002), (3840, 2160)),
];

/// Scale factor for a display resolution relative to the template base.
///
/// Only the height is used: the game scales its HUD by vertical
/// resolution. Degenerate inputs fall back to 1.0.
pub fn resolution_scale(resolution: (u32, u32), base: (u32, u32)) -> f64 {
    let (_, height) = resolution;
    let (_, base_height) = base;
    if base_height == 0 || height == 0 {
        return 1.0;
    }
    (height as f64 / base_height as f64).max(MIN_RESOLUTION_SCALE)
}

/// Screen rectangle to grab each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// Square region of the scaled base side, centered on `anchor`
    pub fn around(anchor: (i32, i32), scale: f64) -> Self {
        let side = ((ROI_BASE_SIDE as f64 * scale).round() as u32).max(ROI_MIN_SIDE);
        let half = (side / 2) as i32;
        Self {
            left: anchor.0 - half,
            top: anchor.1 - half,
            width: side,
            height: side,
        }
    }
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self::around(BUILTIN_PRESETS[0].anchor, 1.0)
    }
}

/// Everything derived from selecting one preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub index: usize,
    pub preset: AnchorPreset,
    pub scale: f64,
    pub region: CaptureRegion,
}

/// Ordered preset list, selected by index
#[derive(Debug, Clone)]
pub struct AnchorRegistry {
    presets: Vec<AnchorPreset>,
    base_resolution: (u32, u32),
}

impl AnchorRegistry {
    /// Create a registry from explicit presets
    pub fn new(presets: Vec<AnchorPreset>, base_resolution: (u32, u32)) -> Self {
        Self { presets, base_resolution }
    }

    /// Registry holding the built-in presets
    pub fn builtin() -> Self {
        Self::new(BUILTIN_PRESETS.to_vec(), TEMPLATE_BASE_RESOLUTION)
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn presets(&self) -> &[AnchorPreset] {
        &self.presets
    }

    /// Clamp an external index into range. `None` when the registry is empty.
    pub fn clamp_index(&self, index: usize) -> Option<usize> {
        if self.presets.is_empty() {
            None
        } else {
            Some(index.min(self.presets.len() - 1))
        }
    }

    /// Scale factor and capture region for the (clamped) preset at `index`
    pub fn calibrate(&self, index: usize) -> Option<Calibration> {
        let index = self.clamp_index(index)?;
        let preset = self.presets[index];
        let scale = resolution_scale(preset.resolution, self.base_resolution);
        Some(Calibration {
            index,
            preset,
            scale,
            region: CaptureRegion::around(preset.anchor, scale),
        })
    }
}

impl Default for AnchorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_resolution_is_unit_scale() {
        assert_eq!(resolution_scale((3440, 1440), TEMPLATE_BASE_RESOLUTION), 1.0);
        assert_eq!(resolution_scale((2560, 1440), TEMPLATE_BASE_RESOLUTION), 1.0);
        assert_eq!(resolution_scale((1920, 1080), TEMPLATE_BASE_RESOLUTION), 0.75);
    }

    #[test]
    fn test_scale_has_floor() {
        assert_eq!(resolution_scale((100, 100), TEMPLATE_BASE_RESOLUTION), 0.2);
        assert_eq!(resolution_scale((1920, 0), TEMPLATE_BASE_RESOLUTION), 1.0);
        assert_eq!(resolution_scale((1920, 1080), (0, 0)), 1.0);
    }

    #[test]
    fn test_region_centered_on_anchor() {
        let region = CaptureRegion::around((960, 1001), 0.75);
        // round(90 * 0.75) = 68
        assert_eq!(region.width, 68);
        assert_eq!(region.height, 68);
        assert_eq!(region.left, 926);
        assert_eq!(region.top, 967);
    }

    #[test]
    fn test_region_minimum_side() {
        let region = CaptureRegion::around((0, 0), 0.2);
        assert_eq!(region.width, ROI_MIN_SIDE);
        assert_eq!(region.left, -10);
    }

    #[test]
    fn test_calibrate_clamps_index() {
        let registry = AnchorRegistry::builtin();
        let last = registry.calibrate(999).unwrap();
        assert_eq!(last.index, registry.len() - 1);
        assert_eq!(last.preset.label, "3840 x 2160");
        assert_eq!(last.scale, 1.5);
        assert_eq!(last.region.width, 135);
    }

    #[test]
    fn test_empty_registry() {
        let registry = AnchorRegistry::new(Vec::new(), TEMPLATE_BASE_RESOLUTION);
        assert!(registry.calibrate(0).is_none());
        assert!(registry.clamp_index(3).is_none());
    }
}
