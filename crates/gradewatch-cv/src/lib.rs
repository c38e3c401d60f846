//! Gradewatch computer vision library
//!
//! Reference templates, resolution calibration, grade classification by
//! normalized cross-correlation, frame sources and the debug preview.

pub mod frame;
pub mod preview;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use frame::ReplayFrameSource;
#[cfg(feature = "screen")]
pub use frame::ScreenFrameSource;
pub use preview::{open_preview, LogPreview, PreviewKind};
pub use template::{
    CalibratedBank, Classification, TemplateBank, TemplateConfig, TemplateError, TemplateLoader,
    TemplateMatcher, TemplateSet,
};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Seams between the detection loop and the outside world
pub mod traits {
    use super::*;
    use gradewatch_core::CaptureRegion;
    use image::GrayImage;

    /// Something that can produce the pixels under a capture region
    pub trait FrameSource {
        /// Grab `region` and return it as single-channel intensity
        fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage>;
    }

    impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
        fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage> {
            (**self).capture(region)
        }
    }

    /// Debug visualization of the captured region
    pub trait PreviewSurface: Send {
        /// Show `frame` with `lines` overlaid; `None` shows a waiting card
        fn show(&mut self, frame: Option<&GrayImage>, lines: &[String]) -> Result<()>;

        /// Tear the surface down. Called once before the surface is dropped.
        fn close(&mut self);
    }
}
