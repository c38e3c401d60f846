//! Debug preview of the captured region
//!
//! The detection loop opens a surface lazily when the preview flag turns on
//! and closes it when the flag turns off.

use crate::traits::PreviewSurface;
use crate::Result;
use image::GrayImage;
use log::debug;
use serde::{Deserialize, Serialize};

/// Upscale factor applied to the region before overlaying text
pub const PREVIEW_UPSCALE: u32 = 3;

/// Which surface `open_preview` creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    /// Overlay lines go to the log
    #[default]
    Log,
    /// OpenCV highgui window (requires the `preview` feature)
    Window,
}

/// Create a surface of the requested kind
pub fn open_preview(kind: PreviewKind) -> Result<Box<dyn PreviewSurface>> {
    match kind {
        PreviewKind::Log => Ok(Box::new(LogPreview::new())),
        #[cfg(feature = "preview")]
        PreviewKind::Window => Ok(Box::new(window::WindowPreview::open()?)),
        #[cfg(not(feature = "preview"))]
        PreviewKind::Window => {
            anyhow::bail!("window preview needs the `preview` feature; use the log preview instead")
        }
    }
}

/// Writes overlay text to the debug log whenever it changes
#[derive(Debug, Default)]
pub struct LogPreview {
    last: Vec<String>,
}

impl LogPreview {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreviewSurface for LogPreview {
    fn show(&mut self, frame: Option<&GrayImage>, lines: &[String]) -> Result<()> {
        if self.last.as_slice() == lines {
            return Ok(());
        }
        let size = frame.map(|f| f.dimensions());
        debug!("[preview {:?}] {}", size, lines.join(" | "));
        self.last = lines.to_vec();
        Ok(())
    }

    fn close(&mut self) {
        self.last.clear();
    }
}

#[cfg(feature = "preview")]
mod window {
    use super::PREVIEW_UPSCALE;
    use crate::traits::PreviewSurface;
    use crate::utils::ImageUtils;
    use crate::Result;
    use anyhow::Context;
    use image::GrayImage;
    use opencv::{
        core::{Mat, Point, Scalar, CV_8UC1},
        highgui,
        imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_AA},
        prelude::*,
    };

    const WINDOW_NAME: &str = "ROI Debug Preview";
    const WAITING_SIDE: i32 = 90 * PREVIEW_UPSCALE as i32;

    /// Always-on-top OpenCV window
    pub struct WindowPreview {
        open: bool,
    }

    impl WindowPreview {
        pub fn open() -> Result<Self> {
            highgui::named_window(WINDOW_NAME, highgui::WINDOW_NORMAL)
                .context("Failed to create preview window")?;
            highgui::set_window_property(WINDOW_NAME, highgui::WND_PROP_TOPMOST, 1.0)?;
            Ok(Self { open: true })
        }

        fn canvas(frame: Option<&GrayImage>) -> Result<Mat> {
            match frame {
                Some(frame) => {
                    ImageUtils::gray_to_mat(&ImageUtils::upscale_nearest(frame, PREVIEW_UPSCALE))
                }
                None => Ok(Mat::new_rows_cols_with_default(
                    WAITING_SIDE,
                    WAITING_SIDE,
                    CV_8UC1,
                    Scalar::all(0.0),
                )?),
            }
        }
    }

    impl PreviewSurface for WindowPreview {
        fn show(&mut self, frame: Option<&GrayImage>, lines: &[String]) -> Result<()> {
            let mut canvas = Self::canvas(frame)?;
            let mut y = 28;
            for line in lines {
                imgproc::put_text(
                    &mut canvas,
                    line,
                    Point::new(10, y),
                    FONT_HERSHEY_SIMPLEX,
                    0.65,
                    Scalar::all(255.0),
                    2,
                    LINE_AA,
                    false,
                )?;
                y += 26;
            }
            highgui::imshow(WINDOW_NAME, &canvas)?;
            highgui::wait_key(1)?;
            Ok(())
        }

        fn close(&mut self) {
            if std::mem::take(&mut self.open) {
                let _ = highgui::destroy_window(WINDOW_NAME);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preview_dedupes_lines() -> Result<()> {
        let mut preview = LogPreview::new();
        let lines = vec!["raw=E score=0.812".to_string()];
        preview.show(None, &lines)?;
        assert_eq!(preview.last, lines);
        preview.close();
        assert!(preview.last.is_empty());
        Ok(())
    }

    #[test]
    fn test_open_log_preview() -> Result<()> {
        let mut surface = open_preview(PreviewKind::Log)?;
        surface.show(Some(&GrayImage::new(4, 4)), &[])?;
        surface.close();
        Ok(())
    }

    #[cfg(not(feature = "preview"))]
    #[test]
    fn test_window_preview_needs_feature() {
        assert!(open_preview(PreviewKind::Window).is_err());
    }
}
