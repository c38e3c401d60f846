//! Frame sources

use crate::traits::FrameSource;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::{bail, Context};
use gradewatch_core::CaptureRegion;
use image::GrayImage;
use log::info;
use std::fs;
use std::path::Path;

/// Replays prerecorded frames in a loop, ignoring the region position.
///
/// Frames larger than the region are center-cropped to its size, so one
/// recording can be replayed under several anchors.
pub struct ReplayFrameSource {
    frames: Vec<GrayImage>,
    cursor: usize,
}

impl ReplayFrameSource {
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self { frames, cursor: 0 }
    }

    /// Load every image in `dir`, in file-name order
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read directory: {:?}", dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| {
                        let ext = ext.to_string_lossy().to_lowercase();
                        matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp")
                    })
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        let frames = paths
            .iter()
            .map(ImageUtils::load_grayscale)
            .collect::<Result<Vec<_>>>()?;
        if frames.is_empty() {
            bail!("No frames found in {:?}", dir);
        }
        info!("Replaying {} frames from {:?}", frames.len(), dir);
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for ReplayFrameSource {
    fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage> {
        if self.frames.is_empty() {
            bail!("Replay source has no frames");
        }
        let frame = &self.frames[self.cursor % self.frames.len()];
        self.cursor = self.cursor.wrapping_add(1);

        let (w, h) = frame.dimensions();
        let cw = region.width.min(w);
        let ch = region.height.min(h);
        if (cw, ch) == (w, h) {
            return Ok(frame.clone());
        }
        Ok(image::imageops::crop_imm(frame, (w - cw) / 2, (h - ch) / 2, cw, ch).to_image())
    }
}

/// Live screen grabs through the `screenshots` crate
#[cfg(feature = "screen")]
#[derive(Debug, Default)]
pub struct ScreenFrameSource;

#[cfg(feature = "screen")]
impl ScreenFrameSource {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "screen")]
impl FrameSource for ScreenFrameSource {
    fn capture(&mut self, region: &CaptureRegion) -> Result<GrayImage> {
        use screenshots::Screen;

        let center_x = region.left + region.width as i32 / 2;
        let center_y = region.top + region.height as i32 / 2;
        let screen = Screen::from_point(center_x, center_y)
            .with_context(|| format!("No display under ({}, {})", center_x, center_y))?;

        let origin = screen.display_info;
        let shot = screen
            .capture_area(
                region.left - origin.x,
                region.top - origin.y,
                region.width,
                region.height,
            )
            .context("Screen capture failed")?;

        let (width, height) = (shot.width(), shot.height());
        ImageUtils::rgba_to_luma(shot.into_raw(), width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn region(side: u32) -> CaptureRegion {
        CaptureRegion {
            left: 0,
            top: 0,
            width: side,
            height: side,
        }
    }

    #[test]
    fn test_replay_cycles() -> Result<()> {
        let frames = (0..3).map(|i| GrayImage::from_pixel(4, 4, Luma([i]))).collect();
        let mut source = ReplayFrameSource::new(frames);

        let seen: Vec<u8> = (0..5)
            .map(|_| source.capture(&region(4)).map(|f| f.get_pixel(0, 0)[0]))
            .collect::<Result<_>>()?;
        assert_eq!(seen, vec![0, 1, 2, 0, 1]);
        Ok(())
    }

    #[test]
    fn test_replay_center_crops() -> Result<()> {
        let frame = GrayImage::from_fn(10, 10, |x, y| Luma([(x + 10 * y) as u8]));
        let mut source = ReplayFrameSource::new(vec![frame]);
        let out = source.capture(&region(4))?;
        assert_eq!(out.dimensions(), (4, 4));
        assert_eq!(out.get_pixel(0, 0)[0], 33);
        Ok(())
    }

    #[test]
    fn test_empty_replay_errors() {
        let mut source = ReplayFrameSource::new(Vec::new());
        assert!(source.capture(&region(4)).is_err());
    }

    #[test]
    fn test_from_dir_sorted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        GrayImage::from_pixel(3, 3, Luma([20])).save(dir.path().join("b.png"))?;
        GrayImage::from_pixel(3, 3, Luma([10])).save(dir.path().join("a.png"))?;
        std::fs::write(dir.path().join("notes.txt"), "skip")?;

        let mut source = ReplayFrameSource::from_dir(dir.path())?;
        assert_eq!(source.len(), 2);
        assert_eq!(source.capture(&region(3))?.get_pixel(0, 0)[0], 10);
        Ok(())
    }
}
