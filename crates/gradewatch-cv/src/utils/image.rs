//! Image helpers and conversions between `image` buffers and OpenCV mats

use crate::Result;
use anyhow::Context;
use image::{imageops, DynamicImage, GrayImage, RgbaImage};
use opencv::{
    core::{Mat, Size},
    imgproc,
    prelude::*,
};
use std::path::Path;

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Decode an image file and convert it to luma
    pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<GrayImage> {
        let img = image::open(&path)
            .with_context(|| format!("Failed to open image: {:?}", path.as_ref()))?;
        Ok(img.to_luma8())
    }

    /// Convert a raw RGBA buffer (as returned by screen grabbers) to luma
    pub fn rgba_to_luma(raw: Vec<u8>, width: u32, height: u32) -> Result<GrayImage> {
        let rgba = RgbaImage::from_raw(width, height, raw)
            .with_context(|| format!("RGBA buffer does not match {}x{}", width, height))?;
        Ok(DynamicImage::ImageRgba8(rgba).to_luma8())
    }

    /// Copy a luma buffer into a single-channel `CV_8UC1` mat
    pub fn gray_to_mat(gray: &GrayImage) -> Result<Mat> {
        let view = Mat::new_rows_cols_with_data(
            gray.height() as i32,
            gray.width() as i32,
            gray.as_raw().as_slice(),
        )
        .context("Failed to wrap luma buffer as Mat")?;
        view.try_clone().context("Failed to copy luma Mat")
    }

    /// Copy a single-channel 8-bit mat back into a luma buffer
    pub fn mat_to_gray(mat: &Mat) -> Result<GrayImage> {
        let (width, height) = (mat.cols() as u32, mat.rows() as u32);
        let bytes = if mat.is_continuous() {
            mat.data_bytes()?.to_vec()
        } else {
            mat.try_clone()?.data_bytes()?.to_vec()
        };
        GrayImage::from_raw(width, height, bytes)
            .with_context(|| format!("Mat data does not match {}x{} luma", width, height))
    }

    /// Resample with OpenCV's area interpolation (`INTER_AREA`), which
    /// averages source pixels under each destination footprint when shrinking
    pub fn resize_area(src: &GrayImage, width: u32, height: u32) -> Result<GrayImage> {
        let width = width.max(1);
        let height = height.max(1);
        if src.dimensions() == (width, height) {
            return Ok(src.clone());
        }

        let mut resized = Mat::default();
        imgproc::resize(
            &Self::gray_to_mat(src)?,
            &mut resized,
            Size::new(width as i32, height as i32),
            0.0,
            0.0,
            imgproc::INTER_AREA,
        )
        .context("Area resize failed")?;
        Self::mat_to_gray(&resized)
    }

    /// Integer nearest-neighbour upscale, for previews
    pub fn upscale_nearest(src: &GrayImage, factor: u32) -> GrayImage {
        let factor = factor.max(1);
        imageops::resize(
            src,
            src.width() * factor,
            src.height() * factor,
            imageops::FilterType::Nearest,
        )
    }
}
