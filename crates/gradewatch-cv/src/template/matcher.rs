//! Grade classification with OpenCV template matching
//!
//! Every variant is scored with `TM_CCOEFF_NORMED` (zero-mean normalized
//! cross-correlation, in `[-1, 1]`), which is insensitive to uniform
//! brightness and contrast shifts. The best placement of the best variant
//! decides.

use super::bank::CalibratedBank;
use crate::utils::ImageUtils;
use crate::Result;
use anyhow::Context;
use gradewatch_core::Grade;
use image::GrayImage;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

/// One calibrated template bitmap
#[derive(Debug, Clone)]
pub struct PreparedTemplate {
    image: GrayImage,
}

impl PreparedTemplate {
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Highest correlation over every placement inside `frame`.
    ///
    /// `None` if the template does not fit. Flat templates or flat windows
    /// score 0 (OpenCV's convention for an undefined correlation).
    pub fn best_score(&self, frame: &Mat) -> Result<Option<f64>> {
        let (tw, th) = self.dimensions();
        if tw as i32 > frame.cols() || th as i32 > frame.rows() || tw == 0 || th == 0 {
            return Ok(None);
        }

        let template = ImageUtils::gray_to_mat(&self.image)?;
        let mut result = Mat::default();
        imgproc::match_template(
            frame,
            &template,
            &mut result,
            imgproc::TM_CCOEFF_NORMED,
            &core::no_array(),
        )
        .context("Template matching failed")?;

        let mut max_val = 0.0;
        core::min_max_loc(&result, None, Some(&mut max_val), None, None, &core::no_array())?;
        Ok(Some(max_val.clamp(-1.0, 1.0)))
    }
}

/// Raw result for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Winning grade, or `None` when nothing fit or the score was too low
    pub grade: Grade,
    /// Best score seen, -1.0 when no variant fit
    pub score: f64,
    /// Grade of the best-scoring variant before thresholding
    pub best: Option<Grade>,
}

/// Scores a frame against every calibrated variant
#[derive(Debug, Clone)]
pub struct TemplateMatcher {
    threshold: f64,
}

impl TemplateMatcher {
    /// Create a matcher that rejects scores below `threshold`
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Classify one captured frame.
    ///
    /// The single highest score across all grades wins; on an exact tie the
    /// grade scanned first keeps the lead. Errors only come from OpenCV.
    pub fn classify(&self, frame: &GrayImage, bank: &CalibratedBank) -> Result<Classification> {
        let per_grade = self.score_grades(frame, bank)?;

        let mut best: Option<Grade> = None;
        let mut best_score = -1.0;
        for (grade, score) in per_grade {
            if let Some(score) = score {
                if score > best_score {
                    best_score = score;
                    best = Some(grade);
                }
            }
        }

        let grade = match best {
            Some(grade) if best_score >= self.threshold => grade,
            _ => Grade::None,
        };
        Ok(Classification {
            grade,
            score: best_score,
            best,
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn score_grades(
        &self,
        frame: &GrayImage,
        bank: &CalibratedBank,
    ) -> Result<Vec<(Grade, Option<f64>)>> {
        let frame = ImageUtils::gray_to_mat(frame)?;
        bank.grades()
            .iter()
            .map(|entry| Ok((entry.grade, best_of(&frame, &entry.variants)?)))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn score_grades(
        &self,
        frame: &GrayImage,
        bank: &CalibratedBank,
    ) -> Result<Vec<(Grade, Option<f64>)>> {
        use rayon::prelude::*;
        // Collect preserves input order, so the tie-break stays sequential.
        // Each worker wraps its own Mat of the frame.
        bank.grades()
            .par_iter()
            .map(|entry| {
                let frame = ImageUtils::gray_to_mat(frame)?;
                Ok((entry.grade, best_of(&frame, &entry.variants)?))
            })
            .collect()
    }
}

fn best_of(frame: &Mat, variants: &[PreparedTemplate]) -> Result<Option<f64>> {
    let mut best: Option<f64> = None;
    for variant in variants {
        if let Some(score) = variant.best_score(frame)? {
            if best.is_none_or(|b| score > b) {
                best = Some(score);
            }
        }
    }
    Ok(best)
}
