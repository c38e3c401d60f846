//! Resolution-calibrated template variants

use super::matcher::PreparedTemplate;
use super::TemplateSet;
use crate::utils::ImageUtils;
use crate::Result;
use gradewatch_core::Grade;
use log::debug;

/// Rounding applied before comparing scale candidates (4 decimals)
const SCALE_KEY_PRECISION: f64 = 10_000.0;

/// `base_scale * offset` for each offset, dropping values equal to an
/// earlier one at four decimals
pub fn scale_candidates(base_scale: f64, offsets: &[f64]) -> Vec<f64> {
    let mut seen = Vec::with_capacity(offsets.len());
    let mut candidates = Vec::with_capacity(offsets.len());
    for offset in offsets {
        let candidate = base_scale * offset;
        let key = (candidate * SCALE_KEY_PRECISION).round() as i64;
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        candidates.push(candidate);
    }
    candidates
}

/// Scaled variants for one grade
#[derive(Debug, Clone)]
pub struct GradeVariants {
    pub grade: Grade,
    pub variants: Vec<PreparedTemplate>,
}

/// Every template at every candidate scale, ready to match
#[derive(Debug, Clone)]
pub struct CalibratedBank {
    scale: f64,
    grades: Vec<GradeVariants>,
}

impl CalibratedBank {
    fn build(set: &TemplateSet, base_scale: f64, offsets: &[f64]) -> Result<Self> {
        let scales = scale_candidates(base_scale, offsets);
        let mut grades = Vec::with_capacity(set.entries().len());
        for (grade, templates) in set.entries() {
            let mut variants = Vec::with_capacity(templates.len() * scales.len());
            for template in templates {
                for &scale in &scales {
                    variants.push(PreparedTemplate::new(scale_image(&template.image, scale)?));
                }
            }
            grades.push(GradeVariants {
                grade: *grade,
                variants,
            });
        }
        Ok(Self {
            scale: base_scale,
            grades,
        })
    }

    /// Base scale this bank was built for
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn grades(&self) -> &[GradeVariants] {
        &self.grades
    }

    pub fn variant_count(&self) -> usize {
        self.grades.iter().map(|g| g.variants.len()).sum()
    }
}

fn scale_image(image: &image::GrayImage, scale: f64) -> Result<image::GrayImage> {
    if (scale - 1.0).abs() < f64::EPSILON {
        return Ok(image.clone());
    }
    let width = ((image.width() as f64 * scale).round() as u32).max(1);
    let height = ((image.height() as f64 * scale).round() as u32).max(1);
    ImageUtils::resize_area(image, width, height)
}

/// Base templates plus the currently active calibration
#[derive(Debug, Clone)]
pub struct TemplateBank {
    base: TemplateSet,
    offsets: Vec<f64>,
    active: CalibratedBank,
}

impl TemplateBank {
    /// Create a bank calibrated at scale 1.0
    pub fn new(base: TemplateSet, offsets: Vec<f64>) -> Result<Self> {
        let offsets = if offsets.is_empty() { vec![1.0] } else { offsets };
        let active = CalibratedBank::build(&base, 1.0, &offsets)?;
        Ok(Self {
            base,
            offsets,
            active,
        })
    }

    /// Replace the active calibration with one built for `scale`.
    /// On error the previous calibration stays active.
    pub fn rebuild(&mut self, scale: f64) -> Result<()> {
        self.active = CalibratedBank::build(&self.base, scale, &self.offsets)?;
        debug!(
            "Template bank rebuilt at scale {:.4} ({} variants)",
            scale,
            self.active.variant_count()
        );
        Ok(())
    }

    pub fn active(&self) -> &CalibratedBank {
        &self.active
    }

    pub fn base(&self) -> &TemplateSet {
        &self.base
    }
}
