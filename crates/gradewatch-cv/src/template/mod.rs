//! Template loading, calibration and matching

pub mod bank;
pub mod loader;
pub mod matcher;

pub use bank::{scale_candidates, CalibratedBank, GradeVariants, TemplateBank};
pub use loader::{TemplateLoader, DEFAULT_MANIFEST};
pub use matcher::{Classification, PreparedTemplate, TemplateMatcher};

use gradewatch_core::Grade;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Template asset failures. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template for grade {grade} not found: {path:?}")]
    Missing { grade: Grade, path: PathBuf },
    #[error("template for grade {grade} could not be decoded: {path:?}")]
    Decode {
        grade: Grade,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// One reference bitmap
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub grade: Grade,
    pub image: GrayImage,
}

impl Template {
    pub fn new(name: String, grade: Grade, image: GrayImage) -> Self {
        Self { name, grade, image }
    }
}

/// Base templates grouped by grade, in scan order. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct TemplateSet {
    entries: Vec<(Grade, Vec<Template>)>,
}

impl TemplateSet {
    /// Build from `(grade, templates)` groups; the group order is the scan order
    pub fn new(entries: Vec<(Grade, Vec<Template>)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(Grade, Vec<Template>)] {
        &self.entries
    }

    pub fn grades(&self) -> impl Iterator<Item = Grade> + '_ {
        self.entries.iter().map(|(grade, _)| *grade)
    }

    /// Total number of base bitmaps
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, t)| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Template and classifier settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory holding the manifest's image files
    pub template_dir: PathBuf,
    /// Best correlation below this classifies as `None`
    pub score_threshold: f64,
    /// Multipliers applied around the resolution scale
    pub scale_offsets: Vec<f64>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            template_dir: "templates".into(),
            score_threshold: 0.55,
            scale_offsets: vec![0.97, 1.0, 1.03],
        }
    }
}
