//! Template loading from the asset directory

use super::{Template, TemplateError, TemplateSet};
use crate::Result;
use anyhow::Context;
use gradewatch_core::Grade;
use log::info;
use std::path::{Path, PathBuf};

/// Files per grade, in classifier scan order
pub const DEFAULT_MANIFEST: &[(Grade, &[&str])] = &[
    (Grade::S, &["S.png", "S(active).png"]),
    (Grade::A, &["A.png"]),
    (Grade::B, &["B.png"]),
    (Grade::C, &["C.png"]),
    (Grade::D, &["D.png"]),
    (Grade::E, &["E.png"]),
    (Grade::None, &["None.png", "None(cooltime).png"]),
];

/// Loads every template named in a manifest, failing on the first gap
pub struct TemplateLoader {
    template_dir: PathBuf,
    manifest: Vec<(Grade, Vec<String>)>,
}

impl TemplateLoader {
    /// Create a loader for `dir` using the default manifest
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let manifest = DEFAULT_MANIFEST
            .iter()
            .map(|(grade, files)| (*grade, files.iter().map(|f| f.to_string()).collect()))
            .collect();
        Self {
            template_dir: dir.as_ref().to_path_buf(),
            manifest,
        }
    }

    /// Replace the manifest
    pub fn with_manifest(mut self, manifest: Vec<(Grade, Vec<String>)>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Load the whole manifest. A missing or unreadable file is an error.
    pub fn load(&self) -> Result<TemplateSet> {
        let mut entries = Vec::with_capacity(self.manifest.len());

        for (grade, files) in &self.manifest {
            let mut templates = Vec::with_capacity(files.len());
            for file in files {
                let path = self.template_dir.join(file);
                let image = load_one(*grade, &path)
                    .with_context(|| format!("Failed to load template: {:?}", path))?;
                templates.push(Template::new(file.clone(), *grade, image));
            }
            entries.push((*grade, templates));
        }

        let set = TemplateSet::new(entries);
        info!(
            "Loaded {} templates for {} grades from {:?}",
            set.len(),
            self.manifest.len(),
            self.template_dir
        );
        Ok(set)
    }
}

fn load_one(grade: Grade, path: &Path) -> std::result::Result<image::GrayImage, TemplateError> {
    if !path.is_file() {
        return Err(TemplateError::Missing {
            grade,
            path: path.to_path_buf(),
        });
    }
    image::open(path)
        .map(|img| img.to_luma8())
        .map_err(|source| TemplateError::Decode {
            grade,
            path: path.to_path_buf(),
            source,
        })
}
