//! Per-screen recognition pipelines.

use std::sync::Mutex;

use data::{Catalog, NameResolver};

use crate::{Config, Image, Theme, ThemeDetection, ThemeDetector, ThemeSampling, ocr::OcrPool};

pub mod relicreward;
pub mod snapit;

/// What a pipeline run borrows from its owner.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    pub config: &'a Config,
    pub catalog: &'a Catalog,
    pub pool: &'a OcrPool,
    pub detector: &'a Mutex<ThemeDetector>,
}

impl<'a> Pipeline<'a> {
    pub fn resolver(&self) -> NameResolver<'a> {
        NameResolver::new(self.catalog, self.config.language)
    }

    /// Active theme plus what detection found.
    pub fn theme(&self, image: Image, sampling: ThemeSampling) -> (Theme, ThemeDetection) {
        // A panic elsewhere can't leave the memo in a bad state; every entry
        // is written whole.
        let mut detector = self.detector.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        detector.resolve(image, sampling, self.config.theme)
    }
}
