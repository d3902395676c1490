//! Screen recognition for Warframe captures.
//!
//! [`Ie`] ties the stages together: theme and UI scale detection, theme-based
//! filtering, segmentation, OCR, name resolution and count detection.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use data::Catalog;

mod config;
pub use config::*;
pub mod count;
mod debug;
mod error;
pub use error::IeError;
pub mod filter;
mod image;
pub use crate::image::*;
pub mod item;
pub mod ocr;
pub mod scale;
pub mod screen;
pub mod segment;
mod theme;
pub use theme::*;
pub mod util;

use item::InventoryItem;
use ocr::{OcrPool, TextRecognizer};
use screen::{
	Pipeline,
	relicreward::{RewardHints, Rewards},
};

pub struct Ie {
	config: Config,
	catalog: Arc<Catalog>,
	pool: OcrPool,
	detector: Mutex<ThemeDetector>,
}

impl Ie {
	/// Load the OCR engines for `config` and set up the pipelines.
	pub fn try_new(config: Config, catalog: Arc<Catalog>) -> anyhow::Result<Self> {
		let assets = config.ocr_assets()?;
		let pool = OcrPool::load(config.ocr_engines, &assets.detection, &assets.recognition, &assets.charset)
			.context("IE initialization failed (OCR models missing?)")?;
		Ok(Self::with_pool(config, catalog, pool))
	}

	/// Set up the pipelines around already constructed recognizers.
	pub fn with_recognizers(config: Config, catalog: Arc<Catalog>, engines: Vec<Box<dyn TextRecognizer>>) -> Self {
		Self::with_pool(config, catalog, OcrPool::new(engines))
	}

	fn with_pool(config: Config, catalog: Arc<Catalog>, pool: OcrPool) -> Self {
		log::info!(
			"ie ready: {} catalog entries, {} OCR engines, theme {:?}",
			catalog.len(),
			pool.len(),
			config.theme
		);
		Self {
			config,
			catalog,
			pool,
			detector: Mutex::new(ThemeDetector::new()),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	fn pipeline(&self) -> Pipeline<'_> {
		Pipeline {
			config: &self.config,
			catalog: &self.catalog,
			pool: &self.pool,
			detector: &self.detector,
		}
	}

	pub fn relicreward_get_rewards(&self, image: Image, hints: RewardHints) -> Result<Rewards, IeError> {
		screen::relicreward::get_rewards(image, &self.pipeline(), hints)
	}

	/// Index of the reward under a desktop click, see [`screen::relicreward::get_selected`].
	pub fn relicreward_get_selected(
		&self,
		click: (f32, f32),
		bounds: &util::WindowBounds,
		ui_scale: f32,
		reward_count: usize,
	) -> Option<usize> {
		screen::relicreward::get_selected(click, bounds, ui_scale, reward_count)
	}

	/// Cheap screen check for the Void Fissure rewards screen (no OCR).
	pub fn relicreward_is_screen(&self, image: Image, hints: RewardHints) -> bool {
		screen::relicreward::is_screen(image, &self.pipeline(), hints)
	}

	pub fn snapit_get_items(&self, image: Image) -> Result<Vec<InventoryItem>, IeError> {
		screen::snapit::get_items(image, &self.pipeline())
	}
}
