#![allow(dead_code)]

use std::sync::Arc;

use data::Catalog;
use ie::{
	Color, Image, OwnedImage, Rect,
	ocr::{RecognizedWord, TextMode, TextRecognizer, apply_mode},
};

pub const BACKGROUND: Color = Color::new(20, 20, 20);
pub const TEXT: Color = Color::new(250, 250, 250);
pub const PILL: Color = Color::new(60, 60, 140);
pub const ICON: Color = Color::new(255, 230, 60);

pub fn init_logging() {
	let _ = env_logger::builder().is_test(true).try_init();
}

pub fn catalog(names: &[&str]) -> Arc<Catalog> {
	Arc::new(Catalog::from_pairs(
		names.iter().map(|n| (n.to_lowercase().replace(' ', "_"), *n)),
	))
}

/// 1920x1080 reward screen at UI scale 100% with `count` rewards.
///
/// Reward `k` shows a text block `k + 1` eighths of a slot wide, centered in
/// its slot's name band, so [`ScriptedRewards`] can tell them apart.
pub fn reward_capture(count: u32) -> OwnedImage {
	// Name band of the reference layout, see `ie::util::name_band`.
	let band = Rect::new(476, 363, 968, 96);
	let slot_w = band.w / 4;
	let start = band.x + band.w / 2 - count * slot_w / 2;
	OwnedImage::from_fn(1920, 1080, |x, y| {
		if y < band.y + 20 || y >= band.y + 60 || x < start || x >= start + count * slot_w {
			return BACKGROUND;
		}
		let k = (x - start) / slot_w;
		let center = start + k * slot_w + slot_w / 2;
		let half = (k + 1) * slot_w / 16;
		if x >= center - half && x < center + half {
			TEXT
		} else {
			BACKGROUND
		}
	})
}

fn black_columns(image: Image) -> u32 {
	(0..image.width())
		.filter(|&x| (0..image.height()).any(|y| image.is_foreground(x, y)))
		.count() as u32
}

/// Reads the reward text blocks of [`reward_capture`] back as `texts[k]`.
pub struct ScriptedRewards(pub Vec<&'static str>);

impl TextRecognizer for ScriptedRewards {
	fn recognize(&self, image: Image, _mode: TextMode) -> Vec<RecognizedWord> {
		// Crops are a slot plus padding; the block covers (k + 1) / 8 of the slot.
		let eighths = (black_columns(image) as f32 / image.width() as f32 * 8.0).round() as usize;
		let Some(text) = eighths.checked_sub(1).and_then(|k| self.0.get(k)) else {
			return Vec::new();
		};
		vec![RecognizedWord {
			text: text.to_string(),
			rect: image.rect(),
		}]
	}
}

/// Inventory region: two labels in two columns, the left one with a count
/// badge reading 2 above it.
pub fn inventory_capture() -> OwnedImage {
	OwnedImage::from_fn(600, 300, |x, y| {
		let label = (200..220).contains(&y) && ((40..240).contains(&x) || (340..440).contains(&x));
		let stroke = ((62..64).contains(&x) || (70..72).contains(&x)) && (46..58).contains(&y);
		let icon = (44..54).contains(&x) && (46..58).contains(&y);
		let pill = (40..110).contains(&x) && (40..64).contains(&y);
		if label || stroke {
			TEXT
		} else if icon {
			ICON
		} else if pill {
			PILL
		} else {
			BACKGROUND
		}
	})
}

/// Reads the bottom text line of a zone: wide lines as "Nova Prime Systems",
/// narrow ones as "Forma Blueprint". Digit requests always read "2".
pub struct LabelReader;

impl TextRecognizer for LabelReader {
	fn recognize(&self, image: Image, mode: TextMode) -> Vec<RecognizedWord> {
		if mode == TextMode::Digits {
			return vec![RecognizedWord {
				text: "2".to_owned(),
				rect: image.rect(),
			}];
		}

		let rows = (0..image.height())
			.filter(|&y| (0..image.width()).any(|x| image.is_foreground(x, y)))
			.collect::<Vec<_>>();
		let Some(&bottom) = rows.last() else {
			return Vec::new();
		};
		let mut top = bottom;
		while top > 0 && rows.contains(&(top - 1)) {
			top -= 1;
		}
		let cols = (0..image.width())
			.filter(|&x| (top..=bottom).any(|y| image.is_foreground(x, y)))
			.collect::<Vec<_>>();
		let (Some(&left), Some(&right)) = (cols.first(), cols.last()) else {
			return Vec::new();
		};

		let text = if right - left >= 150 { "Nova Prime Systems" } else { "Forma Blueprint" };
		let line = RecognizedWord {
			text: text.to_owned(),
			rect: Rect::from_bounds(left, top, right + 1, bottom + 1),
		};
		apply_mode(vec![line], mode)
	}
}
