use std::sync::LazyLock;

use regex::Regex;

use crate::Rect;

pub static DIGIT_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?<digits>\d+)").unwrap());

// Reference layout is a 1920x1080 capture at UI scale 100%.
pub const BASE_WIDTH: u32 = 1920;
pub const BASE_HEIGHT: u32 = 1080;

pub const REWARD_WIDTH: u32 = 968;
pub const REWARD_HEIGHT: u32 = 235;
/// Distance from the screen's vertical center up to the top of the reward area.
pub const REWARD_Y_DISPLAY: u32 = 316;
pub const LINE_HEIGHT: u32 = 48;

/// Scale the game applies to its whole UI for a given capture size.
///
/// The UI is laid out against 1080 rows; ultra-wide captures keep that, narrow
/// ones scale with the width instead.
pub fn screen_scaling(width: u32, height: u32) -> f32 {
	if width as u64 * 9 > height as u64 * 16 {
		height as f32 / BASE_HEIGHT as f32
	} else {
		width as f32 / BASE_WIDTH as f32
	}
}

#[inline]
pub fn px(base: u32, s: f32) -> u32 {
	if base == 0 {
		0
	} else {
		((base as f32) * s).round().max(1.0) as u32
	}
}

/// The reward area of the fissure reward screen, clipped to the capture.
///
/// `scale` is the product of screen scaling and UI scale.
pub fn reward_area(width: u32, height: u32, scale: f32) -> Rect {
	let w = px(REWARD_WIDTH, scale);
	let x = (width / 2).saturating_sub(w / 2);
	let y = (height / 2).saturating_sub(px(REWARD_Y_DISPLAY, scale));
	Rect::new(x, y, w, px(REWARD_HEIGHT, scale)).clip(width, height)
}

/// Rows of `area` holding the reward names (two lines of text at the bottom).
pub fn name_band(area: Rect, scale: f32) -> Rect {
	let h = (px(LINE_HEIGHT, scale) * 2).min(area.h);
	Rect::new(area.x, area.bottom() - h, area.w, h)
}

/// Game window placement on the desktop.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct WindowBounds {
	pub x: f32,
	pub y: f32,
	pub width: f32,
	pub height: f32,
	/// Monitor scale factor (physical pixels per logical point).
	pub dpi: f32,
	/// UI scaling of the game for this window size, see [`screen_scaling`].
	pub screen_scaling: f32,
}

impl WindowBounds {
	/// Window of `width`x`height` physical pixels at the desktop origin.
	pub fn at_origin(width: u32, height: u32) -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			width: width as f32,
			height: height as f32,
			dpi: 1.0,
			screen_scaling: screen_scaling(width, height),
		}
	}

	/// Desktop point to window-local physical pixels.
	pub fn to_local(&self, x: f32, y: f32) -> (f32, f32) {
		((x - self.x) * self.dpi, (y - self.y) * self.dpi)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn screen_scaling_follows_limiting_axis() {
		assert_eq!(screen_scaling(1920, 1080), 1.0);
		assert_eq!(screen_scaling(3840, 2160), 2.0);
		// Ultra-wide: height limits.
		assert_eq!(screen_scaling(2560, 1080), 1.0);
		// 16:10: width limits.
		assert_eq!(screen_scaling(1920, 1200), 1.0);
		assert_eq!(screen_scaling(1280, 800), 1280.0 / 1920.0);
	}

	#[test]
	fn reward_area_at_reference_resolution() {
		let area = reward_area(1920, 1080, 1.0);
		assert_eq!(area, Rect::new(476, 224, 968, 235));
		assert_eq!(name_band(area, 1.0), Rect::new(476, 363, 968, 96));

		let half = reward_area(1920, 1080, 0.5);
		assert_eq!(half, Rect::new(718, 382, 484, 118));
	}

	#[test]
	fn window_local_coordinates() {
		let bounds = WindowBounds {
			x: 100.0,
			y: 50.0,
			width: 1920.0,
			height: 1080.0,
			dpi: 1.5,
			screen_scaling: 1.0,
		};
		assert_eq!(bounds.to_local(110.0, 60.0), (15.0, 15.0));
		assert_eq!(DIGIT_REGEX.captures("x12 owned").unwrap()["digits"].parse::<u32>().unwrap(), 12);
	}
}
