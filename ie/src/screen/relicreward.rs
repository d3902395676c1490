//! Void fissure reward screen.
//!
//! The reward cards always sit at a fixed place relative to the screen center,
//! scaled by screen and UI scaling, so once the UI scale is known the name of
//! every reward can be cut out directly. No segmentation is needed here.

use crate::{
    IeError, Image, Rect, Theme, ThemeDetection, ThemeSampling, debug,
    filter::{Filtered, filter},
    item::{InventoryItem, ItemArena},
    ocr::{self, TextMode},
    scale,
    util::{self, WindowBounds},
};

use super::Pipeline;

/// Average column density a reward slot's center needs to count as occupied.
pub const MIN_SLOT_DENSITY: f64 = 0.02;

/// Facts the caller already knows; each one skips a detection step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RewardHints {
    pub ui_scale: Option<f32>,
    pub reward_count: Option<usize>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Rewards {
    /// Theme the capture was filtered with.
    pub theme: Theme,
    /// Detection result, also when a configured theme overrode it.
    pub detected: ThemeDetection,
    pub ui_scale: f32,
    /// One entry per reward, left to right.
    pub rewards: Vec<InventoryItem>,
}

struct Layout {
    theme: Theme,
    detected: ThemeDetection,
    ui_scale: f32,
    /// Screen scaling times UI scale.
    scale: f32,
    /// Name rows of the reward area, in capture coordinates.
    band: Rect,
    filtered: Filtered,
}

fn layout(image: Image, pipeline: &Pipeline, hints: RewardHints) -> Result<Layout, IeError> {
    if image.is_empty() {
        return Err(IeError::EmptyRegion(image.rect()));
    }
    let (w, h) = (image.width(), image.height());
    let ss = util::screen_scaling(w, h);
    let custom = &pipeline.config.custom_threshold;

    let sampling = ThemeSampling {
        area: util::reward_area(w, h, ss),
        header: util::px(util::LINE_HEIGHT / 2, ss),
    };
    let (theme, detected) = pipeline.theme(image, sampling);

    let ui_scale = match hints.ui_scale {
        Some(v) => v.clamp(0.5, 1.0),
        None => {
            let probe = scale::probe_area(w, h, ss);
            let hist = filter(image.crop(probe)?, theme, custom);
            scale::detect_scale(&hist.row_hits, probe.w, ss).scale
        }
    };

    let scale = ss * ui_scale;
    let band = util::name_band(util::reward_area(w, h, scale), scale);
    let filtered = filter(image.crop(band)?, theme, custom);

    Ok(Layout {
        theme,
        detected,
        ui_scale,
        scale,
        band,
        filtered,
    })
}

/// Name boxes of `count` centered rewards inside a `width`x`height` band.
///
/// Slots are a quarter of the band wide whatever their number.
pub fn slot_rects(width: u32, height: u32, count: usize) -> Vec<Rect> {
    let slot_w = width / 4;
    let start = (width / 2).saturating_sub(count as u32 * slot_w / 2);
    (0..count as u32)
        .map(|i| Rect::new(start + i * slot_w, 0, slot_w, height))
        .collect()
}

/// Average column density below which a slot edge counts as a gap between names.
pub const MAX_EDGE_DENSITY: f64 = 0.01;

fn window_density(filtered: &Filtered, center: u32, half: u32) -> f64 {
    let cols = center.saturating_sub(half)..(center + half).min(filtered.width());
    let n = cols.len().max(1) as f64;
    cols.map(|x| filtered.col_density(x as usize)).sum::<f64>() / n
}

fn slot_density(filtered: &Filtered, slot: Rect) -> f64 {
    window_density(filtered, slot.center_x(), (slot.w / 8).max(1))
}

/// Densest edge of a layout, the outer ones included. Edges that are clear
/// enough all score 0.
fn edge_density(filtered: &Filtered, slots: &[Rect]) -> f64 {
    let half = slots.first().map_or(1, |s| (s.w / 32).max(1));
    let edges = slots.iter().map(|s| s.x).chain(slots.last().map(|s| s.right()));
    let densest = edges
        .map(|x| window_density(filtered, x, half))
        .fold(0.0, f64::max);
    if densest < MAX_EDGE_DENSITY { 0.0 } else { densest }
}

/// How many rewards are shown, judged from the filtered name band.
///
/// A layout qualifies when there is text under every slot center. Of those,
/// the one whose slot edges are clearest wins, and ties go to the layout with
/// more slots. Long names of a 3 reward screen cover the centers of the 4 slot
/// layout too, but they also cross its edges.
pub fn detect_reward_count(filtered: &Filtered) -> Option<usize> {
    (1..=4)
        .rev()
        .filter_map(|n| {
            let slots = slot_rects(filtered.width(), filtered.height(), n);
            slots
                .iter()
                .all(|&slot| slot_density(filtered, slot) >= MIN_SLOT_DENSITY)
                .then(|| (n, edge_density(filtered, &slots)))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(n, _)| n)
}

/// Read and resolve the reward names.
///
/// Fails when the capture is empty or no reward slot holds text. Rewards whose
/// name can't be resolved confidently are returned with their warning set.
pub fn get_rewards(image: Image, pipeline: &Pipeline, hints: RewardHints) -> Result<Rewards, IeError> {
    let layout = layout(image, pipeline, hints)?;
    let count = match hints.reward_count {
        Some(0) => return Err(IeError::NoRewards),
        Some(n) => n.min(4),
        None => detect_reward_count(&layout.filtered).ok_or(IeError::NoRewards)?,
    };
    log::debug!(
        "reward screen: {count} rewards, theme {:?}, ui scale {:.2}",
        layout.theme,
        layout.ui_scale
    );

    let slots = slot_rects(layout.filtered.width(), layout.filtered.height(), count);
    let pad = util::px(8, layout.scale);
    let crops = slots
        .iter()
        .map(|&slot| ocr::padded(layout.filtered.image.as_image().sub_rect(slot), pad))
        .collect::<Vec<_>>();
    let jobs = crops
        .iter()
        .map(|crop| (crop.as_image(), TextMode::Line))
        .collect::<Vec<_>>();
    let texts = pipeline.pool.recognize_all(&jobs);

    let lang = pipeline.config.language;
    let mut arena = ItemArena::new();
    for (slot, words) in slots.iter().zip(texts) {
        let raw = words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>().join(" ");
        let rect = slot.offset(layout.band.x, layout.band.y);
        arena.push(InventoryItem::new(lang.clean_ocr_text(&raw), rect));
    }
    arena.resolve_names(&pipeline.resolver());

    let rewards = arena.into_items();
    let rects = rewards.iter().map(|v| v.rect).collect::<Vec<_>>();
    debug::write_snapshots(
        pipeline.config.debug_dir.as_deref(),
        "reward",
        image,
        layout.filtered.image.as_image(),
        &rects,
    );

    Ok(Rewards {
        theme: layout.theme,
        detected: layout.detected,
        ui_scale: layout.ui_scale,
        rewards,
    })
}

/// Cheap check for the reward screen: theme-colored text under the reward
/// slots. No OCR.
pub fn is_screen(image: Image, pipeline: &Pipeline, hints: RewardHints) -> bool {
    match layout(image, pipeline, hints) {
        Ok(layout) => detect_reward_count(&layout.filtered).is_some(),
        Err(_) => false,
    }
}

/// Which reward a click landed on.
///
/// `click` is in desktop coordinates. The window size in `bounds` is in
/// physical pixels. Returns `None` for clicks outside the reward area and for
/// impossible reward counts.
pub fn get_selected(click: (f32, f32), bounds: &WindowBounds, ui_scale: f32, count: usize) -> Option<usize> {
    let (x, y) = bounds.to_local(click.0, click.1);
    let s = bounds.screen_scaling * ui_scale;

    let width = util::REWARD_WIDTH as f32 * s;
    let height = util::REWARD_HEIGHT as f32 * s;
    let left = bounds.width / 2.0 - width / 2.0;
    let top = bounds.height / 2.0 - util::REWARD_Y_DISPLAY as f32 * s;
    if x < left || x >= left + width || y < top || y >= top + height {
        return None;
    }

    let fractions: &[f32] = match count {
        1 => return Some(0),
        2 | 4 => &[0.125, 0.375, 0.625, 0.875],
        3 => &[0.25, 0.5, 0.75],
        _ => return None,
    };
    let mid_y = top + height / 2.0;
    let nearest = fractions
        .iter()
        .map(|f| {
            let (dx, dy) = (left + f * width - x, mid_y - y);
            dx * dx + dy * dy
        })
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)?;

    // Two rewards reuse the four-slot points, two per reward.
    Some(if count == 2 { nearest / 2 } else { nearest })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use data::Catalog;

    use super::*;
    use crate::{Color, Config, CustomThreshold, OwnedImage, ThemeDetector, ocr::OcrPool};

    fn bounds() -> WindowBounds {
        WindowBounds::at_origin(1920, 1080)
    }

    #[test]
    fn slot_layouts_are_centered() {
        assert_eq!(
            slot_rects(968, 96, 4),
            [
                Rect::new(0, 0, 242, 96),
                Rect::new(242, 0, 242, 96),
                Rect::new(484, 0, 242, 96),
                Rect::new(726, 0, 242, 96),
            ]
        );
        assert_eq!(slot_rects(968, 96, 2), [Rect::new(242, 0, 242, 96), Rect::new(484, 0, 242, 96)]);
        assert_eq!(slot_rects(968, 96, 1), [Rect::new(363, 0, 242, 96)]);
    }

    #[test]
    fn counts_rewards_from_text_columns() {
        // Three names, each half a slot wide, centered in the three-slot layout.
        let slots = slot_rects(800, 60, 3);
        let img = OwnedImage::from_fn(800, 60, |x, y| {
            let text = (20..40).contains(&y)
                && slots
                    .iter()
                    .any(|s| x >= s.center_x() - s.w / 4 && x < s.center_x() + s.w / 4);
            if text { Color::WHITE } else { Color::new(8, 8, 8) }
        });
        let filtered = filter(img.as_image(), Theme::Equinox, &CustomThreshold::default());
        assert_eq!(detect_reward_count(&filtered), Some(3));

        let blank = OwnedImage::from_fn(800, 60, |_, _| Color::new(8, 8, 8));
        let filtered = filter(blank.as_image(), Theme::Equinox, &CustomThreshold::default());
        assert_eq!(detect_reward_count(&filtered), None);
    }

    // Name band with `count` names, each covering `fill` of its slot width.
    fn band_with_names(count: usize, fill: f32) -> Filtered {
        let slots = slot_rects(968, 96, count);
        let img = OwnedImage::from_fn(968, 96, |x, y| {
            let text = (20..60).contains(&y)
                && slots.iter().any(|s| {
                    let half = (s.w as f32 * fill / 2.0) as u32;
                    x >= s.center_x() - half && x < s.center_x() + half
                });
            if text { Color::WHITE } else { Color::new(8, 8, 8) }
        });
        filter(img.as_image(), Theme::Equinox, &CustomThreshold::default())
    }

    #[test]
    fn wide_names_keep_their_layout() {
        for count in 1..=4 {
            assert_eq!(detect_reward_count(&band_with_names(count, 0.9)), Some(count), "{count} rewards");
        }
    }

    #[test]
    fn wide_names_cover_centers_of_denser_layouts() {
        // Three long names light up every center of the four slot layout.
        let filtered = band_with_names(3, 0.9);
        assert!(
            slot_rects(968, 96, 4)
                .into_iter()
                .all(|slot| slot_density(&filtered, slot) >= MIN_SLOT_DENSITY)
        );
        assert_eq!(detect_reward_count(&filtered), Some(3));

        let filtered = band_with_names(2, 0.9);
        assert!(
            slot_rects(968, 96, 3)
                .into_iter()
                .all(|slot| slot_density(&filtered, slot) >= MIN_SLOT_DENSITY)
        );
        assert_eq!(detect_reward_count(&filtered), Some(2));
    }

    #[test]
    fn click_on_slot_center_selects_it() {
        let mid_y = 224.0 + 235.0 / 2.0;
        for (i, x) in [597.0, 839.0, 1081.0, 1323.0].into_iter().enumerate() {
            assert_eq!(get_selected((x, mid_y), &bounds(), 1.0, 4), Some(i));
        }
        assert_eq!(get_selected((960.0, mid_y), &bounds(), 1.0, 3), Some(1));
        assert_eq!(get_selected((1202.0, mid_y), &bounds(), 1.0, 3), Some(2));
        assert_eq!(get_selected((1323.0, mid_y), &bounds(), 1.0, 1), Some(0));
    }

    #[test]
    fn two_rewards_collapse_four_slot_indices() {
        let mid_y = 224.0 + 235.0 / 2.0;
        assert_eq!(get_selected((597.0, mid_y), &bounds(), 1.0, 2), Some(0));
        assert_eq!(get_selected((839.0, mid_y), &bounds(), 1.0, 2), Some(0));
        assert_eq!(get_selected((1081.0, mid_y), &bounds(), 1.0, 2), Some(1));
        assert_eq!(get_selected((1323.0, mid_y), &bounds(), 1.0, 2), Some(1));
    }

    #[test]
    fn clicks_outside_select_nothing() {
        assert_eq!(get_selected((10.0, 10.0), &bounds(), 1.0, 4), None);
        assert_eq!(get_selected((960.0, 500.0), &bounds(), 1.0, 4), None);
        assert_eq!(get_selected((960.0, 300.0), &bounds(), 1.0, 0), None);
    }

    #[test]
    fn click_is_mapped_into_window() {
        let bounds = WindowBounds {
            x: 100.0,
            y: 200.0,
            dpi: 2.0,
            ..WindowBounds::at_origin(1920, 1080)
        };
        // (100 + 839 / 2, 200 + 341.5 / 2) lands on local (839, 341.5).
        assert_eq!(get_selected((519.5, 370.75), &bounds, 1.0, 4), Some(1));
    }

    #[test]
    fn blank_capture_has_no_rewards() {
        let config = Config::default();
        let catalog = Catalog::default();
        let pool = OcrPool::new(Vec::new());
        let detector = Mutex::new(ThemeDetector::new());
        let pipeline = Pipeline {
            config: &config,
            catalog: &catalog,
            pool: &pool,
            detector: &detector,
        };
        let img = OwnedImage::from_fn(960, 540, |_, _| Color::BLACK);
        assert!(matches!(
            get_rewards(img.as_image(), &pipeline, RewardHints::default()),
            Err(IeError::NoRewards)
        ));
        assert!(!is_screen(img.as_image(), &pipeline, RewardHints::default()));
        assert!(!detector.lock().unwrap().cache().is_empty());

        let empty = OwnedImage::from_fn(0, 0, |_, _| Color::BLACK);
        assert!(matches!(
            get_rewards(empty.as_image(), &pipeline, RewardHints::default()),
            Err(IeError::EmptyRegion(_))
        ));
    }
}
