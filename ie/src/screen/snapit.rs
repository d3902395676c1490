//! Snap-it: recognition on a user-selected region of the inventory.
//!
//! Unlike the reward screen nothing about the layout is known up front. The
//! region is filtered, cut into text zones by projection, and every zone is
//! read word by word; words are then clustered back into item labels.

use crate::{
    IeError, Image, ThemeSampling, debug,
    count::{self, CountSources},
    filter::{MIN_FILTER_HEIGHT, filter, otsu_binary, upscale_to},
    item::{InventoryItem, ItemArena},
    ocr::{RecognizedWord, TextMode},
    segment,
};

use super::Pipeline;

/// Recognize the items in `image`.
///
/// Item rectangles are in `image` coordinates. Fails when the region is empty
/// or holds no text rows at all.
pub fn get_items(image: Image, pipeline: &Pipeline) -> Result<Vec<InventoryItem>, IeError> {
    let (up, factor) = upscale_to(image, MIN_FILTER_HEIGHT)?;
    let view = up.as_image();

    let sampling = ThemeSampling {
        area: view.rect(),
        header: 0,
    };
    let (theme, _) = pipeline.theme(view, sampling);
    let filtered = filter(view, theme, &pipeline.config.custom_threshold);
    let clean = otsu_binary(view);

    let seg = segment::divide(
        &filtered.row_hits,
        &filtered.col_hits,
        filtered.width(),
        filtered.height(),
        pipeline.config.segment_thresholds(),
    )?;
    let zones = seg
        .snap_zones(filtered.image.as_image())
        .into_iter()
        .filter(|z| z.image.foreground_count() > 0)
        .collect::<Vec<_>>();
    log::debug!("snap-it: {} of {} zones hold text", zones.len(), seg.zones.len());

    let jobs = zones.iter().map(|z| (z.image, TextMode::Words)).collect::<Vec<_>>();
    let results = pipeline.pool.recognize_all(&jobs);
    let words = zones
        .iter()
        .zip(results)
        .flat_map(|(zone, words)| {
            words.into_iter().map(move |w| RecognizedWord {
                text: w.text,
                rect: w.rect.offset(zone.rect.x, zone.rect.y),
            })
        })
        .collect::<Vec<_>>();

    let mut arena = ItemArena::new();
    arena.cluster_words(words);
    arena.clean_text(pipeline.config.language);
    arena.resolve_names(&pipeline.resolver());
    count::detect_counts(
        &mut arena,
        CountSources {
            filtered: filtered.image.as_image(),
            clean: clean.as_image(),
            original: view,
        },
        pipeline.pool,
    );

    let rects = arena.iter().map(|(_, v)| v.rect).collect::<Vec<_>>();
    debug::write_snapshots(
        pipeline.config.debug_dir.as_deref(),
        "snapit",
        view,
        filtered.image.as_image(),
        &rects,
    );

    let mut items = arena.into_items();
    for item in &mut items {
        item.rect = item.rect.unscaled(factor).clip(image.width(), image.height());
    }
    log::info!(
        "snap-it: {} items, {} flagged",
        items.len(),
        items.iter().filter(|v| v.warning).count()
    );
    Ok(items)
}
