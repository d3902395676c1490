//! Diagnostic snapshots of a recognition run.
//!
//! Written only when a debug directory is configured. Failures are logged and
//! never affect the run.

use std::path::Path;

use imageproc::drawing::draw_hollow_rect_mut;

use crate::{Image, Rect};

const OUTLINE: image::Rgb<u8> = image::Rgb([255, 0, 64]);

fn annotated(image: Image, rects: &[Rect]) -> image::RgbImage {
    let mut out = image.to_owned_image().to_rgb_image();
    for r in rects.iter().filter(|r| !r.is_empty()) {
        draw_hollow_rect_mut(
            &mut out,
            imageproc::rect::Rect::at(r.x as i32, r.y as i32).of_size(r.w, r.h),
            OUTLINE,
        );
    }
    out
}

/// Save `filtered` and a copy of `original` with `rects` outlined as
/// `<tag>_filtered.png` and `<tag>_annotated.png` in `dir`.
pub fn write_snapshots(dir: Option<&Path>, tag: &str, original: Image, filtered: Image, rects: &[Rect]) {
    let Some(dir) = dir else {
        return;
    };
    if let Err(err) = try_write(dir, tag, original, filtered, rects) {
        log::warn!("failed to write debug images to {}: {err:#}", dir.display());
    }
}

fn try_write(dir: &Path, tag: &str, original: Image, filtered: Image, rects: &[Rect]) -> anyhow::Result<()> {
    use anyhow::Context;

    std::fs::create_dir_all(dir).with_context(|| format!("create {:?}", dir))?;
    filtered.save_png(dir.join(format!("{tag}_filtered.png")))?;
    annotated(original, rects)
        .save_with_format(dir.join(format!("{tag}_annotated.png")), image::ImageFormat::Png)
        .context("save annotated png")?;
    log::debug!("wrote {tag} debug images to {}", dir.display());
    Ok(())
}
