//! Owned-count badges on snap-it captures.
//!
//! Items the player owns several of carry a small pill above their label: an
//! icon followed by the amount. The detector looks for that icon in the top
//! left of the cell above each label, reads the pill's background from the
//! pixels around the icon, cuts out the digits and hands them to OCR.
//!
//! Anything that doesn't line up leaves the count at 1; a missing badge just
//! means a single copy.

use std::{collections::VecDeque, ops::Range};

use crate::{
    Color, Image, OwnedImage, Rect,
    item::{ItemArena, ItemId},
    ocr::{OcrPool, TextMode},
};

const MIN_MASS: usize = 12;
const MIN_ICON_PIXELS: usize = 6;
const MIN_FILL_RADIUS: u32 = 4;
const BACKGROUND_RUN: u32 = 3;
const SIMILAR_DEVIATION: f32 = 1.0;

/// Images the detector works from. All three share one coordinate space.
#[derive(Debug, Clone, Copy)]
pub struct CountSources<'a> {
    /// Theme-filtered binary.
    pub filtered: Image<'a>,
    /// Theme-independent binary, see [`crate::filter::otsu_binary`].
    pub clean: Image<'a>,
    pub original: Image<'a>,
}

impl CountSources<'_> {
    // Foreground that isn't theme text: icons, badges.
    fn is_mark(&self, x: u32, y: u32) -> bool {
        self.clean.is_foreground(x, y) && !self.filtered.is_foreground(x, y)
    }
}

fn merge_bands(mut bands: Vec<Range<u32>>) -> Vec<Range<u32>> {
    bands.sort_by_key(|b| b.start);
    let mut merged: Vec<Range<u32>> = Vec::with_capacity(bands.len());
    for band in bands {
        match merged.last_mut() {
            Some(prev) if band.start < prev.end => prev.end = prev.end.max(band.end),
            _ => merged.push(band),
        }
    }
    merged
}

/// Row and column layout implied by the item labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub rows: Vec<Range<u32>>,
    pub columns: Vec<Range<u32>>,
}

impl Grid {
    pub fn from_rects(rects: &[Rect]) -> Self {
        Self {
            rows: merge_bands(rects.iter().map(|r| r.y..r.bottom()).collect()),
            columns: merge_bands(rects.iter().map(|r| r.x..r.right()).collect()),
        }
    }

    /// The area between the label row above (or the capture top) and `label`,
    /// widened by a quarter of the column on both sides.
    pub fn cell_above(&self, label: Rect, width: u32) -> Option<Rect> {
        let r = self.rows.iter().position(|b| b.contains(&label.y))?;
        let c = self.columns.iter().position(|b| b.contains(&label.x))?;
        let top = if r > 0 { self.rows[r - 1].end } else { 0 };
        let bottom = self.rows[r].start;
        let column = &self.columns[c];
        let widen = column.len() as u32 / 4;
        let cell = Rect::from_bounds(
            column.start.saturating_sub(widen),
            top,
            (column.end + widen).min(width),
            bottom,
        );
        (!cell.is_empty()).then_some(cell)
    }
}

// Icon bounds found by flood fill, or `None` when there's no compact blob.
fn find_icon(sources: CountSources, cell: Rect) -> Option<Rect> {
    let search = Rect::new(cell.x, cell.y, cell.w / 2, cell.h / 2)
        .clip(sources.original.width(), sources.original.height());

    let mut mass = Vec::new();
    for y in search.y..search.bottom() {
        for x in search.x..search.right() {
            if sources.is_mark(x, y) {
                mass.push((x, y));
            }
        }
    }
    if mass.len() < MIN_MASS {
        return None;
    }

    let n = mass.len() as u64;
    let cx = (mass.iter().map(|p| p.0 as u64).sum::<u64>() / n) as i64;
    let cy = (mass.iter().map(|p| p.1 as u64).sum::<u64>() / n) as i64;
    let &(sx, sy) = mass
        .iter()
        .min_by_key(|&&(x, y)| (x as i64 - cx).pow(2) + (y as i64 - cy).pow(2))?;

    let radius = (cell.h / 6).max(MIN_FILL_RADIUS);
    let mut seen = vec![false; search.area() as usize];
    let index = |x: u32, y: u32| ((y - search.y) * search.w + (x - search.x)) as usize;
    let mut queue = VecDeque::from([(sx, sy)]);
    seen[index(sx, sy)] = true;
    let mut bounds = Rect::new(sx, sy, 1, 1);
    let mut filled = 0usize;

    while let Some((x, y)) = queue.pop_front() {
        if x.abs_diff(sx) >= radius || y.abs_diff(sy) >= radius {
            // Too large for an icon; probably a frame or artwork.
            return None;
        }
        filled += 1;
        bounds = bounds.union(&Rect::new(x, y, 1, 1));

        let neighbors = [
            (x.wrapping_sub(1), y),
            (x + 1, y),
            (x, y.wrapping_sub(1)),
            (x, y + 1),
        ];
        for (nx, ny) in neighbors {
            if search.contains(nx, ny) && !seen[index(nx, ny)] && sources.is_mark(nx, ny) {
                seen[index(nx, ny)] = true;
                queue.push_back((nx, ny));
            }
        }
    }

    (filled >= MIN_ICON_PIXELS).then_some(bounds)
}

// Pill background: the first color that repeats along the diagonal walking
// away from the icon's bottom right corner.
fn pill_background(original: Image, icon: Rect, cell: Rect) -> Option<Color> {
    let mut previous: Option<Color> = None;
    let mut run = 0;
    for k in 0.. {
        let (x, y) = (icon.right() + k, icon.bottom() + k);
        if !cell.contains(x, y) {
            return None;
        }
        let c = original.get(x as i64, y as i64)?;
        run = match previous {
            Some(p) if p.deviation(c) < SIMILAR_DEVIATION => run + 1,
            _ => 1,
        };
        if run >= BACKGROUND_RUN {
            return Some(c);
        }
        previous = Some(c);
    }
    None
}

// Right edge of the pill along the icon's center row. Digits interrupt the
// background briefly; a gap wider than the icon means the pill has ended.
fn pill_end(original: Image, icon: Rect, cell: Rect, background: Color) -> u32 {
    let y = icon.center_y();
    let mut last = icon.right();
    for x in icon.right()..cell.right() {
        let Some(c) = original.get(x as i64, y as i64) else {
            break;
        };
        if c.deviation(background) < SIMILAR_DEVIATION {
            last = x + 1;
        } else if x - last > icon.w {
            break;
        }
    }
    last
}

/// Binarized amount crop next to the icon in `cell`, ready for digit OCR.
fn pill_digits(sources: CountSources, cell: Rect) -> Option<OwnedImage> {
    let icon = find_icon(sources, cell)?;
    let background = pill_background(sources.original, icon, cell)?;
    let end = pill_end(sources.original, icon, cell, background);
    let crop = Rect::from_bounds(icon.right(), icon.y, end, icon.bottom());
    let digits = sources.original.crop(crop).ok()?;

    let mut out = digits.to_owned_image();
    out.map_pixels(|v| {
        *v = if v.deviation(background) < SIMILAR_DEVIATION {
            Color::WHITE
        } else {
            Color::BLACK
        };
    });
    Some(out)
}

/// Set [`InventoryItem::count`](crate::item::InventoryItem::count) for every
/// item with a readable badge. Item rectangles must be in the coordinate space
/// of `sources`.
pub fn detect_counts(arena: &mut ItemArena, sources: CountSources, pool: &OcrPool) {
    let rects = arena.iter().map(|(_, v)| v.rect).collect::<Vec<_>>();
    let grid = Grid::from_rects(&rects);
    let mut crops: Vec<(ItemId, OwnedImage)> = Vec::new();
    for (id, item) in arena.iter() {
        let Some(cell) = grid.cell_above(item.rect, sources.original.width()) else {
            continue;
        };
        if let Some(crop) = pill_digits(sources, cell) {
            crops.push((id, crop));
        }
    }
    log::debug!("{} of {} items carry a count badge", crops.len(), arena.len());

    let jobs = crops
        .iter()
        .map(|(_, img)| (img.as_image(), TextMode::Digits))
        .collect::<Vec<_>>();
    let results = pool.recognize_all(&jobs);
    for ((id, _), words) in crops.iter().zip(results) {
        let count = words
            .first()
            .and_then(|w| w.text.parse::<u32>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);
        arena.get_mut(*id).count = count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CustomThreshold, Theme,
        filter::{filter, otsu_binary},
        item::InventoryItem,
        ocr::{RecognizedWord, TextRecognizer},
    };

    const BACKGROUND: Color = Color::new(20, 20, 20);
    const PILL: Color = Color::new(60, 60, 140);
    const ICON: Color = Color::new(255, 230, 60);
    const TEXT: Color = Color::new(250, 250, 250);

    fn scene() -> OwnedImage {
        OwnedImage::from_fn(400, 140, |x, y| {
            let label = y >= 100 && y < 120 && ((20..180).contains(&x) || (220..380).contains(&x));
            let icon = (34..44).contains(&x) && (26..38).contains(&y);
            let stroke = ((52..54).contains(&x) || (60..62).contains(&x)) && (26..38).contains(&y);
            let pill = (30..100).contains(&x) && (20..44).contains(&y);
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

    struct Digits(&'static str);

    impl TextRecognizer for Digits {
        fn recognize(&self, image: Image, _mode: TextMode) -> Vec<RecognizedWord> {
            vec![RecognizedWord {
                text: self.0.to_owned(),
                rect: image.rect(),
            }]
        }
    }

    #[test]
    fn grid_merges_overlapping_bands() {
        let grid = Grid::from_rects(&[
            Rect::new(10, 100, 50, 20),
            Rect::new(100, 105, 50, 20),
            Rect::new(12, 200, 40, 20),
        ]);
        assert_eq!(grid.rows, [100..125, 200..220]);
        assert_eq!(grid.columns, [10..60, 100..150]);
        assert_eq!(grid.cell_above(Rect::new(12, 200, 40, 20), 500), Some(Rect::new(0, 125, 72, 75)));
        assert_eq!(grid.cell_above(Rect::new(100, 105, 50, 20), 500), Some(Rect::new(88, 0, 74, 100)));
    }

    #[test]
    fn reads_badge_and_defaults_to_one() {
        let original = scene();
        let filtered = filter(original.as_image(), Theme::Equinox, &CustomThreshold::default());
        let clean = otsu_binary(original.as_image());
        let sources = CountSources {
            filtered: filtered.image.as_image(),
            clean: clean.as_image(),
            original: original.as_image(),
        };

        let cell = Rect::new(0, 0, 220, 100);
        let icon = find_icon(sources, cell).unwrap();
        assert_eq!(icon, Rect::new(34, 26, 10, 12));
        assert_eq!(pill_background(sources.original, icon, cell), Some(PILL));
        assert_eq!(pill_end(sources.original, icon, cell, PILL), 100);

        let mut arena = ItemArena::new();
        let badged = arena.push(InventoryItem::new("Forma Blueprint", Rect::new(20, 100, 160, 20)));
        let plain = arena.push(InventoryItem::new("Orokin Cell", Rect::new(220, 100, 160, 20)));
        let pool = OcrPool::new(vec![Box::new(Digits("3")) as Box<dyn TextRecognizer>]);
        detect_counts(&mut arena, sources, &pool);
        assert_eq!(arena.get(badged).count, 3);
        assert_eq!(arena.get(plain).count, 1);
    }

    #[test]
    fn unreadable_badge_counts_one() {
        let original = scene();
        let filtered = filter(original.as_image(), Theme::Equinox, &CustomThreshold::default());
        let clean = otsu_binary(original.as_image());
        let sources = CountSources {
            filtered: filtered.image.as_image(),
            clean: clean.as_image(),
            original: original.as_image(),
        };
        let mut arena = ItemArena::new();
        let id = arena.push(InventoryItem::new("Forma Blueprint", Rect::new(20, 100, 160, 20)));
        let pool = OcrPool::new(vec![Box::new(Digits("0")) as Box<dyn TextRecognizer>]);
        detect_counts(&mut arena, sources, &pool);
        assert_eq!(arena.get(id).count, 1);
    }
}
