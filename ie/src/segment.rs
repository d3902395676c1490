//! Projection-based segmentation of snap-it captures into text zones.
//!
//! Rows of text are found from the row histogram, column breaks from the
//! column histogram, and the grid they span is cut into zones. Zone borders
//! sit halfway through the gaps between text, so zones tile the capture
//! without overlapping while every line keeps some margin around it.

use std::ops::Range;

use crate::{IeError, Image, Rect};

/// Blocks shorter than this many rows are noise.
const MIN_BLOCK_ROWS: u32 = 3;

// Share of discarded row blocks above which segmentation is reported as noisy.
const NOISY_DISCARD_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentThresholds {
    /// Row density that opens a text block.
    pub text_density: f64,
    /// Density a row or column must stay above to still count as content.
    pub empty_density: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            text_density: 0.015,
            empty_density: 0.01,
        }
    }
}

/// Row and column layout of a capture.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    /// Merged text row blocks.
    pub rows: Vec<Range<u32>>,
    /// Column breaks, as the gaps between column groups.
    pub column_gaps: Vec<Range<u32>>,
    pub avg_row_height: f64,
    /// Candidate blocks dropped as too short.
    pub discarded: usize,
    /// Candidate blocks kept, before merging.
    pub rows_found: usize,
    /// Zone rectangles, row-major.
    pub zones: Vec<Rect>,
}

/// One cell of a [`Segmentation`].
#[derive(Debug, Clone, Copy)]
pub struct SnapZone<'a> {
    pub rect: Rect,
    pub image: Image<'a>,
}

impl Segmentation {
    /// More candidate row blocks were dropped as noise than kept.
    pub fn is_noisy(&self) -> bool {
        let total = self.rows_found + self.discarded;
        self.discarded as f64 > total as f64 * NOISY_DISCARD_RATIO
    }

    pub fn snap_zones<'a>(&self, image: Image<'a>) -> Vec<SnapZone<'a>> {
        self.zones
            .iter()
            .map(|&rect| SnapZone {
                rect,
                image: image.sub_rect(rect),
            })
            .collect()
    }
}

fn row_blocks(row_hits: &[u32], width: u32, thresholds: SegmentThresholds) -> (Vec<Range<u32>>, usize) {
    let density = |y: usize| row_hits[y] as f64 / width.max(1) as f64;
    let mut blocks = Vec::new();
    let mut discarded = 0;

    let mut y = 0;
    while y < row_hits.len() {
        if density(y) <= thresholds.text_density {
            y += 1;
            continue;
        }
        let start = y;
        while y < row_hits.len() && density(y) > thresholds.empty_density {
            y += 1;
        }
        if (y - start) as u32 >= MIN_BLOCK_ROWS {
            blocks.push(start as u32..y as u32);
        } else {
            discarded += 1;
        }
    }
    (blocks, discarded)
}

fn merge_close(blocks: Vec<Range<u32>>, min_gap: f64) -> Vec<Range<u32>> {
    let mut merged: Vec<Range<u32>> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match merged.last_mut() {
            Some(prev) if ((block.start - prev.end) as f64) < min_gap => prev.end = block.end,
            _ => merged.push(block),
        }
    }
    merged
}

fn column_gaps(col_hits: &[u32], height: u32, thresholds: SegmentThresholds, min_width: f64) -> Vec<Range<u32>> {
    let empty = |x: usize| (col_hits[x] as f64 / height.max(1) as f64) < thresholds.empty_density;
    let mut gaps = Vec::new();

    let mut x = 0;
    while x < col_hits.len() {
        if !empty(x) {
            x += 1;
            continue;
        }
        let start = x;
        while x < col_hits.len() && empty(x) {
            x += 1;
        }
        // Margins at the edges separate nothing.
        if start == 0 || x == col_hits.len() {
            continue;
        }
        if (x - start) as f64 > min_width {
            gaps.push(start as u32..x as u32);
        }
    }
    gaps
}

// Band edges: 0, the middle of every gap, `extent`.
fn band_edges(gaps: impl Iterator<Item = Range<u32>>, extent: u32) -> Vec<u32> {
    let mut edges = vec![0];
    edges.extend(gaps.map(|gap| (gap.start + gap.end) / 2));
    edges.push(extent);
    edges
}

/// Divide a filtered capture into text zones.
///
/// `row_hits` and `col_hits` are the foreground histograms of a
/// `width`x`height` binary image. Fails with [`IeError::NoZones`] when not a
/// single text row is found.
pub fn divide(
    row_hits: &[u32],
    col_hits: &[u32],
    width: u32,
    height: u32,
    thresholds: SegmentThresholds,
) -> Result<Segmentation, IeError> {
    let (blocks, discarded) = row_blocks(row_hits, width, thresholds);
    if blocks.is_empty() {
        return Err(IeError::NoZones);
    }
    let rows_found = blocks.len();
    let avg_row_height = blocks.iter().map(|b| b.len() as f64).sum::<f64>() / blocks.len() as f64;
    let rows = merge_close(blocks, avg_row_height);
    let column_gaps = column_gaps(col_hits, height, thresholds, avg_row_height / 2.0);

    let row_edges = band_edges(
        rows.windows(2).map(|pair| pair[0].end..pair[1].start),
        height,
    );
    let col_edges = band_edges(column_gaps.iter().cloned(), width);

    let mut zones = Vec::with_capacity((row_edges.len() - 1) * (col_edges.len() - 1));
    for ys in row_edges.windows(2) {
        for xs in col_edges.windows(2) {
            zones.push(Rect::from_bounds(xs[0], ys[0], xs[1], ys[1]));
        }
    }
    log::debug!(
        "segmented into {} rows x {} columns (avg row height {avg_row_height:.1})",
        rows.len(),
        column_gaps.len() + 1
    );

    let seg = Segmentation {
        rows,
        column_gaps,
        avg_row_height,
        discarded,
        rows_found,
        zones,
    };
    if seg.is_noisy() {
        log::warn!(
            "noisy segmentation: {discarded} of {} row blocks discarded",
            rows_found + discarded
        );
    }
    Ok(seg)
}
