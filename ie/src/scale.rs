//! UI scale detection from the reward screen.
//!
//! The reward names sit at a fixed distance above the screen's vertical
//! center, scaled by the UI scale. For every candidate scale the detector
//! predicts where the parts of a line of text (cap tops, x-height body,
//! descenders) fall and scores how well the row histogram of the filtered
//! capture agrees with typical glyph densities there.

use std::ops::Range;

use crate::{Rect, util};

/// Candidate UI scales, in percent.
pub const CANDIDATES: std::ops::RangeInclusive<u32> = 50..=100;

// Top of the reward name text, in reference pixels above the screen center.
const TEXT_TOP: f32 = 177.0;
// Offsets below the text top where the glyph bands begin and end:
// [0]..[1] cap tops, [1]..[2] body, [2]..[3] descenders.
const GLYPH_SEGMENTS: [f32; 4] = [2.0, 4.0, 16.0, 21.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleEstimate {
    /// UI scale in `0.5..=1.0`.
    pub scale: f32,
    /// Deviation score of the winning candidate, lower is better.
    pub deviation: f64,
}

/// Rows the detector inspects: from the top of the reward area down to the
/// vertical center, across the reward area's width at UI scale 100%.
pub fn probe_area(width: u32, height: u32, screen_scaling: f32) -> Rect {
    let area = util::reward_area(width, height, screen_scaling);
    Rect::from_bounds(area.x, area.y, area.right(), height / 2)
}

/// Glyph bands for scale `s`, as distances (in rows) above the probe bottom.
///
/// Each range counts downward from the text top, so `range.start` is the
/// highest row of the band.
pub(crate) fn glyph_bands(s: f32) -> [Range<i64>; 3] {
    let top = (TEXT_TOP * s).round() as i64;
    let at = |i: usize| top - (GLYPH_SEGMENTS[i] * s).round() as i64;
    [at(0)..at(1), at(1)..at(2), at(2)..at(3)]
}

/// Scores one candidate percentage against a probe histogram.
///
/// `row_hits` lists the probe rows top to bottom; its last row touches the
/// screen center. Rows above the probe read as empty.
pub fn score(row_hits: &[u32], probe_width: u32, screen_scaling: f32, percent: u32) -> f64 {
    let s = screen_scaling * percent as f32 / 100.0;
    let sw = probe_width as f64 * percent as f64 / 100.0;
    let height = row_hits.len() as i64;
    let read = |up: i64| -> f64 {
        let y = height - 1 - up;
        if (0..height).contains(&y) {
            row_hits[y as usize] as f64
        } else {
            0.0
        }
    };
    // Ranges count down, so iterate from end+1 to start inclusive.
    let band = |range: &Range<i64>, expected: &dyn Fn(f64) -> f64| -> f64 {
        let len = (range.start - range.end).max(1);
        let total: f64 = (range.end + 1..=range.start).map(|up| expected(read(up))).sum();
        total / len as f64
    };

    let [top, body, tail] = glyph_bands(s);
    let top_dev = band(&top, &|r| (0.06 * sw - r).abs());
    let body_dev = band(&body, &|r| {
        if r < sw / 15.0 {
            (0.26 * sw - r) * 5.0
        } else {
            (0.24 * sw - r).abs()
        }
    });
    let tail_dev = band(&tail, &|r| 10.0 * (0.007 * sw - r).abs());
    top_dev + body_dev + tail_dev
}

/// Five-slot ranking of `(score, percent)` pairs in evaluation order.
///
/// Slots run from worst (0) to best (4). A later candidate only displaces an
/// earlier one with a strictly lower score, so on ties the earliest stays in
/// the better slot.
pub(crate) fn rank_top5(candidates: impl IntoIterator<Item = (f64, u32)>) -> [(f64, u32); 5] {
    let mut ranked = [(f64::MAX, *CANDIDATES.end()); 5];
    for (deviation, percent) in candidates {
        if deviation >= ranked[0].0 {
            continue;
        }
        let mut i = 0;
        while i < ranked.len() - 1 {
            if deviation >= ranked[i + 1].0 {
                break;
            }
            ranked[i] = ranked[i + 1];
            i += 1;
        }
        ranked[i] = (deviation, percent);
    }
    ranked
}

/// Picks the UI scale whose glyph bands best explain `row_hits`.
///
/// The answer is the best slot of [`rank_top5`] over every candidate.
pub fn detect_scale(row_hits: &[u32], probe_width: u32, screen_scaling: f32) -> ScaleEstimate {
    let ranked = rank_top5(
        CANDIDATES.map(|percent| (score(row_hits, probe_width, screen_scaling, percent), percent)),
    );
    let (deviation, percent) = ranked[4];
    log::debug!("ui scale {percent}% (deviation {deviation:.3})");
    ScaleEstimate {
        scale: percent as f32 / 100.0,
        deviation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(percent: u32, probe_width: u32, probe_height: usize) -> Vec<u32> {
        let s = percent as f32 / 100.0;
        let sw = probe_width as f64 * percent as f64 / 100.0;
        let mut hits = vec![0u32; probe_height];
        let [top, body, tail] = glyph_bands(s);
        let mut fill = |range: Range<i64>, value: f64| {
            for up in range.end + 1..=range.start {
                hits[probe_height - 1 - up as usize] = value.round() as u32;
            }
        };
        fill(top, 0.06 * sw);
        fill(body, 0.24 * sw);
        fill(tail, 0.007 * sw);
        hits
    }

    #[test]
    fn probe_matches_reward_area() {
        assert_eq!(probe_area(1920, 1080, 1.0), Rect::new(476, 224, 968, 316));
    }

    #[test]
    fn recovers_synthetic_scale() {
        let probe = probe_area(1920, 1080, 1.0);
        let hits = synthetic(80, probe.w, probe.h as usize);
        let estimate = detect_scale(&hits, probe.w, 1.0);
        assert!((0.78..=0.82).contains(&estimate.scale), "{estimate:?}");

        let hits = synthetic(100, probe.w, probe.h as usize);
        assert_eq!(detect_scale(&hits, probe.w, 1.0).scale, 1.0);
    }

    #[test]
    fn ties_keep_earliest_candidate() {
        let ranked = rank_top5([(4.0, 50), (2.0, 51), (2.0, 52), (3.0, 53), (2.0, 54)]);
        assert_eq!(ranked[4], (2.0, 51));
        assert_eq!(ranked[3], (2.0, 52));
        assert_eq!(ranked[2], (2.0, 54));
    }

    #[test]
    fn strictly_lower_score_takes_best_slot() {
        let ranked = rank_top5([(2.0, 50), (2.0, 51), (1.5, 70), (1.5, 71)]);
        assert_eq!(ranked[4], (1.5, 70));
        assert_eq!(ranked[3], (1.5, 71));
        assert_eq!(ranked[2], (2.0, 50));
    }

    #[test]
    fn empty_histogram_is_deterministic() {
        let hits = vec![0u32; 316];
        let a = detect_scale(&hits, 968, 1.0);
        let b = detect_scale(&hits, 968, 1.0);
        assert_eq!(a, b);
        assert!(CANDIDATES.contains(&((a.scale * 100.0).round() as u32)));
    }

    #[test]
    fn rows_outside_probe_read_empty() {
        // A histogram too short for the text band still scores without panicking.
        let score = score(&[5, 5, 5], 968, 1.0, 100);
        assert!(score.is_finite() && score > 0.0);
    }
}
