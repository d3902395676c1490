//! Theme-based foreground filtering.
//!
//! Turns a color capture into a binary image (foreground black, background
//! white) and collects per-row and per-column foreground counts, which the
//! scale detector and the segmenter work from.

use crate::{Color, CustomThreshold, IeError, Image, OwnedImage, Theme, ensure_dark_text_on_light};

/// Captures shorter than this are upscaled before filtering.
pub const MIN_FILTER_HEIGHT: u32 = 100;

#[derive(Debug, Clone)]
pub struct Filtered {
    pub image: OwnedImage,
    /// Foreground pixels per row.
    pub row_hits: Vec<u32>,
    /// Foreground pixels per column.
    pub col_hits: Vec<u32>,
}

impl Filtered {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Share of foreground pixels in row `y`.
    pub fn row_density(&self, y: usize) -> f64 {
        self.row_hits[y] as f64 / self.width().max(1) as f64
    }

    /// Share of foreground pixels in column `x`.
    pub fn col_density(&self, x: usize) -> f64 {
        self.col_hits[x] as f64 / self.height().max(1) as f64
    }

    pub fn foreground_total(&self) -> u64 {
        self.row_hits.iter().map(|&v| v as u64).sum()
    }
}

/// Binarize `image` with the foreground rule of `theme`.
pub fn filter(image: Image, theme: Theme, custom: &CustomThreshold) -> Filtered {
    let (w, h) = (image.width(), image.height());
    let mut row_hits = vec![0u32; h as usize];
    let mut col_hits = vec![0u32; w as usize];

    let binary = OwnedImage::from_fn(w, h, |x, y| {
        if theme.matches(image.at(x, y), custom) {
            Color::BLACK
        } else {
            Color::WHITE
        }
    });

    let view = binary.as_image();
    for y in 0..h {
        for x in 0..w {
            if view.is_foreground(x, y) {
                row_hits[y as usize] += 1;
                col_hits[x as usize] += 1;
            }
        }
    }

    Filtered {
        image: binary,
        row_hits,
        col_hits,
    }
}

/// Theme-independent binary copy: Otsu threshold on luma, foreground black.
///
/// The minority class is taken as foreground, whichever side of the
/// threshold it is on.
pub fn otsu_binary(image: Image) -> OwnedImage {
    use imageproc::contrast::{ThresholdType, otsu_level, threshold};

    let gray = image.to_owned_image().to_gray_image();
    let level = otsu_level(&gray);
    let bin = threshold(&gray, level, ThresholdType::Binary);
    OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(bin))
}

/// Upscale `image` to at least `min_height` rows, keeping the aspect ratio.
///
/// Returns the (possibly unchanged) copy and the applied factor; divide
/// coordinates in the copy by that factor to get back to `image`.
pub fn upscale_to(image: Image, min_height: u32) -> Result<(OwnedImage, f32), IeError> {
    if image.is_empty() {
        return Err(IeError::EmptyRegion(image.rect()));
    }
    let owned = image.to_owned_image();
    if image.height() >= min_height {
        return Ok((owned, 1.0));
    }
    let factor = min_height as f32 / image.height() as f32;
    log::debug!("upscaling {}x{} capture by {factor:.2}", image.width(), image.height());
    Ok((owned.resized_h(min_height)?, factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histograms_count_foreground() {
        let img = OwnedImage::from_fn(6, 4, |x, y| {
            if x >= 2 && x < 5 && y == 1 {
                Color::WHITE
            } else {
                Color::new(10, 10, 10)
            }
        });
        let filtered = filter(img.as_image(), Theme::Equinox, &CustomThreshold::default());
        assert_eq!(filtered.row_hits, [0, 3, 0, 0]);
        assert_eq!(filtered.col_hits, [0, 0, 1, 1, 1, 0]);
        assert!(filtered.image.as_image().is_foreground(3, 1));
        assert!(!filtered.image.as_image().is_foreground(0, 0));
        assert_eq!(filtered.row_density(1), 0.5);
        assert_eq!(filtered.foreground_total(), 3);
    }

    #[test]
    fn otsu_marks_minority_as_foreground() {
        let img = OwnedImage::from_fn(10, 10, |x, _| if x < 2 { Color::WHITE } else { Color::new(20, 20, 20) });
        let bin = otsu_binary(img.as_image());
        assert!(bin.as_image().is_foreground(0, 5));
        assert!(!bin.as_image().is_foreground(5, 5));

        let inverted = OwnedImage::from_fn(10, 10, |x, _| if x < 2 { Color::new(20, 20, 20) } else { Color::WHITE });
        let bin = otsu_binary(inverted.as_image());
        assert!(bin.as_image().is_foreground(0, 5));
        assert!(!bin.as_image().is_foreground(5, 5));
    }

    #[test]
    fn small_captures_are_upscaled() {
        let img = OwnedImage::from_fn(80, 40, |_, _| Color::WHITE);
        let (up, factor) = upscale_to(img.as_image(), MIN_FILTER_HEIGHT).unwrap();
        assert_eq!((up.width(), up.height()), (200, 100));
        assert_eq!(factor, 2.5);

        let tall = OwnedImage::from_fn(10, 120, |_, _| Color::WHITE);
        let (same, factor) = upscale_to(tall.as_image(), MIN_FILTER_HEIGHT).unwrap();
        assert_eq!(same.height(), 120);
        assert_eq!(factor, 1.0);

        let empty = OwnedImage::from_fn(0, 0, |_, _| Color::WHITE);
        assert!(upscale_to(empty.as_image(), MIN_FILTER_HEIGHT).is_err());
    }
}
