//! Image primitives and utilities.
//!
//! The project uses a lightweight owned RGB image type (`OwnedImage`) that is
//! optimized for repeated cropping/resizing of screen captures. Every pipeline
//! stage that changes pixels produces a new `OwnedImage`; captured buffers are
//! never written to.
//!
//! For many operations we borrow a view (`Image<'a>`) instead of copying pixels.
//! This keeps the CV pipeline fast while still allowing easy conversion to owned
//! images when needed (OCR preprocessing, debug snapshots, etc.).

use anyhow::Context;

use crate::IeError;

/// Owned RGB image (no alpha), row-major.
#[derive(Clone, Debug)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    pub fn new(width: u32, height: u32, data: Vec<Color>) -> Result<Self, IeError> {
        if data.len() != (width as usize) * (height as usize) {
            return Err(IeError::BufferSize {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> Color) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Build an `OwnedImage` from 32-bit `0xAARRGGBB` pixels, as handed over by
    /// the capture service (alpha is discarded).
    pub fn from_argb(width: u32, height: u32, pixels: &[u32]) -> Result<Self, IeError> {
        Self::new(width, height, pixels.iter().map(|&v| Color::from_argb(v)).collect())
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Resize this image to the given height (preserving aspect ratio).
    ///
    /// Uses `fast_image_resize` with a Catmull-Rom (bicubic) filter.
    pub fn resize_h(&mut self, height: u32) -> Result<(), IeError> {
        if self.height == height {
            return Ok(());
        }
        if self.width == 0 || self.height == 0 {
            return Err(IeError::EmptyRegion(Rect::new(0, 0, self.width, self.height)));
        }

        let height = height.max(1);
        let width = ((self.width as u64 * height as u64 / self.height as u64) as u32).max(1);

        let src_bytes = self.as_image().get_bytes();
        let src = fast_image_resize::images::ImageRef::new(
            self.width,
            self.height,
            &src_bytes,
            fast_image_resize::PixelType::U8x3,
        )
        .map_err(|err| IeError::Resize(err.to_string()))?;

        let mut dst = fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
        );

        resizer
            .resize(&src, &mut dst, &options)
            .map_err(|err| IeError::Resize(err.to_string()))?;

        let bytes: Vec<u8> = dst.into_vec();
        let mut data = Vec::with_capacity((width * height) as usize);
        for px in bytes.chunks_exact(3) {
            data.push(Color::new(px[0], px[1], px[2]));
        }

        self.width = width;
        self.height = height;
        self.data = data;
        Ok(())
    }

    #[inline]
    pub fn resized_h(mut self, height: u32) -> Result<Self, IeError> {
        self.resize_h(height)?;
        Ok(self)
    }

    pub fn map_pixels(&mut self, f: impl Fn(&mut Color)) {
        for v in &mut self.data {
            f(v);
        }
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image<'a>(&'a self) -> Image<'a> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }

    /// Convert to a grayscale `GrayImage` (luma).
    pub fn to_gray_image(&self) -> image::GrayImage {
        use image::{GrayImage, Luma};
        let mut out = GrayImage::new(self.width, self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let c = self.data[(x + y * self.width) as usize];
                out.put_pixel(x, y, Luma([c.luma()]));
            }
        }
        out
    }

    /// Create an RGB `OwnedImage` from a grayscale image (each pixel repeated into RGB).
    pub fn from_gray_as_rgb(gray: &image::GrayImage) -> Self {
        let (w, h) = gray.dimensions();
        let mut data = Vec::with_capacity((w * h) as usize);
        for p in gray.pixels() {
            let v = p.0[0];
            data.push(Color::new(v, v, v));
        }
        Self {
            width: w,
            height: h,
            data,
        }
    }

    pub fn to_rgb_image(&self) -> image::RgbImage {
        image::RgbImage::from_fn(self.width, self.height, |x, y| {
            let c = self.data[(x + y * self.width) as usize];
            image::Rgb([c.r, c.g, c.b])
        })
    }

    pub fn from_rgb_image(img: &image::RgbImage) -> Self {
        let (w, h) = img.dimensions();
        Self {
            width: w,
            height: h,
            data: img.pixels().map(|p| Color::new(p.0[0], p.0[1], p.0[2])).collect(),
        }
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl std::fmt::Debug for Image<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("x", &self.x1)
            .field("y", &self.y1)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Position of this view inside the image it borrows from.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.width(), self.height())
    }

    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> &Color {
        &self.data[(x + y * self.true_width) as usize]
    }

    /// Pixel at view-relative coordinates. Panics when out of bounds.
    #[inline(always)]
    pub fn at(&self, x: u32, y: u32) -> Color {
        debug_assert!(x < self.width() && y < self.height());
        *self.pixel(self.x1 + x, self.y1 + y)
    }

    /// Pixel at view-relative coordinates, `None` when out of bounds.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Option<Color> {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return None;
        }
        Some(self.at(x as u32, y as u32))
    }

    /// Binary images mark foreground with black.
    #[inline]
    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.at(x, y) == Color::BLACK
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                data.push(*self.pixel(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; (self.width() * self.height() * 3) as usize];
        let mut i = 0;
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                bytes[i] = clr.r;
                bytes[i + 1] = clr.g;
                bytes[i + 2] = clr.b;
                i += 3;
            }
        }
        bytes
    }

    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let bytes = self.get_bytes();
        let img = image::RgbImage::from_raw(self.width(), self.height(), bytes)
            .context("RgbImage::from_raw failed")?;
        img.save_with_format(path, image::ImageFormat::Png)
            .context("save png")?;
        Ok(())
    }

    /// Create an arbitrary subimage (relative coordinates), clamped to this view.
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    #[inline]
    pub fn sub_rect(&self, rect: Rect) -> Self {
        self.sub_image(rect.x, rect.y, rect.w, rect.h)
    }

    /// Like [`Image::sub_rect`], but a crop that ends up empty is an error.
    pub fn crop(&self, rect: Rect) -> Result<Self, IeError> {
        let sub = self.sub_rect(rect);
        if sub.is_empty() {
            return Err(IeError::EmptyRegion(rect));
        }
        Ok(sub)
    }

    pub fn average_color(&self) -> Color {
        let mut r = 0u32;
        let mut g = 0u32;
        let mut b = 0u32;

        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                r += clr.r as u32;
                g += clr.g as u32;
                b += clr.b as u32;
            }
        }

        let count = (self.width() * self.height()).max(1);
        Color {
            r: (r / count) as u8,
            g: (g / count) as u8,
            b: (b / count) as u8,
        }
    }

    /// Number of foreground (black) pixels.
    pub fn foreground_count(&self) -> u32 {
        let mut count = 0;
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                if *self.pixel(x, y) == Color::BLACK {
                    count += 1;
                }
            }
        }
        count
    }
}

/// If the image is mostly black, invert it so the background becomes light.
pub fn ensure_dark_text_on_light(mut bin: image::GrayImage) -> image::GrayImage {
    let mut white = 0u64;
    let mut black = 0u64;
    for p in bin.pixels() {
        if p.0[0] > 0 {
            white += 1;
        } else {
            black += 1;
        }
    }
    if black > white {
        for p in bin.pixels_mut() {
            p.0[0] = 255u8.saturating_sub(p.0[0]);
        }
    }
    bin
}

// ----------

/// Axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle spanning `[x1, x2) × [y1, y2)`; inverted bounds give an empty rect.
    pub fn from_bounds(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self::new(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1))
    }

    pub fn right(&self) -> u32 {
        self.x + self.w
    }
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }
    pub fn center_x(&self) -> u32 {
        self.x + self.w / 2
    }
    pub fn center_y(&self) -> u32 {
        self.y + self.h / 2
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlap with a positive area. Rects that only share an edge don't intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_bounds(
            self.x.min(other.x),
            self.y.min(other.y),
            self.right().max(other.right()),
            self.bottom().max(other.bottom()),
        )
    }

    /// Grow by `dx`/`dy` on every side (saturating at 0).
    pub fn inflate(&self, dx: u32, dy: u32) -> Rect {
        Rect::from_bounds(
            self.x.saturating_sub(dx),
            self.y.saturating_sub(dy),
            self.right() + dx,
            self.bottom() + dy,
        )
    }

    pub fn clip(&self, width: u32, height: u32) -> Rect {
        Rect::from_bounds(
            self.x.min(width),
            self.y.min(height),
            self.right().min(width),
            self.bottom().min(height),
        )
    }

    pub fn offset(&self, dx: u32, dy: u32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }

    /// Map from a space that was scaled up by `factor` back to the original.
    pub fn unscaled(&self, factor: f32) -> Rect {
        if factor == 1.0 {
            return *self;
        }
        let x1 = (self.x as f32 / factor).floor() as u32;
        let y1 = (self.y as f32 / factor).floor() as u32;
        let x2 = (self.right() as f32 / factor).ceil() as u32;
        let y2 = (self.bottom() as f32 / factor).ceil() as u32;
        Rect::from_bounds(x1, y1, x2, y2)
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub const fn from_argb(argb: u32) -> Self {
        Self::new((argb >> 16) as u8, (argb >> 8) as u8, argb as u8)
    }

    /// Deviation metric used throughout the project for UI color checks.
    ///
    /// NOTE: This is intentionally *not* Euclidean distance; it is tuned for
    /// robust thresholding in the presence of compression and post-processing.
    pub fn deviation(&self, other: Color) -> f32 {
        (((self.r as f32 - other.r as f32).abs() / 255.0 / 3.0
            + (self.g as f32 - other.g as f32).abs() / 255.0 / 3.0
            + (self.b as f32 - other.b as f32).abs() / 255.0 / 3.0)
            / 0.05)
            .powi(3)
    }

    /// Manhattan distance in RGB space (0..=765).
    #[inline]
    pub fn manhattan(&self, other: Color) -> u32 {
        self.r.abs_diff(other.r) as u32 + self.g.abs_diff(other.g) as u32 + self.b.abs_diff(other.b) as u32
    }

    /// Compute luma (grayscale intensity).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    #[inline]
    fn max_min(&self) -> (f32, f32) {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        (r.max(g).max(b), r.min(g).min(b))
    }

    /// HSL hue in degrees (0..360). Gray has hue 0.
    pub fn hue(&self) -> f32 {
        if self.r == self.g && self.g == self.b {
            return 0.0;
        }
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let (max, min) = self.max_min();
        let delta = max - min;

        let sector = if r == max {
            (g - b) / delta
        } else if g == max {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        let hue = sector * 60.0;

        if hue < 0.0 { hue + 360.0 } else { hue }
    }

    /// HSL saturation (0..=1).
    pub fn saturation(&self) -> f32 {
        let (max, min) = self.max_min();
        if max == min {
            return 0.0;
        }
        let l = (max + min) / 2.0;
        if l <= 0.5 {
            (max - min) / (max + min)
        } else {
            (max - min) / (2.0 - max - min)
        }
    }

    /// HSL lightness (0..=1).
    pub fn lightness(&self) -> f32 {
        let (max, min) = self.max_min();
        (max + min) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsl_matches_reference_values() {
        let red = Color::new(255, 0, 0);
        assert_eq!(red.hue(), 0.0);
        assert!((red.saturation() - 1.0).abs() < 1e-6);
        assert!((red.lightness() - 0.5).abs() < 1e-6);

        let blue = Color::new(0, 0, 255);
        assert!((blue.hue() - 240.0).abs() < 1e-3);

        let magenta_ish = Color::new(255, 0, 128);
        assert!(magenta_ish.hue() > 300.0);

        let gray = Color::new(128, 128, 128);
        assert_eq!(gray.hue(), 0.0);
        assert_eq!(gray.saturation(), 0.0);
    }

    #[test]
    fn argb_drops_alpha() {
        assert_eq!(Color::from_argb(0xFF10_2030), Color::new(0x10, 0x20, 0x30));
        let img = OwnedImage::from_argb(2, 1, &[0xFF00_0000, 0x00FF_FFFF]).unwrap();
        assert_eq!(img.as_image().at(0, 0), Color::BLACK);
        assert_eq!(img.as_image().at(1, 0), Color::WHITE);
        assert!(OwnedImage::from_argb(2, 2, &[0; 3]).is_err());
    }

    #[test]
    fn sub_images_clamp_and_report_position() {
        let img = OwnedImage::from_fn(10, 8, |x, y| Color::new(x as u8, y as u8, 0));
        let view = img.as_image().sub_image(6, 4, 10, 10);
        assert_eq!(view.rect(), Rect::new(6, 4, 4, 4));
        assert_eq!(view.at(1, 2), Color::new(7, 6, 0));
        assert_eq!(view.get(4, 0), None);
        assert_eq!(view.get(-1, 0), None);
        assert!(img.as_image().crop(Rect::new(20, 0, 5, 5)).is_err());
    }

    #[test]
    fn upscale_preserves_aspect() {
        let img = OwnedImage::from_fn(40, 20, |x, _| if x < 20 { Color::BLACK } else { Color::WHITE });
        let up = img.resized_h(100).unwrap();
        assert_eq!((up.width(), up.height()), (200, 100));
        assert!(up.as_image().at(10, 50).luma() < 5);
        assert!(up.as_image().at(190, 50).luma() > 250);
    }

    #[test]
    fn rect_geometry() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 5, 5);
        assert!(!a.intersects(&b));
        assert!(a.inflate(1, 0).intersects(&b));
        assert_eq!(a.union(&b), Rect::new(0, 0, 15, 10));
        assert_eq!(Rect::new(5, 5, 10, 10).clip(8, 12), Rect::new(5, 5, 3, 7));
        assert_eq!(Rect::new(10, 10, 20, 20).unscaled(2.0), Rect::new(5, 5, 10, 10));
    }
}
