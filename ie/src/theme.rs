use crate::{Color, Image, Rect};

/// UI color themes the game ships with.
///
/// Each named theme paints text and highlights in its own colors, which is
/// what the foreground filter keys on. `Auto` asks for detection, `Unknown` is
/// the detector's answer when nothing matched, and `Custom` uses the
/// user-configured bands in [`CustomThreshold`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Vitruvian,
    Stalker,
    Baruuk,
    Corpus,
    Fortuna,
    Grineer,
    Lotus,
    Nidus,
    Orokin,
    Tenno,
    HighContrast,
    Legacy,
    Equinox,
    DarkLotus,
    Zephyr,
    #[default]
    Auto,
    Unknown,
    Custom,
}

impl Theme {
    /// Themes with reference colors, in declaration order.
    pub const DETECTABLE: [Theme; 15] = [
        Theme::Vitruvian,
        Theme::Stalker,
        Theme::Baruuk,
        Theme::Corpus,
        Theme::Fortuna,
        Theme::Grineer,
        Theme::Lotus,
        Theme::Nidus,
        Theme::Orokin,
        Theme::Tenno,
        Theme::HighContrast,
        Theme::Legacy,
        Theme::Equinox,
        Theme::DarkLotus,
        Theme::Zephyr,
    ];

    pub const fn primary(&self) -> Color {
        match self {
            Theme::Vitruvian => Color::new(190, 169, 102),
            Theme::Stalker => Color::new(153, 31, 35),
            Theme::Baruuk => Color::new(238, 193, 105),
            Theme::Corpus => Color::new(35, 201, 245),
            Theme::Fortuna => Color::new(57, 105, 192),
            Theme::Grineer => Color::new(255, 189, 102),
            Theme::Lotus => Color::new(36, 184, 242),
            Theme::Nidus => Color::new(140, 38, 92),
            Theme::Orokin => Color::new(20, 41, 29),
            Theme::Tenno => Color::new(9, 78, 106),
            Theme::HighContrast => Color::new(255, 255, 0),
            Theme::Legacy => Color::new(232, 213, 93),
            Theme::Equinox => Color::new(232, 227, 227),
            Theme::DarkLotus => Color::new(140, 119, 147),
            Theme::Zephyr => Color::new(253, 132, 2),
            Theme::Auto | Theme::Unknown | Theme::Custom => Color::WHITE,
        }
    }

    pub const fn secondary(&self) -> Color {
        match self {
            Theme::Vitruvian => Color::new(245, 227, 173),
            Theme::Stalker => Color::new(255, 61, 51),
            Theme::Baruuk => Color::new(236, 211, 162),
            Theme::Corpus => Color::new(111, 229, 253),
            Theme::Fortuna => Color::new(255, 115, 230),
            Theme::Grineer => Color::new(255, 224, 153),
            Theme::Lotus => Color::new(255, 241, 191),
            Theme::Nidus => Color::new(245, 73, 93),
            Theme::Orokin => Color::new(178, 125, 5),
            Theme::Tenno => Color::new(6, 106, 74),
            Theme::HighContrast => Color::new(255, 255, 0),
            Theme::Legacy => Color::new(232, 213, 93),
            Theme::Equinox => Color::new(232, 227, 227),
            Theme::DarkLotus => Color::new(200, 169, 237),
            Theme::Zephyr => Color::new(255, 53, 0),
            Theme::Auto | Theme::Unknown | Theme::Custom => Color::WHITE,
        }
    }

    pub fn is_detectable(&self) -> bool {
        !matches!(self, Theme::Auto | Theme::Unknown | Theme::Custom)
    }

    /// Whether `c` is text/highlight (foreground) under this theme.
    ///
    /// Every theme has its own hand-tuned hue window and saturation/lightness
    /// floors. `Custom`, `Unknown` and an unresolved `Auto` fall back to the
    /// configured bands.
    pub fn matches(&self, c: Color, custom: &CustomThreshold) -> bool {
        let primary = self.primary();
        let secondary = self.secondary();
        let hue = c.hue();
        let sat = c.saturation();
        let light = c.lightness();
        let near = |reference: Color, window: f32| (hue - reference.hue()).abs() < window;

        match self {
            Theme::Vitruvian => near(primary, 2.0) && sat >= 0.25 && light >= 0.42,
            Theme::Lotus => {
                (near(primary, 5.0) && sat >= 0.65 && (light - primary.lightness()).abs() <= 0.1)
                    || (near(secondary, 15.0) && light >= 0.65)
            }
            Theme::Orokin => {
                (near(primary, 5.0) && light <= 0.42 && sat >= 0.1)
                    || (near(secondary, 5.0) && (0.25..=0.5).contains(&light) && sat >= 0.25)
            }
            Theme::Stalker => {
                ((near(primary, 4.0) && sat >= 0.55) || (near(secondary, 4.0) && sat >= 0.66)) && light >= 0.25
            }
            Theme::Corpus => near(primary, 3.0) && light >= 0.42 && sat >= 0.35,
            Theme::Equinox => sat <= 0.2 && light >= 0.55,
            Theme::DarkLotus => {
                (near(secondary, 20.0) && (0.35..=0.55).contains(&light) && (0.05..=0.25).contains(&sat))
                    || (near(secondary, 4.0) && light >= 0.5 && sat >= 0.2)
            }
            Theme::Fortuna => {
                ((near(primary, 3.0) && light >= 0.35) || (near(secondary, 4.0) && light >= 0.15)) && sat >= 0.2
            }
            Theme::HighContrast => (near(primary, 3.0) || near(secondary, 2.0)) && sat >= 0.75 && light >= 0.35,
            Theme::Legacy => light >= 0.65 || (near(primary, 6.0) && light >= 0.5 && sat >= 0.5),
            Theme::Nidus => {
                ((hue - (primary.hue() + 6.0)).abs() < 8.0 && sat >= 0.3) || (near(secondary, 15.0) && sat >= 0.55)
            }
            Theme::Tenno => (near(primary, 3.0) || near(secondary, 2.0)) && sat >= 0.38 && light <= 0.55,
            Theme::Baruuk => near(primary, 2.0) && sat > 0.25 && light > 0.5,
            Theme::Grineer => {
                (near(primary, 5.0) && sat >= 0.5 && light >= 0.5) || (near(secondary, 6.0) && sat >= 0.55 && light >= 0.5)
            }
            Theme::Zephyr => {
                ((near(primary, 4.0) && sat >= 0.55) || (near(secondary, 7.0) && sat >= 0.66)) && light >= 0.25
            }
            Theme::Auto | Theme::Unknown | Theme::Custom => custom.matches(c),
        }
    }
}

// ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct RgbBand {
    pub r: [u8; 2],
    pub g: [u8; 2],
    pub b: [u8; 2],
}

impl RgbBand {
    fn matches(&self, c: Color) -> bool {
        (self.r[0]..=self.r[1]).contains(&c.r)
            && (self.g[0]..=self.g[1]).contains(&c.g)
            && (self.b[0]..=self.b[1]).contains(&c.b)
    }
}

/// Hue in degrees, saturation and lightness in `0..=1`. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct HslBand {
    pub hue: [f32; 2],
    pub saturation: [f32; 2],
    pub lightness: [f32; 2],
}

impl HslBand {
    fn matches(&self, c: Color) -> bool {
        let hue = c.hue();
        let sat = c.saturation();
        let light = c.lightness();
        hue >= self.hue[0]
            && hue <= self.hue[1]
            && sat >= self.saturation[0]
            && sat <= self.saturation[1]
            && light >= self.lightness[0]
            && light <= self.lightness[1]
    }
}

/// User-configured foreground bands for themes without built-in rules.
///
/// A band set to `None` is disabled. A pixel is foreground when any enabled
/// band matches it.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct CustomThreshold {
    pub rgb: Option<RgbBand>,
    pub hsl: Option<HslBand>,
}

impl Default for CustomThreshold {
    // Bright, near-neutral text.
    fn default() -> Self {
        Self {
            rgb: None,
            hsl: Some(HslBand {
                hue: [0.0, 360.0],
                saturation: [0.0, 1.0],
                lightness: [0.6, 1.0],
            }),
        }
    }
}

impl CustomThreshold {
    pub fn matches(&self, c: Color) -> bool {
        self.rgb.is_some_and(|band| band.matches(c)) || self.hsl.is_some_and(|band| band.matches(c))
    }
}

// ----------

/// Closest detectable theme for one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeMatch {
    pub theme: Theme,
    /// Manhattan RGB distance to the theme's primary color.
    pub distance: u32,
}

/// Memo of color → closest theme.
///
/// One byte per RGB color holding the index into [`Theme::DETECTABLE`], so the
/// table never grows past 16 MiB however many colors a capture holds. It is
/// allocated on the first lookup. Distances are recomputed on a hit.
#[derive(Default)]
pub struct ThemeCache {
    table: Vec<u8>,
    filled: usize,
}

impl std::fmt::Debug for ThemeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeCache").field("filled", &self.filled).finish()
    }
}

const UNSET: u8 = u8::MAX;
const TABLE_SIZE: usize = 1 << 24;

impl ThemeCache {
    fn slot(c: Color) -> usize {
        ((c.r as usize) << 16) | ((c.g as usize) << 8) | c.b as usize
    }

    fn get_or_insert(&mut self, c: Color, f: impl FnOnce() -> usize) -> usize {
        if self.table.is_empty() {
            self.table = vec![UNSET; TABLE_SIZE];
        }
        let slot = &mut self.table[Self::slot(c)];
        if *slot == UNSET {
            *slot = f() as u8;
            self.filled += 1;
        }
        *slot as usize
    }

    /// Number of colors resolved so far.
    pub fn len(&self) -> usize {
        self.filled
    }

    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Bytes held by the table.
    pub fn footprint(&self) -> usize {
        self.table.capacity()
    }
}

/// Where to sample for theme detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeSampling {
    pub area: Rect,
    /// Rows at the top of `area` that are skipped.
    pub header: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ThemeDetection {
    pub theme: Theme,
    /// Summed `1 / (1 + distance)^4` of every sample that voted for `theme`.
    pub weight: f64,
}

/// Classifies the active theme from reward-screen pixels.
///
/// Owns its cache; detection takes `&mut self`, so sharing a detector between
/// threads needs a lock around it.
#[derive(Debug, Default)]
pub struct ThemeDetector {
    cache: ThemeCache,
}

impl ThemeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ThemeCache {
        &self.cache
    }

    pub fn closest(&mut self, c: Color) -> ThemeMatch {
        let index = self.cache.get_or_insert(c, || {
            let mut best = (0, u32::MAX);
            for (index, theme) in Theme::DETECTABLE.into_iter().enumerate() {
                let distance = c.manhattan(theme.primary());
                if distance < best.1 {
                    best = (index, distance);
                }
            }
            best.0
        });
        let theme = Theme::DETECTABLE[index];
        ThemeMatch {
            theme,
            distance: c.manhattan(theme.primary()),
        }
    }

    /// Weighted vote over a triangular band of `sampling.area`.
    ///
    /// Rows below the header are sampled around the horizontal center; the
    /// sampled width grows linearly from a quarter of the area to half of it
    /// toward the bottom, following how the reward cards fan out.
    pub fn detect(&mut self, image: Image, sampling: ThemeSampling) -> ThemeDetection {
        let area = image.sub_rect(sampling.area);
        let (w, h) = (area.width(), area.height());
        let header = sampling.header.min(h);
        let min_width = w / 4;

        let mut weights = [0f64; Theme::DETECTABLE.len()];
        for y in header..h {
            let perc = (y - header) as f64 / (h - header) as f64;
            let row_width = ((min_width as f64 * perc) as u32 + min_width).min(w);
            let x0 = (w - row_width) / 2;
            for x in x0..x0 + row_width {
                let m = self.closest(area.at(x, y));
                if let Some(index) = Theme::DETECTABLE.iter().position(|&t| t == m.theme) {
                    weights[index] += 1.0 / (1.0 + m.distance as f64).powi(4);
                }
            }
        }

        let mut best = ThemeDetection {
            theme: Theme::Unknown,
            weight: 0.0,
        };
        for (theme, weight) in Theme::DETECTABLE.into_iter().zip(weights) {
            if weight > best.weight {
                best = ThemeDetection { theme, weight };
            }
        }
        log::debug!("theme detection: {:?} (weight {:.4})", best.theme, best.weight);
        best
    }

    /// Active theme for a run: a configured theme wins over detection, but the
    /// detection result is still returned for diagnostics.
    pub fn resolve(&mut self, image: Image, sampling: ThemeSampling, configured: Theme) -> (Theme, ThemeDetection) {
        let detected = self.detect(image, sampling);
        let active = if configured == Theme::Auto {
            detected.theme
        } else {
            configured
        };
        (active, detected)
    }
}
