//! OCR adapter and engine pool.
//!
//! Recognition itself is delegated to `ocr-rs` (Rust PaddleOCR bindings).
//! Everything the pipeline needs from it goes through [`TextRecognizer`], so
//! the engine can be swapped for a scripted fake in tests.

use std::{path::Path, sync::Mutex};

use anyhow::Context;
use rayon::prelude::*;

use crate::{Image, OwnedImage, Rect, util::DIGIT_REGEX};

// Upscale small crops; OCR generally performs better on larger glyphs.
const MIN_OCR_HEIGHT: u32 = 80;

/// How the recognizer should split its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Everything as one line.
    Line,
    /// One entry per whitespace-separated word.
    Words,
    /// Runs of digits only.
    Digits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedWord {
    pub text: String,
    /// Position inside the submitted image.
    pub rect: Rect,
}

pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image: Image, mode: TextMode) -> Vec<RecognizedWord>;
}

/// Reshape raw recognizer lines for `mode`.
///
/// Word boxes are estimated by splitting the line box proportionally to
/// character counts.
pub fn apply_mode(lines: Vec<RecognizedWord>, mode: TextMode) -> Vec<RecognizedWord> {
    match mode {
        TextMode::Line => {
            let mut iter = lines.into_iter().filter(|v| !v.text.trim().is_empty());
            let Some(first) = iter.next() else {
                return Vec::new();
            };
            let merged = iter.fold(first, |mut acc, v| {
                acc.text.push(' ');
                acc.text.push_str(v.text.trim());
                acc.rect = acc.rect.union(&v.rect);
                acc
            });
            vec![RecognizedWord {
                text: merged.text.trim().to_owned(),
                rect: merged.rect,
            }]
        }
        TextMode::Words => lines.into_iter().flat_map(split_words).collect(),
        TextMode::Digits => lines
            .into_iter()
            .flat_map(|line| {
                DIGIT_REGEX
                    .captures_iter(&line.text)
                    .map(|c| RecognizedWord {
                        text: c["digits"].to_owned(),
                        rect: line.rect,
                    })
                    .collect::<Vec<_>>()
            })
            .collect(),
    }
}

fn split_words(line: RecognizedWord) -> Vec<RecognizedWord> {
    let total = line.text.chars().count().max(1) as u64;
    let mut out = Vec::new();
    let mut offset = 0u64;
    for (i, word) in line.text.split(' ').enumerate() {
        if i > 0 {
            offset += 1;
        }
        let len = word.chars().count() as u64;
        if len > 0 {
            let x1 = line.rect.x + (line.rect.w as u64 * offset / total) as u32;
            let x2 = line.rect.x + (line.rect.w as u64 * (offset + len) / total) as u32;
            out.push(RecognizedWord {
                text: word.to_owned(),
                rect: Rect::from_bounds(x1, line.rect.y, x2.max(x1 + 1), line.rect.bottom()),
            });
        }
        offset += len;
    }
    out
}

// ----------

/// A single PaddleOCR engine.
///
/// The engine is not shared between threads; the pool hands each instance
/// its own share of the work, the lock only makes that explicit.
pub struct Ocr {
    engine: Mutex<ocr_rs::OcrEngine>,
}

impl Ocr {
    /// Initialize the OCR engine with the given model paths.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charset: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let engine = ocr_rs::OcrEngine::new(
            detection,
            recognition,
            charset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                // Parallelism comes from the pool, one thread per engine.
                thread_count: 1,
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: false,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .context("failed to initialize OCR engine (missing or invalid model files?)")?;

        Ok(Self {
            engine: Mutex::new(engine),
        })
    }

    fn recognize_lines(&self, image: Image) -> Vec<RecognizedWord> {
        let mut base = image.to_owned_image();
        let mut factor = 1.0f32;
        if base.height() < MIN_OCR_HEIGHT {
            factor = MIN_OCR_HEIGHT as f32 / base.height().max(1) as f32;
            base = match base.resized_h(MIN_OCR_HEIGHT) {
                Ok(v) => v,
                Err(err) => {
                    log::warn!("ocr upscale failed: {err}");
                    return Vec::new();
                }
            };
        }

        let input = ocr_rs::preprocess::rgb_to_image(&base.as_image().get_bytes(), base.width(), base.height());
        let Ok(engine) = self.engine.lock() else {
            log::warn!("ocr engine lock poisoned");
            return Vec::new();
        };
        match engine.recognize(&input) {
            Ok(results) => results
                .into_iter()
                .map(|v| {
                    let r = v.bbox.rect;
                    let rect = Rect::new(r.left().max(0) as u32, r.top().max(0) as u32, r.width(), r.height());
                    RecognizedWord {
                        text: v.text,
                        rect: rect.unscaled(factor).clip(image.width(), image.height()),
                    }
                })
                .collect(),
            Err(err) => {
                log::debug!("ocr failed: {err}");
                Vec::new()
            }
        }
    }
}

impl TextRecognizer for Ocr {
    fn recognize(&self, image: Image, mode: TextMode) -> Vec<RecognizedWord> {
        if image.is_empty() {
            return Vec::new();
        }
        apply_mode(self.recognize_lines(image), mode)
    }
}

// ----------

/// Fixed set of independent recognizers.
///
/// Job `i` goes to engine `i % n`. Engines run in parallel, each working
/// through its share in order; results come back in job order.
pub struct OcrPool {
    engines: Vec<Box<dyn TextRecognizer>>,
}

impl OcrPool {
    pub fn new(engines: Vec<Box<dyn TextRecognizer>>) -> Self {
        Self { engines }
    }

    /// Load `count` PaddleOCR engines from the same model files.
    pub fn load(
        count: usize,
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charset: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        let mut engines: Vec<Box<dyn TextRecognizer>> = Vec::with_capacity(count.max(1));
        for i in 0..count.max(1) {
            let engine = Ocr::try_new(detection.as_ref(), recognition.as_ref(), charset.as_ref())
                .with_context(|| format!("load OCR engine {i}"))?;
            engines.push(Box::new(engine));
        }
        log::info!("loaded {} OCR engines", engines.len());
        Ok(Self { engines })
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn recognize(&self, image: Image, mode: TextMode) -> Vec<RecognizedWord> {
        self.recognize_all(&[(image, mode)]).pop().unwrap_or_default()
    }

    /// Run every job and wait for all of them.
    pub fn recognize_all(&self, jobs: &[(Image, TextMode)]) -> Vec<Vec<RecognizedWord>> {
        let mut results = vec![Vec::new(); jobs.len()];
        let n = self.engines.len();
        if n == 0 {
            log::warn!("ocr pool has no engines; {} jobs skipped", jobs.len());
            return results;
        }

        let done: Vec<(usize, Vec<RecognizedWord>)> = self
            .engines
            .par_iter()
            .enumerate()
            .flat_map_iter(|(k, engine)| {
                jobs.iter()
                    .enumerate()
                    .skip(k)
                    .step_by(n)
                    .map(move |(i, &(image, mode))| (i, engine.recognize(image, mode)))
            })
            .collect();

        for (i, words) in done {
            results[i] = words;
        }
        results
    }
}

/// Copy of `image` with a white border, which helps the detector find text
/// that touches the crop edge.
pub fn padded(image: Image, pad: u32) -> OwnedImage {
    let (w, h) = (image.width(), image.height());
    OwnedImage::from_fn(w + pad * 2, h + pad * 2, |x, y| {
        if x < pad || y < pad || x >= w + pad || y >= h + pad {
            crate::Color::WHITE
        } else {
            image.at(x - pad, y - pad)
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::Color;

    fn line(text: &str, rect: Rect) -> RecognizedWord {
        RecognizedWord {
            text: text.to_owned(),
            rect,
        }
    }

    #[test]
    fn words_split_line_boxes() {
        let words = apply_mode(vec![line("Ash Prime", Rect::new(10, 5, 90, 20))], TextMode::Words);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], line("Ash", Rect::new(10, 5, 30, 20)));
        assert_eq!(words[1], line("Prime", Rect::new(50, 5, 50, 20)));
    }

    #[test]
    fn line_mode_joins_everything() {
        let words = apply_mode(
            vec![
                line("Forma", Rect::new(0, 0, 50, 10)),
                line(" ", Rect::new(60, 0, 5, 10)),
                line("Blueprint", Rect::new(0, 12, 80, 10)),
            ],
            TextMode::Line,
        );
        assert_eq!(words, [line("Forma Blueprint", Rect::new(0, 0, 80, 22))]);
        assert!(apply_mode(Vec::new(), TextMode::Line).is_empty());
    }

    #[test]
    fn digit_mode_keeps_numbers() {
        let words = apply_mode(vec![line("x12 owned 3", Rect::new(0, 0, 40, 10))], TextMode::Digits);
        let texts = words.iter().map(|v| v.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["12", "3"]);
    }

    struct Tagger {
        tag: usize,
        calls: AtomicUsize,
    }

    impl TextRecognizer for Tagger {
        fn recognize(&self, image: Image, _mode: TextMode) -> Vec<RecognizedWord> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            vec![line(&format!("{}:{}", self.tag, image.width()), image.rect())]
        }
    }

    #[test]
    fn pool_round_robin_keeps_job_order() {
        let img = OwnedImage::from_fn(20, 4, |_, _| Color::WHITE);
        let jobs = (1..=7)
            .map(|w| (img.as_image().sub_image(0, 0, w, 4), TextMode::Line))
            .collect::<Vec<_>>();
        let pool = OcrPool::new(
            (0..3)
                .map(|tag| {
                    Box::new(Tagger {
                        tag,
                        calls: AtomicUsize::new(0),
                    }) as Box<dyn TextRecognizer>
                })
                .collect(),
        );
        let results = pool.recognize_all(&jobs);
        let texts = results.iter().map(|v| v[0].text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, ["0:1", "1:2", "2:3", "0:4", "1:5", "2:6", "0:7"]);
    }

    #[test]
    fn empty_pool_returns_empty_results() {
        let img = OwnedImage::from_fn(4, 4, |_, _| Color::WHITE);
        let pool = OcrPool::new(Vec::new());
        let results = pool.recognize_all(&[(img.as_image(), TextMode::Words)]);
        assert_eq!(results, [Vec::<RecognizedWord>::new()]);
    }

    #[test]
    fn padding_surrounds_with_white() {
        let img = OwnedImage::from_fn(2, 2, |_, _| Color::BLACK);
        let out = padded(img.as_image(), 3);
        assert_eq!((out.width(), out.height()), (8, 8));
        assert_eq!(out.as_image().at(0, 0), Color::WHITE);
        assert_eq!(out.as_image().at(3, 3), Color::BLACK);
        assert_eq!(out.as_image().at(5, 5), Color::WHITE);
    }
}
