use crate::Rect;

/// Hard failures of a recognition run.
///
/// Anything listed here aborts the run without a partial result. Soft
/// problems (ambiguous names, missing count badges, noisy segmentation) never
/// surface as errors; they end up as flags on the returned items or in the log.
#[derive(Debug, thiserror::Error)]
pub enum IeError {
    #[error("crop {0:?} is empty")]
    EmptyRegion(Rect),

    #[error("pixel buffer holds {len} pixels, expected {width}x{height}")]
    BufferSize { len: usize, width: u32, height: u32 },

    #[error("resize failed: {0}")]
    Resize(String),

    #[error("no reward slots could be isolated")]
    NoRewards,

    #[error("no text zones could be isolated")]
    NoZones,
}
