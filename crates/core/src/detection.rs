//! Snow/no-snow decision from classification counts.

use serde::Serialize;

use crate::classify::ClassificationResult;

/// Thresholds applied by a detection cycle. Loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThresholds {
    /// Per-pixel luminance cutoff (inclusive).
    pub brightness: u8,
    /// Bright fraction of the region at or above which snow is reported.
    pub snow_ratio: f64,
}

/// Result of one detection cycle, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetectionOutcome {
    pub snow_detected: bool,
    pub ratio: f64,
    pub counts: ClassificationResult,
}

/// Compare the bright ratio of `counts` against `snow_ratio_threshold`.
///
/// An empty region is never snow, even with a zero threshold.
pub fn decide(counts: ClassificationResult, snow_ratio_threshold: f64) -> DetectionOutcome {
    let ratio = counts.ratio();
    DetectionOutcome {
        snow_detected: counts.total_within_mask > 0 && ratio >= snow_ratio_threshold,
        ratio,
        counts,
    }
}
