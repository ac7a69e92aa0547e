//! Post-processing of raw detector output into probability masks.
//!
//! A CRAFT-style detector emits a two-channel score map: channel 0 holds
//! per-position text logits, channel 1 holds link logits binding characters
//! into words. [`CraftPostProcess`] applies a sigmoid to both channels and
//! thresholds them into the boolean masks consumed by connected-component
//! extraction.

use tracing::debug;

use crate::core::errors::{OcrError, OcrResult};

/// Thresholded text and link masks for one detector run.
///
/// Both masks are row-major with length `width * height` and are immutable
/// after creation.
#[derive(Debug, Clone)]
pub struct DetectionMap {
    /// Positions whose text probability exceeded the text threshold.
    pub text_mask: Vec<bool>,
    /// Positions whose link probability exceeded the link threshold.
    pub link_mask: Vec<bool>,
    /// Mask width in positions.
    pub width: usize,
    /// Mask height in positions.
    pub height: usize,
}

/// Post-processor for CRAFT-style text detection output.
#[derive(Debug, Clone, Copy)]
pub struct CraftPostProcess {
    /// Sigmoid probability above which a position counts as text.
    pub text_threshold: f32,
    /// Sigmoid probability above which a position counts as a link.
    pub link_threshold: f32,
}

impl CraftPostProcess {
    /// Creates a post-processor with optional thresholds.
    ///
    /// Both thresholds default to 0.5 and must lie in (0, 1).
    pub fn new(text_threshold: Option<f32>, link_threshold: Option<f32>) -> Self {
        Self {
            text_threshold: text_threshold.unwrap_or(0.5),
            link_threshold: link_threshold.unwrap_or(0.5),
        }
    }

    /// Thresholds a flat detector output into text and link masks.
    ///
    /// The scores are read channel-last: position `(y, x)` contributes
    /// `scores[(y*width + x) * channels]` as its text logit and the next
    /// value as its link logit. One O(H*W) pass, no allocation beyond the
    /// two masks.
    ///
    /// # Errors
    ///
    /// * [`OcrError::OutputSizeMismatch`] when the buffer is shorter than
    ///   `height * width * channels`
    /// * [`OcrError::InvalidInput`] when fewer than 2 channels are declared
    pub fn apply(
        &self,
        scores: &[f32],
        height: usize,
        width: usize,
        channels: usize,
    ) -> OcrResult<DetectionMap> {
        if channels < 2 {
            return Err(OcrError::invalid_input(format!(
                "detector output needs text and link channels, got {channels}"
            )));
        }

        let needed = height * width * channels;
        if scores.len() < needed {
            return Err(OcrError::output_size_mismatch(needed, scores.len()));
        }

        let positions = height * width;
        let mut text_mask = vec![false; positions];
        let mut link_mask = vec![false; positions];
        let mut text_pixels = 0usize;
        let mut link_pixels = 0usize;

        for pos in 0..positions {
            let base = pos * channels;
            if sigmoid(scores[base]) > self.text_threshold {
                text_mask[pos] = true;
                text_pixels += 1;
            }
            if sigmoid(scores[base + 1]) > self.link_threshold {
                link_mask[pos] = true;
                link_pixels += 1;
            }
        }

        debug!(
            "detection masks {}x{}: {} text pixels, {} link pixels",
            width, height, text_pixels, link_pixels
        );

        Ok(DetectionMap {
            text_mask,
            link_mask,
            width,
            height,
        })
    }
}

impl Default for CraftPostProcess {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Maps a real-valued logit into a (0, 1) probability.
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
