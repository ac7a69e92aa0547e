//! Result types for the OCR pipeline.

use std::sync::Arc;

use crate::core::errors::OcrError;
use crate::processors::geometry::BoundingBox;

/// Text read from one region, with the decoder's confidence.
#[derive(Debug, Clone)]
pub struct RecognizedText {
    /// The decoded string. May be empty when the model saw no characters.
    pub text: Arc<str>,
    /// Mean winning score of the surviving timesteps.
    pub confidence: f32,
}

/// One detected region and the outcome of recognizing it.
///
/// Recognition failures stay local to their region: a box whose crop or
/// inference failed carries the error here while its neighbours keep their
/// text. The bounding box is in original-image coordinates.
#[derive(Debug)]
pub struct TextRegion {
    /// Where the region sits in the original image.
    pub bounding_box: BoundingBox,
    /// The recognized text, or why recognition failed for this region.
    pub recognition: Result<RecognizedText, OcrError>,
}

impl TextRegion {
    /// Returns the recognized text if recognition succeeded.
    pub fn text(&self) -> Option<&RecognizedText> {
        self.recognition.as_ref().ok()
    }
}

/// Result of running the pipeline over one image.
///
/// Regions appear in blob discovery order (top-to-bottom, left-to-right seed
/// order in the detection mask). An image with no detected text produces an
/// empty output; that is a valid result, not a failure.
#[derive(Debug, Default)]
pub struct OcrOutput {
    /// The detected regions, in discovery order.
    pub regions: Vec<TextRegion>,
}

impl OcrOutput {
    /// Whether no text regions were detected.
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// The successfully recognized texts, in region order.
    pub fn texts(&self) -> impl Iterator<Item = &RecognizedText> {
        self.regions.iter().filter_map(|region| region.text())
    }

    /// The regions whose recognition failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&BoundingBox, &OcrError)> {
        self.regions.iter().filter_map(|region| {
            region
                .recognition
                .as_ref()
                .err()
                .map(|e| (&region.bounding_box, e))
        })
    }
}
