//! Traits defining the external collaborator seams of the pipeline.
//!
//! The pipeline itself is pure numeric work; the two points where it leaves
//! the process are model execution ([`InferenceEngine`]) and image
//! decode/resize/crop ([`ImageSource`]). Both are object-safe so the
//! orchestrator can hold them as trait objects and tests can substitute
//! stubs.

use crate::core::buffer::PixelBuffer;
use crate::core::errors::OcrResult;
use crate::core::tensor::{Tensor, TensorSpec};
use crate::processors::geometry::BoundingBox;

/// An opaque neural-network inference engine.
///
/// The engine declares the specs of its inputs and outputs and executes one
/// inference at a time. Execution may block; the pipeline invokes it once
/// for the detector and once per recognized box, sequentially. Timeouts and
/// retries are the caller's responsibility.
pub trait InferenceEngine: Send + Sync {
    /// A short model name used in error context and log events.
    fn name(&self) -> &str;

    /// The declared input specs, in model order.
    fn inputs(&self) -> &[TensorSpec];

    /// The declared output specs, in model order.
    fn outputs(&self) -> &[TensorSpec];

    /// Runs one inference, consuming the input tensor.
    fn run(&self, input: Tensor) -> OcrResult<Tensor>;
}

/// The image decode/resize/crop collaborator.
///
/// Implementations own the pixels of one source image and hand out decoded
/// RGB buffers at requested sizes. Resizing stretches to the exact target
/// dimensions; aspect ratio is not preserved.
pub trait ImageSource {
    /// The dimensions of the original image, in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Decodes a region of the image into an RGB buffer of exactly
    /// `target_width x target_height`.
    ///
    /// `region` is in original-image coordinates; `None` reads the whole
    /// image. Decode failures and unusable regions are reported as errors.
    fn read_region(
        &self,
        region: Option<&BoundingBox>,
        target_width: u32,
        target_height: u32,
    ) -> OcrResult<PixelBuffer>;
}
