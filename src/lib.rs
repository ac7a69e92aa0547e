//! # craft-ocr
//!
//! A Rust inference-support pipeline for two-stage OCR: a CRAFT-style
//! detector model locates text regions in an image, and a CTC recognizer
//! model reads characters from each located region.
//!
//! The crate owns the numeric work around the two opaque model inferences:
//!
//! - Resolving the channel layout (HWC/CHW) and spatial size a model expects
//!   from its declared input shape
//! - Normalizing a decoded RGB buffer into that layout, including grayscale
//!   conversion and affine uint8 quantization
//! - Turning raw detector score maps into text/link probability masks and
//!   discrete bounding boxes via connected-component labeling
//! - Mapping boxes from mask space back to original-image coordinates
//! - Greedy CTC decoding of the recognizer's per-timestep class scores
//!
//! Model execution and image decoding/resizing stay outside the crate,
//! behind the [`core::InferenceEngine`] and [`core::ImageSource`] traits.
//!
//! ## Modules
//!
//! * [`core`] - Error handling, tensor types, and collaborator traits
//! * [`pipeline`] - The end-to-end OCR pipeline and its configuration
//! * [`processors`] - The numeric stages (normalization, detection
//!   postprocessing, component extraction, coordinate mapping, decoding)
//! * [`utils`] - Image loading helpers and the default [`core::ImageSource`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use craft_ocr::core::{DType, Tensor, TensorSpec};
//! use craft_ocr::prelude::*;
//!
//! /// Adapter for whatever runtime executes the models.
//! struct MyEngine {
//!     inputs: Vec<TensorSpec>,
//!     outputs: Vec<TensorSpec>,
//! }
//!
//! impl InferenceEngine for MyEngine {
//!     fn name(&self) -> &str {
//!         "my-model"
//!     }
//!     fn inputs(&self) -> &[TensorSpec] {
//!         &self.inputs
//!     }
//!     fn outputs(&self) -> &[TensorSpec] {
//!         &self.outputs
//!     }
//!     fn run(&self, _input: Tensor) -> OcrResult<Tensor> {
//!         unimplemented!("bind your inference runtime here")
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = MyEngine {
//!     inputs: vec![TensorSpec::new(vec![1, 608, 800, 3], DType::Float32)],
//!     outputs: vec![TensorSpec::new(vec![1, 304, 400, 2], DType::Float32)],
//! };
//! let recognizer = MyEngine {
//!     inputs: vec![TensorSpec::new(vec![1, 64, 600, 1], DType::Float32)],
//!     outputs: vec![TensorSpec::new(vec![1, 149, 97], DType::Float32)],
//! };
//!
//! let pipeline = OcrPipelineBuilder::new()
//!     .config(PipelineConfig::default())
//!     .build(Box::new(detector), Box::new(recognizer))?;
//!
//! let image = load_image(std::path::Path::new("document.jpg"))?;
//! let source = DynamicImageSource::new(image);
//! let output = pipeline.process(&source)?;
//!
//! for text in output.texts() {
//!     println!("{} ({:.2})", text.text, text.confidence);
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod pipeline;
pub mod processors;
pub mod utils;

/// Prelude module for convenient imports.
///
/// Bring the essentials into scope with a single use statement:
///
/// ```rust
/// use craft_ocr::prelude::*;
/// ```
///
/// Included items focus on the most common tasks: running the pipeline
/// (`OcrPipeline`, `OcrPipelineBuilder`, `PipelineConfig`), consuming results
/// (`OcrOutput`, `TextRegion`, `RecognizedText`), the collaborator traits
/// (`InferenceEngine`, `ImageSource`), the error types, and basic image
/// loading. For the individual numeric stages, import from
/// [`crate::processors`] directly.
pub mod prelude {
    pub use crate::core::{ImageSource, InferenceEngine, OcrError, OcrResult};
    pub use crate::pipeline::{
        OcrOutput, OcrPipeline, OcrPipelineBuilder, PipelineConfig, RecognizedText, TextRegion,
    };
    pub use crate::utils::{load_image, DynamicImageSource};
}
