//! The end-to-end OCR pipeline.
//!
//! [`ocr::OcrPipeline`] sequences the numeric stages around the two model
//! inferences; [`config::PipelineConfig`] carries the tunable parameters;
//! [`result`] holds the per-region output types.

pub mod config;
pub mod ocr;
pub mod result;

pub use config::PipelineConfig;
pub use ocr::{OcrPipeline, OcrPipelineBuilder};
pub use result::{OcrOutput, RecognizedText, TextRegion};
