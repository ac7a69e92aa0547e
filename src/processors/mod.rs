//! The numeric stages of the OCR pipeline.
//!
//! Each stage is a small, self-contained processor:
//!
//! * [`normalization`] - pixel buffer to model input tensor
//! * [`postprocess`] - raw detector scores to text/link masks
//! * [`connected`] - text mask to bounding boxes
//! * [`geometry`] - box types and mask-to-image coordinate mapping
//! * [`decode`] - recognizer scores to text

pub mod connected;
pub mod decode;
pub mod geometry;
pub mod normalization;
pub mod postprocess;

pub use connected::ConnectedComponentExtractor;
pub use decode::CtcGreedyDecode;
pub use geometry::{BoundingBox, CoordinateMapper};
pub use normalization::{ImageNormalizer, NormalizationKind};
pub use postprocess::{CraftPostProcess, DetectionMap};
