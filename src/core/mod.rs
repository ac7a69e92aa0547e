//! The core module of the OCR pipeline.
//!
//! This module contains the fundamental building blocks shared by every
//! pipeline stage:
//! - Error handling
//! - Tensor specifications, layout resolution, and tensor values
//! - The interleaved-RGB pixel buffer exchanged with the image source
//! - Traits defining the external collaborator seams (inference engine,
//!   image source)
//!
//! It also re-exports the commonly used types for convenience.

pub mod buffer;
pub mod errors;
pub mod tensor;
pub mod traits;

pub use buffer::PixelBuffer;
pub use errors::{OcrError, OcrResult};
pub use tensor::{DType, Layout, Quantization, ResolvedLayout, Tensor, TensorData, TensorSpec};
pub use traits::{ImageSource, InferenceEngine};

/// Initializes the tracing subscriber for logging.
///
/// This function sets up the tracing subscriber with environment filter and
/// formatting layer. It's typically called at the start of an application to
/// enable logging.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
