//! Error types for the OCR pipeline.
//!
//! This module defines the errors that can occur while preparing model
//! inputs, postprocessing model outputs, and orchestrating the two-stage
//! pipeline, along with utility constructors for creating them with
//! appropriate context.
//!
//! An empty detection result is not an error: a detector run that finds no
//! text produces an empty output, never a failure.

use thiserror::Error;

/// Convenient result alias for OCR operations.
pub type OcrResult<T> = Result<T, OcrError>;

/// Enum representing the errors that can occur in the OCR pipeline.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The channel layout of a tensor cannot be inferred from its shape.
    ///
    /// Raised when neither or both of the candidate channel positions of a
    /// 4-D shape hold a plausible channel count (1 or 3). A 3x3 image is the
    /// canonical unresolvable case; callers must adjust the declared shape.
    #[error("cannot infer tensor layout from shape {shape:?}")]
    AmbiguousLayout {
        /// The shape that could not be resolved.
        shape: Vec<usize>,
    },

    /// A decoded pixel buffer does not have the expected length.
    #[error("pixel buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The expected buffer length in bytes.
        expected: usize,
        /// The actual buffer length in bytes.
        actual: usize,
    },

    /// A model output buffer is shorter than its declared shape implies.
    #[error("model output shorter than declared: expected at least {expected} values, got {actual}")]
    OutputSizeMismatch {
        /// The minimum number of values the declared shape implies.
        expected: usize,
        /// The actual number of values.
        actual: usize,
    },

    /// An image or box dimension is zero or otherwise unusable.
    #[error("invalid geometry: {message}")]
    InvalidGeometry {
        /// A message describing the invalid geometry.
        message: String,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Error reported by an external inference engine.
    #[error("inference failed for model '{model_name}': {context}")]
    Inference {
        /// The name of the model that failed.
        model_name: String,
        /// Additional context about the failure.
        context: String,
        /// The underlying engine error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading an image.
    #[error("image load")]
    ImageLoad(#[from] image::ImageError),

    /// Error from tensor operations.
    #[error("tensor operation")]
    Tensor(#[from] ndarray::ShapeError),
}

/// Implementation of OcrError with utility functions for creating errors.
impl OcrError {
    /// Creates an OcrError for an unresolvable tensor layout.
    pub fn ambiguous_layout(shape: &[usize]) -> Self {
        Self::AmbiguousLayout {
            shape: shape.to_vec(),
        }
    }

    /// Creates an OcrError for a pixel buffer with the wrong length.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Creates an OcrError for a model output shorter than declared.
    pub fn output_size_mismatch(expected: usize, actual: usize) -> Self {
        Self::OutputSizeMismatch { expected, actual }
    }

    /// Creates an OcrError for zero or otherwise unusable dimensions.
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// Creates an OcrError for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates an OcrError for configuration errors.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Creates an OcrError for inference failures, with model context.
    ///
    /// # Arguments
    ///
    /// * `model_name` - The name of the model that failed.
    /// * `context` - What the pipeline was doing when the engine failed.
    /// * `error` - The underlying engine error.
    pub fn inference(
        model_name: impl Into<String>,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.into(),
            context: context.into(),
            source: Box::new(error),
        }
    }
}
