//! Image normalization for model input preparation.
//!
//! This module converts a decoded [`PixelBuffer`] into the exact tensor a
//! model expects: per-channel normalization into floats, optional grayscale
//! conversion for single-channel models, HWC-to-CHW transposition, and
//! affine uint8 quantization for quantized models.
//!
//! The normalization formula is part of each model's contract, not a
//! pipeline-wide constant. A model trained on plain `v/255` inputs silently
//! produces garbage when fed zero-centered values and vice versa, so the
//! [`NormalizationKind`] is configured per model.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::buffer::PixelBuffer;
use crate::core::errors::{OcrError, OcrResult};
use crate::core::tensor::{DType, Layout, Tensor, TensorSpec};

/// ITU-R BT.601 luma weights, applied when a model wants one channel.
const LUMA_R: f32 = 0.299;
const LUMA_G: f32 = 0.587;
const LUMA_B: f32 = 0.114;

/// The byte-to-float normalization a model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationKind {
    /// `v / 255`, mapping bytes into `[0, 1]`.
    Linear,
    /// `(v - 127) / 255`, mapping bytes into roughly `[-0.5, 0.5]`.
    ZeroCentered,
}

impl NormalizationKind {
    /// Normalizes one channel byte.
    pub fn normalize(&self, byte: u8) -> f32 {
        match self {
            NormalizationKind::Linear => byte as f32 / 255.0,
            NormalizationKind::ZeroCentered => (byte as f32 - 127.0) / 255.0,
        }
    }
}

/// Normalizes pixel buffers into model input tensors.
///
/// The normalizer holds the per-model [`NormalizationKind`]; everything else
/// it needs (layout, target size, dtype, quantization) comes from the
/// [`TensorSpec`] of the model input it is preparing.
#[derive(Debug, Clone, Copy)]
pub struct ImageNormalizer {
    kind: NormalizationKind,
}

impl ImageNormalizer {
    /// Creates a normalizer for the given per-model normalization.
    pub fn new(kind: NormalizationKind) -> Self {
        Self { kind }
    }

    /// Converts one pixel buffer into the tensor the spec describes.
    ///
    /// The buffer must already be resized to the spec's target dimensions;
    /// resizing is the image source's job. The output length always equals
    /// `channels * height * width`.
    ///
    /// # Errors
    ///
    /// * [`OcrError::SizeMismatch`] when the buffer dimensions differ from
    ///   the resolved target size
    /// * [`OcrError::AmbiguousLayout`] when the spec's layout cannot be
    ///   resolved
    /// * [`OcrError::ConfigError`] when the spec's dtype and quantization
    ///   parameters are inconsistent
    pub fn apply(&self, buffer: &PixelBuffer, spec: &TensorSpec) -> OcrResult<Tensor> {
        spec.validate()?;
        let resolved = spec.resolve_layout()?;

        if buffer.width() as usize != resolved.width || buffer.height() as usize != resolved.height
        {
            return Err(OcrError::size_mismatch(
                resolved.width * resolved.height * 3,
                buffer.data().len(),
            ));
        }

        let values = match resolved.channels {
            1 => self.to_luminance(buffer),
            _ => self.to_rgb(buffer),
        };

        let values = match resolved.layout {
            Layout::Hwc => values,
            Layout::Chw => hwc_to_chw(
                &values,
                resolved.height,
                resolved.width,
                resolved.channels,
            ),
        };

        debug_assert_eq!(
            values.len(),
            resolved.channels * resolved.height * resolved.width
        );

        match spec.dtype {
            DType::Float32 => Tensor::from_f32(values, &spec.shape, resolved.layout),
            DType::QuantizedUint8 => {
                // validate() guarantees the parameters are present
                let quant = spec.quantization.ok_or_else(|| {
                    OcrError::config_error("quantized dtype requires quantization parameters")
                })?;
                let quantized = values.iter().map(|&v| quant.quantize(v)).collect();
                Tensor::from_u8(quantized, &spec.shape, resolved.layout, Some(quant))
            }
        }
    }

    /// Normalizes a batch of pixel buffers in parallel.
    ///
    /// Results come back in input order, one per buffer, each with its own
    /// error so one bad buffer never poisons the rest.
    pub fn apply_batch(
        &self,
        buffers: Vec<PixelBuffer>,
        spec: &TensorSpec,
    ) -> Vec<OcrResult<Tensor>> {
        buffers
            .into_par_iter()
            .map(|buffer| self.apply(&buffer, spec))
            .collect()
    }

    /// Interleaved RGB bytes to normalized floats, preserving interleave
    /// order (HWC).
    fn to_rgb(&self, buffer: &PixelBuffer) -> Vec<f32> {
        buffer
            .data()
            .iter()
            .map(|&byte| self.kind.normalize(byte))
            .collect()
    }

    /// Interleaved RGB bytes to one normalized luminance value per pixel.
    fn to_luminance(&self, buffer: &PixelBuffer) -> Vec<f32> {
        buffer
            .data()
            .chunks_exact(3)
            .map(|px| {
                let r = self.kind.normalize(px[0]);
                let g = self.kind.normalize(px[1]);
                let b = self.kind.normalize(px[2]);
                LUMA_R * r + LUMA_G * g + LUMA_B * b
            })
            .collect()
    }
}

/// Transposes a flat HWC buffer into CHW order.
///
/// Destination index is `c*H*W + h*W + w`, source is `h*W*C + w*C + c`.
fn hwc_to_chw(values: &[f32], height: usize, width: usize, channels: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; values.len()];
    for c in 0..channels {
        for h in 0..height {
            for w in 0..width {
                let dst = c * height * width + h * width + w;
                let src = h * width * channels + w * channels + c;
                out[dst] = values[src];
            }
        }
    }
    out
}
