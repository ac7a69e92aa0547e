//! Tensor specifications, layout resolution, and tensor values.
//!
//! A model declares each of its inputs and outputs as a [`TensorSpec`]:
//! an ordered shape, an element dtype, and optional affine quantization
//! parameters. The pipeline resolves the channel layout of a 4-D input
//! shape exactly once ([`TensorSpec::resolve_layout`]) and threads the
//! resulting [`ResolvedLayout`] explicitly, instead of re-inferring it at
//! every call site.

use std::borrow::Cow;

use ndarray::{ArrayD, IxDyn};

use crate::core::errors::{OcrError, OcrResult};

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    /// 32-bit floating point values.
    Float32,
    /// Unsigned 8-bit values under an affine quantization scheme.
    QuantizedUint8,
}

/// The ordering of channel vs spatial dimensions in a flat tensor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Height, Width, Channel order (common in TensorFlow).
    Hwc,
    /// Channel, Height, Width order (common in PyTorch).
    Chw,
}

/// Affine quantization parameters mapping real values to uint8.
///
/// The forward mapping is `q = round(v / scale + zero_point)` clamped to
/// `[0, 255]`; the inverse is `v = (q - zero_point) * scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantization {
    /// The size of one quantization step.
    pub scale: f32,
    /// The quantized value that represents real zero.
    pub zero_point: i32,
}

impl Quantization {
    /// Quantizes a real value to uint8.
    pub fn quantize(&self, value: f32) -> u8 {
        (value / self.scale + self.zero_point as f32)
            .round()
            .clamp(0.0, 255.0) as u8
    }

    /// Recovers the real value a quantized value represents.
    pub fn dequantize(&self, quantized: u8) -> f32 {
        (quantized as i32 - self.zero_point) as f32 * self.scale
    }
}

/// The channel layout and spatial size resolved from a 4-D input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLayout {
    /// The resolved channel ordering.
    pub layout: Layout,
    /// Target height in pixels.
    pub height: usize,
    /// Target width in pixels.
    pub width: usize,
    /// Channel count, always 1 or 3.
    pub channels: usize,
}

/// Declared shape, dtype, and quantization of one model input or output.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorSpec {
    /// Ordered dimensions. Model inputs declare 4 (batch plus three layout
    /// dimensions); outputs may declare 3 or 4.
    pub shape: Vec<usize>,
    /// Element type.
    pub dtype: DType,
    /// Quantization parameters, present exactly when `dtype` is
    /// [`DType::QuantizedUint8`].
    pub quantization: Option<Quantization>,
}

impl TensorSpec {
    /// Creates a float32 tensor spec.
    pub fn new(shape: Vec<usize>, dtype: DType) -> Self {
        Self {
            shape,
            dtype,
            quantization: None,
        }
    }

    /// Creates a quantized-uint8 tensor spec.
    pub fn quantized(shape: Vec<usize>, scale: f32, zero_point: i32) -> Self {
        Self {
            shape,
            dtype: DType::QuantizedUint8,
            quantization: Some(Quantization { scale, zero_point }),
        }
    }

    /// Validates the internal consistency of the spec.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Any dimension is zero
    /// * The dtype is quantized but no quantization parameters are present,
    ///   or vice versa
    /// * The quantization scale is not strictly positive
    pub fn validate(&self) -> OcrResult<()> {
        if self.shape.is_empty() || self.shape.iter().any(|&d| d == 0) {
            return Err(OcrError::invalid_input(format!(
                "tensor shape must have only positive dimensions, got {:?}",
                self.shape
            )));
        }

        match (self.dtype, &self.quantization) {
            (DType::QuantizedUint8, None) => Err(OcrError::config_error(
                "quantized dtype requires quantization parameters",
            )),
            (DType::QuantizedUint8, Some(q)) if q.scale <= 0.0 => Err(OcrError::config_error(
                format!("quantization scale must be greater than 0, got {}", q.scale),
            )),
            (DType::Float32, Some(_)) => Err(OcrError::config_error(
                "float32 dtype must not carry quantization parameters",
            )),
            _ => Ok(()),
        }
    }

    /// Resolves the channel layout and target size of a 4-D input shape.
    ///
    /// Checks which of `shape[3]` or `shape[1]` holds a plausible channel
    /// count (1 or 3), probing the channel-last slot first. If `shape[3]`
    /// qualifies the layout is HWC with `height = shape[1]`,
    /// `width = shape[2]`; if `shape[1]` qualifies the layout is CHW with
    /// `height = shape[2]`, `width = shape[3]`.
    ///
    /// # Errors
    ///
    /// Fails with [`OcrError::AmbiguousLayout`] when both or neither slot
    /// qualifies. The ambiguity is irreducible from the shape alone (a 3x3
    /// image is unresolvable); the declared shape must disambiguate.
    /// Non-4-D shapes fail with [`OcrError::InvalidInput`].
    pub fn resolve_layout(&self) -> OcrResult<ResolvedLayout> {
        if self.shape.len() != 4 {
            return Err(OcrError::invalid_input(format!(
                "input shape must be 4-D to resolve a layout, got {:?}",
                self.shape
            )));
        }

        let channel_last = matches!(self.shape[3], 1 | 3);
        let channel_first = matches!(self.shape[1], 1 | 3);

        match (channel_last, channel_first) {
            (true, false) => Ok(ResolvedLayout {
                layout: Layout::Hwc,
                height: self.shape[1],
                width: self.shape[2],
                channels: self.shape[3],
            }),
            (false, true) => Ok(ResolvedLayout {
                layout: Layout::Chw,
                height: self.shape[2],
                width: self.shape[3],
                channels: self.shape[1],
            }),
            _ => Err(OcrError::ambiguous_layout(&self.shape)),
        }
    }

    /// The number of elements the declared shape implies.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Flat numeric storage of a tensor, matching the spec's dtype.
#[derive(Debug, Clone)]
pub enum TensorData {
    /// Float32 elements.
    Float32(ArrayD<f32>),
    /// Quantized uint8 elements.
    Uint8(ArrayD<u8>),
}

/// An owned tensor value exchanged with an inference engine.
///
/// Tensors are transient: each one is produced by one stage, consumed by the
/// next, and dropped. Nothing shares them.
#[derive(Debug, Clone)]
pub struct Tensor {
    /// The element storage.
    pub data: TensorData,
    /// The channel ordering of the spatial dimensions.
    pub layout: Layout,
    /// Quantization parameters for uint8 data, if any.
    pub quantization: Option<Quantization>,
}

impl Tensor {
    /// Creates a float32 tensor from a flat buffer and shape.
    pub fn from_f32(values: Vec<f32>, shape: &[usize], layout: Layout) -> OcrResult<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Ok(Self {
            data: TensorData::Float32(data),
            layout,
            quantization: None,
        })
    }

    /// Creates a quantized uint8 tensor from a flat buffer and shape.
    pub fn from_u8(
        values: Vec<u8>,
        shape: &[usize],
        layout: Layout,
        quantization: Option<Quantization>,
    ) -> OcrResult<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Ok(Self {
            data: TensorData::Uint8(data),
            layout,
            quantization,
        })
    }

    /// The tensor's shape.
    pub fn shape(&self) -> &[usize] {
        match &self.data {
            TensorData::Float32(a) => a.shape(),
            TensorData::Uint8(a) => a.shape(),
        }
    }

    /// The number of elements in the tensor.
    pub fn len(&self) -> usize {
        match &self.data {
            TensorData::Float32(a) => a.len(),
            TensorData::Uint8(a) => a.len(),
        }
    }

    /// Whether the tensor holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element type of the tensor.
    pub fn dtype(&self) -> DType {
        match &self.data {
            TensorData::Float32(_) => DType::Float32,
            TensorData::Uint8(_) => DType::QuantizedUint8,
        }
    }

    /// A flat row-major view of the tensor as f32 values.
    ///
    /// Float32 data is borrowed when contiguous. Uint8 data is dequantized
    /// through the tensor's quantization parameters, or cast directly when
    /// none are present.
    pub fn to_f32(&self) -> Cow<'_, [f32]> {
        match &self.data {
            TensorData::Float32(a) => match a.as_slice() {
                Some(slice) => Cow::Borrowed(slice),
                None => Cow::Owned(a.iter().copied().collect()),
            },
            TensorData::Uint8(a) => match self.quantization {
                Some(q) => Cow::Owned(a.iter().map(|&v| q.dequantize(v)).collect()),
                None => Cow::Owned(a.iter().map(|&v| v as f32).collect()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_channel_last() {
        let spec = TensorSpec::new(vec![1, 608, 800, 3], DType::Float32);
        let resolved = spec.resolve_layout().unwrap();
        assert_eq!(resolved.layout, Layout::Hwc);
        assert_eq!(resolved.height, 608);
        assert_eq!(resolved.width, 800);
        assert_eq!(resolved.channels, 3);
    }

    #[test]
    fn test_resolve_channel_first() {
        let spec = TensorSpec::new(vec![1, 3, 224, 320], DType::Float32);
        let resolved = spec.resolve_layout().unwrap();
        assert_eq!(resolved.layout, Layout::Chw);
        assert_eq!(resolved.height, 224);
        assert_eq!(resolved.width, 320);
        assert_eq!(resolved.channels, 3);
    }

    #[test]
    fn test_resolve_single_channel() {
        let spec = TensorSpec::new(vec![1, 64, 600, 1], DType::Float32);
        let resolved = spec.resolve_layout().unwrap();
        assert_eq!(resolved.layout, Layout::Hwc);
        assert_eq!(resolved.channels, 1);
    }

    #[test]
    fn test_resolve_both_qualify_is_ambiguous() {
        // A 3x3 image: both candidate slots look like a channel count.
        let spec = TensorSpec::new(vec![1, 3, 3, 3], DType::Float32);
        assert!(matches!(
            spec.resolve_layout(),
            Err(OcrError::AmbiguousLayout { .. })
        ));
    }

    #[test]
    fn test_resolve_neither_qualifies_is_ambiguous() {
        let spec = TensorSpec::new(vec![1, 224, 224, 4], DType::Float32);
        assert!(matches!(
            spec.resolve_layout(),
            Err(OcrError::AmbiguousLayout { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_non_4d() {
        let spec = TensorSpec::new(vec![1, 224, 3], DType::Float32);
        assert!(matches!(
            spec.resolve_layout(),
            Err(OcrError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_validate_quantization_pairing() {
        let mut spec = TensorSpec::new(vec![1, 8, 8, 3], DType::QuantizedUint8);
        assert!(spec.validate().is_err());

        spec.quantization = Some(Quantization {
            scale: 1.0 / 255.0,
            zero_point: 0,
        });
        assert!(spec.validate().is_ok());

        let spec = TensorSpec {
            shape: vec![1, 8, 8, 3],
            dtype: DType::Float32,
            quantization: Some(Quantization {
                scale: 1.0,
                zero_point: 0,
            }),
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let spec = TensorSpec::new(vec![1, 0, 8, 3], DType::Float32);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_quantization_round_trip_within_one_step() {
        let q = Quantization {
            scale: 1.0 / 255.0,
            zero_point: 0,
        };
        for &v in &[0.0f32, 0.25, 0.5, 0.75, 1.0, 0.123, 0.997] {
            let recovered = q.dequantize(q.quantize(v));
            assert!(
                (recovered - v).abs() <= q.scale,
                "value {v} round-tripped to {recovered}"
            );
        }
    }

    #[test]
    fn test_quantize_clamps_to_byte_range() {
        let q = Quantization {
            scale: 1.0 / 255.0,
            zero_point: 128,
        };
        assert_eq!(q.quantize(10.0), 255);
        assert_eq!(q.quantize(-10.0), 0);
    }

    #[test]
    fn test_tensor_to_f32_dequantizes() {
        let q = Quantization {
            scale: 0.5,
            zero_point: 10,
        };
        let tensor = Tensor::from_u8(vec![10, 12, 8], &[1, 3], Layout::Hwc, Some(q)).unwrap();
        let values = tensor.to_f32();
        assert_eq!(values.as_ref(), &[0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_tensor_shape_mismatch_is_error() {
        assert!(Tensor::from_f32(vec![0.0; 5], &[1, 2, 3], Layout::Hwc).is_err());
    }
}
