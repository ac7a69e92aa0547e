//! The interleaved-RGB pixel buffer exchanged with the image source.

use crate::core::errors::{OcrError, OcrResult};

/// A decoded image as a flat buffer of interleaved R,G,B byte triples.
///
/// The buffer length is always exactly `width * height * 3`; the constructor
/// rejects anything else. Buffers are transient: one is created per
/// normalization call and dropped once the tensor is built.
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl PixelBuffer {
    /// Creates a pixel buffer, validating the length invariant.
    ///
    /// # Errors
    ///
    /// Fails with [`OcrError::SizeMismatch`] when `data.len()` is not
    /// exactly `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> OcrResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(OcrError::size_mismatch(expected, data.len()));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// The raw interleaved RGB bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The number of pixels in the buffer.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_exact_length() {
        let buffer = PixelBuffer::new(vec![0u8; 2 * 3 * 3], 2, 3).unwrap();
        assert_eq!(buffer.width(), 2);
        assert_eq!(buffer.height(), 3);
        assert_eq!(buffer.pixel_count(), 6);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let err = PixelBuffer::new(vec![0u8; 10], 2, 3).unwrap_err();
        assert!(matches!(
            err,
            OcrError::SizeMismatch {
                expected: 18,
                actual: 10
            }
        ));
    }
}
