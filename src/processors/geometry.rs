//! Box types and coordinate mapping between mask and image space.

use crate::core::errors::{OcrError, OcrResult};

/// An axis-aligned integer bounding box.
///
/// Width and height are at least 1. The coordinate space (detection-mask
/// pixels or original-image pixels) is explicit wherever a box is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels, at least 1.
    pub width: u32,
    /// Height in pixels, at least 1.
    pub height: u32,
}

impl BoundingBox {
    /// Creates a bounding box.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// The exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// The box area in pixels.
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Rescales boxes from detection-mask space to original-image space.
///
/// The detector runs on a stretch-resized copy of the image and emits masks
/// at a stride of that resized frame. Scaling straight from mask dimensions
/// to original dimensions folds the stride into the ratio, so the mapper
/// never needs to know it explicitly.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    scale_x: f32,
    scale_y: f32,
    original_width: u32,
    original_height: u32,
}

impl CoordinateMapper {
    /// Creates a mapper from mask space to original-image space.
    ///
    /// # Arguments
    ///
    /// * `mask` - (width, height) of the detection mask.
    /// * `resized` - (width, height) of the resized frame the detector ran
    ///   on. Kept in the signature because callers always have it and it
    ///   documents the space the mask was derived from; the scale itself is
    ///   mask-to-original.
    /// * `original` - (width, height) of the original image.
    ///
    /// # Errors
    ///
    /// Fails with [`OcrError::InvalidGeometry`] if any dimension is zero.
    pub fn new(mask: (u32, u32), resized: (u32, u32), original: (u32, u32)) -> OcrResult<Self> {
        for (name, (w, h)) in [("mask", mask), ("resized", resized), ("original", original)] {
            if w == 0 || h == 0 {
                return Err(OcrError::invalid_geometry(format!(
                    "{name} dimensions must be positive, got {w}x{h}"
                )));
            }
        }

        Ok(Self {
            scale_x: original.0 as f32 / mask.0 as f32,
            scale_y: original.1 as f32 / mask.1 as f32,
            original_width: original.0,
            original_height: original.1,
        })
    }

    /// Maps a box from mask coordinates to original-image coordinates.
    ///
    /// Each coordinate is scaled, rounded to nearest, and clamped into the
    /// original image; width and height stay at least 1.
    pub fn map(&self, bbox: &BoundingBox) -> BoundingBox {
        let x = ((bbox.x as f32 * self.scale_x).round() as u32).min(self.original_width - 1);
        let y = ((bbox.y as f32 * self.scale_y).round() as u32).min(self.original_height - 1);
        let width = ((bbox.width as f32 * self.scale_x).round() as u32)
            .clamp(1, self.original_width - x);
        let height = ((bbox.height as f32 * self.scale_y).round() as u32)
            .clamp(1, self.original_height - y);

        BoundingBox::new(x, y, width, height)
    }
}
