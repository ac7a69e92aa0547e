//! Image loading and the default [`ImageSource`] implementation.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::core::buffer::PixelBuffer;
use crate::core::errors::{OcrError, OcrResult};
use crate::core::traits::ImageSource;
use crate::processors::geometry::BoundingBox;

/// Loads an image from a file path.
pub fn load_image(path: &Path) -> OcrResult<DynamicImage> {
    Ok(image::open(path)?)
}

/// An [`ImageSource`] over an already-decoded [`DynamicImage`].
///
/// Cropping happens in original-image coordinates, then the view is
/// stretch-resized to the exact requested dimensions. Aspect ratio is not
/// preserved; the models expect fixed input sizes and were trained on
/// stretched inputs.
#[derive(Debug)]
pub struct DynamicImageSource {
    image: DynamicImage,
}

impl DynamicImageSource {
    /// Wraps a decoded image.
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    /// Loads an image from a file path and wraps it.
    pub fn open(path: &Path) -> OcrResult<Self> {
        Ok(Self::new(load_image(path)?))
    }
}

impl ImageSource for DynamicImageSource {
    fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn read_region(
        &self,
        region: Option<&BoundingBox>,
        target_width: u32,
        target_height: u32,
    ) -> OcrResult<PixelBuffer> {
        if target_width == 0 || target_height == 0 {
            return Err(OcrError::invalid_geometry(format!(
                "requested target size {target_width}x{target_height}"
            )));
        }

        let resized = match region {
            Some(bbox) => {
                let (image_width, image_height) = self.image.dimensions();
                if bbox.x >= image_width || bbox.y >= image_height {
                    return Err(OcrError::invalid_geometry(format!(
                        "crop origin ({}, {}) lies outside {}x{} image",
                        bbox.x, bbox.y, image_width, image_height
                    )));
                }
                let width = bbox.width.min(image_width - bbox.x);
                let height = bbox.height.min(image_height - bbox.y);
                self.image
                    .crop_imm(bbox.x, bbox.y, width, height)
                    .resize_exact(target_width, target_height, FilterType::Triangle)
            }
            None => self
                .image
                .resize_exact(target_width, target_height, FilterType::Triangle),
        };

        PixelBuffer::new(resized.to_rgb8().into_raw(), target_width, target_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// A 8x4 image with a red left half and a blue right half.
    fn two_tone_image() -> DynamicImage {
        let mut img = RgbImage::new(8, 4);
        for y in 0..4 {
            for x in 0..8 {
                let color = if x < 4 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) };
                img.put_pixel(x, y, color);
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_whole_image_is_stretch_resized() {
        let source = DynamicImageSource::new(two_tone_image());
        let buffer = source.read_region(None, 4, 2).unwrap();
        assert_eq!(buffer.width(), 4);
        assert_eq!(buffer.height(), 2);
        assert_eq!(buffer.data().len(), 4 * 2 * 3);
    }

    #[test]
    fn test_crop_reads_the_requested_region() {
        let source = DynamicImageSource::new(two_tone_image());
        // The left half is solid red; any resize of it stays red.
        let bbox = BoundingBox::new(0, 0, 4, 4);
        let buffer = source.read_region(Some(&bbox), 2, 2).unwrap();
        for px in buffer.data().chunks_exact(3) {
            assert_eq!(px, &[255, 0, 0]);
        }
    }

    #[test]
    fn test_crop_is_clamped_to_image_bounds() {
        let source = DynamicImageSource::new(two_tone_image());
        let bbox = BoundingBox::new(6, 2, 10, 10);
        let buffer = source.read_region(Some(&bbox), 3, 3).unwrap();
        assert_eq!(buffer.width(), 3);
        assert_eq!(buffer.height(), 3);
    }

    #[test]
    fn test_crop_origin_outside_image_is_rejected() {
        let source = DynamicImageSource::new(two_tone_image());
        let bbox = BoundingBox::new(8, 0, 2, 2);
        assert!(matches!(
            source.read_region(Some(&bbox), 2, 2),
            Err(OcrError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn test_zero_target_is_rejected() {
        let source = DynamicImageSource::new(two_tone_image());
        assert!(matches!(
            source.read_region(None, 0, 2),
            Err(OcrError::InvalidGeometry { .. })
        ));
    }
}
