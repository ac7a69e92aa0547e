//! Connected-component extraction over a boolean text mask.
//!
//! Labels maximal 4-connected regions of true cells ("blobs") and derives
//! one axis-aligned bounding box per blob. The scan is row-major and the
//! returned boxes keep blob discovery order, so output is deterministic for
//! a given mask.

use itertools::Itertools;
use tracing::debug;

use crate::core::errors::{OcrError, OcrResult};
use crate::processors::geometry::BoundingBox;

/// Extracts bounding boxes from a thresholded text mask.
#[derive(Debug, Clone, Copy)]
pub struct ConnectedComponentExtractor {
    /// Blobs with fewer cells than this are discarded as noise.
    pub min_area: usize,
}

impl ConnectedComponentExtractor {
    /// Creates an extractor with an optional minimum blob area.
    ///
    /// The default minimum area is 10 cells.
    pub fn new(min_area: Option<usize>) -> Self {
        Self {
            min_area: min_area.unwrap_or(10),
        }
    }

    /// Labels the mask and returns one box per retained blob.
    ///
    /// Flood fill with an explicit stack over a flat visited grid; each cell
    /// is visited at most once, so the pass is O(width * height). Exploration
    /// order within a blob does not affect the result. An empty result means
    /// no text was found and is not an error.
    ///
    /// # Errors
    ///
    /// Fails with [`OcrError::InvalidInput`] when the mask length does not
    /// equal `width * height`.
    pub fn extract(
        &self,
        mask: &[bool],
        width: usize,
        height: usize,
    ) -> OcrResult<Vec<BoundingBox>> {
        if mask.len() != width * height {
            return Err(OcrError::invalid_input(format!(
                "mask length {} does not match {}x{}",
                mask.len(),
                width,
                height
            )));
        }

        let mut visited = vec![false; mask.len()];
        let mut stack: Vec<usize> = Vec::new();
        let mut cells: Vec<(usize, usize)> = Vec::new();
        let mut boxes = Vec::new();
        let mut discarded = 0usize;

        for seed in 0..mask.len() {
            if !mask[seed] || visited[seed] {
                continue;
            }

            visited[seed] = true;
            stack.push(seed);
            cells.clear();

            while let Some(idx) = stack.pop() {
                let x = idx % width;
                let y = idx / width;
                cells.push((x, y));

                if x > 0 && mask[idx - 1] && !visited[idx - 1] {
                    visited[idx - 1] = true;
                    stack.push(idx - 1);
                }
                if x + 1 < width && mask[idx + 1] && !visited[idx + 1] {
                    visited[idx + 1] = true;
                    stack.push(idx + 1);
                }
                if y > 0 && mask[idx - width] && !visited[idx - width] {
                    visited[idx - width] = true;
                    stack.push(idx - width);
                }
                if y + 1 < height && mask[idx + width] && !visited[idx + width] {
                    visited[idx + width] = true;
                    stack.push(idx + width);
                }
            }

            if cells.len() < self.min_area {
                discarded += 1;
                continue;
            }

            let (min_x, max_x) = cells
                .iter()
                .map(|&(x, _)| x)
                .minmax()
                .into_option()
                .unwrap_or((0, 0));
            let (min_y, max_y) = cells
                .iter()
                .map(|&(_, y)| y)
                .minmax()
                .into_option()
                .unwrap_or((0, 0));

            boxes.push(BoundingBox::new(
                min_x as u32,
                min_y as u32,
                (max_x - min_x + 1) as u32,
                (max_y - min_y + 1) as u32,
            ));
        }

        debug!(
            "component extraction: {} boxes kept, {} blobs below min area {}",
            boxes.len(),
            discarded,
            self.min_area
        );

        Ok(boxes)
    }
}

impl Default for ConnectedComponentExtractor {
    fn default() -> Self {
        Self::new(None)
    }
}
