//! Utility functions for loading images and the default image source.

pub mod image;

pub use image::{load_image, DynamicImageSource};
