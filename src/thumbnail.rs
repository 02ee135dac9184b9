//! Base thumbnail generation, before any watermark is applied.

use image::imageops::FilterType;
use image::DynamicImage;

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::options::WatermarkOptions;

/// The thumbnail pipeline stage that runs before watermarking.
///
/// Implementations receive the same per-call [`WatermarkOptions`] the engine
/// decides with, unchanged, so a custom pipeline can vary the base thumbnail
/// per request (for example leave room for a watermark it knows is coming).
/// Stages that do not care, like [`ResizeThumbnailer`], ignore them.
pub trait Thumbnailer {
    /// Produce the base thumbnail of `image` for the requested `geometry`.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the thumbnail cannot be produced.
    fn create(
        &self,
        image: DynamicImage,
        geometry: Geometry,
        options: &WatermarkOptions,
    ) -> Result<DynamicImage>;
}

/// Downscales the source to fit inside the requested geometry, keeping its
/// aspect ratio. Images that already fit are passed through untouched.
#[derive(Debug, Clone, Copy)]
pub struct ResizeThumbnailer {
    filter: FilterType,
}

impl ResizeThumbnailer {
    /// Create a thumbnailer using the given resampling filter.
    #[must_use]
    pub const fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for ResizeThumbnailer {
    fn default() -> Self {
        Self::new(FilterType::Lanczos3)
    }
}

impl Thumbnailer for ResizeThumbnailer {
    fn create(
        &self,
        image: DynamicImage,
        geometry: Geometry,
        _options: &WatermarkOptions,
    ) -> Result<DynamicImage> {
        if geometry.is_empty() {
            return Err(Error::InvalidGeometry(format!(
                "thumbnail geometry {geometry} has a zero side"
            )));
        }
        if Geometry::of(&image) <= geometry {
            return Ok(image);
        }
        Ok(image.resize(geometry.width, geometry.height, self.filter))
    }
}
