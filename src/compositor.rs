//! Compositing a resolved watermark onto a thumbnail.

use image::imageops::{self, FilterType};
use image::DynamicImage;
use tracing::debug;

use crate::blending;
use crate::error::Result;
use crate::geometry::Geometry;
use crate::options::ResolvedWatermark;

/// The primitive that draws a watermark onto a thumbnail.
pub trait Compositor {
    /// Composite `watermark` onto `image` and return the result.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the watermark asset cannot be
    /// loaded or drawn.
    fn composite(&self, image: DynamicImage, watermark: &ResolvedWatermark)
        -> Result<DynamicImage>;
}

/// Loads the watermark asset from disk, scales it, and alpha-blends it onto
/// the thumbnail at every placement of the resolved position.
#[derive(Debug, Clone, Copy)]
pub struct OverlayCompositor {
    filter: FilterType,
}

impl OverlayCompositor {
    /// Create a compositor that scales watermarks with the given filter.
    #[must_use]
    pub const fn new(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl Default for OverlayCompositor {
    fn default() -> Self {
        Self::new(FilterType::Lanczos3)
    }
}

impl Compositor for OverlayCompositor {
    fn composite(
        &self,
        image: DynamicImage,
        watermark: &ResolvedWatermark,
    ) -> Result<DynamicImage> {
        let target_size = Geometry::of(&image);
        let mut mark = image::open(&watermark.asset)?.to_rgba8();

        if let Some(size) = watermark.size {
            let size = size.checked_resolve(target_size)?;
            if size != Geometry::new(mark.width(), mark.height()) {
                mark = imageops::resize(&mark, size.width, size.height, self.filter);
            }
        }

        let mark_size = Geometry::new(mark.width(), mark.height());
        debug!(
            asset = %watermark.asset.display(),
            alpha = watermark.alpha,
            size = %mark_size,
            position = %watermark.position,
            "compositing watermark"
        );

        let keep_alpha = image.color().has_alpha();
        let mut canvas = image.into_rgba8();
        for (x, y) in watermark.position.placements(target_size, mark_size) {
            blending::blend_layer(&mut canvas, &mark, x, y, watermark.alpha);
        }

        let result = DynamicImage::ImageRgba8(canvas);
        if keep_alpha {
            Ok(result)
        } else {
            Ok(DynamicImage::ImageRgb8(result.into_rgb8()))
        }
    }
}
