//! File and directory processing on top of [`WatermarkEngine`].

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::compositor::Compositor;
use crate::engine::WatermarkEngine;
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::options::WatermarkOptions;
use crate::thumbnail::Thumbnailer;

/// JPEG quality used when saving thumbnails.
const JPEG_QUALITY: u8 = 90;

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether a watermark was applied.
    pub watermarked: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            watermarked: false,
            message,
        }
    }
}

impl<T: Thumbnailer, C: Compositor> WatermarkEngine<T, C> {
    /// Process a single image file: load, thumbnail, watermark, save.
    ///
    /// Returns a [`ProcessResult`] indicating success or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        geometry: Geometry,
        options: &WatermarkOptions,
    ) -> ProcessResult {
        let source = match image::open(input) {
            Ok(img) => img,
            Err(e) => return ProcessResult::failed(input, format!("Failed to load: {e}")),
        };

        let thumbnail = match self.create(source, geometry, options) {
            Ok(thumbnail) => thumbnail,
            Err(e) => return ProcessResult::failed(input, format!("Failed to create thumbnail: {e}")),
        };

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return ProcessResult::failed(
                        input,
                        format!("Failed to create output directory: {e}"),
                    );
                }
            }
        }

        if let Err(e) = save_image(&thumbnail.image, output) {
            return ProcessResult::failed(input, format!("Failed to save: {e}"));
        }

        let watermarked = thumbnail.watermark.is_some();
        debug!(input = %input.display(), output = %output.display(), watermarked, "thumbnail written");
        ProcessResult {
            path: input.to_path_buf(),
            success: true,
            watermarked,
            message: if watermarked {
                "Thumbnail created with watermark".to_string()
            } else {
                "Thumbnail created".to_string()
            },
        }
    }

    /// Process all supported images in a directory.
    ///
    /// Output files keep their names and land in `output_dir`. Uses parallel
    /// iteration when the `cli` feature is enabled (via rayon).
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        geometry: Geometry,
        options: &WatermarkOptions,
    ) -> Vec<ProcessResult>
    where
        T: Sync,
        C: Sync,
    {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|path| {
                    let supported = is_supported_image(path);
                    if !supported {
                        warn!(path = %path.display(), "skipping unsupported file");
                    }
                    supported
                })
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failed(
                    output_dir,
                    format!("Failed to create output directory: {e}"),
                )];
            }
        }

        let process = |input_path: &PathBuf| {
            let output_path = match input_path.file_name() {
                Some(name) => output_dir.join(name),
                None => output_dir.to_path_buf(),
            };
            self.process_file(input_path, &output_path, geometry, options)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            entries.iter().map(process).collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save a thumbnail with format-specific settings.
///
/// JPEG drops any alpha channel and is written at quality 90.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &DynamicImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, JPEG_QUALITY);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
        ImageFormat::WebP => {
            DynamicImage::ImageRgba8(img.to_rgba8()).save(path)?;
        }
        ImageFormat::Png | ImageFormat::Bmp => {
            img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_thumb.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_thumb.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_path_appends_thumb_suffix() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/photo_thumb.jpg"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "image_thumb.png");
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn save_image_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        assert!(matches!(
            save_image(&img, &dir.path().join("out.xyz")),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn save_image_writes_jpeg_from_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let img = DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        save_image(&img, &path).unwrap();
        assert_eq!(image::open(&path).unwrap().width(), 4);
    }
}
