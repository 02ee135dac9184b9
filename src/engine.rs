//! Core watermark engine: decides whether a thumbnail is watermarked and
//! with which parameters.

use image::DynamicImage;
use tracing::debug;

use crate::compositor::{Compositor, OverlayCompositor};
use crate::config::WatermarkConfig;
use crate::error::{Error, Result};
use crate::geometry::{parse_geometry, Geometry};
use crate::options::{ResolvedWatermark, WatermarkOptions};
use crate::position::Position;
use crate::thumbnail::{ResizeThumbnailer, Thumbnailer};

/// A generated thumbnail and the watermark parameters it was built with.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// The (possibly watermarked) thumbnail.
    pub image: DynamicImage,
    /// Resolved watermark parameters, `None` when no watermark was applied.
    pub watermark: Option<ResolvedWatermark>,
}

/// The watermark engine holding the configuration and pipeline stages.
///
/// Create once at startup and reuse for every thumbnail. The engine never
/// mutates its configuration, so it can be shared across threads whenever
/// its thumbnailer and compositor can.
///
/// Rules for applying a watermark:
///
/// - with [`WatermarkOptions::no_watermark`] set, never;
/// - in always-on mode, when the requested geometry is at least the
///   configured minimum applicable size on both sides;
/// - whenever a per-call watermark option is given, regardless of the mode
///   and the geometry.
#[derive(Debug)]
pub struct WatermarkEngine<T = ResizeThumbnailer, C = OverlayCompositor> {
    config: WatermarkConfig,
    thumbnailer: T,
    compositor: C,
}

impl WatermarkEngine {
    /// Create an engine with the default resize thumbnailer and overlay
    /// compositor.
    #[must_use]
    pub fn new(config: WatermarkConfig) -> Self {
        Self::with_stages(config, ResizeThumbnailer::default(), OverlayCompositor::default())
    }
}

impl<T: Thumbnailer, C: Compositor> WatermarkEngine<T, C> {
    /// Create an engine with custom pipeline stages.
    pub fn with_stages(config: WatermarkConfig, thumbnailer: T, compositor: C) -> Self {
        Self {
            config,
            thumbnailer,
            compositor,
        }
    }

    /// The engine's configuration.
    #[must_use]
    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    /// Whether a thumbnail of `geometry` requested with `options` gets a
    /// watermark.
    #[must_use]
    pub fn should_watermark(&self, geometry: Geometry, options: &WatermarkOptions) -> bool {
        if options.no_watermark {
            debug!(%geometry, "watermark disabled for this thumbnail");
            return false;
        }
        let automatic = self.config.always() && geometry >= self.config.min_applicable_size();
        let apply = automatic || options.has_override();
        debug!(%geometry, automatic, opted_in = options.has_override(), apply, "watermark decision");
        apply
    }

    /// Create the thumbnail of `image` for `geometry`, watermarking it when
    /// [`should_watermark`](Self::should_watermark) says so.
    ///
    /// # Errors
    ///
    /// Propagates thumbnailer errors, and the errors of
    /// [`watermark`](Self::watermark) when a watermark applies.
    pub fn create(
        &self,
        image: DynamicImage,
        geometry: Geometry,
        options: &WatermarkOptions,
    ) -> Result<Thumbnail> {
        let image = self.thumbnailer.create(image, geometry, options)?;
        if self.should_watermark(geometry, options) {
            self.watermark(image, options)
        } else {
            Ok(Thumbnail {
                image,
                watermark: None,
            })
        }
    }

    /// Watermark `image` unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WatermarkNotConfigured`] if no watermark asset is
    /// configured (without touching the compositor), the errors of
    /// [`resolve`](Self::resolve), and compositor errors.
    pub fn watermark(&self, image: DynamicImage, options: &WatermarkOptions) -> Result<Thumbnail> {
        let resolved = self.resolve(&image, options)?;
        let image = self.compositor.composite(image, &resolved)?;
        Ok(Thumbnail {
            image,
            watermark: Some(resolved),
        })
    }

    /// Resolve the watermark parameters for `image`.
    ///
    /// Per-call options win over configured defaults. A per-call size is
    /// parsed with the image's aspect ratio, a configured default size is
    /// used as is, and with neither the size is left unset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WatermarkNotConfigured`] if no asset is configured,
    /// [`Error::InvalidOpacity`] for a per-call opacity outside of
    /// `0.0..=1.0`, parse errors for a malformed size or position, and
    /// [`Error::InvalidGeometry`] for a size far larger than the image.
    pub fn resolve(
        &self,
        image: &DynamicImage,
        options: &WatermarkOptions,
    ) -> Result<ResolvedWatermark> {
        let asset = self
            .config
            .watermark_path()
            .ok_or(Error::WatermarkNotConfigured)?;

        let alpha = options.watermark_alpha.unwrap_or(self.config.opacity());
        if !(0.0..=1.0).contains(&alpha) {
            return Err(Error::InvalidOpacity(alpha));
        }

        let target = Geometry::of(image);
        let size = match (options.watermark_size.as_deref(), self.config.size()) {
            (None, Some(default)) => Some(default),
            (Some(spec), _) => Some(parse_geometry(spec, target.aspect_ratio())?),
            (None, None) => None,
        };
        if let Some(size) = size {
            size.checked_resolve(target)?;
        }

        let position = options
            .watermark_pos
            .as_deref()
            .map(str::parse::<Position>)
            .transpose()?
            .unwrap_or(self.config.position());

        Ok(ResolvedWatermark {
            asset,
            alpha,
            size,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SizeSpec;
    use crate::position::Gravity;
    use image::RgbImage;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Passes the source through and records every composite call.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<ResolvedWatermark>>,
    }

    impl Compositor for &Recorder {
        fn composite(
            &self,
            image: DynamicImage,
            watermark: &ResolvedWatermark,
        ) -> Result<DynamicImage> {
            self.calls.lock().unwrap().push(watermark.clone());
            Ok(image)
        }
    }

    struct Passthrough;

    impl Thumbnailer for Passthrough {
        fn create(
            &self,
            image: DynamicImage,
            _geometry: Geometry,
            _options: &WatermarkOptions,
        ) -> Result<DynamicImage> {
            Ok(image)
        }
    }

    fn config() -> crate::config::WatermarkConfigBuilder {
        WatermarkConfig::builder("/static").watermark("mark.png")
    }

    fn engine(
        config: WatermarkConfig,
        recorder: &Recorder,
    ) -> WatermarkEngine<Passthrough, &Recorder> {
        WatermarkEngine::with_stages(config, Passthrough, recorder)
    }

    fn image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
    }

    #[test]
    fn always_on_above_threshold_applies_defaults() {
        let recorder = Recorder::default();
        let config = config().min_applicable_size("100x100").opacity(0.7).build().unwrap();
        let engine = engine(config, &recorder);

        let thumb = engine
            .create(image(200, 200), Geometry::new(200, 200), &WatermarkOptions::default())
            .unwrap();

        let resolved = thumb.watermark.unwrap();
        assert_eq!(resolved.asset, PathBuf::from("/static/mark.png"));
        assert!((resolved.alpha - 0.7).abs() < f32::EPSILON);
        assert_eq!(resolved.size, None);
        assert_eq!(resolved.position, Position::Gravity(Gravity::Center));
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn always_on_below_threshold_skips() {
        let recorder = Recorder::default();
        let config = config().min_applicable_size("100x100").build().unwrap();
        let engine = engine(config, &recorder);

        let thumb = engine
            .create(image(50, 50), Geometry::new(50, 50), &WatermarkOptions::default())
            .unwrap();

        assert!(thumb.watermark.is_none());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn threshold_must_hold_on_both_sides() {
        let recorder = Recorder::default();
        let config = config().min_applicable_size("100x100").build().unwrap();
        let engine = engine(config, &recorder);
        let options = WatermarkOptions::default();

        assert!(!engine.should_watermark(Geometry::new(500, 99), &options));
        assert!(!engine.should_watermark(Geometry::new(99, 500), &options));
        assert!(engine.should_watermark(Geometry::new(100, 100), &options));
    }

    #[test]
    fn override_forces_watermark_below_threshold_when_not_always() {
        let recorder = Recorder::default();
        let config = config()
            .always(false)
            .min_applicable_size("100x100")
            .build()
            .unwrap();
        let engine = engine(config, &recorder);
        let options = WatermarkOptions {
            watermark_alpha: Some(0.5),
            ..WatermarkOptions::default()
        };

        let thumb = engine
            .create(image(50, 50), Geometry::new(50, 50), &options)
            .unwrap();

        let resolved = thumb.watermark.unwrap();
        assert!((resolved.alpha - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn not_always_without_override_skips() {
        let recorder = Recorder::default();
        let engine = engine(config().always(false).build().unwrap(), &recorder);
        assert!(!engine.should_watermark(Geometry::new(4000, 4000), &WatermarkOptions::default()));
    }

    #[test]
    fn no_watermark_wins_over_everything() {
        let recorder = Recorder::default();
        let engine = engine(config().build().unwrap(), &recorder);
        let options = WatermarkOptions {
            no_watermark: true,
            watermark: true,
            watermark_alpha: Some(0.3),
            ..WatermarkOptions::default()
        };

        let thumb = engine
            .create(image(300, 300), Geometry::new(300, 300), &options)
            .unwrap();
        assert!(thumb.watermark.is_none());
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_asset_is_a_configuration_error_without_compositing() {
        let recorder = Recorder::default();
        let config = WatermarkConfig::builder("/static").build().unwrap();
        let engine = engine(config, &recorder);

        let err = engine
            .watermark(image(10, 10), &WatermarkOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::WatermarkNotConfigured));

        let err = engine
            .create(image(10, 10), Geometry::new(10, 10), &WatermarkOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::WatermarkNotConfigured));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn default_size_is_used_when_no_size_given() {
        let recorder = Recorder::default();
        let engine = engine(config().size("40x20").build().unwrap(), &recorder);

        let resolved = engine
            .resolve(&image(300, 100), &WatermarkOptions::default())
            .unwrap();
        assert_eq!(resolved.size, Some(SizeSpec::Absolute(Geometry::new(40, 20))));
    }

    #[test]
    fn per_call_size_is_parsed_with_image_ratio() {
        let recorder = Recorder::default();
        let engine = engine(config().size("40x20").build().unwrap(), &recorder);
        let options = WatermarkOptions {
            watermark_size: Some("90".into()),
            ..WatermarkOptions::default()
        };

        let resolved = engine.resolve(&image(300, 100), &options).unwrap();
        assert_eq!(resolved.size, Some(SizeSpec::Absolute(Geometry::new(90, 30))));
    }

    #[test]
    fn malformed_per_call_size_propagates_parser_error() {
        let recorder = Recorder::default();
        let engine = engine(config().build().unwrap(), &recorder);
        let options = WatermarkOptions {
            watermark_size: Some("huge".into()),
            ..WatermarkOptions::default()
        };

        let err = engine
            .create(image(10, 10), Geometry::new(10, 10), &options)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn oversized_per_call_size_fails_without_compositing() {
        let recorder = Recorder::default();
        let engine = engine(config().build().unwrap(), &recorder);

        for spec in ["4294967295x1", "1e300%"] {
            let options = WatermarkOptions {
                watermark_size: Some(spec.into()),
                ..WatermarkOptions::default()
            };
            let err = engine
                .create(image(10, 10), Geometry::new(10, 10), &options)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidGeometry(_)), "{spec}");
        }
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn oversized_default_size_fails_without_compositing() {
        let recorder = Recorder::default();
        let engine = engine(config().size("1000x1000").build().unwrap(), &recorder);

        let err = engine
            .create(image(10, 10), Geometry::new(10, 10), &WatermarkOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
        assert!(recorder.calls.lock().unwrap().is_empty());

        let thumb = engine
            .create(image(300, 300), Geometry::new(300, 300), &WatermarkOptions::default())
            .unwrap();
        assert!(thumb.watermark.is_some());
    }

    /// Crops to the requested geometry and records the options it saw.
    #[derive(Default)]
    struct CroppingThumbnailer {
        seen: Mutex<Vec<WatermarkOptions>>,
    }

    impl Thumbnailer for &CroppingThumbnailer {
        fn create(
            &self,
            mut image: DynamicImage,
            geometry: Geometry,
            options: &WatermarkOptions,
        ) -> Result<DynamicImage> {
            self.seen.lock().unwrap().push(options.clone());
            Ok(image.crop(0, 0, geometry.width, geometry.height))
        }
    }

    #[test]
    fn thumbnailer_receives_the_request_options() {
        let recorder = Recorder::default();
        let thumbnailer = CroppingThumbnailer::default();
        let engine = WatermarkEngine::with_stages(
            config().always(false).build().unwrap(),
            &thumbnailer,
            &recorder,
        );
        let options = WatermarkOptions {
            watermark_pos: Some("tile".into()),
            ..WatermarkOptions::default()
        };

        let thumb = engine
            .create(image(40, 40), Geometry::new(20, 10), &options)
            .unwrap();

        assert_eq!(Geometry::of(&thumb.image), Geometry::new(20, 10));
        assert_eq!(*thumbnailer.seen.lock().unwrap(), vec![options]);
        assert_eq!(recorder.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn per_call_position_and_invalid_alpha() {
        let recorder = Recorder::default();
        let engine = engine(config().position("north").build().unwrap(), &recorder);

        let resolved = engine
            .resolve(&image(10, 10), &WatermarkOptions::default())
            .unwrap();
        assert_eq!(resolved.position, Position::Gravity(Gravity::North));

        let options = WatermarkOptions {
            watermark_pos: Some("tile".into()),
            ..WatermarkOptions::default()
        };
        let resolved = engine.resolve(&image(10, 10), &options).unwrap();
        assert_eq!(resolved.position, Position::Tile);

        let options = WatermarkOptions {
            watermark_alpha: Some(1.5),
            ..WatermarkOptions::default()
        };
        assert!(matches!(
            engine.resolve(&image(10, 10), &options),
            Err(Error::InvalidOpacity(_))
        ));
    }
}
