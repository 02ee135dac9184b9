//! Thumbnail generation with configurable watermark overlays.
//!
//! Thumbnails are produced by a [`Thumbnailer`], then optionally watermarked
//! by a [`Compositor`]. The [`WatermarkEngine`] decides, from an immutable
//! [`WatermarkConfig`] and per-call [`WatermarkOptions`], whether a watermark
//! applies and with which opacity, size and position.
//!
//! # Quick Start
//!
//! ```no_run
//! use thumbnail_watermark::{Geometry, WatermarkConfig, WatermarkEngine, WatermarkOptions};
//!
//! let config = WatermarkConfig::builder("/srv/static")
//!     .watermark("img/watermark.png")
//!     .opacity(0.5)
//!     .min_applicable_size("200x200")
//!     .build()
//!     .expect("invalid watermark configuration");
//! let engine = WatermarkEngine::new(config);
//!
//! let img = image::open("photo.jpg").unwrap();
//! let thumb = engine
//!     .create(img, Geometry::new(400, 400), &WatermarkOptions::default())
//!     .unwrap();
//! thumb.image.save("photo_thumb.png").unwrap();
//! ```
//!
//! # Per-call options
//!
//! Any watermark option opts a single thumbnail in, even when the
//! configuration is not in always-on mode or the thumbnail is below the
//! minimum applicable size. `no_watermark` opts it out.
//!
//! ```no_run
//! use thumbnail_watermark::{Geometry, WatermarkConfig, WatermarkEngine, WatermarkOptions};
//!
//! let config = WatermarkConfig::from_file("watermark.yaml").unwrap();
//! let engine = WatermarkEngine::new(config);
//! let options = WatermarkOptions {
//!     watermark_pos: Some("south east".into()),
//!     watermark_size: Some("25%".into()),
//!     watermark_alpha: Some(0.4),
//!     ..WatermarkOptions::default()
//! };
//! let img = image::open("photo.jpg").unwrap();
//! let thumb = engine.create(img, Geometry::new(120, 120), &options).unwrap();
//! println!("{:?}", thumb.watermark);
//! ```

#![deny(missing_docs)]

pub mod blending;
mod compositor;
pub mod config;
mod engine;
pub mod error;
pub mod geometry;
mod options;
pub mod position;
mod process;
mod thumbnail;

pub use compositor::{Compositor, OverlayCompositor};
pub use config::{WatermarkConfig, WatermarkConfigBuilder};
pub use engine::{Thumbnail, WatermarkEngine};
pub use error::{Error, Result};
pub use geometry::{parse_geometry, Geometry, SizeSpec};
pub use options::{ResolvedWatermark, WatermarkOptions};
pub use position::{Gravity, Placements, Position};
pub use process::{default_output_path, is_supported_image, save_image, ProcessResult};
pub use thumbnail::{ResizeThumbnailer, Thumbnailer};
