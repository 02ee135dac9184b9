//! Pixel geometries and watermark size specifications.
//!
//! A [`Geometry`] is a plain `(width, height)` pair. Geometries are ordered
//! element-wise: `a >= b` only when *both* sides of `a` meet or exceed the
//! matching side of `b`. A geometry that is wider but shorter than another is
//! neither greater nor smaller, which is what the minimum-applicable-size
//! check wants.
//!
//! Watermark sizes are written the way thumbnail geometries usually are:
//! `"120x40"`, `"120"`, `"x40"`, plus a percentage form (`"25%"`,
//! `"25x10%"`) that is relative to the thumbnail the watermark lands on.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::str::FromStr;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

/// A watermark side may be at most this many times the matching thumbnail
/// side. Anything larger is clipped away anyway.
pub const MAX_WATERMARK_SCALE: u32 = 4;

/// A `(width, height)` pair in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Geometry {
    /// Create a geometry from a width and a height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The pixel dimensions of an image.
    #[must_use]
    pub fn of(image: &DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        Self { width, height }
    }

    /// Width divided by height, or `None` for a degenerate geometry.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(f64::from(self.width) / f64::from(self.height))
        }
    }

    /// Whether either side is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl PartialOrd for Geometry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (
            self.width.cmp(&other.width),
            self.height.cmp(&other.height),
        ) {
            (Ordering::Equal, Ordering::Equal) => Some(Ordering::Equal),
            (Ordering::Greater | Ordering::Equal, Ordering::Greater | Ordering::Equal) => {
                Some(Ordering::Greater)
            }
            (Ordering::Less | Ordering::Equal, Ordering::Less | Ordering::Equal) => {
                Some(Ordering::Less)
            }
            _ => None,
        }
    }
}

impl Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Geometry {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Parses a fully specified `"WxH"` geometry. Zero sides are allowed, so
/// `"0x0"` is a valid threshold.
impl FromStr for Geometry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidGeometry(s.to_string());
        let (w, h) = s.trim().split_once('x').ok_or_else(invalid)?;
        Ok(Self {
            width: w.parse().map_err(|_| invalid())?,
            height: h.parse().map_err(|_| invalid())?,
        })
    }
}

/// A resolved watermark size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeSpec {
    /// An explicit size in pixels.
    Absolute(Geometry),
    /// Percentages of the thumbnail's width and height.
    Relative {
        /// Percentage of the thumbnail width.
        width: f64,
        /// Percentage of the thumbnail height.
        height: f64,
    },
}

impl SizeSpec {
    /// Pixel size of the watermark on a thumbnail of the given dimensions.
    ///
    /// Relative sizes never collapse below one pixel.
    #[must_use]
    pub fn resolve(&self, target: Geometry) -> Geometry {
        match *self {
            Self::Absolute(geometry) => geometry,
            Self::Relative { width, height } => Geometry {
                width: scale(target.width, width),
                height: scale(target.height, height),
            },
        }
    }

    /// Like [`resolve`](Self::resolve), but rejects a size with a side
    /// larger than [`MAX_WATERMARK_SCALE`] times the matching side of
    /// `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidGeometry`] when the resolved size is too large.
    pub fn checked_resolve(&self, target: Geometry) -> Result<Geometry> {
        let size = self.resolve(target);
        let max_width = target.width.max(1).saturating_mul(MAX_WATERMARK_SCALE);
        let max_height = target.height.max(1).saturating_mul(MAX_WATERMARK_SCALE);
        if size.width > max_width || size.height > max_height {
            return Err(Error::InvalidGeometry(format!(
                "watermark size {size} is too large for a {target} thumbnail"
            )));
        }
        Ok(size)
    }
}

impl Display for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(geometry) => Display::fmt(geometry, f),
            Self::Relative { width, height } => write!(f, "{width}x{height}%"),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale(side: u32, percent: f64) -> u32 {
    ((f64::from(side) * percent / 100.0).round() as u32).max(1)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_side(value: f64) -> u32 {
    (value.round() as u32).max(1)
}

/// Parse a watermark size specification.
///
/// `ratio` is the width/height ratio of the image the watermark is applied
/// to. It completes partial pixel specifications: `"120"` becomes
/// `120 x round(120 / ratio)` and `"x40"` becomes `round(40 * ratio) x 40`.
/// Percentages do not need it: a missing side takes the percentage of the
/// side that was given.
///
/// # Errors
///
/// Returns [`Error::InvalidGeometry`] for malformed or zero-sized input, or
/// for a partial pixel specification when no ratio is available.
pub fn parse_geometry(spec: &str, ratio: Option<f64>) -> Result<SizeSpec> {
    let invalid = || Error::InvalidGeometry(spec.to_string());
    let trimmed = spec.trim();

    if let Some(body) = trimmed.strip_suffix('%') {
        let (w, h) = split_sides(body).ok_or_else(invalid)?;
        let w = w.map(parse_percent).transpose().map_err(|()| invalid())?;
        let h = h.map(parse_percent).transpose().map_err(|()| invalid())?;
        let (width, height) = match (w, h) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w),
            (None, Some(h)) => (h, h),
            (None, None) => return Err(invalid()),
        };
        return Ok(SizeSpec::Relative { width, height });
    }

    let (w, h) = split_sides(trimmed).ok_or_else(invalid)?;
    let w = w.map(parse_pixels).transpose().map_err(|()| invalid())?;
    let h = h.map(parse_pixels).transpose().map_err(|()| invalid())?;
    let ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);

    let geometry = match (w, h, ratio) {
        (Some(width), Some(height), _) => Geometry { width, height },
        (Some(width), None, Some(ratio)) => Geometry {
            width,
            height: round_side(f64::from(width) / ratio),
        },
        (None, Some(height), Some(ratio)) => Geometry {
            width: round_side(f64::from(height) * ratio),
            height,
        },
        _ => return Err(invalid()),
    };
    Ok(SizeSpec::Absolute(geometry))
}

/// Split `"WxH"`, `"W"`, `"Wx"` or `"xH"` into its optional sides.
fn split_sides(spec: &str) -> Option<(Option<&str>, Option<&str>)> {
    let (w, h) = match spec.split_once('x') {
        Some((w, h)) => (w, Some(h)),
        None => (spec, None),
    };
    let w = Some(w).filter(|w| !w.is_empty());
    let h = h.filter(|h| !h.is_empty());
    if w.is_none() && h.is_none() {
        None
    } else {
        Some((w, h))
    }
}

fn parse_pixels(s: &str) -> std::result::Result<u32, ()> {
    match s.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(()),
    }
}

fn parse_percent(s: &str) -> std::result::Result<f64, ()> {
    match s.parse::<f64>() {
        Ok(p) if p.is_finite() && p > 0.0 => Ok(p),
        _ => Err(()),
    }
}
