//! Per-call watermark options and their resolved form.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::geometry::SizeSpec;
use crate::position::Position;

/// Watermark options supplied with a single thumbnail request.
///
/// Every field left at its default means "not given". Giving any of
/// `watermark`, `watermark_pos`, `watermark_size` or `watermark_alpha` opts
/// the request into watermarking, whatever the global configuration says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatermarkOptions {
    /// Never watermark this thumbnail.
    pub no_watermark: bool,
    /// Watermark this thumbnail with the configured defaults.
    pub watermark: bool,
    /// Position override, e.g. `"south east"`, `"-10 -10"` or `"tile"`.
    pub watermark_pos: Option<String>,
    /// Size override, e.g. `"120x40"`, `"120"` or `"25%"`.
    pub watermark_size: Option<String>,
    /// Opacity override.
    pub watermark_alpha: Option<f32>,
}

impl WatermarkOptions {
    /// Whether any per-call watermark override is present.
    #[must_use]
    pub fn has_override(&self) -> bool {
        self.watermark
            || self.watermark_pos.is_some()
            || self.watermark_size.is_some()
            || self.watermark_alpha.is_some()
    }

    /// Build options from `key=value` style pairs.
    ///
    /// `no_watermark` and `watermark` are flags: their presence is what
    /// counts, not their value. Keys that are not watermark options are
    /// ignored so the same pairs can carry options for other stages.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if `watermark_alpha` is not a number.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            match key.as_ref() {
                "no_watermark" => options.no_watermark = true,
                "watermark" => options.watermark = true,
                "watermark_pos" => options.watermark_pos = Some(value.into()),
                "watermark_size" => options.watermark_size = Some(value.into()),
                "watermark_alpha" => {
                    let value = value.into();
                    let alpha = value.trim().parse::<f32>().map_err(|_| {
                        Error::InvalidOption(format!("watermark_alpha={value}"))
                    })?;
                    options.watermark_alpha = Some(alpha);
                }
                _ => {}
            }
        }
        Ok(options)
    }
}

/// The fully resolved parameters a watermark is composited with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedWatermark {
    /// Path of the watermark image on disk.
    pub asset: PathBuf,
    /// Opacity, within `0.0..=1.0`.
    pub alpha: f32,
    /// Size of the watermark; `None` keeps the asset's natural size.
    pub size: Option<SizeSpec>,
    /// Where the watermark is placed.
    pub position: Position,
}
