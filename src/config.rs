//! Process-wide watermark configuration.
//!
//! The configuration is built once at startup, validated, and then only read.
//! It is usually loaded from YAML:
//!
//! ```yaml
//! static-root: /srv/static
//! watermark: img/watermark.png
//! always: true
//! opacity: 0.6
//! size: 25%
//! min-applicable-size: 200x200
//! position: south east
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::geometry::{parse_geometry, Geometry, SizeSpec};
use crate::position::Position;

fn default_always() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

/// On-disk shape of the configuration, before validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RawConfig {
    static_root: PathBuf,
    #[serde(default)]
    watermark: Option<PathBuf>,
    #[serde(default = "default_always")]
    always: bool,
    #[serde(default = "default_opacity")]
    opacity: f32,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    min_applicable_size: Option<String>,
    #[serde(default)]
    position: Option<String>,
}

/// Validated, immutable watermark configuration.
///
/// Construct with [`WatermarkConfig::builder`], [`WatermarkConfig::from_yaml_str`]
/// or [`WatermarkConfig::from_file`]. All of them reject an opacity outside of
/// `0.0..=1.0`, so a constructed config always holds a valid one.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkConfig {
    static_root: PathBuf,
    watermark: Option<PathBuf>,
    always: bool,
    opacity: f32,
    size: Option<SizeSpec>,
    min_applicable_size: Geometry,
    position: Position,
}

impl WatermarkConfig {
    /// Start building a configuration rooted at `static_root`.
    pub fn builder(static_root: impl Into<PathBuf>) -> WatermarkConfigBuilder {
        WatermarkConfigBuilder {
            static_root: static_root.into(),
            watermark: None,
            always: default_always(),
            opacity: default_opacity(),
            size: None,
            min_applicable_size: None,
            position: None,
        }
    }

    /// Parse and validate a YAML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for malformed YAML or unknown keys and
    /// [`Error::InvalidConfig`] when a value fails validation.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        let mut builder = Self::builder(raw.static_root)
            .always(raw.always)
            .opacity(raw.opacity);
        if let Some(watermark) = raw.watermark {
            builder = builder.watermark(watermark);
        }
        if let Some(size) = raw.size {
            builder = builder.size(size);
        }
        if let Some(threshold) = raw.min_applicable_size {
            builder = builder.min_applicable_size(threshold);
        }
        if let Some(position) = raw.position {
            builder = builder.position(position);
        }
        builder.build()
    }

    /// Read, parse and validate a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise the errors
    /// of [`WatermarkConfig::from_yaml_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "loaded watermark configuration");
        Self::from_yaml_str(&yaml)
    }

    /// Base directory the watermark asset is resolved against.
    #[must_use]
    pub fn static_root(&self) -> &Path {
        &self.static_root
    }

    /// The configured watermark asset, relative to the static root.
    #[must_use]
    pub fn watermark(&self) -> Option<&Path> {
        self.watermark.as_deref()
    }

    /// Full path of the watermark asset, if one is configured.
    #[must_use]
    pub fn watermark_path(&self) -> Option<PathBuf> {
        self.watermark().map(|w| self.static_root.join(w))
    }

    /// Whether watermarks are applied without per-call opt-in.
    #[must_use]
    pub fn always(&self) -> bool {
        self.always
    }

    /// Default opacity, within `0.0..=1.0`.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Default watermark size, if any.
    #[must_use]
    pub fn size(&self) -> Option<SizeSpec> {
        self.size
    }

    /// Thumbnails must be at least this large for automatic watermarking.
    #[must_use]
    pub fn min_applicable_size(&self) -> Geometry {
        self.min_applicable_size
    }

    /// Default watermark position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

/// Builder for [`WatermarkConfig`]. Values are validated in [`build`](Self::build).
#[derive(Debug, Clone)]
#[must_use]
pub struct WatermarkConfigBuilder {
    static_root: PathBuf,
    watermark: Option<PathBuf>,
    always: bool,
    opacity: f32,
    size: Option<String>,
    min_applicable_size: Option<String>,
    position: Option<String>,
}

impl WatermarkConfigBuilder {
    /// Watermark asset path, relative to the static root. An empty path
    /// leaves watermarking disabled.
    pub fn watermark(mut self, path: impl Into<PathBuf>) -> Self {
        self.watermark = Some(path.into());
        self
    }

    /// Apply watermarks automatically above the minimum applicable size.
    pub fn always(mut self, always: bool) -> Self {
        self.always = always;
        self
    }

    /// Default opacity.
    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Default watermark size, e.g. `"120x40"` or `"25%"`.
    pub fn size(mut self, spec: impl Into<String>) -> Self {
        self.size = Some(spec.into());
        self
    }

    /// Minimum thumbnail geometry for automatic watermarking, e.g. `"200x200"`.
    pub fn min_applicable_size(mut self, spec: impl Into<String>) -> Self {
        self.min_applicable_size = Some(spec.into());
        self
    }

    /// Default watermark position, e.g. `"south east"`.
    pub fn position(mut self, spec: impl Into<String>) -> Self {
        self.position = Some(spec.into());
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the opacity is outside of
    /// `0.0..=1.0`, or if the size, threshold or position cannot be parsed.
    /// A default size must be complete on its own (`"WxH"` or a percentage)
    /// since there is no image to complete it from.
    pub fn build(self) -> Result<WatermarkConfig> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::InvalidConfig(format!(
                "opacity must be within 0.0..=1.0, got {}",
                self.opacity
            )));
        }

        let size = self
            .size
            .as_deref()
            .map(|spec| parse_geometry(spec, None))
            .transpose()
            .map_err(|e| Error::InvalidConfig(format!("size: {e}")))?;

        let min_applicable_size = self
            .min_applicable_size
            .as_deref()
            .map(str::parse::<Geometry>)
            .transpose()
            .map_err(|e| Error::InvalidConfig(format!("min-applicable-size: {e}")))?
            .unwrap_or_default();

        let position = self
            .position
            .as_deref()
            .map(str::parse::<Position>)
            .transpose()
            .map_err(|e| Error::InvalidConfig(format!("position: {e}")))?
            .unwrap_or_default();

        let watermark = self.watermark.filter(|w| !w.as_os_str().is_empty());

        Ok(WatermarkConfig {
            static_root: self.static_root,
            watermark,
            always: self.always,
            opacity: self.opacity,
            size,
            min_applicable_size,
            position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Gravity;

    #[test]
    fn defaults() {
        let config = WatermarkConfig::builder("/srv/static").build().unwrap();
        assert_eq!(config.static_root(), Path::new("/srv/static"));
        assert_eq!(config.watermark(), None);
        assert_eq!(config.watermark_path(), None);
        assert!(config.always());
        assert!((config.opacity() - 1.0).abs() < f32::EPSILON);
        assert_eq!(config.size(), None);
        assert_eq!(config.min_applicable_size(), Geometry::new(0, 0));
        assert_eq!(config.position(), Position::Gravity(Gravity::Center));
    }

    #[test]
    fn yaml_with_every_key() {
        let yaml = r"
static-root: /srv/static
watermark: img/mark.png
always: false
opacity: 0.25
size: 30x10
min-applicable-size: 200x150
position: south east
";
        let config = WatermarkConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.watermark_path(),
            Some(PathBuf::from("/srv/static/img/mark.png"))
        );
        assert!(!config.always());
        assert!((config.opacity() - 0.25).abs() < f32::EPSILON);
        assert_eq!(
            config.size(),
            Some(SizeSpec::Absolute(Geometry::new(30, 10)))
        );
        assert_eq!(config.min_applicable_size(), Geometry::new(200, 150));
        assert_eq!(config.position(), Position::Gravity(Gravity::SouthEast));
    }

    #[test]
    fn yaml_minimal_uses_defaults() {
        let config = WatermarkConfig::from_yaml_str("static-root: /static\n").unwrap();
        assert_eq!(config, WatermarkConfig::builder("/static").build().unwrap());
    }

    #[test]
    fn opacity_out_of_range_fails_fast() {
        for opacity in [-0.1, 1.01, f32::NAN] {
            let err = WatermarkConfig::builder("/static")
                .opacity(opacity)
                .build()
                .unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{opacity}");
        }

        let err = WatermarkConfig::from_yaml_str("static-root: /s\nopacity: 2\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn partial_default_size_is_rejected() {
        let err = WatermarkConfig::builder("/static")
            .size("120")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("size"));

        let config = WatermarkConfig::builder("/static").size("20%").build().unwrap();
        assert_eq!(
            config.size(),
            Some(SizeSpec::Relative {
                width: 20.0,
                height: 20.0
            })
        );
    }

    #[test]
    fn invalid_threshold_and_position_are_rejected() {
        assert!(WatermarkConfig::builder("/s")
            .min_applicable_size("wide")
            .build()
            .is_err());
        assert!(WatermarkConfig::builder("/s")
            .position("upside down")
            .build()
            .is_err());
    }

    #[test]
    fn empty_watermark_means_disabled() {
        let config = WatermarkConfig::builder("/s").watermark("").build().unwrap();
        assert_eq!(config.watermark(), None);

        let config = WatermarkConfig::from_yaml_str("static-root: /s\nwatermark: null\n").unwrap();
        assert_eq!(config.watermark(), None);
    }

    #[test]
    fn unknown_keys_and_bad_yaml_are_parse_errors() {
        let err = WatermarkConfig::from_yaml_str("static-root: /s\ncolour: red\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));

        let err = WatermarkConfig::from_yaml_str("always: true\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watermark.yaml");
        std::fs::write(&path, "static-root: /s\nwatermark: mark.png\n").unwrap();

        let config = WatermarkConfig::from_file(&path).unwrap();
        assert_eq!(config.watermark(), Some(Path::new("mark.png")));

        let missing = WatermarkConfig::from_file(dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(Error::Io(_))));
    }
}
