//! Process-wide tuning, loaded once at start-up and shared read-only.
//!
//! Values come from `GOALFINDER_*` environment variables (the binaries seed the
//! environment from a `.env` file first) and fall back to the defaults below.

use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::{Error, Result};

const ENV_PREFIX: &str = "GOALFINDER_";

/// Target constants that parameterize candidate scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScorerConfig {
    /// Ideal fraction of the bounding box covered by the outline.
    pub coverage_ratio_target: f64,
    /// Ideal bounding-box width / height.
    pub aspect_ratio_target: f64,
    /// Ideal normalized central moment nu02.
    pub moment_target: f64,
    /// Outlines enclosing less area than this are discarded outright.
    pub area_threshold_min: f64,
    /// Log per-outline diagnostics at info level.
    pub verbose: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            coverage_ratio_target: 80.0 / 240.0,
            aspect_ratio_target: 20.0 / 12.0,
            moment_target: 0.28,
            area_threshold_min: 1000.0,
            verbose: false,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("COVERAGE_RATIO_TARGET", self.coverage_ratio_target),
            ("ASPECT_RATIO_TARGET", self.aspect_ratio_target),
            ("MOMENT_TARGET", self.moment_target),
            ("AREA_THRESHOLD_MIN", self.area_threshold_min),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::config(key, format!("expected a finite non-negative number, got {value}")));
            }
        }
        Ok(())
    }
}

/// Color, morphology and edge thresholds for turning a frame into an edge mask.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskConfig {
    /// Inclusive hue range on the 0..=180 scale.
    pub hue: [u8; 2],
    /// Inclusive value (brightness) range.
    pub value: [u8; 2],
    pub blur_sigma: f32,
    /// Side of the square erosion element, in pixels. Odd.
    pub erode_size: u32,
    /// Side of the box blur applied before edge detection. Odd.
    pub edge_blur_size: u32,
    pub canny_low: f32,
    /// High Canny threshold is `canny_low + canny_span`.
    pub canny_span: f32,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            hue: [70, 100],
            value: [128, 255],
            blur_sigma: 2.5,
            erode_size: 5,
            edge_blur_size: 3,
            canny_low: 10.0,
            canny_span: 10.0,
        }
    }
}

impl MaskConfig {
    pub fn canny_high(&self) -> f32 {
        self.canny_low + self.canny_span
    }

    pub fn validate(&self) -> Result<()> {
        if self.hue[0] > self.hue[1] || self.hue[1] > 180 {
            return Err(Error::config("HUE", format!("invalid range {:?}", self.hue)));
        }
        if self.value[0] > self.value[1] {
            return Err(Error::config("VALUE", format!("invalid range {:?}", self.value)));
        }
        if !(self.blur_sigma > 0.0) {
            return Err(Error::config("BLUR_SIGMA", "must be positive"));
        }
        for (key, size) in [("ERODE_SIZE", self.erode_size), ("EDGE_BLUR_SIZE", self.edge_blur_size)] {
            if size == 0 || size % 2 == 0 {
                return Err(Error::config(key, format!("must be a positive odd size, got {size}")));
            }
        }
        if self.canny_low < 0.0 || self.canny_span < 0.0 {
            return Err(Error::config("CANNY_LOW", "thresholds must be non-negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    pub scorer: ScorerConfig,
    pub mask: MaskConfig,
}

impl Config {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, which receives full variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);
        let mut config = Config::default();

        let scorer = &mut config.scorer;
        env.read("COVERAGE_RATIO_TARGET", &mut scorer.coverage_ratio_target)?;
        env.read("ASPECT_RATIO_TARGET", &mut scorer.aspect_ratio_target)?;
        env.read("MOMENT_TARGET", &mut scorer.moment_target)?;
        env.read("AREA_THRESHOLD_MIN", &mut scorer.area_threshold_min)?;
        env.read_flag("VERBOSE", &mut scorer.verbose)?;

        let mask = &mut config.mask;
        env.read("HUE_MIN", &mut mask.hue[0])?;
        env.read("HUE_MAX", &mut mask.hue[1])?;
        env.read("VALUE_MIN", &mut mask.value[0])?;
        env.read("VALUE_MAX", &mut mask.value[1])?;
        env.read("BLUR_SIGMA", &mut mask.blur_sigma)?;
        env.read("ERODE_SIZE", &mut mask.erode_size)?;
        env.read("EDGE_BLUR_SIZE", &mut mask.edge_blur_size)?;
        env.read("CANNY_LOW", &mut mask.canny_low)?;
        env.read("CANNY_SPAN", &mut mask.canny_span)?;

        config.scorer.validate()?;
        config.mask.validate()?;
        debug!("loaded configuration: {:?}", config);
        Ok(config)
    }
}

struct Lookup<F>(F);

impl<F: Fn(&str) -> Option<String>> Lookup<F> {
    fn raw(&self, key: &str) -> Option<(String, String)> {
        let name = format!("{ENV_PREFIX}{key}");
        let value = (self.0)(&name)?;
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| (name, trimmed.to_string()))
    }

    fn read<T>(&self, key: &str, slot: &mut T) -> Result<()>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some((name, value)) = self.raw(key) {
            *slot = value
                .parse()
                .map_err(|e: T::Err| Error::config(&name, format!("{value:?}: {e}")))?;
        }
        Ok(())
    }

    fn read_flag(&self, key: &str, slot: &mut bool) -> Result<()> {
        if let Some((name, value)) = self.raw(key) {
            *slot = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => return Err(Error::config(&name, format!("not a boolean: {other:?}"))),
            };
        }
        Ok(())
    }
}
