//! Strata configuration file handling
//!
//! `strata.toml` tunes the window, the render quality profiles and the
//! motion constants. Every table and field is optional; missing values fall
//! back to the defaults below.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use strata_3d::RenderQuality;
use strata_animation::{SmoothScrollConfig, SpringConfig};
use strata_platform::{ViewportClass, DEFAULT_BREAKPOINT};

/// Default file name looked up in the working directory
pub const CONFIG_FILE: &str = "strata.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StrataConfig {
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub viewport: ViewportConfig,
    pub pointer: PointerConfig,
    pub scroll: ScrollConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Logical width
    pub width: u32,
    /// Logical height
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Strata".to_string(),
            width: 1280,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Pixel ratio ceiling on desktop viewports
    pub pixel_ratio_cap: f32,
    /// Pixel ratio ceiling on mobile viewports
    pub mobile_pixel_ratio_cap: f32,
    /// Slow camera drift while idle
    pub idle_oscillation: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            pixel_ratio_cap: RenderQuality::desktop().pixel_ratio_cap,
            mobile_pixel_ratio_cap: RenderQuality::mobile().pixel_ratio_cap,
            idle_oscillation: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Logical width below which the viewport is mobile
    pub breakpoint: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            breakpoint: DEFAULT_BREAKPOINT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PointerConfig {
    pub stiffness: f32,
    pub damping: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        let spring = SpringConfig::pointer();
        Self {
            stiffness: spring.stiffness,
            damping: spring.damping,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Seconds a wheel glide takes to settle
    pub duration: f32,
    pub wheel_multiplier: f32,
    pub touch_multiplier: f32,
    /// Logical pixels per wheel line
    pub line_height: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        let smooth = SmoothScrollConfig::default();
        Self {
            duration: smooth.duration,
            wheel_multiplier: smooth.wheel_multiplier,
            touch_multiplier: smooth.touch_multiplier,
            line_height: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl StrataConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load `strata.toml` from `dir` when present, defaults otherwise
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: StrataConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.render.pixel_ratio_cap <= 0.0 || self.render.mobile_pixel_ratio_cap <= 0.0 {
            anyhow::bail!("render pixel ratio caps must be positive");
        }
        if self.pointer.stiffness <= 0.0 || self.pointer.damping < 0.0 {
            anyhow::bail!("pointer spring needs positive stiffness and non-negative damping");
        }
        if self.scroll.duration < 0.0 {
            anyhow::bail!("scroll.duration must not be negative");
        }
        Ok(())
    }

    /// Render quality profile for a viewport class
    pub fn quality(&self, class: ViewportClass) -> RenderQuality {
        let pixel_ratio_cap = match class {
            ViewportClass::Desktop => self.render.pixel_ratio_cap,
            ViewportClass::Mobile => self.render.mobile_pixel_ratio_cap,
        };
        RenderQuality { pixel_ratio_cap }
    }

    pub fn spring(&self) -> SpringConfig {
        SpringConfig::new(self.pointer.stiffness, self.pointer.damping, 1.0)
    }

    pub fn smooth_scroll(&self) -> SmoothScrollConfig {
        SmoothScrollConfig {
            duration: self.scroll.duration,
            wheel_multiplier: self.scroll.wheel_multiplier,
            touch_multiplier: self.scroll.touch_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = StrataConfig::parse("").unwrap();
        assert_eq!(config, StrataConfig::default());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.viewport.breakpoint, 768.0);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_partial_tables_keep_other_defaults() {
        let config = StrataConfig::parse(
            r#"
            [render]
            pixel_ratio_cap = 2.0

            [scroll]
            duration = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(config.render.pixel_ratio_cap, 2.0);
        assert_eq!(config.render.mobile_pixel_ratio_cap, 1.0);
        assert!(config.render.idle_oscillation);
        assert_eq!(config.smooth_scroll().duration, 0.8);
        assert_eq!(config.smooth_scroll().touch_multiplier, 2.0);
    }

    #[test]
    fn test_quality_follows_viewport_class() {
        let config = StrataConfig::default();
        assert_eq!(config.quality(ViewportClass::Desktop).pixel_ratio_cap, 1.75);
        assert_eq!(config.quality(ViewportClass::Mobile).pixel_ratio_cap, 1.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(StrataConfig::parse("[render]\npixel_ratio_cap = 0.0").is_err());
        assert!(StrataConfig::parse("[pointer]\nstiffness = -1.0").is_err());
        assert!(StrataConfig::parse("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn test_missing_file_in_dir_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("strata-config-test-missing");
        let config = StrataConfig::load_from_dir(&dir).unwrap();
        assert_eq!(config, StrataConfig::default());
    }
}
