//! Style Configuration
//! Read-only chart style parameters with defaults and an optional JSON override file.

use crate::charts::{Archetype, ChartStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest accepted image side in pixels.
pub const MAX_PIXEL_SIDE: u32 = 16384;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read style file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid style JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid style setting: {0}")]
    Invalid(String),
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#RRGGBB`.
    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Style parameters shared by every chart of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Series and slice colors, cycled in order.
    pub palette: Vec<String>,
    pub text_color: String,
    pub background: String,
    pub plot_background: String,
    pub font_family: String,
    /// Body font size in points.
    pub font_size: u32,
    /// Title font size in points.
    pub title_font_size: u32,
    /// Single chart size in inches.
    pub figure_size: [f64; 2],
    /// Dashboard size in inches.
    pub dashboard_size: [f64; 2],
    pub dpi: u32,
    /// Donut hole as a fraction of the pie radius.
    pub donut_hole: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            palette: [
                "#1f4e79", "#2e8b57", "#ff6b35", "#28a745", "#ffc107", "#dc3545", "#17a2b8",
                "#6f42c1",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            text_color: "#343a40".to_string(),
            background: "#ffffff".to_string(),
            plot_background: "#f8f9fa".to_string(),
            font_family: "sans-serif".to_string(),
            font_size: 12,
            title_font_size: 18,
            figure_size: [14.0, 10.0],
            dashboard_size: [24.0, 16.0],
            dpi: 100,
            donut_hole: 0.4,
        }
    }
}

impl StyleConfig {
    /// Load and validate a JSON style file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StyleConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.palette.is_empty() {
            return Err(ConfigError::Invalid("palette must not be empty".into()));
        }
        let colors = self
            .palette
            .iter()
            .chain([&self.text_color, &self.background, &self.plot_background]);
        for color in colors {
            if Rgb::parse(color).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "'{color}' is not a #RRGGBB color"
                )));
            }
        }
        if !(1..=600).contains(&self.dpi) {
            return Err(ConfigError::Invalid(format!(
                "dpi must be between 1 and 600, got {}",
                self.dpi
            )));
        }
        if self.font_size == 0 || self.title_font_size == 0 {
            return Err(ConfigError::Invalid("font sizes must be positive".into()));
        }
        let sizes = self.figure_size.iter().chain(self.dashboard_size.iter());
        if sizes.into_iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ConfigError::Invalid("figure sizes must be positive".into()));
        }
        let sizes = self.figure_size.iter().chain(self.dashboard_size.iter());
        if let Some(side) = sizes
            .map(|s| s * self.dpi as f64)
            .find(|px| *px > MAX_PIXEL_SIDE as f64)
        {
            return Err(ConfigError::Invalid(format!(
                "figure side of {side:.0} px exceeds {MAX_PIXEL_SIDE} px"
            )));
        }
        if !(0.0..0.9).contains(&self.donut_hole) {
            return Err(ConfigError::Invalid(format!(
                "donut_hole must be in [0, 0.9), got {}",
                self.donut_hole
            )));
        }
        Ok(())
    }

    /// Pixel dimensions of a figure at the configured DPI.
    pub fn pixel_size(&self, inches: [f64; 2]) -> (u32, u32) {
        let px = |i: f64| ((i * self.dpi as f64).round() as u32).max(1);
        (px(inches[0]), px(inches[1]))
    }

    fn points_to_px(&self, points: u32) -> u32 {
        ((points as f64 * self.dpi as f64 / 72.0).round() as u32).max(1)
    }

    fn color(hex: &str) -> Rgb {
        Rgb::parse(hex).unwrap_or(Rgb(0, 0, 0))
    }

    /// Style parameters resolved for one chart archetype.
    pub fn chart_style(&self, archetype: Archetype) -> ChartStyle {
        let inches = match archetype {
            Archetype::Dashboard => self.dashboard_size,
            _ => self.figure_size,
        };
        ChartStyle {
            palette: self.palette.iter().map(|c| Self::color(c)).collect(),
            text_color: Self::color(&self.text_color),
            background: Self::color(&self.background),
            plot_background: Self::color(&self.plot_background),
            font_family: self.font_family.clone(),
            font_px: self.points_to_px(self.font_size),
            title_px: self.points_to_px(self.title_font_size),
            size: self.pixel_size(inches),
            dpi: self.dpi,
            value_labels: matches!(
                archetype,
                Archetype::Trend | Archetype::Bar | Archetype::Comparison
            ),
            donut_hole: (archetype == Archetype::Pie).then_some(self.donut_hole),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_is_valid() {
        assert!(StyleConfig::default().validate().is_ok());
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::parse("#1f4e79"), Some(Rgb(0x1f, 0x4e, 0x79)));
        assert_eq!(Rgb::parse("1f4e79"), None);
        assert_eq!(Rgb::parse("#1f4e7"), None);
        assert_eq!(Rgb::parse("#zzzzzz"), None);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r##"{{ "dpi": 50, "palette": ["#000000", "#ffffff"] }}"##).unwrap();

        let config = StyleConfig::load(file.path()).unwrap();
        assert_eq!(config.dpi, 50);
        assert_eq!(config.palette.len(), 2);
        assert_eq!(config.font_size, 12);
        assert_eq!(config.pixel_size(config.figure_size), (700, 500));
    }

    #[test]
    fn rejects_bad_values() {
        let bad_dpi = StyleConfig {
            dpi: 0,
            ..StyleConfig::default()
        };
        assert!(matches!(bad_dpi.validate(), Err(ConfigError::Invalid(_))));

        let bad_color = StyleConfig {
            palette: vec!["red".into()],
            ..StyleConfig::default()
        };
        assert!(matches!(bad_color.validate(), Err(ConfigError::Invalid(_))));

        let bad_hole = StyleConfig {
            donut_hole: 0.95,
            ..StyleConfig::default()
        };
        assert!(bad_hole.validate().is_err());
    }

    #[test]
    fn rejects_oversized_figures() {
        let too_many_pixels = StyleConfig {
            figure_size: [200.0, 200.0],
            dpi: 600,
            ..StyleConfig::default()
        };
        assert!(matches!(
            too_many_pixels.validate(),
            Err(ConfigError::Invalid(msg)) if msg.contains("16384")
        ));

        let huge_dashboard = StyleConfig {
            dashboard_size: [1e6, 1e6],
            ..StyleConfig::default()
        };
        assert!(matches!(huge_dashboard.validate(), Err(ConfigError::Invalid(_))));

        let at_limit = StyleConfig {
            figure_size: [160.0, 10.0],
            ..StyleConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ dpi: ").unwrap();
        assert!(matches!(
            StyleConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn chart_style_per_archetype() {
        let config = StyleConfig::default();
        let trend = config.chart_style(Archetype::Trend);
        assert!(trend.value_labels);
        assert_eq!(trend.size, (1400, 1000));
        assert_eq!(trend.donut_hole, None);
        assert_eq!(trend.font_px, 17);

        let pie = config.chart_style(Archetype::Pie);
        assert!(!pie.value_labels);
        assert_eq!(pie.donut_hole, Some(0.4));

        let dashboard = config.chart_style(Archetype::Dashboard);
        assert_eq!(dashboard.size, (2400, 1600));
    }
}
