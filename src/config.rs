//! Configuration for the evaluation analysis.
//!
//! Defines the `rec-eval.toml` schema: significance level and chart
//! geometry. Everything has a sensible default so the file is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Analysis configuration loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Significance threshold for the omnibus test; pairwise decisions use
    /// this divided by the number of pairs.
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Chart rendering settings
    #[serde(default)]
    pub charts: ChartConfig,
}

/// Chart geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Output image width in pixels
    #[serde(default = "default_chart_width")]
    pub width: u32,

    /// Output image height in pixels
    #[serde(default = "default_chart_height")]
    pub height: u32,
}

fn default_alpha() -> f64 {
    0.05
}
fn default_chart_width() -> u32 {
    900
}
fn default_chart_height() -> u32 {
    600
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            charts: ChartConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: default_chart_width(),
            height: default_chart_height(),
        }
    }
}

impl AnalysisConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis config: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse analysis config: {:?}", path))?;
        Ok(config)
    }

    /// Load from the given path if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        Ok(Self::default())
    }

    /// Save config to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.charts.width, 900);
        assert_eq!(config.charts.height, 600);
    }

    #[test]
    fn test_partial_toml() {
        let toml_str = r#"
alpha = 0.01
"#;
        let config: AnalysisConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.charts.width, 900);
    }

    #[test]
    fn test_full_toml() {
        let toml_str = r#"
alpha = 0.1

[charts]
width = 1200
height = 800
"#;
        let config: AnalysisConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.alpha, 0.1);
        assert_eq!(config.charts.width, 1200);
        assert_eq!(config.charts.height, 800);
    }

    #[test]
    fn test_roundtrip() {
        let config = AnalysisConfig {
            alpha: 0.025,
            charts: ChartConfig {
                width: 640,
                height: 480,
            },
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let back: AnalysisConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.alpha, 0.025);
        assert_eq!(back.charts.width, 640);
    }
}
