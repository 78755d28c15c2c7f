// Generator configuration
// Explicit, immutable settings handed to the engine at construction

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arranger::midi::MidiExportOptions;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How a scenario's sections are placed in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SectionLayout {
    /// Every section starts at 0s and layers over the previous ones
    #[default]
    Overlay,

    /// Each section starts where the previous one ends
    Sequential,
}

/// Generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Grid resolution (2.0 = eighth-note steps)
    pub steps_per_beat: f64,

    /// Longest sounding length of a drum hit in seconds
    pub drum_gate_seconds: f64,

    /// Tom fills are added when complexity exceeds this
    pub fill_complexity_threshold: u32,

    /// Melody is added when complexity exceeds this
    pub melody_complexity_threshold: u32,

    pub section_layout: SectionLayout,

    /// Scenario used when a request omits one
    pub default_scenario: String,

    /// Genre given to new projects
    pub default_genre: String,

    /// Tempo given to new projects
    pub default_tempo: u32,

    pub export: MidiExportOptions,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            steps_per_beat: 2.0,
            drum_gate_seconds: 0.2,
            fill_complexity_threshold: 2,
            melody_complexity_threshold: 1,
            section_layout: SectionLayout::Overlay,
            default_scenario: "loop_based".to_string(),
            default_genre: "reggae".to_string(),
            default_tempo: 120,
            export: MidiExportOptions::default(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded generator config from {}", path.display());
        Ok(config)
    }

    /// Check that the settings describe a usable grid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.steps_per_beat.is_finite() || self.steps_per_beat <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "steps_per_beat must be positive, got {}",
                self.steps_per_beat
            )));
        }
        if !self.drum_gate_seconds.is_finite() || self.drum_gate_seconds <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "drum_gate_seconds must be positive, got {}",
                self.drum_gate_seconds
            )));
        }
        if self.default_tempo == 0 {
            return Err(ConfigError::Invalid("default_tempo must be positive".to_string()));
        }
        if self.default_scenario.is_empty() {
            return Err(ConfigError::Invalid("default_scenario must be set".to_string()));
        }
        if self.export.ppq == 0 || self.export.ppq > 0x7FFF {
            return Err(ConfigError::Invalid(format!(
                "ppq must be between 1 and 32767, got {}",
                self.export.ppq
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.steps_per_beat, 2.0);
        assert_eq!(config.drum_gate_seconds, 0.2);
        assert_eq!(config.fill_complexity_threshold, 2);
        assert_eq!(config.section_layout, SectionLayout::Overlay);
        assert_eq!(config.default_scenario, "loop_based");
        assert_eq!(config.export.ppq, 480);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            GeneratorConfig::from_json(r#"{ "section_layout": "sequential", "steps_per_beat": 4.0 }"#)
                .unwrap();
        assert_eq!(config.section_layout, SectionLayout::Sequential);
        assert_eq!(config.steps_per_beat, 4.0);
        assert_eq!(config.default_tempo, 120);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "steps_per_beat": 0.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "drum_gate_seconds": -1.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "default_tempo": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "default_scenario": "full_song" }"#).unwrap();

        let config = GeneratorConfig::from_path(file.path()).unwrap();
        assert_eq!(config.default_scenario, "full_song");
    }

    #[test]
    fn test_layout_value_names() {
        assert_eq!(
            SectionLayout::from_str("sequential", false),
            Ok(SectionLayout::Sequential)
        );
        assert_eq!(SectionLayout::from_str("Overlay", true), Ok(SectionLayout::Overlay));
        assert!(SectionLayout::from_str("stacked", true).is_err());
    }
}
