// Catalog Module
// Genre and scenario templates shared read-only by every generation call

pub mod genres;
pub mod pitch;
pub mod scenarios;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{GenerationError, GenerationResult};

// Re-export main types
pub use pitch::{chromatic_index, pitch_from_name};
pub use types::{BassPattern, Chord, DrumHit, GenreSummary, GenreTemplate, ScenarioTemplate};

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid catalog: {0}")]
    Invalid(String),
}

/// On-disk catalog layout
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    genres: Vec<GenreTemplate>,
    scenarios: Vec<ScenarioTemplate>,
}

/// Immutable lookup of genre and scenario templates
#[derive(Debug, Clone)]
pub struct GenreCatalog {
    genres: BTreeMap<String, GenreTemplate>,
    scenarios: BTreeMap<String, ScenarioTemplate>,
}

impl GenreCatalog {
    /// Build a catalog, validating every template
    pub fn new(
        genres: Vec<GenreTemplate>,
        scenarios: Vec<ScenarioTemplate>,
    ) -> Result<Self, CatalogError> {
        let mut genre_map = BTreeMap::new();
        for genre in genres {
            genre.validate().map_err(CatalogError::Invalid)?;
            if genre_map.contains_key(&genre.name) {
                return Err(CatalogError::Invalid(format!(
                    "Duplicate genre '{}'",
                    genre.name
                )));
            }
            genre_map.insert(genre.name.clone(), genre);
        }

        let mut scenario_map = BTreeMap::new();
        for scenario in scenarios {
            scenario.validate().map_err(CatalogError::Invalid)?;
            if scenario_map.contains_key(&scenario.name) {
                return Err(CatalogError::Invalid(format!(
                    "Duplicate scenario '{}'",
                    scenario.name
                )));
            }
            scenario_map.insert(scenario.name.clone(), scenario);
        }

        Ok(GenreCatalog {
            genres: genre_map,
            scenarios: scenario_map,
        })
    }

    /// Catalog with the built-in genres and scenarios
    pub fn builtin() -> Self {
        let mut genres = BTreeMap::new();
        for genre in genres::builtin_genres() {
            genres.insert(genre.name.clone(), genre);
        }

        let mut scenarios = BTreeMap::new();
        for scenario in scenarios::builtin_scenarios() {
            scenarios.insert(scenario.name.clone(), scenario);
        }

        GenreCatalog { genres, scenarios }
    }

    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.genres, file.scenarios)
    }

    /// Load a catalog from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        log::info!(
            "Loaded catalog from {}: {} genres, {} scenarios",
            path.display(),
            catalog.genres.len(),
            catalog.scenarios.len()
        );
        Ok(catalog)
    }

    /// Serialize the catalog to pretty JSON
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let file = CatalogFile {
            genres: self.genres.values().cloned().collect(),
            scenarios: self.scenarios.values().cloned().collect(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    /// Look up a genre by key
    pub fn genre(&self, name: &str) -> GenerationResult<&GenreTemplate> {
        self.genres
            .get(name)
            .ok_or_else(|| GenerationError::UnknownGenre(name.to_string()))
    }

    /// Look up a scenario by key
    pub fn scenario(&self, name: &str) -> GenerationResult<&ScenarioTemplate> {
        self.scenarios
            .get(name)
            .ok_or_else(|| GenerationError::UnknownScenario(name.to_string()))
    }

    /// All genre keys
    pub fn list_genres(&self) -> BTreeSet<String> {
        self.genres.keys().cloned().collect()
    }

    /// All scenario keys
    pub fn list_scenarios(&self) -> BTreeSet<String> {
        self.scenarios.keys().cloned().collect()
    }

    /// Suggested BPM range of a genre
    pub fn bpm_range(&self, genre: &str) -> GenerationResult<(u32, u32)> {
        Ok(self.genre(genre)?.bpm_range)
    }

    /// Summaries of every genre
    pub fn summaries(&self) -> Vec<GenreSummary> {
        self.genres.values().map(GenreTemplate::summary).collect()
    }
}

impl Default for GenreCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
