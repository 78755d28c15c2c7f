// Project parameters
// A named set of generation settings, updated only through an allow-listed record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::engine::GenerationRequest;
use crate::error::{GenerationError, GenerationResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub user: String,
    pub genre: String,
    pub scenario: String,
    pub tempo: u32,
    pub complexity: u32,
    pub variations: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a caller may change on a project
///
/// Unknown fields are rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub tempo: Option<u32>,
    #[serde(default)]
    pub complexity: Option<u32>,
    #[serde(default)]
    pub variations: Option<u32>,
}

impl ProjectUpdate {
    /// Parse an update from a JSON request body
    pub fn from_json(json: &str) -> GenerationResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| GenerationError::InvalidParameter(format!("project update: {}", e)))
    }

    pub fn is_empty(&self) -> bool {
        *self == ProjectUpdate::default()
    }
}

impl Project {
    /// New project seeded with the configured defaults
    pub fn new(name: impl Into<String>, user: impl Into<String>, config: &GeneratorConfig) -> Self {
        let now = Utc::now();
        Project {
            name: name.into(),
            user: user.into(),
            genre: config.default_genre.clone(),
            scenario: config.default_scenario.clone(),
            tempo: config.default_tempo,
            complexity: 1,
            variations: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update; nothing changes if any field is invalid
    pub fn apply(&mut self, update: ProjectUpdate) -> GenerationResult<()> {
        for (field, value) in [
            ("tempo", update.tempo),
            ("complexity", update.complexity),
            ("variations", update.variations),
        ] {
            if value == Some(0) {
                return Err(GenerationError::InvalidParameter(format!(
                    "{} must be greater than 0",
                    field
                )));
            }
        }
        for (field, value) in [("genre", &update.genre), ("scenario", &update.scenario)] {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(GenerationError::InvalidParameter(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        if update.is_empty() {
            return Ok(());
        }

        if let Some(genre) = update.genre {
            self.genre = genre;
        }
        if let Some(scenario) = update.scenario {
            self.scenario = scenario;
        }
        if let Some(tempo) = update.tempo {
            self.tempo = tempo;
        }
        if let Some(complexity) = update.complexity {
            self.complexity = complexity;
        }
        if let Some(variations) = update.variations {
            self.variations = variations;
        }
        self.updated_at = Utc::now();

        log::debug!("Updated project '{}'", self.name);
        Ok(())
    }

    /// Generation request for the current settings
    pub fn request(&self) -> GenerationRequest {
        GenerationRequest::new(
            self.genre.clone(),
            self.scenario.clone(),
            self.variations,
            self.complexity,
            self.tempo,
        )
    }

    /// File name for an export taken at `at`, e.g. "demo_20240101_120000.mid"
    pub fn export_file_name(&self, at: DateTime<Utc>) -> String {
        format!("{}_{}.mid", self.name, at.format("%Y%m%d_%H%M%S"))
    }
}
