// Catalog Type Definitions
// Genres are rhythm grids plus harmonic material, scenarios are section plans

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::arranger::note::TrackRole;
use crate::groove::BeatClock;

use super::pitch::pitch_from_name;

fn default_pattern_steps() -> u32 {
    16
}

/// A single drum hit on the step grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrumHit {
    /// Step index within the pattern (0-indexed)
    pub step: u32,

    /// Gate length in beats; the builder caps it at the configured drum gate
    pub gate: f64,
}

impl DrumHit {
    pub const fn new(step: u32, gate: f64) -> Self {
        DrumHit { step, gate }
    }
}

/// Bass line: a step rhythm and a cyclic list of pitch names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BassPattern {
    /// One flag per step, true where a bass note starts
    pub rhythm: Vec<bool>,

    /// Pitch names cycled over the active steps (indexed by step)
    pub notes: Vec<String>,
}

impl BassPattern {
    /// True if any step in the rhythm triggers a note
    pub fn has_active_steps(&self) -> bool {
        self.rhythm.iter().any(|&active| active)
    }
}

/// A chord is an ordered set of pitch names, voiced exactly as written
pub type Chord = Vec<String>;

/// Complete genre definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreTemplate {
    pub name: String,

    /// Length of the drum and bass grids in steps
    #[serde(default = "default_pattern_steps")]
    pub pattern_steps: u32,

    /// Drum hits per drum role
    #[serde(default)]
    pub drum_patterns: BTreeMap<TrackRole, Vec<DrumHit>>,

    #[serde(default)]
    pub bass_pattern: BassPattern,

    /// One chord per bar
    #[serde(default)]
    pub chord_progression: Vec<Chord>,

    /// Suggested BPM range (inclusive)
    pub bpm_range: (u32, u32),
}

impl GenreTemplate {
    /// Number of bars one pass of this genre's material occupies
    pub fn length_bars(&self, clock: &BeatClock) -> u32 {
        let grid_steps = self
            .drum_patterns
            .values()
            .flatten()
            .map(|hit| hit.step + 1)
            .chain(std::iter::once(self.bass_pattern.rhythm.len() as u32))
            .chain(std::iter::once(self.pattern_steps))
            .max()
            .unwrap_or(0);

        clock
            .bars_for_steps(grid_steps)
            .max(self.chord_progression.len() as u32)
            .max(1)
    }

    /// Check that the template is well-formed
    ///
    /// An empty bass note cycle is deliberately not rejected here; the bass
    /// builder reports it when the genre is generated.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Genre name must not be empty".to_string());
        }

        let (min_bpm, max_bpm) = self.bpm_range;
        if min_bpm == 0 || min_bpm > max_bpm {
            return Err(format!(
                "Genre '{}' has an invalid BPM range ({}, {})",
                self.name, min_bpm, max_bpm
            ));
        }

        for (role, hits) in &self.drum_patterns {
            if !role.is_drum() {
                return Err(format!(
                    "Genre '{}' lists non-drum role '{}' in its drum patterns",
                    self.name,
                    role.as_str()
                ));
            }
            if let Some(hit) = hits.iter().find(|hit| !hit.gate.is_finite()) {
                return Err(format!(
                    "Genre '{}' has a non-finite gate at step {}",
                    self.name, hit.step
                ));
            }
        }

        let names = self
            .bass_pattern
            .notes
            .iter()
            .chain(self.chord_progression.iter().flatten());
        for name in names {
            pitch_from_name(name).map_err(|e| format!("Genre '{}': {}", self.name, e))?;
        }

        Ok(())
    }
}

/// Named arrangement plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioTemplate {
    pub name: String,

    /// Section names in playing order
    pub sections: Vec<String>,

    /// Whether section boundaries get transition hits
    #[serde(default)]
    pub has_transitions: bool,

    /// Descriptive only: requested variations are always rendered
    #[serde(default)]
    pub has_variations: bool,
}

impl ScenarioTemplate {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Scenario name must not be empty".to_string());
        }
        if self.sections.is_empty() {
            return Err(format!("Scenario '{}' has no sections", self.name));
        }
        Ok(())
    }
}

/// Genre summary for UI range sliders and validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreSummary {
    pub name: String,
    pub bpm_range: (u32, u32),
    pub drum_roles: Vec<TrackRole>,
    pub bars: usize,
}

impl GenreTemplate {
    /// Get a summary of this genre for display
    pub fn summary(&self) -> GenreSummary {
        GenreSummary {
            name: self.name.clone(),
            bpm_range: self.bpm_range,
            drum_roles: self.drum_patterns.keys().copied().collect(),
            bars: self.chord_progression.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_genre() -> GenreTemplate {
        GenreTemplate {
            name: "minimal".to_string(),
            pattern_steps: 16,
            drum_patterns: BTreeMap::from([(TrackRole::Kick, vec![DrumHit::new(0, 1.0)])]),
            bass_pattern: BassPattern {
                rhythm: vec![true, false],
                notes: vec!["C2".to_string()],
            },
            chord_progression: vec![vec!["C3".to_string(), "E3".to_string()]],
            bpm_range: (100, 120),
        }
    }

    #[test]
    fn test_validate_minimal() {
        assert!(minimal_genre().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_melodic_drum_role() {
        let mut genre = minimal_genre();
        genre.drum_patterns.insert(TrackRole::Bass, vec![DrumHit::new(0, 1.0)]);
        assert!(genre.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_bpm_range() {
        let mut genre = minimal_genre();
        genre.bpm_range = (130, 120);
        assert!(genre.validate().is_err());

        genre.bpm_range = (0, 120);
        assert!(genre.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_pitch_name() {
        let mut genre = minimal_genre();
        genre.chord_progression.push(vec!["H3".to_string()]);
        assert!(genre.validate().is_err());
    }

    #[test]
    fn test_validate_allows_empty_bass_cycle() {
        let mut genre = minimal_genre();
        genre.bass_pattern.notes.clear();
        assert!(genre.validate().is_ok());
    }

    #[test]
    fn test_length_bars() {
        let clock = BeatClock::new(120, 2.0).unwrap();
        let mut genre = minimal_genre();

        // 16 steps on an eighth grid = 2 bars, one chord = 1 bar
        assert_eq!(genre.length_bars(&clock), 2);

        genre.chord_progression = vec![vec!["C3".to_string()]; 4];
        assert_eq!(genre.length_bars(&clock), 4);
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{ "name": "sparse", "bpm_range": [90, 100] }"#;
        let genre: GenreTemplate = serde_json::from_str(json).unwrap();
        assert_eq!(genre.pattern_steps, 16);
        assert!(genre.drum_patterns.is_empty());
        assert!(genre.chord_progression.is_empty());
    }

    #[test]
    fn test_scenario_validate() {
        let scenario = ScenarioTemplate {
            name: "empty".to_string(),
            sections: vec![],
            has_transitions: false,
            has_variations: false,
        };
        assert!(scenario.validate().is_err());
    }
}
