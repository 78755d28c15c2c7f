// Pattern source abstraction
// Supports multiple section generators: Template (rule-based) and Learned (future)

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::catalog::GenreTemplate;
use crate::config::GeneratorConfig;
use crate::error::{GenerationError, GenerationResult};
use crate::groove::BeatClock;

use super::bass::build_bass_track;
use super::drums::{build_drum_tracks, DrumSettings};
use super::harmony::build_harmony_track;
use super::melody::build_melody_track;
use super::note::Track;

/// Pattern backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternBackend {
    /// Genre templates rendered by the rule-based track builders
    Template,

    /// Learned sequence model (no trained weights exist yet)
    Learned,
}

impl PatternBackend {
    /// Convert from string representation
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "template" => Some(PatternBackend::Template),
            "learned" => Some(PatternBackend::Learned),
            _ => None,
        }
    }
}

/// Everything a source needs to render one section
#[derive(Debug, Clone, Copy)]
pub struct SectionRequest<'a> {
    pub genre: &'a GenreTemplate,
    pub clock: BeatClock,
    pub complexity: u32,

    /// Section name from the scenario (e.g. "intro")
    pub section: &'a str,

    /// Position of the section within the scenario
    pub index: usize,
}

/// Something that can turn a genre into one section's worth of tracks
pub trait PatternSource: Send + Sync {
    fn backend(&self) -> PatternBackend;

    /// Render the tracks of a single section, starting at 0s
    fn build_section(
        &self,
        request: &SectionRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> GenerationResult<Vec<Track>>;
}

/// Rule-based source running the drum, bass, harmony and melody builders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplatePatternSource {
    drums: DrumSettings,
    melody_complexity_threshold: u32,
}

impl TemplatePatternSource {
    pub fn new(config: &GeneratorConfig) -> Self {
        TemplatePatternSource {
            drums: DrumSettings {
                gate_seconds: config.drum_gate_seconds,
                fill_complexity_threshold: config.fill_complexity_threshold,
            },
            melody_complexity_threshold: config.melody_complexity_threshold,
        }
    }
}

impl PatternSource for TemplatePatternSource {
    fn backend(&self) -> PatternBackend {
        PatternBackend::Template
    }

    fn build_section(
        &self,
        request: &SectionRequest<'_>,
        rng: &mut dyn RngCore,
    ) -> GenerationResult<Vec<Track>> {
        let genre = request.genre;
        let clock = &request.clock;

        let mut tracks = build_drum_tracks(genre, clock, request.complexity, &self.drums, rng)?;
        tracks.push(build_bass_track(genre, clock)?);
        tracks.push(build_harmony_track(genre, clock)?);

        if request.complexity > self.melody_complexity_threshold {
            tracks.push(build_melody_track(genre, clock, rng)?);
        }

        Ok(tracks)
    }
}

/// Create the pattern source for a backend
pub fn pattern_source(
    backend: PatternBackend,
    config: &GeneratorConfig,
) -> GenerationResult<Box<dyn PatternSource>> {
    match backend {
        PatternBackend::Template => Ok(Box::new(TemplatePatternSource::new(config))),
        PatternBackend::Learned => Err(GenerationError::BackendUnavailable(backend)),
    }
}
