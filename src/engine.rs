// Pattern Engine - Public generation facade
// Validates requests, resolves catalog keys and drives the composer

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::arranger::composer::{CompositionPlan, PatternComposer};
use crate::arranger::midi::{export_midi, tempo_micros, write_midi};
use crate::arranger::note::Arrangement;
use crate::arranger::source::{pattern_source, PatternBackend, PatternSource, TemplatePatternSource};
use crate::catalog::GenreCatalog;
use crate::config::GeneratorConfig;
use crate::error::{GenerationError, GenerationResult};
use crate::groove::BeatClock;

/// Parameters of one generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub genre: String,

    /// Scenario key; `None` uses the configured default scenario
    #[serde(default)]
    pub scenario: Option<String>,

    /// Number of passes (1 = base pass only)
    pub variation_count: u32,

    pub complexity: u32,

    pub tempo_bpm: u32,
}

impl GenerationRequest {
    pub fn new(
        genre: impl Into<String>,
        scenario: impl Into<String>,
        variation_count: u32,
        complexity: u32,
        tempo_bpm: u32,
    ) -> Self {
        GenerationRequest {
            genre: genre.into(),
            scenario: Some(scenario.into()),
            variation_count,
            complexity,
            tempo_bpm,
        }
    }

    /// Reject numeric parameters outside their domains
    pub fn validate(&self) -> GenerationResult<()> {
        if self.tempo_bpm == 0 {
            return Err(GenerationError::InvalidParameter(
                "tempo_bpm must be greater than 0".to_string(),
            ));
        }
        if tempo_micros(self.tempo_bpm).is_none() {
            return Err(GenerationError::InvalidParameter(format!(
                "tempo_bpm {} cannot be written as a MIDI tempo (4 to 60000000)",
                self.tempo_bpm
            )));
        }
        if self.variation_count < 1 {
            return Err(GenerationError::InvalidParameter(
                "variation_count must be at least 1".to_string(),
            ));
        }
        if self.complexity < 1 {
            return Err(GenerationError::InvalidParameter(
                "complexity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Generation engine
///
/// Holds immutable configuration and a shared catalog. Every call owns its
/// arrangement and random source, so one engine can serve many threads.
pub struct PatternEngine {
    config: GeneratorConfig,
    catalog: Arc<GenreCatalog>,
    source: Arc<dyn PatternSource>,
}

impl PatternEngine {
    /// Engine using the rule-based template source
    pub fn new(config: GeneratorConfig, catalog: Arc<GenreCatalog>) -> GenerationResult<Self> {
        config.validate()?;
        let source = Arc::new(TemplatePatternSource::new(&config));
        Ok(PatternEngine {
            config,
            catalog,
            source,
        })
    }

    /// Engine using the source for `backend`
    pub fn with_backend(
        config: GeneratorConfig,
        catalog: Arc<GenreCatalog>,
        backend: PatternBackend,
    ) -> GenerationResult<Self> {
        config.validate()?;
        let source: Arc<dyn PatternSource> = pattern_source(backend, &config)?.into();
        Ok(PatternEngine {
            config,
            catalog,
            source,
        })
    }

    /// Engine using a caller-supplied source
    pub fn with_source(
        config: GeneratorConfig,
        catalog: Arc<GenreCatalog>,
        source: Arc<dyn PatternSource>,
    ) -> GenerationResult<Self> {
        config.validate()?;
        Ok(PatternEngine {
            config,
            catalog,
            source,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &GenreCatalog {
        &self.catalog
    }

    pub fn backend(&self) -> PatternBackend {
        self.source.backend()
    }

    /// Generate with a fresh random seed
    pub fn generate(&self, request: &GenerationRequest) -> GenerationResult<Arrangement> {
        self.generate_seeded(request, rand::random::<u64>())
    }

    /// Generate reproducibly from `seed`
    pub fn generate_seeded(
        &self,
        request: &GenerationRequest,
        seed: u64,
    ) -> GenerationResult<Arrangement> {
        log::debug!("Generating with seed {}", seed);
        let mut rng = Pcg32::seed_from_u64(seed);
        self.generate_with_rng(request, &mut rng)
    }

    /// Generate drawing every random choice from `rng`
    pub fn generate_with_rng(
        &self,
        request: &GenerationRequest,
        rng: &mut dyn RngCore,
    ) -> GenerationResult<Arrangement> {
        request.validate()?;

        let genre = self.catalog.genre(&request.genre)?;
        let scenario_name = request
            .scenario
            .as_deref()
            .unwrap_or(&self.config.default_scenario);
        let scenario = self.catalog.scenario(scenario_name)?;

        let (min_bpm, max_bpm) = genre.bpm_range;
        if request.tempo_bpm < min_bpm || request.tempo_bpm > max_bpm {
            log::warn!(
                "Tempo {} BPM is outside the {} range ({}-{})",
                request.tempo_bpm,
                genre.name,
                min_bpm,
                max_bpm
            );
        }

        let clock = BeatClock::new(request.tempo_bpm, self.config.steps_per_beat)?;
        let plan = CompositionPlan {
            genre,
            scenario,
            clock,
            complexity: request.complexity,
            variation_count: request.variation_count,
            layout: self.config.section_layout,
            transition_gate: self.config.drum_gate_seconds,
        };

        let arrangement = PatternComposer::compose(plan, self.source.as_ref(), rng)?;

        log::info!(
            "Generated {}/{} at {} BPM: {} tracks, {} notes, {:.2}s",
            arrangement.genre(),
            arrangement.scenario(),
            arrangement.tempo_bpm(),
            arrangement.tracks().len(),
            arrangement.note_count(),
            arrangement.duration_seconds()
        );

        Ok(arrangement)
    }

    /// Serialize an arrangement to Standard MIDI File bytes
    pub fn export(&self, arrangement: &Arrangement) -> GenerationResult<Vec<u8>> {
        Ok(export_midi(arrangement, &self.config.export)?)
    }

    /// Serialize an arrangement and write it to `path`
    pub fn export_to_path(&self, arrangement: &Arrangement, path: &Path) -> GenerationResult<()> {
        Ok(write_midi(arrangement, &self.config.export, path)?)
    }

    pub fn list_genres(&self) -> BTreeSet<String> {
        self.catalog.list_genres()
    }

    pub fn list_scenarios(&self) -> BTreeSet<String> {
        self.catalog.list_scenarios()
    }

    pub fn bpm_range(&self, genre: &str) -> GenerationResult<(u32, u32)> {
        self.catalog.bpm_range(genre)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arranger::midi::read_midi;
    use crate::arranger::note::TrackRole;
    use crate::catalog::{genres, scenarios};
    use crate::config::SectionLayout;

    fn engine() -> PatternEngine {
        PatternEngine::new(GeneratorConfig::default(), Arc::new(GenreCatalog::builtin())).unwrap()
    }

    fn request(genre: &str, scenario: &str, variations: u32, complexity: u32, tempo: u32) -> GenerationRequest {
        GenerationRequest::new(genre, scenario, variations, complexity, tempo)
    }

    #[test]
    fn test_all_notes_valid() {
        let engine = engine();
        for genre in engine.list_genres() {
            for scenario in engine.list_scenarios() {
                for complexity in 1..=3 {
                    for tempo in [60, 120, 175] {
                        let arrangement = engine
                            .generate_seeded(&request(&genre, &scenario, 2, complexity, tempo), 9)
                            .unwrap();
                        assert!(arrangement.note_count() > 0);
                        for (_, note) in arrangement.notes() {
                            assert!(note.pitch() <= 127);
                            assert!(note.velocity() <= 127);
                            assert!(note.start() >= 0.0 && note.start() < note.end());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_seeded_export_is_byte_identical() {
        let engine = engine();
        let req = request("dubstep", "live_performance", 3, 3, 145);

        let a = engine.export(&engine.generate_seeded(&req, 1234).unwrap()).unwrap();
        let b = engine.export(&engine.generate_seeded(&req, 1234).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_house_kick_starts() {
        let arrangement = engine()
            .generate(&request("house", "loop_based", 1, 1, 120))
            .unwrap();

        let kick = arrangement.track(TrackRole::Kick).unwrap();
        let starts: Vec<f64> = kick.notes.iter().take(2).map(|n| n.start()).collect();
        assert_eq!(starts, vec![0.0, 1.0]);
    }

    #[test]
    fn test_unknown_genre() {
        let result = engine().generate(&request("dnb", "loop_based", 1, 1, 120));
        assert!(matches!(result, Err(GenerationError::UnknownGenre(g)) if g == "dnb"));
    }

    #[test]
    fn test_unknown_scenario_not_defaulted() {
        let result = engine().generate(&request("house", "loop_base", 1, 1, 120));
        assert!(matches!(result, Err(GenerationError::UnknownScenario(_))));
    }

    #[test]
    fn test_omitted_scenario_uses_config_default() {
        let mut req = request("house", "loop_based", 1, 1, 120);
        req.scenario = None;
        let arrangement = engine().generate_seeded(&req, 0).unwrap();
        assert_eq!(arrangement.scenario(), "loop_based");
    }

    #[test]
    fn test_invalid_parameters() {
        let engine = engine();
        for req in [
            request("house", "loop_based", 1, 1, 0),
            request("house", "loop_based", 0, 1, 120),
            request("house", "loop_based", 1, 0, 120),
            // Too slow for the 24-bit tempo event
            request("house", "loop_based", 1, 1, 2),
            request("house", "loop_based", 1, 1, 3),
            // Parameters are checked before catalog keys
            request("dnb", "loop_based", 1, 1, 0),
        ] {
            assert!(matches!(
                engine.generate(&req),
                Err(GenerationError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_slowest_storable_tempo_round_trips() {
        let engine = engine();
        let arrangement = engine
            .generate_seeded(&request("house", "loop_based", 1, 1, 4), 21)
            .unwrap();
        let decoded = read_midi(&engine.export(&arrangement).unwrap()).unwrap();

        // One beat lasts 15s, so step 4 (two beats) lands at 30s.
        // Overlaid sections repeat each start, so collapse duplicates.
        let mut kicks: Vec<f64> = decoded
            .iter()
            .filter(|n| n.role == Some(TrackRole::Kick))
            .map(|n| n.start)
            .collect();
        kicks.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        assert!(kicks.len() >= 2);
        assert!(kicks[0].abs() < 1e-9);
        assert!((kicks[1] - 30.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let catalog = Arc::new(GenreCatalog::builtin());
        let config = GeneratorConfig {
            drum_gate_seconds: 0.0,
            ..GeneratorConfig::default()
        };

        assert!(matches!(
            PatternEngine::new(config.clone(), catalog.clone()),
            Err(GenerationError::Config(_))
        ));
        assert!(matches!(
            PatternEngine::with_backend(config.clone(), catalog.clone(), PatternBackend::Template),
            Err(GenerationError::Config(_))
        ));
        let source = Arc::new(TemplatePatternSource::new(&config));
        assert!(matches!(
            PatternEngine::with_source(config, catalog, source),
            Err(GenerationError::Config(_))
        ));
    }

    #[test]
    fn test_empty_bass_cycle() {
        let mut broken = genres::house();
        broken.name = "broken".to_string();
        broken.bass_pattern.notes.clear();

        let catalog = GenreCatalog::new(vec![broken], scenarios::builtin_scenarios()).unwrap();
        let engine = PatternEngine::new(GeneratorConfig::default(), Arc::new(catalog)).unwrap();

        let result = engine.generate(&request("broken", "loop_based", 1, 1, 120));
        assert!(matches!(result, Err(GenerationError::EmptyCycle { genre }) if genre == "broken"));
    }

    #[test]
    fn test_variation_accumulation() {
        let engine = engine();
        for genre in ["house", "techno", "reggae"] {
            let combined = engine
                .generate_seeded(&request(genre, "loop_based", 3, 1, 120), 5)
                .unwrap();

            let singles: usize = (1..=3)
                .map(|complexity| {
                    engine
                        .generate_seeded(&request(genre, "loop_based", 1, complexity, 120), 6)
                        .unwrap()
                        .note_count()
                })
                .sum();

            assert_eq!(combined.note_count(), singles);
        }
    }

    #[test]
    fn test_round_trip() {
        let engine = engine();
        let arrangement = engine
            .generate_seeded(&request("hiphop", "loop_based", 2, 3, 92), 77)
            .unwrap();
        let decoded = read_midi(&engine.export(&arrangement).unwrap()).unwrap();

        // 480 PPQ at 92 BPM
        let ticks_per_second = 480.0 * 92.0 / 60.0;
        let tick = |seconds: f64| (seconds * ticks_per_second).round() as u32;

        let mut expected: Vec<_> = arrangement
            .tracks()
            .iter()
            .flat_map(|t| {
                t.notes.iter().map(move |n| {
                    (Some(t.role), t.variation, tick(n.start()), n.pitch(), n.velocity(), tick(n.end()))
                })
            })
            .collect();
        let mut actual: Vec<_> = decoded
            .iter()
            .map(|n| (n.role, n.variation, tick(n.start), n.pitch, n.velocity, tick(n.end)))
            .collect();
        expected.sort();
        actual.sort();

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_parallel_generation() {
        let engine = engine();
        let req = request("techno", "full_song", 2, 2, 130);
        let reference = engine.export(&engine.generate_seeded(&req, 42).unwrap()).unwrap();

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| engine.export(&engine.generate_seeded(&req, 42).unwrap()).unwrap()))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), reference);
            }
        });
    }

    #[test]
    fn test_sequential_layout_with_transitions() {
        let config = GeneratorConfig {
            section_layout: SectionLayout::Sequential,
            ..GeneratorConfig::default()
        };
        let engine = PatternEngine::new(config, Arc::new(GenreCatalog::builtin())).unwrap();
        let arrangement = engine
            .generate_seeded(&request("house", "full_song", 1, 1, 120), 3)
            .unwrap();

        let crash = arrangement.track(TrackRole::Crash).unwrap();
        assert_eq!(crash.notes.len(), 4);
        assert!((arrangement.duration_seconds() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_learned_backend_unavailable() {
        let result = PatternEngine::with_backend(
            GeneratorConfig::default(),
            Arc::new(GenreCatalog::builtin()),
            PatternBackend::Learned,
        );
        assert!(matches!(result, Err(GenerationError::BackendUnavailable(_))));
    }

    #[test]
    fn test_export_to_path() {
        let engine = engine();
        let arrangement = engine
            .generate_seeded(&request("reggae", "loop_based", 1, 1, 80), 8)
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reggae.mid");
        engine.export_to_path(&arrangement, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 14);

        let bad = dir.path().join("nope").join("reggae.mid");
        assert!(matches!(
            engine.export_to_path(&arrangement, &bad),
            Err(GenerationError::Export(_))
        ));
    }

    #[test]
    fn test_catalog_queries() {
        let engine = engine();
        assert!(engine.list_genres().contains("hiphop"));
        assert!(engine.list_scenarios().contains("full_song"));
        assert_eq!(engine.bpm_range("reggae").unwrap(), (70, 90));
        assert_eq!(engine.backend(), PatternBackend::Template);
    }
}
