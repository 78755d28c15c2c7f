// Pattern Composer - Scenario sections, variations and transitions
// Drives a pattern source through a scenario and merges the result per role

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::catalog::{GenreTemplate, ScenarioTemplate};
use crate::config::SectionLayout;
use crate::error::{GenerationError, GenerationResult};
use crate::groove::BeatClock;

use super::note::{Arrangement, Note, Track, TrackRole, MIDI_CRASH};
use super::source::{PatternSource, SectionRequest};

/// Velocity of transition crash hits
pub const TRANSITION_VELOCITY: i32 = 100;

/// Composition stages, in the order they must run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerState {
    Empty,
    SectionsBuilt,
    VariationsApplied,
    TransitionsApplied,
    Final,
}

/// Validated inputs for one composition
#[derive(Debug, Clone, Copy)]
pub struct CompositionPlan<'a> {
    pub genre: &'a GenreTemplate,
    pub scenario: &'a ScenarioTemplate,
    pub clock: BeatClock,

    /// Complexity of the base pass
    pub complexity: u32,

    /// Total passes: the base pass plus `variation_count - 1` variations
    pub variation_count: u32,

    pub layout: SectionLayout,

    /// Sounding length of transition hits in seconds
    pub transition_gate: f64,
}

impl CompositionPlan<'_> {
    /// Start time of a section in seconds
    pub fn section_offset(&self, index: usize) -> f64 {
        match self.layout {
            SectionLayout::Overlay => 0.0,
            SectionLayout::Sequential => {
                let bars = self.genre.length_bars(&self.clock) * index as u32;
                self.clock.bar_start(bars)
            }
        }
    }
}

/// Builds an arrangement stage by stage
pub struct PatternComposer<'a> {
    plan: CompositionPlan<'a>,
    source: &'a dyn PatternSource,
    arrangement: Arrangement,
    state: ComposerState,
}

impl<'a> PatternComposer<'a> {
    pub fn new(plan: CompositionPlan<'a>, source: &'a dyn PatternSource) -> Self {
        let arrangement = Arrangement::new(
            plan.genre.name.clone(),
            plan.scenario.name.clone(),
            plan.clock.bpm(),
        );

        PatternComposer {
            plan,
            source,
            arrangement,
            state: ComposerState::Empty,
        }
    }

    /// Run every stage and return the finished arrangement
    pub fn compose(
        plan: CompositionPlan<'a>,
        source: &'a dyn PatternSource,
        rng: &mut dyn RngCore,
    ) -> GenerationResult<Arrangement> {
        let mut composer = PatternComposer::new(plan, source);
        composer.build_sections(rng)?;
        composer.apply_variations(rng)?;
        composer.apply_transitions()?;
        composer.finish()
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Arrangement built so far
    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    /// Render every section at the base complexity and merge by role
    pub fn build_sections(&mut self, rng: &mut dyn RngCore) -> GenerationResult<()> {
        self.require_state(ComposerState::Empty)?;

        for track in self.render_pass(self.plan.complexity, rng)? {
            self.arrangement.merge_track(track);
        }

        self.advance(ComposerState::SectionsBuilt);
        Ok(())
    }

    /// Append one full pass per extra variation at complexity 2, 3, ...
    pub fn apply_variations(&mut self, rng: &mut dyn RngCore) -> GenerationResult<()> {
        self.require_state(ComposerState::SectionsBuilt)?;

        for variation in 2..=self.plan.variation_count {
            for mut track in self.render_pass(variation, rng)? {
                track.variation = Some(variation);
                self.arrangement.push_track(track);
            }
            log::debug!("Applied variation {} at complexity {}", variation, variation);
        }

        self.advance(ComposerState::VariationsApplied);
        Ok(())
    }

    /// Mark section boundaries with a crash hit when the scenario asks for it
    ///
    /// Overlaid sections share a start time, so they have no boundary to mark.
    pub fn apply_transitions(&mut self) -> GenerationResult<()> {
        self.require_state(ComposerState::VariationsApplied)?;

        let section_count = self.plan.scenario.sections.len();
        if self.plan.scenario.has_transitions
            && self.plan.layout == SectionLayout::Sequential
            && section_count > 1
        {
            let mut crash = Track::new(TrackRole::Crash);
            for index in 1..section_count {
                let start = self.plan.section_offset(index);
                crash.add_note(Note::new(
                    MIDI_CRASH as i32,
                    TRANSITION_VELOCITY,
                    start,
                    start + self.plan.transition_gate,
                ));
            }
            log::debug!("Added {} transition hits", crash.notes.len());
            self.arrangement.merge_track(crash);
        }

        self.advance(ComposerState::TransitionsApplied);
        Ok(())
    }

    /// Hand over the finished arrangement
    pub fn finish(mut self) -> GenerationResult<Arrangement> {
        self.require_state(ComposerState::TransitionsApplied)?;
        self.advance(ComposerState::Final);
        Ok(self.arrangement)
    }

    /// Render every scenario section at `complexity`, merged by role
    fn render_pass(&self, complexity: u32, rng: &mut dyn RngCore) -> GenerationResult<Vec<Track>> {
        let mut merged: Vec<Track> = Vec::new();

        for (index, section) in self.plan.scenario.sections.iter().enumerate() {
            let request = SectionRequest {
                genre: self.plan.genre,
                clock: self.plan.clock,
                complexity,
                section,
                index,
            };
            let offset = self.plan.section_offset(index);
            let tracks = self.source.build_section(&request, rng)?;

            log::debug!(
                "Section '{}' ({}) at {:.3}s: {} tracks",
                section,
                index,
                offset,
                tracks.len()
            );

            for mut track in tracks {
                if offset > 0.0 {
                    track.notes = track.notes.iter().map(|n| n.shifted(offset)).collect();
                }
                match merged.iter_mut().find(|t| t.role == track.role) {
                    Some(existing) => existing.notes.extend(track.notes),
                    None => merged.push(track),
                }
            }
        }

        Ok(merged)
    }

    fn require_state(&self, expected: ComposerState) -> GenerationResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GenerationError::InvalidState {
                expected,
                found: self.state,
            })
        }
    }

    fn advance(&mut self, next: ComposerState) {
        log::debug!("Composer {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
