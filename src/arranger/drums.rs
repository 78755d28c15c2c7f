// Drum Track Builder - Template drum grids to humanized drum tracks
// One track per drum role, plus tom fills at higher complexity

use rand::{Rng, RngCore};

use crate::catalog::GenreTemplate;
use crate::error::{GenerationError, GenerationResult};
use crate::groove::BeatClock;

use super::note::{Note, Track, TrackRole, MIDI_LOW_TOM};

/// Velocity range for humanized drum hits (inclusive)
pub const MIN_DRUM_VELOCITY: i32 = 80;
pub const MAX_DRUM_VELOCITY: i32 = 120;

/// Fixed velocity of fill hits
pub const FILL_VELOCITY: i32 = 100;

/// Number of evenly spaced tom hits in a fill
pub const FILL_HITS: u32 = 4;

/// Drum builder settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrumSettings {
    /// Longest sounding length of a hit in seconds
    pub gate_seconds: f64,

    /// Fills are added when complexity exceeds this
    pub fill_complexity_threshold: u32,
}

/// Build drum tracks for a genre
///
/// Each drum role in the template becomes one track. A hit sounds for its
/// template gate (in beats) capped at `settings.gate_seconds`. Velocities are
/// drawn from `rng` so a seeded source gives reproducible output.
pub fn build_drum_tracks(
    genre: &GenreTemplate,
    clock: &BeatClock,
    complexity: u32,
    settings: &DrumSettings,
    rng: &mut dyn RngCore,
) -> GenerationResult<Vec<Track>> {
    let mut tracks = Vec::new();

    for (&role, hits) in &genre.drum_patterns {
        let key = role.drum_key().ok_or_else(|| {
            GenerationError::InvalidTemplate(format!(
                "Genre '{}' uses '{}' as a drum role",
                genre.name,
                role.as_str()
            ))
        })?;

        let mut track = Track::new(role);
        for hit in hits {
            let start = clock.time_of(hit.step);
            let duration = gate_duration(hit.gate, clock, settings.gate_seconds);
            let velocity = rng.random_range(MIN_DRUM_VELOCITY..=MAX_DRUM_VELOCITY);
            track.add_note(Note::new(key as i32, velocity, start, start + duration));
        }
        tracks.push(track);
    }

    if complexity > settings.fill_complexity_threshold {
        tracks.push(build_fill(clock, settings.gate_seconds));
    }

    Ok(tracks)
}

/// Tom fill: evenly spaced hits from the top of the pattern, layered on top
fn build_fill(clock: &BeatClock, gate_seconds: f64) -> Track {
    let mut fill = Track::new(TrackRole::Tom);

    for step in 0..FILL_HITS {
        let start = clock.time_of(step);
        fill.add_note(Note::new(MIDI_LOW_TOM as i32, FILL_VELOCITY, start, start + gate_seconds));
    }

    fill
}

/// Sounding length of a hit in seconds
fn gate_duration(gate_beats: f64, clock: &BeatClock, gate_seconds: f64) -> f64 {
    if gate_beats > 0.0 {
        (gate_beats * clock.seconds_per_beat()).min(gate_seconds)
    } else {
        gate_seconds
    }
}
