// Bass Track Builder - Step rhythm plus cyclic note list

use crate::catalog::{pitch_from_name, GenreTemplate};
use crate::error::{GenerationError, GenerationResult};
use crate::groove::BeatClock;

use super::note::{Note, Track, TrackRole};

pub const BASS_VELOCITY: i32 = 100;

/// Bass notes sound for two grid steps (0.5s at 120 BPM on an eighth grid)
pub const BASS_NOTE_STEPS: f64 = 2.0;

/// Build the bass track for a genre
///
/// Active step `i` plays `notes[i % notes.len()]`. An empty note list with
/// any active step is a template bug and fails with `EmptyCycle`.
pub fn build_bass_track(genre: &GenreTemplate, clock: &BeatClock) -> GenerationResult<Track> {
    let pattern = &genre.bass_pattern;
    let mut track = Track::new(TrackRole::Bass);

    if !pattern.has_active_steps() {
        return Ok(track);
    }
    if pattern.notes.is_empty() {
        return Err(GenerationError::EmptyCycle {
            genre: genre.name.clone(),
        });
    }

    let pitches = pattern
        .notes
        .iter()
        .map(|name| pitch_from_name(name))
        .collect::<GenerationResult<Vec<_>>>()?;
    let duration = clock.steps_duration(BASS_NOTE_STEPS);

    for (step, _) in pattern.rhythm.iter().enumerate().filter(|(_, on)| **on) {
        let pitch = pitches[step % pitches.len()];
        let start = clock.time_of(step as u32);
        track.add_note(Note::new(pitch, BASS_VELOCITY, start, start + duration));
    }

    Ok(track)
}
