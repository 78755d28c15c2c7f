// Harmony Track Builder - One sustained chord per bar

use crate::catalog::{pitch_from_name, GenreTemplate};
use crate::error::GenerationResult;
use crate::groove::BeatClock;

use super::note::{Note, Track, TrackRole};

pub const HARMONY_VELOCITY: i32 = 80;

/// Build the harmony track for a genre
///
/// Chord `i` starts at bar `i` and sounds for the whole bar. Voicing is used
/// exactly as written in the progression.
pub fn build_harmony_track(genre: &GenreTemplate, clock: &BeatClock) -> GenerationResult<Track> {
    let mut track = Track::new(TrackRole::Harmony);
    let bar_length = clock.seconds_per_bar();

    for (bar, chord) in genre.chord_progression.iter().enumerate() {
        let start = clock.bar_start(bar as u32);
        for name in chord {
            let pitch = pitch_from_name(name)?;
            track.add_note(Note::new(pitch, HARMONY_VELOCITY, start, start + bar_length));
        }
    }

    Ok(track)
}
