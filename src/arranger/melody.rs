// Melody Track Builder - One chord tone per bar, an octave up

use rand::{Rng, RngCore};

use crate::catalog::{pitch_from_name, GenreTemplate};
use crate::error::GenerationResult;
use crate::groove::BeatClock;

use super::note::{Note, Track, TrackRole};

pub const MELODY_VELOCITY: i32 = 90;

/// Melody notes are transposed up one octave from the chord
pub const MELODY_TRANSPOSE: i32 = 12;

/// Build the melody track for a genre
///
/// Each bar picks one tone of that bar's chord uniformly at random and plays
/// it for half a bar. Bars with an empty chord stay silent.
pub fn build_melody_track(
    genre: &GenreTemplate,
    clock: &BeatClock,
    rng: &mut dyn RngCore,
) -> GenerationResult<Track> {
    let mut track = Track::new(TrackRole::Melody);
    let length = clock.seconds_per_bar() * 0.5;

    for (bar, chord) in genre.chord_progression.iter().enumerate() {
        if chord.is_empty() {
            continue;
        }

        let name = &chord[rng.random_range(0..chord.len())];
        let pitch = pitch_from_name(name)?.saturating_add(MELODY_TRANSPOSE);
        let start = clock.bar_start(bar as u32);
        track.add_note(Note::new(pitch, MELODY_VELOCITY, start, start + length));
    }

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::genres;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn clock() -> BeatClock {
        BeatClock::new(120, 2.0).unwrap()
    }

    #[test]
    fn test_one_note_per_bar_from_chord() {
        let genre = genres::house();
        let mut rng = Pcg32::seed_from_u64(11);
        let track = build_melody_track(&genre, &clock(), &mut rng).unwrap();

        assert_eq!(track.notes.len(), genre.chord_progression.len());
        for (bar, note) in track.notes.iter().enumerate() {
            let chord_pitches: Vec<i32> = genre.chord_progression[bar]
                .iter()
                .map(|n| pitch_from_name(n).unwrap() + 12)
                .collect();
            assert!(chord_pitches.contains(&(note.pitch() as i32)));
            assert_eq!(note.velocity(), 90);
            assert!((note.start() - bar as f64 * 2.0).abs() < 1e-9);
            assert!((note.duration() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_reproducible() {
        let genre = genres::dubstep();
        let a = build_melody_track(&genre, &clock(), &mut Pcg32::seed_from_u64(3)).unwrap();
        let b = build_melody_track(&genre, &clock(), &mut Pcg32::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_chord_skipped() {
        let mut genre = genres::house();
        genre.chord_progression[1].clear();

        let track = build_melody_track(&genre, &clock(), &mut Pcg32::seed_from_u64(0)).unwrap();
        assert_eq!(track.notes.len(), 3);
        assert!(track.notes.iter().all(|n| (n.start() - 2.0).abs() > 1e-9));
    }
}
