// Built-in genres
// House, techno and dubstep grids plus reggae and hip-hop grooves

use std::collections::BTreeMap;

use crate::arranger::note::TrackRole;

use super::types::{BassPattern, Chord, DrumHit, GenreTemplate};

/// Hits on the given steps, all with the same gate
fn hits(steps: &[u32], gate: f64) -> Vec<DrumHit> {
    steps.iter().map(|&step| DrumHit::new(step, gate)).collect()
}

/// Step rhythm from a 0/1 grid
fn rhythm(grid: &[u8]) -> Vec<bool> {
    grid.iter().map(|&v| v != 0).collect()
}

fn names(notes: &[&str]) -> Vec<String> {
    notes.iter().map(|n| n.to_string()).collect()
}

fn chords<const N: usize>(progression: &[[&str; N]]) -> Vec<Chord> {
    progression.iter().map(|chord| names(chord)).collect()
}

/// House: four on the floor, backbeat snare, eighth hats
pub fn house() -> GenreTemplate {
    GenreTemplate {
        name: "house".to_string(),
        pattern_steps: 16,
        drum_patterns: BTreeMap::from([
            (TrackRole::Kick, hits(&[0, 4, 8, 12], 1.0)),
            (TrackRole::Snare, hits(&[4, 12], 1.0)),
            (TrackRole::Hihat, hits(&[0, 2, 4, 6, 8, 10, 12, 14], 0.5)),
        ]),
        bass_pattern: BassPattern {
            rhythm: rhythm(&[0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 1]),
            notes: names(&["A1", "A1", "C2", "G1"]),
        },
        chord_progression: chords(&[
            ["A2", "C3", "E3"],
            ["F2", "A2", "C3"],
            ["C3", "E3", "G3"],
            ["G2", "B2", "D3"],
        ]),
        bpm_range: (120, 130),
    }
}

/// Techno: four on the floor with sixteenth hats
pub fn techno() -> GenreTemplate {
    GenreTemplate {
        name: "techno".to_string(),
        pattern_steps: 16,
        drum_patterns: BTreeMap::from([
            (TrackRole::Kick, hits(&[0, 4, 8, 12], 1.0)),
            (TrackRole::Snare, hits(&[4, 12], 1.0)),
            (TrackRole::Hihat, hits(&(0..16u32).collect::<Vec<_>>(), 0.25)),
        ]),
        bass_pattern: BassPattern {
            rhythm: rhythm(&[1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1, 1, 0, 1, 1]),
            notes: names(&["A1", "A1", "A2", "A1"]),
        },
        chord_progression: chords(&[
            ["A2", "C3", "E3"],
            ["A2", "C3", "E3"],
            ["G2", "B2", "D3"],
            ["F2", "A2", "C3"],
        ]),
        bpm_range: (125, 140),
    }
}

/// Dubstep: half-time kick, backbeat snare
pub fn dubstep() -> GenreTemplate {
    GenreTemplate {
        name: "dubstep".to_string(),
        pattern_steps: 16,
        drum_patterns: BTreeMap::from([
            (TrackRole::Kick, hits(&[0, 8], 1.0)),
            (TrackRole::Snare, hits(&[4, 12], 1.0)),
            (TrackRole::Hihat, hits(&[0, 2, 4, 6, 8, 10, 12, 14], 0.5)),
        ]),
        bass_pattern: BassPattern {
            rhythm: rhythm(&[1, 0, 0, 1, 0, 0, 1, 0, 1, 0, 0, 0, 1, 1, 0, 0]),
            notes: names(&["D1", "D1", "F1", "A#0", "C1"]),
        },
        chord_progression: chords(&[
            ["D2", "F2", "A2"],
            ["A#1", "D2", "F2"],
            ["F2", "A2", "C3"],
            ["C2", "E2", "G2"],
        ]),
        bpm_range: (140, 150),
    }
}

/// Reggae: one-drop style kick on 1 and 3, eighth hats
pub fn reggae() -> GenreTemplate {
    GenreTemplate {
        name: "reggae".to_string(),
        pattern_steps: 16,
        drum_patterns: BTreeMap::from([
            (TrackRole::Kick, hits(&[0, 4, 8, 12], 1.0)),
            (TrackRole::Snare, hits(&[2, 6, 10, 14], 1.0)),
            (TrackRole::Hihat, hits(&(0..16u32).collect::<Vec<_>>(), 0.5)),
        ]),
        bass_pattern: BassPattern {
            rhythm: rhythm(&[1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]),
            notes: names(&["C2"]),
        },
        chord_progression: chords(&[
            ["C2", "E2", "G2"],
            ["G2", "B2", "D3"],
            ["A2", "C3", "E3"],
            ["F2", "A2", "C3"],
        ]),
        bpm_range: (70, 90),
    }
}

/// Hip-hop: pushed kick on the last eighth, backbeat snare
pub fn hiphop() -> GenreTemplate {
    GenreTemplate {
        name: "hiphop".to_string(),
        pattern_steps: 16,
        drum_patterns: BTreeMap::from([
            (TrackRole::Kick, hits(&[0, 4, 7, 8, 12, 15], 1.0)),
            (TrackRole::Snare, hits(&[2, 6, 10, 14], 1.0)),
            (TrackRole::Hihat, hits(&[0, 2, 4, 6, 8, 10, 12, 14], 0.5)),
        ]),
        bass_pattern: BassPattern {
            rhythm: rhythm(&[1, 0, 0, 0, 0, 0, 0, 1, 1, 0, 0, 0, 0, 0, 1, 0]),
            notes: names(&["C2", "C2", "F1", "G1"]),
        },
        chord_progression: chords(&[
            ["C2", "F2", "A2"],
            ["F2", "A2", "C3"],
            ["G2", "B2", "D3"],
            ["A2", "C3", "E3"],
        ]),
        bpm_range: (85, 100),
    }
}

/// All built-in genres
pub fn builtin_genres() -> Vec<GenreTemplate> {
    vec![house(), techno(), dubstep(), reggae(), hiphop()]
}
