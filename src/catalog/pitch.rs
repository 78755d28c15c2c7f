// Pitch names
// Scientific pitch notation ("C2", "F#3", "Bb1") to MIDI note numbers

use crate::error::{GenerationError, GenerationResult};

/// Semitone offset of each natural note from C
fn natural_index(letter: char) -> Option<i32> {
    match letter.to_ascii_uppercase() {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

/// Chromatic index (0-11) of a pitch class such as "C", "C#" or "Db"
pub fn chromatic_index(pitch_class: &str) -> Option<i32> {
    let mut chars = pitch_class.chars();
    let base = natural_index(chars.next()?)?;

    let accidental = match chars.as_str() {
        "" => 0,
        "#" => 1,
        "b" => -1,
        _ => return None,
    };

    Some((base + accidental).rem_euclid(12))
}

/// Convert a pitch name to a MIDI note number
///
/// `chromatic_index(name) + (octave + 1) * 12`, so "C4" is 60 and "A0" is 21.
/// The result is not clamped; notes clamp at construction.
pub fn pitch_from_name(name: &str) -> GenerationResult<i32> {
    let invalid = || GenerationError::InvalidPitchName(name.to_string());

    let trimmed = name.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_digit() || c == '-')
        .ok_or_else(invalid)?;
    let (pitch_class, octave) = trimmed.split_at(split);

    let index = chromatic_index(pitch_class).ok_or_else(invalid)?;
    let octave: i32 = octave.parse().map_err(|_| invalid())?;

    // B# and Cb wrap across the octave boundary
    let octave_shift = match pitch_class.chars().collect::<Vec<_>>().as_slice() {
        ['B' | 'b', '#'] => 1,
        ['C' | 'c', 'b'] => -1,
        _ => 0,
    };

    octave
        .checked_add(1 + octave_shift)
        .and_then(|o| o.checked_mul(12))
        .and_then(|base| base.checked_add(index))
        .ok_or_else(invalid)
}
