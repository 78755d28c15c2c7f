// Notes, Tracks and Arrangements
// Timed MIDI notes grouped per instrument role

use serde::{Deserialize, Serialize};

/// General MIDI percussion key numbers
pub const MIDI_KICK: u8 = 36; // C1
pub const MIDI_SNARE: u8 = 38; // D1
pub const MIDI_CLOSED_HIHAT: u8 = 42; // F#1
pub const MIDI_LOW_TOM: u8 = 45; // A1
pub const MIDI_CRASH: u8 = 49; // C#2

/// General MIDI programs for melodic roles
pub const PROGRAM_PIANO: u8 = 0;
pub const PROGRAM_ACOUSTIC_BASS: u8 = 32;
pub const PROGRAM_FLUTE: u8 = 73;

/// Instrument role of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Kick,
    Snare,
    Hihat,
    Tom,
    Crash,
    Bass,
    Harmony,
    Melody,
}

impl TrackRole {
    pub const ALL: [TrackRole; 8] = [
        TrackRole::Kick,
        TrackRole::Snare,
        TrackRole::Hihat,
        TrackRole::Tom,
        TrackRole::Crash,
        TrackRole::Bass,
        TrackRole::Harmony,
        TrackRole::Melody,
    ];

    /// Convert from string representation
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kick" => Some(TrackRole::Kick),
            "snare" => Some(TrackRole::Snare),
            "hihat" => Some(TrackRole::Hihat),
            "tom" => Some(TrackRole::Tom),
            "crash" => Some(TrackRole::Crash),
            "bass" => Some(TrackRole::Bass),
            "harmony" => Some(TrackRole::Harmony),
            "melody" => Some(TrackRole::Melody),
            _ => None,
        }
    }

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackRole::Kick => "kick",
            TrackRole::Snare => "snare",
            TrackRole::Hihat => "hihat",
            TrackRole::Tom => "tom",
            TrackRole::Crash => "crash",
            TrackRole::Bass => "bass",
            TrackRole::Harmony => "harmony",
            TrackRole::Melody => "melody",
        }
    }

    /// Whether this role plays on the drum kit
    pub fn is_drum(&self) -> bool {
        matches!(
            self,
            TrackRole::Kick | TrackRole::Snare | TrackRole::Hihat | TrackRole::Tom | TrackRole::Crash
        )
    }

    /// Percussion key for drum roles
    pub fn drum_key(&self) -> Option<u8> {
        match self {
            TrackRole::Kick => Some(MIDI_KICK),
            TrackRole::Snare => Some(MIDI_SNARE),
            TrackRole::Hihat => Some(MIDI_CLOSED_HIHAT),
            TrackRole::Tom => Some(MIDI_LOW_TOM),
            TrackRole::Crash => Some(MIDI_CRASH),
            _ => None,
        }
    }

    /// Default instrument for this role
    pub fn default_program(&self) -> Program {
        match self {
            TrackRole::Bass => Program::Melodic(PROGRAM_ACOUSTIC_BASS),
            TrackRole::Harmony => Program::Melodic(PROGRAM_PIANO),
            TrackRole::Melody => Program::Melodic(PROGRAM_FLUTE),
            _ => Program::DrumKit,
        }
    }
}

/// Instrument selection for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    /// General MIDI percussion (channel 10)
    DrumKit,

    /// General MIDI program number (0-127)
    Melodic(u8),
}

/// Unvalidated note fields, used when deserializing
#[derive(Debug, Clone, Deserialize)]
struct NoteFields {
    pitch: i32,
    velocity: i32,
    start: f64,
    end: f64,
}

/// A timed MIDI note
///
/// Pitch and velocity are always within 0-127 and `0 <= start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NoteFields")]
pub struct Note {
    pitch: u8,
    velocity: u8,
    start: f64,
    end: f64,
}

impl Note {
    /// Create a new note, clamping pitch and velocity into MIDI range
    ///
    /// # Panics
    /// If `start` is negative or non-finite, or `end` is not after `start`.
    pub fn new(pitch: i32, velocity: i32, start: f64, end: f64) -> Self {
        assert!(
            start.is_finite() && end.is_finite() && start >= 0.0 && end > start,
            "invalid note timing: start={} end={}",
            start,
            end
        );

        Note {
            pitch: pitch.clamp(0, 127) as u8,
            velocity: velocity.clamp(0, 127) as u8,
            start,
            end,
        }
    }

    pub fn pitch(&self) -> u8 {
        self.pitch
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Start time in seconds
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Same note moved later by `offset` seconds
    pub fn shifted(&self, offset: f64) -> Self {
        Note::new(
            self.pitch as i32,
            self.velocity as i32,
            self.start + offset,
            self.end + offset,
        )
    }

    /// Check invariants without panicking
    pub fn is_valid(&self) -> bool {
        self.pitch <= 127
            && self.velocity <= 127
            && self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end > self.start
    }
}

impl TryFrom<NoteFields> for Note {
    type Error = String;

    fn try_from(fields: NoteFields) -> Result<Self, Self::Error> {
        let valid_timing = fields.start.is_finite()
            && fields.end.is_finite()
            && fields.start >= 0.0
            && fields.end > fields.start;
        if !valid_timing {
            return Err(format!(
                "note must satisfy 0 <= start < end (start={}, end={})",
                fields.start, fields.end
            ));
        }
        Ok(Note::new(fields.pitch, fields.velocity, fields.start, fields.end))
    }
}

/// A track of notes for one instrument role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub role: TrackRole,

    pub program: Program,

    /// Variation pass that produced this track (None for the base pass)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<u32>,

    /// Notes in generation order
    pub notes: Vec<Note>,
}

impl Track {
    /// Create a new empty track with the role's default instrument
    pub fn new(role: TrackRole) -> Self {
        Track {
            role,
            program: role.default_program(),
            variation: None,
            notes: Vec::new(),
        }
    }

    /// Add a note to this track
    pub fn add_note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Display name, e.g. "kick" or "bass v2"
    pub fn name(&self) -> String {
        match self.variation {
            Some(v) => format!("{} v{}", self.role.as_str(), v),
            None => self.role.as_str().to_string(),
        }
    }

    /// Notes sorted by start time (stable for equal starts)
    pub fn sorted_notes(&self) -> Vec<Note> {
        let mut notes = self.notes.clone();
        notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        notes
    }

    /// Time of the last note-off, 0.0 for an empty track
    pub fn end_time(&self) -> f64 {
        self.notes.iter().map(|n| n.end).fold(0.0, f64::max)
    }
}

/// Complete multi-track arrangement
///
/// Only the composer mutates an arrangement; everything else gets read access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrangement {
    genre: String,
    scenario: String,
    tempo_bpm: u32,
    tracks: Vec<Track>,
}

impl Arrangement {
    /// Create a new empty arrangement
    pub(crate) fn new(genre: impl Into<String>, scenario: impl Into<String>, tempo_bpm: u32) -> Self {
        Arrangement {
            genre: genre.into(),
            scenario: scenario.into(),
            tempo_bpm,
            tracks: Vec::new(),
        }
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.tempo_bpm
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// First base-pass track with the given role
    pub fn track(&self, role: TrackRole) -> Option<&Track> {
        self.tracks
            .iter()
            .find(|t| t.role == role && t.variation.is_none())
    }

    /// Total notes across all tracks
    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.notes.len()).sum()
    }

    /// Time of the last note-off across all tracks
    pub fn duration_seconds(&self) -> f64 {
        self.tracks.iter().map(Track::end_time).fold(0.0, f64::max)
    }

    /// Iterate over every note with its role
    pub fn notes(&self) -> impl Iterator<Item = (TrackRole, &Note)> {
        self.tracks
            .iter()
            .flat_map(|t| t.notes.iter().map(move |n| (t.role, n)))
    }

    /// Merge a base-pass track: same role appends notes, new role adds a track
    pub(crate) fn merge_track(&mut self, track: Track) {
        match self
            .tracks
            .iter_mut()
            .find(|t| t.role == track.role && t.variation == track.variation)
        {
            Some(existing) => existing.notes.extend(track.notes),
            None => self.tracks.push(track),
        }
    }

    /// Append a track without merging
    pub(crate) fn push_track(&mut self, track: Track) {
        self.tracks.push(track);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_clamps_pitch_and_velocity() {
        let note = Note::new(140, -5, 0.0, 0.5);
        assert_eq!(note.pitch(), 127);
        assert_eq!(note.velocity(), 0);

        let note = Note::new(-12, 200, 1.0, 1.5);
        assert_eq!(note.pitch(), 0);
        assert_eq!(note.velocity(), 127);
    }

    #[test]
    #[should_panic(expected = "invalid note timing")]
    fn test_note_rejects_zero_length() {
        Note::new(60, 100, 1.0, 1.0);
    }

    #[test]
    #[should_panic(expected = "invalid note timing")]
    fn test_note_rejects_negative_start() {
        Note::new(60, 100, -0.5, 1.0);
    }

    #[test]
    fn test_note_deserialize_validates() {
        let ok: Note = serde_json::from_str(r#"{"pitch":60,"velocity":90,"start":0.0,"end":0.5}"#)
            .unwrap();
        assert_eq!(ok.pitch(), 60);

        let bad = serde_json::from_str::<Note>(r#"{"pitch":60,"velocity":90,"start":1.0,"end":0.5}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_note_shifted() {
        let note = Note::new(60, 90, 0.5, 1.0).shifted(2.0);
        assert_eq!(note.start(), 2.5);
        assert_eq!(note.end(), 3.0);
        assert_eq!(note.pitch(), 60);
    }

    #[test]
    fn test_role_names() {
        for role in TrackRole::ALL {
            assert_eq!(TrackRole::from_name(role.as_str()), Some(role));
        }
        assert_eq!(TrackRole::from_name("cowbell"), None);
    }

    #[test]
    fn test_role_programs() {
        assert_eq!(TrackRole::Kick.default_program(), Program::DrumKit);
        assert_eq!(TrackRole::Bass.default_program(), Program::Melodic(32));
        assert_eq!(TrackRole::Melody.default_program(), Program::Melodic(73));
        assert_eq!(TrackRole::Tom.drum_key(), Some(45));
        assert_eq!(TrackRole::Harmony.drum_key(), None);
    }

    #[test]
    fn test_track_name() {
        let mut track = Track::new(TrackRole::Bass);
        assert_eq!(track.name(), "bass");
        track.variation = Some(2);
        assert_eq!(track.name(), "bass v2");
    }

    #[test]
    fn test_merge_track_by_role() {
        let mut arrangement = Arrangement::new("house", "loop_based", 120);

        let mut kick = Track::new(TrackRole::Kick);
        kick.add_note(Note::new(36, 100, 0.0, 0.2));
        arrangement.merge_track(kick.clone());
        arrangement.merge_track(kick);

        let mut bass = Track::new(TrackRole::Bass);
        bass.add_note(Note::new(33, 100, 0.5, 1.0));
        arrangement.merge_track(bass);

        assert_eq!(arrangement.tracks().len(), 2);
        assert_eq!(arrangement.track(TrackRole::Kick).unwrap().notes.len(), 2);
        assert_eq!(arrangement.note_count(), 3);
        assert!((arrangement.duration_seconds() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_sorted_notes() {
        let mut track = Track::new(TrackRole::Harmony);
        track.add_note(Note::new(60, 80, 2.0, 4.0));
        track.add_note(Note::new(64, 80, 0.0, 2.0));

        let sorted = track.sorted_notes();
        assert_eq!(sorted[0].start(), 0.0);
        assert_eq!(sorted[1].start(), 2.0);
    }
}
