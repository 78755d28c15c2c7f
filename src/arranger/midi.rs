// MIDI Export - Convert arrangements to Standard MIDI Files using midly crate
// Format 1: a tempo/meta track followed by one track per arrangement track

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;

use midly::num::{u15, u4, u7};
use midly::{Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::note::{Arrangement, Program, Track, TrackRole};

/// General MIDI percussion channel (channel 10, zero-based)
pub const DRUM_CHANNEL: u8 = 9;

/// Microseconds per quarter note when a file carries no tempo
const DEFAULT_TEMPO_US: u32 = 500_000;

/// Largest value the 24-bit tempo meta-event can hold
pub const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;

/// Errors that can occur while writing or reading MIDI
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode MIDI: {0}")]
    Encode(String),

    #[error("Failed to decode MIDI: {0}")]
    Decode(String),

    #[error("Invalid note {index} in track '{track}'")]
    InvalidNote { track: String, index: usize },
}

/// MIDI export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiExportOptions {
    /// Pulses per quarter note (PPQ) - typically 480 or 960
    pub ppq: u16,

    /// Include tempo metadata
    pub include_tempo: bool,

    /// Include time signature metadata
    pub include_time_signature: bool,

    /// Include track names
    pub track_names: bool,
}

impl Default for MidiExportOptions {
    fn default() -> Self {
        MidiExportOptions {
            ppq: 480,
            include_tempo: true,
            include_time_signature: true,
            track_names: true,
        }
    }
}

/// A note read back from a MIDI file
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedNote {
    /// Role parsed from the track name, if the track had one
    pub role: Option<TrackRole>,
    pub variation: Option<u32>,
    pub pitch: u8,
    pub velocity: u8,
    pub start: f64,
    pub end: f64,
}

/// Export an arrangement to MIDI file bytes
///
/// Times are converted from seconds to ticks at the arrangement tempo and
/// rounded to the nearest tick. Within one tick, note-offs come before
/// note-ons so back-to-back notes of the same pitch stay separate.
pub fn export_midi(
    arrangement: &Arrangement,
    options: &MidiExportOptions,
) -> Result<Vec<u8>, ExportError> {
    if options.ppq == 0 || options.ppq > 0x7FFF {
        return Err(ExportError::Encode(format!(
            "PPQ must be between 1 and 32767, got {}",
            options.ppq
        )));
    }
    let tempo_us = tempo_micros(arrangement.tempo_bpm()).ok_or_else(|| {
        ExportError::Encode(format!(
            "tempo {} BPM cannot be stored in a tempo event",
            arrangement.tempo_bpm()
        ))
    })?;

    let header = Header {
        format: midly::Format::Parallel,
        timing: Timing::Metrical(u15::new(options.ppq)),
    };
    let ticks_per_second = ticks_per_second(arrangement.tempo_bpm(), options.ppq);

    // Names are borrowed by the track events, so build them up front
    let title = format!("{} - {}", arrangement.genre(), arrangement.scenario());
    let names: Vec<String> = arrangement.tracks().iter().map(Track::name).collect();

    let mut tracks = Vec::with_capacity(arrangement.tracks().len() + 1);

    // Track 0: Tempo and time signature metadata
    let mut meta_track = Vec::new();
    if options.track_names {
        meta_track.push(at_zero(TrackEventKind::Meta(MetaMessage::TrackName(
            title.as_bytes(),
        ))));
    }
    if options.include_tempo {
        meta_track.push(at_zero(TrackEventKind::Meta(MetaMessage::Tempo(
            tempo_us.into(),
        ))));
    }
    if options.include_time_signature {
        // 4/4, 24 MIDI clocks per click, 8 32nds per quarter
        meta_track.push(at_zero(TrackEventKind::Meta(MetaMessage::TimeSignature(
            4, 2, 24, 8,
        ))));
    }
    meta_track.push(at_zero(TrackEventKind::Meta(MetaMessage::EndOfTrack)));
    tracks.push(meta_track);

    let mut melodic_index = 0usize;
    for (track, name) in arrangement.tracks().iter().zip(&names) {
        let channel = match track.program {
            Program::DrumKit => DRUM_CHANNEL,
            Program::Melodic(_) => {
                let channel = melodic_channel(melodic_index);
                melodic_index += 1;
                channel
            }
        };
        tracks.push(encode_track(track, name, channel, ticks_per_second, options)?);
    }

    let smf = Smf { header, tracks };

    let mut bytes = Vec::new();
    smf.write(&mut bytes)
        .map_err(|e| ExportError::Encode(e.to_string()))?;

    log::debug!(
        "Exported {} tracks ({} bytes) at {} BPM",
        smf.tracks.len(),
        bytes.len(),
        arrangement.tempo_bpm()
    );

    Ok(bytes)
}

/// Export an arrangement and write it to `path`
pub fn write_midi(
    arrangement: &Arrangement,
    options: &MidiExportOptions,
    path: &Path,
) -> Result<(), ExportError> {
    let bytes = export_midi(arrangement, options)?;
    fs::write(path, &bytes)?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read back the notes of a file written by [`export_midi`]
///
/// Notes are paired first-in first-out per pitch within each track. Seconds
/// are derived from the first tempo event, or 120 BPM when there is none.
pub fn read_midi(bytes: &[u8]) -> Result<Vec<DecodedNote>, ExportError> {
    let smf = Smf::parse(bytes).map_err(|e| ExportError::Decode(e.to_string()))?;

    let ppq = match smf.header.timing {
        Timing::Metrical(ppq) if ppq.as_int() > 0 => ppq.as_int(),
        other => {
            return Err(ExportError::Decode(format!(
                "unsupported timing {:?}",
                other
            )))
        }
    };

    let tempo_us = smf
        .tracks
        .iter()
        .flat_map(|t| t.iter())
        .find_map(|event| match event.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(us)) => Some(us.as_int()),
            _ => None,
        })
        .unwrap_or(DEFAULT_TEMPO_US);
    let seconds_per_tick = tempo_us as f64 / 1_000_000.0 / ppq as f64;

    let mut notes = Vec::new();

    for (index, track) in smf.tracks.iter().enumerate() {
        let mut role = None;
        let mut variation = None;
        let mut open: HashMap<u8, VecDeque<(u32, u8)>> = HashMap::new();
        let mut track_notes = Vec::new();
        let mut tick = 0u32;

        for event in track {
            tick = tick.saturating_add(event.delta.as_int());

            match event.kind {
                TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                    let parsed = parse_track_name(&String::from_utf8_lossy(name));
                    role = parsed.0;
                    variation = parsed.1;
                }
                TrackEventKind::Midi { message, .. } => match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        open.entry(key.as_int())
                            .or_default()
                            .push_back((tick, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let (start, velocity) = open
                            .get_mut(&key.as_int())
                            .and_then(VecDeque::pop_front)
                            .ok_or_else(|| {
                                ExportError::Decode(format!(
                                    "note-off without note-on for key {} in track {}",
                                    key.as_int(),
                                    index
                                ))
                            })?;
                        track_notes.push((key.as_int(), velocity, start, tick));
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        if open.values().any(|pending| !pending.is_empty()) {
            return Err(ExportError::Decode(format!(
                "unterminated note in track {}",
                index
            )));
        }

        track_notes.sort_by_key(|&(pitch, _, start, _)| (start, pitch));
        notes.extend(
            track_notes
                .into_iter()
                .map(|(pitch, velocity, start, end)| DecodedNote {
                    role,
                    variation,
                    pitch,
                    velocity,
                    start: start as f64 * seconds_per_tick,
                    end: end as f64 * seconds_per_tick,
                }),
        );
    }

    Ok(notes)
}

/// Build one MTrk for an arrangement track
fn encode_track<'a>(
    track: &Track,
    name: &'a str,
    channel: u8,
    ticks_per_second: f64,
    options: &MidiExportOptions,
) -> Result<Vec<TrackEvent<'a>>, ExportError> {
    let channel = u4::new(channel);

    // (tick, order, event): note-offs (0) sort before note-ons (1) at equal ticks
    let mut events: Vec<(u32, u8, TrackEventKind<'a>)> = Vec::new();

    if options.track_names {
        events.push((0, 0, TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes()))));
    }

    if let Program::Melodic(program) = track.program {
        if program > 127 {
            return Err(ExportError::Encode(format!(
                "program {} out of range in track '{}'",
                program, name
            )));
        }
        events.push((
            0,
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(program),
                },
            },
        ));
    }

    for (index, note) in track.notes.iter().enumerate() {
        if !note.is_valid() {
            return Err(ExportError::InvalidNote {
                track: name.to_string(),
                index,
            });
        }

        let key = u7::new(note.pitch());
        let tick_on = to_ticks(note.start(), ticks_per_second);
        // Keep at least one tick so the note survives rounding
        let tick_off = to_ticks(note.end(), ticks_per_second).max(tick_on + 1);

        events.push((
            tick_on,
            1,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(note.velocity()),
                },
            },
        ));
        events.push((
            tick_off,
            0,
            TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        ));
    }

    // Stable sort keeps generation order among equal keys
    events.sort_by_key(|(tick, order, _)| (*tick, *order));

    let mut encoded = Vec::with_capacity(events.len() + 1);
    let mut last_tick = 0;
    for (tick, _, kind) in events {
        encoded.push(TrackEvent {
            delta: (tick - last_tick).into(),
            kind,
        });
        last_tick = tick;
    }
    encoded.push(at_zero(TrackEventKind::Meta(MetaMessage::EndOfTrack)));

    Ok(encoded)
}

/// Split "bass v2" into its role and variation
fn parse_track_name(name: &str) -> (Option<TrackRole>, Option<u32>) {
    match name.split_once(" v") {
        Some((role, variation)) => (TrackRole::from_name(role), variation.parse().ok()),
        None => (TrackRole::from_name(name), None),
    }
}

/// Channel for the nth melodic track, skipping the drum channel
fn melodic_channel(index: usize) -> u8 {
    let channel = (index % 15) as u8;
    if channel >= DRUM_CHANNEL {
        channel + 1
    } else {
        channel
    }
}

fn at_zero(kind: TrackEventKind<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: 0.into(),
        kind,
    }
}

/// Microseconds per quarter note, if it fits the 24-bit tempo field
pub fn tempo_micros(bpm: u32) -> Option<u32> {
    match 60_000_000u32.checked_div(bpm)? {
        0 => None,
        us if us > MAX_TEMPO_MICROS => None,
        us => Some(us),
    }
}

fn ticks_per_second(bpm: u32, ppq: u16) -> f64 {
    ppq as f64 * bpm as f64 / 60.0
}

fn to_ticks(seconds: f64, ticks_per_second: f64) -> u32 {
    (seconds * ticks_per_second).round() as u32
}
