// Arranger - Template-driven pattern generation
// Turns genre templates into multi-track arrangements and MIDI files

pub mod bass;
pub mod composer;
pub mod drums;
pub mod harmony;
pub mod melody;
pub mod midi;
pub mod note;
pub mod source;

// Re-export main types
pub use composer::{ComposerState, CompositionPlan, PatternComposer};
pub use midi::{export_midi, read_midi, write_midi, DecodedNote, ExportError, MidiExportOptions};
pub use note::{Arrangement, Note, Program, Track, TrackRole};
pub use source::{pattern_source, PatternBackend, PatternSource, SectionRequest, TemplatePatternSource};
