// PatternForge - Template-driven MIDI pattern generator
// Module declarations

pub mod arranger;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod groove;
pub mod project;

pub use arranger::{
    export_midi, read_midi, write_midi, Arrangement, DecodedNote, ExportError, MidiExportOptions,
    Note, PatternBackend, PatternSource, Program, Track, TrackRole,
};
pub use catalog::{CatalogError, GenreCatalog, GenreTemplate, ScenarioTemplate};
pub use config::{ConfigError, GeneratorConfig, SectionLayout};
pub use engine::{GenerationRequest, PatternEngine};
pub use error::{GenerationError, GenerationResult};
pub use groove::{time_of, BeatClock};
pub use project::{Project, ProjectUpdate};
