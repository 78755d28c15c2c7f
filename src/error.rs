// Generation errors
// Caller errors, template bugs and export failures surfaced by the engine

use thiserror::Error;

use crate::arranger::midi::ExportError;
use crate::arranger::source::PatternBackend;
use crate::config::ConfigError;

/// Errors that can occur while generating an arrangement
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Bad tempo, complexity, variation count or grid setting
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown genre: {0}")]
    UnknownGenre(String),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    /// Bass rhythm has active steps but the note cycle is empty
    #[error("Genre '{genre}' has an active bass rhythm but no bass notes")]
    EmptyCycle { genre: String },

    #[error("Invalid pitch name: {0}")]
    InvalidPitchName(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Pattern backend not available: {0:?}")]
    BackendUnavailable(PatternBackend),

    /// Composer stage called out of order
    #[error("Composer expected state {expected:?} but was in {found:?}")]
    InvalidState {
        expected: crate::arranger::composer::ComposerState,
        found: crate::arranger::composer::ComposerState,
    },

    #[error("Configuration rejected: {0}")]
    Config(#[from] ConfigError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

pub type GenerationResult<T> = Result<T, GenerationError>;
