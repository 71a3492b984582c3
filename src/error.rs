//! Error types for u-timetable.
//!
//! Only malformed input is an error. An exhausted search budget is a
//! normal outcome reported through
//! [`SearchStatus`](crate::cp::SearchStatus), never through `Err`.

use thiserror::Error;

use crate::validation::ValidationError;

/// A catalog that cannot be scheduled. Raised before any search starts.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Dedicated room policy, but `prefix + section` names no room.
    #[error("no dedicated room `{expected}` for section `{section}`")]
    UnresolvedRoom { section: String, expected: String },

    /// No teacher in the section's pool is qualified for the subject.
    #[error("subject `{subject}` in section `{section}` has no qualified teacher")]
    UnqualifiedSubject { section: String, subject: String },

    /// Pooled room policy, but no room has the requested type.
    #[error("no room of type `{room_type}` for subject `{subject}` in section `{section}`")]
    MissingRoomType {
        section: String,
        subject: String,
        room_type: String,
    },

    /// The day/slot grid or block pairs are malformed.
    #[error("invalid time grid: {0}")]
    InvalidGrid(String),

    /// A section's sessions cannot fit into one week.
    #[error("section `{section}` needs {required} slots but only {available} are usable")]
    CapacityExceeded {
        section: String,
        required: u32,
        available: u32,
    },

    /// The scope selector names a section absent from the catalog.
    #[error("unknown section `{0}` in scope selector")]
    UnknownSection(String),

    /// Structural input problems (duplicate or empty names).
    #[error("invalid catalog: {}", join_messages(.0))]
    Invalid(Vec<ValidationError>),
}

/// Engine configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level error of a timetabling request.
#[derive(Debug, Error)]
pub enum TimetableError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias for timetabling operations.
pub type Result<T> = std::result::Result<T, TimetableError>;

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
