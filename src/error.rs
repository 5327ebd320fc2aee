//! Error types for the score editor
//!
//! One error enum covers the store, the services, the editor and the
//! renderers. The WASM API converts it to a JS error at the boundary.

use thiserror::Error;

/// Top-level error type for score operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// A record referenced by id does not exist
    #[error("{kind} with ID {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// A chord already holds a note at this position
    #[error("Chord {chord} already has a note at position {position}")]
    PositionOccupied { chord: String, position: i32 },

    /// An update tried to store a record under a different key
    #[error("ID mismatch: expected {expected}, got {actual}")]
    IdMismatch { expected: String, actual: String },

    /// A builder operation needs a selection that has not been made
    #[error("A {0} must be selected")]
    NothingSelected(&'static str),

    /// The score tree breaks a structural invariant
    #[error("Invalid score: {0}")]
    InvalidScore(String),

    /// A value could not be parsed (ids, enum names, config)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Export failed
    #[error("Export error: {0}")]
    Export(String),
}

impl ScoreError {
    pub fn not_found(kind: &'static str, id: impl std::fmt::Debug) -> Self {
        ScoreError::NotFound {
            kind,
            id: format!("{:?}", id),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        ScoreError::InvalidScore(msg.into())
    }
}

impl From<serde_json::Error> for ScoreError {
    fn from(e: serde_json::Error) -> Self {
        ScoreError::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for ScoreError {
    fn from(e: serde_yaml::Error) -> Self {
        ScoreError::Parse(e.to_string())
    }
}

impl From<uuid::Error> for ScoreError {
    fn from(e: uuid::Error) -> Self {
        ScoreError::Parse(e.to_string())
    }
}

pub type Result<T, E = ScoreError> = std::result::Result<T, E>;
