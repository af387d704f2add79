use std::fmt;

/// Errors raised at the crate boundary: bad rosters, bad identifiers,
/// malformed weight files.
///
/// In-match outcomes (failed rolls, turnovers) are never errors; they are
/// reported through `ActionOutcome`.
#[derive(Debug)]
pub enum EngineError {
    UnknownRoster(String),
    InvalidPlayerId(i32),
    InvalidAction(String),
    DeserializationError(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::UnknownRoster(name) => {
                write!(f, "Unknown roster: {}", name)
            }
            EngineError::InvalidPlayerId(id) => {
                write!(f, "Invalid player id: {} (expected 1-22)", id)
            }
            EngineError::InvalidAction(msg) => {
                write!(f, "Invalid action: {}", msg)
            }
            EngineError::DeserializationError(msg) => {
                write!(f, "Deserialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::DeserializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
