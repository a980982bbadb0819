//! Error types
//!
//! Nothing here is fatal to a running game: validation problems are shown to
//! the player, network and storage failures are logged and the game carries on.

use core::fmt;

/// Rejected score submission, detected before anything is sent
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    EmptyName,
    NameTooLong { len: usize, max: usize },
    /// Not in game over, or the run scored nothing
    NothingToSubmit,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "please enter your name"),
            Self::NameTooLong { len, max } => {
                write!(f, "name must be at most {max} characters (got {len})")
            }
            Self::NothingToSubmit => write!(f, "there is no score to save"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure talking to the scoring service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NetworkError {
    /// Request never completed
    Transport(String),
    /// Service answered with a non-success status
    Status { code: u16, message: String },
    /// Response body was not what the contract promises
    Decode(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "request failed: {msg}"),
            Self::Status { code, message } => write!(f, "service returned {code}: {message}"),
            Self::Decode(msg) => write!(f, "unexpected response: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardError {
    Validation(ValidationError),
    Network(NetworkError),
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(e) => write!(f, "{e}"),
            Self::Network(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LeaderboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(e) => Some(e),
            Self::Network(e) => Some(e),
        }
    }
}

impl From<ValidationError> for LeaderboardError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<NetworkError> for LeaderboardError {
    fn from(e: NetworkError) -> Self {
        Self::Network(e)
    }
}

/// Local key-value storage failure
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageError(pub String);

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storage error: {}", self.0)
    }
}

impl std::error::Error for StorageError {}

/// Bad tuning document
#[derive(Clone, Debug, PartialEq)]
pub enum TuningError {
    Parse(String),
    NotPositive { field: &'static str },
    PaddingTooWide { padding: f32, width: f32 },
    EmptyGapRange { min: f32, max: f32 },
    NameLength { len: usize, max: usize },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "invalid tuning json: {msg}"),
            Self::NotPositive { field } => write!(f, "{field} must be positive"),
            Self::PaddingTooWide { padding, width } => write!(
                f,
                "obstacle padding {padding} leaves no hitbox inside width {width}"
            ),
            Self::EmptyGapRange { min, max } => {
                write!(f, "gap offset range is empty: [{min}, {max}]")
            }
            Self::NameLength { len, max } => {
                write!(f, "max_name_len {len} must be between 1 and {max}")
            }
        }
    }
}

impl std::error::Error for TuningError {}
