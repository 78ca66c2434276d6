//! Error types surfaced to callers of the simulator

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    /// Build requested for an archetype name nobody registered
    #[error("unknown archetype `{0}`")]
    UnknownArchetype(String),

    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    /// Rejected at the parameter boundary before anything is rebuilt
    #[error("invalid value {value} for `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f32,
        reason: &'static str,
    },

    #[error("settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
