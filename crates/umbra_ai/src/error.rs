//! Error types for actors and AI

use crate::script::ScriptError;
use thiserror::Error;
use umbra_core::ActorId;

/// Actor and AI errors
#[derive(Debug, Error)]
pub enum AiError {
    /// Script callback failed
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Referenced actor no longer exists
    #[error("Actor {0:?} does not exist")]
    StaleActor(ActorId),

    /// Attribute index out of range
    #[error("Invalid attribute index {0}")]
    InvalidAttribute(u8),

    /// Perception type out of range
    #[error("Invalid perception type {0}")]
    InvalidPerception(u8),

    /// Protection index out of range
    #[error("Invalid protection index {0}")]
    InvalidProtection(u8),

    /// Invalid configuration
    #[error("Invalid AI configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
