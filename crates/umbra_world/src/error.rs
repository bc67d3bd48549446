//! Error types for the world

use crate::config::ConfigError;
use crate::save::SaveError;
use thiserror::Error;
use umbra_ai::{AiError, ScriptError};
use umbra_core::{ActorId, CoreError};
use umbra_physics::PhysicsError;

/// World errors
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("Physics error: {0}")]
    Physics(#[from] PhysicsError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    /// Referenced actor no longer exists
    #[error("Actor {0:?} does not exist")]
    StaleActor(ActorId),

    /// Waypoint missing from the way net
    #[error("Unknown waypoint '{0}'")]
    UnknownWaypoint(String),
}

/// Result type for world operations
pub type Result<T> = std::result::Result<T, WorldError>;
