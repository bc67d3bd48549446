//! Error types for the collision world

use thiserror::Error;

/// Collision world errors
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// Landscape or object mesh is malformed
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Invalid configuration
    #[error("Invalid physics configuration: {0}")]
    InvalidConfig(String),

    /// Shape creation failed
    #[error("Failed to create collision shape: {0}")]
    ShapeCreationFailed(String),
}

/// Result type for physics operations
pub type Result<T> = std::result::Result<T, PhysicsError>;
