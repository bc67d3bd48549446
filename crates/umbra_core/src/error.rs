//! Error types for the core primitives

use crate::id::ActorId;
use thiserror::Error;

/// Core errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// All registry indices are in use
    #[error("Actor registry exhausted")]
    RegistryExhausted,

    /// The id does not name a live actor
    #[error("Stale actor id: {0:?}")]
    StaleId(ActorId),

    /// Restoring into a slot that is already taken
    #[error("Actor slot already occupied: {0:?}")]
    SlotOccupied(ActorId),

    /// Restoring into a slot the saved layout does not have
    #[error("Actor slot out of range: {0:?}")]
    SlotOutOfRange(ActorId),

    /// Time value outside of a day
    #[error("Invalid time of day {hour}:{minute:02}")]
    InvalidTimeOfDay { hour: u32, minute: u32 },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
