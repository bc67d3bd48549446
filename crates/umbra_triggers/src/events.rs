//! Trigger events

use serde::{Deserialize, Serialize};
use umbra_core::{ActorId, ScriptFn};

/// Type of trigger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerEventType {
    /// Fire the target's trigger behaviour
    Trigger,
    /// Undo / release the target's trigger behaviour
    Untrigger,
    /// Enable the target
    Enable,
    /// Disable the target
    Disable,
    /// Invert the target's enabled state
    ToggleEnable,
    /// Direct interaction (doors, levers); ignores the enabled state
    Activate,
}

/// A trigger event addressed to a named target
///
/// Pure data: targets are resolved against the dispatcher's registry when
/// the event is processed, not when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    /// Name of the volume(s) receiving the event
    pub target: String,
    /// Name of the emitting volume or script
    pub emitter: String,
    /// Event type
    pub kind: TriggerEventType,
    /// Earliest dispatcher time (ms) the event may be processed at
    pub time_barrier: Option<u64>,
    /// Raised by world startup processing
    pub world_startup: bool,
    /// Actor that caused the event, if any
    pub instigator: Option<ActorId>,
}

impl TriggerEvent {
    /// Create an event for immediate processing
    pub fn new(target: impl Into<String>, emitter: impl Into<String>, kind: TriggerEventType) -> Self {
        Self {
            target: target.into(),
            emitter: emitter.into(),
            kind,
            time_barrier: None,
            world_startup: false,
            instigator: None,
        }
    }

    /// Delay processing until the dispatcher clock reaches `time`
    pub fn with_barrier(mut self, time: u64) -> Self {
        self.time_barrier = Some(time);
        self
    }

    /// Mark as raised by world startup
    pub fn with_startup(mut self, startup: bool) -> Self {
        self.world_startup = startup;
        self
    }

    /// Attach the causing actor
    pub fn with_instigator(mut self, instigator: Option<ActorId>) -> Self {
        self.instigator = instigator;
        self
    }

    /// Whether the event may run at dispatcher time `now`
    pub fn is_ready(&self, now: u64) -> bool {
        self.time_barrier.map(|t| t <= now).unwrap_or(true)
    }
}

/// Side effect of trigger processing that the world has to carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEffect {
    /// Run a script callback with the instigator as `self`
    CallScript {
        /// Volume that requested the call
        volume: String,
        /// Callback
        func: ScriptFn,
        /// Actor that caused it
        instigator: Option<ActorId>,
    },
    /// A mover (door, lever, gate) changed state
    MoverChanged {
        /// Mover volume name
        volume: String,
        /// New state
        open: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_barrier() {
        let evt = TriggerEvent::new("gate", "lever", TriggerEventType::Trigger).with_barrier(500);
        assert!(!evt.is_ready(499));
        assert!(evt.is_ready(500));
        assert!(TriggerEvent::new("gate", "lever", TriggerEventType::Trigger).is_ready(0));
    }
}
