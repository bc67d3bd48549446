//! AI action queue
//!
//! Scripts push actions; the owning actor progresses the front action once
//! per tick and pops it when it completes.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use umbra_core::{ActorId, ItemSymbol, ScriptFn};

/// Navigation destination of an actor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum GoToTarget {
    /// Not navigating
    #[default]
    None,
    /// Named waypoint of the way net
    Waypoint(String),
    /// Another actor
    Actor(ActorId),
    /// Fixed point
    Point([f32; 3]),
    /// An item lying in the world
    Item {
        symbol: ItemSymbol,
        position: [f32; 3],
    },
}

impl GoToTarget {
    /// No destination
    pub fn is_none(&self) -> bool {
        matches!(self, GoToTarget::None)
    }

    /// Actor referenced by the target
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            GoToTarget::Actor(id) => Some(*id),
            _ => None,
        }
    }
}

/// What a look-at action turns towards
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LookTarget {
    Actor(ActorId),
    Point([f32; 3]),
}

/// One queued AI action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiAction {
    /// Turn towards a target
    LookAt(LookTarget),
    /// Walk to a target
    GoTo(GoToTarget),
    /// Play a named animation to its end
    PlayAnim(String),
    /// Do nothing for a while
    Wait(u64),
    /// Speak a dialogue line
    Output {
        /// Line identifier
        line: String,
        /// How long the line takes
        duration_ms: u64,
    },
    /// Start a script state once the actions before it are done
    StartState {
        func: ScriptFn,
        waypoint: Option<String>,
    },
}

impl AiAction {
    /// Short name for logging
    pub fn label(&self) -> &'static str {
        match self {
            AiAction::LookAt(_) => "look-at",
            AiAction::GoTo(_) => "go-to",
            AiAction::PlayAnim(_) => "play-anim",
            AiAction::Wait(_) => "wait",
            AiAction::Output { .. } => "output",
            AiAction::StartState { .. } => "start-state",
        }
    }

    /// Actor referenced by the action
    pub fn actor(&self) -> Option<ActorId> {
        match self {
            AiAction::LookAt(LookTarget::Actor(id)) => Some(*id),
            AiAction::GoTo(target) => target.actor(),
            _ => None,
        }
    }
}

/// FIFO of pending actions plus the progress of the front one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionQueue {
    items: VecDeque<AiAction>,
    /// Deadline of the front action once it started
    deadline: Option<u64>,
}

impl ActionQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action
    pub fn push(&mut self, action: AiAction) {
        self.items.push_back(action);
    }

    /// Action being progressed
    pub fn front(&self) -> Option<&AiAction> {
        self.items.front()
    }

    /// Complete the front action
    pub fn pop(&mut self) -> Option<AiAction> {
        self.deadline = None;
        self.items.pop_front()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.items.clear();
        self.deadline = None;
    }

    /// Number of queued actions
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Nothing queued
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Queued actions, front first
    pub fn iter(&self) -> impl Iterator<Item = &AiAction> {
        self.items.iter()
    }

    /// Deadline of the front action
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Start timing the front action; keeps an existing deadline
    pub fn start_timer(&mut self, deadline: u64) -> u64 {
        *self.deadline.get_or_insert(deadline)
    }

    /// Drop actions that reference `actor`
    pub fn forget_actor(&mut self, actor: ActorId) {
        let front_hit = self.items.front().and_then(AiAction::actor) == Some(actor);
        self.items.retain(|a| a.actor() != Some(actor));
        if front_hit {
            self.deadline = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = ActionQueue::new();
        queue.push(AiAction::Wait(1));
        queue.push(AiAction::PlayAnim("t_stand_2_sit".into()));
        assert_eq!(queue.pop(), Some(AiAction::Wait(1)));
        assert_eq!(queue.pop(), Some(AiAction::PlayAnim("t_stand_2_sit".into())));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_timer_survives_until_pop() {
        let mut queue = ActionQueue::new();
        queue.push(AiAction::Wait(100));
        assert_eq!(queue.start_timer(100), 100);
        assert_eq!(queue.start_timer(500), 100);
        queue.pop();
        assert_eq!(queue.deadline(), None);
    }

    #[test]
    fn test_forget_actor() {
        let gone = ActorId::new(4, 1);
        let mut queue = ActionQueue::new();
        queue.push(AiAction::GoTo(GoToTarget::Actor(gone)));
        queue.push(AiAction::Wait(10));
        queue.push(AiAction::LookAt(LookTarget::Actor(gone)));
        queue.start_timer(50);
        queue.forget_actor(gone);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.deadline(), None);
    }
}
