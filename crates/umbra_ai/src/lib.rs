//! Umbra AI - actors, perception, action queue and script states
//!
//! Everything a non-player character needs to act on its own: attributes
//! and inventory, the active perception scheduler, the FIFO of queued AI
//! actions, the scripted state machine with daily routines, and movement
//! resolution against the collision world.
//!
//! # Features
//!
//! - Per-actor perception tables with throttled active passes
//! - Action queue progressed once per tick, strictly in order
//! - Init / loop / end script states and time-of-day routines
//! - Single-shot death and knock-out handling
//! - Walk, fall, slide, swim, dive and climb resolution
//! - Scripting VM behind the [`ScriptHost`] trait
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Actor                     │
//! │  ┌───────────┐ ┌────────────┐ ┌───────────┐  │
//! │  │ Movement  │ │ Perception │ │ Attributes│  │
//! │  └─────┬─────┘ └─────┬──────┘ └───────────┘  │
//! │        │             │ calls                 │
//! │  ┌─────┴─────┐ ┌─────┴──────┐ ┌───────────┐  │
//! │  │ Collision │ │ ScriptHost │◄┤ StateMach │  │
//! │  │   World   │ └─────┬──────┘ └───────────┘  │
//! │  └───────────┘       │ commands              │
//! │                ┌─────┴──────┐                │
//! │                │ ActionQueue│                │
//! │                └────────────┘                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use umbra_ai::prelude::*;
//!
//! let config = AiConfig::default();
//! let mut actor = Actor::new(ActorTemplate::new(ScriptSymbol(12), "Bandit"), &config);
//! actor.attach_body(&mut physics);
//! actor.queue.push(AiAction::GoTo(GoToTarget::Waypoint("CAMP_FIRE".into())));
//!
//! let report = actor.tick(&mut ctx);
//! ```

pub mod action;
pub mod actor;
pub mod attributes;
pub mod cast;
pub mod config;
pub mod error;
pub mod inventory;
pub mod movement;
pub mod perception;
pub mod script;
pub mod state;

pub mod prelude {
    //! Common imports for actor functionality
    pub use crate::action::{ActionQueue, AiAction, GoToTarget, LookTarget};
    pub use crate::actor::{
        Actor, ActorContext, ActorReport, ActorTemplate, Anim, Attitude, HealthEvent, HealthEventKind,
        PassivePerc, ProcessPolicy, WaypointLookup, WeaponState,
    };
    pub use crate::attributes::{Attribute, Attributes, Protection, Talent};
    pub use crate::cast::{CastState, SpellCast};
    pub use crate::config::AiConfig;
    pub use crate::error::AiError;
    pub use crate::inventory::{Inventory, ItemStack};
    pub use crate::movement::{MoveMode, MoveReport, MoveState, Movable, MovementResolver, WalkMode};
    pub use crate::perception::{
        Noise, Observed, Observer, PercType, PerceptionEvent, PerceptionReport, PerceptionTable,
    };
    pub use crate::script::{
        InstanceKind, ScriptCall, ScriptCommand, ScriptError, ScriptHost, ScriptOutcome,
    };
    pub use crate::state::{ActorStateMachine, AiState, NpcState, Routine, StateCall, StateFns};
}

pub use prelude::*;
