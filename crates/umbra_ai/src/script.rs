//! Boundary to the scripting VM
//!
//! Script callbacks run outside the simulation. A call receives the actors
//! involved and returns a value plus a list of [`ScriptCommand`]s; the
//! calling actor applies those commands once the call has returned, so a
//! script never holds a reference into simulation state.

use crate::action::AiAction;
use crate::actor::{ActorTemplate, Attitude, WeaponState};
use crate::attributes::{Attribute, Protection, Talent};
use crate::movement::WalkMode;
use crate::perception::PercType;
use crate::state::StateFns;
use thiserror::Error;
use umbra_core::{ActorId, ItemSymbol, ScriptFn, ScriptSymbol, TimeOfDay};
use umbra_triggers::TriggerEvent;

/// Script VM errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// No such function in the loaded scripts
    #[error("Unknown script function {0:?}")]
    UnknownFunction(ScriptFn),

    /// No such symbol in the loaded scripts
    #[error("Unknown script symbol '{0}'")]
    UnknownSymbol(String),

    /// Symbol is not an instance that can be spawned
    #[error("Symbol {0:?} cannot be instantiated")]
    NotInstantiable(ScriptSymbol),

    /// The callback raised an error
    #[error("Script function {func:?} failed: {reason}")]
    Failed { func: ScriptFn, reason: String },
}

/// Arguments of a script call: `(self[, other][, victim][, item])`
///
/// Perception callbacks also carry the channel that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptCall {
    pub func: ScriptFn,
    pub self_actor: Option<ActorId>,
    pub other: Option<ActorId>,
    pub victim: Option<ActorId>,
    pub item: Option<ItemSymbol>,
    pub perc: Option<PercType>,
}

impl ScriptCall {
    /// Call `func` with `self` bound to `actor`
    pub fn new(func: ScriptFn, actor: Option<ActorId>) -> Self {
        Self {
            func,
            self_actor: actor,
            other: None,
            victim: None,
            item: None,
            perc: None,
        }
    }

    /// Bind `other`
    pub fn with_other(mut self, other: Option<ActorId>) -> Self {
        self.other = other;
        self
    }

    /// Bind `victim`
    pub fn with_victim(mut self, victim: Option<ActorId>) -> Self {
        self.victim = victim;
        self
    }

    /// Bind `item`
    pub fn with_item(mut self, item: Option<ItemSymbol>) -> Self {
        self.item = item;
        self
    }

    /// Mark as a perception callback for `perc`
    pub fn with_perc(mut self, perc: PercType) -> Self {
        self.perc = Some(perc);
        self
    }
}

/// Change requested by a script for its `self` actor
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    AddRoutine {
        start: TimeOfDay,
        end: TimeOfDay,
        callback: ScriptFn,
        waypoint: Option<String>,
    },
    ClearRoutines,
    ChangeAttribute {
        attribute: Attribute,
        delta: i32,
        allow_unconscious: bool,
    },
    ChangeProtection {
        protection: Protection,
        value: i32,
    },
    SetTalentSkill {
        talent: Talent,
        level: i32,
    },
    PushAction(AiAction),
    ClearAiQueue,
    EnablePerception {
        perc: PercType,
        func: ScriptFn,
    },
    DisablePerception(PercType),
    SetPerceptionTime(u64),
    /// Start a state on the next tick
    StartState {
        func: ScriptFn,
        waypoint: Option<String>,
        no_finalize: bool,
    },
    ClearState {
        no_finalize: bool,
    },
    TriggerEvent(TriggerEvent),
    /// Tell nearby actors about something `self` did
    SendPassivePerc {
        perc: PercType,
        other: Option<ActorId>,
        victim: Option<ActorId>,
    },
    SetTarget(Option<ActorId>),
    SetOther(Option<ActorId>),
    SetVictim(Option<ActorId>),
    SetRefuseTalk(u64),
    SetAttitude(Attitude),
    SetTempAttitude(Attitude),
    SetWalkMode(WalkMode),
    /// Jump from the ground
    Jump,
    /// Climb up to a ledge at this height
    Climb {
        ledge_y: f32,
    },
    /// Dive in deep water, or with `false` come back up to swim
    SetDive(bool),
    SetWeapon(WeaponState),
    /// Bind to (or with `None` leave) an interactive object
    SetInteraction(Option<String>),
    AddItem {
        item: ItemSymbol,
        count: u32,
    },
    RemoveItem {
        item: ItemSymbol,
        count: u32,
    },
    BeginCast {
        invest_levels: u8,
    },
}

/// Return value and side effects of a script call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptOutcome {
    pub ret: i32,
    pub commands: Vec<ScriptCommand>,
}

impl ScriptOutcome {
    /// Outcome with a return value and no commands
    pub fn value(ret: i32) -> Self {
        Self {
            ret,
            commands: Vec::new(),
        }
    }

    /// Add a command
    pub fn with_command(mut self, command: ScriptCommand) -> Self {
        self.commands.push(command);
        self
    }
}

/// What a script symbol instantiates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    Npc,
    Item,
}

/// The scripting VM as seen by the simulation
pub trait ScriptHost {
    /// Run a callback
    fn call(&mut self, call: &ScriptCall) -> Result<ScriptOutcome, ScriptError>;

    /// Loop and end callbacks belonging to a state's init callback
    fn state_functions(&self, init: ScriptFn) -> StateFns {
        StateFns::new(init)
    }

    /// Look up a symbol by name (case-insensitive)
    fn symbol_index(&self, name: &str) -> Option<ScriptSymbol>;

    /// Kind of instance a symbol creates
    fn instance_kind(&self, symbol: ScriptSymbol) -> Option<InstanceKind>;

    /// Create an actor template from an npc instance symbol
    fn create_npc(&mut self, symbol: ScriptSymbol) -> Result<ActorTemplate, ScriptError>;

    /// Item symbol of an item instance
    fn item_symbol(&self, symbol: ScriptSymbol) -> Option<ItemSymbol> {
        match self.instance_kind(symbol) {
            Some(InstanceKind::Item) => Some(ItemSymbol(symbol.0)),
            _ => None,
        }
    }
}
