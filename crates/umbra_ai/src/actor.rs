//! Actors and their per-tick update
//!
//! An [`Actor`] owns every per-NPC component: collision body, attributes,
//! perception table, action queue, script state machine and movement state.
//! [`Actor::tick`] advances them in a fixed order:
//!
//! ```text
//! movement -> perception -> regeneration / cast -> front action or state
//! ```
//!
//! Script callbacks never touch the actor directly. Their commands are
//! applied after the call returns, and anything that concerns other actors
//! or the trigger system is handed back in the [`ActorReport`].

use crate::action::{ActionQueue, AiAction, GoToTarget, LookTarget};
use crate::attributes::{Attribute, Attributes};
use crate::cast::SpellCast;
use crate::config::AiConfig;
use crate::inventory::Inventory;
use crate::movement::{MoveMode, MoveReport, MoveState, Movable, MovementResolver, WalkMode};
use crate::perception::{Noise, Observed, Observer, PercType, PerceptionTable};
use crate::script::{ScriptCall, ScriptCommand, ScriptHost};
use crate::state::{ActorStateMachine, NpcState, Routine, StateCall};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::{PI, TAU};
use umbra_core::{ActorId, GameTime, ScriptFn, ScriptSymbol};
use umbra_physics::{CollisionWorld, PhysicalBody};
use umbra_triggers::TriggerEvent;

/// Attitude towards another party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Attitude {
    Hostile = 0,
    Angry = 1,
    #[default]
    Neutral = 2,
    Friendly = 3,
}

/// How much of the update an actor receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessPolicy {
    /// The player character
    Player,
    /// Full update
    #[default]
    AiNormal,
    /// No active perception
    AiFar,
    /// No perception and no movement
    AiFar2,
}

/// Weapon currently in hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponState {
    #[default]
    NoWeapon,
    Fist,
    Melee,
    Ranged,
    Magic,
}

/// Animation an actor is playing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Anim {
    #[default]
    Idle,
    Move,
    Jump,
    Fall,
    Slide,
    Swim,
    Dive,
    Climb,
    Death,
    Unconscious,
    Talk,
    /// Scripted animation by name
    Named(String),
}

impl Anim {
    /// Animations that movement does not override
    fn is_pinned(&self) -> bool {
        matches!(self, Anim::Death | Anim::Unconscious | Anim::Talk | Anim::Named(_))
    }
}

/// Everything needed to create an actor from a script instance
#[derive(Debug, Clone, PartialEq)]
pub struct ActorTemplate {
    pub instance: ScriptSymbol,
    pub name: String,
    pub attributes: Attributes,
    pub height: f32,
    pub radius: f32,
    pub attitude: Attitude,
    /// Waypoint the actor is spawned at
    pub waypoint: Option<String>,
    /// State started right after spawning
    pub start_state: Option<ScriptFn>,
    /// Callback filling in the routine list
    pub daily_routine: Option<ScriptFn>,
}

impl ActorTemplate {
    /// Human-sized template with 10 hitpoints
    pub fn new(instance: ScriptSymbol, name: impl Into<String>) -> Self {
        Self {
            instance,
            name: name.into(),
            attributes: Attributes::new(10, 0),
            height: 1.8,
            radius: 0.4,
            attitude: Attitude::Neutral,
            waypoint: None,
            start_state: None,
            daily_routine: None,
        }
    }

    /// Replace the attributes
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set the spawn waypoint
    pub fn at_waypoint(mut self, waypoint: impl Into<String>) -> Self {
        self.waypoint = Some(waypoint.into());
        self
    }

    /// Set the start state and daily routine callbacks
    pub fn with_behavior(mut self, start_state: Option<ScriptFn>, daily_routine: Option<ScriptFn>) -> Self {
        self.start_state = start_state;
        self.daily_routine = daily_routine;
        self
    }
}

/// Why an actor ran out of hitpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthEventKind {
    Died,
    KnockedOut,
}

/// Emitted once when hitpoints reach zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthEvent {
    pub actor: ActorId,
    pub kind: HealthEventKind,
    pub attacker: Option<ActorId>,
}

/// A passive perception an actor sends to the actors around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassivePerc {
    pub source: ActorId,
    pub perc: PercType,
    pub other: Option<ActorId>,
    pub victim: Option<ActorId>,
}

/// Named positions go-to actions can resolve
pub trait WaypointLookup {
    fn waypoint(&self, name: &str) -> Option<[f32; 3]>;
}

impl WaypointLookup for HashMap<String, [f32; 3]> {
    fn waypoint(&self, name: &str) -> Option<[f32; 3]> {
        self.get(name).copied()
    }
}

/// World state an actor sees during its update
pub struct ActorContext<'a> {
    pub physics: &'a mut CollisionWorld,
    pub script: &'a mut dyn ScriptHost,
    pub config: &'a AiConfig,
    /// Game clock (routines, state end times)
    pub now: GameTime,
    /// Simulation clock (perception, action and cast deadlines)
    pub sim_ms: u64,
    pub dt_ms: u64,
    /// Snapshot of all actors taken at the start of the actor pass
    pub others: &'a [Observed],
    pub waypoints: &'a dyn WaypointLookup,
    /// Animation lengths by name
    pub anim_durations: &'a HashMap<String, u64>,
}

/// Side effects of an actor update the world has to deal with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActorReport {
    pub movement: Option<MoveReport>,
    pub health: Vec<HealthEvent>,
    pub trigger_events: Vec<TriggerEvent>,
    pub passive: Vec<PassivePerc>,
    /// Actions that completed, in order
    pub completed: Vec<AiAction>,
    /// Script calls that failed and were skipped
    pub script_errors: usize,
}

/// A simulated character
#[derive(Debug, Serialize, Deserialize)]
pub struct Actor {
    id: ActorId,
    pub instance: ScriptSymbol,
    pub name: String,
    /// Feet position
    pub position: [f32; 3],
    /// Heading around Y in radians
    pub yaw: f32,
    pub height: f32,
    pub radius: f32,
    #[serde(skip)]
    body: Option<PhysicalBody>,

    pub attributes: Attributes,
    pub inventory: Inventory,
    pub perception: PerceptionTable,
    pub state: ActorStateMachine,
    pub queue: ActionQueue,
    pub cast: SpellCast,
    pub movement: MoveState,
    npc_state: NpcState,

    /// Current navigation destination
    pub go_to: GoToTarget,
    /// Interactive object in use
    pub interaction: Option<String>,
    pub nearest_enemy: Option<ActorId>,
    pub target: Option<ActorId>,
    pub other: Option<ActorId>,
    pub victim: Option<ActorId>,

    pub anim: Anim,
    /// Dialogue line being spoken
    pub output: Option<String>,
    pub weapon: WeaponState,
    drawing_weapon: bool,
    pub attitude: Attitude,
    pub temp_attitude: Attitude,
    refuse_talk_until: u64,
    pub policy: ProcessPolicy,
    pub is_player: bool,
    pub daily_routine: Option<ScriptFn>,
}

impl Actor {
    /// Create an actor from a template; it has no id or body yet
    pub fn new(template: ActorTemplate, config: &AiConfig) -> Self {
        Self {
            id: ActorId::new(u32::MAX, 0),
            instance: template.instance,
            name: template.name,
            position: [0.0; 3],
            yaw: 0.0,
            height: template.height,
            radius: template.radius,
            body: None,
            attributes: template.attributes,
            inventory: Inventory::new(),
            perception: PerceptionTable::new(config.perception_time_ms),
            state: ActorStateMachine::new(),
            queue: ActionQueue::new(),
            cast: SpellCast::default(),
            movement: MoveState::default(),
            npc_state: NpcState::Invalid,
            go_to: GoToTarget::None,
            interaction: None,
            nearest_enemy: None,
            target: None,
            other: None,
            victim: None,
            anim: Anim::Idle,
            output: None,
            weapon: WeaponState::NoWeapon,
            drawing_weapon: false,
            attitude: template.attitude,
            temp_attitude: template.attitude,
            refuse_talk_until: 0,
            policy: ProcessPolicy::AiNormal,
            is_player: false,
            daily_routine: template.daily_routine,
        }
    }

    /// Handle assigned by the registry
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Bind the registry handle; also tags the body with it
    pub fn set_id(&mut self, id: ActorId, physics: &mut CollisionWorld) {
        self.id = id;
        if let Some(body) = &self.body {
            physics.set_owner(body, Some(id));
        }
    }

    /// Collision body
    pub fn physical_body(&self) -> Option<&PhysicalBody> {
        self.body.as_ref()
    }

    /// Create the collision capsule at the current position
    ///
    /// Used on spawn and after loading a save. Actors that are down get a
    /// disabled body.
    pub fn attach_body(&mut self, physics: &mut CollisionWorld) {
        if let Some(old) = self.body.take() {
            physics.destroy(old);
        }
        let body = physics.create_actor(self.height, self.radius, self.position, Some(self.id));
        if self.is_down() {
            physics.set_enabled(&body, false);
        }
        self.body = Some(body);
    }

    /// Remove the collision capsule
    pub fn detach_body(&mut self, physics: &mut CollisionWorld) {
        if let Some(body) = self.body.take() {
            physics.destroy(body);
        }
    }

    /// Teleport, keeping the body in sync
    pub fn teleport(&mut self, pos: [f32; 3], physics: &mut CollisionWorld) {
        self.position = pos;
        self.movement.vertical_speed = 0.0;
        if let Some(body) = &self.body {
            physics.set_position(body, pos);
        }
    }

    // ==================== Health ====================

    /// Special state visible to scripts
    pub fn npc_state(&self) -> NpcState {
        self.npc_state
    }

    pub fn is_dead(&self) -> bool {
        self.npc_state == NpcState::Dead
    }

    pub fn is_unconscious(&self) -> bool {
        self.npc_state == NpcState::Unconscious
    }

    /// Dead or unconscious
    pub fn is_down(&self) -> bool {
        self.is_dead() || self.is_unconscious()
    }

    /// Change an attribute, clamped to its bounds
    ///
    /// Returns a [`HealthEvent`] when hitpoints drop to zero from above,
    /// including through a lowered `HitpointsMax`. With `allow_unconscious`
    /// the actor is knocked out and keeps one hitpoint (if the maximum
    /// allows it) instead of dying. The caller disables the body.
    pub fn change_attribute(
        &mut self,
        attribute: Attribute,
        delta: i32,
        allow_unconscious: bool,
        attacker: Option<ActorId>,
        config: &AiConfig,
    ) -> Option<HealthEvent> {
        let before = self.attributes.get(Attribute::Hitpoints);
        self.attributes.change(attribute, delta);
        let after = self.attributes.get(Attribute::Hitpoints);
        if before <= 0 || after > 0 {
            return None;
        }
        let death = !allow_unconscious || self.is_unconscious();
        if !death {
            self.attributes.set(Attribute::Hitpoints, 1);
        }
        Some(self.on_no_health(death, attacker, config))
    }

    fn on_no_health(&mut self, death: bool, attacker: Option<ActorId>, config: &AiConfig) -> HealthEvent {
        log::debug!(
            "{:?} ({}) {}",
            self.id,
            self.name,
            if death { "died" } else { "was knocked out" }
        );
        self.clear_ai_queue();
        self.interaction = None;
        self.cast.abort();
        self.weapon = WeaponState::NoWeapon;
        self.npc_state = if death { NpcState::Dead } else { NpcState::Unconscious };
        self.anim = if death { Anim::Death } else { Anim::Unconscious };
        let state = if death { config.death_state } else { config.unconscious_state };
        match state {
            Some(func) => self.state.request(func, None, None, false),
            None => self.state.request_clear(false),
        }
        HealthEvent {
            actor: self.id,
            kind: if death {
                HealthEventKind::Died
            } else {
                HealthEventKind::KnockedOut
            },
            attacker,
        }
    }

    /// Wake up from being unconscious
    pub fn revive(&mut self, physics: &mut CollisionWorld) {
        if !self.is_unconscious() {
            return;
        }
        self.npc_state = NpcState::Invalid;
        self.anim = Anim::Idle;
        self.set_collision(physics, true);
    }

    /// Enable or disable the body's collision
    pub fn set_collision(&self, physics: &mut CollisionWorld, enabled: bool) {
        if let Some(body) = &self.body {
            physics.set_enabled(body, enabled);
        }
    }

    // ==================== AI queue ====================

    /// Drop all queued actions and stop moving
    pub fn clear_ai_queue(&mut self) {
        self.queue.clear();
        self.reset_motion();
    }

    fn reset_motion(&mut self) {
        self.go_to = GoToTarget::None;
        self.movement.stop();
        self.output = None;
        if !matches!(self.anim, Anim::Death | Anim::Unconscious) {
            self.anim = Anim::Idle;
        }
    }

    /// Refuse dialogue for `ms` of simulation time
    pub fn set_refuse_talk(&mut self, ms: u64, now: u64) {
        self.refuse_talk_until = now + ms;
    }

    pub fn is_refuse_talk(&self, now: u64) -> bool {
        now < self.refuse_talk_until
    }

    /// Drop every reference to an actor that no longer exists
    pub fn forget_actor(&mut self, id: ActorId) {
        for slot in [&mut self.nearest_enemy, &mut self.target, &mut self.other, &mut self.victim] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        if self.go_to.actor() == Some(id) {
            self.go_to = GoToTarget::None;
            self.movement.stop();
        }
        self.queue.forget_actor(id);
    }

    /// Forget every referenced actor `is_live` rejects
    pub fn retain_references(&mut self, is_live: impl Fn(ActorId) -> bool) {
        let referenced: Vec<ActorId> = [self.nearest_enemy, self.target, self.other, self.victim, self.go_to.actor()]
            .into_iter()
            .flatten()
            .chain(self.queue.iter().filter_map(AiAction::actor))
            .collect();
        for id in referenced {
            if !is_live(id) {
                self.forget_actor(id);
            }
        }
    }

    // ==================== Movement ====================

    /// Start a jump; false unless standing on ground and able to move
    pub fn jump(&mut self, config: &AiConfig) -> bool {
        if self.is_down() {
            return false;
        }
        self.movement.jump(config.jump_speed, self.position[1])
    }

    /// Start climbing onto a ledge; false if the ledge is below the feet,
    /// out of reach, or the actor is not on the ground
    pub fn climb(&mut self, ledge_y: f32, config: &AiConfig) -> bool {
        let rise = ledge_y - self.position[1];
        if self.is_down() || rise <= 0.0 || rise > config.max_climb_height {
            return false;
        }
        self.movement.climb(ledge_y)
    }

    /// Dive or surface; only has an effect in deep water
    pub fn set_dive(&mut self, dive: bool) {
        self.movement.dive = dive;
    }

    // ==================== Derived queries ====================

    pub fn is_jump_anim(&self) -> bool {
        self.anim == Anim::Jump
    }

    pub fn is_fly_anim(&self) -> bool {
        matches!(self.anim, Anim::Jump | Anim::Fall)
    }

    pub fn is_falling(&self) -> bool {
        self.movement.mode == MoveMode::Fall
    }

    pub fn is_slide(&self) -> bool {
        self.movement.mode == MoveMode::Slide
    }

    pub fn is_in_air(&self) -> bool {
        self.movement.is_in_air()
    }

    pub fn is_standing(&self) -> bool {
        self.movement.mode == MoveMode::Stand
    }

    pub fn is_swim(&self) -> bool {
        self.movement.mode == MoveMode::Swim
    }

    pub fn is_dive(&self) -> bool {
        self.movement.mode == MoveMode::Dive
    }

    pub fn is_casting(&self) -> bool {
        self.cast.is_casting()
    }

    /// Whether this actor treats `other` as an enemy
    pub fn is_hostile_to(&self, other: &Observed) -> bool {
        (other.is_player && self.temp_attitude == Attitude::Hostile) || self.target == Some(other.id)
    }

    /// Eye position
    pub fn eye(&self, config: &AiConfig) -> [f32; 3] {
        [
            self.position[0],
            self.position[1] + self.height * config.eye_height,
            self.position[2],
        ]
    }

    /// Snapshot others perceive this actor through
    pub fn observed(&self, config: &AiConfig) -> Observed {
        let weapon_drawn = self.weapon != WeaponState::NoWeapon;
        let noise = if weapon_drawn && self.target.is_some() {
            Noise::Fight
        } else if self.movement.walk_mode == WalkMode::Sneak && self.movement.mode == MoveMode::Move {
            Noise::Quiet
        } else {
            Noise::Silent
        };
        Observed {
            id: self.id,
            position: self.position,
            eye: self.eye(config),
            is_player: self.is_player,
            hostile: false,
            dead: self.is_dead(),
            weapon_drawn,
            drawing_weapon: self.drawing_weapon,
            casting: self.is_casting(),
            noise,
            target: self.target,
        }
    }

    /// This actor as a perceiver
    pub fn observer(&self, config: &AiConfig) -> Observer {
        Observer {
            id: self.id,
            position: self.position,
            eye: self.eye(config),
            yaw: self.yaw,
        }
    }

    // ==================== Update ====================

    /// Advance the actor by one tick
    pub fn tick(&mut self, ctx: &mut ActorContext<'_>) -> ActorReport {
        let mut report = ActorReport::default();

        if self.policy != ProcessPolicy::AiFar2 {
            let moved = MovementResolver::tick(self, ctx.physics, ctx.config, ctx.dt_ms);
            self.sync_anim(moved.mode);
            report.movement = Some(moved);
        }

        if matches!(self.policy, ProcessPolicy::AiNormal) && !self.is_down() {
            self.run_perception(ctx, &mut report);
        }
        self.drawing_weapon = false;

        if !self.is_dead() {
            self.attributes.tick_regen(ctx.dt_ms);
        }
        if let Some(step) = self.cast.tick(ctx.sim_ms, ctx.config.cast_step_ms) {
            log::trace!("{:?} cast step {:?}", self.id, step);
        }

        if self.queue.is_empty() {
            let follow_routine = !self.is_down();
            let script = &*ctx.script;
            let calls = self
                .state
                .plan_tick(ctx.now, follow_routine, |f| script.state_functions(f));
            for call in calls {
                self.run_state_call(call, ctx, &mut report);
            }
        } else {
            self.progress_action(ctx, &mut report);
        }

        report
    }

    /// Deliver a passive perception; false if the channel is disabled
    pub fn perceive(
        &mut self,
        perc: PercType,
        other: Option<ActorId>,
        victim: Option<ActorId>,
        ctx: &mut ActorContext<'_>,
        report: &mut ActorReport,
    ) -> bool {
        let Some(func) = self.perception.get(perc) else {
            return false;
        };
        if self.is_down() {
            return false;
        }
        let call = ScriptCall::new(func, Some(self.id))
            .with_other(other)
            .with_victim(victim)
            .with_perc(perc);
        self.call_script(call, ctx, report);
        true
    }

    /// Run a script callback with `self` bound to this actor and apply
    /// its commands; `None` if the call failed
    pub fn call_script(
        &mut self,
        call: ScriptCall,
        ctx: &mut ActorContext<'_>,
        report: &mut ActorReport,
    ) -> Option<i32> {
        match ctx.script.call(&call) {
            Ok(outcome) => {
                for command in outcome.commands {
                    self.apply_command(command, ctx, report);
                }
                Some(outcome.ret)
            }
            Err(err) => {
                log::warn!("{:?} ({}): {}", self.id, self.name, err);
                report.script_errors += 1;
                None
            }
        }
    }

    fn sync_anim(&mut self, mode: MoveMode) {
        if self.anim.is_pinned() {
            return;
        }
        self.anim = match mode {
            MoveMode::Stand => Anim::Idle,
            MoveMode::Move => Anim::Move,
            MoveMode::Jump => Anim::Jump,
            MoveMode::Fall => Anim::Fall,
            MoveMode::Slide => Anim::Slide,
            MoveMode::Swim => Anim::Swim,
            MoveMode::Dive => Anim::Dive,
            MoveMode::Climb => Anim::Climb,
        };
    }

    fn run_perception(&mut self, ctx: &mut ActorContext<'_>, report: &mut ActorReport) {
        let observer = self.observer(ctx.config);
        let candidates: Vec<Observed> = ctx
            .others
            .iter()
            .map(|o| Observed {
                hostile: self.is_hostile_to(o),
                ..*o
            })
            .collect();
        let result = self
            .perception
            .process(&observer, &candidates, ctx.physics, ctx.config, ctx.sim_ms);
        if result.nearest_enemy.is_some() {
            self.nearest_enemy = result.nearest_enemy;
        }
        for event in result.events {
            log::trace!("{:?} perceives {:?} ({:?})", self.id, event.other, event.perc);
            let call = ScriptCall::new(event.func, Some(self.id))
                .with_other(event.other)
                .with_victim(event.victim)
                .with_perc(event.perc);
            self.call_script(call, ctx, report);
        }
    }

    fn run_state_call(&mut self, call: StateCall, ctx: &mut ActorContext<'_>, report: &mut ActorReport) {
        let (StateCall::Init(func) | StateCall::Loop(func) | StateCall::End(func)) = call;
        let script_call = ScriptCall::new(func, Some(self.id))
            .with_other(self.other)
            .with_victim(self.victim);
        let ret = self.call_script(script_call, ctx, report);
        if let (StateCall::Loop(_), Some(ret)) = (call, ret) {
            // the loop may have replaced the state it belongs to
            if self.state.is_state_loop(func) {
                if let Some(end) = self.state.on_loop_return(ret) {
                    self.run_state_call(end, ctx, report);
                }
            }
        }
    }

    fn progress_action(&mut self, ctx: &mut ActorContext<'_>, report: &mut ActorReport) {
        let Some(action) = self.queue.front().cloned() else {
            return;
        };
        let done = match &action {
            AiAction::LookAt(target) => match self.look_target(target, ctx) {
                Some(point) => self.turn_towards(point, ctx.config, ctx.dt_ms),
                None => true,
            },
            AiAction::GoTo(target) => self.step_go_to(target, ctx),
            AiAction::PlayAnim(name) => {
                let duration = ctx
                    .anim_durations
                    .get(name)
                    .copied()
                    .unwrap_or(ctx.config.default_anim_ms);
                let deadline = self.queue.start_timer(ctx.sim_ms + duration);
                self.anim = Anim::Named(name.clone());
                ctx.sim_ms >= deadline
            }
            AiAction::Wait(ms) => {
                let deadline = self.queue.start_timer(ctx.sim_ms + ms);
                ctx.sim_ms >= deadline
            }
            AiAction::Output { line, duration_ms } => {
                let deadline = self.queue.start_timer(ctx.sim_ms + duration_ms);
                self.output = Some(line.clone());
                self.anim = Anim::Talk;
                ctx.sim_ms >= deadline
            }
            AiAction::StartState { func, waypoint } => {
                self.state.request(*func, waypoint.clone(), None, false);
                true
            }
        };
        if !done {
            return;
        }

        self.queue.pop();
        if matches!(
            action,
            AiAction::GoTo(_) | AiAction::PlayAnim(_) | AiAction::Output { .. }
        ) {
            self.reset_motion();
        }
        log::trace!("{:?} finished {}", self.id, action.label());
        report.completed.push(action);
    }

    fn look_target(&self, target: &LookTarget, ctx: &ActorContext<'_>) -> Option<[f32; 3]> {
        match target {
            LookTarget::Point(p) => Some(*p),
            LookTarget::Actor(id) => ctx.others.iter().find(|o| o.id == *id).map(|o| o.position),
        }
    }

    fn turn_towards(&mut self, point: [f32; 3], config: &AiConfig, dt_ms: u64) -> bool {
        let dx = point[0] - self.position[0];
        let dz = point[2] - self.position[2];
        if dx * dx + dz * dz < 1e-6 {
            return true;
        }
        let goal = dx.atan2(dz);
        let diff = wrap_angle(goal - self.yaw);
        let step = config.turn_speed_deg.to_radians() * dt_ms as f32 / 1000.0;
        if diff.abs() <= step {
            self.yaw = goal;
            true
        } else {
            self.yaw = wrap_angle(self.yaw + step * diff.signum());
            false
        }
    }

    fn step_go_to(&mut self, target: &GoToTarget, ctx: &ActorContext<'_>) -> bool {
        let dest = match target {
            GoToTarget::None => None,
            GoToTarget::Waypoint(name) => ctx.waypoints.waypoint(name),
            GoToTarget::Actor(id) => ctx.others.iter().find(|o| o.id == *id).map(|o| o.position),
            GoToTarget::Point(p) => Some(*p),
            GoToTarget::Item { position, .. } => Some(*position),
        };
        let Some(dest) = dest else {
            log::debug!("{:?} cannot resolve go-to target {:?}", self.id, target);
            return true;
        };

        self.go_to = target.clone();
        let dx = dest[0] - self.position[0];
        let dz = dest[2] - self.position[2];
        if (dx * dx + dz * dz).sqrt() <= ctx.config.arrive_distance {
            self.movement.stop();
            return true;
        }
        self.movement.set_direction([dx, 0.0, dz]);
        self.yaw = dx.atan2(dz);
        false
    }

    fn apply_command(&mut self, command: ScriptCommand, ctx: &mut ActorContext<'_>, report: &mut ActorReport) {
        match command {
            ScriptCommand::AddRoutine {
                start,
                end,
                callback,
                waypoint,
            } => self.state.add_routine(Routine {
                start,
                end,
                callback,
                waypoint,
            }),
            ScriptCommand::ClearRoutines => self.state.clear_routines(),
            ScriptCommand::ChangeAttribute {
                attribute,
                delta,
                allow_unconscious,
            } => {
                let attacker = self.other;
                if let Some(event) = self.change_attribute(attribute, delta, allow_unconscious, attacker, ctx.config) {
                    self.set_collision(ctx.physics, false);
                    report.health.push(event);
                }
            }
            ScriptCommand::ChangeProtection { protection, value } => {
                self.attributes.change_protection(protection, value)
            }
            ScriptCommand::SetTalentSkill { talent, level } => self.attributes.set_talent_skill(talent, level),
            ScriptCommand::PushAction(action) => {
                if self.is_down() {
                    log::debug!("{:?} is down, dropping {}", self.id, action.label());
                } else {
                    self.queue.push(action);
                }
            }
            ScriptCommand::ClearAiQueue => self.clear_ai_queue(),
            ScriptCommand::EnablePerception { perc, func } => self.perception.set_enabled(perc, func),
            ScriptCommand::DisablePerception(perc) => self.perception.set_disabled(perc),
            ScriptCommand::SetPerceptionTime(ms) => self.perception.set_perception_time(ms),
            ScriptCommand::StartState {
                func,
                waypoint,
                no_finalize,
            } => self.state.request(func, waypoint, None, no_finalize),
            ScriptCommand::ClearState { no_finalize } => {
                self.reset_motion();
                if let Some(call) = self.state.clear_state(no_finalize) {
                    self.run_state_call(call, ctx, report);
                }
            }
            ScriptCommand::TriggerEvent(event) => {
                let instigator = event.instigator.or(Some(self.id));
                report.trigger_events.push(event.with_instigator(instigator));
            }
            ScriptCommand::SendPassivePerc { perc, other, victim } => report.passive.push(PassivePerc {
                source: self.id,
                perc,
                other,
                victim,
            }),
            ScriptCommand::SetTarget(id) => self.target = id,
            ScriptCommand::SetOther(id) => self.other = id,
            ScriptCommand::SetVictim(id) => self.victim = id,
            ScriptCommand::SetRefuseTalk(ms) => self.set_refuse_talk(ms, ctx.sim_ms),
            ScriptCommand::SetAttitude(attitude) => {
                self.attitude = attitude;
                self.temp_attitude = attitude;
            }
            ScriptCommand::SetTempAttitude(attitude) => self.temp_attitude = attitude,
            ScriptCommand::SetWalkMode(mode) => self.movement.walk_mode = mode,
            ScriptCommand::Jump => {
                if !self.jump(ctx.config) {
                    log::debug!("{:?} cannot jump while {:?}", self.id, self.movement.mode);
                }
            }
            ScriptCommand::Climb { ledge_y } => {
                if !self.climb(ledge_y, ctx.config) {
                    log::debug!("{:?} cannot climb to {}", self.id, ledge_y);
                }
            }
            ScriptCommand::SetDive(dive) => self.set_dive(dive),
            ScriptCommand::SetWeapon(weapon) => {
                self.drawing_weapon = self.weapon == WeaponState::NoWeapon && weapon != WeaponState::NoWeapon;
                self.weapon = weapon;
            }
            ScriptCommand::SetInteraction(interaction) => self.interaction = interaction,
            ScriptCommand::AddItem { item, count } => self.inventory.add_item(item, count),
            ScriptCommand::RemoveItem { item, count } => {
                self.inventory.remove_item(item, count);
            }
            ScriptCommand::BeginCast { invest_levels } => {
                self.cast.begin(invest_levels, ctx.sim_ms, ctx.config.cast_step_ms);
            }
        }
    }
}

impl Movable for Actor {
    fn position(&self) -> [f32; 3] {
        self.position
    }

    fn set_position(&mut self, pos: [f32; 3]) {
        self.position = pos;
    }

    fn body(&self) -> Option<&PhysicalBody> {
        self.body.as_ref()
    }

    fn move_state(&self) -> &MoveState {
        &self.movement
    }

    fn move_state_mut(&mut self) -> &mut MoveState {
        &mut self.movement
    }

    fn can_move(&self) -> bool {
        !self.is_down()
    }
}

/// Wrap an angle into `[-PI, PI)`
fn wrap_angle(a: f32) -> f32 {
    (a + PI).rem_euclid(TAU) - PI
}
