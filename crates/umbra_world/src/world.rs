//! The world and its tick
//!
//! Per tick, in this order:
//!
//! ```text
//! clock -> animation handoff -> collision world -> actors (registration order)
//!       -> passive perceptions -> trigger membership -> trigger flush
//! ```

use crate::config::SimConfig;
use crate::error::{Result, WorldError};
use crate::handoff::{AnimCatalog, Handoff};
use crate::waynet::WayNet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use umbra_ai::perception::dist_sq;
use umbra_ai::{
    Actor, ActorContext, ActorReport, ActorTemplate, Attribute, HealthEvent, InstanceKind, Observed,
    PassivePerc, PercType, ProcessPolicy, ScriptCall, ScriptCommand, ScriptHost,
};
use umbra_core::{ActorId, ActorRegistry, GameTime, ItemSymbol, ScriptFn, ScriptSymbol, TimeOfDay};
use umbra_physics::{CollisionWorld, LandscapeMesh};
use umbra_triggers::{InstigatorKind, TriggerDispatcher, TriggerEffect, TriggerEvent, TriggerVolume};

/// An item lying in the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldItem {
    pub symbol: ItemSymbol,
    pub position: [f32; 3],
}

/// Simulation and game clocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldClock {
    /// Milliseconds simulated since the world was created
    pub sim_ms: u64,
    /// Game calendar time
    pub game: GameTime,
    /// Ticks run so far
    pub tick: u64,
    /// Length of the last tick
    pub last_dt: u64,
    /// Fraction of a game millisecond carried to the next tick
    carry: f64,
}

impl WorldClock {
    /// Clock starting at `game`
    pub fn new(game: GameTime) -> Self {
        Self {
            game,
            ..Default::default()
        }
    }

    fn advance(&mut self, dt_ms: u64, time_scale: f32) {
        self.sim_ms += dt_ms;
        self.tick += 1;
        self.last_dt = dt_ms;
        let scaled = dt_ms as f64 * time_scale as f64 + self.carry;
        let whole = scaled.floor();
        self.carry = scaled - whole;
        self.game.advance(whole as u64);
    }
}

/// A level with its actors, trigger volumes and clocks
pub struct World {
    pub(crate) config: SimConfig,
    pub(crate) physics: CollisionWorld,
    pub(crate) actors: ActorRegistry<Actor>,
    pub(crate) triggers: TriggerDispatcher,
    pub(crate) script: Box<dyn ScriptHost>,
    pub(crate) way_net: WayNet,
    pub(crate) clock: WorldClock,
    pub(crate) player: Option<ActorId>,
    pub(crate) items: Vec<WorldItem>,
    pub(crate) movers: HashMap<String, bool>,
    anims: AnimCatalog,
    anim_feed: Handoff<AnimCatalog>,
    /// Passive perceptions raised during the actor pass
    passive: Vec<PassivePerc>,
    health_events: Vec<HealthEvent>,
}

impl World {
    /// Create an empty world on top of `landscape`
    pub fn new(config: SimConfig, landscape: &LandscapeMesh, script: Box<dyn ScriptHost>) -> Result<Self> {
        config.validate()?;
        let physics = CollisionWorld::new(config.physics.clone(), landscape)?;
        let triggers = TriggerDispatcher::new(config.triggers.clone());
        let clock = WorldClock::new(config.start_time.game_time());
        log::info!("World created at {}", clock.game);

        Ok(Self {
            config,
            physics,
            actors: ActorRegistry::new(),
            triggers,
            script,
            way_net: WayNet::new(),
            clock,
            player: None,
            items: Vec::new(),
            movers: HashMap::new(),
            anims: AnimCatalog::new(),
            anim_feed: Handoff::new(),
            passive: Vec::new(),
            health_events: Vec::new(),
        })
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn physics(&self) -> &CollisionWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut CollisionWorld {
        &mut self.physics
    }

    pub fn triggers(&self) -> &TriggerDispatcher {
        &self.triggers
    }

    pub fn way_net(&self) -> &WayNet {
        &self.way_net
    }

    pub fn way_net_mut(&mut self) -> &mut WayNet {
        &mut self.way_net
    }

    pub fn clock(&self) -> &WorldClock {
        &self.clock
    }

    pub fn game_time(&self) -> GameTime {
        self.clock.game
    }

    pub fn sim_ms(&self) -> u64 {
        self.clock.sim_ms
    }

    /// Producer side of the animation catalog handoff
    pub fn anim_feed(&self) -> Handoff<AnimCatalog> {
        self.anim_feed.clone()
    }

    /// Catalog in use
    pub fn anim_catalog(&self) -> &AnimCatalog {
        &self.anims
    }

    /// Script host
    pub fn script_mut(&mut self) -> &mut dyn ScriptHost {
        self.script.as_mut()
    }

    /// Items lying around
    pub fn items(&self) -> &[WorldItem] {
        &self.items
    }

    /// Last known state of a mover volume
    pub fn mover_state(&self, name: &str) -> Option<bool> {
        self.movers.get(name).copied()
    }

    /// Health events since the last call
    pub fn take_health_events(&mut self) -> Vec<HealthEvent> {
        std::mem::take(&mut self.health_events)
    }

    // ==================== Clock ====================

    /// Jump the game clock to `hour:minute`, rolling over to the next day
    /// if that time has already passed today
    pub fn set_day_time(&mut self, hour: u32, minute: u32) -> Result<()> {
        let tod = TimeOfDay::try_new(hour, minute)?;
        self.clock.game = self.clock.game.with_time_of_day(tod);
        log::debug!("Clock set to {}", self.clock.game);
        Ok(())
    }

    /// Change the game clock speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }

    // ==================== Actors ====================

    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Option<&mut Actor> {
        self.actors.get_mut(id)
    }

    /// Live actors in registration order
    pub fn actor_ids(&self) -> &[ActorId] {
        self.actors.ids()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn player(&self) -> Option<ActorId> {
        self.player
    }

    /// Spawn an actor standing at `position`
    ///
    /// Runs the daily routine callback right away; the start state begins
    /// on the actor's first tick.
    pub fn add_actor(&mut self, template: ActorTemplate, position: [f32; 3]) -> Result<ActorId> {
        let start_state = template.start_state;
        let waypoint = template.waypoint.clone();
        let mut actor = Actor::new(template, &self.config.ai);
        actor.position = position;
        let daily_routine = actor.daily_routine;

        let id = self.actors.insert(actor)?;
        if let Some(actor) = self.actors.get_mut(id) {
            actor.set_id(id, &mut self.physics);
            actor.attach_body(&mut self.physics);
            log::debug!("Spawned {:?} '{}' at {:?}", id, actor.name, position);
        }

        if let Some(routine) = daily_routine {
            self.call_actor_script(id, routine);
        }
        if let Some(start) = start_state {
            if let Some(actor) = self.actors.get_mut(id) {
                actor.state.request(start, waypoint, None, false);
            }
        }
        Ok(id)
    }

    /// Spawn an actor at its template's waypoint
    pub fn add_actor_at_waypoint(&mut self, template: ActorTemplate) -> Result<ActorId> {
        let name = template.waypoint.clone().unwrap_or_default();
        let position = self
            .way_net
            .get(&name)
            .ok_or(WorldError::UnknownWaypoint(name))?;
        self.add_actor(template, position)
    }

    /// Spawn an npc or drop an item by script symbol name
    pub fn insert_by_symbol_name(&mut self, name: &str, at: [f32; 3]) -> bool {
        let Some(symbol) = self.script.symbol_index(name) else {
            log::debug!("No script symbol '{}'", name);
            return false;
        };
        match self.script.instance_kind(symbol) {
            Some(InstanceKind::Npc) => self.insert_npc(symbol, at).is_ok(),
            Some(InstanceKind::Item) => match self.script.item_symbol(symbol) {
                Some(item) => {
                    self.add_item(item, at);
                    true
                }
                None => false,
            },
            None => false,
        }
    }

    fn insert_npc(&mut self, symbol: ScriptSymbol, at: [f32; 3]) -> Result<ActorId> {
        let template = self.script.create_npc(symbol).map_err(|e| {
            log::warn!("Cannot create npc {:?}: {}", symbol, e);
            e
        })?;
        self.add_actor(template, at)
    }

    /// Remove an actor; every reference to it is dropped
    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        let mut actor = self.actors.remove(id)?;
        actor.detach_body(&mut self.physics);
        for (_, other) in self.actors.iter_mut() {
            other.forget_actor(id);
        }
        self.triggers.on_actor_removed(id);
        self.passive.retain(|p| p.source != id);
        if self.player == Some(id) {
            self.player = None;
        }
        log::debug!("Removed {:?} '{}'", id, actor.name);
        Some(actor)
    }

    /// Make `id` the player character
    pub fn set_player(&mut self, id: ActorId) -> Result<()> {
        if !self.actors.contains(id) {
            return Err(WorldError::StaleActor(id));
        }
        if let Some(previous) = self.player.and_then(|p| self.actors.get_mut(p)) {
            previous.is_player = false;
            previous.policy = ProcessPolicy::AiNormal;
        }
        if let Some(actor) = self.actors.get_mut(id) {
            actor.is_player = true;
            actor.policy = ProcessPolicy::Player;
        }
        self.player = Some(id);
        Ok(())
    }

    /// First actor created from `instance`
    pub fn find_actor_by_instance(&self, instance: ScriptSymbol) -> Option<ActorId> {
        self.actors
            .iter()
            .find(|(_, a)| a.instance == instance)
            .map(|(id, _)| id)
    }

    /// Change an attribute of an actor from outside the tick
    pub fn change_attribute(
        &mut self,
        id: ActorId,
        attribute: Attribute,
        delta: i32,
        allow_unconscious: bool,
        attacker: Option<ActorId>,
    ) -> Result<Option<HealthEvent>> {
        let actor = self.actors.get_mut(id).ok_or(WorldError::StaleActor(id))?;
        let event = actor.change_attribute(attribute, delta, allow_unconscious, attacker, &self.config.ai);
        if let Some(event) = event {
            actor.set_collision(&mut self.physics, false);
            self.health_events.push(event);
        }
        Ok(event)
    }

    /// Deliver a passive perception from `source` to every actor in range
    /// with the channel enabled, returning how many received it
    pub fn send_passive_perc(
        &mut self,
        source: ActorId,
        perc: PercType,
        other: Option<ActorId>,
        victim: Option<ActorId>,
    ) -> usize {
        let Some(origin) = self.actors.get(source).map(|a| a.position) else {
            return 0;
        };
        let range_sq = self.config.ai.passive_range * self.config.ai.passive_range;
        let receivers: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|(id, a)| {
                *id != source && !a.is_down() && a.perception.has(perc) && dist_sq(a.position, origin) <= range_sq
            })
            .map(|(id, _)| id)
            .collect();

        let snapshot = self.snapshot();
        let other = other.or(Some(source));
        let mut delivered = 0;
        for id in receivers {
            let sent = self.with_actor(id, &snapshot, |actor, ctx| {
                let mut report = ActorReport::default();
                actor.perceive(perc, other, victim, ctx, &mut report);
                report
            });
            if sent {
                delivered += 1;
            }
        }
        delivered
    }

    // ==================== Items and triggers ====================

    /// Drop an item into the world
    pub fn add_item(&mut self, symbol: ItemSymbol, position: [f32; 3]) {
        self.items.push(WorldItem { symbol, position });
    }

    /// Register a trigger volume
    pub fn add_trigger(&mut self, volume: TriggerVolume) -> usize {
        self.triggers.add(volume, &mut self.physics)
    }

    /// Whether the named trigger volume contains `point`; `None` for unknown names
    pub fn trigger_contains(&self, name: &str, point: [f32; 3]) -> Option<bool> {
        self.triggers.get(name).map(|v| v.contains_point(&self.physics, point))
    }

    /// Queue a trigger event for the next flush
    pub fn trigger_event(&mut self, event: TriggerEvent) {
        self.triggers.trigger_event(event);
    }

    /// Run startup behaviour of the trigger volumes
    pub fn start(&mut self, first_time: bool) {
        self.triggers.process_on_start(first_time);
        let effects = self.triggers.flush(self.clock.sim_ms);
        self.apply_trigger_effects(effects);
    }

    // ==================== Tick ====================

    /// Advance the world by `dt_ms` of simulation time
    pub fn tick(&mut self, dt_ms: u64) {
        self.clock.advance(dt_ms, self.config.time_scale);

        if let Some(catalog) = self.anim_feed.take() {
            log::debug!("Animation catalog updated ({} entries)", catalog.len());
            self.anims = catalog;
        }

        self.physics.tick(dt_ms);
        self.update_policies();

        let snapshot = self.snapshot();
        let ids = self.actors.ids().to_vec();
        for id in ids {
            self.with_actor(id, &snapshot, |actor, ctx| actor.tick(ctx));
        }

        for p in std::mem::take(&mut self.passive) {
            self.send_passive_perc(p.source, p.perc, p.other, p.victim);
        }

        let actors = &self.actors;
        let effects = self.triggers.tick(&self.physics, |id| {
            actors.get(id).filter(|a| !a.is_down()).map(|a| {
                if a.is_player {
                    InstigatorKind::Player
                } else {
                    InstigatorKind::Npc
                }
            })
        });
        self.apply_trigger_effects(effects);

        let effects = self.triggers.flush(self.clock.sim_ms);
        self.apply_trigger_effects(effects);
    }

    /// What every actor looks like to the others right now
    fn snapshot(&self) -> Vec<Observed> {
        self.actors
            .iter()
            .map(|(_, a)| a.observed(&self.config.ai))
            .collect()
    }

    fn update_policies(&mut self) {
        let Some(origin) = self.player.and_then(|p| self.actors.get(p)).map(|a| a.position) else {
            return;
        };
        let near_sq = self.config.ai.near_range * self.config.ai.near_range;
        let far_sq = self.config.ai.far_range * self.config.ai.far_range;
        for (id, actor) in self.actors.iter_mut() {
            if Some(id) == self.player {
                continue;
            }
            let d = dist_sq(actor.position, origin);
            actor.policy = if d <= near_sq {
                ProcessPolicy::AiNormal
            } else if d <= far_sq {
                ProcessPolicy::AiFar
            } else {
                ProcessPolicy::AiFar2
            };
        }
    }

    /// Check an actor out, run `f` on it and fold the report into the world
    fn with_actor<F>(&mut self, id: ActorId, others: &[Observed], f: F) -> bool
    where
        F: FnOnce(&mut Actor, &mut ActorContext<'_>) -> ActorReport,
    {
        let Some(mut actor) = self.actors.take(id) else {
            log::debug!("{:?} is gone, skipping", id);
            return false;
        };
        let report = {
            let mut ctx = ActorContext {
                physics: &mut self.physics,
                script: self.script.as_mut(),
                config: &self.config.ai,
                now: self.clock.game,
                sim_ms: self.clock.sim_ms,
                dt_ms: self.clock.last_dt,
                others,
                waypoints: &self.way_net,
                anim_durations: self.anims.durations(),
            };
            f(&mut actor, &mut ctx)
        };
        self.actors.restore(id, actor);
        self.absorb(report);
        true
    }

    fn absorb(&mut self, report: ActorReport) {
        for event in report.health {
            log::info!("{:?} {:?} (attacker {:?})", event.actor, event.kind, event.attacker);
            self.health_events.push(event);
        }
        for event in report.trigger_events {
            self.triggers.trigger_event(event);
        }
        self.passive.extend(report.passive);
    }

    fn call_actor_script(&mut self, id: ActorId, func: ScriptFn) {
        let snapshot = self.snapshot();
        self.with_actor(id, &snapshot, |actor, ctx| {
            let mut report = ActorReport::default();
            actor.call_script(ScriptCall::new(func, Some(actor.id())), ctx, &mut report);
            report
        });
    }

    fn apply_trigger_effects(&mut self, effects: Vec<TriggerEffect>) {
        for effect in effects {
            match effect {
                TriggerEffect::CallScript {
                    volume,
                    func,
                    instigator,
                } => match instigator.filter(|id| self.actors.contains(*id)) {
                    Some(id) => self.call_actor_script(id, func),
                    None => self.call_detached_script(&volume, func),
                },
                TriggerEffect::MoverChanged { volume, open } => {
                    log::debug!("Mover '{}' {}", volume, if open { "opened" } else { "closed" });
                    self.movers.insert(volume, open);
                }
            }
        }
    }

    /// Trigger script without an actor to run as; only trigger events apply
    fn call_detached_script(&mut self, volume: &str, func: ScriptFn) {
        match self.script.call(&ScriptCall::new(func, None)) {
            Ok(outcome) => {
                for command in outcome.commands {
                    match command {
                        ScriptCommand::TriggerEvent(event) => self.triggers.trigger_event(event),
                        other => log::debug!("'{}': {:?} needs a self actor, ignored", volume, other),
                    }
                }
            }
            Err(err) => log::warn!("Trigger '{}': {}", volume, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_ai::{ScriptError, ScriptOutcome, StateFns};
    use umbra_physics::SurfaceMaterial;

    struct Silent;

    impl ScriptHost for Silent {
        fn call(&mut self, _call: &ScriptCall) -> std::result::Result<ScriptOutcome, ScriptError> {
            Ok(ScriptOutcome::default())
        }

        fn state_functions(&self, init: ScriptFn) -> StateFns {
            StateFns::new(init)
        }

        fn symbol_index(&self, _name: &str) -> Option<ScriptSymbol> {
            None
        }

        fn instance_kind(&self, _symbol: ScriptSymbol) -> Option<InstanceKind> {
            None
        }

        fn create_npc(&mut self, symbol: ScriptSymbol) -> std::result::Result<ActorTemplate, ScriptError> {
            Err(ScriptError::NotInstantiable(symbol))
        }
    }

    fn flat_world(config: SimConfig) -> World {
        let mesh = LandscapeMesh::empty().with_quad([-100.0, -100.0], [100.0, 100.0], 0.0, SurfaceMaterial::Earth);
        World::new(config, &mesh, Box::new(Silent)).unwrap()
    }

    #[test]
    fn test_clock_scales_game_time() {
        let mut world = flat_world(SimConfig::default().with_time_scale(2.5).with_start_time(0, 0, 0));
        world.tick(10);
        world.tick(10);
        assert_eq!(world.sim_ms(), 20);
        assert_eq!(world.game_time().millis(), 50);
        assert_eq!(world.clock().tick, 2);
    }

    #[test]
    fn test_set_day_time_rolls_over() {
        let mut world = flat_world(SimConfig::default().with_start_time(1, 20, 0));
        world.set_day_time(6, 30).unwrap();
        assert_eq!(world.game_time(), GameTime::from_day_time(2, 6, 30));
        assert!(world.set_day_time(24, 0).is_err());
    }

    #[test]
    fn test_remove_actor_drops_references() {
        let mut world = flat_world(SimConfig::default());
        let a = world
            .add_actor(ActorTemplate::new(ScriptSymbol(1), "Diego"), [0.0, 0.0, 0.0])
            .unwrap();
        let b = world
            .add_actor(ActorTemplate::new(ScriptSymbol(2), "Bandit"), [3.0, 0.0, 0.0])
            .unwrap();
        world.actor_mut(a).unwrap().target = Some(b);

        assert!(world.remove_actor(b).is_some());
        assert_eq!(world.actor(a).unwrap().target, None);
        assert!(world.actor(b).is_none());
        assert_eq!(world.actor_ids(), &[a]);
    }

    #[test]
    fn test_policies_follow_player_distance() {
        let mut world = flat_world(SimConfig::default());
        let player = world
            .add_actor(ActorTemplate::new(ScriptSymbol(1), "Hero"), [0.0, 0.0, 0.0])
            .unwrap();
        let far = world
            .add_actor(ActorTemplate::new(ScriptSymbol(2), "Scavenger"), [90.0, 0.0, 0.0])
            .unwrap();
        world.set_player(player).unwrap();
        world.tick(16);
        assert_eq!(world.actor(player).unwrap().policy, ProcessPolicy::Player);
        assert_eq!(world.actor(far).unwrap().policy, ProcessPolicy::AiFar);
    }
}
