//! Trigger dispatcher
//!
//! Owns every trigger volume of a world, resolves event targets by name and
//! tracks which actors stand inside which volume.

use crate::events::{TriggerEffect, TriggerEvent, TriggerEventType};
use crate::filter::{InstigatorKind, ReactFlags};
use crate::trigger::DispatchContext;
use crate::volume::TriggerVolume;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use umbra_core::ActorId;
use umbra_physics::CollisionWorld;

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Upper bound of events processed by one flush; the rest wait
    pub max_events_per_flush: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            max_events_per_flush: 1024,
        }
    }
}

impl TriggerConfig {
    /// Set the per-flush event limit
    pub fn with_max_events_per_flush(mut self, max: usize) -> Self {
        self.max_events_per_flush = max.max(1);
        self
    }
}

/// Trigger volumes of one world plus the pending event queue
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TriggerDispatcher {
    config: TriggerConfig,
    volumes: Vec<TriggerVolume>,
    /// Name to volume indices, rebuilt after loading
    #[serde(skip)]
    names: HashMap<String, Vec<usize>>,
    pending: VecDeque<TriggerEvent>,
    /// Time of the last flush (ms)
    now: u64,
}

impl TriggerDispatcher {
    /// Create an empty dispatcher
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Configuration
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Register a volume; spatial volumes get a ghost body
    pub fn add(&mut self, mut volume: TriggerVolume, physics: &mut CollisionWorld) -> usize {
        volume.attach_body(physics);
        let index = self.volumes.len();
        log::debug!(
            "Registered {} volume '{}' (flags {:#04x})",
            volume.kind().label(),
            volume.name(),
            volume.flags().bits()
        );
        self.names
            .entry(volume.name().to_string())
            .or_default()
            .push(index);
        self.volumes.push(volume);
        index
    }

    /// Remove every volume and hand their bodies back
    pub fn clear(&mut self, physics: &mut CollisionWorld) {
        for volume in &mut self.volumes {
            volume.detach_body(physics);
        }
        self.volumes.clear();
        self.names.clear();
        self.pending.clear();
    }

    /// Number of volumes
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// No volumes registered
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    /// First volume with this name
    pub fn get(&self, name: &str) -> Option<&TriggerVolume> {
        self.names
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&i| &self.volumes[i])
    }

    /// All volumes in registration order
    pub fn volumes(&self) -> impl Iterator<Item = &TriggerVolume> {
        self.volumes.iter()
    }

    /// Events waiting for a flush
    pub fn pending(&self) -> impl Iterator<Item = &TriggerEvent> {
        self.pending.iter()
    }

    /// Time of the last flush (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Run startup behaviour of every volume
    pub fn process_on_start(&mut self, first_time: bool) {
        let mut ctx = DispatchContext::new(self.now);
        for volume in &mut self.volumes {
            (volume.kind().behavior().on_start)(volume, first_time, &mut ctx);
        }
        self.pending.extend(ctx.emitted);
    }

    /// Queue an event for the next flush
    pub fn trigger_event(&mut self, event: TriggerEvent) {
        self.pending.push_back(event);
    }

    /// Process one event right away
    ///
    /// Events forwarded by the receiving volumes are queued for the next
    /// flush; side effects are returned.
    pub fn process_event(&mut self, event: &TriggerEvent) -> Vec<TriggerEffect> {
        let mut ctx = DispatchContext::new(self.now);
        self.dispatch(event, &mut ctx);
        self.pending.extend(ctx.emitted);
        ctx.effects
    }

    /// Process the events that are ready at `now`
    ///
    /// Only events queued before the flush started are considered, in FIFO
    /// order. Events whose barrier lies in the future keep their place.
    pub fn flush(&mut self, now: u64) -> Vec<TriggerEffect> {
        self.now = self.now.max(now);
        let mut ctx = DispatchContext::new(self.now);
        let batch: Vec<TriggerEvent> = self.pending.drain(..).collect();
        let mut deferred = VecDeque::new();
        let mut processed = 0;

        for event in batch {
            if !event.is_ready(self.now) || processed >= self.config.max_events_per_flush {
                deferred.push_back(event);
                continue;
            }
            processed += 1;
            self.dispatch(&event, &mut ctx);
        }

        if processed >= self.config.max_events_per_flush && !deferred.is_empty() {
            log::warn!(
                "Trigger flush hit the limit of {} events, {} deferred",
                self.config.max_events_per_flush,
                deferred.len()
            );
        }

        deferred.extend(ctx.emitted);
        self.pending = deferred;
        ctx.effects
    }

    /// Update touch membership of every ticking volume
    ///
    /// `classify` tells what kind of instigator an actor is; actors it
    /// returns `None` for are ignored.
    pub fn tick<F>(&mut self, physics: &CollisionWorld, classify: F) -> Vec<TriggerEffect>
    where
        F: Fn(ActorId) -> Option<InstigatorKind>,
    {
        let mut ctx = DispatchContext::new(self.now);

        for volume in &mut self.volumes {
            if !volume.is_ticking() {
                continue;
            }
            let Some(body) = volume.body() else {
                continue;
            };
            let flags = volume.flags();
            let inside: Vec<ActorId> = physics
                .ghost_contents(body)
                .into_iter()
                .filter(|&id| classify(id).map(|k| flags.responds_to(k)).unwrap_or(false))
                .collect();

            for &actor in &inside {
                if volume.enter(actor) {
                    log::trace!("{:?} entered '{}'", actor, volume.name());
                    (volume.kind().behavior().on_intersect)(volume, actor, &mut ctx);
                }
            }

            let left: Vec<ActorId> = volume
                .intersect()
                .iter()
                .copied()
                .filter(|id| !inside.contains(id))
                .collect();
            for actor in left {
                volume.leave(actor);
                log::trace!("{:?} left '{}'", actor, volume.name());
                if volume.intersect().is_empty() {
                    (volume.kind().behavior().on_untouch)(volume, Some(actor), &mut ctx);
                }
            }
        }

        self.pending.extend(ctx.emitted);
        ctx.effects
    }

    /// Forget an actor that left the world
    pub fn on_actor_removed(&mut self, actor: ActorId) {
        for volume in &mut self.volumes {
            volume.leave(actor);
        }
    }

    /// Rebuild the name index and ghost bodies after loading
    pub fn restore_bodies(&mut self, physics: &mut CollisionWorld) {
        self.names.clear();
        for (index, volume) in self.volumes.iter_mut().enumerate() {
            volume.attach_body(physics);
            self.names
                .entry(volume.name().to_string())
                .or_default()
                .push(index);
        }
    }

    fn dispatch(&mut self, event: &TriggerEvent, ctx: &mut DispatchContext) {
        let Some(indices) = self.names.get(&event.target) else {
            log::debug!(
                "Trigger event {:?} from '{}' has no target '{}'",
                event.kind,
                event.emitter,
                event.target
            );
            return;
        };

        for &index in indices {
            let volume = &mut self.volumes[index];
            let behavior = volume.kind().behavior();
            let accepts = volume.has_flag(ReactFlags::REACT_TO_ON_TRIGGER);

            match event.kind {
                TriggerEventType::Enable | TriggerEventType::Disable | TriggerEventType::ToggleEnable => {
                    if !accepts {
                        log::debug!("'{}' ignores {:?}", volume.name(), event.kind);
                        continue;
                    }
                    let disabled = match event.kind {
                        TriggerEventType::Enable => false,
                        TriggerEventType::Disable => true,
                        _ => volume.is_enabled(),
                    };
                    volume.set_disabled(disabled);
                }
                TriggerEventType::Trigger | TriggerEventType::Untrigger => {
                    if !accepts || !volume.is_enabled() {
                        log::debug!("'{}' is not accepting {:?}", volume.name(), event.kind);
                        continue;
                    }
                    if event.kind == TriggerEventType::Trigger {
                        (behavior.on_trigger)(volume, event, ctx);
                    } else {
                        (behavior.on_untrigger)(volume, event, ctx);
                    }
                }
                TriggerEventType::Activate => {
                    (behavior.on_trigger)(volume, event, ctx);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::{TriggerKind, TriggerSettings};
    use umbra_physics::{LandscapeMesh, PhysicsConfig};

    fn physics() -> CollisionWorld {
        CollisionWorld::new(PhysicsConfig::default(), &LandscapeMesh::empty()).unwrap()
    }

    fn relay(name: &str, target: &str) -> TriggerVolume {
        TriggerVolume::new(name, TriggerKind::Trigger(TriggerSettings::to(target)))
            .with_flags(ReactFlags::REACT_TO_ON_TRIGGER | ReactFlags::START_ENABLED)
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let mut world = physics();
        let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
        dispatcher.add(relay("a", "b"), &mut world);

        let toggle = TriggerEvent::new("a", "test", TriggerEventType::ToggleEnable);
        dispatcher.process_event(&toggle);
        assert!(!dispatcher.get("a").unwrap().is_enabled());
        dispatcher.process_event(&toggle);
        assert!(dispatcher.get("a").unwrap().is_enabled());
    }

    #[test]
    fn test_enable_requires_react_to_trigger() {
        let mut world = physics();
        let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
        let deaf = TriggerVolume::new("deaf", TriggerKind::Trigger(TriggerSettings::default()))
            .with_flags(ReactFlags::START_ENABLED);
        dispatcher.add(deaf, &mut world);

        dispatcher.process_event(&TriggerEvent::new("deaf", "test", TriggerEventType::Disable));
        assert!(dispatcher.get("deaf").unwrap().is_enabled());
    }

    #[test]
    fn test_activate_ignores_disabled() {
        let mut world = physics();
        let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
        let off = TriggerVolume::new("off", TriggerKind::Trigger(TriggerSettings::default()))
            .with_flags(ReactFlags::REACT_TO_ON_TRIGGER);
        dispatcher.add(off, &mut world);

        dispatcher.process_event(&TriggerEvent::new("off", "test", TriggerEventType::Trigger));
        assert_eq!(dispatcher.get("off").unwrap().emit_count(), 0);
        dispatcher.process_event(&TriggerEvent::new("off", "test", TriggerEventType::Activate));
        assert_eq!(dispatcher.get("off").unwrap().emit_count(), 1);
    }

    #[test]
    fn test_emitted_events_wait_for_next_flush() {
        let mut world = physics();
        let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
        dispatcher.add(relay("a", "b"), &mut world);
        dispatcher.add(relay("b", "c"), &mut world);

        dispatcher.trigger_event(TriggerEvent::new("a", "test", TriggerEventType::Trigger));
        dispatcher.flush(0);
        assert_eq!(dispatcher.get("a").unwrap().emit_count(), 1);
        assert_eq!(dispatcher.get("b").unwrap().emit_count(), 0);

        dispatcher.flush(0);
        assert_eq!(dispatcher.get("b").unwrap().emit_count(), 1);
        // 'c' does not exist; its event is dropped on the next flush
        dispatcher.flush(0);
        assert_eq!(dispatcher.pending().count(), 0);
    }

    #[test]
    fn test_barrier_defers_event() {
        let mut world = physics();
        let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
        dispatcher.add(relay("a", "b"), &mut world);

        dispatcher.trigger_event(TriggerEvent::new("a", "test", TriggerEventType::Trigger).with_barrier(100));
        dispatcher.flush(50);
        assert_eq!(dispatcher.get("a").unwrap().emit_count(), 0);
        assert_eq!(dispatcher.pending().count(), 1);
        dispatcher.flush(100);
        assert_eq!(dispatcher.get("a").unwrap().emit_count(), 1);
    }

    #[test]
    fn test_flush_limit_keeps_order() {
        let mut world = physics();
        let config = TriggerConfig::default().with_max_events_per_flush(1);
        let mut dispatcher = TriggerDispatcher::new(config);
        dispatcher.add(relay("a", "x"), &mut world);

        dispatcher.trigger_event(TriggerEvent::new("a", "first", TriggerEventType::Trigger));
        dispatcher.trigger_event(TriggerEvent::new("a", "second", TriggerEventType::Trigger));
        dispatcher.flush(0);
        assert_eq!(dispatcher.pending().next().unwrap().emitter, "second");
    }
}
