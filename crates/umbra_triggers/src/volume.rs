//! Trigger volumes

use crate::filter::ReactFlags;
use crate::trigger::TriggerKind;
use serde::{Deserialize, Serialize};
use umbra_core::ActorId;
use umbra_physics::{CollisionWorld, PhysicalBody};

/// A named world object reacting to trigger events and, optionally, to
/// actors touching its bounding volume
#[derive(Debug, Serialize, Deserialize)]
pub struct TriggerVolume {
    /// Name other objects address events to
    name: String,
    /// Axis-aligned bounds; volumes without bounds only react to events
    bounds: Option<([f32; 3], [f32; 3])>,
    /// Reaction flags
    flags: ReactFlags,
    /// Disabled volumes ignore Trigger/Untrigger and touch
    disabled: bool,
    /// Actors currently inside, in entry order, without duplicates
    intersect: Vec<ActorId>,
    /// Number of times the volume fired
    emit_count: u32,
    /// Kind-specific behaviour and state
    kind: TriggerKind,
    /// Ghost body, recreated from `bounds` after loading
    #[serde(skip)]
    body: Option<PhysicalBody>,
}

impl TriggerVolume {
    /// Create an event-only volume. Without flags it starts disabled.
    pub fn new(name: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            name: name.into(),
            bounds: None,
            flags: ReactFlags::empty(),
            disabled: true,
            intersect: Vec::new(),
            emit_count: 0,
            kind,
            body: None,
        }
    }

    /// Set reaction flags; `START_ENABLED` seeds the enabled state
    pub fn with_flags(mut self, flags: ReactFlags) -> Self {
        self.flags = flags;
        self.disabled = !flags.contains(ReactFlags::START_ENABLED);
        self
    }

    /// Give the volume a spatial extent
    pub fn with_bounds(mut self, min: [f32; 3], max: [f32; 3]) -> Self {
        self.bounds = Some((min, max));
        self
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reaction flags
    pub fn flags(&self) -> ReactFlags {
        self.flags
    }

    /// Check a reaction flag
    pub fn has_flag(&self, flag: ReactFlags) -> bool {
        self.flags.contains(flag)
    }

    /// Enabled state
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Bounds, if spatial
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        self.bounds
    }

    /// Whether the volume has a registered ghost body
    pub fn has_volume(&self) -> bool {
        self.body.is_some()
    }

    /// Actors currently inside
    pub fn intersect(&self) -> &[ActorId] {
        &self.intersect
    }

    /// Times fired
    pub fn emit_count(&self) -> u32 {
        self.emit_count
    }

    /// Kind and its state
    pub fn kind(&self) -> &TriggerKind {
        &self.kind
    }

    /// Registered for per-tick membership tests
    pub fn is_ticking(&self) -> bool {
        !self.disabled && self.body.is_some() && self.flags.contains(ReactFlags::REACT_TO_ON_TOUCH)
    }

    /// Whether a world point lies inside the volume; event-only volumes
    /// contain nothing
    pub fn contains_point(&self, physics: &CollisionWorld, point: [f32; 3]) -> bool {
        self.body
            .as_ref()
            .map(|body| physics.contains_point(body, point))
            .unwrap_or(false)
    }

    pub(crate) fn kind_mut(&mut self) -> &mut TriggerKind {
        &mut self.kind
    }

    pub(crate) fn bump_emit_count(&mut self) {
        self.emit_count = self.emit_count.saturating_add(1);
    }

    pub(crate) fn body(&self) -> Option<&PhysicalBody> {
        self.body.as_ref()
    }

    pub(crate) fn set_disabled(&mut self, disabled: bool) {
        if disabled && !self.disabled && !self.intersect.is_empty() {
            log::debug!("Trigger '{}' disabled with {} actors inside", self.name, self.intersect.len());
            self.intersect.clear();
        }
        self.disabled = disabled;
    }

    /// Add to the intersect set; false if already inside
    pub(crate) fn enter(&mut self, actor: ActorId) -> bool {
        if self.intersect.contains(&actor) {
            return false;
        }
        self.intersect.push(actor);
        true
    }

    /// Remove from the intersect set; false if it was not inside
    pub(crate) fn leave(&mut self, actor: ActorId) -> bool {
        let before = self.intersect.len();
        self.intersect.retain(|&a| a != actor);
        self.intersect.len() != before
    }

    /// Create the ghost body for a spatial volume
    pub(crate) fn attach_body(&mut self, physics: &mut CollisionWorld) {
        if self.body.is_some() {
            return;
        }
        if let Some((min, max)) = self.bounds {
            self.body = Some(physics.create_ghost(min, max));
        }
    }

    /// Hand the ghost body back to the collision world
    pub(crate) fn detach_body(&mut self, physics: &mut CollisionWorld) {
        if let Some(body) = self.body.take() {
            physics.destroy(body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerSettings;

    #[test]
    fn test_start_enabled_seeds_state() {
        let on = TriggerVolume::new("a", TriggerKind::Trigger(TriggerSettings::default()))
            .with_flags(ReactFlags::START_ENABLED | ReactFlags::REACT_TO_ON_TRIGGER);
        assert!(on.is_enabled());

        let off = TriggerVolume::new("b", TriggerKind::Trigger(TriggerSettings::default()))
            .with_flags(ReactFlags::REACT_TO_ON_TRIGGER);
        assert!(!off.is_enabled());
    }

    #[test]
    fn test_intersect_has_no_duplicates() {
        let mut v = TriggerVolume::new("a", TriggerKind::Trigger(TriggerSettings::default()));
        let id = ActorId::new(1, 0);
        assert!(v.enter(id));
        assert!(!v.enter(id));
        assert_eq!(v.intersect().len(), 1);
        assert!(v.leave(id));
        assert!(!v.leave(id));
        assert!(v.intersect().is_empty());
    }

    #[test]
    fn test_disable_clears_intersect() {
        let mut v = TriggerVolume::new("a", TriggerKind::Trigger(TriggerSettings::default()))
            .with_flags(ReactFlags::START_ENABLED);
        v.enter(ActorId::new(1, 0));
        v.set_disabled(true);
        assert!(v.intersect().is_empty());
    }
}
