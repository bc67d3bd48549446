//! Trigger kinds and their behaviour table
//!
//! Every volume is one of a closed set of kinds. The dispatcher never matches
//! on the kind itself; it looks up the kind's [`Behavior`] and calls the
//! named operation (`on_trigger`, `on_untrigger`, `on_intersect`,
//! `on_untouch`, `on_start`).

use crate::events::{TriggerEffect, TriggerEvent, TriggerEventType};
use crate::volume::TriggerVolume;
use serde::{Deserialize, Serialize};
use umbra_core::{ActorId, ScriptFn};

/// Scratch state threaded through behaviour calls
pub(crate) struct DispatchContext {
    /// Dispatcher clock (ms)
    pub now: u64,
    /// Events raised for later processing
    pub emitted: Vec<TriggerEvent>,
    /// Effects for the world to apply
    pub effects: Vec<TriggerEffect>,
}

impl DispatchContext {
    pub fn new(now: u64) -> Self {
        Self {
            now,
            emitted: Vec::new(),
            effects: Vec::new(),
        }
    }

    fn forward(&mut self, from: &TriggerVolume, target: &str, kind: TriggerEventType, delay_ms: u64, instigator: Option<ActorId>) {
        let mut evt = TriggerEvent::new(target, from.name(), kind).with_instigator(instigator);
        if delay_ms > 0 {
            evt = evt.with_barrier(self.now + delay_ms);
        }
        self.emitted.push(evt);
    }
}

/// Plain trigger forwarding to a single target
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerSettings {
    /// Downstream target
    pub target: Option<String>,
    /// Delay before the forwarded event is processed
    pub fire_delay_ms: u64,
    /// Stop firing after this many activations
    pub max_activations: Option<u32>,
    /// Minimum time between two activations
    pub retrigger_delay_ms: u64,
    /// Earliest time the next activation is accepted
    next_allowed: u64,
}

impl TriggerSettings {
    /// Forward to `target`
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Default::default()
        }
    }

    /// Delay the forwarded event
    pub fn with_fire_delay(mut self, ms: u64) -> Self {
        self.fire_delay_ms = ms;
        self
    }

    /// Limit activations
    pub fn with_max_activations(mut self, count: u32) -> Self {
        self.max_activations = Some(count);
        self
    }

    /// Minimum time between activations
    pub fn with_retrigger_delay(mut self, ms: u64) -> Self {
        self.retrigger_delay_ms = ms;
        self
    }
}

/// How a list trigger walks its targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListMode {
    /// Fire every target, delays accumulating
    #[default]
    All,
    /// Fire one target per activation, cycling
    NextOne,
}

/// One entry of a list trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTarget {
    /// Target name
    pub name: String,
    /// Delay after the previous entry
    pub delay_ms: u64,
}

/// Trigger forwarding to several targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerList {
    /// Targets in firing order
    pub targets: Vec<ListTarget>,
    /// Walk mode
    pub mode: ListMode,
    /// Next target for `NextOne`
    cursor: usize,
}

impl TriggerList {
    /// Build from `(name, delay)` pairs
    pub fn new(mode: ListMode, targets: impl IntoIterator<Item = (String, u64)>) -> Self {
        Self {
            targets: targets
                .into_iter()
                .map(|(name, delay_ms)| ListTarget { name, delay_ms })
                .collect(),
            mode,
            cursor: 0,
        }
    }
}

/// Event remapping applied by a message filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageAction {
    /// Swallow the event
    #[default]
    Nothing,
    /// Send Trigger
    Trigger,
    /// Send Untrigger
    Untrigger,
    /// Send Enable
    Enable,
    /// Send Disable
    Disable,
    /// Send ToggleEnable
    Toggle,
}

impl MessageAction {
    fn event_type(&self) -> Option<TriggerEventType> {
        match self {
            MessageAction::Nothing => None,
            MessageAction::Trigger => Some(TriggerEventType::Trigger),
            MessageAction::Untrigger => Some(TriggerEventType::Untrigger),
            MessageAction::Enable => Some(TriggerEventType::Enable),
            MessageAction::Disable => Some(TriggerEventType::Disable),
            MessageAction::Toggle => Some(TriggerEventType::ToggleEnable),
        }
    }
}

/// Rewrites incoming Trigger/Untrigger into configured events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageFilter {
    /// Target of the rewritten event
    pub target: String,
    /// Sent when triggered
    pub on_trigger: MessageAction,
    /// Sent when untriggered
    pub on_untrigger: MessageAction,
}

/// Fires its target when the world starts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldStart {
    /// Target
    pub target: String,
    /// Only fire on the very first start of this world
    pub fire_once: bool,
    /// Already fired
    fired: bool,
}

impl WorldStart {
    /// Fire `target` on start
    pub fn new(target: impl Into<String>, fire_once: bool) -> Self {
        Self {
            target: target.into(),
            fire_once,
            fired: false,
        }
    }
}

/// Door, lever or gate with an open/closed state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mover {
    /// Notified with Trigger when opening and Untrigger when closing
    pub target: Option<String>,
    /// Current state
    pub open: bool,
}

/// Closed set of trigger kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TriggerKind {
    /// Plain trigger
    Trigger(TriggerSettings),
    /// Fires several targets
    List(TriggerList),
    /// Runs a script callback
    Script(ScriptFn),
    /// Rewrites events
    MessageFilter(MessageFilter),
    /// Fires on world start
    WorldStart(WorldStart),
    /// Open/close state machine
    Mover(Mover),
}

impl TriggerKind {
    /// Behaviour table entry for this kind
    pub(crate) fn behavior(&self) -> &'static Behavior {
        match self {
            TriggerKind::Trigger(_) => &PLAIN,
            TriggerKind::List(_) => &LIST,
            TriggerKind::Script(_) => &SCRIPT,
            TriggerKind::MessageFilter(_) => &FILTER,
            TriggerKind::WorldStart(_) => &WORLD_START,
            TriggerKind::Mover(_) => &MOVER,
        }
    }

    /// Short name for logging
    pub fn label(&self) -> &'static str {
        match self {
            TriggerKind::Trigger(_) => "trigger",
            TriggerKind::List(_) => "list",
            TriggerKind::Script(_) => "script",
            TriggerKind::MessageFilter(_) => "message-filter",
            TriggerKind::WorldStart(_) => "world-start",
            TriggerKind::Mover(_) => "mover",
        }
    }
}

type EventFn = fn(&mut TriggerVolume, &TriggerEvent, &mut DispatchContext);
type TouchFn = fn(&mut TriggerVolume, ActorId, &mut DispatchContext);
type UntouchFn = fn(&mut TriggerVolume, Option<ActorId>, &mut DispatchContext);
type StartFn = fn(&mut TriggerVolume, bool, &mut DispatchContext);

/// Named operations of one trigger kind
pub(crate) struct Behavior {
    pub on_trigger: EventFn,
    pub on_untrigger: EventFn,
    pub on_intersect: TouchFn,
    pub on_untouch: UntouchFn,
    pub on_start: StartFn,
}

static PLAIN: Behavior = Behavior {
    on_trigger: plain_on_trigger,
    on_untrigger: plain_on_untrigger,
    on_intersect: touch_as_trigger,
    on_untouch: untouch_as_untrigger,
    on_start: no_start,
};

static LIST: Behavior = Behavior {
    on_trigger: list_on_trigger,
    on_untrigger: ignore_event,
    on_intersect: touch_as_trigger,
    on_untouch: untouch_as_untrigger,
    on_start: no_start,
};

static SCRIPT: Behavior = Behavior {
    on_trigger: script_on_trigger,
    on_untrigger: ignore_event,
    on_intersect: touch_as_trigger,
    on_untouch: untouch_as_untrigger,
    on_start: no_start,
};

static FILTER: Behavior = Behavior {
    on_trigger: filter_on_trigger,
    on_untrigger: filter_on_untrigger,
    on_intersect: touch_as_trigger,
    on_untouch: untouch_as_untrigger,
    on_start: no_start,
};

static WORLD_START: Behavior = Behavior {
    on_trigger: ignore_event,
    on_untrigger: ignore_event,
    on_intersect: ignore_touch,
    on_untouch: ignore_untouch,
    on_start: world_start_on_start,
};

static MOVER: Behavior = Behavior {
    on_trigger: mover_on_trigger,
    on_untrigger: mover_on_untrigger,
    on_intersect: touch_as_trigger,
    on_untouch: ignore_untouch,
    on_start: no_start,
};

// ---- shared operations ----

fn ignore_event(_: &mut TriggerVolume, _: &TriggerEvent, _: &mut DispatchContext) {}

fn ignore_touch(_: &mut TriggerVolume, _: ActorId, _: &mut DispatchContext) {}

fn ignore_untouch(_: &mut TriggerVolume, _: Option<ActorId>, _: &mut DispatchContext) {}

fn no_start(_: &mut TriggerVolume, _: bool, _: &mut DispatchContext) {}

fn touch_as_trigger(volume: &mut TriggerVolume, actor: ActorId, ctx: &mut DispatchContext) {
    let evt = TriggerEvent::new(volume.name(), volume.name(), TriggerEventType::Trigger)
        .with_instigator(Some(actor));
    (volume.kind().behavior().on_trigger)(volume, &evt, ctx);
}

fn untouch_as_untrigger(volume: &mut TriggerVolume, last: Option<ActorId>, ctx: &mut DispatchContext) {
    let evt = TriggerEvent::new(volume.name(), volume.name(), TriggerEventType::Untrigger)
        .with_instigator(last);
    (volume.kind().behavior().on_untrigger)(volume, &evt, ctx);
}

// ---- plain trigger ----

fn plain_on_trigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    let emitted = volume.emit_count();
    let TriggerKind::Trigger(settings) = volume.kind_mut() else {
        return;
    };
    if settings.max_activations.map(|max| emitted >= max).unwrap_or(false) {
        return;
    }
    if ctx.now < settings.next_allowed {
        return;
    }
    settings.next_allowed = ctx.now + settings.retrigger_delay_ms;
    let target = settings.target.clone();
    let delay = settings.fire_delay_ms;

    volume.bump_emit_count();
    if let Some(target) = target {
        ctx.forward(volume, &target, TriggerEventType::Trigger, delay, evt.instigator);
    }
}

fn plain_on_untrigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    let TriggerKind::Trigger(settings) = volume.kind() else {
        return;
    };
    if let Some(target) = settings.target.clone() {
        let delay = settings.fire_delay_ms;
        ctx.forward(volume, &target, TriggerEventType::Untrigger, delay, evt.instigator);
    }
}

// ---- list ----

fn list_on_trigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    let TriggerKind::List(list) = volume.kind_mut() else {
        return;
    };
    if list.targets.is_empty() {
        return;
    }

    let mut fire: Vec<(String, u64)> = Vec::new();
    match list.mode {
        ListMode::All => {
            let mut delay = 0;
            for t in &list.targets {
                delay += t.delay_ms;
                fire.push((t.name.clone(), delay));
            }
        }
        ListMode::NextOne => {
            let t = &list.targets[list.cursor % list.targets.len()];
            fire.push((t.name.clone(), t.delay_ms));
            list.cursor = (list.cursor + 1) % list.targets.len();
        }
    }

    volume.bump_emit_count();
    for (target, delay) in fire {
        ctx.forward(volume, &target, TriggerEventType::Trigger, delay, evt.instigator);
    }
}

// ---- script ----

fn script_on_trigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    let TriggerKind::Script(func) = volume.kind() else {
        return;
    };
    let func = *func;
    volume.bump_emit_count();
    ctx.effects.push(TriggerEffect::CallScript {
        volume: volume.name().to_string(),
        func,
        instigator: evt.instigator,
    });
}

// ---- message filter ----

fn filter_forward(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext, untrigger: bool) {
    let TriggerKind::MessageFilter(filter) = volume.kind() else {
        return;
    };
    let action = if untrigger { filter.on_untrigger } else { filter.on_trigger };
    let Some(kind) = action.event_type() else {
        return;
    };
    let target = filter.target.clone();
    volume.bump_emit_count();
    ctx.forward(volume, &target, kind, 0, evt.instigator);
}

fn filter_on_trigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    filter_forward(volume, evt, ctx, false);
}

fn filter_on_untrigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    filter_forward(volume, evt, ctx, true);
}

// ---- world start ----

fn world_start_on_start(volume: &mut TriggerVolume, first_time: bool, ctx: &mut DispatchContext) {
    let TriggerKind::WorldStart(start) = volume.kind_mut() else {
        return;
    };
    if start.fire_once && (start.fired || !first_time) {
        return;
    }
    start.fired = true;
    let target = start.target.clone();

    volume.bump_emit_count();
    ctx.emitted.push(
        TriggerEvent::new(target, volume.name(), TriggerEventType::Trigger).with_startup(true),
    );
}

// ---- mover ----

fn mover_set(volume: &mut TriggerVolume, open: bool, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    let TriggerKind::Mover(mover) = volume.kind_mut() else {
        return;
    };
    if mover.open == open {
        return;
    }
    mover.open = open;
    let target = mover.target.clone();

    volume.bump_emit_count();
    ctx.effects.push(TriggerEffect::MoverChanged {
        volume: volume.name().to_string(),
        open,
    });
    if let Some(target) = target {
        let kind = if open {
            TriggerEventType::Trigger
        } else {
            TriggerEventType::Untrigger
        };
        ctx.forward(volume, &target, kind, 0, evt.instigator);
    }
}

fn mover_on_trigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    let open = matches!(volume.kind(), TriggerKind::Mover(m) if m.open);
    mover_set(volume, !open, evt, ctx);
}

fn mover_on_untrigger(volume: &mut TriggerVolume, evt: &TriggerEvent, ctx: &mut DispatchContext) {
    mover_set(volume, false, evt, ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ReactFlags;

    fn fire(volume: &mut TriggerVolume, ctx: &mut DispatchContext) {
        let evt = TriggerEvent::new(volume.name(), "test", TriggerEventType::Trigger);
        (volume.kind().behavior().on_trigger)(volume, &evt, ctx);
    }

    #[test]
    fn test_plain_forwards_with_delay() {
        let mut v = TriggerVolume::new("plate", TriggerKind::Trigger(TriggerSettings::to("gate").with_fire_delay(250)));
        let mut ctx = DispatchContext::new(1000);
        fire(&mut v, &mut ctx);

        assert_eq!(v.emit_count(), 1);
        assert_eq!(ctx.emitted.len(), 1);
        assert_eq!(ctx.emitted[0].target, "gate");
        assert_eq!(ctx.emitted[0].emitter, "plate");
        assert_eq!(ctx.emitted[0].time_barrier, Some(1250));
    }

    #[test]
    fn test_plain_respects_max_activations() {
        let mut v = TriggerVolume::new("once", TriggerKind::Trigger(TriggerSettings::to("x").with_max_activations(1)));
        let mut ctx = DispatchContext::new(0);
        fire(&mut v, &mut ctx);
        fire(&mut v, &mut ctx);
        assert_eq!(v.emit_count(), 1);
        assert_eq!(ctx.emitted.len(), 1);
    }

    #[test]
    fn test_list_next_one_cycles() {
        let list = TriggerList::new(ListMode::NextOne, vec![("a".to_string(), 0), ("b".to_string(), 0)]);
        let mut v = TriggerVolume::new("cycle", TriggerKind::List(list));
        let mut ctx = DispatchContext::new(0);
        fire(&mut v, &mut ctx);
        fire(&mut v, &mut ctx);
        fire(&mut v, &mut ctx);
        let targets: Vec<&str> = ctx.emitted.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_list_all_accumulates_delays() {
        let list = TriggerList::new(ListMode::All, vec![("a".to_string(), 100), ("b".to_string(), 100)]);
        let mut v = TriggerVolume::new("seq", TriggerKind::List(list));
        let mut ctx = DispatchContext::new(0);
        fire(&mut v, &mut ctx);
        assert_eq!(ctx.emitted[0].time_barrier, Some(100));
        assert_eq!(ctx.emitted[1].time_barrier, Some(200));
    }

    #[test]
    fn test_message_filter_remaps() {
        let filter = MessageFilter {
            target: "torch".to_string(),
            on_trigger: MessageAction::Disable,
            on_untrigger: MessageAction::Nothing,
        };
        let mut v = TriggerVolume::new("f", TriggerKind::MessageFilter(filter));
        let mut ctx = DispatchContext::new(0);
        fire(&mut v, &mut ctx);
        assert_eq!(ctx.emitted[0].kind, TriggerEventType::Disable);

        let evt = TriggerEvent::new("f", "test", TriggerEventType::Untrigger);
        (v.kind().behavior().on_untrigger)(&mut v, &evt, &mut ctx);
        assert_eq!(ctx.emitted.len(), 1);
    }

    #[test]
    fn test_world_start_fire_once() {
        let mut v = TriggerVolume::new("start", TriggerKind::WorldStart(WorldStart::new("intro", true)));
        let mut ctx = DispatchContext::new(0);
        (v.kind().behavior().on_start)(&mut v, false, &mut ctx);
        assert!(ctx.emitted.is_empty());
        (v.kind().behavior().on_start)(&mut v, true, &mut ctx);
        (v.kind().behavior().on_start)(&mut v, true, &mut ctx);
        assert_eq!(ctx.emitted.len(), 1);
        assert!(ctx.emitted[0].world_startup);
    }

    #[test]
    fn test_mover_toggles() {
        let mut v = TriggerVolume::new("door", TriggerKind::Mover(Mover::default()))
            .with_flags(ReactFlags::START_ENABLED);
        let mut ctx = DispatchContext::new(0);
        fire(&mut v, &mut ctx);
        fire(&mut v, &mut ctx);
        assert_eq!(
            ctx.effects,
            vec![
                TriggerEffect::MoverChanged { volume: "door".to_string(), open: true },
                TriggerEffect::MoverChanged { volume: "door".to_string(), open: false },
            ]
        );
    }

    #[test]
    fn test_script_effect_carries_instigator() {
        let mut v = TriggerVolume::new("trap", TriggerKind::Script(ScriptFn(77)));
        let mut ctx = DispatchContext::new(0);
        let actor = ActorId::new(2, 0);
        (v.kind().behavior().on_intersect)(&mut v, actor, &mut ctx);
        assert_eq!(
            ctx.effects,
            vec![TriggerEffect::CallScript { volume: "trap".to_string(), func: ScriptFn(77), instigator: Some(actor) }]
        );
    }
}
