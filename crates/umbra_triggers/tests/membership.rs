//! Touch membership through the collision world

use umbra_core::ActorId;
use umbra_physics::{CollisionWorld, LandscapeMesh, PhysicsConfig, SurfaceMaterial};
use umbra_triggers::prelude::*;

fn floor() -> CollisionWorld {
    let mesh = LandscapeMesh::empty().with_quad([-20.0, -20.0], [20.0, 20.0], 0.0, SurfaceMaterial::Earth);
    CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap()
}

fn plate() -> TriggerVolume {
    TriggerVolume::new("plate", TriggerKind::Trigger(TriggerSettings::to("gate")))
        .with_flags(
            ReactFlags::REACT_TO_ON_TOUCH
                | ReactFlags::REACT_TO_ON_TRIGGER
                | ReactFlags::RESPOND_TO_PC
                | ReactFlags::START_ENABLED,
        )
        .with_bounds([-1.0, 0.0, -1.0], [1.0, 2.0, 1.0])
}

fn gate() -> TriggerVolume {
    TriggerVolume::new("gate", TriggerKind::Mover(Mover::default()))
        .with_flags(ReactFlags::REACT_TO_ON_TRIGGER | ReactFlags::START_ENABLED)
}

#[test]
fn test_enter_and_leave_restores_membership() {
    let mut physics = floor();
    let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
    dispatcher.add(plate(), &mut physics);
    dispatcher.add(gate(), &mut physics);
    assert!(dispatcher.get("plate").unwrap().is_ticking());

    let player = ActorId::new(0, 0);
    let body = physics.create_actor(1.8, 0.4, [10.0, 0.0, 10.0], Some(player));
    let before = dispatcher.get("plate").unwrap().intersect().len();

    physics.set_position(&body, [0.0, 0.0, 0.0]);
    dispatcher.tick(&physics, |_| Some(InstigatorKind::Player));
    assert_eq!(dispatcher.get("plate").unwrap().intersect(), &[player]);
    assert_eq!(dispatcher.get("plate").unwrap().emit_count(), 1);

    // Staying inside does not fire again
    dispatcher.tick(&physics, |_| Some(InstigatorKind::Player));
    assert_eq!(dispatcher.get("plate").unwrap().emit_count(), 1);

    let effects = dispatcher.flush(0);
    assert_eq!(effects, vec![TriggerEffect::MoverChanged { volume: "gate".to_string(), open: true }]);

    physics.set_position(&body, [10.0, 0.0, 10.0]);
    dispatcher.tick(&physics, |_| Some(InstigatorKind::Player));
    assert_eq!(dispatcher.get("plate").unwrap().intersect().len(), before);

    // The untouch forwarded an Untrigger that closes the gate
    let effects = dispatcher.flush(0);
    assert_eq!(effects, vec![TriggerEffect::MoverChanged { volume: "gate".to_string(), open: false }]);
}

#[test]
fn test_respond_flags_filter_instigators() {
    let mut physics = floor();
    let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
    dispatcher.add(plate(), &mut physics);

    let npc = ActorId::new(3, 0);
    let _body = physics.create_actor(1.8, 0.4, [0.0, 0.0, 0.0], Some(npc));
    dispatcher.tick(&physics, |_| Some(InstigatorKind::Npc));
    assert!(dispatcher.get("plate").unwrap().intersect().is_empty());
}

#[test]
fn test_removed_actor_is_purged() {
    let mut physics = floor();
    let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
    dispatcher.add(plate(), &mut physics);

    let player = ActorId::new(0, 0);
    let body = physics.create_actor(1.8, 0.4, [0.0, 0.0, 0.0], Some(player));
    dispatcher.tick(&physics, |_| Some(InstigatorKind::Player));
    assert_eq!(dispatcher.get("plate").unwrap().intersect().len(), 1);

    physics.destroy(body);
    dispatcher.on_actor_removed(player);
    assert!(dispatcher.get("plate").unwrap().intersect().is_empty());
}

#[test]
fn test_world_start_fires_once() {
    let mut physics = floor();
    let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
    dispatcher.add(
        TriggerVolume::new("start", TriggerKind::WorldStart(WorldStart::new("gate", true))),
        &mut physics,
    );
    dispatcher.add(gate(), &mut physics);

    dispatcher.process_on_start(true);
    let effects = dispatcher.flush(0);
    assert_eq!(effects.len(), 1);

    dispatcher.process_on_start(false);
    assert!(dispatcher.flush(0).is_empty());
}

#[test]
fn test_state_survives_bincode() {
    let mut physics = floor();
    let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
    dispatcher.add(plate(), &mut physics);
    dispatcher.trigger_event(TriggerEvent::new("plate", "lever", TriggerEventType::Disable).with_barrier(500));

    let bytes = bincode::serialize(&dispatcher).unwrap();
    let mut restored: TriggerDispatcher = bincode::deserialize(&bytes).unwrap();
    assert!(!restored.get("plate").is_some_and(|v| v.has_volume()));

    restored.restore_bodies(&mut physics);
    let plate = restored.get("plate").unwrap();
    assert!(plate.has_volume());
    assert!(plate.is_enabled());
    assert_eq!(restored.pending().count(), 1);

    restored.flush(500);
    assert!(!restored.get("plate").unwrap().is_enabled());
}

#[test]
fn test_point_queries_follow_bounds() {
    let mut physics = floor();
    let mut dispatcher = TriggerDispatcher::new(TriggerConfig::default());
    dispatcher.add(plate(), &mut physics);
    dispatcher.add(gate(), &mut physics);

    let plate = dispatcher.get("plate").unwrap();
    assert!(plate.contains_point(&physics, [0.5, 1.0, -0.5]));
    assert!(!plate.contains_point(&physics, [1.5, 1.0, 0.0]));

    // Event-only volumes have no extent
    assert!(!dispatcher.get("gate").unwrap().contains_point(&physics, [0.0, 0.0, 0.0]));
}
