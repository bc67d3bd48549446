//! Save/load round trips

mod common;

use common::{flat_ground, world_with, TestVm};
use umbra_ai::prelude::*;
use umbra_core::{ItemSymbol, ScriptFn, ScriptSymbol};
use umbra_triggers::prelude::*;
use umbra_world::prelude::*;

fn npc(instance: u32, name: &str) -> ActorTemplate {
    ActorTemplate::new(ScriptSymbol(instance), name)
}

#[test]
fn test_round_trip_keeps_ids_and_references() {
    let vm = TestVm::new();
    let mut world = world_with(SimConfig::default(), &vm);
    world.way_net_mut().insert("OC_GATE", [5.0, 0.0, 5.0]);
    world.add_item(ItemSymbol(9), [1.0, 0.0, 1.0]);
    world.add_trigger(
        TriggerVolume::new("gate", TriggerKind::Mover(Mover::default()))
            .with_flags(ReactFlags::REACT_TO_ON_TRIGGER | ReactFlags::START_ENABLED),
    );

    let hero = world.add_actor(npc(1, "Hero"), [0.0, 0.0, 0.0]).unwrap();
    let gone = world.add_actor(npc(2, "Gone"), [2.0, 0.0, 0.0]).unwrap();
    let guard = world.add_actor(npc(3, "Guard"), [4.0, 0.0, 0.0]).unwrap();
    world.remove_actor(gone);
    world.set_player(hero).unwrap();
    {
        let guard = world.actor_mut(guard).unwrap();
        guard.target = Some(hero);
        guard.queue.push(AiAction::GoTo(GoToTarget::Waypoint("OC_GATE".into())));
        guard.perception.set_enabled(PercType::AssessWarn, ScriptFn(90));
    }
    world.trigger_event(TriggerEvent::new("gate", "lever", TriggerEventType::Trigger));
    for _ in 0..3 {
        world.tick(16);
    }
    world.change_attribute(hero, Attribute::Hitpoints, -3, false, None).unwrap();

    let mut bytes = Vec::new();
    world.save(&mut bytes).unwrap();
    assert_eq!(&bytes[..4], &SAVE_MAGIC);

    let loaded = World::load(bytes.as_slice(), SimConfig::default(), &flat_ground(), Box::new(TestVm::new())).unwrap();

    assert_eq!(loaded.actor_ids(), world.actor_ids());
    assert_eq!(loaded.player(), Some(hero));
    assert!(loaded.actor(hero).unwrap().is_player);
    assert!(loaded.actor(gone).is_none());
    assert_eq!(loaded.clock(), world.clock());
    assert_eq!(loaded.way_net().get("oc_gate"), Some([5.0, 0.0, 5.0]));
    assert_eq!(loaded.items(), world.items());
    assert_eq!(loaded.mover_state("gate"), Some(true));

    let guard_after = loaded.actor(guard).unwrap();
    assert_eq!(guard_after.target, Some(hero));
    assert_eq!(guard_after.queue.len(), 1);
    assert_eq!(guard_after.perception.get(PercType::AssessWarn), Some(ScriptFn(90)));
    assert!(guard_after.physical_body().is_some());
    assert_eq!(
        loaded.actor(hero).unwrap().attributes.get(Attribute::Hitpoints),
        world.actor(hero).unwrap().attributes.get(Attribute::Hitpoints)
    );
}

#[test]
fn test_loaded_world_keeps_running() {
    let vm = TestVm::new();
    let mut world = world_with(SimConfig::default(), &vm);
    let id = world
        .add_actor(npc(1, "Lares").with_behavior(Some(ScriptFn(40)), None), [0.0, 0.0, 0.0])
        .unwrap();
    world.tick(16);

    let mut bytes = Vec::new();
    world.save(&mut bytes).unwrap();

    let resumed = TestVm::new();
    let mut loaded = World::load(bytes.as_slice(), SimConfig::default(), &flat_ground(), Box::new(resumed.clone())).unwrap();
    loaded.tick(16);

    // The running state continues with its loop callback
    assert_eq!(resumed.called(), vec![41]);
    assert!(loaded.actor(id).unwrap().state.is_state(ScriptFn(40)));

    // New actors never reuse a live id
    let other = loaded.add_actor(npc(2, "Cord"), [2.0, 0.0, 0.0]).unwrap();
    assert_ne!(other, id);
}

#[test]
fn test_dead_actor_loads_without_collision() {
    let vm = TestVm::new();
    let mut world = world_with(SimConfig::default(), &vm);
    let id = world.add_actor(npc(1, "Skeleton"), [0.0, 0.0, 0.0]).unwrap();
    world.change_attribute(id, Attribute::Hitpoints, -50, false, None).unwrap();

    let mut bytes = Vec::new();
    world.save(&mut bytes).unwrap();
    let loaded = World::load(bytes.as_slice(), SimConfig::default(), &flat_ground(), Box::new(TestVm::new())).unwrap();

    let actor = loaded.actor(id).unwrap();
    assert!(actor.is_dead());
    let body = actor.physical_body().unwrap();
    assert!(!loaded.physics().is_enabled(body));
}

#[test]
fn test_rejects_foreign_stream() {
    let vm = TestVm::new();
    let mut stream = b"NOPE".to_vec();
    stream.extend_from_slice(&1u32.to_le_bytes());
    stream.extend_from_slice(&0u64.to_le_bytes());
    let result = World::load(stream.as_slice(), SimConfig::default(), &flat_ground(), Box::new(vm));
    assert!(matches!(result, Err(SaveError::BadMagic(m)) if &m == b"NOPE"));
}

#[test]
fn test_rejects_truncated_stream() {
    let vm = TestVm::new();
    let mut world = world_with(SimConfig::default(), &vm);
    world.add_actor(npc(1, "Half"), [0.0, 0.0, 0.0]).unwrap();
    let mut bytes = Vec::new();
    world.save(&mut bytes).unwrap();
    bytes.truncate(bytes.len() / 2);

    let result = World::load(bytes.as_slice(), SimConfig::default(), &flat_ground(), Box::new(TestVm::new()));
    assert!(matches!(result, Err(SaveError::Deserialization(_))));
}
