//! Console commands against a running world

mod common;

use common::{world_with, TestVm};
use umbra_ai::prelude::*;
use umbra_core::{ItemSymbol, ScriptSymbol};
use umbra_world::prelude::*;

#[test]
fn test_insert_item_drops_at_player_feet() {
    let vm = TestVm::new();
    vm.item("ItFo_Apple", 500);
    let mut world = world_with(SimConfig::default(), &vm);
    let hero = world
        .add_actor(ActorTemplate::new(ScriptSymbol(1), "Hero"), [3.0, 0.0, -2.0])
        .unwrap();
    world.set_player(hero).unwrap();

    let console = CommandRecognizer::new();
    assert!(console.exec(&mut world, "insert itfo_apple"));

    let items = world.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].symbol, ItemSymbol(500));
    approx::assert_abs_diff_eq!(items[0].position[0], 3.0, epsilon = 1e-4);
    approx::assert_abs_diff_eq!(items[0].position[1], 0.0, epsilon = 0.05);
    approx::assert_abs_diff_eq!(items[0].position[2], -2.0, epsilon = 1e-4);
}

#[test]
fn test_insert_npc_spawns_actor() {
    let vm = TestVm::new();
    vm.npc("Wolf", ActorTemplate::new(ScriptSymbol(700), "Wolf"));
    let mut world = world_with(SimConfig::default(), &vm);
    let hero = world
        .add_actor(ActorTemplate::new(ScriptSymbol(1), "Hero"), [0.0, 0.0, 0.0])
        .unwrap();
    world.set_player(hero).unwrap();

    let console = CommandRecognizer::new();
    assert!(console.exec(&mut world, "  INSERT   wolf"));
    assert_eq!(world.actor_count(), 2);
    assert!(world.find_actor_by_instance(ScriptSymbol(700)).is_some());
}

#[test]
fn test_insert_needs_argument_player_and_symbol() {
    let vm = TestVm::new();
    vm.item("ItMi_Gold", 501);
    let mut world = world_with(SimConfig::default(), &vm);
    let console = CommandRecognizer::new();

    // No player yet
    assert!(!console.exec(&mut world, "insert itmi_gold"));

    let hero = world
        .add_actor(ActorTemplate::new(ScriptSymbol(1), "Hero"), [0.0, 0.0, 0.0])
        .unwrap();
    world.set_player(hero).unwrap();
    assert!(!console.exec(&mut world, "insert"));
    assert!(!console.exec(&mut world, "insert no_such_thing"));
    assert!(world.items().is_empty());
}

#[test]
fn test_cheat_full_heals_player() {
    let vm = TestVm::new();
    let mut world = world_with(SimConfig::default(), &vm);
    let hero = world
        .add_actor(ActorTemplate::new(ScriptSymbol(1), "Hero"), [0.0, 0.0, 0.0])
        .unwrap();
    world.set_player(hero).unwrap();
    world.change_attribute(hero, Attribute::Hitpoints, -7, false, None).unwrap();

    let console = CommandRecognizer::new();
    assert!(console.exec(&mut world, "cheat full"));
    assert_eq!(world.actor(hero).unwrap().attributes.get(Attribute::Hitpoints), 10);
}

#[test]
fn test_incomplete_and_invalid_fail() {
    let vm = TestVm::new();
    let mut world = world_with(SimConfig::default(), &vm);
    let console = CommandRecognizer::new();

    assert!(console.exec(&mut world, ""));
    assert!(!console.exec(&mut world, "che"));
    assert!(!console.exec(&mut world, "toogle c"));
    assert!(!console.exec(&mut world, "fly away"));
    assert!(console.exec(&mut world, "camera mode"));
}
