//! Save/load of a running world
//!
//! A save stream is a [`SaveHeader`] followed by the world snapshot, both
//! bincode encoded. Actors keep their registry slots so every saved
//! [`ActorId`] resolves to the same actor after loading. Collision bodies
//! are not saved; they are rebuilt from the saved dimensions.

use crate::config::SimConfig;
use crate::waynet::WayNet;
use crate::world::{World, WorldClock, WorldItem};
use serde::{Deserialize, Serialize};
use bincode::Options;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use thiserror::Error;
use umbra_ai::{Actor, ScriptHost};
use umbra_core::{ActorId, ActorRegistry};
use umbra_physics::LandscapeMesh;
use umbra_triggers::TriggerDispatcher;

/// Stream magic
pub const SAVE_MAGIC: [u8; 4] = *b"UMBR";

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Largest snapshot a stream may decode to
pub const MAX_SAVE_BYTES: u64 = 256 * 1024 * 1024;

/// Encoding of both header and snapshot; matches `bincode::serialize`
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(MAX_SAVE_BYTES)
}

/// Save system errors
#[derive(Debug, Error)]
pub enum SaveError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Not a save stream
    #[error("Bad magic {0:?}")]
    BadMagic([u8; 4]),

    /// Version mismatch
    #[error("Version mismatch: save version {0}, current version {1}")]
    VersionMismatch(u32, u32),

    /// Stream decoded but its content is inconsistent
    #[error("Corrupted save data: {0}")]
    Corrupted(String),

    /// The world could not be rebuilt
    #[error("World error: {0}")]
    World(String),
}

/// Save stream header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    pub magic: [u8; 4],
    pub version: u32,
    /// Tick the world was saved at
    pub tick: u64,
}

impl SaveHeader {
    /// Header for the current format
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SAVE_MAGIC,
            version: SAVE_VERSION,
            tick,
        }
    }

    /// Check magic and version
    pub fn validate(&self) -> Result<(), SaveError> {
        if self.magic != SAVE_MAGIC {
            return Err(SaveError::BadMagic(self.magic));
        }
        if self.version != SAVE_VERSION {
            return Err(SaveError::VersionMismatch(self.version, SAVE_VERSION));
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    clock: &'a WorldClock,
    generations: &'a [u32],
    free_list: &'a [u32],
    actors: Vec<(ActorId, &'a Actor)>,
    player: Option<ActorId>,
    triggers: &'a TriggerDispatcher,
    way_net: &'a WayNet,
    items: &'a [WorldItem],
    movers: &'a HashMap<String, bool>,
}

#[derive(Deserialize)]
struct Snapshot {
    clock: WorldClock,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    actors: Vec<(ActorId, Actor)>,
    player: Option<ActorId>,
    triggers: TriggerDispatcher,
    way_net: WayNet,
    items: Vec<WorldItem>,
    movers: HashMap<String, bool>,
}

impl World {
    /// Write the world to `writer`
    pub fn save<W: Write>(&self, mut writer: W) -> Result<(), SaveError> {
        let header = SaveHeader::new(self.clock.tick);
        codec()
            .serialize_into(&mut writer, &header)
            .map_err(|e| SaveError::Serialization(e.to_string()))?;

        let snapshot = SnapshotRef {
            clock: &self.clock,
            generations: self.actors.generations(),
            free_list: self.actors.free_list(),
            actors: self.actors.iter().collect(),
            player: self.player,
            triggers: &self.triggers,
            way_net: &self.way_net,
            items: &self.items,
            movers: &self.movers,
        };
        codec()
            .serialize_into(&mut writer, &snapshot)
            .map_err(|e| SaveError::Serialization(e.to_string()))?;
        writer.flush()?;

        log::info!("Saved {} actors at tick {}", snapshot.actors.len(), header.tick);
        Ok(())
    }

    /// Rebuild a world from a stream written by [`World::save`]
    pub fn load<R: Read>(
        mut reader: R,
        config: SimConfig,
        landscape: &LandscapeMesh,
        script: Box<dyn ScriptHost>,
    ) -> Result<World, SaveError> {
        let header: SaveHeader = codec()
            .deserialize_from(&mut reader)
            .map_err(|e| SaveError::Deserialization(e.to_string()))?;
        header.validate()?;
        let snapshot: Snapshot = codec()
            .deserialize_from(&mut reader)
            .map_err(|e| SaveError::Deserialization(e.to_string()))?;

        let mut world = World::new(config, landscape, script).map_err(|e| SaveError::World(e.to_string()))?;
        world.clock = snapshot.clock;
        world.way_net = snapshot.way_net;
        world.items = snapshot.items;
        world.movers = snapshot.movers;

        let mut actors = ActorRegistry::with_layout(snapshot.generations, snapshot.free_list);
        for (id, actor) in snapshot.actors {
            actors
                .insert_at(id, actor)
                .map_err(|e| SaveError::Corrupted(format!("{:?}: {}", id, e)))?;
        }
        world.actors = actors;

        for (_, actor) in world.actors.iter_mut() {
            actor.attach_body(&mut world.physics);
        }
        post_validate(&mut world.actors);

        world.triggers = snapshot.triggers;
        world.triggers.restore_bodies(&mut world.physics);
        let live: HashSet<ActorId> = world.actors.ids().iter().copied().collect();
        let stale: Vec<ActorId> = world
            .triggers
            .volumes()
            .flat_map(|v| v.intersect().iter().copied())
            .filter(|id| !live.contains(id))
            .collect();
        for id in stale {
            world.triggers.on_actor_removed(id);
        }

        if let Some(player) = snapshot.player.filter(|p| live.contains(p)) {
            world
                .set_player(player)
                .map_err(|e| SaveError::World(e.to_string()))?;
        }

        log::info!("Loaded {} actors from tick {}", world.actors.len(), header.tick);
        Ok(world)
    }
}

/// Drop references to actors that did not make it into the save
fn post_validate(actors: &mut ActorRegistry<Actor>) {
    let live: HashSet<ActorId> = actors.ids().iter().copied().collect();
    for (_, actor) in actors.iter_mut() {
        actor.retain_references(|id| live.contains(&id));
    }
}
