//! Umbra World - the simulation tick
//!
//! Ties the collision world, actors and trigger volumes of one level
//! together and advances them in a fixed order. Also owns the clocks,
//! save/load and the developer console.
//!
//! # Features
//!
//! - Deterministic per-tick ordering over actors in registration order
//! - Simulation clock and scaled game clock with day rollover
//! - Passive perceptions delivered after the actor pass
//! - Trigger effects routed back into scripts and movers
//! - Latest-value-wins handoff for assets loaded off-thread
//! - Versioned binary saves that keep actor ids stable
//! - JSON configuration for every subsystem
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                     World                       │
//! │  ┌──────────┐  ┌──────────────┐  ┌───────────┐  │
//! │  │  Clock   │  │ ActorRegistry│  │  WayNet   │  │
//! │  └────┬─────┘  └──────┬───────┘  └───────────┘  │
//! │       │ tick          │ actor pass              │
//! │  ┌────┴─────┐  ┌──────┴───────┐  ┌───────────┐  │
//! │  │ Collision│◄─┤    Actors    ├─►│ScriptHost │  │
//! │  │  World   │  └──────┬───────┘  └─────▲─────┘  │
//! │  └────┬─────┘         │ events         │ calls  │
//! │       │ ghosts ┌──────┴───────┐        │        │
//! │       └───────►│   Triggers   ├────────┘        │
//! │                └──────────────┘                 │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use umbra_world::prelude::*;
//!
//! let config = SimConfig::from_file("world.json")?;
//! let mut world = World::new(config, &landscape, Box::new(vm))?;
//! let hero = world.add_actor(ActorTemplate::new(ScriptSymbol(1), "Hero"), [0.0, 0.0, 0.0])?;
//! world.set_player(hero)?;
//! world.start(true);
//!
//! loop {
//!     world.tick(16);
//! }
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod handoff;
pub mod save;
pub mod waynet;
pub mod world;

pub mod prelude {
    //! Common imports for running a world
    pub use crate::config::{ConfigError, SimConfig, StartTime};
    pub use crate::console::{Command, CommandKind, CommandRecognizer, Recognized};
    pub use crate::error::WorldError;
    pub use crate::handoff::{AnimCatalog, Handoff};
    pub use crate::save::{SaveError, SaveHeader, SAVE_MAGIC, SAVE_VERSION};
    pub use crate::waynet::WayNet;
    pub use crate::world::{World, WorldClock, WorldItem};
}

pub use prelude::*;
