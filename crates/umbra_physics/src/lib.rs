//! Umbra Physics - collision world on Rapier 3D
//!
//! This crate answers the spatial questions the simulation asks every frame.
//! It does not integrate dynamics: bodies only move when asked to.
//!
//! # Features
//!
//! - One static landscape body with per-material surface chunks
//! - Actor capsules, ghost volumes and static object bodies
//! - Ray casts reporting surface material, drop rays, ground normals
//! - Sound occlusion and water depth probes
//! - Swept movement with sliding, autostep and ground snapping
//! - Deferred removal of dropped bodies
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                CollisionWorld                │
//! │  ┌──────────────┐ ┌───────────┐ ┌──────────┐ │
//! │  │ landscape    │ │ColliderSet│ │ Query    │ │
//! │  │ (fixed body) │ │           │ │ Pipeline │ │
//! │  └──────────────┘ └───────────┘ └──────────┘ │
//! │         ▲ graveyard channel (dropped bodies) │
//! └─────────┼────────────────────────────────────┘
//!           │
//!    ┌──────┴───────┐
//!    │ PhysicalBody │  owned by one actor or trigger
//!    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use umbra_physics::prelude::*;
//!
//! let level = LandscapeMesh::empty()
//!     .with_quad([-10.0, -10.0], [10.0, 10.0], 0.0, SurfaceMaterial::Earth);
//! let mut world = CollisionWorld::new(PhysicsConfig::default(), &level)?;
//!
//! let body = world.create_actor(1.8, 0.35, [0.0, 0.0, 0.0], None);
//! let result = world.try_move(&body, [0.5, 0.0, 0.0], 1.0 / 60.0);
//! let ground = world.drop_ray(result.position[0], result.position[1], result.position[2]);
//! assert_eq!(ground.material, SurfaceMaterial::Earth);
//! ```

pub mod body;
pub mod collider;
pub mod config;
pub mod error;
pub mod landscape;
pub mod layers;
pub mod material;
pub mod movement;
pub mod query;
pub mod world;

pub mod prelude {
    //! Common imports for physics functionality
    pub use crate::body::{ColliderHandle, PhysicalBody};
    pub use crate::collider::BodyShape;
    pub use crate::config::PhysicsConfig;
    pub use crate::error::{PhysicsError, Result};
    pub use crate::landscape::{LandscapeMesh, MeshChunk};
    pub use crate::layers::{Category, ColliderTag};
    pub use crate::material::SurfaceMaterial;
    pub use crate::movement::{MoveOutcome, MoveResult};
    pub use crate::query::RayResult;
    pub use crate::world::CollisionWorld;
}

pub use prelude::*;
