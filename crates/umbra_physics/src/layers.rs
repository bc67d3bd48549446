//! Collision categories and filtering
//!
//! Every collider in the world carries a [`ColliderTag`] packed into its
//! Rapier `user_data`: the category that decides filtering, the surface
//! material reported by rays and, for actor bodies, the owning actor.

use crate::material::SurfaceMaterial;
use rapier3d::prelude::{Group, InteractionGroups};
use serde::{Deserialize, Serialize};
use umbra_core::ActorId;

/// Level geometry: landscape chunks and static object meshes
pub const GROUP_LANDSCAPE: Group = Group::GROUP_1;
/// Actor capsules
pub const GROUP_ACTOR: Group = Group::GROUP_2;
/// Trigger ghost volumes
pub const GROUP_GHOST: Group = Group::GROUP_3;
/// Water surfaces
pub const GROUP_WATER: Group = Group::GROUP_4;

/// Category of a body, deciding what it collides with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Category {
    /// Ordinary movable body (actors)
    #[default]
    Null = 1,
    /// Static level geometry
    Landscape = 2,
    /// Non-blocking overlap volume
    Ghost = 3,
}

impl Category {
    /// Groups a collider of this category is created with
    pub fn groups(&self) -> InteractionGroups {
        match self {
            Category::Null => InteractionGroups::new(GROUP_ACTOR, Group::ALL),
            Category::Landscape => InteractionGroups::new(GROUP_LANDSCAPE, Group::ALL),
            Category::Ghost => InteractionGroups::new(GROUP_GHOST, GROUP_ACTOR),
        }
    }

    /// What a body of this category is stopped by when moving
    pub fn movement_filter(&self) -> InteractionGroups {
        match self {
            Category::Null => InteractionGroups::new(Group::ALL, GROUP_LANDSCAPE | GROUP_ACTOR),
            Category::Landscape | Category::Ghost => InteractionGroups::none(),
        }
    }

    fn from_bits(bits: u8) -> Self {
        match bits {
            2 => Category::Landscape,
            3 => Category::Ghost,
            _ => Category::Null,
        }
    }
}

/// Groups used by line-of-sight and drop rays: level geometry only
pub fn level_query_groups() -> InteractionGroups {
    InteractionGroups::new(Group::ALL, GROUP_LANDSCAPE)
}

/// Groups used by water depth probes
pub fn water_query_groups() -> InteractionGroups {
    InteractionGroups::new(Group::ALL, GROUP_WATER)
}

/// Groups used to find actors inside a ghost volume
pub fn actor_query_groups() -> InteractionGroups {
    InteractionGroups::new(Group::ALL, GROUP_ACTOR)
}

/// Metadata stored in a collider's `user_data`
///
/// Layout: bits 0..8 category, 8..16 material, bit 16 water flag,
/// bit 17 owner flag, 32..64 owner index, 64..96 owner generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColliderTag {
    /// Filtering category
    pub category: Category,
    /// Surface material
    pub material: SurfaceMaterial,
    /// Surface is a water plane
    pub water: bool,
    /// Actor owning the body
    pub owner: Option<ActorId>,
}

impl ColliderTag {
    const WATER_BIT: u128 = 1 << 16;
    const OWNER_BIT: u128 = 1 << 17;

    /// Tag for a body of the given category
    pub fn new(category: Category, material: SurfaceMaterial) -> Self {
        Self {
            category,
            material,
            water: false,
            owner: None,
        }
    }

    /// Mark as water
    pub fn with_water(mut self, water: bool) -> Self {
        self.water = water;
        self
    }

    /// Attach an owning actor
    pub fn with_owner(mut self, owner: Option<ActorId>) -> Self {
        self.owner = owner;
        self
    }

    /// Pack into `user_data`
    pub fn encode(&self) -> u128 {
        let mut bits = self.category as u128 | (self.material as u128) << 8;
        if self.water {
            bits |= Self::WATER_BIT;
        }
        if let Some(owner) = self.owner {
            bits |= Self::OWNER_BIT;
            bits |= (owner.index() as u128) << 32;
            bits |= (owner.generation() as u128) << 64;
        }
        bits
    }

    /// Unpack from `user_data`
    pub fn decode(bits: u128) -> Self {
        let owner = if bits & Self::OWNER_BIT != 0 {
            Some(ActorId::new(
                ((bits >> 32) & 0xffff_ffff) as u32,
                ((bits >> 64) & 0xffff_ffff) as u32,
            ))
        } else {
            None
        };
        Self {
            category: Category::from_bits((bits & 0xff) as u8),
            material: SurfaceMaterial::from_u8(((bits >> 8) & 0xff) as u8),
            water: bits & Self::WATER_BIT != 0,
            owner,
        }
    }
}
