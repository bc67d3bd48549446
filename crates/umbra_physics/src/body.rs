//! Bodies owned by actors and trigger volumes

use crate::layers::Category;
use crossbeam_channel::Sender;
use rapier3d::prelude as rapier;
use std::fmt;

/// Handle to a collider in the collision world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderHandle(pub(crate) rapier::ColliderHandle);

impl ColliderHandle {
    /// Get the raw Rapier handle
    pub fn raw(&self) -> rapier::ColliderHandle {
        self.0
    }
}

/// A body registered in the [`CollisionWorld`](crate::CollisionWorld)
///
/// Bodies are not `Clone`: exactly one owner holds each of them. Passing the
/// body to [`CollisionWorld::destroy`](crate::CollisionWorld::destroy)
/// removes it immediately; simply dropping it queues the removal, which the
/// world carries out on its next tick.
pub struct PhysicalBody {
    pub(crate) handle: ColliderHandle,
    pub(crate) category: Category,
    /// Full standing height (capsules) or box height (ghosts)
    pub(crate) height: f32,
    /// Capsule radius, or horizontal half-extent for boxes
    pub(crate) radius: f32,
    /// Offset from the reference position to the collider centre
    pub(crate) center_offset: [f32; 3],
    pub(crate) armed: bool,
    pub(crate) graveyard: Sender<rapier::ColliderHandle>,
}

impl PhysicalBody {
    /// Collider handle
    pub fn handle(&self) -> ColliderHandle {
        self.handle
    }

    /// Filtering category
    pub fn category(&self) -> Category {
        self.category
    }

    /// Height of the body
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Radius of the body
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Offset from the reference point (feet for actors) to the collider centre
    pub fn center_offset(&self) -> [f32; 3] {
        self.center_offset
    }

    pub(crate) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl fmt::Debug for PhysicalBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicalBody")
            .field("handle", &self.handle)
            .field("category", &self.category)
            .field("height", &self.height)
            .field("radius", &self.radius)
            .finish()
    }
}

impl Drop for PhysicalBody {
    fn drop(&mut self) {
        if self.armed {
            // The world may already be gone during teardown
            let _ = self.graveyard.send(self.handle.0);
        }
    }
}
