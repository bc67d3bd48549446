//! Collision world - static level plus every registered body

use crate::body::{ColliderHandle, PhysicalBody};
use crate::collider::{trimesh, BodyShape};
use crate::config::PhysicsConfig;
use crate::error::Result;
use crate::landscape::LandscapeMesh;
use crate::layers::{actor_query_groups, Category, ColliderTag, GROUP_WATER};
use crate::material::SurfaceMaterial;
use crate::query::RayResult;
use crossbeam_channel::{Receiver, Sender};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::parry::query::PointQuery;
use rapier3d::prelude as rapier;
use std::cell::Cell;
use umbra_core::ActorId;

/// Static level geometry plus every body registered against it
///
/// The world owns exactly one fixed landscape body. Actor capsules, ghost
/// volumes and static objects are parentless colliders positioned directly.
/// There is no dynamics integration: [`tick`](Self::tick) only settles
/// pending removals and refreshes the query acceleration structure.
pub struct CollisionWorld {
    /// Configuration
    pub(crate) config: PhysicsConfig,

    /// Rigid body set; holds only the landscape
    pub(crate) bodies: rapier::RigidBodySet,

    /// Collider set
    pub(crate) colliders: rapier::ColliderSet,

    /// Island manager, needed for removals
    islands: rapier::IslandManager,

    /// Query pipeline
    pub(crate) query_pipeline: rapier::QueryPipeline,

    /// The single static landscape body
    landscape: rapier::RigidBodyHandle,

    /// Landscape collider count (one per material chunk)
    landscape_chunks: usize,

    /// Removal requests from dropped bodies
    graveyard_tx: Sender<rapier::ColliderHandle>,
    graveyard_rx: Receiver<rapier::ColliderHandle>,

    /// Bodies handed out and not yet removed
    live_bodies: usize,

    /// Last drop ray position and result
    pub(crate) last_drop: Cell<Option<([f32; 3], RayResult)>>,
}

impl CollisionWorld {
    /// Create a world around the given level mesh
    pub fn new(config: PhysicsConfig, landscape: &LandscapeMesh) -> Result<Self> {
        config.validate()?;
        landscape.validate()?;

        let (graveyard_tx, graveyard_rx) = crossbeam_channel::unbounded();
        let mut bodies = rapier::RigidBodySet::new();
        let landscape_body = bodies.insert(rapier::RigidBodyBuilder::fixed());

        let mut world = Self {
            config,
            bodies,
            colliders: rapier::ColliderSet::new(),
            islands: rapier::IslandManager::new(),
            query_pipeline: rapier::QueryPipeline::new(),
            landscape: landscape_body,
            landscape_chunks: 0,
            graveyard_tx,
            graveyard_rx,
            live_bodies: 0,
            last_drop: Cell::new(None),
        };
        world.register_landscape(landscape)?;
        world.sync();

        log::info!(
            "Collision world ready: {} landscape chunks, {} triangles",
            world.landscape_chunks,
            landscape.triangle_count()
        );
        Ok(world)
    }

    fn register_landscape(&mut self, mesh: &LandscapeMesh) -> Result<()> {
        for chunk in mesh.chunks.iter().filter(|c| !c.indices.is_empty()) {
            let water = chunk.material == SurfaceMaterial::Water;
            let tag = ColliderTag::new(Category::Landscape, chunk.material).with_water(water);
            let groups = if water {
                rapier::InteractionGroups::new(GROUP_WATER, rapier::Group::ALL)
            } else {
                Category::Landscape.groups()
            };

            let collider = rapier::ColliderBuilder::new(trimesh(&mesh.vertices, chunk.indices.clone())?)
                .collision_groups(groups)
                .sensor(water)
                .user_data(tag.encode())
                .build();
            self.colliders
                .insert_with_parent(collider, self.landscape, &mut self.bodies);
            self.landscape_chunks += 1;
        }
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of landscape colliders
    pub fn landscape_chunks(&self) -> usize {
        self.landscape_chunks
    }

    /// Number of bodies handed out and still registered
    pub fn body_count(&self) -> usize {
        self.live_bodies
    }

    // ==================== Body creation ====================

    /// Create an actor capsule standing at `feet`
    pub fn create_actor(
        &mut self,
        height: f32,
        radius: f32,
        feet: [f32; 3],
        owner: Option<ActorId>,
    ) -> PhysicalBody {
        let radius = radius.max(0.01);
        let height = height.max(radius * 2.0);
        let half_height = (height * 0.5 - radius).max(0.0);
        let center_offset = [0.0, height * 0.5, 0.0];
        let tag = ColliderTag::new(Category::Null, SurfaceMaterial::Undefined).with_owner(owner);

        let collider = rapier::ColliderBuilder::capsule_y(half_height, radius)
            .translation(rapier::Vector::new(
                feet[0] + center_offset[0],
                feet[1] + center_offset[1],
                feet[2] + center_offset[2],
            ))
            .collision_groups(Category::Null.groups())
            .user_data(tag.encode())
            .build();

        self.register(collider, Category::Null, height, radius, center_offset)
    }

    /// Create a ghost volume spanning an axis-aligned box.
    ///
    /// Boxes that are flat in Y are given `ghost_height` of vertical extent.
    pub fn create_ghost(&mut self, min: [f32; 3], max: [f32; 3]) -> PhysicalBody {
        let mut lo = [min[0].min(max[0]), min[1].min(max[1]), min[2].min(max[2])];
        let hi = [min[0].max(max[0]), min[1].max(max[1]), min[2].max(max[2])];
        if hi[1] - lo[1] < f32::EPSILON {
            lo[1] -= self.config.ghost_height;
        }

        let half = [
            ((hi[0] - lo[0]) * 0.5).max(0.01),
            ((hi[1] - lo[1]) * 0.5).max(0.01),
            ((hi[2] - lo[2]) * 0.5).max(0.01),
        ];
        let center = [
            (hi[0] + lo[0]) * 0.5,
            (hi[1] + lo[1]) * 0.5,
            (hi[2] + lo[2]) * 0.5,
        ];
        let tag = ColliderTag::new(Category::Ghost, SurfaceMaterial::Undefined);

        let collider = rapier::ColliderBuilder::cuboid(half[0], half[1], half[2])
            .translation(rapier::Vector::new(center[0], center[1], center[2]))
            .sensor(true)
            .collision_groups(Category::Ghost.groups())
            .user_data(tag.encode())
            .build();

        self.register(collider, Category::Ghost, half[1] * 2.0, half[0].max(half[2]), [0.0; 3])
    }

    /// Create a solid static object (door frame, chest, furniture)
    pub fn create_static(
        &mut self,
        shape: &BodyShape,
        material: SurfaceMaterial,
        position: [f32; 3],
        rotation: [f32; 4],
    ) -> Result<PhysicalBody> {
        let shape = shape.to_rapier()?;
        let aabb = shape.compute_local_aabb();
        let extents = aabb.half_extents();
        let tag = ColliderTag::new(Category::Landscape, material);

        let pose = rapier::Isometry::from_parts(
            Translation3::new(position[0], position[1], position[2]),
            UnitQuaternion::from_quaternion(Quaternion::new(
                rotation[3],
                rotation[0],
                rotation[1],
                rotation[2],
            )),
        );
        let collider = rapier::ColliderBuilder::new(shape)
            .position(pose)
            .collision_groups(Category::Landscape.groups())
            .user_data(tag.encode())
            .build();

        Ok(self.register(
            collider,
            Category::Landscape,
            extents.y * 2.0,
            extents.x.max(extents.z),
            [0.0; 3],
        ))
    }

    fn register(
        &mut self,
        collider: rapier::Collider,
        category: Category,
        height: f32,
        radius: f32,
        center_offset: [f32; 3],
    ) -> PhysicalBody {
        let handle = self.colliders.insert(collider);
        self.live_bodies += 1;
        self.sync();

        log::trace!("Registered {:?} body {:?}", category, handle);
        PhysicalBody {
            handle: ColliderHandle(handle),
            category,
            height,
            radius,
            center_offset,
            armed: true,
            graveyard: self.graveyard_tx.clone(),
        }
    }

    /// Remove a body immediately
    pub fn destroy(&mut self, mut body: PhysicalBody) {
        body.disarm();
        self.remove_collider(body.handle.0);
        self.sync();
    }

    fn remove_collider(&mut self, handle: rapier::ColliderHandle) {
        if self
            .colliders
            .remove(handle, &mut self.islands, &mut self.bodies, false)
            .is_some()
        {
            self.live_bodies = self.live_bodies.saturating_sub(1);
        }
    }

    // ==================== Body state ====================

    /// Reference position of a body (feet for actors, centre otherwise)
    pub fn body_position(&self, body: &PhysicalBody) -> [f32; 3] {
        self.colliders
            .get(body.handle.0)
            .map(|c| {
                let t = c.translation();
                [
                    t.x - body.center_offset[0],
                    t.y - body.center_offset[1],
                    t.z - body.center_offset[2],
                ]
            })
            .unwrap_or([0.0; 3])
    }

    /// Teleport a body without collision checks
    pub fn set_position(&mut self, body: &PhysicalBody, pos: [f32; 3]) {
        self.place(body, pos);
        self.sync();
    }

    pub(crate) fn place(&mut self, body: &PhysicalBody, pos: [f32; 3]) {
        if let Some(c) = self.colliders.get_mut(body.handle.0) {
            c.set_translation(rapier::Vector::new(
                pos[0] + body.center_offset[0],
                pos[1] + body.center_offset[1],
                pos[2] + body.center_offset[2],
            ));
        }
    }

    /// Enable or disable collision for a body (dead actors stop blocking)
    pub fn set_enabled(&mut self, body: &PhysicalBody, enabled: bool) {
        if let Some(c) = self.colliders.get_mut(body.handle.0) {
            c.set_enabled(enabled);
        }
        self.sync();
    }

    /// Whether a body currently takes part in queries
    pub fn is_enabled(&self, body: &PhysicalBody) -> bool {
        self.colliders
            .get(body.handle.0)
            .map(|c| c.is_enabled())
            .unwrap_or(false)
    }

    /// Attach or change the owning actor of a body
    pub fn set_owner(&mut self, body: &PhysicalBody, owner: Option<ActorId>) {
        if let Some(c) = self.colliders.get_mut(body.handle.0) {
            c.user_data = ColliderTag::decode(c.user_data).with_owner(owner).encode();
        }
    }

    // ==================== Overlap ====================

    /// Exact overlap test between two bodies
    pub fn overlaps(&self, a: &PhysicalBody, b: &PhysicalBody) -> bool {
        match (self.colliders.get(a.handle.0), self.colliders.get(b.handle.0)) {
            (Some(ca), Some(cb)) if ca.is_enabled() && cb.is_enabled() => {
                rapier3d::parry::query::intersection_test(
                    ca.position(),
                    ca.shape(),
                    cb.position(),
                    cb.shape(),
                )
                .unwrap_or(false)
            }
            _ => false,
        }
    }

    /// Whether `point` lies inside a body's shape, regardless of its enabled state
    pub fn contains_point(&self, body: &PhysicalBody, point: [f32; 3]) -> bool {
        self.colliders
            .get(body.handle.0)
            .map(|c| {
                c.shape()
                    .contains_point(c.position(), &rapier::Point::new(point[0], point[1], point[2]))
            })
            .unwrap_or(false)
    }

    /// Owners of the actor bodies currently inside a ghost volume
    pub fn ghost_contents(&self, ghost: &PhysicalBody) -> Vec<ActorId> {
        let Some(collider) = self.colliders.get(ghost.handle.0) else {
            return Vec::new();
        };
        if !collider.is_enabled() {
            return Vec::new();
        }

        let filter = rapier::QueryFilter::default()
            .exclude_collider(ghost.handle.0)
            .groups(actor_query_groups());

        let mut inside = Vec::new();
        self.query_pipeline.intersections_with_shape(
            &self.bodies,
            &self.colliders,
            collider.position(),
            collider.shape(),
            filter,
            |handle| {
                if let Some(owner) = self
                    .colliders
                    .get(handle)
                    .filter(|c| c.is_enabled())
                    .and_then(|c| ColliderTag::decode(c.user_data).owner)
                {
                    inside.push(owner);
                }
                true
            },
        );
        inside.sort();
        inside.dedup();
        inside
    }

    // ==================== Tick ====================

    /// Settle removals queued by dropped bodies and refresh the broadphase
    pub fn tick(&mut self, _dt_ms: u64) {
        let mut removed = 0;
        while let Ok(handle) = self.graveyard_rx.try_recv() {
            self.remove_collider(handle);
            removed += 1;
        }
        if removed > 0 {
            log::debug!("Removed {} dropped bodies", removed);
        }
        self.sync();
    }

    /// Bring the query pipeline up to date with collider positions
    pub(crate) fn sync(&mut self) {
        self.query_pipeline.update(&self.colliders);
        self.last_drop.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> LandscapeMesh {
        LandscapeMesh::empty().with_quad([-50.0, -50.0], [50.0, 50.0], 0.0, SurfaceMaterial::Earth)
    }

    #[test]
    fn test_single_landscape_body() {
        let world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        assert_eq!(world.bodies.len(), 1);
        assert_eq!(world.landscape_chunks(), 1);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_destroy_deregisters() {
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        let body = world.create_actor(1.8, 0.4, [0.0, 0.0, 0.0], None);
        assert_eq!(world.body_count(), 1);
        world.destroy(body);
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.colliders.len(), 1);
    }

    #[test]
    fn test_dropped_body_removed_on_tick() {
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        {
            let _ghost = world.create_ghost([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        }
        assert_eq!(world.body_count(), 1);
        world.tick(16);
        assert_eq!(world.body_count(), 0);
    }

    #[test]
    fn test_ghost_contents_reports_owner() {
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        let ghost = world.create_ghost([-2.0, 0.0, -2.0], [2.0, 3.0, 2.0]);
        let owner = ActorId::new(3, 1);
        let actor = world.create_actor(1.8, 0.4, [0.0, 0.0, 0.0], Some(owner));

        assert!(world.overlaps(&ghost, &actor));
        assert_eq!(world.ghost_contents(&ghost), vec![owner]);

        world.set_position(&actor, [10.0, 0.0, 10.0]);
        assert!(!world.overlaps(&ghost, &actor));
        assert!(world.ghost_contents(&ghost).is_empty());
    }

    #[test]
    fn test_disabled_body_not_reported() {
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        let ghost = world.create_ghost([-2.0, 0.0, -2.0], [2.0, 3.0, 2.0]);
        let actor = world.create_actor(1.8, 0.4, [0.0, 0.0, 0.0], Some(ActorId::new(0, 0)));
        world.set_enabled(&actor, false);
        assert!(world.ghost_contents(&ghost).is_empty());
        assert!(!world.is_enabled(&actor));
    }

    #[test]
    fn test_ghost_contains_point() {
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        let ghost = world.create_ghost([-2.0, 0.0, -2.0], [2.0, 3.0, 2.0]);
        assert!(world.contains_point(&ghost, [1.0, 1.5, -1.0]));
        assert!(!world.contains_point(&ghost, [3.0, 1.5, 0.0]));
        assert!(!world.contains_point(&ghost, [0.0, 4.0, 0.0]));
    }

    #[test]
    fn test_actor_position_is_feet() {
        let mut world = CollisionWorld::new(PhysicsConfig::default(), &ground()).unwrap();
        let actor = world.create_actor(1.8, 0.4, [1.0, 0.0, 2.0], None);
        let pos = world.body_position(&actor);
        approx::assert_relative_eq!(pos[0], 1.0);
        approx::assert_relative_eq!(pos[1], 0.0);
        approx::assert_relative_eq!(pos[2], 2.0);
    }
}
