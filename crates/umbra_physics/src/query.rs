//! Ray queries against level geometry

use crate::layers::{level_query_groups, water_query_groups, ColliderTag};
use crate::material::SurfaceMaterial;
use crate::world::CollisionWorld;
use rapier3d::prelude as rapier;

/// Result of a ray query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayResult {
    /// Hit point, or the ray end when nothing was hit
    pub point: [f32; 3],
    /// Material of the surface hit
    pub material: SurfaceMaterial,
    /// Whether anything was hit
    pub has_col: bool,
}

impl RayResult {
    fn miss(end: [f32; 3]) -> Self {
        Self {
            point: end,
            material: SurfaceMaterial::Undefined,
            has_col: false,
        }
    }

    /// Hit point X
    pub fn x(&self) -> f32 {
        self.point[0]
    }

    /// Hit point Y
    pub fn y(&self) -> f32 {
        self.point[1]
    }

    /// Hit point Z
    pub fn z(&self) -> f32 {
        self.point[2]
    }
}

fn to_point(p: [f32; 3]) -> rapier::Point<f32> {
    rapier::Point::new(p[0], p[1], p[2])
}

fn segment_ray(p0: [f32; 3], p1: [f32; 3]) -> rapier::Ray {
    rapier::Ray::new(
        to_point(p0),
        rapier::Vector::new(p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]),
    )
}

impl CollisionWorld {
    fn level_filter() -> rapier::QueryFilter<'static> {
        rapier::QueryFilter::default()
            .exclude_sensors()
            .groups(level_query_groups())
    }

    /// Nearest hit on level geometry along the segment `p0 -> p1`
    pub fn ray_cast(&self, p0: [f32; 3], p1: [f32; 3]) -> RayResult {
        let ray = segment_ray(p0, p1);
        // The direction is not normalised, so time of impact 1.0 is the segment end
        match self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            1.0,
            true,
            Self::level_filter(),
        ) {
            Some((handle, toi)) => {
                let point = ray.point_at(toi);
                let material = self
                    .colliders
                    .get(handle)
                    .map(|c| ColliderTag::decode(c.user_data).material)
                    .unwrap_or_default();
                RayResult {
                    point: [point.x, point.y, point.z],
                    material,
                    has_col: true,
                }
            }
            None => RayResult::miss(p1),
        }
    }

    /// Whether the segment between two points is free of level geometry
    pub fn line_of_sight(&self, p0: [f32; 3], p1: [f32; 3]) -> bool {
        !self.ray_cast(p0, p1).has_col
    }

    /// Straight-down cast for the ground under a point.
    ///
    /// Starts `ghost_padding` above the point so a body standing exactly on
    /// the floor still finds it. The last query is cached until geometry or
    /// bodies change.
    pub fn drop_ray(&self, x: f32, y: f32, z: f32) -> RayResult {
        if let Some((at, result)) = self.last_drop.get() {
            if at == [x, y, z] {
                return result;
            }
        }

        let from = [x, y + self.config.ghost_padding, z];
        let to = [x, self.config.world_bottom, z];
        let result = self.ray_cast(from, to);
        self.last_drop.set(Some(([x, y, z], result)));
        result
    }

    /// Attenuation of sound travelling from `p0` to `p1`, in `[0, 1]`.
    ///
    /// `1.0` means unobstructed. Every surface crossed multiplies by its
    /// material's transmission factor.
    pub fn sound_occlusion(&self, p0: [f32; 3], p1: [f32; 3]) -> f32 {
        let total = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
        let length = (total[0] * total[0] + total[1] * total[1] + total[2] * total[2]).sqrt();
        if length <= f32::EPSILON {
            return 1.0;
        }
        let dir = [total[0] / length, total[1] / length, total[2] / length];
        const NUDGE: f32 = 1e-3;

        let mut factor = 1.0f32;
        let mut travelled = 0.0f32;
        for _ in 0..self.config.max_occlusion_surfaces {
            let origin = [
                p0[0] + dir[0] * travelled,
                p0[1] + dir[1] * travelled,
                p0[2] + dir[2] * travelled,
            ];
            let ray = rapier::Ray::new(to_point(origin), rapier::Vector::new(dir[0], dir[1], dir[2]));
            let Some((handle, toi)) = self.query_pipeline.cast_ray(
                &self.bodies,
                &self.colliders,
                &ray,
                length - travelled,
                false,
                Self::level_filter(),
            ) else {
                break;
            };

            let material = self
                .colliders
                .get(handle)
                .map(|c| ColliderTag::decode(c.user_data).material)
                .unwrap_or_default();
            factor *= material.sound_transmission();
            travelled += toi + NUDGE;
            if travelled >= length {
                break;
            }
        }
        factor.clamp(0.0, 1.0)
    }

    /// Normal of the ground under a point; `+Y` when there is none
    pub fn ground_normal(&self, x: f32, y: f32, z: f32) -> [f32; 3] {
        let from = [x, y + self.config.ghost_padding, z];
        let to = [x, self.config.world_bottom, z];
        let ray = segment_ray(from, to);
        match self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            1.0,
            true,
            Self::level_filter(),
        ) {
            Some((_, hit)) => {
                let n = hit.normal;
                // Trimesh back faces report a downward normal
                if n.y < 0.0 {
                    [-n.x, -n.y, -n.z]
                } else {
                    [n.x, n.y, n.z]
                }
            }
            None => [0.0, 1.0, 0.0],
        }
    }

    /// Depth of a point below the nearest water surface above it
    pub fn water_depth(&self, x: f32, y: f32, z: f32) -> Option<f32> {
        let to = [x, self.config.world_top, z];
        let ray = segment_ray([x, y, z], to);
        let filter = rapier::QueryFilter::default().groups(water_query_groups());
        self.query_pipeline
            .cast_ray(&self.bodies, &self.colliders, &ray, 1.0, true, filter)
            .map(|(_, toi)| ray.point_at(toi).y - y)
    }

    /// Height of the water surface above a point, if submerged
    pub fn water_level(&self, x: f32, y: f32, z: f32) -> Option<f32> {
        self.water_depth(x, y, z).map(|depth| y + depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PhysicsConfig;
    use crate::landscape::LandscapeMesh;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_world_ray_misses() {
        let world = CollisionWorld::new(PhysicsConfig::default(), &LandscapeMesh::empty()).unwrap();
        let hit = world.ray_cast([0.0, 10.0, 0.0], [0.0, -10.0, 0.0]);
        assert!(!hit.has_col);
        assert_eq!(hit.point, [0.0, -10.0, 0.0]);
    }

    #[test]
    fn test_ray_reports_material() {
        let mesh = LandscapeMesh::empty()
            .with_quad([-10.0, -10.0], [0.0, 10.0], 0.0, SurfaceMaterial::Stone)
            .with_quad([0.0, -10.0], [10.0, 10.0], 0.0, SurfaceMaterial::Wood);
        let world = CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap();

        let stone = world.ray_cast([-5.0, 5.0, 0.0], [-5.0, -5.0, 0.0]);
        assert!(stone.has_col);
        assert_eq!(stone.material, SurfaceMaterial::Stone);
        assert_relative_eq!(stone.y(), 0.0, epsilon = 1e-4);

        let wood = world.ray_cast([5.0, 5.0, 0.0], [5.0, -5.0, 0.0]);
        assert_eq!(wood.material, SurfaceMaterial::Wood);
    }

    #[test]
    fn test_drop_ray_finds_floor_under_feet() {
        let mesh = LandscapeMesh::empty().with_quad([-10.0, -10.0], [10.0, 10.0], 2.0, SurfaceMaterial::Earth);
        let world = CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap();

        let hit = world.drop_ray(1.0, 2.0, 1.0);
        assert!(hit.has_col);
        assert_relative_eq!(hit.y(), 2.0, epsilon = 1e-4);

        // Cached result is identical
        assert_eq!(world.drop_ray(1.0, 2.0, 1.0), hit);
    }

    #[test]
    fn test_sound_occlusion() {
        let mesh = LandscapeMesh::empty()
            .with_wall_z([-10.0, 10.0], [0.0, 10.0], 0.0, SurfaceMaterial::Wood);
        let world = CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap();

        let open = world.sound_occlusion([20.0, 1.0, -5.0], [20.0, 1.0, 5.0]);
        assert_relative_eq!(open, 1.0);

        let walled = world.sound_occlusion([0.0, 1.0, -5.0], [0.0, 1.0, 5.0]);
        assert_relative_eq!(walled, SurfaceMaterial::Wood.sound_transmission(), epsilon = 1e-5);
    }

    #[test]
    fn test_ground_normal_defaults_up() {
        let world = CollisionWorld::new(PhysicsConfig::default(), &LandscapeMesh::empty()).unwrap();
        assert_eq!(world.ground_normal(0.0, 0.0, 0.0), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_water_depth() {
        let mesh = LandscapeMesh::empty()
            .with_quad([-10.0, -10.0], [10.0, 10.0], -3.0, SurfaceMaterial::Earth)
            .with_quad([-10.0, -10.0], [10.0, 10.0], 0.0, SurfaceMaterial::Water);
        let world = CollisionWorld::new(PhysicsConfig::default(), &mesh).unwrap();

        let depth = world.water_depth(0.0, -2.0, 0.0).unwrap();
        assert_relative_eq!(depth, 2.0, epsilon = 1e-4);
        assert!(world.water_depth(0.0, 1.0, 0.0).is_none());

        // Water never blocks level rays
        let hit = world.ray_cast([0.0, 5.0, 0.0], [0.0, -5.0, 0.0]);
        assert_eq!(hit.material, SurfaceMaterial::Earth);
    }
}
