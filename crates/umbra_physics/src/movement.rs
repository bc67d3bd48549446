//! Swept movement of actor bodies
//!
//! Movement goes through Rapier's kinematic character controller, which
//! slides along walls, climbs steps and snaps to the ground. Long moves are
//! split into sub-steps no longer than a fraction of the capsule radius so a
//! fast actor cannot tunnel through thin geometry.

use crate::body::PhysicalBody;
use crate::world::CollisionWorld;
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude as rapier;

/// How a move request was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Reached the requested position
    Moved,
    /// Deflected along a surface and stopped short or off to the side
    Slid,
    /// Did not move at all
    Blocked,
}

/// Result of a move request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveResult {
    /// Resolution
    pub outcome: MoveOutcome,
    /// Reference position after the move
    pub position: [f32; 3],
    /// Normal of the last surface touched, if any
    pub normal: Option<[f32; 3]>,
    /// Standing on ground after the move
    pub grounded: bool,
    /// Sliding down a slope too steep to stand on
    pub sliding: bool,
}

fn length(v: [f32; 3]) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

impl CollisionWorld {
    fn character_controller(&self) -> KinematicCharacterController {
        KinematicCharacterController {
            offset: CharacterLength::Absolute(self.config.skin_width),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(self.config.step_height),
                min_width: CharacterLength::Absolute(self.config.step_min_width),
                include_dynamic_bodies: false,
            }),
            max_slope_climb_angle: self.config.max_slope_deg.to_radians(),
            min_slope_slide_angle: self.config.slide_slope_deg.to_radians(),
            snap_to_ground: Some(CharacterLength::Absolute(self.config.snap_to_ground)),
            ..Default::default()
        }
    }

    fn movement_filter(body: &PhysicalBody) -> rapier::QueryFilter<'static> {
        rapier::QueryFilter::default()
            .exclude_collider(body.handle.0)
            .exclude_sensors()
            .groups(body.category.movement_filter())
    }

    fn center_pose(body: &PhysicalBody, pos: [f32; 3]) -> rapier::Isometry<f32> {
        rapier::Isometry::translation(
            pos[0] + body.center_offset[0],
            pos[1] + body.center_offset[1],
            pos[2] + body.center_offset[2],
        )
    }

    /// Whether the body would fit at `pos` without touching anything solid
    pub fn test_move(&self, body: &PhysicalBody, pos: [f32; 3]) -> bool {
        let Some(collider) = self.colliders.get(body.handle.0) else {
            return false;
        };
        // Lift by the skin so a body resting on the floor fits
        let pose = Self::center_pose(body, [pos[0], pos[1] + self.config.skin_width, pos[2]]);
        self.query_pipeline
            .intersection_with_shape(
                &self.bodies,
                &self.colliders,
                &pose,
                collider.shape(),
                Self::movement_filter(body),
            )
            .is_none()
    }

    /// Sweep the body by `dp`, sliding along whatever it hits
    pub fn try_move(&mut self, body: &PhysicalBody, dp: [f32; 3], dt_secs: f32) -> MoveResult {
        let start = self.body_position(body);
        let Some(shape) = self
            .colliders
            .get(body.handle.0)
            .map(|c| c.shared_shape().clone())
        else {
            return MoveResult {
                outcome: MoveOutcome::Blocked,
                position: start,
                normal: None,
                grounded: false,
                sliding: false,
            };
        };

        let requested = length(dp);
        let step_len = (body.radius * self.config.substep_fraction).max(1e-3);
        let steps = ((requested / step_len).ceil() as u32).clamp(1, self.config.max_substeps);
        let step = [
            dp[0] / steps as f32,
            dp[1] / steps as f32,
            dp[2] / steps as f32,
        ];

        let controller = self.character_controller();
        let filter = Self::movement_filter(body);
        let mut pos = start;
        let mut normal = None;
        let mut grounded = false;
        let mut sliding = false;

        for _ in 0..steps {
            let pose = Self::center_pose(body, pos);
            let mut touched = None;
            let movement = controller.move_shape(
                dt_secs / steps as f32,
                &self.bodies,
                &self.colliders,
                &self.query_pipeline,
                shape.as_ref(),
                &pose,
                rapier::Vector::new(step[0], step[1], step[2]),
                filter,
                |collision| {
                    let n = collision.hit.normal1;
                    touched = Some([n.x, n.y, n.z]);
                },
            );

            pos[0] += movement.translation.x;
            pos[1] += movement.translation.y;
            pos[2] += movement.translation.z;
            grounded = movement.grounded;
            sliding = movement.is_sliding_down_slope;
            if touched.is_some() {
                normal = touched;
            }
        }

        self.place(body, pos);
        self.sync();

        let target = [start[0] + dp[0], start[1] + dp[1], start[2] + dp[2]];
        let tolerance = self.config.skin_width * 2.0 + 1e-3;
        let outcome = if requested <= f32::EPSILON || length(sub(pos, target)) <= tolerance {
            MoveOutcome::Moved
        } else if length(sub(pos, start)) <= 1e-4 {
            MoveOutcome::Blocked
        } else {
            MoveOutcome::Slid
        };

        if outcome != MoveOutcome::Moved {
            log::trace!("Move of {:?} resolved as {:?}", body.handle, outcome);
        }
        MoveResult {
            outcome,
            position: pos,
            normal,
            grounded,
            sliding,
        }
    }

    /// Sweep the body and also report the normal of the ground it ends up
    /// over. Walls touched on the way stay in [`MoveResult::normal`].
    pub fn try_move_n(&mut self, body: &PhysicalBody, dp: [f32; 3], dt_secs: f32) -> (MoveResult, [f32; 3]) {
        let result = self.try_move(body, dp, dt_secs);
        let p = result.position;
        (result, self.ground_normal(p[0], p[1], p[2]))
    }

    /// Whether a surface with this normal can be walked on
    pub fn is_walkable(&self, normal: [f32; 3]) -> bool {
        normal[1] >= self.config.walkable_normal_y()
    }
}
