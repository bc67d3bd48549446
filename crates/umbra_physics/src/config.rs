//! Collision world configuration

use crate::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// Collision world configuration
///
/// Distances are in world units (metres).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Height above the query point a drop ray starts from
    pub ghost_padding: f32,

    /// Vertical extent added to ghost volumes that are flat in Y
    pub ghost_height: f32,

    /// Upper bound of the world; upward probes stop here
    pub world_top: f32,

    /// Lower bound of the world; drop rays stop here
    pub world_bottom: f32,

    /// Steepest slope (degrees) an actor can walk up
    pub max_slope_deg: f32,

    /// Steepest slope (degrees) an actor can stand on without sliding
    pub slide_slope_deg: f32,

    /// Maximum step an actor climbs without jumping
    pub step_height: f32,

    /// Minimum free width on top of a step
    pub step_min_width: f32,

    /// Gap kept between a moving capsule and geometry
    pub skin_width: f32,

    /// Distance within which a walking actor sticks to the ground
    pub snap_to_ground: f32,

    /// Movement sub-step length as a fraction of the capsule radius
    pub substep_fraction: f32,

    /// Upper bound on sub-steps per move request
    pub max_substeps: u32,

    /// Surfaces counted by a sound occlusion ray before it gives up
    pub max_occlusion_surfaces: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ghost_padding: 0.5,
            ghost_height: 2.0,
            world_top: 1000.0,
            world_bottom: -1000.0,
            max_slope_deg: 50.0,
            slide_slope_deg: 40.0,
            step_height: 0.5,
            step_min_width: 0.1,
            skin_width: 0.02,
            snap_to_ground: 0.3,
            substep_fraction: 0.5,
            max_substeps: 16,
            max_occlusion_surfaces: 8,
        }
    }
}

impl PhysicsConfig {
    /// Set the walkable slope limit in degrees
    pub fn with_max_slope(mut self, degrees: f32) -> Self {
        self.max_slope_deg = degrees;
        self
    }

    /// Set the autostep height
    pub fn with_step_height(mut self, height: f32) -> Self {
        self.step_height = height;
        self
    }

    /// Set the vertical world bounds
    pub fn with_world_bounds(mut self, bottom: f32, top: f32) -> Self {
        self.world_bottom = bottom;
        self.world_top = top;
        self
    }

    /// Cosine of the walkable slope limit; floor normals with a larger Y are walkable
    pub fn walkable_normal_y(&self) -> f32 {
        self.max_slope_deg.to_radians().cos()
    }

    /// Check the configuration for values the queries cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.world_bottom >= self.world_top {
            return Err(PhysicsError::InvalidConfig(format!(
                "world_bottom ({}) must be below world_top ({})",
                self.world_bottom, self.world_top
            )));
        }
        if !(0.0..90.0).contains(&self.max_slope_deg) {
            return Err(PhysicsError::InvalidConfig(format!(
                "max_slope_deg out of range: {}",
                self.max_slope_deg
            )));
        }
        if self.substep_fraction <= 0.0 || self.max_substeps == 0 {
            return Err(PhysicsError::InvalidConfig(
                "movement sub-stepping must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
