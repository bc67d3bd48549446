//! Actor and AI configuration

use crate::error::{AiError, Result};
use serde::{Deserialize, Serialize};
use umbra_core::ScriptFn;

/// Tuning values shared by every actor of a world
///
/// Distances are in metres, times in milliseconds of simulation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Interval between active perception passes
    pub perception_time_ms: u64,

    /// How far an actor sees
    pub sight_range: f32,

    /// How far an actor hears fight noise
    pub hearing_range: f32,

    /// Range of quiet sounds (sneaking, picking locks)
    pub quiet_hearing_range: f32,

    /// Range passive perceptions are delivered within
    pub passive_range: f32,

    /// Horizontal field of view in degrees
    pub fov_deg: f32,

    /// Eye height as a fraction of body height
    pub eye_height: f32,

    /// Walking speed
    pub walk_speed: f32,

    /// Running speed
    pub run_speed: f32,

    /// Sneaking speed
    pub sneak_speed: f32,

    /// Swimming speed
    pub swim_speed: f32,

    /// Climbing speed
    pub climb_speed: f32,

    /// Upward speed at the start of a jump
    pub jump_speed: f32,

    /// Highest ledge above the feet an actor can climb onto
    pub max_climb_height: f32,

    /// Turn rate used by look-at actions, degrees per second
    pub turn_speed_deg: f32,

    /// Downward acceleration
    pub gravity: f32,

    /// Terminal fall speed
    pub max_fall_speed: f32,

    /// Water depth at which an actor starts swimming
    pub swim_depth: f32,

    /// Water depth at which a swimming actor counts as diving
    pub dive_depth: f32,

    /// Distance at which a go-to action has arrived
    pub arrive_distance: f32,

    /// Duration of an animation missing from the catalog
    pub default_anim_ms: u64,

    /// Time between two cast sub-state steps
    pub cast_step_ms: u64,

    /// Actors further from the player skip active perception
    pub near_range: f32,

    /// Actors further from the player skip movement too
    pub far_range: f32,

    /// State entered when an actor dies
    pub death_state: Option<ScriptFn>,

    /// State entered when an actor is knocked out
    pub unconscious_state: Option<ScriptFn>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            perception_time_ms: 5000,
            sight_range: 20.0,
            hearing_range: 30.0,
            quiet_hearing_range: 7.0,
            passive_range: 20.0,
            fov_deg: 100.0,
            eye_height: 0.9,
            walk_speed: 1.6,
            run_speed: 4.0,
            sneak_speed: 1.0,
            swim_speed: 2.0,
            climb_speed: 1.5,
            jump_speed: 4.5,
            max_climb_height: 2.5,
            turn_speed_deg: 360.0,
            gravity: 9.81,
            max_fall_speed: 50.0,
            swim_depth: 1.2,
            dive_depth: 2.5,
            arrive_distance: 0.5,
            default_anim_ms: 1000,
            cast_step_ms: 300,
            near_range: 60.0,
            far_range: 120.0,
            death_state: None,
            unconscious_state: None,
        }
    }
}

impl AiConfig {
    /// Set the perception interval
    pub fn with_perception_time(mut self, ms: u64) -> Self {
        self.perception_time_ms = ms;
        self
    }

    /// Set sight and hearing ranges
    pub fn with_ranges(mut self, sight: f32, hearing: f32) -> Self {
        self.sight_range = sight;
        self.hearing_range = hearing;
        self
    }

    /// Set the states entered on death and knock-out
    pub fn with_health_states(mut self, death: Option<ScriptFn>, unconscious: Option<ScriptFn>) -> Self {
        self.death_state = death;
        self.unconscious_state = unconscious;
        self
    }

    /// Set the cast step interval
    pub fn with_cast_step(mut self, ms: u64) -> Self {
        self.cast_step_ms = ms;
        self
    }

    /// Cosine of half the field of view
    pub fn fov_cos(&self) -> f32 {
        (self.fov_deg.to_radians() * 0.5).cos()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sight_range < 0.0 || self.hearing_range < 0.0 || self.passive_range < 0.0 {
            return Err(AiError::InvalidConfig("ranges must not be negative".into()));
        }
        if !(0.0..=360.0).contains(&self.fov_deg) {
            return Err(AiError::InvalidConfig(format!("fov_deg {} out of range", self.fov_deg)));
        }
        if self.swim_depth <= 0.0 || self.dive_depth < self.swim_depth {
            return Err(AiError::InvalidConfig("dive_depth must be at least swim_depth".into()));
        }
        if self.jump_speed < 0.0 || self.max_climb_height < 0.0 {
            return Err(AiError::InvalidConfig("jump_speed and max_climb_height must not be negative".into()));
        }
        if self.far_range < self.near_range {
            return Err(AiError::InvalidConfig("far_range must be at least near_range".into()));
        }
        if self.cast_step_ms == 0 {
            return Err(AiError::InvalidConfig("cast_step_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_dive_shallower_than_swim_is_rejected() {
        let mut config = AiConfig::default();
        config.dive_depth = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fov_cos() {
        let mut config = AiConfig::default();
        config.fov_deg = 180.0;
        assert!(config.fov_cos().abs() < 1e-6);
    }
}
