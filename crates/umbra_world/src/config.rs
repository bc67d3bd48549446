//! Simulation configuration
//!
//! One JSON document configures every subsystem; missing keys fall back to
//! the defaults of each section.
//!
//! ```json
//! {
//!   "time_scale": 14.0,
//!   "start_time": { "day": 0, "hour": 8, "minute": 0 },
//!   "ai": { "perception_time_ms": 3000 },
//!   "physics": { "max_slope_deg": 45.0 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use umbra_ai::AiConfig;
use umbra_core::GameTime;
use umbra_physics::PhysicsConfig;
use umbra_triggers::TriggerConfig;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value out of range
    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Game clock value at world creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartTime {
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl Default for StartTime {
    fn default() -> Self {
        Self {
            day: 0,
            hour: 8,
            minute: 0,
        }
    }
}

impl StartTime {
    /// As a game time
    pub fn game_time(&self) -> GameTime {
        GameTime::from_day_time(self.day, self.hour, self.minute)
    }
}

/// Configuration of a whole world
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Game milliseconds per simulation millisecond
    pub time_scale: f32,

    /// Clock value of a new world
    pub start_time: StartTime,

    pub physics: PhysicsConfig,
    pub ai: AiConfig,
    pub triggers: TriggerConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            start_time: StartTime::default(),
            physics: PhysicsConfig::default(),
            ai: AiConfig::default(),
            triggers: TriggerConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the game clock speed
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.time_scale = scale;
        self
    }

    /// Set the clock value of a new world
    pub fn with_start_time(mut self, day: u32, hour: u32, minute: u32) -> Self {
        self.start_time = StartTime { day, hour, minute };
        self
    }

    /// Replace the AI section
    pub fn with_ai(mut self, ai: AiConfig) -> Self {
        self.ai = ai;
        self
    }

    /// Check every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(ConfigError::Invalid(format!("time_scale: {}", self.time_scale)));
        }
        if self.start_time.hour >= 24 || self.start_time.minute >= 60 {
            return Err(ConfigError::Invalid(format!(
                "start_time {:02}:{:02}",
                self.start_time.hour, self.start_time.minute
            )));
        }
        self.physics
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.ai.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json_str(r#"{ "ai": { "perception_time_ms": 3000 } }"#).unwrap();
        assert_eq!(config.ai.perception_time_ms, 3000);
        assert_eq!(config.ai.sight_range, AiConfig::default().sight_range);
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.start_time.hour, 8);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            SimConfig::from_json_str(r#"{ "time_scale": -2.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            SimConfig::from_json_str(r#"{ "start_time": { "hour": 25 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(SimConfig::from_json_str("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimConfig::default().with_time_scale(14.0).with_start_time(2, 23, 30);
        let back = SimConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(back.time_scale, 14.0);
        assert_eq!(back.start_time, StartTime { day: 2, hour: 23, minute: 30 });
    }
}
