//! Named waypoints

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use umbra_ai::perception::dist_sq;
use umbra_ai::WaypointLookup;

/// Named positions routines and go-to actions refer to
///
/// Names are case-insensitive, as level data and scripts disagree on case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WayNet {
    points: HashMap<String, [f32; 3]>,
}

impl WayNet {
    /// Empty way net
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or move a waypoint
    pub fn insert(&mut self, name: &str, position: [f32; 3]) {
        self.points.insert(name.to_ascii_uppercase(), position);
    }

    /// Add a waypoint, builder style
    pub fn with_point(mut self, name: &str, position: [f32; 3]) -> Self {
        self.insert(name, position);
        self
    }

    /// Position of a waypoint
    pub fn get(&self, name: &str) -> Option<[f32; 3]> {
        self.points.get(&name.to_ascii_uppercase()).copied()
    }

    /// Waypoint closest to `pos`
    pub fn nearest(&self, pos: [f32; 3]) -> Option<(&str, [f32; 3])> {
        self.points
            .iter()
            .min_by(|a, b| dist_sq(*a.1, pos).total_cmp(&dist_sq(*b.1, pos)))
            .map(|(name, p)| (name.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl WaypointLookup for WayNet {
    fn waypoint(&self, name: &str) -> Option<[f32; 3]> {
        self.get(name)
    }
}
