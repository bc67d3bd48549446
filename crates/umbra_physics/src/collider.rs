//! Shapes for static object bodies

use crate::error::{PhysicsError, Result};
use rapier3d::prelude as rapier;
use serde::{Deserialize, Serialize};

/// Collision shape of a static object (doors, chests, furniture)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BodyShape {
    /// Box with half-extents
    Box {
        half_extents: [f32; 3],
    },
    /// Capsule aligned along Y
    Capsule {
        half_height: f32,
        radius: f32,
    },
    /// Triangle mesh
    TriMesh {
        vertices: Vec<[f32; 3]>,
        indices: Vec<[u32; 3]>,
    },
}

impl BodyShape {
    /// Box shape from half-extents
    pub fn cuboid(hx: f32, hy: f32, hz: f32) -> Self {
        Self::Box {
            half_extents: [hx, hy, hz],
        }
    }

    /// Build a Rapier shared shape
    pub(crate) fn to_rapier(&self) -> Result<rapier::SharedShape> {
        match self {
            Self::Box { half_extents } => {
                if half_extents.iter().any(|&e| e <= 0.0) {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "box half-extents must be positive: {:?}",
                        half_extents
                    )));
                }
                Ok(rapier::SharedShape::cuboid(half_extents[0], half_extents[1], half_extents[2]))
            }
            Self::Capsule { half_height, radius } => {
                if *radius <= 0.0 {
                    return Err(PhysicsError::ShapeCreationFailed(format!(
                        "capsule radius must be positive: {}",
                        radius
                    )));
                }
                Ok(rapier::SharedShape::capsule_y(half_height.max(0.0), *radius))
            }
            Self::TriMesh { vertices, indices } => {
                if indices.is_empty() {
                    return Err(PhysicsError::ShapeCreationFailed("empty triangle mesh".to_string()));
                }
                if indices.iter().flatten().any(|&i| i as usize >= vertices.len()) {
                    return Err(PhysicsError::InvalidMesh(
                        "triangle index out of range".to_string(),
                    ));
                }
                trimesh(vertices, indices.clone())
            }
        }
    }
}

/// Triangle mesh shape from plain arrays
pub(crate) fn trimesh(vertices: &[[f32; 3]], indices: Vec<[u32; 3]>) -> Result<rapier::SharedShape> {
    let points: Vec<_> = vertices
        .iter()
        .map(|v| rapier::Point::new(v[0], v[1], v[2]))
        .collect();
    rapier::SharedShape::trimesh(points, indices).into_shape()
}

/// Mesh construction is fallible in some parry releases and infallible in others
trait IntoShape {
    fn into_shape(self) -> Result<rapier::SharedShape>;
}

impl IntoShape for rapier::SharedShape {
    fn into_shape(self) -> Result<rapier::SharedShape> {
        Ok(self)
    }
}

impl<E: std::fmt::Debug> IntoShape for std::result::Result<rapier::SharedShape, E> {
    fn into_shape(self) -> Result<rapier::SharedShape> {
        self.map_err(|e| PhysicsError::ShapeCreationFailed(format!("{:?}", e)))
    }
}
