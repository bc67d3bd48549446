//! Static level geometry
//!
//! A [`LandscapeMesh`] is the packed level mesh handed over by the asset
//! layer: one shared vertex buffer and one index chunk per surface material.

use crate::error::{PhysicsError, Result};
use crate::material::SurfaceMaterial;
use serde::{Deserialize, Serialize};

/// Triangles sharing one surface material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshChunk {
    /// Surface material of every triangle in the chunk
    pub material: SurfaceMaterial,
    /// Triangle indices into the landscape vertex buffer
    pub indices: Vec<[u32; 3]>,
}

/// Packed level mesh
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandscapeMesh {
    /// Shared vertex buffer
    pub vertices: Vec<[f32; 3]>,
    /// Per-material triangle chunks
    pub chunks: Vec<MeshChunk>,
}

impl LandscapeMesh {
    /// A level with no geometry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Append an axis-aligned horizontal rectangle at height `y`
    pub fn with_quad(mut self, min: [f32; 2], max: [f32; 2], y: f32, material: SurfaceMaterial) -> Self {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            [min[0], y, min[1]],
            [max[0], y, min[1]],
            [max[0], y, max[1]],
            [min[0], y, max[1]],
        ]);
        self.push_triangles(material, &[[base, base + 2, base + 1], [base, base + 3, base + 2]]);
        self
    }

    /// Append a vertical wall in the XY plane at depth `z`
    pub fn with_wall_z(mut self, x: [f32; 2], y: [f32; 2], z: f32, material: SurfaceMaterial) -> Self {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[
            [x[0], y[0], z],
            [x[1], y[0], z],
            [x[1], y[1], z],
            [x[0], y[1], z],
        ]);
        self.push_triangles(material, &[[base, base + 1, base + 2], [base, base + 2, base + 3]]);
        self
    }

    fn push_triangles(&mut self, material: SurfaceMaterial, tris: &[[u32; 3]]) {
        match self.chunks.iter_mut().find(|c| c.material == material) {
            Some(chunk) => chunk.indices.extend_from_slice(tris),
            None => self.chunks.push(MeshChunk {
                material,
                indices: tris.to_vec(),
            }),
        }
    }

    /// Total triangle count
    pub fn triangle_count(&self) -> usize {
        self.chunks.iter().map(|c| c.indices.len()).sum()
    }

    /// Check every index against the vertex buffer
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len() as u32;
        for (i, chunk) in self.chunks.iter().enumerate() {
            if let Some(bad) = chunk.indices.iter().flatten().find(|&&idx| idx >= count) {
                return Err(PhysicsError::InvalidMesh(format!(
                    "chunk {} ({:?}) references vertex {} of {}",
                    i, chunk.material, bad, count
                )));
            }
        }
        if let Some(v) = self.vertices.iter().find(|v| v.iter().any(|c| !c.is_finite())) {
            return Err(PhysicsError::InvalidMesh(format!("non-finite vertex {:?}", v)));
        }
        Ok(())
    }
}
