//! Flat render buffers mirrored from the mesh.
//!
//! Positions are stored per vertex slot and indices as one triple per face
//! slot, so a renderer can upload them directly. Slots of deleted elements
//! keep their last contents.

use glam::Vec3;

use crate::id::{FaceIndex, VertexIndex};
use crate::primitive::Triangle;

#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Positions as raw bytes (three `f32` per vertex slot)
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Indices as raw bytes (three `u32` per face slot)
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn position(&self, vertex: VertexIndex) -> Vec3 {
        self.positions.get(vertex.slot()).copied().unwrap_or(Vec3::ZERO)
    }

    pub(crate) fn set_position(&mut self, vertex: VertexIndex, position: Vec3) {
        let slot = vertex.slot();
        if self.positions.len() <= slot {
            self.positions.resize(slot + 1, Vec3::ZERO);
        }
        self.positions[slot] = position;
    }

    pub fn index(&self, slot: usize) -> u32 {
        self.indices.get(slot).copied().unwrap_or(0)
    }

    /// Write one index slot and return its previous value
    pub(crate) fn set_index(&mut self, slot: usize, vertex: VertexIndex) -> VertexIndex {
        if self.indices.len() <= slot {
            self.indices.resize(slot + 1, 0);
        }
        VertexIndex(std::mem::replace(&mut self.indices[slot], vertex.0))
    }

    pub fn face_indices(&self, face: FaceIndex) -> [VertexIndex; 3] {
        let first = face.first_index_slot();
        [0, 1, 2].map(|i| VertexIndex(self.index(first + i)))
    }

    pub(crate) fn set_face_indices(&mut self, face: FaceIndex, triangle: [VertexIndex; 3]) {
        let first = face.first_index_slot();
        for (i, vertex) in triangle.into_iter().enumerate() {
            self.set_index(first + i, vertex);
        }
    }

    /// Triangle formed by a face's index triple
    pub fn triangle(&self, face: FaceIndex) -> Triangle {
        let [a, b, c] = self.face_indices(face).map(|v| self.position(v));
        Triangle::new(a, b, c)
    }

    pub(crate) fn clear(&mut self) {
        self.positions.clear();
        self.indices.clear();
    }
}
