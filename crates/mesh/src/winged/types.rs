//! Type definitions for the winged-edge mesh data structure.
//!
//! Records link to each other by identifier only. An edge runs from
//! `vertex1` to `vertex2`; its left face traverses it in that direction and
//! its right face traverses it backwards. The predecessor/successor pointers
//! on each side give the neighbouring edges in that face's loop.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::id::{EdgeId, FaceIndex, VertexIndex};

/// A vertex in the winged-edge mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub index: VertexIndex,
    pub position: Vec3,
    /// One incident edge (arbitrary choice if multiple)
    pub edge: Option<EdgeId>,
    /// Subdivision depth at which the vertex was created
    pub level: u32,
    /// Vertex lies on a seam between regions of different levels
    pub is_t_vertex: bool,
    /// Endpoints of the edge this vertex was inserted on by subdivision
    pub parents: Option<(VertexIndex, VertexIndex)>,
}

impl Vertex {
    pub fn new(index: VertexIndex, position: Vec3, level: u32) -> Self {
        Self {
            index,
            position,
            edge: None,
            level,
            is_t_vertex: false,
            parents: None,
        }
    }

    /// The parent that is not `vertex`, if `vertex` is one of the parents
    pub fn other_parent(&self, vertex: VertexIndex) -> Option<VertexIndex> {
        match self.parents {
            Some((a, b)) if a == vertex => Some(b),
            Some((a, b)) if b == vertex => Some(a),
            _ => None,
        }
    }
}

/// An edge in the winged-edge mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub vertex1: Option<VertexIndex>,
    pub vertex2: Option<VertexIndex>,
    pub left_face: Option<FaceIndex>,
    pub right_face: Option<FaceIndex>,
    pub left_predecessor: Option<EdgeId>,
    pub left_successor: Option<EdgeId>,
    pub right_predecessor: Option<EdgeId>,
    pub right_successor: Option<EdgeId>,
    pub level: u32,
    /// Temporary seam edge from a T-vertex to the opposite corner
    pub is_t_edge: bool,
}

impl Edge {
    /// A fresh edge with no links
    pub fn new(id: EdgeId, level: u32) -> Self {
        Self {
            id,
            vertex1: None,
            vertex2: None,
            left_face: None,
            right_face: None,
            left_predecessor: None,
            left_successor: None,
            right_predecessor: None,
            right_successor: None,
            level,
            is_t_edge: false,
        }
    }

    /// Both endpoints.
    ///
    /// # Panics
    /// If the edge is not linked to its vertices.
    pub fn vertices(&self) -> (VertexIndex, VertexIndex) {
        match (self.vertex1, self.vertex2) {
            (Some(v1), Some(v2)) => (v1, v2),
            _ => panic!("edge {:?} has no endpoints", self.id),
        }
    }

    pub fn is_incident_to(&self, vertex: VertexIndex) -> bool {
        self.vertex1 == Some(vertex) || self.vertex2 == Some(vertex)
    }

    pub fn is_left_face(&self, face: FaceIndex) -> bool {
        self.left_face == Some(face)
    }

    pub fn is_right_face(&self, face: FaceIndex) -> bool {
        self.right_face == Some(face)
    }

    pub fn is_boundary(&self) -> bool {
        self.left_face.is_none() || self.right_face.is_none()
    }

    /// Whether every link is cleared, as required before deletion
    pub fn is_unlinked(&self) -> bool {
        self.vertex1.is_none()
            && self.vertex2.is_none()
            && self.left_face.is_none()
            && self.right_face.is_none()
            && self.left_predecessor.is_none()
            && self.left_successor.is_none()
            && self.right_predecessor.is_none()
            && self.right_successor.is_none()
    }

    /// Clear every link, keeping id, level and the T-edge marker
    pub fn reset(&mut self) {
        *self = Self {
            is_t_edge: self.is_t_edge,
            ..Self::new(self.id, self.level)
        };
    }

    fn assert_side(&self, face: FaceIndex) -> bool {
        if self.is_left_face(face) {
            true
        } else if self.is_right_face(face) {
            false
        } else {
            panic!("face {:?} is not adjacent to edge {:?}", face, self.id)
        }
    }

    /// The vertex `face` enters this edge at
    pub fn first_vertex(&self, face: FaceIndex) -> VertexIndex {
        let (v1, v2) = self.vertices();
        if self.assert_side(face) { v1 } else { v2 }
    }

    /// The vertex `face` leaves this edge at
    pub fn second_vertex(&self, face: FaceIndex) -> VertexIndex {
        let (v1, v2) = self.vertices();
        if self.assert_side(face) { v2 } else { v1 }
    }

    /// The next edge in `face`'s loop
    pub fn successor(&self, face: FaceIndex) -> EdgeId {
        let next = if self.assert_side(face) {
            self.left_successor
        } else {
            self.right_successor
        };
        next.unwrap_or_else(|| panic!("edge {:?} has no successor in {:?}", self.id, face))
    }

    /// The previous edge in `face`'s loop
    pub fn predecessor(&self, face: FaceIndex) -> EdgeId {
        let prev = if self.assert_side(face) {
            self.left_predecessor
        } else {
            self.right_predecessor
        };
        prev.unwrap_or_else(|| panic!("edge {:?} has no predecessor in {:?}", self.id, face))
    }

    /// The face across this edge from `face` (`None` on a boundary)
    pub fn other_face(&self, face: FaceIndex) -> Option<FaceIndex> {
        if self.assert_side(face) {
            self.right_face
        } else {
            self.left_face
        }
    }

    pub fn other_vertex(&self, vertex: VertexIndex) -> VertexIndex {
        let (v1, v2) = self.vertices();
        if v1 == vertex {
            v2
        } else if v2 == vertex {
            v1
        } else {
            panic!("vertex {:?} is not incident to edge {:?}", vertex, self.id)
        }
    }

    /// The face whose loop leaves `vertex` along this edge
    pub fn face_leaving(&self, vertex: VertexIndex) -> Option<FaceIndex> {
        if self.vertex1 == Some(vertex) {
            self.left_face
        } else {
            self.right_face
        }
    }

    /// The face whose loop enters `vertex` along this edge
    pub fn face_entering(&self, vertex: VertexIndex) -> Option<FaceIndex> {
        if self.vertex2 == Some(vertex) {
            self.left_face
        } else {
            self.right_face
        }
    }

    pub fn set_successor(&mut self, face: FaceIndex, edge: EdgeId) {
        if self.assert_side(face) {
            self.left_successor = Some(edge);
        } else {
            self.right_successor = Some(edge);
        }
    }

    pub fn set_predecessor(&mut self, face: FaceIndex, edge: EdgeId) {
        if self.assert_side(face) {
            self.left_predecessor = Some(edge);
        } else {
            self.right_predecessor = Some(edge);
        }
    }

    /// Replace the adjacency to `old` with `new` on the same side
    pub fn replace_face(&mut self, old: FaceIndex, new: FaceIndex) {
        if self.assert_side(old) {
            self.left_face = Some(new);
        } else {
            self.right_face = Some(new);
        }
    }
}

/// A triangular face in the winged-edge mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub index: FaceIndex,
    /// One edge of the face's loop
    pub edge: Option<EdgeId>,
    /// T-edge splitting a coarser face next to a refined region
    pub t_edge: Option<EdgeId>,
    pub level: u32,
}

impl Face {
    pub fn new(index: FaceIndex, level: u32) -> Self {
        Self {
            index,
            edge: None,
            t_edge: None,
            level,
        }
    }

    pub fn is_unlinked(&self) -> bool {
        self.edge.is_none() && self.t_edge.is_none()
    }
}
